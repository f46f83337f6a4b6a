//! Ordered JSON Schema model.
//!
//! `SchemaNode` is plain data: every field maps 1:1 onto a JSON Schema
//! keyword and empty fields are omitted on serialization. Field declaration
//! order is the JSON key order of the emitted document, and `properties`
//! keeps insertion order (= source key order of the YAML mapping).
pub mod types;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

pub use types::{BoolOrSchema, Items, Pattern, SchemaType};

/// Dialect URI stamped on every generated document root.
pub const DRAFT_07_URI: &str = "http://json-schema.org/draft-07/schema#";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaNode {
    // ---- identity ----
    #[serde(rename = "$schema", skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub schema: String,
    #[serde(rename = "$ref", skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub reference: String,
    #[serde(rename = "$comment", skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub comment: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<SchemaType>,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub examples: Vec<Value>,
    #[serde(skip_serializing_if = "is_false", deserialize_with = "null_as_default")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "is_false", deserialize_with = "null_as_default")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "is_false", deserialize_with = "null_as_default")]
    pub write_only: bool,

    // ---- object ----
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<BoolOrSchema>,
    #[serde(skip_serializing_if = "IndexSet::is_empty", deserialize_with = "null_as_default")]
    pub required: IndexSet<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty", deserialize_with = "null_as_default")]
    pub pattern_properties: IndexMap<String, SchemaNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_names: Option<Box<SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    // ---- array ----
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub prefix_items: Vec<SchemaNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_items: Option<BoolOrSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<Box<SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "is_false", deserialize_with = "null_as_default")]
    pub unique_items: bool,

    // ---- string ----
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub format: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub content_encoding: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub content_media_type: String,

    // ---- numeric ----
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,

    // ---- combinators ----
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub enum_: Vec<Value>,
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub constant: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub all_of: Vec<SchemaNode>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub any_of: Vec<SchemaNode>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub one_of: Vec<SchemaNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<SchemaNode>>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_: Option<Box<SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub then: Option<Box<SchemaNode>>,
    #[serde(rename = "else", skip_serializing_if = "Option::is_none")]
    pub else_: Option<Box<SchemaNode>>,

    // ---- dependencies ----
    #[serde(skip_serializing_if = "IndexMap::is_empty", deserialize_with = "null_as_default")]
    pub dependencies: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty", deserialize_with = "null_as_default")]
    pub dependent_required: IndexMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty", deserialize_with = "null_as_default")]
    pub dependent_schemas: IndexMap<String, SchemaNode>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A keyword written with no value (`description:`) reads as its empty form.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate `properties` in source order (empty for non-object nodes).
    pub fn property_iter(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.properties.iter().flat_map(|props| props.iter())
    }

    /// Depth-first walk over this node and every nested property.
    ///
    /// The visitor receives the ancestor chain (root first, excluding the
    /// visited node) and the node itself.
    pub fn walk_properties<F>(&self, mut visit: F)
    where
        F: FnMut(&[&SchemaNode], &SchemaNode),
    {
        let mut ancestors = Vec::new();
        self.walk_inner(&mut ancestors, &mut visit);
    }

    fn walk_inner<'a, F>(&'a self, ancestors: &mut Vec<&'a SchemaNode>, visit: &mut F)
    where
        F: FnMut(&[&SchemaNode], &SchemaNode),
    {
        visit(ancestors, self);
        ancestors.push(self);
        for (_, child) in self.property_iter() {
            child.walk_inner(ancestors, visit);
        }
        ancestors.pop();
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
