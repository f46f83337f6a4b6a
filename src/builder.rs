//! Recursive descent from a YAML node tree to a `SchemaNode`.
//!
//! Every key's schema starts from computed defaults derived from its value
//! (`type`, `title`, `default`, `additionalProperties`) and is finished by
//! the annotation parser, which lays the head comment's fields on top.
use indexmap::IndexMap;
use serde_yaml::Value;

use crate::annotation::{self, Annotation, AnnotationFailure, Fragment};
use crate::diagnostics::DiagnosticSink;
use crate::document::{self, tags, Node, NodeKind, Scalar};
use crate::error::{Error, Result};
use crate::lint;
use crate::schema::{BoolOrSchema, SchemaNode, SchemaType, DRAFT_07_URI};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Fail the whole build on the first malformed head comment.
    pub strict: bool,
}

pub struct SchemaBuilder<'a> {
    file_path: String,
    options: BuildOptions,
    sink: &'a dyn DiagnosticSink,
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINT
// ————————————————————————————————————————————————————————————————————————————

/// Load `source`, build its schema and lint the result.
///
/// `file_path` is only used in diagnostics.
pub fn generate(
    source: &str,
    file_path: &str,
    options: BuildOptions,
    sink: &dyn DiagnosticSink,
) -> Result<SchemaNode> {
    let root = document::load(source)?;
    let schema = SchemaBuilder::new(file_path, options, sink).build(&root)?;
    lint::lint(&schema, sink);
    Ok(schema)
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl<'a> SchemaBuilder<'a> {
    pub fn new(file_path: impl Into<String>, options: BuildOptions, sink: &'a dyn DiagnosticSink) -> Self {
        Self { file_path: file_path.into(), options, sink }
    }

    /// Build the schema for a document root, which must be a mapping.
    pub fn build(&self, root: &Node) -> Result<SchemaNode> {
        let Some(pairs) = root.as_mapping() else {
            return Err(Error::Structural(format!(
                "expected a mapping at the document root, found a {}",
                root.kind_name()
            )));
        };
        let mut schema = self.build_mapping(None, pairs)?;
        schema.schema = DRAFT_07_URI.to_string();
        tracing::trace!(
            file = %self.file_path,
            properties = ?schema.property_iter().map(|(name, _)| name).collect::<Vec<_>>(),
            "built schema"
        );
        Ok(schema)
    }

    fn build_value(&self, key: &Node, value: &Node) -> Result<SchemaNode> {
        match &value.kind {
            NodeKind::Scalar(scalar) => self.build_scalar(key, scalar),
            NodeKind::Sequence(_) => self.build_sequence(key),
            NodeKind::Mapping(pairs) => self.build_mapping(Some(key), pairs),
        }
    }

    fn build_scalar(&self, key: &Node, scalar: &Scalar) -> Result<SchemaNode> {
        let mut defaults = Fragment::new();
        if let Some(type_) = scalar_type(key, scalar)? {
            defaults = defaults.with("type", type_.as_str());
        }
        defaults = defaults.with("title", key.text());
        if let Some(default) = typed_value(scalar) {
            defaults = defaults.with("default", default);
        }
        Ok(self.annotate(key, defaults)?.schema)
    }

    /// Items stay unconstrained.
    fn build_sequence(&self, key: &Node) -> Result<SchemaNode> {
        let defaults = Fragment::new()
            .with("type", SchemaType::Array.as_str())
            .with("title", key.text());
        Ok(self.annotate(key, defaults)?.schema)
    }

    fn build_mapping(&self, key: Option<&Node>, pairs: &[(Node, Node)]) -> Result<SchemaNode> {
        let defaults = Fragment::new()
            .with("type", SchemaType::Object.as_str())
            .with("additionalProperties", false);

        let annotation = match key {
            Some(key) => self.annotate(key, defaults.with("title", key.text()))?,
            // the root has no key, hence no head comment
            None => Annotation::without_overrides(SchemaNode {
                type_: Some(SchemaType::Object),
                additional_properties: Some(BoolOrSchema::Bool(false)),
                ..SchemaNode::default()
            }),
        };
        let additional_set_by_comment = annotation.overrides("additionalProperties");
        let mut schema = annotation.schema;

        let mut properties = IndexMap::with_capacity(pairs.len());
        for (child_key, child_value) in pairs {
            let child = self.build_value(child_key, child_value).inspect_err(|error| {
                tracing::debug!(
                    key = child_key.text(),
                    kind = child_value.kind_name(),
                    %error,
                    "failed to build value"
                );
            })?;
            properties.insert(child_key.text().to_string(), child);
        }

        // free-form map
        if properties.is_empty() && !additional_set_by_comment {
            schema.additional_properties = Some(BoolOrSchema::Bool(true));
        }
        schema.properties = Some(properties);
        Ok(schema)
    }

    /// Run the annotation parser, applying the strictness policy to failures.
    fn annotate(&self, key: &Node, defaults: Fragment) -> Result<Annotation> {
        let failure = match annotation::parse(key, defaults) {
            Ok(annotation) => return Ok(annotation),
            Err(failure) => failure,
        };
        let AnnotationFailure { fallback, error } = *failure;
        let error = error.with_file_path(self.file_path.clone());
        error.log(self.sink);

        if self.options.strict {
            return Err(error.into());
        }
        self.sink.warn(&format!("doc comment error: {error}"));
        Ok(Annotation::without_overrides(fallback))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Schema type for a scalar's tag. Null scalars stay untyped.
fn scalar_type(key: &Node, scalar: &Scalar) -> Result<Option<SchemaType>> {
    match scalar.tag.as_str() {
        tags::STR => Ok(Some(SchemaType::String)),
        tags::INT | tags::FLOAT => Ok(Some(SchemaType::Number)),
        tags::BOOL => Ok(Some(SchemaType::Boolean)),
        tags::NULL => Ok(None),
        other => Err(Error::UnsupportedTag {
            tag: other.to_string(),
            key: key.text().to_string(),
            line: key.line,
        }),
    }
}

/// The scalar's value as its tag reads it.
///
/// Nulls and non-finite floats have no JSON form and yield `None`. Text
/// that does not parse under an explicit `!!int`/`!!float` tag is kept as
/// a string.
fn typed_value(scalar: &Scalar) -> Option<Value> {
    let text = scalar.value.as_str();
    match scalar.tag.as_str() {
        tags::NULL => None,
        tags::BOOL => Some(Value::Bool(text.eq_ignore_ascii_case("true"))),
        tags::INT => Some(parse_int(text).unwrap_or_else(|| Value::String(text.to_string()))),
        tags::FLOAT => match parse_float(text) {
            Some(value) if value.is_finite() => Some(Value::from(value)),
            Some(_) => None,
            None => Some(Value::String(text.to_string())),
        },
        _ => Some(Value::String(text.to_string())),
    }
}

fn parse_int(text: &str) -> Option<Value> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let radix = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| digits.strip_prefix(prefix).map(|rest| (rest, radix)));
    let magnitude = match radix {
        Some((rest, radix)) => u64::from_str_radix(rest, radix).ok()?,
        None => digits.parse::<u64>().ok()?,
    };
    if !negative {
        return Some(Value::from(magnitude));
    }
    let signed = i64::try_from(magnitude).ok()?;
    Some(Value::from(-signed))
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ => text.parse().ok(),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
