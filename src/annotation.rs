//! Head comment → schema fragment.
//!
//! A key's head comment is read as one or more small YAML documents
//! separated by `---` lines. Each document is either free text (the key's
//! description) or a map of JSON Schema fields. The builder's computed
//! defaults and every override are laid out as one ordered list of
//! `field: value` entries, folded into a single mapping where later entries
//! replace earlier ones, and decoded once into a `SchemaNode`. Overrides
//! therefore win over defaults, and any field the model knows can be set
//! from a comment without per-field merge code.
pub mod classify;

use indexmap::IndexSet;
use serde_yaml::{Mapping, Value};

use crate::diagnostics::{AnnotationCause, CommentError};
use crate::document::Node;
use crate::path_de;
use crate::schema::SchemaNode;

pub use classify::{classify, Field, SubDocument};

/// Every annotation line must start with exactly this.
pub const LINE_PREFIX: &str = "# ";

/// Separator line between annotation documents.
pub const DOCUMENT_SEPARATOR: &str = "---";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Ordered `field: value` entries awaiting a single decode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fragment {
    entries: Vec<Entry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub field: String,
    pub value: Value,
    pub origin: Origin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Supplied by the builder from the value's shape.
    Computed,
    /// Written in the head comment, at this 1-based comment line.
    Comment { line: usize },
}

/// A successfully merged annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub schema: SchemaNode,
    overridden: IndexSet<String>,
}

/// A failed annotation: the error plus the computed-defaults-only schema.
#[derive(Debug)]
pub struct AnnotationFailure {
    pub fallback: SchemaNode,
    pub error: CommentError,
}

// ————————————————————————————————————————————————————————————————————————————
// FRAGMENT
// ————————————————————————————————————————————————————————————————————————————

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a computed default.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, value.into(), Origin::Computed);
        self
    }

    pub fn push(&mut self, field: &str, value: Value, origin: Origin) {
        self.entries.push(Entry { field: field.to_string(), value, origin });
    }

    /// Fold entries into one mapping; a repeated field keeps its last value.
    pub fn to_mapping(&self) -> Mapping {
        let mut mapping = Mapping::new();
        for entry in &self.entries {
            mapping.insert(Value::String(entry.field.clone()), entry.value.clone());
        }
        mapping
    }

    /// Decode the folded mapping into a schema node.
    pub fn decode(&self) -> Result<SchemaNode, AnnotationCause> {
        path_de::from_yaml_value_with_path(Value::Mapping(self.to_mapping())).map_err(|error| {
            let line = error.field.as_deref().and_then(|field| self.comment_line_of(field));
            AnnotationCause::Decode { error, line }
        })
    }

    /// Comment line of the entry that decides `field`, if that entry came from the comment.
    fn comment_line_of(&self, field: &str) -> Option<usize> {
        let entry = self.entries.iter().rev().find(|entry| entry.field == field)?;
        match entry.origin {
            Origin::Comment { line } => Some(line),
            Origin::Computed => None,
        }
    }

    fn overridden(&self) -> IndexSet<String> {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.origin, Origin::Comment { .. }))
            .map(|entry| entry.field.clone())
            .collect()
    }
}

impl Annotation {
    /// A schema with no comment fields applied.
    pub fn without_overrides(schema: SchemaNode) -> Self {
        Self { schema, overridden: IndexSet::new() }
    }

    /// Whether the head comment set `field` explicitly.
    pub fn overrides(&self, field: &str) -> bool {
        self.overridden.contains(field)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PARSER
// ————————————————————————————————————————————————————————————————————————————

/// Merge `defaults` with the overrides in `key`'s head comment.
///
/// On failure the returned `AnnotationFailure` still carries a schema built
/// from `defaults` alone.
pub fn parse(key: &Node, defaults: Fragment) -> Result<Annotation, Box<AnnotationFailure>> {
    let fail = |cause: AnnotationCause, defaults: &Fragment| {
        Box::new(AnnotationFailure {
            fallback: defaults.decode().unwrap_or_default(),
            error: CommentError::new(key, cause),
        })
    };

    if key.head_comment.is_empty() {
        return match defaults.decode() {
            Ok(schema) => Ok(Annotation { schema, overridden: IndexSet::new() }),
            Err(cause) => Err(fail(cause, &defaults)),
        };
    }

    let documents = match split_documents(&key.head_comment) {
        Ok(documents) => documents,
        Err(cause) => return Err(fail(cause, &defaults)),
    };

    let mut merged = defaults.clone();
    for document in &documents {
        match classify(&document.text) {
            SubDocument::Description(text) => {
                merged.push("description", Value::String(text), Origin::Comment { line: document.first_line });
            }
            SubDocument::Fields(fields) => {
                for field in fields {
                    let line = document.first_line + field.line.unwrap_or(0);
                    merged.push(&field.name, field.value, Origin::Comment { line });
                }
            }
            SubDocument::Unparsable(reason) => {
                tracing::trace!(key = key.text(), %reason, "skipping annotation document");
            }
            SubDocument::Ignored => {
                tracing::trace!(key = key.text(), "skipping sequence annotation document");
            }
            SubDocument::Empty => {}
        }
    }

    match merged.decode() {
        Ok(schema) => Ok(Annotation { schema, overridden: merged.overridden() }),
        Err(cause) => Err(fail(cause, &defaults)),
    }
}

/// One `---`-delimited annotation document.
#[derive(Clone, Debug, PartialEq)]
pub struct CommentDocument {
    pub text: String,
    /// 1-based line of the document's first line within the head comment.
    pub first_line: usize,
}

/// Strip the `# ` prefix from the last paragraph of `head_comment` and cut
/// it into documents.
///
/// Only the text after the last blank line is read; earlier paragraphs are
/// dropped.
pub fn split_documents(head_comment: &str) -> Result<Vec<CommentDocument>, AnnotationCause> {
    let lines = head_comment.split('\n').collect::<Vec<_>>();
    // TODO: leading paragraphs are discarded; confirm whether they should feed `description`.
    let start = lines.iter().rposition(|line| line.trim().is_empty()).map_or(0, |i| i + 1);
    let paragraph = &lines[start..];

    let mut stripped = Vec::with_capacity(paragraph.len());
    for (i, line) in paragraph.iter().enumerate() {
        match line.strip_prefix(LINE_PREFIX) {
            Some(rest) => stripped.push(rest),
            None => {
                return Err(AnnotationCause::UnexpectedPrefix {
                    line: line.to_string(),
                    index: i + 1,
                    total: paragraph.len(),
                });
            }
        }
    }

    let mut documents = Vec::new();
    let mut current = CommentDocument { text: String::new(), first_line: start + 1 };
    let mut current_lines = Vec::new();
    for (i, line) in stripped.iter().enumerate() {
        if line.trim() == DOCUMENT_SEPARATOR {
            current.text = current_lines.join("\n");
            documents.push(current);
            current = CommentDocument { text: String::new(), first_line: start + i + 2 };
            current_lines = Vec::new();
            continue;
        }
        current_lines.push(*line);
    }
    current.text = current_lines.join("\n");
    documents.push(current);

    Ok(documents)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;
    use crate::schema::{BoolOrSchema, SchemaType};
    use serde_json::json;

    /// First key of a one-key document.
    fn first_key(src: &str) -> Node {
        let root = document::load(src).unwrap();
        root.as_mapping().unwrap()[0].0.clone()
    }

    fn parse_ok(src: &str) -> SchemaNode {
        parse(&first_key(src), Fragment::new()).unwrap().schema
    }

    #[test]
    fn no_comment_yields_only_defaults() {
        let key = first_key("foo: bar\n");
        let defaults = Fragment::new().with("type", "string").with("title", "foo");
        let schema = parse(&key, defaults).unwrap().schema;
        assert_eq!(schema.type_, Some(SchemaType::String));
        assert_eq!(schema.title, "foo");
        assert_eq!(schema.description, "");
    }

    #[test]
    fn missing_space_prefix_is_an_error() {
        let key = first_key("#comment has no lead space\nfoo: bar\n");
        let failure = parse(&key, Fragment::new().with("title", "foo")).unwrap_err();
        assert!(failure.error.to_string().contains("unexpected prefix"), "{}", failure.error);
        assert_eq!(failure.fallback.title, "foo");
    }

    #[test]
    fn invalid_yaml_document_is_skipped() {
        let schema = parse_ok("# @invalid yaml string\nfoo: bar\n");
        assert_eq!(schema, SchemaNode::default());
    }

    #[test]
    fn bare_string_becomes_description() {
        let schema = parse_ok("# comment is just a string\nfoo: bar\n");
        assert_eq!(schema.description, "comment is just a string");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        assert_eq!(parse_ok("# key: value\nfoo: bar\n"), SchemaNode::default());
    }

    #[test]
    fn sets_default() {
        assert_eq!(parse_ok("# default: baz\nfoo: bar\n").default, Some(json!("baz")));
    }

    #[test]
    fn sets_multiline_default() {
        let schema = parse_ok("# default: |\n#   foo\n#   bar\nfoo: bar\n");
        assert_eq!(schema.default, Some(json!("foo\nbar")));
    }

    #[test]
    fn description_from_second_document() {
        let schema = parse_ok("# default: baz\n# ---\n# this is a description\nfoo: bar\n");
        assert_eq!(schema.default, Some(json!("baz")));
        assert_eq!(schema.description, "this is a description");
    }

    #[test]
    fn single_line_fields() {
        let schema = parse_ok(
            "# $schema: https://example.com/schema\n\
             # format: some format\n\
             # minLength: 5\n\
             # deprecated: true\n\
             # required: [foo, bar]\n\
             # maximum: 100\n\
             foo: bar\n",
        );
        assert_eq!(schema.schema, "https://example.com/schema");
        assert_eq!(schema.format, "some format");
        assert_eq!(schema.min_length, Some(5));
        assert!(schema.deprecated);
        assert_eq!(schema.required.iter().collect::<Vec<_>>(), vec!["foo", "bar"]);
        assert_eq!(schema.maximum, Some(serde_json::Number::from(100u64)));
    }

    #[test]
    fn one_of_with_multiple_lines() {
        let schema = parse_ok(
            "# oneOf:\n\
             #   - type: string\n\
             #     description: this is a string\n\
             #   - type: number\n\
             #     description: this is a number\n\
             foo: bar\n",
        );
        assert_eq!(schema.one_of.len(), 2);
        assert_eq!(schema.one_of[0].type_, Some(SchemaType::String));
        assert_eq!(schema.one_of[1].description, "this is a number");
    }

    #[test]
    fn dependent_required_and_dependencies() {
        let schema = parse_ok(
            "# dependentRequired:\n\
             #   baz:\n\
             #     - qux\n\
             #     - quux\n\
             #   bif:\n\
             #     - quuz\n\
             # dependencies:\n\
             #   baz: qux\n\
             #   bif: 0\n\
             #   qux:\n\
             #     - quux\n\
             #     - quuz\n\
             foo: bar # line comment\n",
        );
        assert_eq!(schema.dependent_required["baz"], vec!["qux", "quux"]);
        assert_eq!(schema.dependent_required["bif"], vec!["quuz"]);
        assert_eq!(schema.dependencies["baz"], json!("qux"));
        assert_eq!(schema.dependencies["bif"], json!(0));
        assert_eq!(schema.dependencies["qux"], json!(["quux", "quuz"]));
    }

    #[test]
    fn pattern_is_compiled() {
        let schema = parse_ok("# pattern: ^[a-z]+$\nfoo: bar\n");
        assert!(schema.pattern.unwrap().regex().is_match("abc"));
    }

    #[test]
    fn separator_inside_a_line_does_not_split() {
        let schema = parse_ok("# pattern: ^a---b$\nfoo: bar\n");
        assert_eq!(schema.pattern.unwrap().as_str(), "^a---b$");
        assert_eq!(split_documents("# pattern: ^a---b$").unwrap().len(), 1);
    }

    #[test]
    fn keyword_without_value_reads_as_empty() {
        let key = first_key("# description:\n# title:\n# deprecated:\n# required:\nfoo: bar\n");
        let defaults = Fragment::new().with("title", "foo");
        let annotation = parse(&key, defaults).unwrap();
        assert_eq!(annotation.schema.description, "");
        assert_eq!(annotation.schema.title, "");
        assert!(!annotation.schema.deprecated);
        assert!(annotation.schema.required.is_empty());
        assert!(annotation.overrides("title"));
    }

    #[test]
    fn sequence_document_is_skipped() {
        assert_eq!(parse_ok("# - a\n# - b\nfoo: bar\n"), SchemaNode::default());
    }

    #[test]
    fn overrides_win_over_defaults() {
        let key = first_key("# type: string\n# maxLength: 5\nfoo: 1\n");
        let defaults = Fragment::new().with("type", "number").with("title", "foo");
        let annotation = parse(&key, defaults).unwrap();
        assert_eq!(annotation.schema.type_, Some(SchemaType::String));
        assert_eq!(annotation.schema.max_length, Some(5));
        assert!(annotation.overrides("type"));
        assert!(!annotation.overrides("title"));
    }

    #[test]
    fn later_documents_win() {
        let schema = parse_ok("# default: a\n# ---\n# default: b\nfoo: bar\n");
        assert_eq!(schema.default, Some(json!("b")));
    }

    #[test]
    fn only_last_paragraph_is_read() {
        let schema = parse_ok("# leading prose\n\n# default: x\nfoo: bar\n");
        assert_eq!(schema.description, "");
        assert_eq!(schema.default, Some(json!("x")));
    }

    #[test]
    fn malformed_earlier_paragraph_is_not_checked() {
        let schema = parse_ok("#banner\n\n# description: fine\nfoo: bar\n");
        assert_eq!(schema.description, "fine");
    }

    #[test]
    fn additional_properties_override() {
        let key = first_key("# additionalProperties: true\nfoo: {}\n");
        let defaults = Fragment::new().with("type", "object").with("additionalProperties", false);
        let annotation = parse(&key, defaults).unwrap();
        assert_eq!(annotation.schema.additional_properties, Some(BoolOrSchema::Bool(true)));
        assert!(annotation.overrides("additionalProperties"));
    }

    #[test]
    fn decode_failure_points_at_comment_line() {
        let key = first_key("# title: Name\n# maxLength: lots\nname: x\n");
        let defaults = Fragment::new().with("type", "string").with("title", "name");
        let failure = parse(&key, defaults).unwrap_err();
        match &failure.error.cause {
            AnnotationCause::Decode { error, line } => {
                assert_eq!(error.path, "maxLength");
                assert_eq!(*line, Some(2));
            }
            other => panic!("unexpected cause {other:?}"),
        }
        // no override survives into the fallback
        assert_eq!(failure.fallback.title, "name");
        assert_eq!(failure.fallback.max_length, None);
        assert!(failure.error.render().starts_with("line 2: field `maxLength`"));
    }

    #[test]
    fn invalid_pattern_is_decode_error() {
        let key = first_key("# pattern: '[a-'\nfoo: bar\n");
        let failure = parse(&key, Fragment::new()).unwrap_err();
        assert!(failure.error.to_string().contains("invalid pattern"), "{}", failure.error);
    }

    #[test]
    fn split_tracks_document_lines() {
        let documents = split_documents("# intro\n\n# a: 1\n# ---\n# b: 2").unwrap();
        assert_eq!(documents, vec![
            CommentDocument { text: "a: 1".to_string(), first_line: 3 },
            CommentDocument { text: "b: 2".to_string(), first_line: 5 },
        ]);
    }

    #[test]
    fn bare_hash_line_violates_prefix() {
        let err = split_documents("# a\n#\n# b").unwrap_err();
        assert_eq!(err, AnnotationCause::UnexpectedPrefix { line: "#".to_string(), index: 2, total: 3 });
    }
}
