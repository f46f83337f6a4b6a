//! Documentation linter: flags titled values that lack a description or a type.
use std::fmt;

use crate::diagnostics::DiagnosticSink;
use crate::schema::SchemaNode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LintWarning {
    /// No description on the value and no `$ref` along its path.
    Undocumented(String),
    Untyped(String),
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undocumented(path) => write!(f, "value is undocumented: {path}"),
            Self::Untyped(path) => write!(f, "value has no type: {path}"),
        }
    }
}

/// Walk every property depth-first, report each warning to `sink` and return them.
pub fn lint(schema: &SchemaNode, sink: &dyn DiagnosticSink) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    schema.walk_properties(|ancestors, node| {
        if node.title.is_empty() {
            return;
        }
        if !is_documented(ancestors, node) {
            warnings.push(LintWarning::Undocumented(key_path(ancestors, node)));
        }
        if node.type_.is_none() {
            warnings.push(LintWarning::Untyped(key_path(ancestors, node)));
        }
    });
    for warning in &warnings {
        sink.warn(&warning.to_string());
    }
    warnings
}

fn is_documented(ancestors: &[&SchemaNode], node: &SchemaNode) -> bool {
    !node.description.is_empty()
        || !node.reference.is_empty()
        || ancestors.iter().any(|ancestor| !ancestor.reference.is_empty())
}

/// Dotted titles from the root down to `node`, skipping untitled levels.
fn key_path(ancestors: &[&SchemaNode], node: &SchemaNode) -> String {
    ancestors
        .iter()
        .copied()
        .chain(std::iter::once(node))
        .filter(|schema| !schema.title.is_empty())
        .map(|schema| schema.title.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::schema::SchemaType;
    use indexmap::IndexMap;

    fn node(title: &str, type_: Option<SchemaType>, description: &str) -> SchemaNode {
        SchemaNode {
            title: title.to_string(),
            type_,
            description: description.to_string(),
            ..SchemaNode::default()
        }
    }

    fn with_children(mut parent: SchemaNode, children: Vec<SchemaNode>) -> SchemaNode {
        let properties = children
            .into_iter()
            .map(|child| (child.title.clone(), child))
            .collect::<IndexMap<_, _>>();
        parent.properties = Some(properties);
        parent
    }

    #[test]
    fn reports_undocumented_leaf_once_with_dotted_path() {
        let image = with_children(node("image", Some(SchemaType::Object), "container image"), vec![
            node("tag", Some(SchemaType::String), ""),
            node("repository", Some(SchemaType::String), "registry path"),
        ]);
        let root = with_children(SchemaNode::default(), vec![image]);

        let sink = MemorySink::new();
        let warnings = lint(&root, &sink);
        assert_eq!(warnings, vec![LintWarning::Undocumented("image.tag".to_string())]);
        assert_eq!(sink.lines(), vec!["value is undocumented: image.tag".to_string()]);
    }

    #[test]
    fn reference_on_any_ancestor_documents_descendants() {
        let mut parent = node("ingress", Some(SchemaType::Object), "");
        parent.reference = "#/definitions/ingress".to_string();
        let root = with_children(SchemaNode::default(), vec![with_children(parent, vec![
            node("host", Some(SchemaType::String), ""),
        ])]);
        assert!(lint(&root, &MemorySink::new()).is_empty());
    }

    #[test]
    fn reports_untyped_values() {
        let root = with_children(SchemaNode::default(), vec![node("nothing", None, "a null")]);
        let warnings = lint(&root, &MemorySink::new());
        assert_eq!(warnings, vec![LintWarning::Untyped("nothing".to_string())]);
        assert_eq!(warnings[0].to_string(), "value has no type: nothing");
    }

    #[test]
    fn untitled_root_is_skipped() {
        assert!(lint(&SchemaNode::default(), &MemorySink::new()).is_empty());
    }
}
