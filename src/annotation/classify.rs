use serde_yaml::Value;

/// What a single `---`-delimited piece of an annotation turned out to be.
#[derive(Clone, Debug, PartialEq)]
pub enum SubDocument {
    /// Nothing but whitespace or YAML comments.
    Empty,
    /// Free text that documents the key.
    Description(String),
    /// Explicit schema field overrides, in source order.
    Fields(Vec<Field>),
    /// Parsed, but not a shape that means anything (e.g. a sequence).
    Ignored,
    /// Not valid YAML.
    Unparsable(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
    /// 0-based line inside the sub-document where the field is declared.
    pub line: Option<usize>,
}

// ------------------------------- Policy ---------------------------------- //

/// A lone key with more spaces than this is prose that happened to contain a colon.
const PROSE_KEY_MAX_SPACES: usize = 1;

// ----------------------------- Classification ----------------------------- //

pub fn classify(text: &str) -> SubDocument {
    if is_blank(text) {
        return SubDocument::Empty;
    }
    let value = match serde_yaml::from_str::<Value>(text) {
        Ok(value) => value,
        Err(error) => return SubDocument::Unparsable(error.to_string()),
    };

    match value {
        Value::Mapping(map) => {
            if map.len() == 1 {
                if let Some((Value::String(key), _)) = map.iter().next() {
                    if key.matches(' ').count() > PROSE_KEY_MAX_SPACES {
                        return SubDocument::Description(text.trim().to_string());
                    }
                }
            }
            let fields = map
                .into_iter()
                .filter_map(|(key, value)| {
                    let name = key_name(&key)?;
                    let line = field_line(text, &name);
                    Some(Field { name, value, line })
                })
                .collect();
            SubDocument::Fields(fields)
        }
        Value::Sequence(_) => SubDocument::Ignored,
        _ => SubDocument::Description(text.trim().to_string()),
    }
}

/// Whitespace and YAML comments only.
fn is_blank(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

fn key_name(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Line of the top-level `name:` declaration.
fn field_line(text: &str, name: &str) -> Option<usize> {
    let quoted = [name.to_string(), format!("\"{name}\""), format!("'{name}'")];
    text.lines().position(|line| {
        quoted.iter().any(|key| {
            line.strip_prefix(key.as_str())
                .is_some_and(|rest| rest.trim_start().starts_with(':'))
        })
    })
}
