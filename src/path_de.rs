use std::fmt;
use serde::de::DeserializeOwned;
use serde_path_to_error::Segment;

/// Decode failure with the field path where it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct PathError {
    /// Dotted path, e.g. `oneOf[0].type`.
    pub path: String,
    /// First path segment when it names a mapping key.
    pub field: Option<String>,
    pub message: String,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(_) => write!(f, "field `{}`: {}", self.path, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Deserialize a YAML value with field-path context in error messages.
pub fn from_yaml_value_with_path<T: DeserializeOwned>(value: serde_yaml::Value) -> Result<T, PathError> {
    match serde_path_to_error::deserialize::<_, T>(value) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            let field = err.path().iter().next().and_then(|segment| match segment {
                Segment::Map { key } => Some(key.clone()),
                _ => None,
            });
            Err(PathError { path, field, message: err.into_inner().to_string() })
        }
    }
}
