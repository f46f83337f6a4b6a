use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostics::CommentError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// A key's head comment could not be turned into schema fields.
    #[error("doc comment error: {0}")]
    Comment(#[from] Box<CommentError>),

    /// A scalar carries a tag with no JSON Schema type.
    #[error("unsupported yaml tag `{tag}` on key `{key}` (line {line})")]
    UnsupportedTag {
        tag: String,
        key: String,
        line: usize,
    },

    /// The document does not have the shape a values file must have.
    #[error("{0}")]
    Structural(String),

    #[error("failed to parse yaml: {0}")]
    Yaml(#[from] yaml_rust2::ScanError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid chart metadata in {path}: {source}")]
    ChartMetadata {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid chart path pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl From<CommentError> for Error {
    fn from(error: CommentError) -> Self {
        Self::Comment(Box::new(error))
    }
}
