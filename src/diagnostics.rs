//! Line-accurate reporting for malformed annotations.
//!
//! A `CommentError` remembers the key whose head comment failed to parse.
//! `render` rebuilds that comment as numbered source lines followed by a
//! synthetic `key: ...` line, so the report points at the real file
//! position even though the annotation was decoded on its own.
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::document::Node;
use crate::path_de::PathError;

// ————————————————————————————————————————————————————————————————————————————
// SINKS
// ————————————————————————————————————————————————————————————————————————————

/// Receiver for warnings produced while building and linting a schema.
pub trait DiagnosticSink {
    fn warn(&self, message: &str);
}

/// Forwards every diagnostic to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Keeps diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl DiagnosticSink for MemorySink {
    fn warn(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnotationCause {
    /// An annotation line does not start with `# `.
    #[error("unexpected prefix: {line} ({index} of {total} lines)")]
    UnexpectedPrefix {
        line: String,
        index: usize,
        total: usize,
    },
    /// The merged annotation does not decode into a schema node.
    #[error("{}", decode_message(.error, .line))]
    Decode {
        error: PathError,
        /// 1-based line within the head comment that declared the field.
        line: Option<usize>,
    },
}

fn decode_message(error: &PathError, line: &Option<usize>) -> String {
    match line {
        Some(line) => format!("line {line}: {error}"),
        None => error.to_string(),
    }
}

#[derive(Debug, Clone, Error)]
#[error("{cause}")]
pub struct CommentError {
    pub file_path: String,
    pub key: String,
    pub key_line: usize,
    pub head_comment: String,
    pub cause: AnnotationCause,
}

impl CommentError {
    pub fn new(key: &Node, cause: AnnotationCause) -> Self {
        Self {
            file_path: String::new(),
            key: key.text().to_string(),
            key_line: key.line,
            head_comment: key.head_comment.clone(),
            cause,
        }
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }

    fn comment_lines(&self) -> Vec<&str> {
        if self.head_comment.is_empty() {
            Vec::new()
        } else {
            self.head_comment.split('\n').collect()
        }
    }

    /// Absolute file line of the first head comment line.
    pub fn first_comment_line(&self) -> usize {
        self.key_line.saturating_sub(self.comment_lines().len())
    }

    /// The cause with comment-relative line numbers rewritten to file lines.
    pub fn absolute_cause(&self) -> AnnotationCause {
        match &self.cause {
            AnnotationCause::Decode { error, line: Some(line) } => AnnotationCause::Decode {
                error: error.clone(),
                line: Some(self.first_comment_line() + line - 1),
            },
            other => other.clone(),
        }
    }

    /// Multi-line, compiler-style report.
    pub fn render(&self) -> String {
        let mut lines = self.comment_lines();
        let key_line = format!("{}: ...", self.key);
        lines.push(&key_line);

        let first = (self.key_line + 1).saturating_sub(lines.len());
        let width = self.key_line.to_string().len();

        let mut out = format!("{}\n----| {}", self.absolute_cause(), self.file_path);
        for (i, content) in lines.iter().enumerate() {
            out.push_str(&format!("\n{:>width$} |  {}", first + i, content));
        }
        out
    }

    /// Emit the rendered report, one warning per line.
    pub fn log(&self, sink: &dyn DiagnosticSink) {
        for line in self.render().lines() {
            sink.warn(line);
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
