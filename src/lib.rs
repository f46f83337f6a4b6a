//! Compile doc comments in helm `values.yaml` files into JSON Schema (draft-07).
//!
//! ```text
//! # description: replica count
//! # minimum: 1
//! replicas: 3
//! ```
//!
//! becomes a `replicas` property of type `number` with `default: 3`, the
//! description and the lower bound. See [`generate`].
pub mod annotation;
pub mod builder;
pub mod chart;
pub mod cli;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod lint;
pub mod modeline;
pub mod path_de;
pub mod plan;
pub mod schema;

pub use builder::{generate, BuildOptions, SchemaBuilder};
pub use diagnostics::{CommentError, DiagnosticSink, MemorySink, TracingSink};
pub use error::{Error, Result};
pub use lint::LintWarning;
pub use schema::SchemaNode;
