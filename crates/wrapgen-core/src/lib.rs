//! Core data structures for wrapgen.
//!
//! Three layers:
//! - `ast` - the facade over the external C++ frontend: records, methods,
//!   fields, qualified types, doxygen comments, and the match-event stream
//! - `annotations` - annotation sets and the per-translation-unit registries
//!   that associate annotations and name aliases with declarations
//! - `config` - the JSON configuration document with typed accessors

pub mod annotations;
pub mod ast;
pub mod config;
pub mod utils;

#[cfg(test)]
mod config_tests;

pub use annotations::{AnnotationRegistry, AnnotationSet};
pub use ast::{AstContext, QualType, RecordId, TemplateId};
pub use config::{Config, ConfigError};
