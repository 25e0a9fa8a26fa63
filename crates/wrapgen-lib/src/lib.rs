//! wrapgen: generates JavaScript-engine bindings from a parsed C++ AST.
//!
//! The pipeline, leaves first:
//! - `diagnostics` - error/warning collection with scoped per-class sinks
//! - `inspect` - type stringification, template substitution, JSDoc
//!   conversion, root-include computation
//! - `model` - the class model: `WrappedClass`, parsed functions, data
//!   members, enums
//! - `discover` - the driver consuming frontend match events
//! - `validate` - end-of-translation-unit per-class checks
//! - `partition` - topological ordering and packing into binding files
//! - `output` - the three artifact families: bindings, JS stub,
//!   bidirectional headers
//!
//! Parsing C++ is delegated to an external frontend; its contract is the
//! `ast` module of `wrapgen-core`, re-exported here.

pub mod diagnostics;
pub mod discover;
pub mod host;
pub mod inspect;
pub mod model;
pub mod output;
pub mod partition;
pub mod validate;

#[cfg(test)]
mod discover_tests;
#[cfg(test)]
pub mod test_utils;

pub use wrapgen_core::{annotations, ast, config};

pub use diagnostics::{Diagnostics, Log, Severity};
pub use discover::Driver;
pub use model::Analyzer;

/// Errors that abort the run immediately (structural / API misuse); data
/// errors instead accumulate in per-class diagnostics and surface as
/// [`Error::AnalysisFailed`] at end of translation unit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] wrapgen_core::config::ConfigError),

    #[error("inconsistent AST: {0}")]
    InconsistentAst(String),

    #[error("analysis failed with {} errors", .0.error_count())]
    AnalysisFailed(Diagnostics),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
