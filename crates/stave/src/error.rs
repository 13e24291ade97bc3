//! Error types for Stave operations.
//!
//! The spacing computation itself is total. Errors only arise at the
//! boundary: invalid configuration, a malformed symbol table, or a failure
//! while exporting the result.

use thiserror::Error;

use stave_core::symbol::TableError;

use crate::config::ConfigError;

/// The main error type for Stave operations.
#[derive(Debug, Error)]
pub enum StaveError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid symbol table: {0}")]
    Table(#[from] TableError),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error + Send + Sync>),
}

impl From<crate::export::Error> for StaveError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}
