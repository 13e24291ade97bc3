//! Export of laid out scores.
//!
//! The [`Exporter`] trait is the last stage of a layout pass:
//!
//! ```text
//! SymbolTable
//!     ↓ scan + measure
//! Columns of time slices
//!     ↓ spacing, line breaking, justification
//! ScoreLayout
//!     ↓ export (this module)
//! Output
//! ```
//!
//! # Available Backends
//!
//! - [`svg`] - A debug drawing of shape boxes over empty staves
//!
//! Export operations return [`Error`], which converts into
//! [`StaveError::Export`](crate::StaveError::Export) at the crate boundary.

/// SVG export backend.
pub mod svg;

use crate::layout::ScoreLayout;

/// Abstraction for export backends.
pub trait Exporter {
    /// Exports a laid out score to the backend's output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the layout cannot be converted to the
    /// target format, or [`Error::Io`] if writing the output fails.
    fn export_score_layout(&mut self, layout: &ScoreLayout) -> Result<(), Error>;
}

/// Errors that can occur during export.
#[derive(Debug)]
pub enum Error {
    /// A rendering or conversion failure described by `message`.
    Render(String),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}
