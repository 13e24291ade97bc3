//! Error type of the CLI.

use std::{io, path::PathBuf};

use thiserror::Error;

use stave::StaveError;

/// Errors reported by the Stave CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Missing configuration file: {0}")]
    MissingConfig(PathBuf),

    #[error("Failed to parse TOML configuration: {0}")]
    Config(String),

    #[error("Invalid score file: {0}")]
    Score(String),

    #[error(transparent)]
    Stave(#[from] StaveError),
}
