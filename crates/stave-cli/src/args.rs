//! Command-line argument definitions for the Stave CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, the line breaker, column dumps and logging verbosity.

use clap::{Parser, ValueEnum};

use stave::config::BreakerKind;

/// Line breaker selectable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breaker {
    /// Fill each system greedily.
    Simple,
    /// Minimise the total penalty over all systems.
    Optimal,
}

impl From<Breaker> for BreakerKind {
    fn from(breaker: Breaker) -> Self {
        match breaker {
            Breaker::Simple => Self::Simple,
            Breaker::Optimal => Self::Optimal,
        }
    }
}

/// Command-line arguments for the Stave layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input score file (TOML)
    #[arg(help = "Path to the input score file")]
    pub input: String,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Line breaker, overriding the configuration file
    #[arg(short, long, value_enum)]
    pub breaker: Option<Breaker>,

    /// Print the spacing table of every column to stdout
    #[arg(long)]
    pub dump_columns: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
