//! Stave CLI library
//!
//! This module contains the core CLI logic for the Stave layout tool.

pub mod error_adapter;

mod args;
mod config;
mod error;
mod score_file;

pub use args::{Args, Breaker};
pub use error::CliError;
pub use error_adapter::ErrorAdapter;

use std::fs;

use log::info;

use stave::{ScoreLayouter, meter::GlyphMeter};

/// Run the Stave CLI application
///
/// This function reads the score file, lays it out and writes the resulting
/// SVG to the output file.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed score files
/// - Layout errors
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing score"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(breaker) = args.breaker {
        let line_break = app_config.line_break().clone().with_breaker(breaker.into());
        app_config = app_config.with_line_break(line_break);
    }

    let meter = GlyphMeter::for_staff_line_spacing(app_config.spacing().staff_line_spacing());

    let source = fs::read_to_string(&args.input)?;
    let table = score_file::parse_score(&source, &meter)?;

    let layouter = ScoreLayouter::new(app_config).with_column_dump(args.dump_columns);
    let layout = layouter.layout(&table, &meter)?;
    if let Some(dump) = layout.column_dump() {
        print!("{dump}");
    }

    let svg = layouter.render_svg(&layout)?;
    fs::write(&args.output, svg)?;

    info!(output_file = args.output, systems = layout.systems().len(); "SVG exported successfully");

    Ok(())
}
