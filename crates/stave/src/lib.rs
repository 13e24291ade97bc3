//! Stave - horizontal spacing and line breaking for music notation.
//!
//! Stave positions the symbols of a score along the x axis with Gourlay's
//! spring-and-rod model, chooses where to break the score into systems, and
//! justifies every system to the line width. It works on a time-ordered
//! [`SymbolTable`](stave_core::symbol::SymbolTable) and a
//! [`ShapeMeter`](stave_core::shape::ShapeMeter); it never parses a notation
//! format and never draws glyphs.

pub mod config;
pub mod export;
pub mod layout;
pub mod linebreak;
pub mod meter;
pub mod spacing;
pub mod timegrid;

mod error;

pub use stave_core::{geometry, index, shape, symbol, units};

pub use config::AppConfig;
pub use error::StaveError;
pub use layout::{ScoreLayout, SystemLayout};

use std::fmt::Write as _;

use log::{debug, info, trace};

use stave_core::{shape::ShapeMeter, symbol::SymbolTable};

use export::{Exporter, svg::SvgBuilder};
use linebreak::breaker_for;
use meter::GlyphMeter;
use spacing::SpacingEngine;
use timegrid::TimeGridTable;

/// Builder for laying out and rendering scores.
///
/// # Examples
///
/// ```rust
/// use stave::{AppConfig, ScoreLayouter, meter::GlyphMeter};
/// use stave::symbol::{BarlineKind, SymbolEntry, SymbolKind, SymbolTable};
///
/// let table = SymbolTable::from_entries(
///     vec![1],
///     [
///         SymbolEntry::new(0.0, SymbolKind::Note).with_duration(128.0),
///         SymbolEntry::new(128.0, SymbolKind::Note).with_duration(128.0),
///         SymbolEntry::new(256.0, SymbolKind::Barline(BarlineKind::Final)),
///     ],
/// )
/// .expect("Invalid table");
///
/// let layouter = ScoreLayouter::new(AppConfig::default());
/// let layout = layouter
///     .layout(&table, &GlyphMeter::default())
///     .expect("Failed to lay out");
/// assert_eq!(layout.systems().len(), 1);
///
/// let svg = layouter.render_svg(&layout).expect("Failed to render");
/// assert!(svg.starts_with("<svg"));
/// ```
#[derive(Debug, Default)]
pub struct ScoreLayouter {
    config: AppConfig,
    dump_columns: bool,
}

impl ScoreLayouter {
    /// Create a new layouter with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            dump_columns: false,
        }
    }

    /// Record the spacing table of every column in the resulting layout.
    pub fn with_column_dump(mut self, dump: bool) -> Self {
        self.dump_columns = dump;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Lay out a score.
    ///
    /// Runs spacing, line breaking, justification and repositioning. Every
    /// system is justified to its line width except the last one, unless
    /// `justify_last_line` is set. Each system is placed at y = 0; stacking
    /// systems vertically is left to the caller.
    ///
    /// # Arguments
    ///
    /// * `table` - Time-ordered symbols of the score.
    /// * `meter` - Measures entries that carry no shape.
    ///
    /// # Errors
    ///
    /// Returns `StaveError::Config` when the configuration is invalid.
    pub fn layout(
        &self,
        table: &SymbolTable,
        meter: &dyn ShapeMeter,
    ) -> Result<ScoreLayout, StaveError> {
        self.config.validate()?;

        info!(entries = table.len(), instruments = table.num_instruments(); "Laying out score");
        let mut engine = SpacingEngine::new(&self.config, table, meter);
        engine.do_spacing();

        let mut layout = ScoreLayout::new(table.num_staves());
        if engine.num_columns() == 0 {
            info!("Score has no columns");
            return Ok(layout);
        }

        let lines = breaker_for(self.config.line_break()).break_lines(&engine);
        debug!(columns = engine.num_columns(), systems = lines.len(); "Lines broken");

        let justify_last = self.config.line_break().justify_last_line();
        let num_systems = lines.len();
        for (i_system, columns) in lines.into_iter().enumerate() {
            let justify = justify_last || i_system + 1 < num_systems;
            if justify {
                let extra = engine.line_width(i_system) - engine.system_width(columns.clone());
                engine.justify_system(columns.clone(), extra);
            }

            let x_start = self.config.line_break().indent_for_system(i_system);
            let placement = engine.reposition_slices_and_staffobjs(columns.clone(), x_start, 0.0);

            let mut time_grid = TimeGridTable::new();
            for column in columns.clone() {
                time_grid.add_entries(&engine.create_time_grid_table_for_column(column));
            }
            trace!(system = i_system; "Time grid\n{}", time_grid.dump());

            debug!(
                system = i_system,
                first = *columns.start(),
                last = *columns.end(),
                width = placement.width(),
                justify;
                "System laid out"
            );
            layout.push_system(SystemLayout::new(columns, placement, time_grid, justify));
        }

        if self.dump_columns {
            let mut dump = String::new();
            for column in 0..engine.num_columns() {
                let _ = writeln!(dump, "{}", engine.dump_column_data(column));
            }
            layout.set_column_dump(dump);
        }

        info!(systems = layout.systems().len(); "Score laid out");
        Ok(layout)
    }

    /// Render a laid out score to an SVG string.
    ///
    /// Staves are drawn with the [`GlyphMeter`] geometry of the configured
    /// staff size.
    ///
    /// # Errors
    ///
    /// Returns `StaveError::Export` when rendering fails.
    pub fn render_svg(&self, layout: &ScoreLayout) -> Result<String, StaveError> {
        let meter = GlyphMeter::for_staff_line_spacing(self.config.spacing().staff_line_spacing());
        let mut exporter = SvgBuilder::new(Vec::new())
            .with_staff_line_spacing(meter.staff_line_spacing())
            .with_staff_distance(meter.staff_distance())
            .build();
        exporter.export_score_layout(layout)?;

        String::from_utf8(exporter.into_inner())
            .map_err(|err| StaveError::Export(Box::new(export::Error::Render(err.to_string()))))
    }
}
