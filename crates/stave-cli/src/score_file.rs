//! Score description files.
//!
//! A score file is a TOML document listing the staves of every instrument
//! and the symbols of the score in time order:
//!
//! ```toml
//! staves = [1]
//!
//! [[symbols]]
//! time = 0
//! kind = "clef"
//!
//! [[symbols]]
//! time = 0
//! kind = "note"
//! duration = 64
//! lyric_width = 400.0
//!
//! [[symbols]]
//! time = 64
//! kind = "note"
//! value = "quarter"
//! dots = 1
//!
//! [[symbols]]
//! time = 160
//! kind = "barline"
//! barline = "final"
//! ```
//!
//! A written `value` with optional `dots` can stand in for `duration`.
//! Symbols are measured with a [`GlyphMeter`]. `width`, `anchor_offset` and
//! `lyric_width` override the measured values, in logical units.

use log::debug;
use serde::Deserialize;

use stave::{
    StaveError,
    meter::GlyphMeter,
    shape::{MeasuredShape, ShapeMeter},
    symbol::{BarlineKind, SymbolEntry, SymbolKind, SymbolTable},
    units::{LUnits, NoteValue, TimeUnits},
};

use crate::error::CliError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScoreFile {
    #[serde(default = "default_staves")]
    staves: Vec<usize>,
    #[serde(default)]
    symbols: Vec<SymbolRecord>,
}

fn default_staves() -> Vec<usize> {
    vec![1]
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RecordKind {
    Clef,
    KeySignature,
    TimeSignature,
    Spacer,
    Note,
    Rest,
    FullMeasureRest,
    GraceNote,
    Barline,
    SystemBreak,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SymbolRecord {
    time: TimeUnits,
    kind: RecordKind,
    #[serde(default)]
    duration: TimeUnits,
    value: Option<NoteValue>,
    #[serde(default)]
    dots: u8,
    #[serde(default)]
    instrument: usize,
    #[serde(default)]
    staff: usize,
    #[serde(default)]
    voice: usize,
    #[serde(default)]
    barline: BarlineKind,
    width: Option<LUnits>,
    anchor_offset: Option<LUnits>,
    lyric_width: Option<LUnits>,
}

impl SymbolRecord {
    fn symbol_kind(&self) -> SymbolKind {
        match self.kind {
            RecordKind::Clef => SymbolKind::Clef,
            RecordKind::KeySignature => SymbolKind::KeySignature,
            RecordKind::TimeSignature => SymbolKind::TimeSignature,
            RecordKind::Spacer => SymbolKind::Spacer,
            RecordKind::Note => SymbolKind::Note,
            RecordKind::Rest => SymbolKind::Rest {
                full_measure: false,
            },
            RecordKind::FullMeasureRest => SymbolKind::Rest { full_measure: true },
            RecordKind::GraceNote => SymbolKind::GraceNote,
            RecordKind::Barline => SymbolKind::Barline(self.barline),
            RecordKind::SystemBreak => SymbolKind::SystemBreak,
        }
    }

    fn duration(&self) -> TimeUnits {
        self.value
            .map_or(self.duration, |value| value.dotted(self.dots))
    }

    fn has_overrides(&self) -> bool {
        self.width.is_some() || self.anchor_offset.is_some() || self.lyric_width.is_some()
    }

    /// Measured shape with the overrides applied.
    fn shape(&self, entry: &SymbolEntry, meter: &GlyphMeter, staff_in_system: usize) -> MeasuredShape {
        let measured = meter.measure(entry, staff_in_system);
        let mut shape = MeasuredShape::new(self.width.unwrap_or(measured.width()), measured.height())
            .with_top(measured.top())
            .with_anchor_offset(self.anchor_offset.unwrap_or(measured.anchor_offset()));
        if let Some(lyric_width) = self.lyric_width {
            shape = shape.with_lyric_width(lyric_width);
        }
        shape
    }
}

/// Parses a score file into a symbol table.
///
/// # Errors
///
/// Returns [`CliError::Score`] for malformed TOML and
/// [`CliError::Stave`] when the symbols do not form a valid table.
pub fn parse_score(source: &str, meter: &GlyphMeter) -> Result<SymbolTable, CliError> {
    let file: ScoreFile = toml::from_str(source).map_err(|err| CliError::Score(err.to_string()))?;

    let mut table = SymbolTable::new(file.staves);
    for record in &file.symbols {
        let mut entry = SymbolEntry::new(record.time, record.symbol_kind())
            .with_duration(record.duration())
            .with_instrument(record.instrument)
            .with_staff(record.staff)
            .with_voice(record.voice);
        if record.has_overrides() {
            let staff_in_system = table.staff_in_system(record.instrument, record.staff);
            let shape = record.shape(&entry, meter, staff_in_system);
            entry = entry.with_shape(shape);
        }
        table.push(entry).map_err(StaveError::from)?;
    }

    debug!(
        entries = table.len(),
        instruments = table.num_instruments();
        "Score file parsed"
    );
    Ok(table)
}
