//! A box meter for scores without a glyph font.
//!
//! [`GlyphMeter`] gives every symbol a rectangle of a typical engraved width,
//! expressed in tenths of the staff inter-line space. It is what the CLI uses
//! and what the integration tests measure with; real front ends plug in a
//! font-backed [`ShapeMeter`] instead.

use stave_core::{
    shape::{MeasuredShape, ShapeMeter},
    symbol::{BarlineKind, SymbolEntry, SymbolKind},
    units::{LUnits, Tenths, tenths_to_logical},
};

/// Height of a five-line staff, in tenths.
const STAFF_HEIGHT: Tenths = 40.0;

/// Distance between the tops of two staves, in tenths.
const STAFF_DISTANCE: Tenths = 80.0;

/// Measures symbols as boxes of fixed width.
#[derive(Debug, Clone, Copy)]
pub struct GlyphMeter {
    staff_line_spacing: LUnits,
    staff_distance: LUnits,
}

impl GlyphMeter {
    /// Creates a meter.
    ///
    /// # Arguments
    ///
    /// * `staff_line_spacing` - Distance between two staff lines, in logical units.
    /// * `staff_distance` - Distance between the tops of two consecutive staves.
    pub fn new(staff_line_spacing: LUnits, staff_distance: LUnits) -> Self {
        Self {
            staff_line_spacing,
            staff_distance,
        }
    }

    /// Creates a meter for the given staff size, with the usual distance
    /// between staves.
    pub fn for_staff_line_spacing(staff_line_spacing: LUnits) -> Self {
        Self::new(
            staff_line_spacing,
            tenths_to_logical(STAFF_DISTANCE, staff_line_spacing),
        )
    }

    pub fn staff_line_spacing(&self) -> LUnits {
        self.staff_line_spacing
    }

    pub fn staff_distance(&self) -> LUnits {
        self.staff_distance
    }

    /// Height of one staff in logical units.
    pub fn staff_height(&self) -> LUnits {
        tenths_to_logical(STAFF_HEIGHT, self.staff_line_spacing)
    }

    fn width_of(kind: SymbolKind) -> Tenths {
        match kind {
            SymbolKind::Note => 12.5,
            SymbolKind::Rest { full_measure: false } => 10.0,
            SymbolKind::Rest { full_measure: true } => 20.0,
            SymbolKind::GraceNote => 8.0,
            SymbolKind::Clef => 26.0,
            SymbolKind::KeySignature => 20.0,
            SymbolKind::TimeSignature => 16.0,
            SymbolKind::Spacer => 10.0,
            SymbolKind::Barline(BarlineKind::Simple) => 2.0,
            SymbolKind::Barline(BarlineKind::Double) => 8.0,
            SymbolKind::Barline(BarlineKind::Final) => 10.0,
            SymbolKind::Barline(BarlineKind::StartRepeat | BarlineKind::EndRepeat) => 16.0,
            SymbolKind::SystemBreak => 0.0,
        }
    }
}

impl Default for GlyphMeter {
    fn default() -> Self {
        Self::for_staff_line_spacing(180.0)
    }
}

impl ShapeMeter for GlyphMeter {
    fn measure(&self, entry: &SymbolEntry, staff_in_system: usize) -> MeasuredShape {
        let width = tenths_to_logical(Self::width_of(entry.kind()), self.staff_line_spacing);
        MeasuredShape::new(width, self.staff_height())
            .with_top(staff_in_system as LUnits * self.staff_distance)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_widths_scale_with_staff_size() {
        let meter = GlyphMeter::new(180.0, 1_400.0);
        let note = meter.measure(&SymbolEntry::new(0.0, SymbolKind::Note), 0);
        assert_approx_eq!(f32, note.width(), 225.0);
        assert_approx_eq!(f32, note.height(), 720.0);

        let small = GlyphMeter::new(90.0, 1_400.0);
        let note = small.measure(&SymbolEntry::new(0.0, SymbolKind::Note), 0);
        assert_approx_eq!(f32, note.width(), 112.5);
    }

    #[test]
    fn test_top_follows_staff_in_system() {
        let meter = GlyphMeter::default();
        let clef = meter.measure(&SymbolEntry::new(0.0, SymbolKind::Clef), 2);
        assert_approx_eq!(f32, clef.top(), 2_880.0);
        assert_approx_eq!(f32, clef.anchor_offset(), 0.0);
    }

    #[test]
    fn test_barline_widths() {
        let meter = GlyphMeter::default();
        let width = |kind| {
            meter
                .measure(&SymbolEntry::new(0.0, SymbolKind::Barline(kind)), 0)
                .width()
        };
        assert!(width(BarlineKind::Simple) < width(BarlineKind::Double));
        assert!(width(BarlineKind::Double) < width(BarlineKind::Final));
        assert_approx_eq!(f32, width(BarlineKind::StartRepeat), width(BarlineKind::EndRepeat));
    }
}
