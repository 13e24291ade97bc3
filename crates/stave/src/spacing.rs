//! Duration-driven horizontal spacing.
//!
//! The engine follows Gourlay's spring-and-rod model. Every time position of
//! the score becomes a [time slice](slice): a spring whose stiffness depends
//! on the durations sounding there, bounded below by rods derived from the
//! widths of its shapes. Consecutive slices between two barlines form a
//! [column](column). Applying one force to a column stretches all of its
//! springs at once, which gives a monotone, piecewise-linear force→width
//! function that the line breaker and the justification step query.
//!
//! ```text
//!  symbol table ──scan──► slices + columns ──spacing──► force/width queries
//!                                                         │
//!                    positioned shapes ◄──reposition◄── justify
//! ```

mod builder;
mod column;
mod data;
mod engine;
mod slice;

pub use column::BarlinesInfo;
pub use data::SeqRole;
pub use engine::{ColumnPlacement, SpacingEngine, SystemPlacement};
pub use slice::SliceKind;

use stave_core::units::{LUnits, TimeUnits};

use crate::config::{EngravingSpaces, SpacingConfig};

/// Pre-stretching force of slices that never stretch.
pub const MAX_FORCE: f32 = 1.0e14;

/// Penalty of a line whose minimum width exceeds the available width.
pub const LINE_OVERFLOW_PENALTY: f32 = 1000.0;

/// Tolerance for width comparisons, in logical units.
pub(crate) const WIDTH_TOLERANCE: LUnits = 0.01;

/// Spacing parameters converted to logical units once per engine.
#[derive(Debug, Clone)]
pub(crate) struct SpacingParams {
    pub(crate) min_space: LUnits,
    pub(crate) alpha: f32,
    pub(crate) dmin: TimeUnits,
    pub(crate) proportional: bool,
    pub(crate) fixed_spacing: LUnits,
    pub(crate) optimum_force: f32,
    pub(crate) exceptional_min_space: LUnits,
    pub(crate) space_after_barline: LUnits,
    pub(crate) space_before_prolog: LUnits,
    pub(crate) space_after_prolog: LUnits,
    pub(crate) prolog_gap: LUnits,
    pub(crate) non_timed_gap: LUnits,
    pub(crate) grace_gap: LUnits,
    pub(crate) lyric_gap: LUnits,
}

impl SpacingParams {
    pub(crate) fn new(spacing: &SpacingConfig, engraving: &EngravingSpaces) -> Self {
        Self {
            min_space: spacing.minimum_space(),
            alpha: spacing.alpha(),
            dmin: spacing.minimum_fixed_duration(),
            proportional: spacing.proportional(),
            fixed_spacing: spacing.tenths(spacing.fixed_spacing_value()),
            optimum_force: spacing.optimum_force(),
            exceptional_min_space: spacing.tenths(engraving.exceptional_min_space),
            space_after_barline: spacing.tenths(engraving.space_after_barline),
            space_before_prolog: spacing.tenths(engraving.space_before_prolog),
            space_after_prolog: spacing.tenths(engraving.space_after_prolog),
            prolog_gap: spacing.tenths(engraving.prolog_element_gap),
            non_timed_gap: spacing.tenths(engraving.non_timed_gap),
            grace_gap: spacing.tenths(engraving.grace_gap),
            lyric_gap: spacing.tenths(engraving.lyric_gap),
        }
    }

    /// Ideal space for a duration.
    pub(crate) fn space_for(&self, duration: TimeUnits) -> LUnits {
        if !self.proportional {
            return self.fixed_spacing;
        }
        if duration <= self.dmin {
            self.min_space
        } else {
            self.min_space * (1.0 + self.alpha * (duration / self.dmin).log2() as f32)
        }
    }
}
