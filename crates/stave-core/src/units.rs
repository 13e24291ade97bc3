//! Units of measure used by the spacing engine.
//!
//! Horizontal positions are expressed in [`LUnits`] (logical units, one
//! hundredth of a millimetre). Engraving distances are usually specified in
//! [`Tenths`] of the staff inter-line space and converted with
//! [`tenths_to_logical`]. Symbolic time uses [`TimeUnits`], where a quarter
//! note lasts [`QUARTER_DURATION`].

use serde::Deserialize;

/// Logical units, hundredths of a millimetre.
pub type LUnits = f32;

/// Symbolic time. A quarter note lasts `64.0`.
pub type TimeUnits = f64;

/// Tenths of the staff inter-line space.
pub type Tenths = f32;

/// Absolute tolerance used when comparing two time positions.
pub const TIME_TOLERANCE: TimeUnits = 1e-6;

/// Duration of a quarter note.
pub const QUARTER_DURATION: TimeUnits = 64.0;

/// Returns `true` when both time positions denote the same instant.
pub fn is_equal_time(a: TimeUnits, b: TimeUnits) -> bool {
    (a - b).abs() < TIME_TOLERANCE
}

/// Returns `true` when `a` is strictly before `b`.
pub fn is_lower_time(a: TimeUnits, b: TimeUnits) -> bool {
    b - a >= TIME_TOLERANCE
}

/// Returns `true` when `a` is strictly after `b`.
pub fn is_greater_time(a: TimeUnits, b: TimeUnits) -> bool {
    a - b >= TIME_TOLERANCE
}

/// Converts a distance in tenths into logical units.
///
/// # Arguments
///
/// * `value` - Distance in tenths of the staff inter-line space.
/// * `staff_line_spacing` - Distance between two staff lines, in logical units.
///
/// # Examples
///
/// ```
/// # use stave_core::units::tenths_to_logical;
/// assert_eq!(tenths_to_logical(10.0, 180.0), 180.0);
/// ```
pub fn tenths_to_logical(value: Tenths, staff_line_spacing: LUnits) -> LUnits {
    value * staff_line_spacing / 10.0
}

/// Written note values, used to derive durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteValue {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
}

impl NoteValue {
    /// Returns the duration of the undotted value.
    pub fn duration(self) -> TimeUnits {
        match self {
            Self::Whole => QUARTER_DURATION * 4.0,
            Self::Half => QUARTER_DURATION * 2.0,
            Self::Quarter => QUARTER_DURATION,
            Self::Eighth => QUARTER_DURATION / 2.0,
            Self::Sixteenth => QUARTER_DURATION / 4.0,
            Self::ThirtySecond => QUARTER_DURATION / 8.0,
            Self::SixtyFourth => QUARTER_DURATION / 16.0,
        }
    }

    /// Returns the duration of the value with the given number of dots.
    ///
    /// Each dot adds half of the previous addition.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stave_core::units::NoteValue;
    /// assert_eq!(NoteValue::Quarter.dotted(1), 96.0);
    /// assert_eq!(NoteValue::Half.dotted(2), 224.0);
    /// ```
    pub fn dotted(self, dots: u8) -> TimeUnits {
        let base = self.duration();
        let mut total = base;
        let mut addition = base;
        for _ in 0..dots {
            addition /= 2.0;
            total += addition;
        }
        total
    }
}
