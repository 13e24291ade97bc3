//! Configuration types for spacing and line breaking.
//!
//! All types implement [`serde::Deserialize`] so front ends can load them
//! from external files. Every field has a default, so partial files are fine.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`SpacingConfig`] - Parameters of the duration-driven spacing law.
//! - [`EngravingSpaces`] - Fixed engraving distances, in tenths.
//! - [`LineBreakConfig`] - Target line widths and break preferences.
//!
//! # Example
//!
//! ```
//! # use stave::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.spacing().alpha(), 0.4);
//! ```

use serde::Deserialize;
use thiserror::Error;

use stave_core::units::{LUnits, Tenths, TimeUnits, tenths_to_logical};

/// Raised when a configuration value is outside its valid range.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("expected a finite positive number, got {value}"),
        ))
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("expected a finite non-negative number, got {value}"),
        ))
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Spacing law section.
    #[serde(default)]
    spacing: SpacingConfig,

    /// Engraving distances section.
    #[serde(default)]
    engraving: EngravingSpaces,

    /// Line breaking section.
    #[serde(default)]
    line_break: LineBreakConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its three sections.
    pub fn new(
        spacing: SpacingConfig,
        engraving: EngravingSpaces,
        line_break: LineBreakConfig,
    ) -> Self {
        Self {
            spacing,
            engraving,
            line_break,
        }
    }

    pub fn spacing(&self) -> &SpacingConfig {
        &self.spacing
    }

    pub fn engraving(&self) -> &EngravingSpaces {
        &self.engraving
    }

    pub fn line_break(&self) -> &LineBreakConfig {
        &self.line_break
    }

    pub fn with_spacing(mut self, spacing: SpacingConfig) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_engraving(mut self, engraving: EngravingSpaces) -> Self {
        self.engraving = engraving;
        self
    }

    pub fn with_line_break(mut self, line_break: LineBreakConfig) -> Self {
        self.line_break = line_break;
        self
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.spacing.validate()?;
        self.engraving.validate()?;
        self.line_break.validate()
    }
}

/// Parameters of the spacing law.
///
/// For a duration `d` the ideal space is `minimum_space` when
/// `d <= minimum_fixed_duration`, and
/// `minimum_space * (1 + alpha * log2(d / minimum_fixed_duration))` otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpacingConfig {
    minimum_space: LUnits,
    alpha: f32,
    minimum_fixed_duration: TimeUnits,
    optimum_force: f32,
    proportional: bool,
    fixed_spacing_value: Tenths,
    staff_line_spacing: LUnits,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            minimum_space: 180.0,
            alpha: 0.4,
            minimum_fixed_duration: 16.0,
            optimum_force: 1.4,
            proportional: true,
            fixed_spacing_value: 35.0,
            staff_line_spacing: 180.0,
        }
    }
}

impl SpacingConfig {
    /// Space given to the shortest durations, in logical units.
    pub fn minimum_space(&self) -> LUnits {
        self.minimum_space
    }

    /// Logarithmic growth factor of the spacing law.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Durations up to this one all get `minimum_space`.
    pub fn minimum_fixed_duration(&self) -> TimeUnits {
        self.minimum_fixed_duration
    }

    /// Force at which a line looks best.
    pub fn optimum_force(&self) -> f32 {
        self.optimum_force
    }

    /// When false, every duration gets the same `fixed_spacing_value`.
    pub fn proportional(&self) -> bool {
        self.proportional
    }

    pub fn fixed_spacing_value(&self) -> Tenths {
        self.fixed_spacing_value
    }

    /// Distance between two staff lines, in logical units.
    pub fn staff_line_spacing(&self) -> LUnits {
        self.staff_line_spacing
    }

    /// Converts tenths into logical units using this staff size.
    pub fn tenths(&self, value: Tenths) -> LUnits {
        tenths_to_logical(value, self.staff_line_spacing)
    }

    pub fn with_minimum_space(mut self, minimum_space: LUnits) -> Self {
        self.minimum_space = minimum_space;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_minimum_fixed_duration(mut self, duration: TimeUnits) -> Self {
        self.minimum_fixed_duration = duration;
        self
    }

    pub fn with_optimum_force(mut self, force: f32) -> Self {
        self.optimum_force = force;
        self
    }

    pub fn with_proportional(mut self, proportional: bool) -> Self {
        self.proportional = proportional;
        self
    }

    pub fn with_fixed_spacing_value(mut self, value: Tenths) -> Self {
        self.fixed_spacing_value = value;
        self
    }

    pub fn with_staff_line_spacing(mut self, spacing: LUnits) -> Self {
        self.staff_line_spacing = spacing;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("spacing.minimum_space", self.minimum_space.into())?;
        require_non_negative("spacing.alpha", self.alpha.into())?;
        require_positive(
            "spacing.minimum_fixed_duration",
            self.minimum_fixed_duration,
        )?;
        require_positive("spacing.optimum_force", self.optimum_force.into())?;
        require_positive(
            "spacing.fixed_spacing_value",
            self.fixed_spacing_value.into(),
        )?;
        require_positive("spacing.staff_line_spacing", self.staff_line_spacing.into())
    }
}

/// Fixed engraving distances, in tenths of the staff inter-line space.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngravingSpaces {
    /// Fixed space before every note/rest and barline slice.
    pub exceptional_min_space: Tenths,
    /// Space after a barline; half of it is added before the content that follows.
    pub space_after_barline: Tenths,
    /// Space before the first element of a line or of the score.
    pub space_before_prolog: Tenths,
    /// Space between the prolog and the first note.
    pub space_after_prolog: Tenths,
    /// Gap between clef, key and time signature inside a prolog.
    pub prolog_element_gap: Tenths,
    /// Gap after each non-timed object (clef change, spacer).
    pub non_timed_gap: Tenths,
    /// Gap after each grace note.
    pub grace_gap: Tenths,
    /// Minimum gap between two lyric syllables of the same line.
    pub lyric_gap: Tenths,
}

impl Default for EngravingSpaces {
    fn default() -> Self {
        Self {
            exceptional_min_space: 2.5,
            space_after_barline: 14.0,
            space_before_prolog: 7.5,
            space_after_prolog: 15.0,
            prolog_element_gap: 10.0,
            non_timed_gap: 5.0,
            grace_gap: 3.0,
            lyric_gap: 5.0,
        }
    }
}

impl EngravingSpaces {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("engraving.exceptional_min_space", self.exceptional_min_space),
            ("engraving.space_after_barline", self.space_after_barline),
            ("engraving.space_before_prolog", self.space_before_prolog),
            ("engraving.space_after_prolog", self.space_after_prolog),
            ("engraving.prolog_element_gap", self.prolog_element_gap),
            ("engraving.non_timed_gap", self.non_timed_gap),
            ("engraving.grace_gap", self.grace_gap),
            ("engraving.lyric_gap", self.lyric_gap),
        ];
        fields
            .into_iter()
            .try_for_each(|(field, value)| require_non_negative(field, value.into()))
    }
}

/// Which line breaker chooses the system boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerKind {
    /// Dynamic programming over all break points.
    #[default]
    Optimal,
    /// Fill each system greedily.
    Simple,
}

/// Target widths and break preferences.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LineBreakConfig {
    line_width: LUnits,
    first_line_indent: LUnits,
    justify_last_line: bool,
    partial_barline_penalty: f32,
    no_barline_penalty: f32,
    breaker: BreakerKind,
}

impl Default for LineBreakConfig {
    fn default() -> Self {
        Self {
            line_width: 17000.0,
            first_line_indent: 0.0,
            justify_last_line: false,
            partial_barline_penalty: 0.5,
            no_barline_penalty: 2.0,
            breaker: BreakerKind::default(),
        }
    }
}

impl LineBreakConfig {
    /// Width available to every system except the first one.
    pub fn line_width(&self) -> LUnits {
        self.line_width
    }

    /// Extra left indent of the first system.
    pub fn first_line_indent(&self) -> LUnits {
        self.first_line_indent
    }

    /// Width available to the given system.
    pub fn width_for_system(&self, i_system: usize) -> LUnits {
        if i_system == 0 {
            (self.line_width - self.first_line_indent).max(0.0)
        } else {
            self.line_width
        }
    }

    /// Left offset of the given system.
    pub fn indent_for_system(&self, i_system: usize) -> LUnits {
        if i_system == 0 {
            self.first_line_indent
        } else {
            0.0
        }
    }

    pub fn justify_last_line(&self) -> bool {
        self.justify_last_line
    }

    /// Added to a line penalty when only some instruments have a barline at the break.
    pub fn partial_barline_penalty(&self) -> f32 {
        self.partial_barline_penalty
    }

    /// Added to a line penalty when no instrument has a barline at the break.
    pub fn no_barline_penalty(&self) -> f32 {
        self.no_barline_penalty
    }

    pub fn breaker(&self) -> BreakerKind {
        self.breaker
    }

    pub fn with_line_width(mut self, width: LUnits) -> Self {
        self.line_width = width;
        self
    }

    pub fn with_first_line_indent(mut self, indent: LUnits) -> Self {
        self.first_line_indent = indent;
        self
    }

    pub fn with_justify_last_line(mut self, justify: bool) -> Self {
        self.justify_last_line = justify;
        self
    }

    pub fn with_breaker(mut self, breaker: BreakerKind) -> Self {
        self.breaker = breaker;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("line_break.line_width", self.line_width.into())?;
        require_non_negative(
            "line_break.first_line_indent",
            self.first_line_indent.into(),
        )?;
        if self.first_line_indent >= self.line_width {
            return Err(ConfigError::invalid(
                "line_break.first_line_indent",
                "indent leaves no room for the first system",
            ));
        }
        require_non_negative(
            "line_break.partial_barline_penalty",
            self.partial_barline_penalty.into(),
        )?;
        require_non_negative(
            "line_break.no_barline_penalty",
            self.no_barline_penalty.into(),
        )
    }
}
