//! Time slices: every shape at one time position.
//!
//! A slice holds the spacing state shared by all variants (rods, spring
//! constant, pre-stretching force, final width) in [`TimeSlice`] and the
//! variant-specific data in [`SliceVariant`]. Variant behaviour is a single
//! `match` per operation.

use std::ops::Range;

use stave_core::{
    index::{ColumnId, ShapeId, SliceId},
    symbol::SymbolKind,
    units::{LUnits, TimeUnits, is_greater_time},
};

use super::{
    MAX_FORCE, SpacingParams,
    data::{Rods, ShapeData, VerticalExtent},
};

/// The five kinds of slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKind {
    /// Clef, key and time signature at the start of the score.
    Prolog,
    /// Clef changes, signatures and spacers in the middle of the music.
    NonTimed,
    NoteRest,
    Barline,
    Grace,
}

impl SliceKind {
    /// Short name used in dumps.
    pub fn name(self) -> &'static str {
        match self {
            Self::Prolog => "prolog",
            Self::NonTimed => "non-timed",
            Self::NoteRest => "note/rest",
            Self::Barline => "barline",
            Self::Grace => "grace",
        }
    }
}

/// Variant-specific data, filled in by `assign_spacing_values`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SliceVariant {
    Prolog {
        clef: LUnits,
        key: LUnits,
        time: LUnits,
    },
    NonTimed {
        /// Content fits in the previous slice's right rod and adds no width.
        merged: bool,
    },
    NoteRest,
    Barline,
    Grace {
        width: LUnits,
        /// Space was taken from the previous note/rest slice.
        borrowed: bool,
    },
}

impl SliceVariant {
    fn initial(kind: SliceKind) -> Self {
        match kind {
            SliceKind::Prolog => Self::Prolog {
                clef: 0.0,
                key: 0.0,
                time: 0.0,
            },
            SliceKind::NonTimed => Self::NonTimed { merged: false },
            SliceKind::NoteRest => Self::NoteRest,
            SliceKind::Barline => Self::Barline,
            SliceKind::Grace => Self::Grace {
                width: 0.0,
                borrowed: false,
            },
        }
    }

    fn kind(&self) -> SliceKind {
        match self {
            Self::Prolog { .. } => SliceKind::Prolog,
            Self::NonTimed { .. } => SliceKind::NonTimed,
            Self::NoteRest => SliceKind::NoteRest,
            Self::Barline => SliceKind::Barline,
            Self::Grace { .. } => SliceKind::Grace,
        }
    }
}

/// Duration data driving the spring constant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Durations {
    /// Shortest note or rest starting here.
    pub(crate) min_note: Option<TimeUnits>,
    /// Longest note or rest starting here.
    pub(crate) max_note: Option<TimeUnits>,
    /// Shortest duration starting here that outlasts `ds`.
    pub(crate) min_note_next: Option<TimeUnits>,
    /// Time until the next slice.
    pub(crate) ds: TimeUnits,
    /// Shortest duration sounding during `ds`.
    pub(crate) di: TimeUnits,
}

#[derive(Debug, Clone)]
pub(crate) struct TimeSlice {
    pub(crate) variant: SliceVariant,
    pub(crate) column: ColumnId,
    /// Range of [`ShapeId`]s owned by this slice.
    pub(crate) shapes: Range<usize>,
    pub(crate) prev: Option<SliceId>,
    pub(crate) next: Option<SliceId>,
    pub(crate) timepos: TimeUnits,
    pub(crate) rods: Rods,
    pub(crate) durations: Durations,
    /// Spring constant; zero for rigid slices.
    pub(crate) ci: f32,
    /// Pre-stretching force.
    pub(crate) fi: f32,
    pub(crate) width: LUnits,
    pub(crate) x_start: LUnits,
}

impl TimeSlice {
    pub(crate) fn new(
        kind: SliceKind,
        column: ColumnId,
        timepos: TimeUnits,
        first_shape: ShapeId,
    ) -> Self {
        Self {
            variant: SliceVariant::initial(kind),
            column,
            shapes: first_shape.index()..first_shape.index(),
            prev: None,
            next: None,
            timepos,
            rods: Rods::default(),
            durations: Durations::default(),
            ci: 0.0,
            fi: MAX_FORCE,
            width: 0.0,
            x_start: 0.0,
        }
    }

    pub(crate) fn kind(&self) -> SliceKind {
        self.variant.kind()
    }

    pub(crate) fn shape_ids(&self) -> impl Iterator<Item = ShapeId> + use<> {
        self.shapes.clone().map(ShapeId::new)
    }

    pub(crate) fn push_shape(&mut self, id: ShapeId) {
        debug_assert_eq!(self.shapes.end, id.index(), "slice shapes must be contiguous");
        self.shapes.end = id.index() + 1;
    }

    /// Records the duration of a note or rest starting in this slice.
    pub(crate) fn record_duration(&mut self, duration: TimeUnits) {
        let durations = &mut self.durations;
        durations.min_note = Some(durations.min_note.map_or(duration, |d| d.min(duration)));
        durations.max_note = Some(durations.max_note.map_or(duration, |d| d.max(duration)));
    }

    pub(crate) fn is_stretchable(&self) -> bool {
        self.ci > 0.0
    }

    /// Width at force zero.
    pub(crate) fn minimum_extent(&self) -> LUnits {
        self.rods.minimum()
    }

    /// Width this slice would take under `force`.
    pub(crate) fn extent_for(&self, force: f32) -> LUnits {
        if self.is_stretchable() && force > self.fi {
            force / self.ci + self.rods.x_left
        } else {
            self.minimum_extent()
        }
    }

    pub(crate) fn apply_force(&mut self, force: f32) {
        self.width = self.extent_for(force);
    }

    pub(crate) fn set_minimum_extent(&mut self) {
        self.width = self.minimum_extent();
    }

    /// Absolute x of the alignment anchor, valid after repositioning.
    pub(crate) fn anchor_x(&self) -> LUnits {
        self.x_start + self.rods.x_left
    }

    /// Notes and rests that take part in spacing (full-measure rests excluded).
    fn timed_shapes<'a>(&self, shapes: &'a [ShapeData]) -> impl Iterator<Item = &'a ShapeData> {
        shapes[self.shapes.clone()]
            .iter()
            .filter(|shape| shape.kind.is_note_rest() && !shape.is_full_measure_rest())
    }

    fn has_content_on_staves(&self, shapes: &[ShapeData], staves: &[usize]) -> bool {
        shapes[self.shapes.clone()]
            .iter()
            .any(|shape| staves.contains(&shape.staff_in_system))
    }

    pub(crate) fn compute_ds_and_di(
        &mut self,
        next_timepos: Option<TimeUnits>,
        prev_min_note_next: Option<TimeUnits>,
        shapes: &[ShapeData],
    ) {
        let ds = match next_timepos {
            Some(next) => next - self.timepos,
            None => self.durations.max_note.unwrap_or(0.0),
        }
        .max(0.0);

        let min_note_next = if self.kind() == SliceKind::NoteRest {
            self.timed_shapes(shapes)
                .map(|shape| shape.duration)
                .filter(|&duration| is_greater_time(duration, ds))
                .min_by(f64::total_cmp)
        } else {
            prev_min_note_next
        };

        let di = if ds > 0.0 {
            [prev_min_note_next, self.durations.min_note]
                .into_iter()
                .flatten()
                .min_by(f64::total_cmp)
                .unwrap_or(ds)
        } else {
            ds
        };

        self.durations.ds = ds;
        self.durations.di = di;
        self.durations.min_note_next = min_note_next;
    }

    pub(crate) fn compute_spring_data(&mut self, params: &SpacingParams) {
        self.rods.clamp();

        let ds = self.durations.ds;
        if self.kind() != SliceKind::NoteRest || ds <= 0.0 {
            self.ci = 0.0;
            self.fi = MAX_FORCE;
            return;
        }

        let di = if self.durations.di > 0.0 {
            self.durations.di
        } else {
            ds
        };
        self.ci = (di / ds) as f32 / params.space_for(ds);
        self.refresh_pre_stretching_force();
    }

    /// Recomputes `fi` after the rods changed.
    pub(crate) fn refresh_pre_stretching_force(&mut self) {
        if self.is_stretchable() {
            self.fi = self.ci * self.rods.xi();
        }
    }

    /// Measures the slice content into rods, possibly adjusting `prev`.
    pub(crate) fn assign_spacing_values(
        &mut self,
        mut prev: Option<&mut TimeSlice>,
        shapes: &[ShapeData],
        params: &SpacingParams,
    ) {
        self.rods = Rods::default();
        let prev_kind = prev.as_ref().map(|prev| prev.kind());

        match self.kind() {
            SliceKind::Prolog => self.assign_prolog(shapes, params),
            SliceKind::NonTimed => self.assign_non_timed(prev.as_deref(), shapes, params),
            SliceKind::NoteRest => self.assign_note_rest(prev.as_deref_mut(), shapes, params),
            SliceKind::Barline => self.assign_barline(shapes, params),
            SliceKind::Grace => self.assign_grace(prev.as_deref_mut(), shapes, params),
        }

        match prev_kind {
            None if self.kind() != SliceKind::Prolog => {
                self.rods.x_left += params.space_before_prolog;
            }
            Some(SliceKind::Barline) => self.rods.x_left += params.space_after_barline / 2.0,
            _ => {}
        }
        self.rods.clamp();
    }

    fn widest(&self, shapes: &[ShapeData], kind: SymbolKind) -> LUnits {
        shapes[self.shapes.clone()]
            .iter()
            .filter(|shape| shape.kind == kind)
            .map(ShapeData::width)
            .fold(0.0, LUnits::max)
    }

    fn assign_prolog(&mut self, shapes: &[ShapeData], params: &SpacingParams) {
        let clef = self.widest(shapes, SymbolKind::Clef);
        let key = self.widest(shapes, SymbolKind::KeySignature);
        let time = self.widest(shapes, SymbolKind::TimeSignature);

        // absent elements add neither width nor gap
        let present: Vec<LUnits> = [clef, key, time]
            .into_iter()
            .filter(|&width| width > 0.0)
            .collect();
        let gaps = params.prolog_gap * present.len().saturating_sub(1) as LUnits;

        self.rods.x_left = params.space_before_prolog
            + present.iter().sum::<LUnits>()
            + gaps
            + params.space_after_prolog;
        self.variant = SliceVariant::Prolog { clef, key, time };
    }

    /// Accumulated width of the non-timed shapes of each staff.
    fn staff_widths(&self, shapes: &[ShapeData], params: &SpacingParams) -> Vec<(usize, LUnits)> {
        let mut widths: Vec<(usize, LUnits)> = Vec::new();
        for shape in &shapes[self.shapes.clone()] {
            let added = shape.width() + params.non_timed_gap;
            match widths
                .iter_mut()
                .find(|(staff, _)| *staff == shape.staff_in_system)
            {
                Some((_, width)) => *width += added,
                None => widths.push((shape.staff_in_system, added)),
            }
        }
        widths
    }

    fn assign_non_timed(
        &mut self,
        prev: Option<&TimeSlice>,
        shapes: &[ShapeData],
        params: &SpacingParams,
    ) {
        let widths = self.staff_widths(shapes, params);
        let width = widths.iter().map(|(_, width)| *width).fold(0.0, LUnits::max);
        let staves: Vec<usize> = widths.iter().map(|(staff, _)| *staff).collect();

        let merged = prev.is_some_and(|prev| {
            prev.kind() == SliceKind::NoteRest
                && prev.rods.x_ri >= width
                && !prev.has_content_on_staves(shapes, &staves)
        });

        self.rods.x_left = if merged { 0.0 } else { width };
        self.variant = SliceVariant::NonTimed { merged };
    }

    fn assign_note_rest(
        &mut self,
        prev: Option<&mut TimeSlice>,
        shapes: &[ShapeData],
        params: &SpacingParams,
    ) {
        let (x_li, intrusion) = self
            .timed_shapes(shapes)
            .fold((0.0, 0.0), |(right, left): (LUnits, LUnits), shape| {
                (right.max(shape.right_extent()), left.max(shape.left_intrusion()))
            });

        self.rods.x_left = params.exceptional_min_space;
        self.rods.x_li = x_li;

        // accidentals and other prefixes take room from the previous spring
        // only when it belongs to the same run of notes
        match prev {
            Some(prev) if matches!(prev.kind(), SliceKind::NoteRest | SliceKind::Grace) => {
                prev.rods.increment_x_ri(intrusion);
            }
            _ => self.rods.x_left += intrusion,
        }
    }

    fn assign_barline(&mut self, shapes: &[ShapeData], params: &SpacingParams) {
        self.rods.x_left = params.exceptional_min_space;
        self.rods.x_li = shapes[self.shapes.clone()]
            .iter()
            .map(ShapeData::right_extent)
            .fold(0.0, LUnits::max);
    }

    fn assign_grace(
        &mut self,
        prev: Option<&mut TimeSlice>,
        shapes: &[ShapeData],
        params: &SpacingParams,
    ) {
        let width: LUnits = shapes[self.shapes.clone()]
            .iter()
            .map(|shape| shape.width() + params.grace_gap)
            .sum();

        let borrowed = match prev {
            Some(prev) if prev.kind() == SliceKind::NoteRest => {
                prev.rods.increment_x_ri(width);
                true
            }
            _ => false,
        };

        self.rods.x_left = if borrowed { 0.0 } else { width };
        self.variant = SliceVariant::Grace { width, borrowed };
    }

    /// Places every owned shape, except full-measure rests, for a slice
    /// starting at `x`.
    pub(crate) fn move_shapes_to_final_positions(
        &mut self,
        x: LUnits,
        y_shift: LUnits,
        shapes: &mut [ShapeData],
        params: &SpacingParams,
        extent: &mut VerticalExtent,
    ) {
        self.x_start = x;
        let anchor = self.anchor_x();

        match self.variant.clone() {
            SliceVariant::Prolog { clef, key, time } => {
                let mut cursor = x + params.space_before_prolog;
                let elements = [
                    (SymbolKind::Clef, clef),
                    (SymbolKind::KeySignature, key),
                    (SymbolKind::TimeSignature, time),
                ];
                for (kind, width) in elements {
                    if width <= 0.0 {
                        continue;
                    }
                    for shape in &mut shapes[self.shapes.clone()] {
                        if shape.kind == kind {
                            shape.place(cursor, y_shift);
                        }
                    }
                    cursor += width + params.prolog_gap;
                }
            }
            SliceVariant::NonTimed { .. } => {
                // right-aligned per staff against the slice anchor
                let mut cursors: Vec<(usize, LUnits)> = self
                    .staff_widths(shapes, params)
                    .into_iter()
                    .map(|(staff, width)| (staff, anchor - width))
                    .collect();
                for shape in &mut shapes[self.shapes.clone()] {
                    if let Some((_, cursor)) = cursors
                        .iter_mut()
                        .find(|(staff, _)| *staff == shape.staff_in_system)
                    {
                        shape.place(*cursor, y_shift);
                        *cursor += shape.width() + params.non_timed_gap;
                    }
                }
            }
            SliceVariant::NoteRest | SliceVariant::Barline => {
                for shape in &mut shapes[self.shapes.clone()] {
                    if !shape.is_full_measure_rest() {
                        shape.place(anchor + shape.anchor_offset(), y_shift);
                    }
                }
            }
            SliceVariant::Grace { width, .. } => {
                let mut cursor = anchor - width;
                for shape in &mut shapes[self.shapes.clone()] {
                    shape.place(cursor, y_shift);
                    cursor += shape.width() + params.grace_gap;
                }
            }
        }

        for shape in &shapes[self.shapes.clone()] {
            if !shape.is_full_measure_rest() {
                extent.include(shape.bounds());
            }
        }
    }
}
