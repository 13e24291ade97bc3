//! Gourlay columns: runs of slices between two break points.

use std::ops::Range;

use stave_core::{
    index::{ColumnId, ShapeId, SliceId},
    symbol::{BarlineKind, SymbolKind},
    units::{LUnits, is_equal_time},
};

use super::{
    SpacingParams, WIDTH_TOLERANCE,
    data::{FullMeasureRestData, SeqData, ShapeData, VerticalExtent},
    slice::{SliceKind, TimeSlice},
};
use crate::timegrid::{TimeGridEntry, TimeGridTable};

/// Barline presence at the end of a column.
///
/// The line breaker prefers breaks after columns closed by a barline in
/// every instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BarlinesInfo {
    all_instruments: bool,
    some_instruments: bool,
    all_final: bool,
}

impl BarlinesInfo {
    pub fn new(all_instruments: bool, some_instruments: bool, all_final: bool) -> Self {
        Self {
            all_instruments,
            some_instruments,
            all_final,
        }
    }

    /// Every instrument has a barline at the end of the column.
    pub fn all_instruments(&self) -> bool {
        self.all_instruments
    }

    /// At least one instrument has a barline at the end of the column.
    pub fn some_instruments(&self) -> bool {
        self.some_instruments
    }

    /// Every barline at the end of the column is a final barline.
    pub fn all_final(&self) -> bool {
        self.all_final
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Column {
    pub(crate) id: ColumnId,
    /// Range of [`SliceId`]s in time order.
    pub(crate) slices: Range<usize>,
    /// Slices in ascending pre-stretching force.
    pub(crate) ordered: Vec<SliceId>,
    pub(crate) full_measure_rests: Vec<FullMeasureRestData>,
    pub(crate) sequences: Vec<SeqData>,
    pub(crate) has_system_break: bool,
    pub(crate) barlines: BarlinesInfo,
    pub(crate) min_width: LUnits,
    pub(crate) width: LUnits,
    /// Fixed part of the approximate force→width line around the last
    /// `determine_approx_sff_for` force.
    pub(crate) x_fixed: LUnits,
    /// Slope of the approximate force→width line.
    pub(crate) slope: f32,
    pub(crate) x_start: LUnits,
}

impl Column {
    pub(crate) fn new(id: ColumnId, first_slice: SliceId) -> Self {
        Self {
            id,
            slices: first_slice.index()..first_slice.index(),
            ordered: Vec::new(),
            full_measure_rests: Vec::new(),
            sequences: Vec::new(),
            has_system_break: false,
            barlines: BarlinesInfo::default(),
            min_width: 0.0,
            width: 0.0,
            x_fixed: 0.0,
            slope: 0.0,
            x_start: 0.0,
        }
    }

    pub(crate) fn slice_ids(&self) -> impl DoubleEndedIterator<Item = SliceId> + use<> {
        self.slices.clone().map(SliceId::new)
    }

    pub(crate) fn push_slice(&mut self, id: SliceId) {
        debug_assert_eq!(self.slices.end, id.index(), "column slices must be contiguous");
        self.slices.end = id.index() + 1;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Builds the force-ascending view. Equal forces keep time order.
    pub(crate) fn order_slices(&mut self, slices: &[TimeSlice]) {
        self.ordered = self.slice_ids().collect();
        self.ordered
            .sort_by(|a, b| slices[a.index()].fi.total_cmp(&slices[b.index()].fi));
    }

    pub(crate) fn determine_minimum_width(&mut self, slices: &[TimeSlice]) {
        self.min_width = slices[self.slices.clone()]
            .iter()
            .map(TimeSlice::minimum_extent)
            .sum();
    }

    pub(crate) fn determine_extent_for(&self, slices: &[TimeSlice], force: f32) -> LUnits {
        slices[self.slices.clone()]
            .iter()
            .map(|slice| slice.extent_for(force))
            .sum()
    }

    pub(crate) fn determine_force_for(&self, slices: &[TimeSlice], width: LUnits) -> f32 {
        force_for_width(slices, &self.ordered, width)
    }

    /// Sets every slice width for `force`, in force order.
    pub(crate) fn apply_force(&mut self, slices: &mut [TimeSlice], force: f32) {
        let mut width = 0.0;
        let mut stretching = true;
        for id in &self.ordered {
            let slice = &mut slices[id.index()];
            // once one slice resists, every later one resists too
            if stretching && force > slice.fi {
                slice.apply_force(force);
            } else {
                stretching = false;
                slice.set_minimum_extent();
            }
            width += slice.width;
        }
        self.width = width;
    }

    /// Records the linear approximation `width ≈ x_fixed + slope · F`
    /// valid around `force`.
    pub(crate) fn determine_approx_sff_for(&mut self, slices: &[TimeSlice], force: f32) {
        let mut slope = 0.0;
        let mut x_fixed = 0.0;
        for slice in &slices[self.slices.clone()] {
            x_fixed += slice.rods.x_left;
            if slice.is_stretchable() && slice.fi < force {
                slope += 1.0 / slice.ci;
            } else {
                x_fixed += slice.rods.xi();
            }
        }
        self.slope = slope;
        self.x_fixed = x_fixed;
    }

    /// Width that a justification force would stretch.
    pub(crate) fn stretchable_width(&self) -> LUnits {
        (self.width - self.x_fixed).max(0.0)
    }

    pub(crate) fn collect_barlines_information(
        &mut self,
        slices: &[TimeSlice],
        shapes: &[ShapeData],
        num_instruments: usize,
    ) {
        let trailing = self
            .slice_ids()
            .next_back()
            .map(|id| &slices[id.index()])
            .filter(|slice| slice.kind() == SliceKind::Barline);

        let Some(barline) = trailing else {
            self.barlines = BarlinesInfo::default();
            return;
        };

        let mut instruments: Vec<usize> = Vec::new();
        let mut all_final = true;
        for shape in &shapes[barline.shapes.clone()] {
            if let SymbolKind::Barline(kind) = shape.kind {
                if !instruments.contains(&shape.instrument) {
                    instruments.push(shape.instrument);
                }
                all_final &= kind == BarlineKind::Final;
            }
        }

        let some_instruments = !instruments.is_empty();
        self.barlines = BarlinesInfo {
            all_instruments: some_instruments && instruments.len() >= num_instruments,
            some_instruments,
            all_final: some_instruments && all_final,
        };
    }

    /// Places every slice of the column from `x_start` on.
    pub(crate) fn move_to(
        &mut self,
        x_start: LUnits,
        y_shift: LUnits,
        slices: &mut [TimeSlice],
        shapes: &mut [ShapeData],
        params: &SpacingParams,
        extent: &mut VerticalExtent,
    ) {
        self.x_start = x_start;
        let mut x = x_start;
        for slice in &mut slices[self.slices.clone()] {
            slice.move_shapes_to_final_positions(x, y_shift, shapes, params, extent);
            x += slice.width;
        }
        self.reposition_full_measure_rests(y_shift, shapes, extent);
    }

    /// Centres every full-measure rest between the preceding non-timed shape
    /// (or the column start) and the column end.
    pub(crate) fn reposition_full_measure_rests(
        &self,
        y_shift: LUnits,
        shapes: &mut [ShapeData],
        extent: &mut VerticalExtent,
    ) {
        let end = self.x_start + self.width;
        for rest in &self.full_measure_rests {
            let start = rest
                .preceding
                .and_then(|id: ShapeId| shapes[id.index()].bounds())
                .map_or(self.x_start, |bounds| bounds.max_x());

            let shape = &mut shapes[rest.shape.index()];
            let x = (start + end - shape.width()) / 2.0;
            shape.place(x, y_shift);
            extent.include(shape.bounds());
        }
    }

    /// Anchor positions of the note/rest slices and the trailing barline.
    pub(crate) fn time_grid(&self, slices: &[TimeSlice]) -> TimeGridTable {
        let mut table = TimeGridTable::new();
        let mut last: Option<TimeGridEntry> = None;

        for slice in &slices[self.slices.clone()] {
            let duration = match slice.kind() {
                SliceKind::NoteRest => slice.durations.min_note.unwrap_or(slice.durations.ds),
                SliceKind::Barline => 0.0,
                _ => continue,
            };
            let entry = TimeGridEntry::new(slice.timepos, duration, slice.anchor_x());

            // equal times collapse onto the later position
            match last {
                Some(prev) if is_equal_time(prev.timepos(), entry.timepos()) => {}
                Some(prev) => table.add_entry(prev),
                None => {}
            }
            last = Some(entry);
        }
        if let Some(entry) = last {
            table.add_entry(entry);
        }
        table
    }
}

/// Inverse of the force→width function over `ordered` slices.
///
/// `ordered` must be sorted by ascending pre-stretching force. Returns 0 when
/// `width` does not exceed the minimum width or nothing can stretch. Runs at
/// most one step per slice.
pub(crate) fn force_for_width(slices: &[TimeSlice], ordered: &[SliceId], width: LUnits) -> f32 {
    let fixed: LUnits = ordered.iter().map(|id| slices[id.index()].rods.x_left).sum();
    let mut rigid: LUnits = ordered.iter().map(|id| slices[id.index()].rods.xi()).sum();
    if width <= fixed + rigid + WIDTH_TOLERANCE {
        return 0.0;
    }

    let springs: Vec<&TimeSlice> = ordered
        .iter()
        .map(|id| &slices[id.index()])
        .filter(|slice| slice.is_stretchable())
        .collect();

    let mut slope = 0.0;
    for (k, slice) in springs.iter().enumerate() {
        rigid -= slice.rods.xi();
        slope += 1.0 / slice.ci;
        let force = (width - fixed - rigid) / slope;
        let next_fi = springs.get(k + 1).map_or(f32::INFINITY, |next| next.fi);
        if force <= next_fi {
            return force.max(slice.fi);
        }
    }
    0.0
}
