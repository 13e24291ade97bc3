//! One pass over the symbol table that builds the shape, slice and column
//! arenas.

use log::{debug, trace};

use stave_core::{
    index::{ColumnId, EntryId, ShapeId, SliceId},
    shape::ShapeMeter,
    symbol::{SymbolEntry, SymbolKind, SymbolTable},
    units::{TimeUnits, is_equal_time},
};

use super::{
    column::Column,
    data::{FullMeasureRestData, LineKey, SeqData, SeqRole, ShapeData},
    slice::{SliceKind, TimeSlice},
};

/// Arenas produced by a scan.
#[derive(Debug, Default)]
pub(crate) struct ScannedScore {
    pub(crate) shapes: Vec<ShapeData>,
    pub(crate) slices: Vec<TimeSlice>,
    pub(crate) columns: Vec<Column>,
}

/// Decides which entries at time zero belong to the opening prolog.
#[derive(Debug)]
struct PrologTracker {
    /// Per instrument: a note, rest or barline has been seen.
    music_started: Vec<bool>,
    /// Per instrument: a key or time signature has been seen.
    has_signature: Vec<bool>,
    /// Per staff in system: a clef has been seen.
    has_clef: Vec<bool>,
}

impl PrologTracker {
    fn new(table: &SymbolTable) -> Self {
        Self {
            music_started: vec![false; table.num_instruments()],
            has_signature: vec![false; table.num_instruments()],
            has_clef: vec![false; table.num_staves()],
        }
    }

    fn admits(&mut self, entry: &SymbolEntry, staff_in_system: usize) -> bool {
        let instrument = entry.instrument();
        match entry.kind() {
            SymbolKind::Note
            | SymbolKind::Rest { .. }
            | SymbolKind::GraceNote
            | SymbolKind::Barline(_) => {
                self.music_started[instrument] = true;
                return false;
            }
            SymbolKind::Spacer | SymbolKind::SystemBreak => return false,
            SymbolKind::Clef | SymbolKind::KeySignature | SymbolKind::TimeSignature => {}
        }

        if self.music_started[instrument] || !is_equal_time(entry.time(), 0.0) {
            return false;
        }

        if entry.kind() == SymbolKind::Clef {
            let first_clef = !self.has_clef[staff_in_system];
            self.has_clef[staff_in_system] = true;
            first_clef || !self.has_signature[instrument]
        } else {
            self.has_signature[instrument] = true;
            true
        }
    }
}

/// Last non-timed shape seen on a staff.
#[derive(Debug, Clone, Copy)]
struct NonTimedMark {
    shape: ShapeId,
    time: TimeUnits,
    column: ColumnId,
}

fn slice_kind_for(kind: SymbolKind) -> Option<SliceKind> {
    match kind {
        SymbolKind::Clef
        | SymbolKind::KeySignature
        | SymbolKind::TimeSignature
        | SymbolKind::Spacer => Some(SliceKind::NonTimed),
        SymbolKind::Note | SymbolKind::Rest { .. } => Some(SliceKind::NoteRest),
        SymbolKind::GraceNote => Some(SliceKind::Grace),
        SymbolKind::Barline(_) => Some(SliceKind::Barline),
        SymbolKind::SystemBreak => None,
    }
}

/// Builds slices and columns from a symbol table.
///
/// The meter is called once for every entry that does not carry a shape.
pub(crate) struct ScoreScanner<'a> {
    table: &'a SymbolTable,
    meter: &'a dyn ShapeMeter,
    min_duration: TimeUnits,
    prolog: PrologTracker,
    last_non_timed: Vec<Option<NonTimedMark>>,
    score: ScannedScore,
}

impl<'a> ScoreScanner<'a> {
    pub(crate) fn new(
        table: &'a SymbolTable,
        meter: &'a dyn ShapeMeter,
        min_duration: TimeUnits,
    ) -> Self {
        Self {
            table,
            meter,
            min_duration,
            prolog: PrologTracker::new(table),
            last_non_timed: vec![None; table.num_staves()],
            score: ScannedScore::default(),
        }
    }

    pub(crate) fn scan(mut self) -> ScannedScore {
        let table = self.table;
        for (id, entry) in table.iter() {
            self.add_entry(id, entry);
        }

        self.drop_empty_columns();
        assign_sequence_roles(&mut self.score);

        debug!(
            shapes = self.score.shapes.len(),
            slices = self.score.slices.len(),
            columns = self.score.columns.len();
            "Symbol table scanned"
        );
        self.score
    }

    fn add_entry(&mut self, id: EntryId, entry: &SymbolEntry) {
        let staff_in_system = self.table.staff_in_system(entry.instrument(), entry.staff());
        let in_prolog = self.prolog.admits(entry, staff_in_system);

        let Some(kind) = slice_kind_for(entry.kind()) else {
            match self.score.columns.last_mut() {
                Some(column) => column.has_system_break = true,
                None => trace!(entry = id.index(); "System break before any music ignored"),
            }
            return;
        };
        let kind = if in_prolog { SliceKind::Prolog } else { kind };

        self.ensure_slice(kind, entry.time());
        let shape_id = self.push_shape(id, entry, staff_in_system);

        let column = self.current_column();
        match entry.kind() {
            symbol if symbol.is_full_measure_rest() => {
                let preceding = self.last_non_timed[staff_in_system]
                    .filter(|mark| mark.column == column && is_equal_time(mark.time, entry.time()))
                    .map(|mark| mark.shape);
                if let Some(column) = self.score.columns.last_mut() {
                    column.full_measure_rests.push(FullMeasureRestData {
                        shape: shape_id,
                        preceding,
                    });
                }
            }
            symbol if symbol.is_non_timed() => {
                self.last_non_timed[staff_in_system] = Some(NonTimedMark {
                    shape: shape_id,
                    time: entry.time(),
                    column,
                });
            }
            _ => {}
        }
    }

    fn current_column(&self) -> ColumnId {
        self.score
            .columns
            .last()
            .map_or(ColumnId::new(0), |column| column.id)
    }

    /// Opens a new slice (and column) unless the entry joins the current one.
    fn ensure_slice(&mut self, kind: SliceKind, time: TimeUnits) {
        let last = self.score.slices.last();
        let joins = last.is_some_and(|slice| {
            slice.kind() == kind && is_equal_time(slice.timepos, time)
        });
        if joins {
            return;
        }

        let slice_id = SliceId::new(self.score.slices.len());
        let opens_column = last.is_none_or(|slice| slice.kind() == SliceKind::Barline);
        if opens_column {
            let column_id = ColumnId::new(self.score.columns.len());
            self.score.columns.push(Column::new(column_id, slice_id));
        }

        let column_id = self.current_column();
        let mut slice = TimeSlice::new(
            kind,
            column_id,
            time,
            ShapeId::new(self.score.shapes.len()),
        );
        if let Some(prev) = self.score.slices.last_mut() {
            prev.next = Some(slice_id);
            slice.prev = Some(SliceId::new(slice_id.index() - 1));
        }
        self.score.slices.push(slice);
        if let Some(column) = self.score.columns.last_mut() {
            column.push_slice(slice_id);
        }
    }

    fn push_shape(&mut self, id: EntryId, entry: &SymbolEntry, staff_in_system: usize) -> ShapeId {
        let shape = entry
            .shape()
            .copied()
            .unwrap_or_else(|| self.meter.measure(entry, staff_in_system));

        let kind = entry.kind();
        let duration = if kind.is_note_rest() {
            // missing or negative durations fall back to the shortest fixed one
            if entry.duration() > 0.0 {
                entry.duration()
            } else {
                self.min_duration
            }
        } else {
            0.0
        };

        let shape_id = ShapeId::new(self.score.shapes.len());
        self.score.shapes.push(ShapeData {
            entry: id,
            kind,
            time: entry.time(),
            duration,
            instrument: entry.instrument(),
            staff_in_instrument: entry.staff(),
            staff_in_system,
            voice: entry.voice(),
            shape: Some(shape),
            origin: Default::default(),
        });

        if let Some(slice) = self.score.slices.last_mut() {
            slice.push_shape(shape_id);
            if kind.is_note_rest() && !kind.is_full_measure_rest() {
                slice.record_duration(duration);
            }
        }
        shape_id
    }

    fn drop_empty_columns(&mut self) {
        let before = self.score.columns.len();
        self.score.columns.retain(|column| !column.is_empty());
        if self.score.columns.len() == before {
            return;
        }

        debug!(dropped = before - self.score.columns.len(); "Dropped empty columns");
        for (index, column) in self.score.columns.iter_mut().enumerate() {
            column.id = ColumnId::new(index);
            for slice in &mut self.score.slices[column.slices.clone()] {
                slice.column = column.id;
            }
        }
    }
}

/// Lines present in the first note/rest slice of a column.
fn opening_lines(column: &Column, slices: &[TimeSlice], shapes: &[ShapeData]) -> Vec<LineKey> {
    slices[column.slices.clone()]
        .iter()
        .find(|slice| slice.kind() == SliceKind::NoteRest)
        .map(|slice| {
            shapes[slice.shapes.clone()]
                .iter()
                .filter(|shape| shape.kind.is_note_rest() && !shape.is_full_measure_rest())
                .map(ShapeData::line)
                .collect()
        })
        .unwrap_or_default()
}

/// Splits the notes and rests of every column into lines and assigns each
/// one its role.
fn assign_sequence_roles(score: &mut ScannedScore) {
    let openings: Vec<Vec<LineKey>> = score
        .columns
        .iter()
        .map(|column| opening_lines(column, &score.slices, &score.shapes))
        .collect();

    for (index, column) in score.columns.iter_mut().enumerate() {
        let mut members: Vec<SeqData> = Vec::new();
        for slice_id in column.slice_ids() {
            let slice = &score.slices[slice_id.index()];
            if slice.kind() != SliceKind::NoteRest {
                continue;
            }
            for shape_id in slice.shape_ids() {
                let shape = &score.shapes[shape_id.index()];
                if shape.kind.is_note_rest() && !shape.is_full_measure_rest() {
                    members.push(SeqData {
                        line: shape.line(),
                        shape: shape_id,
                        slice: slice_id,
                        role: SeqRole::Isolated,
                    });
                }
            }
        }

        let continuing = openings.get(index + 1).map_or(&[][..], Vec::as_slice);
        let mut lines: Vec<LineKey> = Vec::new();
        for member in &members {
            if !lines.contains(&member.line) {
                lines.push(member.line);
            }
        }

        for line in lines {
            let positions: Vec<usize> = members
                .iter()
                .enumerate()
                .filter(|(_, member)| member.line == line)
                .map(|(position, _)| position)
                .collect();
            let continues = continuing.contains(&line);
            let last = positions.len() - 1;

            for (k, &position) in positions.iter().enumerate() {
                members[position].role = match (k, last, continues) {
                    (_, 0, false) => SeqRole::Isolated,
                    (k, last, true) if k == last => SeqRole::EndAndStart,
                    (0, _, _) => SeqRole::Start,
                    (k, last, false) if k == last => SeqRole::End,
                    _ => SeqRole::Continue,
                };
            }
        }

        column.sequences = members;
    }
}
