//! The spacing engine.
//!
//! [`SpacingEngine`] owns the shape, slice and column arenas of one layout
//! pass. Its life cycle is fixed:
//!
//! 1. [`SpacingEngine::new`] scans the symbol table and measures shapes.
//! 2. [`SpacingEngine::do_spacing`] computes rods and springs of every
//!    column and stretches each one to the optimum force.
//! 3. A line breaker queries widths and penalties.
//! 4. [`SpacingEngine::justify_system`] and
//!    [`SpacingEngine::reposition_slices_and_staffobjs`] finish each chosen
//!    system and hand the shapes over.

use std::{fmt::Write, ops::RangeInclusive};

use log::{debug, info, trace};

use stave_core::{
    index::EntryId,
    shape::{PositionedShape, ShapeMeter},
    symbol::SymbolTable,
    units::{LUnits, TIME_TOLERANCE},
};

use super::{
    LINE_OVERFLOW_PENALTY, SpacingParams, WIDTH_TOLERANCE,
    builder::ScoreScanner,
    column::{BarlinesInfo, Column, force_for_width},
    data::{SeqRole, ShapeData, VerticalExtent},
    slice::{SliceKind, TimeSlice},
};
use crate::{
    config::{AppConfig, LineBreakConfig},
    timegrid::TimeGridTable,
};

/// Final position of one column inside a system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnPlacement {
    column: usize,
    x_start: LUnits,
    width: LUnits,
}

impl ColumnPlacement {
    /// Index of the column in the score.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn x_start(&self) -> LUnits {
        self.x_start
    }

    pub fn width(&self) -> LUnits {
        self.width
    }

    pub fn x_end(&self) -> LUnits {
        self.x_start + self.width
    }
}

/// Result of repositioning one system.
///
/// Owns the shapes of the system; the engine keeps no reference to them.
#[derive(Debug, Clone, Default)]
pub struct SystemPlacement {
    columns: Vec<ColumnPlacement>,
    shapes: Vec<PositionedShape>,
    y_min: LUnits,
    y_max: LUnits,
}

impl SystemPlacement {
    pub fn columns(&self) -> &[ColumnPlacement] {
        &self.columns
    }

    pub fn shapes(&self) -> &[PositionedShape] {
        &self.shapes
    }

    /// Left edge of the first column.
    pub fn x_start(&self) -> LUnits {
        self.columns.first().map_or(0.0, ColumnPlacement::x_start)
    }

    /// Right edge of the last column.
    pub fn x_end(&self) -> LUnits {
        self.columns.last().map_or(0.0, ColumnPlacement::x_end)
    }

    pub fn width(&self) -> LUnits {
        self.x_end() - self.x_start()
    }

    /// Smallest y reached by any shape.
    pub fn y_min(&self) -> LUnits {
        self.y_min
    }

    /// Largest y reached by any shape.
    pub fn y_max(&self) -> LUnits {
        self.y_max
    }

    pub fn height(&self) -> LUnits {
        self.y_max - self.y_min
    }
}

/// Gourlay spacing over one symbol table.
///
/// # Examples
///
/// ```
/// # use stave::{AppConfig, spacing::SpacingEngine};
/// # use stave_core::{shape::MeasuredShape, symbol::{SymbolEntry, SymbolKind, SymbolTable}};
/// let table = SymbolTable::from_entries(
///     vec![1],
///     [
///         SymbolEntry::new(0.0, SymbolKind::Note).with_duration(64.0),
///         SymbolEntry::new(64.0, SymbolKind::Note).with_duration(64.0),
///     ],
/// )
/// .unwrap();
/// let meter = |_: &SymbolEntry, _: usize| MeasuredShape::new(200.0, 180.0);
///
/// let mut engine = SpacingEngine::new(&AppConfig::default(), &table, &meter);
/// engine.do_spacing();
/// assert_eq!(engine.num_columns(), 1);
/// assert!(engine.get_column_width(0) >= engine.minimum_width(0));
/// ```
#[derive(Debug)]
pub struct SpacingEngine {
    params: SpacingParams,
    line_break: LineBreakConfig,
    num_instruments: usize,
    shapes: Vec<ShapeData>,
    slices: Vec<TimeSlice>,
    columns: Vec<Column>,
}

impl SpacingEngine {
    /// Scans `table` into slices and columns, measuring every entry that
    /// does not carry a shape exactly once with `meter`.
    pub fn new(config: &AppConfig, table: &SymbolTable, meter: &dyn ShapeMeter) -> Self {
        let params = SpacingParams::new(config.spacing(), config.engraving());
        let score = ScoreScanner::new(table, meter, params.dmin).scan();

        Self {
            params,
            line_break: config.line_break().clone(),
            num_instruments: table.num_instruments(),
            shapes: score.shapes,
            slices: score.slices,
            columns: score.columns,
        }
    }

    /// Computes rods and springs of every column and applies the optimum force.
    pub fn do_spacing(&mut self) {
        for index in 0..self.columns.len() {
            self.space_column(index);
        }
        info!(
            columns = self.columns.len(),
            optimum_force = self.params.optimum_force;
            "Spacing computed"
        );
    }

    fn space_column(&mut self, index: usize) {
        let range = self.columns[index].slices.clone();

        for position in range.clone() {
            let (head, tail) = self.slices.split_at_mut(position);
            let slice = &mut tail[0];
            let prev = slice.prev.map(|id| &mut head[id.index()]);
            slice.assign_spacing_values(prev, &self.shapes, &self.params);
        }

        self.apply_lyric_constraints(index);

        for position in range {
            let next_timepos = self.slices[position]
                .next
                .map(|id| self.slices[id.index()].timepos);
            let prev_min_note_next = self.slices[position]
                .prev
                .and_then(|id| self.slices[id.index()].durations.min_note_next);

            let slice = &mut self.slices[position];
            slice.compute_ds_and_di(next_timepos, prev_min_note_next, &self.shapes);
            slice.compute_spring_data(&self.params);
        }

        self.fix_neighborhood_spacing_problems(index);

        let force = self.params.optimum_force;
        let column = &mut self.columns[index];
        column.order_slices(&self.slices);
        column.determine_minimum_width(&self.slices);
        column.apply_force(&mut self.slices, force);
        column.determine_approx_sff_for(&self.slices, force);
        column.collect_barlines_information(&self.slices, &self.shapes, self.num_instruments);

        debug!(
            column = index,
            min_width = column.min_width,
            width = column.width;
            "Column spaced"
        );
        trace!(column = index; "Column data\n{}", self.dump_column_data(index));
    }

    /// Keeps consecutive syllables of one line from overlapping.
    fn apply_lyric_constraints(&mut self, index: usize) {
        let Self {
            columns,
            slices,
            shapes,
            params,
            ..
        } = self;
        let column = &columns[index];
        let closed_by_barline = column
            .slice_ids()
            .next_back()
            .is_some_and(|id| slices[id.index()].kind() == SliceKind::Barline);

        for (k, member) in column.sequences.iter().enumerate() {
            let lyric = shapes[member.shape.index()].lyric_width();
            if lyric <= 0.0 {
                continue;
            }

            let next = column.sequences[k + 1..]
                .iter()
                .find(|other| other.line == member.line);

            match next {
                Some(next) => {
                    let next_lyric = shapes[next.shape.index()].lyric_width();
                    let (a, b) = (member.slice.index(), next.slice.index());
                    if next_lyric <= 0.0 || b <= a {
                        continue;
                    }

                    let required = lyric / 2.0 + next_lyric / 2.0 + params.lyric_gap;
                    // anchor distance at minimum extent
                    let available = slices[a..b].iter().map(|s| s.rods.xi()).sum::<LUnits>()
                        + slices[a + 1..=b]
                            .iter()
                            .map(|s| s.rods.x_left)
                            .sum::<LUnits>();
                    if required > available {
                        // grace and non-timed slices stay against the note they precede
                        let target_index = (a..b)
                            .rev()
                            .find(|&k| slices[k].kind() == SliceKind::NoteRest)
                            .unwrap_or(a);
                        let target = &mut slices[target_index];
                        let xi = target.rods.xi();
                        target.rods.set_minimum_xi(xi + required - available);
                        trace!(slice = target_index, deficit = required - available; "Lyric overlap fixed");
                    }
                }
                None if member.role == SeqRole::EndAndStart || closed_by_barline => {
                    slices[member.slice.index()]
                        .rods
                        .set_minimum_xi(lyric / 2.0 + params.lyric_gap);
                }
                None => {}
            }
        }
    }

    /// Widens note/rest slices whose notes outlast them, so that the notes
    /// of the following slice cannot crowd against them.
    fn fix_neighborhood_spacing_problems(&mut self, index: usize) {
        let range = self.columns[index].slices.clone();
        for position in range.start..range.end.saturating_sub(1) {
            let next = &self.slices[position + 1];
            if next.kind() != SliceKind::NoteRest {
                continue;
            }
            let next_xi = next.rods.xi();

            let slice = &mut self.slices[position];
            let outlasting = slice.durations.di > slice.durations.ds + TIME_TOLERANCE;
            if slice.kind() != SliceKind::NoteRest || !slice.is_stretchable() || !outlasting {
                continue;
            }

            let required = slice.rods.x_li + next_xi;
            if slice.rods.xi() < required {
                trace!(slice = position, required; "Widening slice outlasted by its notes");
                slice.rods.set_minimum_xi(required);
                slice.refresh_pre_stretching_force();
            }
        }
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Current width of a column: at the optimum force after spacing, at
    /// the justified force afterwards.
    pub fn get_column_width(&self, column: usize) -> LUnits {
        self.columns[column].width
    }

    /// Width of a column at force zero.
    pub fn minimum_width(&self, column: usize) -> LUnits {
        self.columns[column].min_width
    }

    pub fn determine_force_for(&self, column: usize, width: LUnits) -> f32 {
        self.columns[column].determine_force_for(&self.slices, width)
    }

    pub fn determine_extent_for(&self, column: usize, force: f32) -> LUnits {
        self.columns[column].determine_extent_for(&self.slices, force)
    }

    /// True when the column holds no note or rest that takes part in spacing.
    pub fn is_empty_column(&self, column: usize) -> bool {
        self.columns[column].sequences.is_empty()
    }

    /// True when a line must end after this column.
    pub fn has_system_break(&self, column: usize) -> bool {
        self.columns[column].has_system_break
    }

    pub fn column_barlines_information(&self, column: usize) -> BarlinesInfo {
        self.columns[column].barlines
    }

    /// Notes and rests of a column with their role in their line.
    pub fn sequence_roles(&self, column: usize) -> Vec<(EntryId, SeqRole)> {
        self.columns[column]
            .sequences
            .iter()
            .map(|member| (self.shapes[member.shape.index()].entry, member.role))
            .collect()
    }

    pub fn optimum_force(&self) -> f32 {
        self.params.optimum_force
    }

    /// Width available to a system.
    pub fn line_width(&self, i_system: usize) -> LUnits {
        self.line_break.width_for_system(i_system)
    }

    /// Sum of the current widths of a range of columns.
    pub fn system_width(&self, columns: RangeInclusive<usize>) -> LUnits {
        self.columns[columns].iter().map(|column| column.width).sum()
    }

    /// Cost of a line made of columns `first..=last`.
    ///
    /// The cost is the distance between the force that fills the line and
    /// the optimum force, plus a penalty for breaking where not every
    /// instrument has a barline. Lines that cannot fit cost
    /// [`LINE_OVERFLOW_PENALTY`]; lines ended by a system break cost nothing.
    pub fn determine_penalty_for_line(&self, i_system: usize, first: usize, last: usize) -> f32 {
        let line_width = self.line_width(i_system);
        let columns = &self.columns[first..=last];

        let min_width: LUnits = columns.iter().map(|column| column.min_width).sum();
        if min_width > line_width + WIDTH_TOLERANCE {
            trace!(first, last, min_width, line_width; "Line overflows");
            return LINE_OVERFLOW_PENALTY;
        }
        if columns.last().is_some_and(|column| column.has_system_break) {
            return 0.0;
        }

        let mut ordered: Vec<_> = columns
            .iter()
            .flat_map(|column| column.ordered.iter().copied())
            .collect();
        ordered.sort_by(|a, b| {
            self.slices[a.index()]
                .fi
                .total_cmp(&self.slices[b.index()].fi)
        });

        let force = force_for_width(&self.slices, &ordered, line_width);
        let penalty = (force - self.params.optimum_force).abs() + self.break_penalty(last);
        trace!(first, last, force, penalty; "Line penalty");
        penalty
    }

    fn break_penalty(&self, last: usize) -> f32 {
        if last + 1 >= self.columns.len() {
            return 0.0;
        }
        let barlines = self.columns[last].barlines;
        if barlines.all_instruments() {
            0.0
        } else if barlines.some_instruments() {
            self.line_break.partial_barline_penalty()
        } else {
            self.line_break.no_barline_penalty()
        }
    }

    /// Whether breaking at `i` before line `i..j` improves on the best
    /// known total. Ties keep the candidate already recorded.
    pub fn is_better_option(
        &self,
        prev_penalty: f32,
        new_penalty: f32,
        next_penalty: f32,
        i: usize,
        j: usize,
    ) -> bool {
        let better = prev_penalty + new_penalty < next_penalty;
        trace!(i, j, prev_penalty, new_penalty, next_penalty, better; "Break option");
        better
    }

    /// Spreads `extra` width over a system, proportionally to what each
    /// column can stretch.
    pub fn justify_system(&mut self, columns: RangeInclusive<usize>, extra: LUnits) {
        if extra.abs() <= WIDTH_TOLERANCE {
            return;
        }

        let Self {
            columns: all,
            slices,
            ..
        } = self;
        let system = &mut all[columns.clone()];

        let stretchable: Vec<LUnits> = system.iter().map(Column::stretchable_width).collect();
        let total: LUnits = stretchable.iter().sum();
        let elastic: Vec<bool> = system
            .iter()
            .map(|column| {
                column
                    .ordered
                    .iter()
                    .any(|id| slices[id.index()].is_stretchable())
            })
            .collect();
        let elastic_count = elastic.iter().filter(|&&elastic| elastic).count();
        if elastic_count == 0 {
            debug!(first = *columns.start(), last = *columns.end(); "Nothing to justify");
            return;
        }

        for (k, column) in system.iter_mut().enumerate() {
            let share = if total > WIDTH_TOLERANCE {
                extra * stretchable[k] / total
            } else if elastic[k] {
                extra / elastic_count as LUnits
            } else {
                0.0
            };
            let force = column.determine_force_for(slices, column.width + share);
            column.apply_force(slices, force);
        }

        debug!(first = *columns.start(), last = *columns.end(), extra; "System justified");
    }

    /// Places the slices and shapes of a system and hands its shapes over.
    ///
    /// Shapes of a column can be handed over once; a second call for the
    /// same columns yields no shapes.
    pub fn reposition_slices_and_staffobjs(
        &mut self,
        columns: RangeInclusive<usize>,
        x_start: LUnits,
        y_shift: LUnits,
    ) -> SystemPlacement {
        let Self {
            params,
            shapes,
            slices,
            columns: all,
            ..
        } = self;

        let mut extent = VerticalExtent::default();
        let mut placements = Vec::new();
        let mut handed_over = Vec::new();
        let mut x = x_start;

        for index in columns {
            let column = &mut all[index];
            column.move_to(x, y_shift, slices, shapes, params, &mut extent);
            placements.push(ColumnPlacement {
                column: index,
                x_start: x,
                width: column.width,
            });
            x += column.width;

            for slice in &slices[column.slices.clone()] {
                for data in &mut shapes[slice.shapes.clone()] {
                    if let Some(shape) = data.shape.take() {
                        handed_over.push(PositionedShape::new(
                            data.entry,
                            data.kind,
                            shape,
                            data.origin,
                        ));
                    }
                }
            }
        }

        let (y_min, y_max) = if extent.is_empty() {
            (y_shift, y_shift)
        } else {
            (extent.y_min, extent.y_max)
        };

        SystemPlacement {
            columns: placements,
            shapes: handed_over,
            y_min,
            y_max,
        }
    }

    /// Time grid of a repositioned column.
    pub fn create_time_grid_table_for_column(&self, column: usize) -> TimeGridTable {
        self.columns[column].time_grid(&self.slices)
    }

    /// Human-readable listing of a column's slices.
    pub fn dump_column_data(&self, column: usize) -> String {
        let data = &self.columns[column];
        let mut out = String::new();
        let _ = writeln!(
            out,
            "column {column}: min width {:.2}, width {:.2}, x_fixed {:.2}, slope {:.4}, break {}",
            data.min_width, data.width, data.x_fixed, data.slope, data.has_system_break
        );
        let _ = writeln!(
            out,
            " slice kind        timepos      ds      di  x_left    x_li    x_ri         ci         fi    width"
        );
        for id in data.slice_ids() {
            let slice = &self.slices[id.index()];
            let (ci, fi) = if slice.is_stretchable() {
                (format!("{:.6}", slice.ci), format!("{:.3}", slice.fi))
            } else {
                ("-".to_string(), "rigid".to_string())
            };
            let _ = writeln!(
                out,
                "{:6} {:<10}{:9.2}{:8.2}{:8.2}{:8.2}{:8.2}{:8.2}{:>11}{:>11}{:9.2}",
                id.index(),
                slice.kind().name(),
                slice.timepos,
                slice.durations.ds,
                slice.durations.di,
                slice.rods.x_left,
                slice.rods.x_li,
                slice.rods.x_ri,
                ci,
                fi,
                slice.width
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use proptest::prelude::*;

    use stave_core::{
        shape::MeasuredShape,
        symbol::{BarlineKind, SymbolEntry, SymbolKind},
        units::TimeUnits,
    };

    use super::*;

    fn meter(entry: &SymbolEntry, staff: usize) -> MeasuredShape {
        let width = match entry.kind() {
            SymbolKind::Clef => 300.0,
            SymbolKind::KeySignature => 200.0,
            SymbolKind::TimeSignature => 160.0,
            SymbolKind::Barline(_) => 20.0,
            SymbolKind::GraceNote => 120.0,
            _ => 200.0,
        };
        MeasuredShape::new(width, 180.0).with_top(staff as LUnits * 1000.0)
    }

    fn clef() -> SymbolEntry {
        SymbolEntry::new(0.0, SymbolKind::Clef)
    }

    fn note(time: TimeUnits, duration: TimeUnits) -> SymbolEntry {
        SymbolEntry::new(time, SymbolKind::Note).with_duration(duration)
    }

    fn barline(time: TimeUnits) -> SymbolEntry {
        SymbolEntry::new(time, SymbolKind::Barline(BarlineKind::Simple))
    }

    fn spaced(config: &AppConfig, entries: Vec<SymbolEntry>) -> SpacingEngine {
        spaced_on_staves(config, vec![1], entries)
    }

    fn spaced_on_staves(
        config: &AppConfig,
        staves: Vec<usize>,
        entries: Vec<SymbolEntry>,
    ) -> SpacingEngine {
        let table = SymbolTable::from_entries(staves, entries).unwrap();
        let mut engine = SpacingEngine::new(config, &table, &meter);
        engine.do_spacing();
        engine
    }

    /// Four measures of four quarter notes.
    fn four_measures() -> Vec<SymbolEntry> {
        let mut entries = vec![clef()];
        for measure in 0..4 {
            let start = measure as TimeUnits * 256.0;
            for beat in 0..4 {
                entries.push(note(start + beat as TimeUnits * 64.0, 64.0));
            }
            entries.push(barline(start + 256.0));
        }
        entries
    }

    #[test]
    fn test_equal_notes_get_equal_slices() {
        let engine = spaced(
            &AppConfig::default(),
            vec![clef(), note(0.0, 64.0), note(64.0, 64.0), barline(128.0)],
        );

        let (first, second) = (&engine.slices[1], &engine.slices[2]);
        for force in [0.0, 0.5, 1.4, 3.0, 10.0] {
            assert_approx_eq!(
                f32,
                first.extent_for(force),
                second.extent_for(force),
                epsilon = 0.001
            );
        }
    }

    #[test]
    fn test_long_note_keeps_room_for_following_short_notes() {
        // half note in voice 0, eighths in voice 1 after it
        let engine = spaced(
            &AppConfig::default(),
            vec![
                clef(),
                note(0.0, 128.0),
                note(32.0, 32.0).with_voice(1),
                note(64.0, 32.0).with_voice(1),
                barline(128.0),
            ],
        );

        let half = &engine.slices[1];
        let eighth = &engine.slices[2];
        assert!(half.durations.di > half.durations.ds);
        assert!(half.rods.xi() >= half.rods.x_li + eighth.rods.xi() - WIDTH_TOLERANCE);
        assert!(half.width >= half.rods.x_left + half.rods.x_li + eighth.rods.xi() - WIDTH_TOLERANCE);
    }

    #[test]
    fn test_prolog_without_time_signature() {
        let engine = spaced(
            &AppConfig::default(),
            vec![
                clef(),
                SymbolEntry::new(0.0, SymbolKind::KeySignature),
                note(0.0, 64.0),
            ],
        );
        let params = &engine.params;
        let prolog = &engine.slices[0];
        assert_eq!(prolog.kind(), SliceKind::Prolog);
        assert_approx_eq!(
            f32,
            prolog.width,
            params.space_before_prolog
                + 300.0
                + params.prolog_gap
                + 200.0
                + params.space_after_prolog
        );
    }

    #[test]
    fn test_penalty_is_lowest_at_optimum_force() {
        let natural = spaced(&AppConfig::default(), four_measures());
        let natural_width = natural.system_width(0..=1);

        let at_optimum = spaced(
            &AppConfig::default()
                .with_line_break(LineBreakConfig::default().with_line_width(natural_width)),
            four_measures(),
        );
        let stretched = spaced(
            &AppConfig::default()
                .with_line_break(LineBreakConfig::default().with_line_width(natural_width * 3.0)),
            four_measures(),
        );

        let optimum_penalty = at_optimum.determine_penalty_for_line(1, 0, 1);
        let stretched_penalty = stretched.determine_penalty_for_line(1, 0, 1);
        assert!(optimum_penalty < 0.01, "penalty {optimum_penalty}");
        assert!(optimum_penalty < stretched_penalty);
    }

    #[test]
    fn test_penalty_for_overflowing_line() {
        let engine = spaced(
            &AppConfig::default().with_line_break(LineBreakConfig::default().with_line_width(500.0)),
            four_measures(),
        );
        assert_approx_eq!(
            f32,
            engine.determine_penalty_for_line(1, 0, 3),
            LINE_OVERFLOW_PENALTY
        );
    }

    #[test]
    fn test_penalty_after_system_break_is_zero() {
        let mut entries = four_measures();
        entries.insert(6, SymbolEntry::new(256.0, SymbolKind::SystemBreak));
        let engine = spaced(&AppConfig::default(), entries);
        assert!(engine.has_system_break(0));
        assert_approx_eq!(f32, engine.determine_penalty_for_line(0, 0, 0), 0.0);
    }

    #[test]
    fn test_break_without_barline_costs_more() {
        let config = AppConfig::default();
        let with_barlines = spaced(&config, four_measures());
        let info = with_barlines.column_barlines_information(0);
        assert!(info.all_instruments());
        assert!(!info.all_final());

        // a line ending at the last column never pays for a missing barline
        let engine = spaced(&config, vec![clef(), note(0.0, 64.0), note(64.0, 64.0)]);
        assert!(!engine.column_barlines_information(0).some_instruments());
        assert_approx_eq!(f32, engine.break_penalty(0), 0.0);
    }

    #[test]
    fn test_is_better_option_keeps_ties() {
        let engine = spaced(&AppConfig::default(), four_measures());
        assert!(engine.is_better_option(1.0, 1.0, 3.0, 0, 2));
        assert!(!engine.is_better_option(1.0, 2.0, 3.0, 0, 2));
    }

    #[test]
    fn test_justify_reaches_target_width() {
        let mut engine = spaced(&AppConfig::default(), four_measures());
        let width = engine.system_width(0..=3);
        engine.justify_system(0..=3, 3000.0);
        assert_approx_eq!(f32, engine.system_width(0..=3), width + 3000.0, epsilon = 1.0);
    }

    #[test]
    fn test_justify_can_compress_to_minimum() {
        let mut engine = spaced(&AppConfig::default(), four_measures());
        let minimum: LUnits = (0..4).map(|column| engine.minimum_width(column)).sum();
        let width = engine.system_width(0..=3);
        engine.justify_system(0..=3, -(width - minimum) * 0.5);
        let justified = engine.system_width(0..=3);
        assert!(justified < width);
        assert!(justified >= minimum - WIDTH_TOLERANCE);
    }

    #[test]
    fn test_reposition_hands_over_shapes() {
        let mut engine = spaced(&AppConfig::default(), four_measures());
        let placement = engine.reposition_slices_and_staffobjs(0..=1, 500.0, 2000.0);

        assert_eq!(placement.columns().len(), 2);
        assert_approx_eq!(f32, placement.x_start(), 500.0);
        assert_approx_eq!(
            f32,
            placement.width(),
            engine.system_width(0..=1),
            epsilon = 0.01
        );
        // clef, 8 notes and 2 barlines
        assert_eq!(placement.shapes().len(), 11);
        assert_approx_eq!(f32, placement.y_min(), 2000.0);
        assert_approx_eq!(f32, placement.y_max(), 2180.0);

        let again = engine.reposition_slices_and_staffobjs(0..=1, 500.0, 2000.0);
        assert!(again.shapes().is_empty());
    }

    #[test]
    fn test_notes_align_on_slice_anchor() {
        let mut engine = spaced(
            &AppConfig::default(),
            vec![
                note(0.0, 64.0),
                SymbolEntry::new(0.0, SymbolKind::Note)
                    .with_duration(64.0)
                    .with_voice(1)
                    .with_shape(MeasuredShape::new(330.0, 180.0).with_anchor_offset(-130.0)),
                barline(64.0),
            ],
        );
        let placement = engine.reposition_slices_and_staffobjs(0..=0, 0.0, 0.0);
        let anchors: Vec<LUnits> = placement
            .shapes()
            .iter()
            .filter(|shape| shape.kind() == SymbolKind::Note)
            .map(PositionedShape::anchor_x)
            .collect();
        assert_eq!(anchors.len(), 2);
        assert_approx_eq!(f32, anchors[0], anchors[1]);
        assert!(placement.shapes().iter().all(|shape| shape.bounds().min_x() >= 0.0));
    }

    #[test]
    fn test_full_measure_rest_centred_in_column() {
        let mut engine = spaced(
            &AppConfig::default(),
            vec![
                note(0.0, 256.0),
                barline(256.0),
                SymbolEntry::new(256.0, SymbolKind::Rest { full_measure: true })
                    .with_duration(256.0),
                barline(512.0),
            ],
        );
        assert!(engine.is_empty_column(1));
        let placement = engine.reposition_slices_and_staffobjs(0..=1, 0.0, 0.0);
        let column = placement.columns()[1];
        let rest = placement
            .shapes()
            .iter()
            .find(|shape| shape.kind().is_full_measure_rest())
            .unwrap();
        assert_approx_eq!(
            f32,
            rest.bounds().center_x(),
            column.x_start() + column.width() / 2.0,
            epsilon = 0.01
        );
    }

    #[test]
    fn test_grace_notes_sit_before_principal_note() {
        let mut engine = spaced(
            &AppConfig::default(),
            vec![
                clef(),
                note(0.0, 64.0),
                SymbolEntry::new(64.0, SymbolKind::GraceNote),
                note(64.0, 64.0),
                barline(128.0),
            ],
        );
        let placement = engine.reposition_slices_and_staffobjs(0..=0, 0.0, 0.0);
        let shapes = placement.shapes();
        let grace = shapes[2].bounds();
        let principal = shapes[3].bounds();
        assert!(grace.max_x() <= principal.min_x() + WIDTH_TOLERANCE);
        assert!(grace.min_x() >= shapes[1].bounds().max_x() - WIDTH_TOLERANCE);
    }

    #[test]
    fn test_lyrics_push_notes_apart() {
        let lyric = |time: TimeUnits| {
            note(time, 16.0).with_shape(MeasuredShape::new(200.0, 180.0).with_lyric_width(1200.0))
        };
        let mut engine = spaced(
            &AppConfig::default(),
            vec![clef(), lyric(0.0), lyric(16.0), barline(32.0)],
        );
        let params = engine.params.clone();
        let placement = engine.reposition_slices_and_staffobjs(0..=0, 0.0, 0.0);
        let notes: Vec<&PositionedShape> = placement
            .shapes()
            .iter()
            .filter(|shape| shape.kind() == SymbolKind::Note)
            .collect();
        let distance = notes[1].anchor_x() - notes[0].anchor_x();
        assert!(distance >= 1200.0 + params.lyric_gap - WIDTH_TOLERANCE);
    }

    #[test]
    fn test_lyrics_keep_grace_note_before_principal() {
        let lyric = |time: TimeUnits| {
            note(time, 32.0).with_shape(MeasuredShape::new(200.0, 180.0).with_lyric_width(1500.0))
        };
        let mut engine = spaced(
            &AppConfig::default(),
            vec![
                lyric(0.0),
                SymbolEntry::new(32.0, SymbolKind::GraceNote),
                lyric(32.0),
                barline(64.0),
            ],
        );
        let params = engine.params.clone();
        let placement = engine.reposition_slices_and_staffobjs(0..=0, 0.0, 0.0);
        let shapes = placement.shapes();
        let (first, grace, principal) = (&shapes[0], shapes[1].bounds(), &shapes[2]);
        assert_eq!(shapes[1].kind(), SymbolKind::GraceNote);

        assert!(principal.anchor_x() - first.anchor_x() >= 1500.0 + params.lyric_gap - WIDTH_TOLERANCE);
        let gap = principal.bounds().min_x() - grace.max_x();
        assert!(gap >= -WIDTH_TOLERANCE);
        assert!(
            gap <= params.exceptional_min_space + params.grace_gap + WIDTH_TOLERANCE,
            "grace note is {gap} away from its principal note"
        );
    }

    #[test]
    fn test_instruments_share_time_positions() {
        // each instrument listed in turn at time zero
        let entries = vec![
            clef(),
            note(0.0, 64.0),
            clef().with_instrument(1),
            note(0.0, 64.0).with_instrument(1),
            barline(64.0),
            barline(64.0).with_instrument(1),
        ];
        let mut engine = spaced_on_staves(&AppConfig::default(), vec![1, 1], entries);

        let kinds: Vec<SliceKind> = engine.slices.iter().map(TimeSlice::kind).collect();
        assert_eq!(
            kinds,
            vec![SliceKind::Prolog, SliceKind::NoteRest, SliceKind::Barline]
        );
        assert!(engine.slices[1].is_stretchable());
        assert!(engine.column_barlines_information(0).all_instruments());

        let placement = engine.reposition_slices_and_staffobjs(0..=0, 0.0, 0.0);
        let anchors: Vec<LUnits> = placement
            .shapes()
            .iter()
            .filter(|shape| shape.kind() == SymbolKind::Note)
            .map(PositionedShape::anchor_x)
            .collect();
        assert_eq!(anchors.len(), 2);
        assert_approx_eq!(f32, anchors[0], anchors[1]);

        let barlines: Vec<LUnits> = placement
            .shapes()
            .iter()
            .filter(|shape| shape.kind().is_barline())
            .map(|shape| shape.bounds().min_x())
            .collect();
        assert_approx_eq!(f32, barlines[0], barlines[1]);
    }

    #[test]
    fn test_sequence_roles_are_exposed() {
        let engine = spaced(&AppConfig::default(), four_measures());
        let roles = engine.sequence_roles(0);
        assert_eq!(roles.len(), 4);
        assert_eq!(roles[0].1, SeqRole::Start);
        assert_eq!(roles[3].1, SeqRole::EndAndStart);
        assert_eq!(engine.sequence_roles(3)[3].1, SeqRole::End);
    }

    #[test]
    fn test_time_grid_for_column() {
        let mut engine = spaced(&AppConfig::default(), four_measures());
        engine.reposition_slices_and_staffobjs(0..=0, 0.0, 0.0);
        let grid = engine.create_time_grid_table_for_column(0);
        assert_eq!(grid.len(), 5);
        assert_approx_eq!(f64, grid.start_time(), 0.0);
        assert_approx_eq!(f64, grid.end_time(), 256.0);
        assert_approx_eq!(f64, grid.entries()[4].duration(), 0.0);
    }

    #[test]
    fn test_dump_column_data() {
        let engine = spaced(&AppConfig::default(), four_measures());
        let dump = engine.dump_column_data(0);
        assert!(dump.starts_with("column 0"));
        assert!(dump.contains("prolog"));
        assert!(dump.contains("rigid"));
        assert_eq!(dump.lines().count(), 2 + 6);
    }

    #[test]
    fn test_empty_table() {
        let engine = spaced(&AppConfig::default(), Vec::new());
        assert_eq!(engine.num_columns(), 0);
    }

    mod proptest_tests {
        use super::*;

        fn durations_strategy() -> impl Strategy<Value = Vec<TimeUnits>> {
            prop::collection::vec(
                prop_oneof![Just(16.0), Just(32.0), Just(64.0), Just(96.0), Just(128.0)],
                1..24,
            )
        }

        /// One voice, a barline after every four notes and at the end.
        fn entries_for(durations: &[TimeUnits]) -> Vec<SymbolEntry> {
            let mut entries = vec![clef()];
            let mut time = 0.0;
            for (k, &duration) in durations.iter().enumerate() {
                entries.push(note(time, duration));
                time += duration;
                if k % 4 == 3 || k + 1 == durations.len() {
                    entries.push(barline(time));
                }
            }
            entries
        }

        fn check_time_grid_monotonic(
            durations: &[TimeUnits],
            extra: LUnits,
        ) -> Result<(), TestCaseError> {
            let mut engine = spaced(&AppConfig::default(), entries_for(durations));
            let last = engine.num_columns() - 1;
            engine.justify_system(0..=last, extra);
            engine.reposition_slices_and_staffobjs(0..=last, 0.0, 0.0);

            for column in 0..=last {
                let grid = engine.create_time_grid_table_for_column(column);
                for pair in grid.entries().windows(2) {
                    prop_assert!(pair[0].timepos() < pair[1].timepos());
                    prop_assert!(pair[0].x() <= pair[1].x() + WIDTH_TOLERANCE);
                }
            }
            Ok(())
        }

        fn check_columns_tile_system(durations: &[TimeUnits]) -> Result<(), TestCaseError> {
            let mut engine = spaced(&AppConfig::default(), entries_for(durations));
            let last = engine.num_columns() - 1;
            let placement = engine.reposition_slices_and_staffobjs(0..=last, 100.0, 0.0);
            for pair in placement.columns().windows(2) {
                prop_assert!((pair[0].x_end() - pair[1].x_start()).abs() <= WIDTH_TOLERANCE);
            }
            for column in 0..=last {
                prop_assert!(
                    engine.get_column_width(column)
                        >= engine.minimum_width(column) - WIDTH_TOLERANCE
                );
            }
            Ok(())
        }

        proptest! {
            #[test]
            fn test_time_grid_is_monotonic(durations in durations_strategy(), extra in 0.0f32..4000.0) {
                check_time_grid_monotonic(&durations, extra)?;
            }

            #[test]
            fn test_columns_tile_system(durations in durations_strategy()) {
                check_columns_tile_system(&durations)?;
            }
        }
    }
}
