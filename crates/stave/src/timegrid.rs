//! Time-position to x-position mapping for laid-out music.
//!
//! A [`TimeGridTable`] records, for every note/rest time position and every
//! barline of a column or system, the x coordinate where it was placed.
//! Cursor positioning and beat-grid drawing read it; nothing writes to it
//! after layout.

use std::fmt::Write;

use stave_core::units::{LUnits, TimeUnits, is_equal_time, is_lower_time};

/// One row of a [`TimeGridTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGridEntry {
    timepos: TimeUnits,
    duration: TimeUnits,
    x: LUnits,
}

impl TimeGridEntry {
    /// Creates an entry. Barlines use a zero duration.
    pub fn new(timepos: TimeUnits, duration: TimeUnits, x: LUnits) -> Self {
        Self {
            timepos,
            duration,
            x,
        }
    }

    pub fn timepos(&self) -> TimeUnits {
        self.timepos
    }

    /// Shortest duration starting at this time position; zero for barlines.
    pub fn duration(&self) -> TimeUnits {
        self.duration
    }

    /// Absolute x of the alignment anchor.
    pub fn x(&self) -> LUnits {
        self.x
    }
}

/// Sorted `(timepos, duration, x)` rows.
///
/// Within one column time positions are strictly increasing. A system table
/// concatenates column tables, so a barline and the first note of the next
/// measure may share a time position; the barline row comes first.
///
/// # Examples
///
/// ```
/// # use stave::timegrid::{TimeGridEntry, TimeGridTable};
/// let mut table = TimeGridTable::new();
/// table.add_entry(TimeGridEntry::new(0.0, 64.0, 100.0));
/// table.add_entry(TimeGridEntry::new(64.0, 64.0, 500.0));
///
/// assert_eq!(table.get_x_for_note_rest_at_time(32.0), 300.0);
/// assert_eq!(table.end_time(), 128.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeGridTable {
    entries: Vec<TimeGridEntry>,
}

impl TimeGridTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row.
    pub fn add_entry(&mut self, entry: TimeGridEntry) {
        self.entries.push(entry);
    }

    /// Appends every row of another table, e.g. the next column of a system.
    pub fn add_entries(&mut self, other: &TimeGridTable) {
        self.entries.extend_from_slice(&other.entries);
    }

    pub fn entries(&self) -> &[TimeGridEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time position of the first row, 0 for an empty table.
    pub fn start_time(&self) -> TimeUnits {
        self.entries.first().map_or(0.0, |entry| entry.timepos)
    }

    /// Time position at which the last row stops sounding, 0 for an empty table.
    pub fn end_time(&self) -> TimeUnits {
        self.entries
            .last()
            .map_or(0.0, |entry| entry.timepos + entry.duration)
    }

    /// Returns the time position of the first row at or right of `x`.
    ///
    /// Positions left of the first row map to 0; positions right of the last
    /// row map to the last row's time.
    pub fn get_time_for_position(&self, x: LUnits) -> TimeUnits {
        let Some(first) = self.entries.first() else {
            return 0.0;
        };
        if x <= first.x {
            return 0.0;
        }

        self.entries[1..]
            .iter()
            .find(|entry| x <= entry.x)
            .or(self.entries.last())
            .map_or(0.0, |entry| entry.timepos)
    }

    /// Returns the x of the note or rest at `timepos`, interpolating between rows.
    ///
    /// When several rows share the time position and the first one has no
    /// duration (a barline), the last of them is used so that the note after
    /// the barline is returned.
    pub fn get_x_for_note_rest_at_time(&self, timepos: TimeUnits) -> LUnits {
        let Some(first) = self.entries.first() else {
            return 0.0;
        };
        if is_lower_time(timepos, first.timepos) {
            return 0.0;
        }

        let mut prev = first;
        for (index, entry) in self.entries.iter().enumerate() {
            if is_lower_time(timepos, entry.timepos) {
                return interpolate(prev, entry, timepos);
            }
            if is_equal_time(timepos, entry.timepos) {
                if entry.duration > 0.0 {
                    return entry.x;
                }
                return self.entries[index..]
                    .iter()
                    .take_while(|next| is_equal_time(timepos, next.timepos))
                    .last()
                    .map_or(entry.x, |last| last.x);
            }
            prev = entry;
        }

        self.entries.last().map_or(0.0, |entry| entry.x)
    }

    /// Returns the x of the barline at `timepos`, interpolating between rows.
    ///
    /// When several rows share the time position the first one is used.
    pub fn get_x_for_barline_at_time(&self, timepos: TimeUnits) -> LUnits {
        let Some(first) = self.entries.first() else {
            return 0.0;
        };
        if is_lower_time(timepos, first.timepos) {
            return 0.0;
        }

        let mut prev = first;
        for entry in &self.entries {
            if is_equal_time(timepos, entry.timepos) {
                return entry.x;
            }
            if is_lower_time(timepos, entry.timepos) {
                return interpolate(prev, entry, timepos);
            }
            prev = entry;
        }

        self.entries.last().map_or(0.0, |entry| entry.x)
    }

    /// Human-readable listing of the table.
    pub fn dump(&self) -> String {
        let mut out = String::from("  item     timepos    duration       x\n");
        for (index, entry) in self.entries.iter().enumerate() {
            let _ = writeln!(
                out,
                "{index:6}{:12.2}{:12.2}{:10.2}",
                entry.timepos, entry.duration, entry.x
            );
        }
        out
    }
}

fn interpolate(prev: &TimeGridEntry, next: &TimeGridEntry, timepos: TimeUnits) -> LUnits {
    let span = next.timepos - prev.timepos;
    if span <= 0.0 {
        return next.x;
    }
    let dx = f64::from(next.x - prev.x) / span;
    prev.x + ((timepos - prev.timepos) * dx) as LUnits
}
