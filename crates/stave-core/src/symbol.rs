//! The ordered symbol table consumed by the spacing engine.
//!
//! A [`SymbolTable`] is the flattened, time-ordered view of a score: one
//! [`SymbolEntry`] per staff object, tagged with its instrument, staff and
//! voice. The table is rebuilt from scratch for every layout pass.
//!
//! Entries must never go back in time. At equal time the table keeps them
//! as barlines (and system breaks), non-timed objects (clefs, key and time
//! signatures, spacers), grace notes, then notes and rests, whatever the
//! order they were pushed in. Entries of the same rank keep their push order.

use serde::Deserialize;
use thiserror::Error;

use crate::{
    index::EntryId,
    shape::MeasuredShape,
    units::{TimeUnits, is_equal_time, is_lower_time},
};

/// Visual style of a barline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarlineKind {
    #[default]
    Simple,
    Double,
    Final,
    StartRepeat,
    EndRepeat,
}

/// The kind of musical object an entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Clef,
    KeySignature,
    TimeSignature,
    /// Invisible horizontal space attached to a time position.
    Spacer,
    Note,
    Rest {
        /// A rest filling a whole measure, centred in it after justification.
        full_measure: bool,
    },
    GraceNote,
    Barline(BarlineKind),
    /// Forces a line break after the measure containing it.
    SystemBreak,
}

impl SymbolKind {
    /// Returns true for notes and rests (including full-measure rests).
    pub fn is_note_rest(self) -> bool {
        matches!(self, Self::Note | Self::Rest { .. })
    }

    /// Returns true for rests that fill a whole measure.
    pub fn is_full_measure_rest(self) -> bool {
        matches!(self, Self::Rest { full_measure: true })
    }

    /// Returns true for barlines.
    pub fn is_barline(self) -> bool {
        matches!(self, Self::Barline(_))
    }

    /// Returns true for objects without duration that are drawn in-line.
    pub fn is_non_timed(self) -> bool {
        matches!(
            self,
            Self::Clef | Self::KeySignature | Self::TimeSignature | Self::Spacer
        )
    }

    /// Rank among entries sharing one time position.
    fn rank_at_time(self) -> u8 {
        match self {
            Self::Barline(_) | Self::SystemBreak => 0,
            Self::Clef | Self::KeySignature | Self::TimeSignature | Self::Spacer => 1,
            Self::GraceNote => 2,
            Self::Note | Self::Rest { .. } => 3,
        }
    }

    /// Short lowercase name, used in logs and dumps.
    pub fn name(self) -> &'static str {
        match self {
            Self::Clef => "clef",
            Self::KeySignature => "key",
            Self::TimeSignature => "time",
            Self::Spacer => "spacer",
            Self::Note => "note",
            Self::Rest { full_measure: false } => "rest",
            Self::Rest { full_measure: true } => "fm-rest",
            Self::GraceNote => "grace",
            Self::Barline(_) => "barline",
            Self::SystemBreak => "break",
        }
    }
}

/// One staff object at one time position.
///
/// # Examples
///
/// ```
/// # use stave_core::symbol::{SymbolEntry, SymbolKind};
/// let note = SymbolEntry::new(64.0, SymbolKind::Note)
///     .with_duration(32.0)
///     .with_staff(1)
///     .with_voice(2);
/// assert_eq!(note.staff(), 1);
/// assert_eq!(note.duration(), 32.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    time: TimeUnits,
    duration: TimeUnits,
    instrument: usize,
    staff: usize,
    voice: usize,
    kind: SymbolKind,
    shape: Option<MeasuredShape>,
}

impl SymbolEntry {
    /// Creates an entry for instrument 0, staff 0, voice 0 with no duration.
    pub fn new(time: TimeUnits, kind: SymbolKind) -> Self {
        Self {
            time,
            duration: 0.0,
            instrument: 0,
            staff: 0,
            voice: 0,
            kind,
            shape: None,
        }
    }

    pub fn with_duration(mut self, duration: TimeUnits) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_instrument(mut self, instrument: usize) -> Self {
        self.instrument = instrument;
        self
    }

    /// Sets the staff index within the owning instrument.
    pub fn with_staff(mut self, staff: usize) -> Self {
        self.staff = staff;
        self
    }

    pub fn with_voice(mut self, voice: usize) -> Self {
        self.voice = voice;
        self
    }

    /// Attaches an already measured shape; the meter is not consulted for it.
    pub fn with_shape(mut self, shape: MeasuredShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn time(&self) -> TimeUnits {
        self.time
    }

    pub fn duration(&self) -> TimeUnits {
        self.duration
    }

    pub fn instrument(&self) -> usize {
        self.instrument
    }

    pub fn staff(&self) -> usize {
        self.staff
    }

    pub fn voice(&self) -> usize {
        self.voice
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn shape(&self) -> Option<&MeasuredShape> {
        self.shape.as_ref()
    }
}

/// Errors raised while building a [`SymbolTable`].
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("entry {entry} at time {time} precedes the previous entry at time {previous}")]
    DecreasingTime {
        entry: usize,
        time: TimeUnits,
        previous: TimeUnits,
    },

    #[error("entry {entry} has a non-finite time or duration")]
    NonFiniteTime { entry: usize },

    #[error("entry {entry} references unknown instrument {instrument}")]
    UnknownInstrument { entry: usize, instrument: usize },

    #[error("entry {entry} references staff {staff} but instrument {instrument} has {staves} staves")]
    UnknownStaff {
        entry: usize,
        instrument: usize,
        staff: usize,
        staves: usize,
    },
}

/// Time-ordered sequence of staff objects for a whole score.
///
/// # Examples
///
/// ```
/// # use stave_core::symbol::{SymbolEntry, SymbolKind, SymbolTable, BarlineKind};
/// let mut table = SymbolTable::new(vec![1]);
/// table.push(SymbolEntry::new(0.0, SymbolKind::Note).with_duration(64.0)).unwrap();
/// table.push(SymbolEntry::new(64.0, SymbolKind::Barline(BarlineKind::Simple))).unwrap();
///
/// assert!(table.push(SymbolEntry::new(0.0, SymbolKind::Note)).is_err());
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    staves_per_instrument: Vec<usize>,
    first_staff: Vec<usize>,
}

impl SymbolTable {
    /// Creates an empty table for instruments with the given staff counts.
    ///
    /// # Arguments
    ///
    /// * `staves_per_instrument` - Number of staves of each instrument, top to bottom.
    pub fn new(staves_per_instrument: Vec<usize>) -> Self {
        let first_staff = staves_per_instrument
            .iter()
            .scan(0, |acc, staves| {
                let first = *acc;
                *acc += staves;
                Some(first)
            })
            .collect();

        Self {
            entries: Vec::new(),
            staves_per_instrument,
            first_staff,
        }
    }

    /// Builds a table from entries, validating each one in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`TableError`] found.
    pub fn from_entries(
        staves_per_instrument: Vec<usize>,
        entries: impl IntoIterator<Item = SymbolEntry>,
    ) -> Result<Self, TableError> {
        let mut table = Self::new(staves_per_instrument);
        for entry in entries {
            table.push(entry)?;
        }
        Ok(table)
    }

    /// Appends an entry.
    ///
    /// An entry that ranks before entries already pushed at the same time
    /// (a barline after a note, a clef of a second instrument after the notes
    /// of the first) is inserted in front of them, and their ids shift by one.
    /// The returned id is valid until the next push.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] when the entry goes back in time, carries a
    /// non-finite time, or references an unknown instrument or staff.
    pub fn push(&mut self, entry: SymbolEntry) -> Result<EntryId, TableError> {
        let index = self.entries.len();

        if !entry.time.is_finite() || !entry.duration.is_finite() {
            return Err(TableError::NonFiniteTime { entry: index });
        }

        if let Some(previous) = self.entries.last()
            && is_lower_time(entry.time, previous.time)
        {
            return Err(TableError::DecreasingTime {
                entry: index,
                time: entry.time,
                previous: previous.time,
            });
        }

        let Some(&staves) = self.staves_per_instrument.get(entry.instrument) else {
            return Err(TableError::UnknownInstrument {
                entry: index,
                instrument: entry.instrument,
            });
        };

        if entry.staff >= staves {
            return Err(TableError::UnknownStaff {
                entry: index,
                instrument: entry.instrument,
                staff: entry.staff,
                staves,
            });
        }

        let rank = entry.kind.rank_at_time();
        let position = self.entries.len()
            - self
                .entries
                .iter()
                .rev()
                .take_while(|other| {
                    is_equal_time(other.time, entry.time) && other.kind.rank_at_time() > rank
                })
                .count();
        self.entries.insert(position, entry);
        Ok(EntryId::new(position))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this table.
    pub fn entry(&self, id: EntryId) -> &SymbolEntry {
        &self.entries[id.index()]
    }

    /// Iterates over all entries with their ids, in time order.
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &SymbolEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (EntryId::new(index), entry))
    }

    pub fn num_instruments(&self) -> usize {
        self.staves_per_instrument.len()
    }

    /// Total number of staves in a system.
    pub fn num_staves(&self) -> usize {
        self.staves_per_instrument.iter().sum()
    }

    /// Number of staves of one instrument.
    pub fn staves_of(&self, instrument: usize) -> usize {
        self.staves_per_instrument
            .get(instrument)
            .copied()
            .unwrap_or_default()
    }

    /// Converts an (instrument, staff) pair into a staff index within the system.
    pub fn staff_in_system(&self, instrument: usize, staff: usize) -> usize {
        self.first_staff.get(instrument).copied().unwrap_or_default() + staff
    }
}
