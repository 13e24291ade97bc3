//! Typed indices into the engine's arenas.
//!
//! Symbol-table entries, time slices, columns and shape records all live in
//! flat vectors. Each kind of index gets its own newtype so one can never be
//! used where another is expected.

use std::fmt;

macro_rules! arena_index {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $name {
            /// Wraps a raw arena position.
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Returns the raw arena position.
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_index!(
    /// Position of an entry in the [`SymbolTable`](crate::symbol::SymbolTable).
    EntryId
);

arena_index!(
    /// Position of a time slice in the engine's slice arena.
    SliceId
);

arena_index!(
    /// Position of a column in the engine's column arena.
    ColumnId
);

arena_index!(
    /// Position of a shape record in the engine's shape arena.
    ShapeId
);
