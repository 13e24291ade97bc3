//! Result of a complete layout pass.

use std::ops::RangeInclusive;

use stave_core::{shape::PositionedShape, units::LUnits};

use crate::{spacing::SystemPlacement, timegrid::TimeGridTable};

/// One finished system: its columns, the shapes placed in it and its time
/// grid.
#[derive(Debug, Clone)]
pub struct SystemLayout {
    columns: RangeInclusive<usize>,
    placement: SystemPlacement,
    time_grid: TimeGridTable,
    justified: bool,
}

impl SystemLayout {
    pub(crate) fn new(
        columns: RangeInclusive<usize>,
        placement: SystemPlacement,
        time_grid: TimeGridTable,
        justified: bool,
    ) -> Self {
        Self {
            columns,
            placement,
            time_grid,
            justified,
        }
    }

    /// Score columns laid out in this system.
    pub fn columns(&self) -> RangeInclusive<usize> {
        self.columns.clone()
    }

    pub fn placement(&self) -> &SystemPlacement {
        &self.placement
    }

    pub fn shapes(&self) -> &[PositionedShape] {
        self.placement.shapes()
    }

    /// Time grid of all the columns of the system, in time order.
    pub fn time_grid(&self) -> &TimeGridTable {
        &self.time_grid
    }

    /// Whether the system was stretched or compressed to the line width.
    pub fn is_justified(&self) -> bool {
        self.justified
    }

    pub fn x_start(&self) -> LUnits {
        self.placement.x_start()
    }

    pub fn x_end(&self) -> LUnits {
        self.placement.x_end()
    }

    pub fn width(&self) -> LUnits {
        self.placement.width()
    }
}

/// Systems of a laid out score, top to bottom.
#[derive(Debug, Clone, Default)]
pub struct ScoreLayout {
    systems: Vec<SystemLayout>,
    num_staves: usize,
    column_dump: Option<String>,
}

impl ScoreLayout {
    pub(crate) fn new(num_staves: usize) -> Self {
        Self {
            systems: Vec::new(),
            num_staves,
            column_dump: None,
        }
    }

    pub(crate) fn push_system(&mut self, system: SystemLayout) {
        self.systems.push(system);
    }

    pub(crate) fn set_column_dump(&mut self, dump: String) {
        self.column_dump = Some(dump);
    }

    pub fn systems(&self) -> &[SystemLayout] {
        &self.systems
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Staves of every system, counted over all instruments.
    pub fn num_staves(&self) -> usize {
        self.num_staves
    }

    /// Column ranges of every system.
    pub fn breaks(&self) -> Vec<RangeInclusive<usize>> {
        self.systems.iter().map(SystemLayout::columns).collect()
    }

    /// All positioned shapes, system by system.
    pub fn shapes(&self) -> impl Iterator<Item = &PositionedShape> {
        self.systems.iter().flat_map(|system| system.shapes().iter())
    }

    /// Column tables recorded when the layouter was asked to dump them.
    pub fn column_dump(&self) -> Option<&str> {
        self.column_dump.as_deref()
    }
}
