//! Measured and positioned shapes.
//!
//! The engine never measures glyphs itself. Every entry of the symbol table
//! either carries a [`MeasuredShape`] or is measured exactly once per layout
//! pass through a [`ShapeMeter`]. After justification the engine hands each
//! shape over as a [`PositionedShape`]; it keeps no reference to it.

use crate::{
    geometry::{Bounds, Point, Size},
    index::EntryId,
    symbol::{SymbolEntry, SymbolKind},
    units::LUnits,
};

/// Horizontal and vertical extent of one symbol, relative to its anchor.
///
/// The anchor is the point aligned across staves at one time position
/// (usually the left edge of the notehead). `anchor_offset` is the x of the
/// shape's left edge relative to the anchor: it is negative when accidentals
/// or other prefixes stick out to the left.
///
/// # Examples
///
/// ```
/// # use stave_core::shape::MeasuredShape;
/// let sharp_note = MeasuredShape::new(350.0, 700.0).with_anchor_offset(-130.0);
/// assert_eq!(sharp_note.right_extent(), 220.0);
/// assert_eq!(sharp_note.left_intrusion(), 130.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeasuredShape {
    width: LUnits,
    height: LUnits,
    top: LUnits,
    anchor_offset: LUnits,
    lyric_width: LUnits,
}

impl MeasuredShape {
    /// Creates a shape whose left edge sits on the anchor.
    pub fn new(width: LUnits, height: LUnits) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            ..Self::default()
        }
    }

    /// Sets the y of the top edge, relative to the top of the system.
    pub fn with_top(mut self, top: LUnits) -> Self {
        self.top = top;
        self
    }

    pub fn with_anchor_offset(mut self, anchor_offset: LUnits) -> Self {
        self.anchor_offset = anchor_offset;
        self
    }

    /// Sets the width of an attached lyric syllable, centred on the anchor.
    pub fn with_lyric_width(mut self, lyric_width: LUnits) -> Self {
        self.lyric_width = lyric_width.max(0.0);
        self
    }

    pub fn width(&self) -> LUnits {
        self.width
    }

    pub fn height(&self) -> LUnits {
        self.height
    }

    pub fn top(&self) -> LUnits {
        self.top
    }

    pub fn anchor_offset(&self) -> LUnits {
        self.anchor_offset
    }

    pub fn lyric_width(&self) -> LUnits {
        self.lyric_width
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Distance from the anchor to the right edge, never negative.
    pub fn right_extent(&self) -> LUnits {
        (self.anchor_offset + self.width).max(0.0)
    }

    /// Distance the shape reaches to the left of its anchor, never negative.
    pub fn left_intrusion(&self) -> LUnits {
        (-self.anchor_offset).max(0.0)
    }
}

/// Shape measurement service.
///
/// Called at most once per symbol-table entry and layout pass, only for
/// entries that do not already carry a [`MeasuredShape`].
pub trait ShapeMeter {
    /// Measures one entry.
    ///
    /// # Arguments
    ///
    /// * `entry` - The symbol to measure.
    /// * `staff_in_system` - Index of the entry's staff counted over all instruments.
    fn measure(&self, entry: &SymbolEntry, staff_in_system: usize) -> MeasuredShape;
}

impl<F> ShapeMeter for F
where
    F: Fn(&SymbolEntry, usize) -> MeasuredShape,
{
    fn measure(&self, entry: &SymbolEntry, staff_in_system: usize) -> MeasuredShape {
        self(entry, staff_in_system)
    }
}

/// A shape with its final absolute position, handed over by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedShape {
    entry: EntryId,
    kind: SymbolKind,
    shape: MeasuredShape,
    origin: Point,
}

impl PositionedShape {
    /// Creates a positioned shape.
    ///
    /// # Arguments
    ///
    /// * `entry` - Symbol-table entry the shape belongs to.
    /// * `kind` - Kind of the symbol, kept for consumers that style by kind.
    /// * `shape` - The measured shape, moved out of the engine.
    /// * `origin` - Absolute position of the shape's top-left corner.
    pub fn new(entry: EntryId, kind: SymbolKind, shape: MeasuredShape, origin: Point) -> Self {
        Self {
            entry,
            kind,
            shape,
            origin,
        }
    }

    pub fn entry(&self) -> EntryId {
        self.entry
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn shape(&self) -> &MeasuredShape {
        &self.shape
    }

    /// Absolute top-left corner.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Absolute x of the alignment anchor.
    pub fn anchor_x(&self) -> LUnits {
        self.origin.x() - self.shape.anchor_offset()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(self.origin, self.shape.size())
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_measured_shape_extents() {
        let plain = MeasuredShape::new(200.0, 180.0);
        assert_approx_eq!(f32, plain.right_extent(), 200.0);
        assert_approx_eq!(f32, plain.left_intrusion(), 0.0);

        let shifted = MeasuredShape::new(100.0, 180.0).with_anchor_offset(40.0);
        assert_approx_eq!(f32, shifted.right_extent(), 140.0);
        assert_approx_eq!(f32, shifted.left_intrusion(), 0.0);
    }

    #[test]
    fn test_measured_shape_clamps_negative_sizes() {
        let shape = MeasuredShape::new(-5.0, -1.0).with_lyric_width(-3.0);
        assert!(shape.size().is_zero());
        assert_approx_eq!(f32, shape.lyric_width(), 0.0);
    }

    #[test]
    fn test_closure_meter() {
        let meter = |entry: &SymbolEntry, staff: usize| {
            MeasuredShape::new(entry.duration() as f32, 10.0).with_top(staff as f32 * 100.0)
        };
        let entry = SymbolEntry::new(0.0, SymbolKind::Note).with_duration(64.0);
        let shape = meter.measure(&entry, 2);
        assert_approx_eq!(f32, shape.width(), 64.0);
        assert_approx_eq!(f32, shape.top(), 200.0);
    }

    #[test]
    fn test_positioned_shape_anchor_and_bounds() {
        let shape = MeasuredShape::new(300.0, 100.0).with_anchor_offset(-100.0);
        let positioned = PositionedShape::new(
            EntryId::new(3),
            SymbolKind::Note,
            shape,
            Point::new(900.0, 50.0),
        );

        assert_approx_eq!(f32, positioned.anchor_x(), 1000.0);
        assert_approx_eq!(f32, positioned.bounds().max_x(), 1200.0);
        assert_approx_eq!(f32, positioned.bounds().max_y(), 150.0);
        assert_eq!(positioned.entry(), EntryId::new(3));
    }
}
