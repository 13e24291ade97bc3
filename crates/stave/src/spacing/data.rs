//! Small records owned by the engine's arenas.

use stave_core::{
    geometry::{Bounds, Point},
    index::{EntryId, ShapeId, SliceId},
    shape::MeasuredShape,
    symbol::SymbolKind,
    units::{LUnits, TimeUnits},
};

/// One measured shape and the staff data needed to move it without going
/// back to the symbol table.
#[derive(Debug, Clone)]
pub(crate) struct ShapeData {
    pub(crate) entry: EntryId,
    pub(crate) kind: SymbolKind,
    pub(crate) time: TimeUnits,
    pub(crate) duration: TimeUnits,
    pub(crate) instrument: usize,
    pub(crate) staff_in_instrument: usize,
    pub(crate) staff_in_system: usize,
    pub(crate) voice: usize,
    /// `None` once the shape has been handed over.
    pub(crate) shape: Option<MeasuredShape>,
    pub(crate) origin: Point,
}

impl ShapeData {
    pub(crate) fn width(&self) -> LUnits {
        self.shape.map_or(0.0, |shape| shape.width())
    }

    pub(crate) fn right_extent(&self) -> LUnits {
        self.shape.map_or(0.0, |shape| shape.right_extent())
    }

    pub(crate) fn left_intrusion(&self) -> LUnits {
        self.shape.map_or(0.0, |shape| shape.left_intrusion())
    }

    pub(crate) fn anchor_offset(&self) -> LUnits {
        self.shape.map_or(0.0, |shape| shape.anchor_offset())
    }

    pub(crate) fn lyric_width(&self) -> LUnits {
        self.shape.map_or(0.0, |shape| shape.lyric_width())
    }

    pub(crate) fn is_full_measure_rest(&self) -> bool {
        self.kind.is_full_measure_rest()
    }

    pub(crate) fn line(&self) -> LineKey {
        LineKey {
            instrument: self.instrument,
            staff: self.staff_in_instrument,
            voice: self.voice,
        }
    }

    /// Places the left edge at `x` and the top at `y_shift + top`.
    pub(crate) fn place(&mut self, x: LUnits, y_shift: LUnits) {
        let top = self.shape.map_or(0.0, |shape| shape.top());
        self.origin = Point::new(x, y_shift + top);
    }

    pub(crate) fn bounds(&self) -> Option<Bounds> {
        self.shape
            .map(|shape| Bounds::new_from_top_left(self.origin, shape.size()))
    }
}

/// A melodic line: one voice on one staff of one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct LineKey {
    pub(crate) instrument: usize,
    pub(crate) staff: usize,
    pub(crate) voice: usize,
}

/// Role of a note or rest within its line, inside one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqRole {
    /// Only member of its line in the column, and the line does not continue.
    Isolated,
    Start,
    Continue,
    End,
    /// Last member in the column while the line continues in the next column.
    EndAndStart,
}

/// Sequence membership of one note or rest.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SeqData {
    pub(crate) line: LineKey,
    pub(crate) shape: ShapeId,
    pub(crate) slice: SliceId,
    pub(crate) role: SeqRole,
}

/// Fixed spaces of a slice: `x_left` before the anchor plus the left and
/// right rods after it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Rods {
    pub(crate) x_left: LUnits,
    pub(crate) x_li: LUnits,
    pub(crate) x_ri: LUnits,
}

impl Rods {
    /// Rod extent: `x_li + x_ri`.
    pub(crate) fn xi(&self) -> LUnits {
        self.x_li + self.x_ri
    }

    /// Smallest extent the slice may take: fixed space plus rods.
    pub(crate) fn minimum(&self) -> LUnits {
        self.x_left + self.xi()
    }

    /// Grows the right rod so that `xi >= value`.
    pub(crate) fn set_minimum_xi(&mut self, value: LUnits) {
        if self.xi() < value {
            self.x_ri = value - self.x_li;
        }
    }

    pub(crate) fn increment_x_ri(&mut self, value: LUnits) {
        self.x_ri += value.max(0.0);
    }

    pub(crate) fn clamp(&mut self) {
        self.x_left = self.x_left.max(0.0);
        self.x_li = self.x_li.max(0.0);
        self.x_ri = self.x_ri.max(0.0);
    }
}

/// A full-measure rest and the non-timed shape drawn before it, if any.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FullMeasureRestData {
    pub(crate) shape: ShapeId,
    pub(crate) preceding: Option<ShapeId>,
}

/// Running vertical extent of placed shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VerticalExtent {
    pub(crate) y_min: LUnits,
    pub(crate) y_max: LUnits,
}

impl Default for VerticalExtent {
    fn default() -> Self {
        Self {
            y_min: LUnits::INFINITY,
            y_max: LUnits::NEG_INFINITY,
        }
    }
}

impl VerticalExtent {
    pub(crate) fn include(&mut self, bounds: Option<Bounds>) {
        if let Some(bounds) = bounds {
            self.y_min = self.y_min.min(bounds.min_y());
            self.y_max = self.y_max.max(bounds.max_y());
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.y_min > self.y_max
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_rods_minimum_xi_only_grows() {
        let mut rods = Rods {
            x_left: 10.0,
            x_li: 100.0,
            x_ri: 20.0,
        };
        rods.set_minimum_xi(90.0);
        assert_approx_eq!(f32, rods.x_ri, 20.0);

        rods.set_minimum_xi(150.0);
        assert_approx_eq!(f32, rods.x_ri, 50.0);
        assert_approx_eq!(f32, rods.xi(), 150.0);
        assert_approx_eq!(f32, rods.minimum(), 160.0);
    }

    #[test]
    fn test_rods_increment_ignores_negative() {
        let mut rods = Rods::default();
        rods.increment_x_ri(-5.0);
        assert_approx_eq!(f32, rods.x_ri, 0.0);
        rods.increment_x_ri(7.0);
        assert_approx_eq!(f32, rods.x_ri, 7.0);
    }

    #[test]
    fn test_rods_clamp() {
        let mut rods = Rods {
            x_left: -1.0,
            x_li: -2.0,
            x_ri: 3.0,
        };
        rods.clamp();
        assert_eq!(
            rods,
            Rods {
                x_left: 0.0,
                x_li: 0.0,
                x_ri: 3.0
            }
        );
    }

    #[test]
    fn test_vertical_extent() {
        let mut extent = VerticalExtent::default();
        assert!(extent.is_empty());
        extent.include(None);
        assert!(extent.is_empty());
        extent.include(Some(Bounds::new_from_top_left(
            Point::new(0.0, -20.0),
            stave_core::geometry::Size::new(5.0, 50.0),
        )));
        assert_approx_eq!(f32, extent.y_min, -20.0);
        assert_approx_eq!(f32, extent.y_max, 30.0);
    }
}
