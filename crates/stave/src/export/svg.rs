//! SVG debug drawing of a [`ScoreLayout`].
//!
//! Every system is drawn as its empty staves plus one box per positioned
//! shape, tagged with the symbol kind as its `class`. Systems are stacked
//! top to bottom, `system_gap` apart.

use std::io::Write;

use log::{debug, error, info};
use svg::{
    Document,
    node::element::{Group, Line, Rectangle},
};

use stave_core::{
    shape::PositionedShape,
    symbol::SymbolKind,
    units::{LUnits, Tenths, tenths_to_logical},
};

use super::{Error, Exporter};
use crate::layout::{ScoreLayout, SystemLayout};

const STAFF_LINES: usize = 5;

/// Builder for [`Svg`].
pub struct SvgBuilder<W> {
    writer: W,
    staff_line_spacing: LUnits,
    staff_distance: LUnits,
    system_gap: LUnits,
    margin: LUnits,
}

impl<W: Write> SvgBuilder<W> {
    /// Creates a builder that will write the document into `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            staff_line_spacing: 180.0,
            staff_distance: 1_440.0,
            system_gap: 1_000.0,
            margin: 500.0,
        }
    }

    /// Distance between two staff lines.
    pub fn with_staff_line_spacing(mut self, spacing: LUnits) -> Self {
        self.staff_line_spacing = spacing;
        self
    }

    /// Distance between the tops of two consecutive staves.
    pub fn with_staff_distance(mut self, distance: LUnits) -> Self {
        self.staff_distance = distance;
        self
    }

    /// Vertical space between two systems.
    pub fn with_system_gap(mut self, gap: LUnits) -> Self {
        self.system_gap = gap;
        self
    }

    pub fn with_margin(mut self, margin: LUnits) -> Self {
        self.margin = margin;
        self
    }

    pub fn build(self) -> Svg<W> {
        Svg {
            writer: self.writer,
            staff_line_spacing: self.staff_line_spacing,
            staff_distance: self.staff_distance,
            system_gap: self.system_gap,
            margin: self.margin,
        }
    }
}

/// SVG exporter writing into `W`.
pub struct Svg<W> {
    writer: W,
    staff_line_spacing: LUnits,
    staff_distance: LUnits,
    system_gap: LUnits,
    margin: LUnits,
}

impl<W: Write> Svg<W> {
    /// Renders the whole score to an SVG document.
    pub fn render_score_layout(&self, layout: &ScoreLayout) -> Document {
        let staves_height = self.staves_height(layout.num_staves());

        let mut content = Group::new().set(
            "transform",
            format!("translate({}, {})", self.margin, self.margin),
        );
        let mut y = 0.0;
        let mut max_x: LUnits = 0.0;
        for (i_system, system) in layout.systems().iter().enumerate() {
            let placement = system.placement();
            let y_min = placement.y_min().min(0.0);
            let y_max = placement.y_max().max(staves_height);
            let offset = y - y_min;

            content = content.add(self.render_system(
                i_system,
                system,
                layout.num_staves(),
                offset,
            ));

            max_x = max_x.max(system.x_end());
            y = offset + y_max + self.system_gap;
        }
        let content_height = (y - self.system_gap).max(0.0);

        let width = self.margin.mul_add(2.0, max_x);
        let height = self.margin.mul_add(2.0, content_height);
        debug!(width, height, systems = layout.systems().len(); "SVG dimensions");

        Document::new()
            .set("viewBox", format!("0 0 {width} {height}"))
            .set("width", width)
            .set("height", height)
            .add(
                Rectangle::new()
                    .set("width", "100%")
                    .set("height", "100%")
                    .set("fill", "white"),
            )
            .add(content)
    }

    fn render_system(
        &self,
        i_system: usize,
        system: &SystemLayout,
        num_staves: usize,
        y_offset: LUnits,
    ) -> Group {
        let mut group = Group::new()
            .set("class", "system")
            .set("id", format!("system-{i_system}"))
            .set("transform", format!("translate(0, {y_offset})"));

        for staff in 0..num_staves {
            group = group.add(self.render_staff(staff, system.x_start(), system.x_end()));
        }
        for shape in system.shapes() {
            group = group.add(render_shape(shape));
        }
        group
    }

    fn render_staff(&self, staff: usize, x_start: LUnits, x_end: LUnits) -> Group {
        let top = staff as LUnits * self.staff_distance;
        (0..STAFF_LINES).fold(Group::new().set("class", "staff"), |group, line| {
            let y = (line as LUnits).mul_add(self.staff_line_spacing, top);
            group.add(
                Line::new()
                    .set("x1", x_start)
                    .set("y1", y)
                    .set("x2", x_end)
                    .set("y2", y)
                    .set("stroke", "#b0b0b0")
                    .set("stroke-width", self.tenths(1.0)),
            )
        })
    }

    fn staves_height(&self, num_staves: usize) -> LUnits {
        match num_staves {
            0 => 0.0,
            n => {
                (n - 1) as LUnits * self.staff_distance
                    + (STAFF_LINES - 1) as LUnits * self.staff_line_spacing
            }
        }
    }

    fn tenths(&self, value: Tenths) -> LUnits {
        tenths_to_logical(value, self.staff_line_spacing)
    }

    /// Writes a document to the underlying writer.
    fn write_document(&mut self, doc: &Document) -> Result<(), Error> {
        if let Err(err) = svg::write(&mut self.writer, doc) {
            error!(err:err; "Failed to write SVG content");
            return Err(Error::Io(err));
        }
        if let Err(err) = self.writer.flush() {
            error!(err:err; "Failed to flush SVG content");
            return Err(Error::Io(err));
        }
        Ok(())
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn render_shape(shape: &PositionedShape) -> Rectangle {
    let bounds = shape.bounds();
    let fill = match shape.kind() {
        SymbolKind::Note | SymbolKind::GraceNote => "#1f4e79",
        SymbolKind::Rest { .. } => "#2e7d32",
        SymbolKind::Barline(_) => "#000000",
        SymbolKind::Clef | SymbolKind::KeySignature | SymbolKind::TimeSignature => "#8e24aa",
        SymbolKind::Spacer | SymbolKind::SystemBreak => "none",
    };
    Rectangle::new()
        .set("class", shape.kind().name())
        .set("data-entry", shape.entry().to_string())
        .set("x", bounds.min_x())
        .set("y", bounds.min_y())
        .set("width", bounds.width())
        .set("height", bounds.height())
        .set("fill", fill)
        .set("fill-opacity", 0.35)
        .set("stroke", "#333333")
        .set("stroke-width", 4)
}

impl<W: Write> Exporter for Svg<W> {
    fn export_score_layout(&mut self, layout: &ScoreLayout) -> Result<(), Error> {
        info!(systems = layout.systems().len(); "Exporting SVG");
        let doc = self.render_score_layout(layout);
        debug!("SVG document rendered");
        self.write_document(&doc)
    }
}
