use crate::report::RenderReport;
use crate::types::{Color, FontRole, TextExtent};
use rustybuzz::{Face as HbFace, UnicodeBuffer};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Transform};
use ttf_parser::{GlyphId, OutlineBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub font: FontRole,
    pub color: Color,
}

impl TextStyle {
    pub fn new(font: FontRole, color: Color) -> Self {
        Self { font, color }
    }
}

/// Text measurement and glyph drawing.
///
/// The layout engine only ever asks for the extent of a string and for that
/// string to be painted with its top-left corner at `(x, y)` on a surface.
/// Implementations must be deterministic: the same input always measures and
/// draws the same way.
pub trait Typesetter {
    fn measure(&self, text: &str, font: FontRole) -> TextExtent;

    /// Paints `text` with its top-left corner at `(x, y)`. Characters the font
    /// cannot draw are skipped and recorded in `report`.
    fn draw_text(
        &self,
        surface: &mut Pixmap,
        x: i32,
        y: i32,
        text: &str,
        style: TextStyle,
        report: &mut RenderReport,
    );
}

#[derive(Clone, Copy)]
pub(crate) struct GlyphPlacement {
    pub(crate) glyph_id: u16,
    pub(crate) origin_x: f32,
    pub(crate) origin_y: f32,
    pub(crate) scale: f32,
}

/// Positions glyphs along a baseline. Glyphs the face does not cover are
/// reported and leave an advance-sized gap.
pub(crate) fn layout_text_glyphs(
    font_data: &[u8],
    text: &str,
    font_size: f32,
    baseline: (f32, f32),
    shape_text: bool,
    report: &mut RenderReport,
) -> Vec<GlyphPlacement> {
    if !shape_text {
        return layout_text_glyphs_unshaped(font_data, text, font_size, baseline, report);
    }

    let Some(face) = HbFace::from_slice(font_data, 0) else {
        return layout_text_glyphs_unshaped(font_data, text, font_size, baseline, report);
    };
    let hb_units = face.units_per_em().max(1) as f32;
    let scale = font_size / hb_units;
    let mut buffer = UnicodeBuffer::new();
    buffer.set_direction(rustybuzz::Direction::LeftToRight);
    buffer.push_str(text);
    let output = rustybuzz::shape(&face, &[], buffer);
    let infos = output.glyph_infos();
    let positions = output.glyph_positions();
    if infos.len() != positions.len() {
        return layout_text_glyphs_unshaped(font_data, text, font_size, baseline, report);
    }

    let (baseline_x, baseline_y) = baseline;
    let mut out = Vec::with_capacity(infos.len());
    let mut pen_x = 0.0f32;
    for (info, pos) in infos.iter().zip(positions.iter()) {
        let gid = info.glyph_id as u16;
        let advance = pos.x_advance as f32 * scale;
        if gid == 0 {
            if let Some(ch) = text.get(info.cluster as usize..).and_then(|s| s.chars().next()) {
                note_missing(ch, report);
            }
            pen_x += advance;
            continue;
        }
        out.push(GlyphPlacement {
            glyph_id: gid,
            origin_x: baseline_x + pen_x + pos.x_offset as f32 * scale,
            origin_y: baseline_y - pos.y_offset as f32 * scale,
            scale,
        });
        pen_x += advance;
    }
    out
}

fn layout_text_glyphs_unshaped(
    font_data: &[u8],
    text: &str,
    font_size: f32,
    (baseline_x, baseline_y): (f32, f32),
    report: &mut RenderReport,
) -> Vec<GlyphPlacement> {
    let Ok(face) = ttf_parser::Face::parse(font_data, 0) else {
        return Vec::new();
    };
    let units_per_em = face.units_per_em().max(1) as f32;
    let scale = font_size / units_per_em;

    let mut out = Vec::new();
    let mut pen_x = 0.0f32;
    for ch in text.chars() {
        let Some(gid) = face.glyph_index(ch) else {
            note_missing(ch, report);
            pen_x += font_size * 0.5;
            continue;
        };
        out.push(GlyphPlacement {
            glyph_id: gid.0,
            origin_x: baseline_x + pen_x,
            origin_y: baseline_y,
            scale,
        });
        pen_x += unshaped_advance(&face, gid, font_size);
    }
    out
}

pub(crate) fn unshaped_advance(face: &ttf_parser::Face<'_>, gid: GlyphId, font_size: f32) -> f32 {
    let units_per_em = face.units_per_em().max(1) as f32;
    let advance = face.glyph_hor_advance(gid).unwrap_or(0) as f32 / units_per_em * font_size;
    if advance <= 0.0 {
        font_size * 0.5
    } else {
        advance
    }
}

fn note_missing(ch: char, report: &mut RenderReport) {
    if !ch.is_whitespace() && !ch.is_control() {
        report.record_missing_glyph(ch);
    }
}

pub(crate) fn fill_glyphs(
    pixmap: &mut Pixmap,
    font_data: &[u8],
    placements: &[GlyphPlacement],
    color: Color,
) -> usize {
    let Ok(face) = ttf_parser::Face::parse(font_data, 0) else {
        return 0;
    };
    let paint = fill_paint(color);
    let mut drawn = 0usize;
    for placement in placements {
        let mut builder =
            GlyphPathBuilder::new(placement.origin_x, placement.origin_y, placement.scale);
        if face
            .outline_glyph(GlyphId(placement.glyph_id), &mut builder)
            .is_none()
        {
            continue;
        }
        let Some(path) = builder.finish() else {
            continue;
        };
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        drawn += 1;
    }
    drawn
}

/// One-pixel horizontal rule from `x0` to `x1` at row `y`.
pub fn draw_hline(pixmap: &mut Pixmap, x0: f32, x1: f32, y: f32, color: Color) {
    let (left, right) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
    let Some(rect) = Rect::from_xywh(left, y.floor(), (right - left).max(1.0), 1.0) else {
        return;
    };
    pixmap.fill_rect(rect, &fill_paint(color), Transform::identity(), None);
}

/// Filled circle inscribed in the square at `(x, y)` with side `diameter`.
pub fn fill_circle(pixmap: &mut Pixmap, x: f32, y: f32, diameter: f32, color: Color) {
    if diameter <= 0.0 {
        return;
    }
    let radius = diameter / 2.0;
    let Some(path) = PathBuilder::from_circle(x + radius, y + radius, radius) else {
        return;
    };
    pixmap.fill_path(
        &path,
        &fill_paint(color),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
}

pub(crate) fn fill_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_sk_color());
    paint.anti_alias = true;
    paint
}

/// Converts font units (y up) into pixel space (y down) around a baseline
/// origin.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn px(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.px(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.px(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.px(x1, y1);
        let (x, y) = self.px(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.px(x1, y1);
        let (x2, y2) = self.px(x2, y2);
        let (x, y) = self.px(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
