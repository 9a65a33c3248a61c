use crate::config::RenderConfig;
use crate::raster::{TextStyle, Typesetter, fill_paint};
use crate::report::RenderReport;
use crate::types::{FontRole, TextExtent};
use image::RgbaImage;
use tiny_skia::{Pixmap, Rect, Transform};

/// Fontless typesetter: every char is a solid block half the font size wide
/// and the font size tall. Non-ASCII chars count as missing glyphs.
pub(crate) struct BlockTypesetter {
    config: RenderConfig,
}

impl BlockTypesetter {
    pub(crate) fn new(config: &RenderConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn advance(&self, font: FontRole) -> u32 {
        ((self.config.font_size_for(font) / 2.0).ceil() as u32).max(1)
    }

    fn height(&self, font: FontRole) -> u32 {
        self.config.font_size_for(font).ceil() as u32
    }
}

impl Typesetter for BlockTypesetter {
    fn measure(&self, text: &str, font: FontRole) -> TextExtent {
        TextExtent::new(
            text.chars().count() as u32 * self.advance(font),
            self.height(font),
        )
    }

    fn draw_text(
        &self,
        surface: &mut Pixmap,
        x: i32,
        y: i32,
        text: &str,
        style: TextStyle,
        report: &mut RenderReport,
    ) {
        let advance = self.advance(style.font);
        let height = self.height(style.font);
        let paint = fill_paint(style.color);
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            if !ch.is_ascii() {
                report.record_missing_glyph(ch);
                continue;
            }
            let left = x as f32 + (i as u32 * advance) as f32;
            let width = advance.saturating_sub(1).max(1) as f32;
            if let Some(rect) = Rect::from_xywh(left, y as f32, width, height as f32) {
                surface.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
    }
}

/// Vertical runs `(first_row, end_row)` of rows holding any visible pixel in
/// columns `x0..x1`.
pub(crate) fn alpha_runs_in_columns(image: &RgbaImage, x0: u32, x1: u32) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut open: Option<u32> = None;
    for y in 0..image.height() {
        let lit = (x0..x1.min(image.width())).any(|x| image.get_pixel(x, y).0[3] > 0);
        match (lit, open) {
            (true, None) => open = Some(y),
            (false, Some(start)) => {
                runs.push((start, y));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        runs.push((start, image.height()));
    }
    runs
}
