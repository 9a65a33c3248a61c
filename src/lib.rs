//! Renders a styled document tree, usually parsed from Markdown, into one
//! tall raster image whose usable column can change with vertical position.
//!
//! Drawing happens into fixed-height chunks which are stacked at the end, so
//! memory is bounded by the chunk size rather than the document length. Every
//! anchor's text boxes are collected into a link map alongside the image.

mod assemble;
mod chunk;
mod config;
mod document;
mod error;
mod font;
mod layout;
mod links;
mod markdown;
mod raster;
mod report;
mod text_run;
mod types;
mod walker;
mod width_spec;

#[cfg(test)]
mod testing;

pub use assemble::{Rendered, assemble};
pub use chunk::{ChunkList, DrawTarget, FinishedChunk};
pub use config::RenderConfig;
pub use document::{DocumentNode, Tag};
pub use error::{Md2PngError, Result};
pub use font::FontBook;
pub use layout::{LayoutState, ListFrame};
pub use links::{LinkCollector, LinkRegion};
pub use markdown::{markdown_to_document, markdown_to_html};
pub use raster::{TextStyle, Typesetter, draw_hline, fill_circle};
pub use report::{DroppedDraw, MissingGlyph, RenderReport};
pub use types::{BoundingBox, Color, FontRole, TextExtent};
pub use walker::NodeWalker;
pub use width_spec::{Column, ColumnBreak, WidthSpec};

/// Renders `root` with an explicit typesetter.
pub fn render_document<T: Typesetter + ?Sized>(
    root: &DocumentNode,
    width_spec: WidthSpec,
    config: &RenderConfig,
    typesetter: &T,
) -> Result<Rendered> {
    let walker = NodeWalker::new(width_spec, config, typesetter)?;
    let rendered = walker.run(root);
    log::info!(
        "rendered {}x{} image in {} chunks, {} links",
        rendered.width(),
        rendered.height(),
        rendered.report.chunk_count(),
        rendered.links.len()
    );
    Ok(rendered)
}

/// Markdown to image using the fonts named in `config`.
///
/// `width_spec` lists `(y_offset, x_offset, width)` breakpoints; each applies
/// from its y offset until the next larger one.
pub fn md2png<I, B>(markdown: &str, width_spec: I, config: &RenderConfig) -> Result<Rendered>
where
    I: IntoIterator<Item = B>,
    B: Into<ColumnBreak>,
{
    let width_spec = WidthSpec::new(width_spec)?;
    let fonts = FontBook::from_config(config)?;
    render_document(&markdown_to_document(markdown), width_spec, config, &fonts)
}

/// Same as [`md2png`] for documents that are already HTML.
pub fn html2png<I, B>(html: &str, width_spec: I, config: &RenderConfig) -> Result<Rendered>
where
    I: IntoIterator<Item = B>,
    B: Into<ColumnBreak>,
{
    let width_spec = WidthSpec::new(width_spec)?;
    let fonts = FontBook::from_config(config)?;
    render_document(&DocumentNode::parse_html(html), width_spec, config, &fonts)
}
