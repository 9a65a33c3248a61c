use crate::assemble::{Rendered, assemble};
use crate::chunk::ChunkList;
use crate::config::RenderConfig;
use crate::document::{DocumentNode, Tag};
use crate::error::Result;
use crate::layout::{LayoutState, ListFrame};
use crate::links::LinkCollector;
use crate::raster::{TextStyle, Typesetter, draw_hline, fill_circle};
use crate::report::RenderReport;
use crate::text_run::render_text;
use crate::types::{Color, FontRole};
use crate::width_spec::WidthSpec;

/// Single-pass renderer over a document tree.
///
/// Owns every piece of mutable state for one render; handlers receive it as
/// an explicit `&mut` and nothing else is shared.
pub struct NodeWalker<'a, T: Typesetter + ?Sized> {
    pub(crate) typesetter: &'a T,
    pub(crate) config: &'a RenderConfig,
    pub(crate) layout: LayoutState,
    pub(crate) chunks: ChunkList,
    pub(crate) links: LinkCollector,
    pub(crate) report: RenderReport,
}

impl<'a, T: Typesetter + ?Sized> NodeWalker<'a, T> {
    pub fn new(width_spec: WidthSpec, config: &'a RenderConfig, typesetter: &'a T) -> Result<Self> {
        config.validate()?;
        let chunks = ChunkList::new(width_spec.image_width(), config.chunk_height)?;
        Ok(Self {
            typesetter,
            config,
            layout: LayoutState::new(width_spec),
            chunks,
            links: LinkCollector::default(),
            report: RenderReport::default(),
        })
    }

    pub fn run(mut self, root: &DocumentNode) -> Rendered {
        handle_node(&mut self, root);
        let width = self.chunks.width();
        let chunks = self.chunks.finish();
        self.report.set_chunk_count(chunks.len());
        Rendered {
            image: assemble(&chunks, width),
            links: self.links.into_regions(),
            report: self.report,
        }
    }

    pub(crate) fn newline(&mut self, margin: i32) {
        let dy = self.layout.newline(margin);
        self.chunks.advance(dy);
    }

    /// Paints text at logical x on the current line, if its chunk has room.
    pub(crate) fn paint_text(&mut self, x: i32, text: &str, height: u32, style: TextStyle) {
        let y = self.layout.y();
        if let Some(target) = self.chunks.ensure_space(height, y, &mut self.report) {
            self.typesetter
                .draw_text(target.pixmap, x, target.y, text, style, &mut self.report);
        }
    }

    fn body(&self) -> TextStyle {
        TextStyle::new(FontRole::Body, self.config.color)
    }

    fn styled(&self, font: FontRole) -> TextStyle {
        TextStyle::new(font, self.config.color)
    }
}

pub(crate) fn handle_node<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>, node: &DocumentNode) {
    match node.tag() {
        Tag::Div => handle_div(w, node),
        Tag::Heading(level) => handle_heading(w, node, *level),
        Tag::Paragraph => handle_paragraph(w, node),
        Tag::Blockquote => handle_blockquote(w, node),
        Tag::OrderedList => handle_list(w, node, ListFrame::Ordered { next_ordinal: 1 }),
        Tag::UnorderedList => handle_list(w, node, ListFrame::Unordered),
        Tag::ListItem => handle_list_item(w, node),
        Tag::Preformatted => handle_preformatted(w, node),
        Tag::Emphasis => handle_inline(w, node, FontRole::Italic),
        Tag::Strong => handle_inline(w, node, FontRole::Bold),
        Tag::Code => handle_inline(w, node, FontRole::Code),
        Tag::Anchor => handle_anchor(w, node),
        Tag::Rule => handle_rule(w),
        Tag::LineBreak => handle_line_break(w, node),
        Tag::Unknown(name) => handle_unknown(w, node, name),
    }
}

fn handle_children<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>, node: &DocumentNode) {
    for child in node.children() {
        handle_node(w, child);
    }
}

fn handle_div<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>, node: &DocumentNode) {
    if !w.layout.at_line_start() {
        w.newline(0);
    }
    handle_children(w, node);
    if !w.layout.at_line_start() {
        w.newline(0);
    }
}

fn handle_heading<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>, node: &DocumentNode, level: u8) {
    let style = w.styled(FontRole::heading(level));
    render_text(w, node.text(), style, true);
    w.newline(0);
}

fn handle_paragraph<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>, node: &DocumentNode) {
    let body = w.body();
    render_text(w, node.text(), body, false);
    handle_children(w, node);
    render_text(w, node.tail(), body, true);
    w.newline(w.config.margin_bottom);
}

fn handle_blockquote<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>, node: &DocumentNode) {
    w.layout.push_indent(w.config.blockquote_indent);
    w.newline(0);
    handle_children(w, node);
    w.layout.pop_indent();
    w.newline(0);
}

fn handle_list<T: Typesetter + ?Sized>(
    w: &mut NodeWalker<'_, T>,
    node: &DocumentNode,
    frame: ListFrame,
) {
    w.layout.push_indent(w.config.list_indent);
    w.newline(0);
    w.layout.push_list(frame);
    handle_children(w, node);
    w.layout.pop_list();
    w.layout.pop_indent();
    w.newline(0);
}

/// Item marker, then the item text inline so nested inline children continue
/// the line. Tail text directly on an item is not rendered.
fn handle_list_item<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>, node: &DocumentNode) {
    match w.layout.current_list() {
        Some(ListFrame::Unordered) => draw_bullet(w),
        Some(ListFrame::Ordered { .. }) => draw_ordinal(w),
        None => log::debug!("list item outside of a list; no marker drawn"),
    }
    let body = w.body();
    render_text(w, node.text(), body, false);
    handle_children(w, node);
    w.newline(w.config.list_item_margin_bottom);
}

fn draw_bullet<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>) {
    let line = w.typesetter.measure("E", FontRole::Body);
    let diameter = w.config.bullet_diameter as i32;
    let x = w.layout.x() - diameter - w.config.bullet_outdent;
    let color = w.config.color;
    let y = w.layout.y();
    if let Some(target) = w.chunks.ensure_space(line.height, y, &mut w.report) {
        let top = target.y as f32 + (line.height as f32 - diameter as f32) / 2.0;
        fill_circle(target.pixmap, x as f32, top, diameter as f32, color);
    }
}

fn draw_ordinal<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>) {
    let Some(ordinal) = w.layout.take_ordinal() else {
        return;
    };
    let number = ordinal.to_string();
    let extent = w.typesetter.measure(&number, FontRole::Body);
    let x = w.layout.x() - extent.width as i32 - w.config.bullet_outdent;
    let body = w.body();
    w.paint_text(x, &format!("{number}."), extent.height, body);
}

fn handle_preformatted<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>, node: &DocumentNode) {
    w.layout.push_indent(w.config.code_indent);
    let outer = w.layout.set_preformatted(true);
    w.newline(0);
    handle_children(w, node);
    w.layout.pop_indent();
    w.newline(0);
    w.layout.set_preformatted(outer);
}

fn handle_inline<T: Typesetter + ?Sized>(
    w: &mut NodeWalker<'_, T>,
    node: &DocumentNode,
    font: FontRole,
) {
    let style = w.styled(font);
    render_text(w, node.text(), style, false);
    handle_children(w, node);
    let body = w.body();
    render_text(w, node.tail(), body, false);
}

fn handle_anchor<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>, node: &DocumentNode) {
    match node.attribute("href") {
        Some(href) => {
            let style = TextStyle::new(FontRole::Body, w.config.link_color);
            let boxes = render_text(w, node.text(), style, false);
            w.links.record(href, boxes);
        }
        None => {
            let body = w.body();
            render_text(w, node.text(), body, false);
        }
    }
    handle_children(w, node);
    let body = w.body();
    render_text(w, node.tail(), body, false);
}

fn handle_rule<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>) {
    w.newline(0);
    let height = w.config.margin_bottom.max(0);
    let padding = w.config.hr_padding;
    let column = w.layout.column();
    let color: Color = w.config.hr_color;
    let y = w.layout.y();
    if let Some(target) = w.chunks.ensure_space(height as u32, y, &mut w.report) {
        let row = target.y as f32 + height as f32 / 2.0;
        draw_hline(
            target.pixmap,
            (column.start_x + padding) as f32,
            (column.end_x - padding) as f32,
            row,
            color,
        );
    }
    w.newline(height);
}

fn handle_line_break<T: Typesetter + ?Sized>(w: &mut NodeWalker<'_, T>, node: &DocumentNode) {
    w.newline(0);
    let body = w.body();
    render_text(w, node.tail(), body, false);
}

fn handle_unknown<T: Typesetter + ?Sized>(
    w: &mut NodeWalker<'_, T>,
    node: &DocumentNode,
    name: &str,
) {
    log::warn!("unknown tag <{name}>; rendering its children only");
    w.report.record_unknown_tag(name);
    handle_children(w, node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BlockTypesetter, alpha_runs_in_columns};

    fn walker<'a>(
        ts: &'a BlockTypesetter,
        config: &'a RenderConfig,
        breaks: &[(u32, i32, u32)],
    ) -> NodeWalker<'a, BlockTypesetter> {
        NodeWalker::new(WidthSpec::new(breaks.iter().copied()).unwrap(), config, ts).unwrap()
    }

    fn li(text: &str) -> DocumentNode {
        DocumentNode::new(Tag::ListItem).with_text(text)
    }

    #[test]
    fn containers_restore_indent_at_any_depth() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, &[(0, 0, 400)]);
        let mut node = DocumentNode::new(Tag::Paragraph).with_text("deep");
        let kinds = [
            Tag::Blockquote,
            Tag::UnorderedList,
            Tag::Preformatted,
            Tag::OrderedList,
            Tag::Blockquote,
            Tag::Div,
            Tag::UnorderedList,
        ];
        for kind in kinds.iter().cycle().take(21) {
            node = DocumentNode::new(kind.clone()).with_child(node);
        }
        for kind in kinds {
            let before = (w.layout.indent(), w.layout.indent_depth());
            let wrapped = DocumentNode::new(kind).with_child(node.clone());
            handle_node(&mut w, &wrapped);
            assert_eq!((w.layout.indent(), w.layout.indent_depth()), before);
            assert!(w.layout.current_list().is_none());
            assert!(!w.layout.in_preformatted());
        }
    }

    #[test]
    fn ordinals_count_up_and_reset_per_list() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, &[(0, 0, 400)]);
        w.layout.push_list(ListFrame::Ordered { next_ordinal: 1 });
        handle_node(&mut w, &li("a"));
        handle_node(&mut w, &li("b"));
        // nested list starts over, the outer counter is untouched
        let nested = DocumentNode::new(Tag::OrderedList).with_children([li("x"), li("y")]);
        handle_node(&mut w, &DocumentNode::new(Tag::ListItem).with_text("c").with_child(nested));
        assert_eq!(w.layout.current_list(), Some(ListFrame::Ordered { next_ordinal: 4 }));
        w.layout.pop_list();

        let sibling = DocumentNode::new(Tag::OrderedList).with_child(li("again"));
        w.layout.push_list(ListFrame::Unordered);
        handle_node(&mut w, &sibling);
        assert_eq!(w.layout.current_list(), Some(ListFrame::Unordered));
    }

    #[test]
    fn list_item_tail_is_not_rendered() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, &[(0, 0, 400)]);
        let list = DocumentNode::new(Tag::UnorderedList)
            .with_child(li("one").with_tail("IGNORED TAIL TEXT THAT IS LONG"));
        handle_node(&mut w, &list);
        let rendered = w.run(&DocumentNode::new(Tag::Div));
        // only the bullet and "one" (3 chars at x=28) reach the image
        let wide = (0..rendered.height()).any(|y| rendered.image.get_pixel(60, y).0[3] > 0);
        assert!(!wide);
    }

    #[test]
    fn paragraph_ends_with_margin() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, &[(0, 0, 400)]);
        handle_node(&mut w, &DocumentNode::new(Tag::Paragraph).with_text("Hello"));
        assert_eq!((w.layout.x(), w.layout.y()), (0, 12 + 16));
    }

    #[test]
    fn heading_uses_level_font() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, &[(0, 0, 400)]);
        handle_node(&mut w, &DocumentNode::new(Tag::Heading(1)).with_text("Big"));
        let after_h1 = w.layout.y();
        handle_node(&mut w, &DocumentNode::new(Tag::Heading(6)).with_text("Small"));
        assert_eq!(after_h1, 36);
        assert_eq!(w.layout.y() - after_h1, 15);
    }

    #[test]
    fn anchor_without_href_registers_nothing() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, &[(0, 0, 400)]);
        let p = DocumentNode::new(Tag::Paragraph)
            .with_child(DocumentNode::new(Tag::Anchor).with_text("plain"));
        handle_node(&mut w, &p);
        assert!(w.links.is_empty());
    }

    #[test]
    fn anchor_boxes_exclude_nested_children() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, &[(0, 0, 400)]);
        let anchor = DocumentNode::new(Tag::Anchor)
            .with_attribute("href", "http://x")
            .with_text("go ")
            .with_child(DocumentNode::new(Tag::Strong).with_text("now"));
        handle_node(&mut w, &DocumentNode::new(Tag::Paragraph).with_child(anchor));
        let regions = std::mem::take(&mut w.links).into_regions();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].boxes.len(), 1);
        assert_eq!(regions[0].boxes[0].width, 18);
    }

    #[test]
    fn unknown_tags_still_render_children() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let w = walker(&ts, &config, &[(0, 0, 400)]);
        let table = DocumentNode::new(Tag::Unknown("table".to_string()))
            .with_text("ignored")
            .with_child(DocumentNode::new(Tag::Paragraph).with_text("cell"));
        let rendered = w.run(&DocumentNode::new(Tag::Div).with_child(table));
        assert_eq!(rendered.report.unknown_tags(), vec![("table".to_string(), 1)]);
        assert_eq!(rendered.height(), 28);
        assert!(rendered.image.pixels().any(|p| p.0[3] > 0));
    }

    #[test]
    fn div_skips_newline_at_line_start() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, &[(0, 0, 400)]);
        handle_node(&mut w, &DocumentNode::new(Tag::Div));
        assert_eq!(w.layout.y(), 0);
        let inline = DocumentNode::new(Tag::Strong).with_text("x");
        handle_node(&mut w, &inline);
        handle_node(&mut w, &DocumentNode::new(Tag::Div));
        assert_eq!((w.layout.x(), w.layout.y()), (0, 12));
    }

    #[test]
    fn rule_spans_padded_column() {
        let config = RenderConfig {
            hr_padding: 10,
            ..RenderConfig::default()
        };
        let ts = BlockTypesetter::new(&config);
        let w = walker(&ts, &config, &[(0, 20, 100)]);
        let rendered = w.run(&DocumentNode::new(Tag::Div).with_child(DocumentNode::new(Tag::Rule)));
        assert_eq!(rendered.height(), 16);
        let row = 8;
        let lit: Vec<u32> = (0..rendered.width())
            .filter(|x| rendered.image.get_pixel(*x, row).0[3] > 0)
            .collect();
        assert_eq!(lit.first(), Some(&30));
        assert_eq!(lit.last(), Some(&109));
        assert_eq!(rendered.image.get_pixel(50, row).0, [220, 220, 220, 255]);
    }

    #[test]
    fn line_break_starts_new_line_with_tail() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, &[(0, 0, 400)]);
        let p = DocumentNode::new(Tag::Paragraph)
            .with_text("one")
            .with_child(DocumentNode::new(Tag::LineBreak).with_tail("two"));
        handle_node(&mut w, &p);
        assert_eq!(w.layout.y(), 12 + 12 + 16);
    }

    #[test]
    fn ordered_markers_sit_left_of_text() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let w = walker(&ts, &config, &[(0, 0, 400)]);
        let list = DocumentNode::new(Tag::OrderedList).with_children([li("a"), li("b")]);
        let rendered = w.run(&DocumentNode::new(Tag::Div).with_child(list));
        // "1." drawn from x = 28 - 6 - 8 = 14
        let runs = alpha_runs_in_columns(&rendered.image, 14, 19);
        assert_eq!(runs.len(), 2);
        assert!(runs[1].0 >= runs[0].0 + 12 + config.list_item_margin_bottom as u32);
    }

    #[test]
    fn capacity_overflow_is_reported_and_layout_continues() {
        let config = RenderConfig {
            chunk_height: 20,
            ..RenderConfig::default()
        };
        let ts = BlockTypesetter::new(&config);
        let w = walker(&ts, &config, &[(0, 0, 400)]);
        let doc = DocumentNode::new(Tag::Div).with_children([
            DocumentNode::new(Tag::Heading(1)).with_text("Huge"),
            DocumentNode::new(Tag::Paragraph).with_text("small"),
        ]);
        let rendered = w.run(&doc);
        assert_eq!(rendered.report.dropped().len(), 1);
        assert_eq!(rendered.report.dropped()[0].height, 36);
        assert!(rendered.report.chunk_count() >= 2);
        assert!(rendered.image.pixels().any(|p| p.0[3] > 0));
    }
}
