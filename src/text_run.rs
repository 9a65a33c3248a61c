use crate::raster::{TextStyle, Typesetter};
use crate::types::BoundingBox;
use crate::walker::NodeWalker;

/// Lays out `text` from the cursor and draws it, returning one box per drawn
/// fragment.
///
/// Outside preformatted blocks whitespace runs collapse to one space and the
/// text is greedily wrapped at the active column's right edge. A word that
/// cannot fit even alone is placed on its own line anyway. With `end_block`
/// unset the cursor stays right after the last fragment so following inline
/// text continues the line.
pub(crate) fn render_text<T: Typesetter + ?Sized>(
    walker: &mut NodeWalker<'_, T>,
    text: Option<&str>,
    style: TextStyle,
    end_block: bool,
) -> Vec<BoundingBox> {
    let Some(text) = text else {
        return Vec::new();
    };
    if text.is_empty() {
        return Vec::new();
    }
    if walker.layout.in_preformatted() {
        render_preformatted(walker, text, style)
    } else {
        render_wrapped(walker, text, style, end_block)
    }
}

fn render_preformatted<T: Typesetter + ?Sized>(
    walker: &mut NodeWalker<'_, T>,
    text: &str,
    style: TextStyle,
) -> Vec<BoundingBox> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    // a closing newline ends the last line rather than opening a new one
    if lines.len() > 1 && lines.last() == Some(&"") {
        lines.pop();
    }
    let mut boxes = Vec::with_capacity(lines.len());
    for line in lines {
        let line = line.strip_suffix('\r').unwrap_or(line);
        boxes.push(draw_fragment(walker, line, style));
        walker.newline(0);
    }
    boxes
}

fn render_wrapped<T: Typesetter + ?Sized>(
    walker: &mut NodeWalker<'_, T>,
    text: &str,
    style: TextStyle,
    end_block: bool,
) -> Vec<BoundingBox> {
    let collapsed = collapse_whitespace(text);
    let tokens: Vec<&str> = collapsed.split(' ').collect();
    let mut boxes = Vec::new();
    let mut start = 0usize;

    while start < tokens.len() {
        let end_x = walker.layout.column().end_x;
        let x = walker.layout.x();
        let mut end = start;
        let mut candidate = String::new();
        while end < tokens.len() {
            if end > start {
                candidate.push(' ');
            }
            candidate.push_str(tokens[end]);
            let width = walker.typesetter.measure(&candidate, style.font).width;
            if i64::from(x) + i64::from(width) > i64::from(end_x) {
                break;
            }
            end += 1;
        }
        if end == start {
            end = start + 1;
        }

        let fragment = tokens[start..end].join(" ");
        let bbox = draw_fragment(walker, &fragment, style);
        boxes.push(bbox);

        if end < tokens.len() || end_block {
            walker.newline(0);
        } else {
            walker.layout.advance_x(bbox.width as i32);
        }
        start = end;
    }
    boxes
}

/// Draws one already-fitted fragment at the cursor without moving it.
fn draw_fragment<T: Typesetter + ?Sized>(
    walker: &mut NodeWalker<'_, T>,
    fragment: &str,
    style: TextStyle,
) -> BoundingBox {
    let extent = walker.typesetter.measure(fragment, style.font);
    let x = walker.layout.x();
    let y = walker.layout.y();
    walker.layout.grow_line(extent.height as i32);
    walker.paint_text(x, fragment, extent.height, style);
    log::trace!("fragment {fragment:?} at ({x}, {y}) {}x{}", extent.width, extent.height);
    BoundingBox {
        x,
        y,
        width: extent.width,
        height: extent.height,
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::testing::BlockTypesetter;
    use crate::types::{Color, FontRole};
    use crate::width_spec::WidthSpec;

    const BODY: TextStyle = TextStyle {
        font: FontRole::Body,
        color: Color::WHITE,
    };

    fn walker<'a>(
        typesetter: &'a BlockTypesetter,
        config: &'a RenderConfig,
        width: u32,
    ) -> NodeWalker<'a, BlockTypesetter> {
        NodeWalker::new(WidthSpec::new([(0, 0, width)]).unwrap(), config, typesetter).unwrap()
    }

    #[test]
    fn collapse_merges_mixed_whitespace() {
        assert_eq!(collapse_whitespace("a \t\n b"), "a b");
        assert_eq!(collapse_whitespace("\n\nlead"), " lead");
        assert_eq!(collapse_whitespace("trail  "), "trail ");
    }

    #[test]
    fn absent_and_empty_text_are_no_ops() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, 200);
        assert!(render_text(&mut w, None, BODY, true).is_empty());
        assert!(render_text(&mut w, Some(""), BODY, true).is_empty());
        assert_eq!((w.layout.x(), w.layout.y()), (0, 0));
    }

    #[test]
    fn wraps_at_column_edge() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        // 6px per char: 10 chars per 60px line
        let mut w = walker(&ts, &config, 60);
        let boxes = render_text(&mut w, Some("aaa bbb ccc ddd"), BODY, true);
        let frags: Vec<(i32, i32, u32)> = boxes.iter().map(|b| (b.x, b.y, b.width)).collect();
        assert_eq!(frags, vec![(0, 0, 42), (0, 12, 42)]);
        assert_eq!((w.layout.x(), w.layout.y()), (0, 24));
    }

    #[test]
    fn fragments_fit_unless_forced() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, 50);
        let text = "a bb ccc dddd eeeeeeeeeeeeeee ff g hhhhhhh i";
        let boxes = render_text(&mut w, Some(text), BODY, true);
        for bbox in &boxes {
            let fits = bbox.right() <= 50;
            let single_word = bbox.width == 15 * 6;
            assert!(fits || single_word, "unexpected overflow: {bbox:?}");
        }
        let forced = boxes.iter().find(|b| b.width == 90).unwrap();
        assert_eq!(forced.x, 0);
    }

    #[test]
    fn inline_text_leaves_cursor_after_fragment() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, 200);
        let first = render_text(&mut w, Some("word"), BODY, false);
        assert_eq!(first[0].width, 24);
        assert_eq!(w.layout.x(), 24);
        let bold = TextStyle::new(FontRole::Bold, Color::WHITE);
        let second = render_text(&mut w, Some(" continues"), bold, false);
        assert_eq!(second[0].x, 24);
        assert_eq!(w.layout.y(), 0);
    }

    #[test]
    fn wrapping_is_idempotent() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let text = "The quick brown fox jumps over the lazy dog and keeps running far away";
        let mut a = walker(&ts, &config, 90);
        let mut b = walker(&ts, &config, 90);
        assert_eq!(
            render_text(&mut a, Some(text), BODY, true),
            render_text(&mut b, Some(text), BODY, true)
        );
    }

    #[test]
    fn preformatted_keeps_lines_and_spacing() {
        let config = RenderConfig::default();
        let ts = BlockTypesetter::new(&config);
        let mut w = walker(&ts, &config, 40);
        w.layout.set_preformatted(true);
        let code = TextStyle::new(FontRole::Code, Color::WHITE);
        let boxes = render_text(&mut w, Some("fn  main() {}\n\n  x\n"), code, false);
        let widths: Vec<u32> = boxes.iter().map(|b| b.width).collect();
        // code font is 14px, 7px per char; no wrapping even past the edge
        assert_eq!(widths, vec![13 * 7, 0, 3 * 7]);
        let ys: Vec<i32> = boxes.iter().map(|b| b.y).collect();
        assert_eq!(ys, vec![0, 14, 28]);
        assert_eq!(w.layout.y(), 42);
    }
}
