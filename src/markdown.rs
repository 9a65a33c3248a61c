use crate::document::DocumentNode;
use pulldown_cmark::{Options, Parser, html};

/// CommonMark to HTML. Strikethrough and tables pass through as tags the
/// renderer does not style.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES);
    let mut out = String::with_capacity(markdown.len() + markdown.len() / 2);
    html::push_html(&mut out, parser);
    out
}

pub fn markdown_to_document(markdown: &str) -> DocumentNode {
    DocumentNode::parse_html(&markdown_to_html(markdown))
}
