use kuchiki::traits::TendrilSink;
use kuchiki::{NodeData, NodeRef};
use std::collections::BTreeMap;

/// Element kinds the renderer styles. Anything else is `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    Heading(u8),
    Paragraph,
    Blockquote,
    OrderedList,
    UnorderedList,
    ListItem,
    Preformatted,
    Code,
    Emphasis,
    Strong,
    Anchor,
    Rule,
    LineBreak,
    Unknown(String),
}

impl Tag {
    pub fn from_name(name: &str) -> Tag {
        match name.to_ascii_lowercase().as_str() {
            "div" => Tag::Div,
            "h1" => Tag::Heading(1),
            "h2" => Tag::Heading(2),
            "h3" => Tag::Heading(3),
            "h4" => Tag::Heading(4),
            "h5" => Tag::Heading(5),
            "h6" => Tag::Heading(6),
            "p" => Tag::Paragraph,
            "blockquote" => Tag::Blockquote,
            "ol" => Tag::OrderedList,
            "ul" => Tag::UnorderedList,
            "li" => Tag::ListItem,
            "pre" => Tag::Preformatted,
            "code" => Tag::Code,
            "em" => Tag::Emphasis,
            "strong" => Tag::Strong,
            "a" => Tag::Anchor,
            "hr" => Tag::Rule,
            "br" => Tag::LineBreak,
            other => Tag::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Div => "div",
            Tag::Heading(1) => "h1",
            Tag::Heading(2) => "h2",
            Tag::Heading(3) => "h3",
            Tag::Heading(4) => "h4",
            Tag::Heading(5) => "h5",
            Tag::Heading(_) => "h6",
            Tag::Paragraph => "p",
            Tag::Blockquote => "blockquote",
            Tag::OrderedList => "ol",
            Tag::UnorderedList => "ul",
            Tag::ListItem => "li",
            Tag::Preformatted => "pre",
            Tag::Code => "code",
            Tag::Emphasis => "em",
            Tag::Strong => "strong",
            Tag::Anchor => "a",
            Tag::Rule => "hr",
            Tag::LineBreak => "br",
            Tag::Unknown(name) => name,
        }
    }
}

/// Element-tree node: `text` precedes the first child, `tail` follows the
/// node's own closing tag inside its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    tag: Tag,
    text: Option<String>,
    tail: Option<String>,
    attributes: BTreeMap<String, String>,
    children: Vec<DocumentNode>,
}

impl DocumentNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            text: None,
            tail: None,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: DocumentNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = DocumentNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn children(&self) -> &[DocumentNode] {
        &self.children
    }

    /// Parses HTML into a tree rooted at a `div` holding the body's content.
    /// Comments and doctypes are dropped.
    pub fn parse_html(html: &str) -> DocumentNode {
        let document = kuchiki::parse_html().one(html);
        let mut root = DocumentNode::new(Tag::Div);
        match document.select_first("body") {
            Ok(body) => collect_children(&mut root, body.as_node()),
            Err(()) => collect_children(&mut root, &document),
        }
        root
    }
}

fn collect_children(target: &mut DocumentNode, node: &NodeRef) {
    for child in node.children() {
        match child.data() {
            NodeData::Text(text) => {
                let text = text.borrow();
                let slot = match target.children.last_mut() {
                    Some(last) => &mut last.tail,
                    None => &mut target.text,
                };
                slot.get_or_insert_with(String::new).push_str(&text);
            }
            NodeData::Element(element) => {
                let mut out = DocumentNode::new(Tag::from_name(&element.name.local));
                for (name, attr) in element.attributes.borrow().map.iter() {
                    out.attributes
                        .insert(name.local.to_string(), attr.value.clone());
                }
                collect_children(&mut out, &child);
                target.children.push(out);
            }
            _ => {}
        }
    }
}
