use std::collections::BTreeMap;

/// Non-fatal problems met during a render. Nothing here stops the walk; the
/// affected content is simply missing from the image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    dropped: Vec<DroppedDraw>,
    unknown_tags: BTreeMap<String, usize>,
    missing_glyphs: BTreeMap<u32, MissingGlyph>,
    chunk_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedDraw {
    pub y: i32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingGlyph {
    pub codepoint: u32,
    pub ch: char,
    pub count: usize,
}

impl RenderReport {
    pub fn record_dropped(&mut self, y: i32, height: u32) {
        self.dropped.push(DroppedDraw { y, height });
    }

    pub fn record_unknown_tag(&mut self, name: &str) {
        let entry = self.unknown_tags.entry(name.to_string()).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    pub fn record_missing_glyph(&mut self, ch: char) {
        let codepoint = ch as u32;
        let entry = self.missing_glyphs.entry(codepoint).or_insert(MissingGlyph {
            codepoint,
            ch,
            count: 0,
        });
        entry.count = entry.count.saturating_add(1);
    }

    pub(crate) fn set_chunk_count(&mut self, count: usize) {
        self.chunk_count = count;
    }

    pub fn dropped(&self) -> &[DroppedDraw] {
        &self.dropped
    }

    pub fn unknown_tags(&self) -> Vec<(String, usize)> {
        self.unknown_tags
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect()
    }

    pub fn missing_glyphs(&self) -> Vec<MissingGlyph> {
        self.missing_glyphs.values().cloned().collect()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty() && self.unknown_tags.is_empty() && self.missing_glyphs.is_empty()
    }
}
