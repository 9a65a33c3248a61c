use crate::types::BoundingBox;

/// Clickable region for one anchor: its target and every box its own text
/// occupied, in logical coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRegion {
    pub href: String,
    pub boxes: Vec<BoundingBox>,
}

impl LinkRegion {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.boxes
            .iter()
            .any(|b| x >= b.x && x < b.right() && y >= b.y && y < b.bottom())
    }
}

#[derive(Debug, Default)]
pub struct LinkCollector {
    regions: Vec<LinkRegion>,
}

impl LinkCollector {
    pub fn record(&mut self, href: &str, boxes: Vec<BoundingBox>) {
        self.regions.push(LinkRegion {
            href: href.to_string(),
            boxes,
        });
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn into_regions(self) -> Vec<LinkRegion> {
        self.regions
    }
}
