use crate::error::{Md2PngError, Result};

/// One column breakpoint: from `y_offset` downward, text lives in
/// `[x_offset, x_offset + width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnBreak {
    pub y_offset: u32,
    pub x_offset: i32,
    pub width: u32,
}

impl ColumnBreak {
    pub fn new(y_offset: u32, x_offset: i32, width: u32) -> Self {
        Self {
            y_offset,
            x_offset,
            width,
        }
    }

    fn column(&self) -> Column {
        Column {
            start_x: self.x_offset,
            // bounded to i32 by WidthSpec::new
            end_x: (i64::from(self.x_offset) + i64::from(self.width)) as i32,
        }
    }
}

impl From<(u32, i32, u32)> for ColumnBreak {
    fn from((y_offset, x_offset, width): (u32, i32, u32)) -> Self {
        ColumnBreak::new(y_offset, x_offset, width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub start_x: i32,
    pub end_x: i32,
}

#[derive(Debug, Clone)]
pub struct WidthSpec {
    breaks: Vec<ColumnBreak>,
    index: usize,
    image_width: u32,
}

impl WidthSpec {
    pub fn new<I, B>(breaks: I) -> Result<Self>
    where
        I: IntoIterator<Item = B>,
        B: Into<ColumnBreak>,
    {
        let mut breaks: Vec<ColumnBreak> = breaks.into_iter().map(Into::into).collect();
        if breaks.is_empty() {
            return Err(Md2PngError::InvalidWidthSpec(
                "at least one (y_offset, x_offset, width) entry is required".to_string(),
            ));
        }
        if let Some(bad) = breaks.iter().find(|b| b.width == 0) {
            return Err(Md2PngError::InvalidWidthSpec(format!(
                "column at y={} has zero width",
                bad.y_offset
            )));
        }
        if let Some(bad) = breaks
            .iter()
            .find(|b| i64::from(b.x_offset) + i64::from(b.width) > i64::from(i32::MAX))
        {
            return Err(Md2PngError::InvalidWidthSpec(format!(
                "column at y={} ends past x={}",
                bad.y_offset,
                i32::MAX
            )));
        }
        // stable: equal offsets keep caller order, the last one wins below
        breaks.sort_by_key(|b| b.y_offset);

        let right_edge = breaks
            .iter()
            .map(|b| i64::from(b.x_offset) + i64::from(b.width))
            .max()
            .unwrap_or(0);
        if right_edge <= 0 {
            return Err(Md2PngError::InvalidWidthSpec(format!(
                "image width {right_edge} is out of range"
            )));
        }

        Ok(Self {
            breaks,
            index: 0,
            image_width: right_edge as u32,
        })
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn breaks(&self) -> &[ColumnBreak] {
        &self.breaks
    }

    /// Column for logical `y`. The cursor only moves forward, so `y` must be
    /// non-decreasing between calls.
    pub fn active_column(&mut self, y: i32) -> Column {
        while let Some(next) = self.breaks.get(self.index + 1) {
            if i64::from(next.y_offset) > i64::from(y) {
                break;
            }
            self.index += 1;
        }
        self.breaks[self.index].column()
    }

    pub fn active_index(&self) -> usize {
        self.index
    }
}
