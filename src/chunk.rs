use crate::error::{Md2PngError, Result};
use crate::report::RenderReport;
use tiny_skia::Pixmap;

#[derive(Debug)]
struct ChunkCanvas {
    pixmap: Pixmap,
    chunk_y: i32,
    drawn_bottom: i32,
}

impl ChunkCanvas {
    fn allocate(width: u32, capacity: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, capacity)?,
            chunk_y: 0,
            drawn_bottom: 0,
        })
    }

    fn used_height(&self, capacity: u32) -> u32 {
        let used = self.chunk_y.max(self.drawn_bottom).max(0) as u32;
        used.min(capacity)
    }
}

#[derive(Debug)]
pub struct FinishedChunk {
    pub(crate) pixmap: Pixmap,
    pub(crate) used_height: u32,
}

impl FinishedChunk {
    pub fn used_height(&self) -> u32 {
        self.used_height
    }

    pub fn capacity(&self) -> u32 {
        self.pixmap.height()
    }
}

/// Where a granted draw lands: the chunk surface and the row inside it that
/// corresponds to the logical cursor.
pub struct DrawTarget<'a> {
    pub pixmap: &'a mut Pixmap,
    pub y: i32,
}

/// Fixed-height raster slabs, allocated on demand as the logical cursor moves
/// down the document.
#[derive(Debug)]
pub struct ChunkList {
    width: u32,
    capacity: u32,
    current: ChunkCanvas,
    finished: Vec<FinishedChunk>,
}

impl ChunkList {
    pub fn new(width: u32, capacity: u32) -> Result<Self> {
        let current = ChunkCanvas::allocate(width, capacity).ok_or_else(|| {
            Md2PngError::InvalidConfiguration(format!(
                "cannot allocate a {width}x{capacity} chunk"
            ))
        })?;
        Ok(Self {
            width,
            capacity,
            current,
            finished: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn finished(&self) -> &[FinishedChunk] {
        &self.finished
    }

    /// Mirrors a logical cursor advance inside the current chunk.
    ///
    /// Space that runs past the bottom of the chunk is carried into fresh
    /// chunks, so image rows stay equal to logical rows.
    pub fn advance(&mut self, dy: i32) {
        self.current.chunk_y = self.current.chunk_y.saturating_add(dy.max(0));
        let capacity = i32::try_from(self.capacity).unwrap_or(i32::MAX);
        while self.current.chunk_y > capacity {
            let carried = self.current.chunk_y - capacity;
            let Some(mut fresh) = ChunkCanvas::allocate(self.width, self.capacity) else {
                log::warn!("cannot allocate chunk; {carried} rows of spacing lost");
                self.current.chunk_y = capacity;
                return;
            };
            fresh.chunk_y = carried;
            self.current.chunk_y = capacity;
            self.finish_current(fresh);
        }
    }

    /// Makes room for a draw of `height` rows at the cursor.
    ///
    /// Starts a new chunk when the current one cannot hold the draw. Rows
    /// already drawn on the current line move along with it. A draw that
    /// does not fit an empty chunk is reported and refused; the caller skips
    /// painting but keeps its layout bookkeeping. `logical_y` is only used
    /// for reporting.
    pub fn ensure_space(
        &mut self,
        height: u32,
        logical_y: i32,
        report: &mut RenderReport,
    ) -> Option<DrawTarget<'_>> {
        let bottom = i64::from(self.current.chunk_y) + i64::from(height);
        if bottom > i64::from(self.capacity) {
            if self.current.chunk_y == 0 {
                log::warn!(
                    "draw of {height}px at y={logical_y} exceeds chunk capacity {}; skipped",
                    self.capacity
                );
                report.record_dropped(logical_y, height);
                return None;
            }
            let mut fresh = ChunkCanvas::allocate(self.width, self.capacity)?;
            self.move_open_line(&mut fresh);
            self.finish_current(fresh);
        }
        let chunk = &mut self.current;
        let y = chunk.chunk_y;
        chunk.drawn_bottom = chunk.drawn_bottom.max(y.saturating_add(height as i32));
        Some(DrawTarget {
            pixmap: &mut chunk.pixmap,
            y,
        })
    }

    /// Copies rows from the cursor down to the drawn bottom into the top of
    /// `fresh` and cuts the current chunk at the cursor.
    fn move_open_line(&mut self, fresh: &mut ChunkCanvas) {
        let top = self.current.chunk_y.max(0) as usize;
        let bottom = (self.current.drawn_bottom.max(0) as u32).min(self.capacity) as usize;
        if bottom > top {
            let stride = self.width as usize * 4;
            let rows = &self.current.pixmap.data()[top * stride..bottom * stride];
            fresh.pixmap.data_mut()[..rows.len()].copy_from_slice(rows);
            fresh.drawn_bottom = (bottom - top) as i32;
        }
        self.current.drawn_bottom = self.current.drawn_bottom.min(self.current.chunk_y);
    }

    fn finish_current(&mut self, next: ChunkCanvas) {
        let done = std::mem::replace(&mut self.current, next);
        let used_height = done.used_height(self.capacity);
        log::debug!(
            "finalized chunk {} with {used_height}/{} rows",
            self.finished.len(),
            self.capacity
        );
        self.finished.push(FinishedChunk {
            pixmap: done.pixmap,
            used_height,
        });
    }

    pub fn finish(self) -> Vec<FinishedChunk> {
        let mut finished = self.finished;
        let used_height = self.current.used_height(self.capacity);
        log::debug!(
            "finalized chunk {} with {used_height}/{} rows",
            finished.len(),
            self.capacity
        );
        finished.push(FinishedChunk {
            pixmap: self.current.pixmap,
            used_height,
        });
        finished
    }
}
