use crate::chunk::FinishedChunk;
use crate::error::Result;
use crate::links::LinkRegion;
use crate::report::RenderReport;
use image::{ImageFormat, Rgba, RgbaImage};
use sha2::{Digest, Sha256};

/// Output of one render: the stitched image, the link map and the report of
/// anything skipped on the way.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub image: RgbaImage,
    pub links: Vec<LinkRegion>,
    pub report: RenderReport,
}

impl Rendered {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// SHA-256 over the dimensions and raw RGBA pixels, as lowercase hex.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.image.width().to_be_bytes());
        hasher.update(self.image.height().to_be_bytes());
        hasher.update(self.image.as_raw());
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

/// Stacks the used rows of every chunk, in order, into one image.
pub fn assemble(chunks: &[FinishedChunk], width: u32) -> RgbaImage {
    let height: u32 = chunks.iter().map(|chunk| chunk.used_height).sum();
    let mut out = RgbaImage::new(width, height);
    let mut offset = 0i64;
    for chunk in chunks {
        let rows = chunk_rows(chunk);
        image::imageops::replace(&mut out, &rows, 0, offset);
        offset += i64::from(chunk.used_height);
    }
    log::debug!("assembled {} chunks into {width}x{height}", chunks.len());
    out
}

fn chunk_rows(chunk: &FinishedChunk) -> RgbaImage {
    let width = chunk.pixmap.width();
    let mut rows = RgbaImage::new(width, chunk.used_height);
    for (y, row) in chunk
        .pixmap
        .pixels()
        .chunks_exact(width as usize)
        .take(chunk.used_height as usize)
        .enumerate()
    {
        for (x, px) in row.iter().enumerate() {
            let c = px.demultiply();
            rows.put_pixel(
                x as u32,
                y as u32,
                Rgba([c.red(), c.green(), c.blue(), c.alpha()]),
            );
        }
    }
    rows
}
