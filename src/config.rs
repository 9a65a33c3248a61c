use crate::error::{Md2PngError, Result};
use crate::types::{Color, FontRole};
use serde::Deserialize;
use std::path::PathBuf;

const FREEFONT_DIR: &str = "/usr/share/fonts/truetype/freefont";

const HEADING_SCALES: [f32; 6] = [3.0, 2.5, 2.0, 1.75, 1.5, 1.25];

/// Rendering options. Every key is optional when deserialized; missing keys
/// take the defaults below and unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub default_font_path: PathBuf,
    pub bold_font_path: PathBuf,
    pub italics_font_path: PathBuf,
    pub code_font_path: PathBuf,
    pub font_size: f32,
    pub code_font_size: f32,
    pub heading_font_sizes: Option<[f32; 6]>,
    pub color: Color,
    pub link_color: Color,
    pub hr_color: Color,
    pub blockquote_indent: i32,
    pub code_indent: i32,
    pub list_indent: i32,
    pub bullet_outdent: i32,
    pub bullet_diameter: u32,
    pub list_item_margin_bottom: i32,
    pub margin_bottom: i32,
    pub hr_padding: i32,
    pub chunk_height: u32,
    pub shape_text: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_font_path: freefont("FreeSans.ttf"),
            bold_font_path: freefont("FreeSansBold.ttf"),
            italics_font_path: freefont("FreeSansOblique.ttf"),
            code_font_path: freefont("FreeMono.ttf"),
            font_size: 12.0,
            code_font_size: 14.0,
            heading_font_sizes: None,
            color: Color::WHITE,
            link_color: Color::rgba(100, 100, 255, 255),
            hr_color: Color::rgba(220, 220, 220, 255),
            blockquote_indent: 16,
            code_indent: 16,
            list_indent: 28,
            bullet_outdent: 8,
            bullet_diameter: 4,
            list_item_margin_bottom: 4,
            margin_bottom: 16,
            hr_padding: 0,
            chunk_height: 1000,
            shape_text: true,
        }
    }
}

fn freefont(name: &str) -> PathBuf {
    PathBuf::from(FREEFONT_DIR).join(name)
}

impl RenderConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RenderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let config: RenderConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(Md2PngError::InvalidConfiguration(format!(
                "font_size must be positive, got {}",
                self.font_size
            )));
        }
        if !(self.code_font_size.is_finite() && self.code_font_size > 0.0) {
            return Err(Md2PngError::InvalidConfiguration(format!(
                "code_font_size must be positive, got {}",
                self.code_font_size
            )));
        }
        if let Some(sizes) = self.heading_font_sizes {
            if let Some(bad) = sizes.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
                return Err(Md2PngError::InvalidConfiguration(format!(
                    "heading_font_sizes must be positive, got {bad}"
                )));
            }
        }
        if self.chunk_height == 0 {
            return Err(Md2PngError::InvalidConfiguration(
                "chunk_height must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn heading_font_size(&self, level: u8) -> f32 {
        let idx = (level.clamp(1, 6) - 1) as usize;
        if let Some(sizes) = self.heading_font_sizes {
            return sizes[idx];
        }
        (self.font_size * HEADING_SCALES[idx]).trunc().max(1.0)
    }

    pub fn font_size_for(&self, role: FontRole) -> f32 {
        match role {
            FontRole::Body | FontRole::Bold | FontRole::Italic => self.font_size,
            FontRole::Code => self.code_font_size,
            FontRole::Heading(level) => self.heading_font_size(level),
        }
    }

    pub fn font_path_for(&self, role: FontRole) -> &PathBuf {
        match role {
            FontRole::Body | FontRole::Heading(_) => &self.default_font_path,
            FontRole::Bold => &self.bold_font_path,
            FontRole::Italic => &self.italics_font_path,
            FontRole::Code => &self.code_font_path,
        }
    }
}
