use crate::config::RenderConfig;
use crate::error::{Md2PngError, Result};
use crate::raster::{TextStyle, Typesetter, fill_glyphs, layout_text_glyphs, unshaped_advance};
use crate::report::RenderReport;
use crate::types::{FontRole, TextExtent};
use rustybuzz::{Face as HbFace, UnicodeBuffer};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tiny_skia::Pixmap;

/// Every face must carry this glyph; its absence means the file is not a
/// usable text font.
const PROBE_CHAR: char = 'E';

const ALL_ROLES: [FontRole; 10] = [
    FontRole::Body,
    FontRole::Bold,
    FontRole::Italic,
    FontRole::Code,
    FontRole::Heading(1),
    FontRole::Heading(2),
    FontRole::Heading(3),
    FontRole::Heading(4),
    FontRole::Heading(5),
    FontRole::Heading(6),
];

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct TextWidthKey {
    role: FontRole,
    text: String,
}

#[derive(Debug)]
struct TextWidthCache {
    map: HashMap<TextWidthKey, u32>,
    order: VecDeque<TextWidthKey>,
    max_entries: usize,
}

impl TextWidthCache {
    fn new(max_entries: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
        }
    }

    fn get(&self, key: &TextWidthKey) -> Option<u32> {
        self.map.get(key).copied()
    }

    fn insert(&mut self, key: TextWidthKey, value: u32) {
        if self.map.contains_key(&key) {
            return;
        }
        self.map.insert(key.clone(), value);
        self.order.push_back(key);
        while self.map.len() > self.max_entries {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            } else {
                break;
            }
        }
    }
}

#[derive(Debug)]
struct LoadedFace {
    path: PathBuf,
    data: Arc<Vec<u8>>,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
}

impl LoadedFace {
    fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|source| Md2PngError::FontLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, data)
    }

    fn from_bytes(path: &Path, data: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|_| Md2PngError::FontParse(path.to_path_buf()))?;
        if face.glyph_index(PROBE_CHAR).is_none() {
            return Err(Md2PngError::MissingGlyph {
                path: path.to_path_buf(),
                ch: PROBE_CHAR,
            });
        }
        let units_per_em = face.units_per_em().max(1) as f32;
        let ascender = face.ascender() as f32;
        let descender = face.descender() as f32;
        drop(face);
        Ok(Self {
            path: path.to_path_buf(),
            data: Arc::new(data),
            units_per_em,
            ascender,
            descender,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct RoleFont {
    face: usize,
    size: f32,
}

/// `Typesetter` backed by TrueType/OpenType files named in the config.
///
/// Each distinct path is read once; the heading roles normally share the
/// body face at larger sizes.
#[derive(Debug)]
pub struct FontBook {
    faces: Vec<LoadedFace>,
    roles: HashMap<FontRole, RoleFont>,
    shape_text: bool,
    width_cache: Mutex<TextWidthCache>,
}

impl FontBook {
    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        let mut faces: Vec<LoadedFace> = Vec::new();
        let mut by_path: HashMap<PathBuf, usize> = HashMap::new();
        let mut roles = HashMap::new();
        for role in ALL_ROLES {
            let path = config.font_path_for(role);
            let face = match by_path.get(path) {
                Some(index) => *index,
                None => {
                    let loaded = LoadedFace::load(path)?;
                    log::debug!("loaded font {} for {:?}", loaded.path.display(), role);
                    faces.push(loaded);
                    by_path.insert(path.clone(), faces.len() - 1);
                    faces.len() - 1
                }
            };
            roles.insert(
                role,
                RoleFont {
                    face,
                    size: config.font_size_for(role),
                },
            );
        }
        Ok(Self {
            faces,
            roles,
            shape_text: config.shape_text,
            width_cache: Mutex::new(TextWidthCache::new(20_000)),
        })
    }

    /// Builds a book where every role uses the same in-memory face.
    pub fn from_bytes(data: Vec<u8>, config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        let face = LoadedFace::from_bytes(Path::new("<memory>"), data)?;
        let roles = ALL_ROLES
            .iter()
            .map(|role| {
                (
                    *role,
                    RoleFont {
                        face: 0,
                        size: config.font_size_for(*role),
                    },
                )
            })
            .collect();
        Ok(Self {
            faces: vec![face],
            roles,
            shape_text: config.shape_text,
            width_cache: Mutex::new(TextWidthCache::new(20_000)),
        })
    }

    fn resolve(&self, role: FontRole) -> Option<(&LoadedFace, f32)> {
        let role_font = self.roles.get(&role).or_else(|| self.roles.get(&FontRole::Body))?;
        let face = self.faces.get(role_font.face)?;
        Some((face, role_font.size))
    }

    fn line_height(face: &LoadedFace, size: f32) -> u32 {
        let height = (face.ascender - face.descender) / face.units_per_em * size;
        height.ceil().max(1.0) as u32
    }

    fn text_width(&self, face: &LoadedFace, size: f32, text: &str) -> f32 {
        if self.shape_text {
            if let Some(width) = shaped_width(&face.data, size, text) {
                return width;
            }
        }
        let Ok(parsed) = ttf_parser::Face::parse(&face.data, 0) else {
            return text.chars().count() as f32 * size * 0.6;
        };
        text.chars()
            .map(|ch| match parsed.glyph_index(ch) {
                Some(gid) => unshaped_advance(&parsed, gid, size),
                None => size * 0.5,
            })
            .sum()
    }
}

fn shaped_width(font_data: &[u8], size: f32, text: &str) -> Option<f32> {
    let face = HbFace::from_slice(font_data, 0)?;
    let units_per_em = face.units_per_em().max(1) as f32;
    let mut buffer = UnicodeBuffer::new();
    buffer.set_direction(rustybuzz::Direction::LeftToRight);
    buffer.push_str(text);
    let output = rustybuzz::shape(&face, &[], buffer);
    let total: i64 = output
        .glyph_positions()
        .iter()
        .map(|pos| pos.x_advance as i64)
        .sum();
    Some((total.max(0) as f32) / units_per_em * size)
}

impl Typesetter for FontBook {
    fn measure(&self, text: &str, font: FontRole) -> TextExtent {
        let Some((face, size)) = self.resolve(font) else {
            return TextExtent::default();
        };
        let height = Self::line_height(face, size);
        if text.is_empty() {
            return TextExtent::new(0, height);
        }
        let key = TextWidthKey {
            role: font,
            text: text.to_string(),
        };
        if let Ok(cache) = self.width_cache.lock() {
            if let Some(width) = cache.get(&key) {
                return TextExtent::new(width, height);
            }
        }
        let width = self.text_width(face, size, text).ceil().max(0.0) as u32;
        if let Ok(mut cache) = self.width_cache.lock() {
            cache.insert(key, width);
        }
        TextExtent::new(width, height)
    }

    fn draw_text(
        &self,
        surface: &mut Pixmap,
        x: i32,
        y: i32,
        text: &str,
        style: TextStyle,
        report: &mut RenderReport,
    ) {
        if text.is_empty() {
            return;
        }
        let Some((face, size)) = self.resolve(style.font) else {
            return;
        };
        let baseline = (x as f32, y as f32 + face.ascender / face.units_per_em * size);
        let placements =
            layout_text_glyphs(&face.data, text, size, baseline, self.shape_text, report);
        let drawn = fill_glyphs(surface, &face.data, &placements, style.color);
        log::trace!("drew {drawn} glyphs of {text:?} at ({x}, {y})");
    }
}
