use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Md2PngError>;

#[derive(Debug, Error)]
pub enum Md2PngError {
    #[error("invalid width spec: {0}")]
    InvalidWidthSpec(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to load font {path}: {source}")]
    FontLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("font {0} could not be parsed")]
    FontParse(PathBuf),
    #[error("font {path} has no glyph for {ch:?}")]
    MissingGlyph { path: PathBuf, ch: char },
    #[error("image encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("config parse failed: {0}")]
    Config(#[from] serde_json::Error),
}
