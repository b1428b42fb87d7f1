use crate::pixel::PixelFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PixelAtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Cannot allocate image data: {width}x{height} {format}, row alignment {alignment}")]
    Allocation {
        width: u16,
        height: u16,
        format: PixelFormat,
        alignment: u8,
    },
    #[error("Image dimensions {width}x{height} exceed the 16-bit size range")]
    TooLarge { width: u32, height: u32 },
    #[error("Image data byte count mismatch: expected {expected}, got {actual}")]
    ByteCountMismatch { expected: usize, actual: usize },
    #[error("No texture atlas page can fit a {width}x{height} tile")]
    AtlasFull { width: u16, height: u16 },
    #[error("Pixel format mismatch: {0}")]
    FormatMismatch(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, PixelAtlasError>;
