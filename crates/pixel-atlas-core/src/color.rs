use crate::convert;
use crate::error::{PixelAtlasError, Result};
use crate::pixel::PixelFormat;
use serde::Serialize;

/// A single pixel value in any supported format.
///
/// Equality compares the format and the raw bytes, so the same color held in
/// two formats compares unequal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    format: PixelFormat,
    data: Vec<u8>,
}

impl Color {
    /// Zeroed color in `format`.
    pub fn new(format: PixelFormat) -> Self {
        Self {
            format,
            data: vec![0; format.byte_count()],
        }
    }

    pub fn rgba_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            format: PixelFormat::RgbaU8,
            data: vec![r, g, b, a],
        }
    }

    pub fn rgba_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        let data = [r, g, b, a]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        Self {
            format: PixelFormat::RgbaF32,
            data,
        }
    }

    /// Wraps raw native-endian bytes of one pixel.
    pub fn from_bytes(format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        if data.len() != format.byte_count() {
            return Err(PixelAtlasError::ByteCountMismatch {
                expected: format.byte_count(),
                actual: data.len(),
            });
        }
        Ok(Self { format, data })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn zero(&mut self) {
        self.data.fill(0);
    }

    /// Returns this color converted to `format`.
    pub fn convert(&self, format: PixelFormat) -> Result<Color> {
        let mut out = Color::new(format);
        convert::convert(&self.data, self.format, &mut out.data, format, 1)?;
        Ok(out)
    }

    /// Reads channel `index` normalized to `[0, 1]` for integer formats.
    ///
    /// Returns `None` when the format has no such channel.
    pub fn channel_f32(&self, index: usize) -> Option<f32> {
        if index >= self.format.channel_count() {
            return None;
        }
        let mut single = Color::new(PixelFormat::float(self.format.channel_count(), 32));
        convert::convert(&self.data, self.format, &mut single.data, single.format, 1).ok()?;
        let o = index * 4;
        let bytes = [
            single.data[o],
            single.data[o + 1],
            single.data[o + 2],
            single.data[o + 3],
        ];
        Some(f32::from_ne_bytes(bytes))
    }
}
