use crate::error::{PixelAtlasError, Result};
use crate::memory::Endian;
use crate::pixel::{GlEnum, PixelFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default image name.
pub const NAME_DEFAULT: &str = "Default";

/// Mirroring flags of the stored image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mirror {
    pub x: bool,
    pub y: bool,
}

impl Mirror {
    pub const fn new(x: bool, y: bool) -> Self {
        Self { x, y }
    }
}

/// How pixel bytes are laid out in memory. Metadata only; nothing here
/// transforms the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layout {
    pub mirror: Mirror,
    /// Row byte alignment (a power of two).
    pub alignment: u8,
    /// Byte order of multi-byte samples.
    pub endian: Endian,
}

impl Layout {
    pub const fn new(mirror: Mirror, alignment: u8, endian: Endian) -> Self {
        Self {
            mirror,
            alignment,
            endian,
        }
    }

    pub fn with_alignment(mut self, alignment: u8) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            mirror: Mirror::default(),
            alignment: 1,
            endian: Endian::native(),
        }
    }
}

/// Image dimensions. A zero width or height marks an invalid image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "crate::json::SizeRepr", try_from = "crate::json::SizeRepr")]
pub struct Size {
    pub w: u16,
    pub h: u16,
}

impl Size {
    pub const fn new(w: u16, h: u16) -> Self {
        Self { w, h }
    }

    /// Width over height, or zero when the height is zero.
    pub fn aspect_ratio(&self) -> f32 {
        if self.h > 0 {
            self.w as f32 / self.h as f32
        } else {
            0.0
        }
    }

    pub fn area(&self) -> u32 {
        self.w as u32 * self.h as u32
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

impl FromStr for Size {
    type Err = PixelAtlasError;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| PixelAtlasError::Parse(format!("expected WxH, got {s:?}")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u16>()
                .map_err(|e| PixelAtlasError::Parse(format!("invalid size component {v:?}: {e}")))
        };
        Ok(Self::new(parse(w)?, parse(h)?))
    }
}

/// Description of an image: everything except the pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub name: String,
    pub size: Size,
    #[serde(default = "default_pixel_aspect_ratio")]
    pub pixel_aspect_ratio: f32,
    pub format: PixelFormat,
    #[serde(default)]
    pub layout: Layout,
}

fn default_pixel_aspect_ratio() -> f32 {
    1.0
}

impl Default for ImageInfo {
    fn default() -> Self {
        Self {
            name: NAME_DEFAULT.to_string(),
            size: Size::default(),
            pixel_aspect_ratio: default_pixel_aspect_ratio(),
            format: PixelFormat::None,
            layout: Layout::default(),
        }
    }
}

impl ImageInfo {
    pub fn new(size: Size, format: PixelFormat) -> Self {
        Self {
            size,
            format,
            ..Default::default()
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Display aspect ratio including the pixel aspect ratio.
    pub fn aspect_ratio(&self) -> f32 {
        self.size.aspect_ratio() * self.pixel_aspect_ratio
    }

    pub fn gl_format(&self) -> GlEnum {
        self.format.gl_format()
    }

    pub fn gl_type(&self) -> GlEnum {
        self.format.gl_type()
    }

    /// Non-zero size, a real format and a power-of-two row alignment.
    pub fn is_valid(&self) -> bool {
        self.size.w > 0
            && self.size.h > 0
            && !self.format.is_none()
            && self.layout.alignment.is_power_of_two()
    }

    pub fn pixel_byte_count(&self) -> usize {
        self.format.byte_count()
    }

    /// Bytes in one row, rounded up to the layout alignment.
    pub fn scanline_byte_count(&self) -> usize {
        let align = self.layout.alignment.max(1) as usize;
        (self.pixel_byte_count() * self.size.w as usize).div_ceil(align) * align
    }

    pub fn data_byte_count(&self) -> usize {
        self.scanline_byte_count() * self.size.h as usize
    }
}
