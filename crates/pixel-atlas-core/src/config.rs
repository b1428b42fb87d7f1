use crate::error::{PixelAtlasError, Result};
use crate::pixel::PixelFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sampling filter the renderer should use for atlas pages.
///
/// The atlas never samples pages itself; the value is carried through to
/// whoever uploads the pages.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TextureFilter {
    #[default]
    Linear,
    Nearest,
}

impl FromStr for TextureFilter {
    type Err = PixelAtlasError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "nearest" => Ok(Self::Nearest),
            _ => Err(PixelAtlasError::Parse(format!("unknown texture filter: {s:?}"))),
        }
    }
}

impl fmt::Display for TextureFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Linear => "linear",
            Self::Nearest => "nearest",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Number of pages, fixed for the atlas lifetime.
    #[serde(default = "default_texture_count")]
    pub texture_count: u8,
    /// Edge length of every (square) page in pixels.
    #[serde(default = "default_texture_size")]
    pub texture_size: u16,
    /// Pixel format of the pages; tiles are converted into it on upload.
    #[serde(default = "default_format")]
    pub format: PixelFormat,
    #[serde(default)]
    pub filter: TextureFilter,
    /// Pixels of edge extrusion around every tile.
    #[serde(default = "default_border")]
    pub border: u8,
    /// Recombine free sibling leaves when a tile is removed.
    #[serde(default = "default_merge_on_release")]
    pub merge_on_release: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            texture_count: default_texture_count(),
            texture_size: default_texture_size(),
            format: default_format(),
            filter: TextureFilter::default(),
            border: default_border(),
            merge_on_release: default_merge_on_release(),
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - there are no pages or the page size is zero
    /// - the page format is `None`
    /// - the border would leave no usable space on a page
    pub fn validate(&self) -> Result<()> {
        if self.texture_count == 0 {
            return Err(PixelAtlasError::InvalidConfig(
                "texture_count must be at least 1".into(),
            ));
        }
        if self.texture_size == 0 {
            return Err(PixelAtlasError::InvalidConfig(
                "texture_size must be at least 1".into(),
            ));
        }
        if self.format.is_none() {
            return Err(PixelAtlasError::InvalidConfig(
                "page format cannot be None".into(),
            ));
        }
        let total_border = u32::from(self.border) * 2;
        if total_border >= u32::from(self.texture_size) {
            return Err(PixelAtlasError::InvalidConfig(format!(
                "border ({}) * 2 leaves no usable space on a {}x{} page",
                self.border, self.texture_size, self.texture_size
            )));
        }
        Ok(())
    }

    /// Total page area in pixels across all pages.
    pub fn total_area(&self) -> u64 {
        u64::from(self.texture_size) * u64::from(self.texture_size) * u64::from(self.texture_count)
    }

    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}

fn default_texture_count() -> u8 {
    4
}
fn default_texture_size() -> u16 {
    4096
}
fn default_format() -> PixelFormat {
    PixelFormat::RgbaU8
}
fn default_border() -> u8 {
    1
}
fn default_merge_on_release() -> bool {
    true
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn texture_count(mut self, v: u8) -> Self {
        self.cfg.texture_count = v;
        self
    }
    pub fn texture_size(mut self, v: u16) -> Self {
        self.cfg.texture_size = v;
        self
    }
    pub fn format(mut self, v: PixelFormat) -> Self {
        self.cfg.format = v;
        self
    }
    pub fn filter(mut self, v: TextureFilter) -> Self {
        self.cfg.filter = v;
        self
    }
    pub fn border(mut self, v: u8) -> Self {
        self.cfg.border = v;
        self
    }
    pub fn merge_on_release(mut self, v: bool) -> Self {
        self.cfg.merge_on_release = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}
