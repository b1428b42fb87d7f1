//! Pixel formats, pixel conversion and texture atlases.
//!
//! - Formats: a closed set of 1 to 4 channel encodings (8/10/16/32-bit integer, 16/32-bit float)
//! - Conversion: any format to any other, bit-exact widening and clamped narrowing
//! - Images: `ImageBuffer` owns or memory-maps pixel rows described by an `ImageInfo`
//! - Atlas: `TextureAtlas` packs tiles into fixed square pages with a best-fit box tree
//!
//! Quick example:
//! ```ignore
//! use pixel_atlas_core::prelude::*;
//! # fn main() -> pixel_atlas_core::Result<()> {
//! let info = ImageInfo::new(Size::new(64, 64), PixelFormat::RgbU16);
//! let tile = ImageBuffer::new(info)?;
//! let cfg = AtlasConfig::builder().texture_count(1).texture_size(512).build();
//! let mut atlas = TextureAtlas::new(cfg)?;
//! let (uid, item, region) = atlas.add_item(&tile)?;
//! println!("{uid} on page {} ({} px to upload)", item.texture_index, region.area());
//! # Ok(()) }
//! ```

pub mod atlas;
pub mod color;
pub mod compositing;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod image_data;
pub mod json;
pub mod memory;
pub mod model;
pub(crate) mod packer;
pub mod pixel;

pub use atlas::TextureAtlas;
pub use color::Color;
pub use config::*;
pub use error::*;
pub use export::*;
pub use image_data::{ImageBuffer, ImageInfo, Layout, Mirror, Size, Tags, Uid};
pub use json::{size_from_json, size_to_json};
pub use memory::Endian;
pub use model::*;
pub use pixel::{ChannelType, PixelFormat};

/// Convenience prelude for common types and functions.
/// Importing `pixel_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::atlas::TextureAtlas;
    pub use crate::color::Color;
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder, TextureFilter};
    pub use crate::convert::convert;
    pub use crate::image_data::{ImageBuffer, ImageInfo, Layout, Mirror, Size, Tags, Uid};
    pub use crate::memory::Endian;
    pub use crate::model::{AtlasLayout, AtlasStats, FloatRange, TextureAtlasItem, UpdateRegion};
    pub use crate::pixel::{ChannelType, PixelFormat};
}
