use crate::config::TextureFilter;
use crate::image_data::Uid;
use crate::pixel::PixelFormat;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }
    /// True if a `w`x`h` box fits inside without rotation.
    pub fn fits(&self, w: u32, h: u32) -> bool {
        self.w >= w && self.h >= h
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.x + r.w <= self.x + self.w && r.y + r.h <= self.y + self.h
    }
    pub fn intersects(&self, r: &Rect) -> bool {
        r.x < self.x + self.w && self.x < r.x + r.w && r.y < self.y + self.h && self.y < r.y + r.h
    }
}

/// Closed interval of normalized texture coordinates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// Placement of one tile, as consumed by a renderer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TextureAtlasItem {
    /// Tile width in pixels, border excluded.
    pub w: u16,
    /// Tile height in pixels, border excluded.
    pub h: u16,
    /// Page holding the tile, `0..texture_count`.
    pub texture_index: u8,
    /// Normalized horizontal extent of the tile content within the page.
    pub texture_u: FloatRange,
    /// Normalized vertical extent of the tile content within the page.
    pub texture_v: FloatRange,
}

/// Region of a page whose pixels changed and must be re-uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateRegion {
    pub texture_index: u8,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl UpdateRegion {
    pub(crate) fn from_rect(texture_index: u8, r: Rect) -> Self {
        Self {
            texture_index,
            x: r.x,
            y: r.y,
            width: r.w,
            height: r.h,
        }
    }

    /// Pixels to re-upload.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Statistics about atlas occupancy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AtlasStats {
    pub pages: usize,
    /// Resident tiles.
    pub items: usize,
    /// Area of occupied leaves, borders included.
    pub used_area: u64,
    pub total_area: u64,
    /// used_area / total_area (0.0 to 1.0).
    pub occupancy: f32,
    /// Free leaves across all pages. High counts relative to `items`
    /// indicate fragmentation.
    pub free_leaves: usize,
}

impl AtlasStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Items: {}, Occupancy: {:.2}%, Used Area: {} px², Total Area: {} px², Free Leaves: {}",
            self.pages,
            self.items,
            self.occupancy * 100.0,
            self.used_area,
            self.total_area,
            self.free_leaves,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_area.saturating_sub(self.used_area)
    }
}

/// One resident tile in an [`AtlasLayout`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutEntry {
    pub uid: Uid,
    /// Name of the image the tile was uploaded from.
    pub name: String,
    /// Content rectangle in page pixels, border excluded.
    pub frame: Rect,
    #[serde(flatten)]
    pub item: TextureAtlasItem,
}

/// Serializable snapshot of an atlas: page geometry plus every resident tile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasLayout {
    pub texture_count: u8,
    pub texture_size: u16,
    pub format: PixelFormat,
    pub filter: TextureFilter,
    pub border: u8,
    pub percentage_used: f32,
    /// Sorted by uid.
    pub items: Vec<LayoutEntry>,
}

impl AtlasLayout {
    /// Entries placed on page `texture_index`.
    pub fn page_items(&self, texture_index: u8) -> impl Iterator<Item = &LayoutEntry> {
        self.items
            .iter()
            .filter(move |e| e.item.texture_index == texture_index)
    }
}
