use crate::compositing::{blit_extruded, clear_rect};
use crate::config::{AtlasConfig, TextureFilter};
use crate::error::{PixelAtlasError, Result};
use crate::image_data::{ImageBuffer, ImageInfo, Size, Uid};
use crate::model::{AtlasLayout, AtlasStats, FloatRange, LayoutEntry, Rect, TextureAtlasItem, UpdateRegion};
use crate::packer::{BoxTree, NodeId};
use crate::pixel::PixelFormat;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
struct Slot {
    texture_index: u8,
    node: NodeId,
    name: String,
    item: TextureAtlasItem,
}

/// Fixed set of square pages that hold many smaller tiles.
///
/// Tiles are keyed by the [`Uid`] of the [`ImageBuffer`] they were uploaded
/// from; the atlas never holds on to the source buffer. Every page owns one
/// packing tree plus its pixels. Nothing is evicted automatically: when
/// [`add_item`](Self::add_item) reports [`PixelAtlasError::AtlasFull`], the
/// caller decides what to remove.
///
/// The atlas is single-writer; all mutation goes through `&mut self`.
#[derive(Debug)]
pub struct TextureAtlas {
    cfg: AtlasConfig,
    trees: Vec<BoxTree>,
    pages: Vec<ImageBuffer>,
    items: HashMap<Uid, Slot>,
}

impl TextureAtlas {
    /// Validates `cfg` and allocates zeroed pages.
    pub fn new(cfg: AtlasConfig) -> Result<Self> {
        cfg.validate()?;
        let size = Size::new(cfg.texture_size, cfg.texture_size);
        let pages = (0..cfg.texture_count)
            .map(|i| ImageBuffer::new(ImageInfo::new(size, cfg.format).with_name(format!("page{i}"))))
            .collect::<Result<Vec<_>>>()?;
        let trees = (0..cfg.texture_count)
            .map(|_| BoxTree::new(cfg.texture_size))
            .collect();
        debug!(
            pages = cfg.texture_count,
            size = cfg.texture_size,
            format = %cfg.format,
            "created texture atlas"
        );
        Ok(Self {
            cfg,
            trees,
            pages,
            items: HashMap::new(),
        })
    }

    /// Places `image` and uploads its pixels.
    ///
    /// The smallest free leaf across all pages that holds the tile plus its
    /// border wins; ties go to the lower page. Pixels are converted to the
    /// atlas format and the tile edges are extruded into the border.
    /// Adding a buffer that is already resident re-uploads it in place; a
    /// buffer's size never changes once its uid is issued.
    #[instrument(skip_all, fields(uid = %image.uid(), w = image.width(), h = image.height()))]
    pub fn add_item(&mut self, image: &ImageBuffer) -> Result<(Uid, TextureAtlasItem, UpdateRegion)> {
        let uid = image.uid();
        let (w, h) = (image.width(), image.height());

        if let Some((texture_index, node, item)) =
            self.items.get(&uid).map(|s| (s.texture_index, s.node, s.item))
        {
            debug_assert_eq!((item.w, item.h), (w, h));
            let region = self.upload(texture_index, node, image)?;
            debug!(texture_index, "re-uploaded resident tile");
            return Ok((uid, item, region));
        }

        let b = u32::from(self.cfg.border);
        let (rw, rh) = (u32::from(w) + 2 * b, u32::from(h) + 2 * b);
        let size = u32::from(self.cfg.texture_size);
        if rw > size || rh > size {
            warn!(size, border = b, "tile is larger than an atlas page");
            return Err(PixelAtlasError::AtlasFull { width: w, height: h });
        }

        let mut best: Option<(usize, NodeId, u64)> = None;
        for (page, tree) in self.trees.iter().enumerate() {
            if let Some((id, area)) = tree.best_fit(rw, rh) {
                if best.is_none_or(|(_, _, a)| area < a) {
                    best = Some((page, id, area));
                }
            }
        }
        let Some((page, id, _)) = best else {
            debug!("no free leaf fits");
            return Err(PixelAtlasError::AtlasFull { width: w, height: h });
        };

        let texture_index = page as u8;
        let node = self.trees[page].insert(id, rw, rh, uid);
        let region = match self.upload(texture_index, node, image) {
            Ok(region) => region,
            Err(e) => {
                self.trees[page].release(node, self.cfg.merge_on_release);
                return Err(e);
            }
        };
        let item = self.make_item(texture_index, self.trees[page].rect(node), w, h);
        self.items.insert(
            uid,
            Slot {
                texture_index,
                node,
                name: image.info().name.clone(),
                item,
            },
        );
        debug!(texture_index, x = region.x, y = region.y, "placed tile");
        Ok((uid, item, region))
    }

    /// Placement of `uid`, if resident.
    pub fn get_item(&self, uid: Uid) -> Option<TextureAtlasItem> {
        self.items.get(&uid).map(|s| s.item)
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.items.contains_key(&uid)
    }

    /// Frees the leaf holding `uid`. Page pixels are left as they are.
    /// Returns false when `uid` is not resident.
    pub fn remove_item(&mut self, uid: Uid) -> bool {
        self.release(uid).is_some()
    }

    /// Like [`remove_item`](Self::remove_item), but also zeroes the tile's
    /// pixels (border included) and returns the region to re-upload.
    pub fn remove_item_with_clear(&mut self, uid: Uid) -> Option<UpdateRegion> {
        let (texture_index, rect) = self.release(uid)?;
        clear_rect(&mut self.pages[texture_index as usize], rect);
        Some(UpdateRegion::from_rect(texture_index, rect))
    }

    fn release(&mut self, uid: Uid) -> Option<(u8, Rect)> {
        let slot = self.items.remove(&uid)?;
        let tree = &mut self.trees[slot.texture_index as usize];
        debug_assert_eq!(tree.owner(slot.node), Some(uid));
        let rect = tree.rect(slot.node);
        tree.release(slot.node, self.cfg.merge_on_release);
        debug!(%uid, texture_index = slot.texture_index, "released tile");
        Some((slot.texture_index, rect))
    }

    /// Occupied leaf area over the total page area, in `[0, 1]`.
    pub fn percentage_used(&self) -> f32 {
        let used: u64 = self.trees.iter().map(BoxTree::occupied_area).sum();
        (used as f64 / self.cfg.total_area() as f64) as f32
    }

    pub fn stats(&self) -> AtlasStats {
        let used_area = self.trees.iter().map(BoxTree::occupied_area).sum();
        let total_area = self.cfg.total_area();
        AtlasStats {
            pages: self.pages.len(),
            items: self.items.len(),
            used_area,
            total_area,
            occupancy: (used_area as f64 / total_area as f64) as f32,
            free_leaves: self.trees.iter().map(BoxTree::free_leaf_count).sum(),
        }
    }

    /// Drops every tile and zeroes all pages.
    pub fn clear(&mut self) {
        for tree in &mut self.trees {
            tree.reset(self.cfg.texture_size);
        }
        for page in &mut self.pages {
            page.zero();
        }
        self.items.clear();
        debug!("cleared texture atlas");
    }

    /// Snapshot of the page geometry and every resident tile.
    pub fn layout(&self) -> AtlasLayout {
        let b = u32::from(self.cfg.border);
        let mut items: Vec<LayoutEntry> = self
            .items
            .iter()
            .map(|(uid, slot)| {
                let r = self.trees[slot.texture_index as usize].rect(slot.node);
                LayoutEntry {
                    uid: *uid,
                    name: slot.name.clone(),
                    frame: Rect::new(r.x + b, r.y + b, u32::from(slot.item.w), u32::from(slot.item.h)),
                    item: slot.item,
                }
            })
            .collect();
        items.sort_by_key(|e| e.uid);
        AtlasLayout {
            texture_count: self.cfg.texture_count,
            texture_size: self.cfg.texture_size,
            format: self.cfg.format,
            filter: self.cfg.filter,
            border: self.cfg.border,
            percentage_used: self.percentage_used(),
            items,
        }
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.cfg
    }

    pub fn texture_count(&self) -> u8 {
        self.cfg.texture_count
    }

    pub fn texture_size(&self) -> u16 {
        self.cfg.texture_size
    }

    pub fn texture_format(&self) -> PixelFormat {
        self.cfg.format
    }

    pub fn filter(&self) -> TextureFilter {
        self.cfg.filter
    }

    pub fn border(&self) -> u8 {
        self.cfg.border
    }

    /// Pixel data of every page, indexed by `texture_index`.
    pub fn pages(&self) -> &[ImageBuffer] {
        &self.pages
    }

    pub fn page(&self, texture_index: u8) -> Option<&ImageBuffer> {
        self.pages.get(texture_index as usize)
    }

    /// True when page `texture_index` holds no tiles (or does not exist).
    pub fn is_page_empty(&self, texture_index: u8) -> bool {
        self.trees
            .get(texture_index as usize)
            .is_none_or(BoxTree::is_empty)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Resident uids in ascending order.
    pub fn uids(&self) -> Vec<Uid> {
        let mut uids: Vec<Uid> = self.items.keys().copied().collect();
        uids.sort();
        uids
    }

    fn upload(&mut self, texture_index: u8, node: NodeId, image: &ImageBuffer) -> Result<UpdateRegion> {
        let rect = self.trees[texture_index as usize].rect(node);
        let b = u32::from(self.cfg.border);
        blit_extruded(image, &mut self.pages[texture_index as usize], rect.x + b, rect.y + b, b)?;
        Ok(UpdateRegion::from_rect(texture_index, rect))
    }

    fn make_item(&self, texture_index: u8, leaf: Rect, w: u16, h: u16) -> TextureAtlasItem {
        let size = f32::from(self.cfg.texture_size);
        let b = u32::from(self.cfg.border);
        let (x, y) = ((leaf.x + b) as f32, (leaf.y + b) as f32);
        TextureAtlasItem {
            w,
            h,
            texture_index,
            texture_u: FloatRange::new(x / size, (x + f32::from(w)) / size),
            texture_v: FloatRange::new(y / size, (y + f32::from(h)) / size),
        }
    }
}
