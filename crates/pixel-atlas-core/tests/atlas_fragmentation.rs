use pixel_atlas_core::prelude::*;
use pixel_atlas_core::{PixelAtlasError, Rect};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIZE: u16 = 512;
const BORDER: u32 = 1;

fn leaf_of(e: &pixel_atlas_core::LayoutEntry) -> Rect {
    Rect::new(
        e.frame.x - BORDER,
        e.frame.y - BORDER,
        e.frame.w + 2 * BORDER,
        e.frame.h + 2 * BORDER,
    )
}

fn assert_disjoint(atlas: &TextureAtlas) {
    let layout = atlas.layout();
    let page = Rect::new(0, 0, u32::from(SIZE), u32::from(SIZE));
    for (i, a) in layout.items.iter().enumerate() {
        assert!(page.contains(&leaf_of(a)), "{:?} leaves the page", a.frame);
        for b in &layout.items[i + 1..] {
            if a.item.texture_index == b.item.texture_index {
                assert!(
                    !leaf_of(a).intersects(&leaf_of(b)),
                    "{:?} overlaps {:?}",
                    a.frame,
                    b.frame
                );
            }
        }
    }
}

fn churn(atlas: &mut TextureAtlas, seed: u64, steps: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut resident: Vec<Uid> = Vec::new();
    for _ in 0..steps {
        let w = rng.gen_range(4..=96);
        let h = rng.gen_range(4..=96);
        let buf = ImageBuffer::new(ImageInfo::new(Size::new(w, h), PixelFormat::LU8)).unwrap();
        match atlas.add_item(&buf) {
            Ok((uid, _, _)) => resident.push(uid),
            Err(PixelAtlasError::AtlasFull { .. }) => {
                // evict a few and move on
                for _ in 0..3.min(resident.len()) {
                    let uid = resident.swap_remove(rng.gen_range(0..resident.len()));
                    assert!(atlas.remove_item(uid));
                }
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
        let used = atlas.percentage_used();
        assert!((0.0..=1.0).contains(&used));
        assert_eq!(atlas.item_count(), resident.len());
    }
    assert_disjoint(atlas);
    for uid in resident {
        assert!(atlas.remove_item(uid));
    }
}

fn config(merge_on_release: bool) -> AtlasConfig {
    AtlasConfig::builder()
        .texture_count(2)
        .texture_size(SIZE)
        .format(PixelFormat::LU8)
        .border(BORDER as u8)
        .merge_on_release(merge_on_release)
        .build()
}

#[test]
fn churn_keeps_tiles_disjoint_and_merges_back() {
    let mut atlas = TextureAtlas::new(config(true)).unwrap();
    churn(&mut atlas, 7, 600);
    assert_eq!(atlas.item_count(), 0);
    assert_eq!(atlas.percentage_used(), 0.0);
    // every page collapsed back to a single free root
    assert_eq!(atlas.stats().free_leaves, 2);
    let full = ImageBuffer::new(ImageInfo::new(Size::new(SIZE - 2, SIZE - 2), PixelFormat::LU8)).unwrap();
    assert!(atlas.add_item(&full).is_ok());
}

#[test]
fn churn_without_merge_leaves_fragments() {
    let mut atlas = TextureAtlas::new(config(false)).unwrap();
    churn(&mut atlas, 11, 300);
    assert_eq!(atlas.item_count(), 0);
    assert_eq!(atlas.percentage_used(), 0.0);
    assert!(atlas.stats().free_leaves > 2);
    let full = ImageBuffer::new(ImageInfo::new(Size::new(SIZE - 2, SIZE - 2), PixelFormat::LU8)).unwrap();
    assert!(atlas.add_item(&full).is_err());
}

#[test]
fn same_inputs_give_same_layout() {
    let place = || {
        let mut atlas = TextureAtlas::new(config(true)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut frames = Vec::new();
        for _ in 0..40 {
            let size = Size::new(rng.gen_range(8..=64), rng.gen_range(8..=64));
            let buf = ImageBuffer::new(ImageInfo::new(size, PixelFormat::LU8)).unwrap();
            if let Ok((_, item, region)) = atlas.add_item(&buf) {
                frames.push((item.texture_index, region.x, region.y));
            }
        }
        frames
    };
    assert_eq!(place(), place());
}
