use pixel_atlas_core::prelude::*;
use pixel_atlas_core::{to_json_layout, write_json_layout};
use serde_json::json;

fn named(name: &str, w: u16, h: u16) -> ImageBuffer {
    ImageBuffer::new(ImageInfo::new(Size::new(w, h), PixelFormat::RgbaU8).with_name(name)).unwrap()
}

fn sample_atlas() -> TextureAtlas {
    let cfg = AtlasConfig::builder()
        .texture_count(2)
        .texture_size(64)
        .border(0)
        .build();
    let mut atlas = TextureAtlas::new(cfg).unwrap();
    atlas.add_item(&named("hero", 64, 64)).unwrap();
    atlas.add_item(&named("coin", 16, 8)).unwrap();
    atlas
}

#[test]
fn json_layout_has_pages_frames_and_meta() {
    let atlas = sample_atlas();
    let v = to_json_layout(&atlas.layout()).unwrap();

    assert_eq!(v["pages"][0], json!({"id": 0, "frames": ["hero"]}));
    assert_eq!(v["pages"][1], json!({"id": 1, "frames": ["coin"]}));

    let hero = &v["frames"]["hero"];
    assert_eq!(hero["page"], 0);
    assert_eq!(hero["frame"], json!({"x": 0, "y": 0, "w": 64, "h": 64}));
    assert_eq!(hero["u"], json!([0.0, 1.0]));
    assert_eq!(v["frames"]["coin"]["page"], 1);
    assert_eq!(v["frames"]["coin"]["v"], json!([0.0, 0.125]));

    let meta = &v["meta"];
    assert_eq!(meta["app"], "pixel-atlas-core");
    assert_eq!(meta["size"], json!({"w": "64", "h": "64"}));
    assert_eq!(meta["format"], "RGBA_U8");
    assert_eq!(meta["filter"], "linear");
    assert_eq!(meta["border"], 0);
}

#[test]
fn duplicate_names_get_the_uid_appended() {
    let cfg = AtlasConfig::builder().texture_count(1).texture_size(64).build();
    let mut atlas = TextureAtlas::new(cfg).unwrap();
    atlas.add_item(&named("dup", 4, 4)).unwrap();
    let second = named("dup", 4, 4);
    atlas.add_item(&second).unwrap();

    let v = to_json_layout(&atlas.layout()).unwrap();
    let key = format!("dup#{}", second.uid());
    assert!(v["frames"]["dup"].is_object());
    assert_eq!(v["frames"][key.as_str()]["uid"], second.uid().get());
    assert_eq!(v["pages"][0]["frames"], json!(["dup", key]));
}

#[test]
fn layout_is_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("atlas.json");
    let atlas = sample_atlas();
    write_json_layout(&path, &atlas.layout()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v, to_json_layout(&atlas.layout()).unwrap());
}

#[test]
fn layout_snapshot_round_trips_through_serde() {
    let layout = sample_atlas().layout();
    let text = serde_json::to_string(&layout).unwrap();
    let back: AtlasLayout = serde_json::from_str(&text).unwrap();
    assert_eq!(back, layout);
}
