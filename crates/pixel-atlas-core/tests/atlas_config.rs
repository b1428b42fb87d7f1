use pixel_atlas_core::prelude::*;
use pixel_atlas_core::PixelAtlasError;

#[test]
fn defaults() {
    let cfg = AtlasConfig::default();
    assert_eq!(cfg.texture_count, 4);
    assert_eq!(cfg.texture_size, 4096);
    assert_eq!(cfg.format, PixelFormat::RgbaU8);
    assert_eq!(cfg.filter, TextureFilter::Linear);
    assert_eq!(cfg.border, 1);
    assert!(cfg.merge_on_release);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.total_area(), 4 * 4096 * 4096);
}

#[test]
fn builder_sets_every_field() {
    let cfg = AtlasConfig::builder()
        .texture_count(2)
        .texture_size(1024)
        .format(PixelFormat::RgbaF16)
        .filter(TextureFilter::Nearest)
        .border(0)
        .merge_on_release(false)
        .build();
    assert_eq!(
        cfg,
        AtlasConfig {
            texture_count: 2,
            texture_size: 1024,
            format: PixelFormat::RgbaF16,
            filter: TextureFilter::Nearest,
            border: 0,
            merge_on_release: false,
        }
    );
}

#[test]
fn validate_rejects_unusable_settings() {
    let bad = [
        AtlasConfig::builder().texture_count(0).build(),
        AtlasConfig::builder().texture_size(0).build(),
        AtlasConfig::builder().format(PixelFormat::None).build(),
        AtlasConfig::builder().texture_size(8).border(4).build(),
    ];
    for cfg in bad {
        assert!(
            matches!(cfg.validate(), Err(PixelAtlasError::InvalidConfig(_))),
            "{cfg:?}"
        );
    }
    assert!(AtlasConfig::builder().texture_size(8).border(3).build().validate().is_ok());
}

#[test]
fn missing_json_fields_take_defaults() {
    let cfg: AtlasConfig =
        serde_json::from_str(r#"{"texture_size": 512, "filter": "nearest", "format": "LA_F32"}"#).unwrap();
    assert_eq!(cfg.texture_size, 512);
    assert_eq!(cfg.filter, TextureFilter::Nearest);
    assert_eq!(cfg.format, PixelFormat::LaF32);
    assert_eq!(cfg.texture_count, 4);
    assert_eq!(cfg.border, 1);
    assert!(cfg.merge_on_release);

    let text = serde_json::to_string(&cfg).unwrap();
    assert_eq!(serde_json::from_str::<AtlasConfig>(&text).unwrap(), cfg);
}

#[test]
fn filter_parses_case_insensitively() {
    assert_eq!("Nearest".parse::<TextureFilter>().unwrap(), TextureFilter::Nearest);
    assert_eq!("LINEAR".parse::<TextureFilter>().unwrap(), TextureFilter::Linear);
    assert!("cubic".parse::<TextureFilter>().is_err());
    assert_eq!(TextureFilter::Nearest.to_string(), "nearest");
}
