use pixel_atlas_core::prelude::*;
use pixel_atlas_core::PixelAtlasError;

fn info(w: u16, h: u16, format: PixelFormat) -> ImageInfo {
    ImageInfo::new(Size::new(w, h), format)
}

#[test]
fn zero_size_fails_allocation() {
    let err = ImageBuffer::new(info(0, 0, PixelFormat::RgbaU8)).unwrap_err();
    assert!(matches!(err, PixelAtlasError::Allocation { width: 0, height: 0, .. }));
    assert!(ImageBuffer::new(info(16, 0, PixelFormat::RgbaU8)).is_err());
    assert!(ImageBuffer::new(info(16, 16, PixelFormat::None)).is_err());
}

#[test]
fn alignment_must_be_a_power_of_two() {
    for alignment in [0u8, 3, 6] {
        let i = info(1, 2, PixelFormat::LU8).with_layout(Layout::default().with_alignment(alignment));
        assert!(!i.is_valid());
        let err = ImageBuffer::new(i.clone()).unwrap_err();
        assert!(
            matches!(err, PixelAtlasError::Allocation { alignment: a, .. } if a == alignment),
            "alignment {alignment}"
        );
        assert!(ImageBuffer::from_bytes(i, vec![0; 2]).is_err());
    }

    let src = ImageBuffer::new(info(3, 1, PixelFormat::LU8)).unwrap();
    let bad = Layout::default().with_alignment(3);
    assert!(matches!(
        src.convert_with_layout(PixelFormat::RgbU8, bad),
        Err(PixelAtlasError::Allocation { .. })
    ));
    for alignment in [1u8, 2, 4, 8] {
        let ok = Layout::default().with_alignment(alignment);
        assert!(src.convert_with_layout(PixelFormat::LU8, ok).is_ok());
    }
}

#[test]
fn rgba_u8_64x64_byte_counts() {
    let buf = ImageBuffer::new(info(64, 64, PixelFormat::RgbaU8)).unwrap();
    assert_eq!(buf.data_byte_count(), 64 * 64 * 4);
    assert_eq!(buf.data().len(), 16384);
    assert_eq!(buf.pixel_byte_count(), 4);
    assert_eq!(buf.scanline_byte_count(), 256);
    assert!(buf.data().iter().all(|b| *b == 0));
    assert!(!buf.is_mapped());
}

#[test]
fn scanline_alignment_rounds_up() {
    let i = info(4, 3, PixelFormat::LU8);
    assert_eq!(i.scanline_byte_count(), 4);
    assert_eq!(i.data_byte_count(), 12);
    let i = i.with_layout(Layout::default().with_alignment(4));
    assert_eq!(i.scanline_byte_count(), 4);

    let i = info(3, 3, PixelFormat::LU8).with_layout(Layout::default().with_alignment(4));
    assert_eq!(i.scanline_byte_count(), 4);
    assert_eq!(i.data_byte_count(), 12);

    let i = info(5, 2, PixelFormat::RgbU8).with_layout(Layout::default().with_alignment(8));
    assert_eq!(i.scanline_byte_count(), 16);
}

#[test]
fn pixel_and_row_addressing() {
    let layout = Layout::default().with_alignment(4);
    let mut buf = ImageBuffer::new(info(3, 2, PixelFormat::RgbU8).with_layout(layout)).unwrap();
    assert_eq!(buf.scanline_byte_count(), 12);
    buf.pixel_mut(2, 1).copy_from_slice(&[7, 8, 9]);
    assert_eq!(buf.pixel(2, 1), &[7, 8, 9]);
    assert_eq!(&buf.data()[12 + 6..12 + 9], &[7, 8, 9]);
    assert_eq!(buf.row(1).len(), 12);
    buf.row_mut(0)[0] = 1;
    assert_eq!(buf.pixel(0, 0), &[1, 0, 0]);
}

#[test]
#[should_panic]
fn out_of_range_row_panics() {
    let buf = ImageBuffer::new(info(2, 2, PixelFormat::LU8)).unwrap();
    let _ = buf.row(2);
}

#[test]
fn from_bytes_checks_length() {
    let err = ImageBuffer::from_bytes(info(2, 2, PixelFormat::LU16), vec![0; 7]).unwrap_err();
    assert!(matches!(
        err,
        PixelAtlasError::ByteCountMismatch { expected: 8, actual: 7 }
    ));
    let ok = ImageBuffer::from_bytes(info(2, 2, PixelFormat::LU16), vec![1; 8]).unwrap();
    assert_eq!(ok.data(), &[1; 8]);
}

#[test]
fn every_buffer_gets_a_distinct_uid() {
    let a = ImageBuffer::new(info(1, 1, PixelFormat::LU8)).unwrap();
    let b = ImageBuffer::new(info(1, 1, PixelFormat::LU8)).unwrap();
    assert_ne!(a.uid(), b.uid());
    assert!(b.uid() > a.uid());
    // identity is the uid, equality is content
    assert_eq!(a, b);
}

#[test]
fn zero_resets_content() {
    let mut buf = ImageBuffer::from_bytes(info(2, 1, PixelFormat::LU8), vec![5, 6]).unwrap();
    let other = ImageBuffer::new(info(2, 1, PixelFormat::LU8)).unwrap();
    assert_ne!(buf, other);
    buf.zero();
    assert_eq!(buf, other);
}

#[test]
fn info_accessors() {
    let mut i = info(1920, 1080, PixelFormat::RgbaF16).with_name("frame");
    i.pixel_aspect_ratio = 2.0;
    let buf = ImageBuffer::new(i).unwrap();
    assert_eq!(buf.info().name, "frame");
    assert_eq!(buf.width(), 1920);
    assert_eq!(buf.height(), 1080);
    assert!((buf.aspect_ratio() - 1920.0 / 1080.0 * 2.0).abs() < 1e-5);
    assert_eq!(buf.gl_format(), PixelFormat::RgbaF16.gl_format());
    assert_eq!(buf.gl_type(), PixelFormat::RgbaF16.gl_type());
    assert_eq!(ImageInfo::default().name, "Default");
    assert_eq!(Size::new(10, 0).aspect_ratio(), 0.0);
}

#[test]
fn convert_keeps_alignment_and_issues_new_uid() {
    let layout = Layout::default().with_alignment(4);
    let src = ImageBuffer::from_bytes(
        info(3, 2, PixelFormat::LU8).with_layout(layout),
        vec![0, 128, 255, 0xAA, 10, 20, 30, 0xBB],
    )
    .unwrap();
    let out = src.convert(PixelFormat::RgbaU8).unwrap();
    assert_ne!(out.uid(), src.uid());
    assert_eq!(out.format(), PixelFormat::RgbaU8);
    assert_eq!(out.layout().alignment, 4);
    assert_eq!(out.pixel(1, 0), &[128, 128, 128, 255]);
    assert_eq!(out.pixel(2, 1), &[30, 30, 30, 255]);
}

#[test]
fn convert_swaps_non_native_source() {
    let foreign = Endian::native().opposite();
    let mut bytes = Vec::new();
    for v in [0x1234u16, 0xFF00] {
        let mut b = v.to_ne_bytes();
        b.reverse();
        bytes.extend_from_slice(&b);
    }
    let src = ImageBuffer::from_bytes(
        info(2, 1, PixelFormat::LU16).with_layout(Layout::default().with_endian(foreign)),
        bytes,
    )
    .unwrap();
    let out = src.convert(PixelFormat::LU8).unwrap();
    assert_eq!(out.data(), &[0x12, 0xFF]);
    assert!(out.layout().endian.is_native());
}

#[test]
fn convert_with_layout_writes_requested_byte_order() {
    let src = ImageBuffer::from_bytes(info(1, 1, PixelFormat::LU8), vec![0xAB]).unwrap();
    let layout = Layout::default()
        .with_alignment(4)
        .with_endian(Endian::native().opposite());
    let out = src.convert_with_layout(PixelFormat::LU16, layout).unwrap();
    assert_eq!(out.data_byte_count(), 4);
    let mut expected = 0xAB00u16.to_ne_bytes();
    expected.reverse();
    assert_eq!(&out.data()[..2], &expected);
}

#[test]
fn fill_writes_every_pixel() {
    let mut buf = ImageBuffer::new(info(2, 2, PixelFormat::LaU16)).unwrap();
    buf.fill(&Color::rgba_f32(1.0, 1.0, 1.0, 1.0)).unwrap();
    assert!(buf.data().iter().all(|b| *b == 0xFF));
}

#[test]
fn convert_to_none_fails() {
    let src = ImageBuffer::new(info(1, 1, PixelFormat::LU8)).unwrap();
    assert!(src.convert(PixelFormat::None).is_err());
}

#[cfg(feature = "image")]
#[test]
fn dynamic_image_bridge() {
    use image::{DynamicImage, GrayImage, Luma, Rgb32FImage};

    let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([77])));
    let buf = ImageBuffer::from_dynamic_image("gray", &gray).unwrap();
    assert_eq!(buf.format(), PixelFormat::LU8);
    assert_eq!(buf.info().name, "gray");
    let rgba = buf.to_rgba_image().unwrap();
    assert_eq!(rgba.dimensions(), (3, 2));
    assert_eq!(rgba.get_pixel(2, 1).0, [77, 77, 77, 255]);

    let hdr = DynamicImage::ImageRgb32F(Rgb32FImage::from_pixel(1, 1, image::Rgb([2.0, 0.5, -1.0])));
    let buf = ImageBuffer::from_dynamic_image("hdr", &hdr).unwrap();
    assert_eq!(buf.format(), PixelFormat::RgbF32);
    assert_eq!(&buf.to_rgba_image().unwrap().get_pixel(0, 0).0[..3], &[255, 128, 0]);
}

#[test]
fn plugin_name_and_tags_travel_with_conversion() {
    let mut src = ImageBuffer::from_bytes(info(1, 1, PixelFormat::LU8), vec![40]).unwrap();
    assert_eq!(src.plugin_name(), "");
    assert!(src.tags().is_empty());
    src.set_plugin_name("ppm");
    src.set_tag("creator", "scanner");
    src.set_tag("creator", "camera");
    assert_eq!(src.tag("creator"), Some("camera"));
    assert_eq!(src.tag("missing"), None);

    let out = src.convert(PixelFormat::RgbU8).unwrap();
    assert_eq!(out.plugin_name(), "ppm");
    assert_eq!(out.tags(), src.tags());

    // metadata is not part of equality
    let mut plain = ImageBuffer::from_bytes(info(1, 1, PixelFormat::LU8), vec![40]).unwrap();
    assert_eq!(plain, src);
    let mut tags = pixel_atlas_core::Tags::new();
    tags.insert("a".into(), "b".into());
    plain.set_tags(tags);
    assert_eq!(plain.tag("a"), Some("b"));
    assert_eq!(plain, src);

    let uid = plain.uid();
    plain.set_name("sprites/a");
    assert_eq!(plain.info().name, "sprites/a");
    assert_eq!(plain.uid(), uid);
}

#[cfg(feature = "image")]
#[test]
fn open_records_codec_and_color_type() {
    use image::{Rgba, RgbaImage};
    use pixel_atlas_core::image_data::TAG_COLOR_TYPE;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("swatch.png");
    RgbaImage::from_pixel(2, 3, Rgba([1, 2, 3, 4])).save(&path).unwrap();

    let buf = ImageBuffer::open(&path).unwrap();
    assert_eq!(buf.info().name, "swatch");
    assert_eq!(buf.plugin_name(), "png");
    assert_eq!(buf.tag(TAG_COLOR_TYPE), Some("Rgba8"));
    assert_eq!(buf.format(), PixelFormat::RgbaU8);
    assert_eq!((buf.width(), buf.height()), (2, 3));
    assert_eq!(buf.pixel(1, 2), &[1, 2, 3, 4]);

    assert!(ImageBuffer::open(dir.path().join("missing.png")).is_err());
}
