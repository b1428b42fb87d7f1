use super::info::{ImageInfo, Layout, Size};
use super::uid::Uid;
use crate::color::Color;
use crate::convert;
use crate::error::{PixelAtlasError, Result};
use crate::memory::{self, Endian};
use crate::pixel::{GlEnum, PixelFormat};
use memmap2::{Mmap, MmapOptions};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::sync::Arc;
use tracing::{debug, instrument};

enum Storage {
    Owned(Vec<u8>),
    /// Read-only view of a file region. The file must stay open and
    /// untruncated for as long as the view lives.
    Mapped { _file: Arc<File>, map: Mmap },
}

/// Free-form string metadata attached to an image, e.g. by its decoder.
pub type Tags = BTreeMap<String, String>;

/// Tag set by the decoder bridge to the decoded color type, e.g. `Rgba8`.
pub const TAG_COLOR_TYPE: &str = "color_type";

/// A 2D pixel buffer.
///
/// The buffer holds exactly [`ImageInfo::data_byte_count`] bytes, either owned
/// or mapped from a file. Each instance carries a [`Uid`] that no other live
/// buffer shares.
///
/// The name of the decoder that produced the pixels and any [`Tags`] travel
/// with the buffer but take no part in equality.
pub struct ImageBuffer {
    uid: Uid,
    info: ImageInfo,
    pixel_byte_count: usize,
    scanline_byte_count: usize,
    data_byte_count: usize,
    storage: Storage,
    plugin_name: String,
    tags: Tags,
}

impl ImageBuffer {
    /// Allocates a zeroed buffer for `info`.
    pub fn new(info: ImageInfo) -> Result<Self> {
        check_info(&info)?;
        let len = info.data_byte_count();
        Ok(Self::with_storage(info, Storage::Owned(vec![0; len])))
    }

    /// Wraps decoded bytes; `bytes.len()` must equal `info.data_byte_count()`.
    pub fn from_bytes(info: ImageInfo, bytes: Vec<u8>) -> Result<Self> {
        check_info(&info)?;
        let expected = info.data_byte_count();
        if bytes.len() != expected {
            return Err(PixelAtlasError::ByteCountMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self::with_storage(info, Storage::Owned(bytes)))
    }

    /// Maps `info.data_byte_count()` bytes of `file` starting at `offset`.
    ///
    /// The mapping is read-only; mutable access copies it first (see
    /// [`detach`](Self::detach)).
    pub fn map(info: ImageInfo, file: Arc<File>, offset: u64) -> Result<Self> {
        check_info(&info)?;
        let len = info.data_byte_count();
        let file_len = file.metadata()?.len();
        if file_len < offset + len as u64 {
            return Err(PixelAtlasError::ByteCountMismatch {
                expected: (offset + len as u64) as usize,
                actual: file_len as usize,
            });
        }
        // SAFETY: the mapping is never written through, and the file handle
        // is kept alive alongside it. Truncating the file underneath the view
        // is the caller's responsibility, as documented on `Storage::Mapped`.
        let map = unsafe { MmapOptions::new().offset(offset).len(len).map(&*file)? };
        debug!(offset, len, "mapped image data");
        Ok(Self::with_storage(info, Storage::Mapped { _file: file, map }))
    }

    fn with_storage(info: ImageInfo, storage: Storage) -> Self {
        Self {
            uid: Uid::next(),
            pixel_byte_count: info.pixel_byte_count(),
            scanline_byte_count: info.scanline_byte_count(),
            data_byte_count: info.data_byte_count(),
            info,
            storage,
            plugin_name: String::new(),
            tags: Tags::new(),
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    /// Renaming never touches the pixel storage or the uid.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.info.name = name.into();
    }

    pub fn size(&self) -> Size {
        self.info.size
    }

    pub fn width(&self) -> u16 {
        self.info.size.w
    }

    pub fn height(&self) -> u16 {
        self.info.size.h
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.info.aspect_ratio()
    }

    pub fn format(&self) -> PixelFormat {
        self.info.format
    }

    pub fn gl_format(&self) -> GlEnum {
        self.info.gl_format()
    }

    pub fn gl_type(&self) -> GlEnum {
        self.info.gl_type()
    }

    pub fn layout(&self) -> &Layout {
        &self.info.layout
    }

    pub fn is_valid(&self) -> bool {
        self.info.is_valid()
    }

    pub fn pixel_byte_count(&self) -> usize {
        self.pixel_byte_count
    }

    pub fn scanline_byte_count(&self) -> usize {
        self.scanline_byte_count
    }

    pub fn data_byte_count(&self) -> usize {
        self.data_byte_count
    }

    /// Decoder that produced this image; empty when built in memory.
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn set_plugin_name(&mut self, name: impl Into<String>) {
        self.plugin_name = name.into();
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn set_tags(&mut self, tags: Tags) {
        self.tags = tags;
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Inserts or replaces one tag.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.storage, Storage::Mapped { .. })
    }

    pub fn data(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(bytes) => bytes,
            Storage::Mapped { map, .. } => map,
        }
    }

    /// Scanline `y`, alignment padding included. Panics when `y` is out of
    /// range.
    pub fn row(&self, y: u16) -> &[u8] {
        let start = self.scanline_byte_count * y as usize;
        &self.data()[start..start + self.scanline_byte_count]
    }

    /// Bytes of the pixel at (`x`, `y`). Panics when out of range.
    pub fn pixel(&self, x: u16, y: u16) -> &[u8] {
        let start = self.scanline_byte_count * y as usize + self.pixel_byte_count * x as usize;
        &self.data()[start..start + self.pixel_byte_count]
    }

    /// Mutable bytes. A mapped buffer is detached first.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.detach();
        match &mut self.storage {
            Storage::Owned(bytes) => bytes,
            // detach() never leaves a mapping behind
            Storage::Mapped { .. } => &mut [],
        }
    }

    pub fn row_mut(&mut self, y: u16) -> &mut [u8] {
        let start = self.scanline_byte_count * y as usize;
        let len = self.scanline_byte_count;
        &mut self.data_mut()[start..start + len]
    }

    pub fn pixel_mut(&mut self, x: u16, y: u16) -> &mut [u8] {
        let start = self.scanline_byte_count * y as usize + self.pixel_byte_count * x as usize;
        let len = self.pixel_byte_count;
        &mut self.data_mut()[start..start + len]
    }

    /// Sets every byte to zero.
    pub fn zero(&mut self) {
        self.data_mut().fill(0);
    }

    /// Sets every pixel to `color`, converted to this buffer's format.
    /// Alignment padding is left alone.
    pub fn fill(&mut self, color: &Color) -> Result<()> {
        let px = color.convert(self.format())?;
        let px = px.data();
        let row_len = self.width() as usize * self.pixel_byte_count;
        for y in 0..self.height() {
            for dst in self.row_mut(y)[..row_len].chunks_exact_mut(px.len()) {
                dst.copy_from_slice(px);
            }
        }
        Ok(())
    }

    /// Replaces a mapped view with a private copy, releasing the file.
    /// No-op for owned buffers.
    pub fn detach(&mut self) {
        if let Storage::Mapped { map, .. } = &self.storage {
            let bytes = map.to_vec();
            debug!(uid = %self.uid, len = bytes.len(), "detached mapped image data");
            self.storage = Storage::Owned(bytes);
        }
    }

    /// Returns a copy of this image in `format`.
    ///
    /// The copy keeps the row alignment, plugin name and tags, uses native
    /// byte order and gets a fresh [`Uid`].
    pub fn convert(&self, format: PixelFormat) -> Result<ImageBuffer> {
        self.convert_with_layout(format, self.info.layout.with_endian(Endian::native()))
    }

    /// Returns a copy of this image in `format`, laid out as `layout`.
    ///
    /// Rows are converted one at a time, so source and destination alignment
    /// may differ. A source without alpha yields an opaque destination.
    /// Non-native source byte order is swapped before conversion and
    /// non-native destination byte order after it.
    #[instrument(skip_all, fields(uid = %self.uid, from = %self.info.format, to = %format))]
    pub fn convert_with_layout(&self, format: PixelFormat, layout: Layout) -> Result<ImageBuffer> {
        let mut info = self.info.clone();
        info.format = format;
        info.layout = layout;
        let mut out = ImageBuffer::new(info)?;
        out.plugin_name = self.plugin_name.clone();
        out.tags = self.tags.clone();
        if format.has_alpha() && !self.format().has_alpha() {
            out.fill(&Color::rgba_f32(0.0, 0.0, 0.0, 1.0))?;
        }

        let width = self.width() as usize;
        let src_len = width * self.pixel_byte_count;
        let dst_len = width * out.pixel_byte_count;
        let src_swap = !self.info.layout.endian.is_native();
        let dst_swap = !layout.endian.is_native();
        let src_word = self.format().channel_type().swap_size();
        let dst_word = format.channel_type().swap_size();
        let mut scratch = if src_swap { vec![0u8; src_len] } else { Vec::new() };

        for y in 0..self.height() {
            let row = &self.row(y)[..src_len];
            let src = if src_swap {
                memory::swap_copy(row, &mut scratch, src_word);
                &scratch[..]
            } else {
                row
            };
            let dst = &mut out.row_mut(y)[..dst_len];
            convert::convert(src, self.format(), dst, format, width)?;
            if dst_swap {
                memory::swap_in_place(dst, dst_word);
            }
        }
        Ok(out)
    }
}

fn check_info(info: &ImageInfo) -> Result<()> {
    if info.is_valid() {
        Ok(())
    } else {
        Err(PixelAtlasError::Allocation {
            width: info.size.w,
            height: info.size.h,
            format: info.format,
            alignment: info.layout.alignment,
        })
    }
}

impl PartialEq for ImageBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info && self.data() == other.data()
    }
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("uid", &self.uid)
            .field("info", &self.info)
            .field("plugin_name", &self.plugin_name)
            .field("tags", &self.tags)
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

#[cfg(feature = "image")]
mod dynamic {
    use super::*;
    use crate::image_data::NAME_DEFAULT;
    use image::{DynamicImage, ImageReader, RgbaImage};
    use std::path::Path;

    fn ne_bytes<T: Copy, const N: usize>(samples: &[T], to_bytes: fn(T) -> [u8; N]) -> Vec<u8> {
        samples.iter().flat_map(|v| to_bytes(*v)).collect()
    }

    impl ImageBuffer {
        /// Wraps a decoded [`DynamicImage`], keeping its channel layout and
        /// sample type where a matching [`PixelFormat`] exists.
        pub fn from_dynamic_image(name: &str, img: &DynamicImage) -> Result<Self> {
            let (w, h) = (img.width(), img.height());
            let size = match (u16::try_from(w), u16::try_from(h)) {
                (Ok(w), Ok(h)) => Size::new(w, h),
                _ => return Err(PixelAtlasError::TooLarge { width: w, height: h }),
            };
            let (format, bytes) = match img {
                DynamicImage::ImageLuma8(i) => (PixelFormat::LU8, i.as_raw().clone()),
                DynamicImage::ImageLumaA8(i) => (PixelFormat::LaU8, i.as_raw().clone()),
                DynamicImage::ImageRgb8(i) => (PixelFormat::RgbU8, i.as_raw().clone()),
                DynamicImage::ImageRgba8(i) => (PixelFormat::RgbaU8, i.as_raw().clone()),
                DynamicImage::ImageLuma16(i) => (PixelFormat::LU16, ne_bytes(i.as_raw(), u16::to_ne_bytes)),
                DynamicImage::ImageLumaA16(i) => (PixelFormat::LaU16, ne_bytes(i.as_raw(), u16::to_ne_bytes)),
                DynamicImage::ImageRgb16(i) => (PixelFormat::RgbU16, ne_bytes(i.as_raw(), u16::to_ne_bytes)),
                DynamicImage::ImageRgba16(i) => (PixelFormat::RgbaU16, ne_bytes(i.as_raw(), u16::to_ne_bytes)),
                DynamicImage::ImageRgb32F(i) => (PixelFormat::RgbF32, ne_bytes(i.as_raw(), f32::to_ne_bytes)),
                DynamicImage::ImageRgba32F(i) => (PixelFormat::RgbaF32, ne_bytes(i.as_raw(), f32::to_ne_bytes)),
                other => (PixelFormat::RgbaU8, other.to_rgba8().into_raw()),
            };
            let info = ImageInfo::new(size, format).with_name(name);
            let mut buf = Self::from_bytes(info, bytes)?;
            buf.set_tag(TAG_COLOR_TYPE, format!("{:?}", img.color()));
            Ok(buf)
        }

        /// Decodes the file at `path`, guessing the codec from its contents.
        ///
        /// The image is named after the file stem and the plugin name is the
        /// lowercase codec name (`png`, `jpeg`, ...).
        pub fn open(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            let reader = ImageReader::open(path)?.with_guessed_format()?;
            let codec = reader.format();
            let img = reader.decode()?;
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(NAME_DEFAULT);
            let mut buf = Self::from_dynamic_image(name, &img)?;
            if let Some(codec) = codec {
                buf.set_plugin_name(format!("{codec:?}").to_ascii_lowercase());
            }
            debug!(path = %path.display(), plugin = buf.plugin_name(), "decoded image");
            Ok(buf)
        }

        /// Tightly packed 8-bit RGBA copy, e.g. for writing PNG pages.
        pub fn to_rgba_image(&self) -> Result<RgbaImage> {
            let converted;
            let src = if self.format() == PixelFormat::RgbaU8 && self.layout().endian.is_native() {
                self
            } else {
                converted = self.convert(PixelFormat::RgbaU8)?;
                &converted
            };
            let row_len = src.width() as usize * 4;
            let mut bytes = Vec::with_capacity(row_len * src.height() as usize);
            for y in 0..src.height() {
                bytes.extend_from_slice(&src.row(y)[..row_len]);
            }
            let actual = bytes.len();
            let (w, h) = (u32::from(src.width()), u32::from(src.height()));
            RgbaImage::from_raw(w, h, bytes).ok_or(PixelAtlasError::ByteCountMismatch {
                expected: w as usize * h as usize * 4,
                actual,
            })
        }
    }
}
