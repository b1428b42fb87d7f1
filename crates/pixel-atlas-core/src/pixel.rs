//! Pixel formats and their static properties.
//!
//! Every property is a lookup into a table indexed by the format ordinal.
//! The tables are typed `[_; PixelFormat::COUNT]`, so adding a format without
//! extending every table is a compile error.

use crate::error::{PixelAtlasError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Opaque GL-style enumerant passed through to the renderer.
pub type GlEnum = u32;

/// GL-style format/type identifiers. The core never interprets them.
pub mod gl {
    use super::GlEnum;

    pub const NONE: GlEnum = 0;
    pub const RED: GlEnum = 0x1903;
    pub const RG: GlEnum = 0x8227;
    pub const RGB: GlEnum = 0x1907;
    pub const RGBA: GlEnum = 0x1908;

    pub const UNSIGNED_BYTE: GlEnum = 0x1401;
    pub const UNSIGNED_SHORT: GlEnum = 0x1403;
    pub const UNSIGNED_INT: GlEnum = 0x1405;
    pub const FLOAT: GlEnum = 0x1406;
    pub const HALF_FLOAT: GlEnum = 0x140B;
    pub const UNSIGNED_INT_10_10_10_2: GlEnum = 0x8036;
}

/// Numeric representation of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    None,
    U8,
    U10,
    U16,
    U32,
    F16,
    F32,
}

impl ChannelType {
    pub const fn bit_depth(self) -> usize {
        match self {
            Self::None => 0,
            Self::U8 => 8,
            Self::U10 => 10,
            Self::U16 | Self::F16 => 16,
            Self::U32 | Self::F32 => 32,
        }
    }

    /// Storage size of one unpacked channel. `U10` only exists packed, so it
    /// reports zero.
    pub const fn byte_size(self) -> usize {
        match self {
            Self::None | Self::U10 => 0,
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }

    /// Unit that byte swapping operates on; packed `U10` swaps the whole word.
    pub const fn swap_size(self) -> usize {
        match self {
            Self::U10 => 4,
            _ => self.byte_size(),
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    /// Largest integer code (`2^n - 1`); float channels are normalized to 1.
    pub const fn max_value(self) -> u32 {
        match self {
            Self::None => 0,
            Self::U8 => u8::MAX as u32,
            Self::U10 => 1023,
            Self::U16 => u16::MAX as u32,
            Self::U32 => u32::MAX,
            Self::F16 | Self::F32 => 1,
        }
    }
}

/// Closed set of supported pixel encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum PixelFormat {
    #[default]
    None,

    LU8,
    LU16,
    LU32,
    LF16,
    LF32,

    LaU8,
    LaU16,
    LaU32,
    LaF16,
    LaF32,

    RgbU8,
    RgbU10,
    RgbU16,
    RgbU32,
    RgbF16,
    RgbF32,

    RgbaU8,
    RgbaU16,
    RgbaU32,
    RgbaF16,
    RgbaF32,
}

use PixelFormat as P;

const COUNT: usize = 22;

const ALL: [PixelFormat; COUNT] = [
    P::None,
    P::LU8,
    P::LU16,
    P::LU32,
    P::LF16,
    P::LF32,
    P::LaU8,
    P::LaU16,
    P::LaU32,
    P::LaF16,
    P::LaF32,
    P::RgbU8,
    P::RgbU10,
    P::RgbU16,
    P::RgbU32,
    P::RgbF16,
    P::RgbF32,
    P::RgbaU8,
    P::RgbaU16,
    P::RgbaU32,
    P::RgbaF16,
    P::RgbaF32,
];

// Table order must follow declaration order.
const _: () = {
    let mut i = 0;
    while i < COUNT {
        assert!(ALL[i] as usize == i);
        i += 1;
    }
};

const NAMES: [&str; COUNT] = [
    "None", "L_U8", "L_U16", "L_U32", "L_F16", "L_F32", "LA_U8", "LA_U16", "LA_U32", "LA_F16",
    "LA_F32", "RGB_U8", "RGB_U10", "RGB_U16", "RGB_U32", "RGB_F16", "RGB_F32", "RGBA_U8",
    "RGBA_U16", "RGBA_U32", "RGBA_F16", "RGBA_F32",
];

#[rustfmt::skip]
const CHANNEL_COUNT: [u8; COUNT] = [
    0,
    1, 1, 1, 1, 1,
    2, 2, 2, 2, 2,
    3, 3, 3, 3, 3, 3,
    4, 4, 4, 4, 4,
];

#[rustfmt::skip]
const BIT_DEPTH: [u8; COUNT] = [
    0,
    8, 16, 32, 16, 32,
    8, 16, 32, 16, 32,
    8, 10, 16, 32, 16, 32,
    8, 16, 32, 16, 32,
];

#[rustfmt::skip]
const BYTE_COUNT: [u8; COUNT] = [
    0,
    1, 2, 4, 2, 4,
    2, 4, 8, 4, 8,
    3, 4, 6, 12, 6, 12,
    4, 8, 16, 8, 16,
];

#[rustfmt::skip]
const CHANNEL_TYPE: [ChannelType; COUNT] = {
    use ChannelType as C;
    [
        C::None,
        C::U8, C::U16, C::U32, C::F16, C::F32,
        C::U8, C::U16, C::U32, C::F16, C::F32,
        C::U8, C::U10, C::U16, C::U32, C::F16, C::F32,
        C::U8, C::U16, C::U32, C::F16, C::F32,
    ]
};

#[rustfmt::skip]
const GL_FORMAT: [GlEnum; COUNT] = [
    gl::NONE,
    gl::RED, gl::RED, gl::RED, gl::RED, gl::RED,
    gl::RG, gl::RG, gl::RG, gl::RG, gl::RG,
    // Packed 10-bit RGB is uploaded as a four component word.
    gl::RGB, gl::RGBA, gl::RGB, gl::RGB, gl::RGB, gl::RGB,
    gl::RGBA, gl::RGBA, gl::RGBA, gl::RGBA, gl::RGBA,
];

#[rustfmt::skip]
const GL_TYPE: [GlEnum; COUNT] = [
    gl::NONE,
    gl::UNSIGNED_BYTE, gl::UNSIGNED_SHORT, gl::UNSIGNED_INT, gl::HALF_FLOAT, gl::FLOAT,
    gl::UNSIGNED_BYTE, gl::UNSIGNED_SHORT, gl::UNSIGNED_INT, gl::HALF_FLOAT, gl::FLOAT,
    gl::UNSIGNED_BYTE, gl::UNSIGNED_INT_10_10_10_2, gl::UNSIGNED_SHORT, gl::UNSIGNED_INT,
    gl::HALF_FLOAT, gl::FLOAT,
    gl::UNSIGNED_BYTE, gl::UNSIGNED_SHORT, gl::UNSIGNED_INT, gl::HALF_FLOAT, gl::FLOAT,
];

impl PixelFormat {
    /// Number of formats, `None` included.
    pub const COUNT: usize = COUNT;
    /// Every format in ordinal order.
    pub const ALL: [PixelFormat; COUNT] = ALL;

    pub const fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Result<Self> {
        ALL.get(ordinal).copied().ok_or_else(|| {
            PixelAtlasError::FormatMismatch(format!(
                "pixel format ordinal {ordinal} out of range (count {COUNT})"
            ))
        })
    }

    pub const fn name(self) -> &'static str {
        NAMES[self as usize]
    }

    pub const fn channel_count(self) -> usize {
        CHANNEL_COUNT[self as usize] as usize
    }

    pub const fn bit_depth(self) -> usize {
        BIT_DEPTH[self as usize] as usize
    }

    /// Bytes per pixel.
    pub const fn byte_count(self) -> usize {
        BYTE_COUNT[self as usize] as usize
    }

    pub const fn channel_type(self) -> ChannelType {
        CHANNEL_TYPE[self as usize]
    }

    pub const fn gl_format(self) -> GlEnum {
        GL_FORMAT[self as usize]
    }

    pub const fn gl_type(self) -> GlEnum {
        GL_TYPE[self as usize]
    }

    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self.channel_count(), 2 | 4)
    }

    /// True for the one and two channel (luminance) formats.
    pub const fn is_luminance(self) -> bool {
        matches!(self.channel_count(), 1 | 2)
    }

    pub const fn is_float(self) -> bool {
        self.channel_type().is_float()
    }

    /// Integer format with the given channel count and bit depth, or `None`
    /// when the combination has no representation.
    pub const fn integer(channels: usize, bit_depth: usize) -> Self {
        match (channels, bit_depth) {
            (1, 8) => Self::LU8,
            (1, 16) => Self::LU16,
            (1, 32) => Self::LU32,
            (2, 8) => Self::LaU8,
            (2, 16) => Self::LaU16,
            (2, 32) => Self::LaU32,
            (3, 8) => Self::RgbU8,
            (3, 10) => Self::RgbU10,
            (3, 16) => Self::RgbU16,
            (3, 32) => Self::RgbU32,
            (4, 8) => Self::RgbaU8,
            (4, 16) => Self::RgbaU16,
            (4, 32) => Self::RgbaU32,
            _ => Self::None,
        }
    }

    /// Float format with the given channel count and bit depth, or `None`.
    pub const fn float(channels: usize, bit_depth: usize) -> Self {
        match (channels, bit_depth) {
            (1, 16) => Self::LF16,
            (1, 32) => Self::LF32,
            (2, 16) => Self::LaF16,
            (2, 32) => Self::LaF32,
            (3, 16) => Self::RgbF16,
            (3, 32) => Self::RgbF32,
            (4, 16) => Self::RgbaF16,
            (4, 32) => Self::RgbaF32,
            _ => Self::None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = PixelAtlasError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ALL.iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PixelAtlasError::Parse(format!("unknown pixel format: {wanted}")))
    }
}

impl Serialize for PixelFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for PixelFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One `RGB_U10` pixel: three 10-bit channels packed in a 32-bit word.
///
/// Bit layout of the native-endian word: red 22..32, green 12..22,
/// blue 2..12, two pad bits at the bottom. Padding is ignored by equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U10Packed {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl U10Packed {
    const MASK: u32 = 0x3ff;

    pub const fn new(r: u16, g: u16, b: u16) -> Self {
        Self { r, g, b }
    }

    pub const fn from_word(word: u32) -> Self {
        Self {
            r: ((word >> 22) & Self::MASK) as u16,
            g: ((word >> 12) & Self::MASK) as u16,
            b: ((word >> 2) & Self::MASK) as u16,
        }
    }

    pub const fn to_word(self) -> u32 {
        ((self.r as u32 & Self::MASK) << 22)
            | ((self.g as u32 & Self::MASK) << 12)
            | ((self.b as u32 & Self::MASK) << 2)
    }

    /// Reads a native-endian word from the first four bytes.
    #[inline]
    pub fn read(bytes: &[u8]) -> Self {
        Self::from_word(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    #[inline]
    pub fn write(self, bytes: &mut [u8]) {
        bytes[..4].copy_from_slice(&self.to_word().to_ne_bytes());
    }

    #[inline]
    pub fn channel(self, index: usize) -> u16 {
        match index {
            0 => self.r,
            1 => self.g,
            _ => self.b,
        }
    }

    #[inline]
    pub fn set_channel(&mut self, index: usize, value: u16) {
        match index {
            0 => self.r = value,
            1 => self.g = value,
            _ => self.b = value,
        }
    }
}
