//! Any-to-any pixel conversion.
//!
//! The per-component functions define the numeric rules between the six
//! channel representations:
//! - integer widening shifts left (low bits zero), narrowing shifts right;
//! - integer to float divides by the integer maximum;
//! - float to integer scales by the maximum, rounds, and clamps;
//! - float to float goes through [`half::f16`].
//!
//! 10-bit values travel in a `u16` holding the low 10 bits.
//!
//! [`convert`] applies those rules to whole pixel runs. The channel type
//! pair is resolved once per call, so the inner loop is monomorphic.

use crate::error::{PixelAtlasError, Result};
use crate::pixel::{ChannelType, PixelFormat, U10Packed};
use half::f16;

pub const U10_MAX: u16 = 1023;

#[inline]
fn unit_to_int(v: f32, max: f64) -> f64 {
    // NaN survives clamp and then casts to zero.
    (v as f64 * max).round().clamp(0.0, max)
}

#[inline]
pub fn u8_to_u8(v: u8) -> u8 {
    v
}
#[inline]
pub fn u8_to_u10(v: u8) -> u16 {
    (v as u16) << 2
}
#[inline]
pub fn u8_to_u16(v: u8) -> u16 {
    (v as u16) << 8
}
#[inline]
pub fn u8_to_u32(v: u8) -> u32 {
    (v as u32) << 24
}
#[inline]
pub fn u8_to_f16(v: u8) -> f16 {
    f16::from_f32(u8_to_f32(v))
}
#[inline]
pub fn u8_to_f32(v: u8) -> f32 {
    v as f32 / u8::MAX as f32
}

#[inline]
pub fn u10_to_u8(v: u16) -> u8 {
    ((v & U10_MAX) >> 2) as u8
}
#[inline]
pub fn u10_to_u10(v: u16) -> u16 {
    v
}
#[inline]
pub fn u10_to_u16(v: u16) -> u16 {
    (v & U10_MAX) << 6
}
#[inline]
pub fn u10_to_u32(v: u16) -> u32 {
    ((v & U10_MAX) as u32) << 22
}
#[inline]
pub fn u10_to_f16(v: u16) -> f16 {
    f16::from_f32(u10_to_f32(v))
}
#[inline]
pub fn u10_to_f32(v: u16) -> f32 {
    v as f32 / U10_MAX as f32
}

#[inline]
pub fn u16_to_u8(v: u16) -> u8 {
    (v >> 8) as u8
}
#[inline]
pub fn u16_to_u10(v: u16) -> u16 {
    v >> 6
}
#[inline]
pub fn u16_to_u16(v: u16) -> u16 {
    v
}
#[inline]
pub fn u16_to_u32(v: u16) -> u32 {
    (v as u32) << 16
}
#[inline]
pub fn u16_to_f16(v: u16) -> f16 {
    f16::from_f32(u16_to_f32(v))
}
#[inline]
pub fn u16_to_f32(v: u16) -> f32 {
    v as f32 / u16::MAX as f32
}

#[inline]
pub fn u32_to_u8(v: u32) -> u8 {
    (v >> 24) as u8
}
#[inline]
pub fn u32_to_u10(v: u32) -> u16 {
    (v >> 22) as u16
}
#[inline]
pub fn u32_to_u16(v: u32) -> u16 {
    (v >> 16) as u16
}
#[inline]
pub fn u32_to_u32(v: u32) -> u32 {
    v
}
#[inline]
pub fn u32_to_f16(v: u32) -> f16 {
    f16::from_f32(u32_to_f32(v))
}
#[inline]
pub fn u32_to_f32(v: u32) -> f32 {
    (v as f64 / u32::MAX as f64) as f32
}

#[inline]
pub fn f16_to_u8(v: f16) -> u8 {
    f32_to_u8(v.to_f32())
}
#[inline]
pub fn f16_to_u10(v: f16) -> u16 {
    f32_to_u10(v.to_f32())
}
#[inline]
pub fn f16_to_u16(v: f16) -> u16 {
    f32_to_u16(v.to_f32())
}
#[inline]
pub fn f16_to_u32(v: f16) -> u32 {
    f32_to_u32(v.to_f32())
}
#[inline]
pub fn f16_to_f16(v: f16) -> f16 {
    v
}
#[inline]
pub fn f16_to_f32(v: f16) -> f32 {
    v.to_f32()
}

#[inline]
pub fn f32_to_u8(v: f32) -> u8 {
    unit_to_int(v, u8::MAX as f64) as u8
}
#[inline]
pub fn f32_to_u10(v: f32) -> u16 {
    unit_to_int(v, U10_MAX as f64) as u16
}
#[inline]
pub fn f32_to_u16(v: f32) -> u16 {
    unit_to_int(v, u16::MAX as f64) as u16
}
#[inline]
pub fn f32_to_u32(v: f32) -> u32 {
    unit_to_int(v, u32::MAX as f64) as u32
}
#[inline]
pub fn f32_to_f16(v: f32) -> f16 {
    f16::from_f32(v)
}
#[inline]
pub fn f32_to_f32(v: f32) -> f32 {
    v
}

/// A 10-bit channel value; distinct from `u16` so dispatch can tell them apart.
#[derive(Debug, Clone, Copy)]
struct U10(u16);

/// Storage and normalization of one channel representation.
trait Channel: Copy {
    /// Reads channel `index` of a pixel.
    fn load(pixel: &[u8], index: usize) -> Self;
    fn store(self, pixel: &mut [u8], index: usize);
    fn to_f32(self) -> f32;
    fn from_f32(v: f32) -> Self;
}

trait ConvertTo<D> {
    fn convert(self) -> D;
}

macro_rules! channel_impl {
    ($t:ty, $size:expr, $to_f32:expr, $from_f32:expr) => {
        impl Channel for $t {
            #[inline]
            fn load(pixel: &[u8], index: usize) -> Self {
                let o = index * $size;
                let mut bytes = [0u8; $size];
                bytes.copy_from_slice(&pixel[o..o + $size]);
                <$t>::from_ne_bytes(bytes)
            }
            #[inline]
            fn store(self, pixel: &mut [u8], index: usize) {
                let o = index * $size;
                pixel[o..o + $size].copy_from_slice(&self.to_ne_bytes());
            }
            #[inline]
            fn to_f32(self) -> f32 {
                ($to_f32)(self)
            }
            #[inline]
            fn from_f32(v: f32) -> Self {
                ($from_f32)(v)
            }
        }
    };
}

channel_impl!(u8, 1, u8_to_f32, f32_to_u8);
channel_impl!(u16, 2, u16_to_f32, f32_to_u16);
channel_impl!(u32, 4, u32_to_f32, f32_to_u32);
channel_impl!(f16, 2, f16_to_f32, f32_to_f16);
channel_impl!(f32, 4, f32_to_f32, f32_to_f32);

impl Channel for U10 {
    #[inline]
    fn load(pixel: &[u8], index: usize) -> Self {
        U10(U10Packed::read(pixel).channel(index))
    }
    #[inline]
    fn store(self, pixel: &mut [u8], index: usize) {
        let mut word = U10Packed::read(pixel);
        word.set_channel(index, self.0);
        word.write(pixel);
    }
    #[inline]
    fn to_f32(self) -> f32 {
        u10_to_f32(self.0)
    }
    #[inline]
    fn from_f32(v: f32) -> Self {
        U10(f32_to_u10(v))
    }
}

macro_rules! convert_impl {
    ($($src:ty => $dst:ty, $f:expr;)*) => {
        $(
            impl ConvertTo<$dst> for $src {
                #[inline]
                fn convert(self) -> $dst {
                    ($f)(self)
                }
            }
        )*
    };
}

convert_impl! {
    u8 => u8, u8_to_u8;
    u8 => U10, |v| U10(u8_to_u10(v));
    u8 => u16, u8_to_u16;
    u8 => u32, u8_to_u32;
    u8 => f16, u8_to_f16;
    u8 => f32, u8_to_f32;

    U10 => u8, |v: U10| u10_to_u8(v.0);
    U10 => U10, |v: U10| U10(u10_to_u10(v.0));
    U10 => u16, |v: U10| u10_to_u16(v.0);
    U10 => u32, |v: U10| u10_to_u32(v.0);
    U10 => f16, |v: U10| u10_to_f16(v.0);
    U10 => f32, |v: U10| u10_to_f32(v.0);

    u16 => u8, u16_to_u8;
    u16 => U10, |v| U10(u16_to_u10(v));
    u16 => u16, u16_to_u16;
    u16 => u32, u16_to_u32;
    u16 => f16, u16_to_f16;
    u16 => f32, u16_to_f32;

    u32 => u8, u32_to_u8;
    u32 => U10, |v| U10(u32_to_u10(v));
    u32 => u16, u32_to_u16;
    u32 => u32, u32_to_u32;
    u32 => f16, u32_to_f16;
    u32 => f32, u32_to_f32;

    f16 => u8, f16_to_u8;
    f16 => U10, |v| U10(f16_to_u10(v));
    f16 => u16, f16_to_u16;
    f16 => u32, f16_to_u32;
    f16 => f16, f16_to_f16;
    f16 => f32, f16_to_f32;

    f32 => u8, f32_to_u8;
    f32 => U10, |v| U10(f32_to_u10(v));
    f32 => u16, f32_to_u16;
    f32 => u32, f32_to_u32;
    f32 => f16, f32_to_f16;
    f32 => f32, f32_to_f32;
}

/// A channel type that converts into every other channel type.
trait AnyChannel:
    Channel
    + ConvertTo<u8>
    + ConvertTo<U10>
    + ConvertTo<u16>
    + ConvertTo<u32>
    + ConvertTo<f16>
    + ConvertTo<f32>
{
}

impl<T> AnyChannel for T where
    T: Channel
        + ConvertTo<u8>
        + ConvertTo<U10>
        + ConvertTo<u16>
        + ConvertTo<u32>
        + ConvertTo<f16>
        + ConvertTo<f32>
{
}

/// Where a destination channel takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Channel(usize),
    /// Rec. 709 luma of the source R, G, B.
    Luma,
    /// Left as the destination buffer held it.
    Keep,
}

fn channel_map(src: PixelFormat, dst: PixelFormat) -> [Source; 4] {
    let sc = src.channel_count();
    let dc = dst.channel_count();
    let mut map = [Source::Keep; 4];
    match (src.is_luminance(), dst.is_luminance()) {
        (true, false) => {
            map[..3].fill(Source::Channel(0));
            if src.has_alpha() && dst.has_alpha() {
                map[3] = Source::Channel(1);
            }
        }
        (false, true) => {
            map[0] = Source::Luma;
            if src.has_alpha() && dst.has_alpha() {
                map[1] = Source::Channel(3);
            }
        }
        _ => {
            for (i, m) in map.iter_mut().enumerate().take(sc.min(dc)) {
                *m = Source::Channel(i);
            }
        }
    }
    map
}

struct Job<'a> {
    src: &'a [u8],
    src_stride: usize,
    dst: &'a mut [u8],
    dst_stride: usize,
    dst_channels: usize,
    count: usize,
    map: [Source; 4],
}

impl Job<'_> {
    fn run<S, D>(mut self) -> Result<()>
    where
        S: AnyChannel + ConvertTo<D>,
        D: Channel,
    {
        let map = &self.map[..self.dst_channels];
        let pixels = self
            .src
            .chunks_exact(self.src_stride)
            .zip(self.dst.chunks_exact_mut(self.dst_stride))
            .take(self.count);
        for (s, d) in pixels {
            for (i, source) in map.iter().enumerate() {
                match *source {
                    Source::Channel(c) => {
                        <S as ConvertTo<D>>::convert(S::load(s, c)).store(d, i);
                    }
                    Source::Luma => {
                        let r = S::load(s, 0).to_f32();
                        let g = S::load(s, 1).to_f32();
                        let b = S::load(s, 2).to_f32();
                        D::from_f32(0.2126 * r + 0.7152 * g + 0.0722 * b).store(d, i);
                    }
                    Source::Keep => {}
                }
            }
        }
        Ok(())
    }

    fn dispatch<S: AnyChannel>(self, dst: ChannelType) -> Result<()> {
        match dst {
            ChannelType::U8 => self.run::<S, u8>(),
            ChannelType::U10 => self.run::<S, U10>(),
            ChannelType::U16 => self.run::<S, u16>(),
            ChannelType::U32 => self.run::<S, u32>(),
            ChannelType::F16 => self.run::<S, f16>(),
            ChannelType::F32 => self.run::<S, f32>(),
            ChannelType::None => Err(none_format()),
        }
    }
}

fn none_format() -> PixelAtlasError {
    PixelAtlasError::FormatMismatch("cannot convert to or from PixelFormat::None".into())
}

/// Converts `count` pixels from `src` (in `src_format`) into `dst` (in
/// `dst_format`).
///
/// Both buffers are tightly packed native-endian pixels. Destination channels
/// that have no source counterpart (alpha when the source has none) keep the
/// bytes `dst` already held.
///
/// Fails only on a `None` format or a buffer shorter than `count` pixels; the
/// per-pixel work itself cannot fail.
pub fn convert(
    src: &[u8],
    src_format: PixelFormat,
    dst: &mut [u8],
    dst_format: PixelFormat,
    count: usize,
) -> Result<()> {
    if src_format.is_none() || dst_format.is_none() {
        return Err(none_format());
    }
    let src_len = count * src_format.byte_count();
    let dst_len = count * dst_format.byte_count();
    if src.len() < src_len {
        return Err(PixelAtlasError::ByteCountMismatch {
            expected: src_len,
            actual: src.len(),
        });
    }
    if dst.len() < dst_len {
        return Err(PixelAtlasError::ByteCountMismatch {
            expected: dst_len,
            actual: dst.len(),
        });
    }
    if src_format == dst_format {
        dst[..dst_len].copy_from_slice(&src[..src_len]);
        return Ok(());
    }

    let job = Job {
        src: &src[..src_len],
        src_stride: src_format.byte_count(),
        dst: &mut dst[..dst_len],
        dst_stride: dst_format.byte_count(),
        dst_channels: dst_format.channel_count(),
        count,
        map: channel_map(src_format, dst_format),
    };
    let dst_type = dst_format.channel_type();
    match src_format.channel_type() {
        ChannelType::U8 => job.dispatch::<u8>(dst_type),
        ChannelType::U10 => job.dispatch::<U10>(dst_type),
        ChannelType::U16 => job.dispatch::<u16>(dst_type),
        ChannelType::U32 => job.dispatch::<u32>(dst_type),
        ChannelType::F16 => job.dispatch::<f16>(dst_type),
        ChannelType::F32 => job.dispatch::<f32>(dst_type),
        ChannelType::None => Err(none_format()),
    }
}
