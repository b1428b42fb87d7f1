//! Byte order helpers for multi-byte samples.

use crate::error::{PixelAtlasError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Byte order of multi-byte samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    /// Most significant byte first (big endian).
    Msb,
    /// Least significant byte first (little endian).
    Lsb,
}

impl Endian {
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Msb
        } else {
            Self::Lsb
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::Msb => Self::Lsb,
            Self::Lsb => Self::Msb,
        }
    }

    pub const fn is_native(self) -> bool {
        matches!(
            (self, Self::native()),
            (Self::Msb, Self::Msb) | (Self::Lsb, Self::Lsb)
        )
    }
}

impl Default for Endian {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Msb => "msb",
            Self::Lsb => "lsb",
        })
    }
}

impl FromStr for Endian {
    type Err = PixelAtlasError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "msb" | "big" => Ok(Self::Msb),
            "lsb" | "little" => Ok(Self::Lsb),
            other => Err(PixelAtlasError::Parse(format!("unknown endian: {other}"))),
        }
    }
}

/// Reverses the byte order of every `word_size` word in `data`.
///
/// Only word sizes 2, 4 and 8 are swapped; any other size leaves the data
/// untouched. A trailing partial word is ignored.
pub fn swap_in_place(data: &mut [u8], word_size: usize) {
    if matches!(word_size, 2 | 4 | 8) {
        for word in data.chunks_exact_mut(word_size) {
            word.reverse();
        }
    }
}

/// Copies `src` into `dst` reversing the byte order of each word.
///
/// Word sizes other than 2, 4 and 8 are copied verbatim. Copies
/// `min(src.len(), dst.len())` bytes rounded down to whole words.
pub fn swap_copy(src: &[u8], dst: &mut [u8], word_size: usize) {
    let len = src.len().min(dst.len());
    if !matches!(word_size, 2 | 4 | 8) {
        dst[..len].copy_from_slice(&src[..len]);
        return;
    }
    for (s, d) in src[..len]
        .chunks_exact(word_size)
        .zip(dst[..len].chunks_exact_mut(word_size))
    {
        for (i, b) in d.iter_mut().enumerate() {
            *b = s[word_size - 1 - i];
        }
    }
}
