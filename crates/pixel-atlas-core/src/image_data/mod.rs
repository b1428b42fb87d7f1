//! Image metadata and pixel buffers.

mod buffer;
mod info;
mod uid;

pub use buffer::{ImageBuffer, TAG_COLOR_TYPE, Tags};
pub use info::{ImageInfo, Layout, Mirror, NAME_DEFAULT, Size};
pub use uid::Uid;
