//! JSON helpers for [`Size`].
//!
//! Both dimensions travel as strings: `{"w": "1920", "h": "1080"}`.

use crate::error::{PixelAtlasError, Result};
use crate::image_data::Size;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Serde shape of [`Size`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SizeRepr {
    w: String,
    h: String,
}

impl From<Size> for SizeRepr {
    fn from(size: Size) -> Self {
        Self {
            w: size.w.to_string(),
            h: size.h.to_string(),
        }
    }
}

impl TryFrom<SizeRepr> for Size {
    type Error = PixelAtlasError;

    fn try_from(repr: SizeRepr) -> Result<Self> {
        Ok(Size::new(parse_dim("w", &repr.w)?, parse_dim("h", &repr.h)?))
    }
}

fn parse_dim(field: &str, text: &str) -> Result<u16> {
    text.trim()
        .parse::<u16>()
        .map_err(|e| PixelAtlasError::Parse(format!("size field {field:?}: {text:?}: {e}")))
}

pub fn size_to_json(size: &Size) -> Value {
    json!({ "w": size.w.to_string(), "h": size.h.to_string() })
}

pub fn size_from_json(value: &Value) -> Result<Size> {
    let obj = value
        .as_object()
        .ok_or_else(|| PixelAtlasError::Parse("size: expected a JSON object".into()))?;
    let field = |name: &str| -> Result<u16> {
        let text = obj
            .get(name)
            .ok_or_else(|| PixelAtlasError::Parse(format!("size: missing field {name:?}")))?
            .as_str()
            .ok_or_else(|| PixelAtlasError::Parse(format!("size: field {name:?} is not a string")))?;
        parse_dim(name, text)
    };
    Ok(Size::new(field("w")?, field("h")?))
}
