use crate::error::Result;
use crate::json::size_to_json;
use crate::image_data::Size;
use crate::model::AtlasLayout;
use serde_json::{json, Value};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Serialize an [`AtlasLayout`] as `{ pages, frames, meta }`.
///
/// `frames` is keyed by tile name so engines can look tiles up directly;
/// names that appear twice get the uid appended. `pages` lists the tile
/// names per page.
pub fn to_json_layout(layout: &AtlasLayout) -> Result<Value> {
    let mut frames = serde_json::Map::new();
    let mut pages: Vec<Vec<String>> = vec![Vec::new(); layout.texture_count as usize];
    for e in &layout.items {
        let key = if frames.contains_key(&e.name) {
            format!("{}#{}", e.name, e.uid)
        } else {
            e.name.clone()
        };
        frames.insert(
            key.clone(),
            json!({
                "uid": e.uid,
                "frame": {"x": e.frame.x, "y": e.frame.y, "w": e.frame.w, "h": e.frame.h},
                "page": e.item.texture_index,
                "u": [e.item.texture_u.min, e.item.texture_u.max],
                "v": [e.item.texture_v.min, e.item.texture_v.max],
            }),
        );
        if let Some(page) = pages.get_mut(e.item.texture_index as usize) {
            page.push(key);
        }
    }
    let pages_val: Vec<Value> = pages
        .into_iter()
        .enumerate()
        .map(|(id, names)| json!({"id": id, "frames": names}))
        .collect();
    let size = Size::new(layout.texture_size, layout.texture_size);
    Ok(json!({
        "pages": pages_val,
        "frames": frames,
        "meta": {
            "app": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "size": size_to_json(&size),
            "format": serde_json::to_value(layout.format)?,
            "filter": serde_json::to_value(layout.filter)?,
            "border": layout.border,
            "percentageUsed": layout.percentage_used,
        },
    }))
}

/// Write [`to_json_layout`] output, pretty-printed, to `path`.
pub fn write_json_layout(path: impl AsRef<Path>, layout: &AtlasLayout) -> Result<()> {
    let value = to_json_layout(layout)?;
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &value)?;
    Ok(())
}
