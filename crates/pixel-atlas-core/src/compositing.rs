use crate::error::Result;
use crate::image_data::ImageBuffer;
use crate::model::Rect;

/// Copy all of `src` into `page` with its top-left at (dx, dy), converting to
/// the page format if needed, then extrude the outermost content pixels
/// `extrude` pixels outward (edges and corners).
///
/// The caller guarantees that the content plus extrusion lies inside the page.
pub fn blit_extruded(
    src: &ImageBuffer,
    page: &mut ImageBuffer,
    dx: u32,
    dy: u32,
    extrude: u32,
) -> Result<()> {
    let converted;
    let src = if src.format() == page.format() && src.layout().endian.is_native() {
        src
    } else {
        converted = src.convert(page.format())?;
        &converted
    };

    let pbc = page.pixel_byte_count();
    let stride = page.scanline_byte_count();
    let (w, h) = (src.width() as usize, src.height() as usize);
    let (dx, dy, e) = (dx as usize, dy as usize, extrude as usize);
    let row_len = w * pbc;
    let data = page.data_mut();

    // main blit
    for y in 0..h {
        let start = (dy + y) * stride + dx * pbc;
        data[start..start + row_len].copy_from_slice(&src.row(y as u16)[..row_len]);
    }

    if e == 0 {
        return Ok(());
    }

    // left and right columns
    for y in dy..dy + h {
        let left = y * stride + dx * pbc;
        let right = left + (w - 1) * pbc;
        for k in 1..=e {
            data.copy_within(left..left + pbc, left - k * pbc);
            data.copy_within(right..right + pbc, right + k * pbc);
        }
    }

    // top and bottom rows, side extrusion included so corners are filled
    let span = (dx - e) * pbc..(dx + w + e) * pbc;
    let top = dy * stride;
    let bottom = (dy + h - 1) * stride;
    for k in 1..=e {
        data.copy_within(
            top + span.start..top + span.end,
            top - k * stride + span.start,
        );
        data.copy_within(
            bottom + span.start..bottom + span.end,
            bottom + k * stride + span.start,
        );
    }
    Ok(())
}

/// Zero the pixels of `r` on `page`.
pub fn clear_rect(page: &mut ImageBuffer, r: Rect) {
    let pbc = page.pixel_byte_count();
    let stride = page.scanline_byte_count();
    let data = page.data_mut();
    for y in r.y as usize..(r.y + r.h) as usize {
        let start = y * stride + r.x as usize * pbc;
        data[start..start + r.w as usize * pbc].fill(0);
    }
}
