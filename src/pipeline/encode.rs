//! Page encoding: `DynamicImage` → PNG bytes wrapped in [`PageImage`].
//!
//! PNG keeps rendered text crisp; the bytes are later embedded as base64
//! data URIs (see [`PageImage::to_data_uri`]).

use crate::content::PageImage;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rendered page as PNG.
pub fn encode_page(img: &DynamicImage) -> Result<PageImage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    debug!(
        "Encoded {}x{} page → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );

    Ok(PageImage::new(img.width(), img.height(), buf))
}
