//! Rasterization of serialized SVG onto a pixel canvas.
//!
//! The SVG text is parsed back with `usvg` (the same text a user downloads
//! as `.svg`), drawn with `resvg` onto a `tiny-skia` pixmap that was first
//! filled with the background color, then copied into an [`RgbaImage`].
//!
//! Only `data:` image hrefs are decoded. Logo hrefs naming a file or a
//! remote URL are skipped, leaving the excavated area blank.

use image::{Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use std::io::Cursor;

use crate::design::Color;
use crate::error::{MenuFacilError, Result};

/// Draw `svg` onto a `size`×`size` canvas filled with `background`.
pub fn rasterize(svg: &str, size: u32, background: &Color) -> Result<RgbaImage> {
    let tree = usvg::Tree::from_str(svg, &options())
        .map_err(|e| MenuFacilError::Rasterization(format!("Failed to load SVG: {}", e)))?;

    let mut pixmap = tiny_skia::Pixmap::new(size, size).ok_or_else(|| {
        MenuFacilError::Rasterization(format!("Cannot allocate a {}x{} canvas", size, size))
    })?;

    let [r, g, b, a] = background.rgba();
    pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));

    let tree_size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        size as f32 / tree_size.width(),
        size as f32 / tree_size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let mut img = RgbaImage::new(size, size);
    for (src, dst) in pixmap.pixels().iter().zip(img.pixels_mut()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }

    Ok(img)
}

fn options() -> usvg::Options<'static> {
    usvg::Options {
        image_href_resolver: usvg::ImageHrefResolver {
            resolve_data: usvg::ImageHrefResolver::default_data_resolver(),
            resolve_string: Box::new(|_: &str, _: &usvg::Options| None::<usvg::ImageKind>),
        },
        ..usvg::Options::default()
    }
}

/// Encode a canvas as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .map_err(|e| MenuFacilError::Encoding(format!("Failed to encode PNG: {}", e)))?;
    Ok(png_bytes)
}

/// Blend a canvas onto an opaque matte, dropping alpha.
///
/// PDF images carry no alpha channel here; translucent pixels are
/// flattened against `matte` first.
pub fn flatten_rgb(img: &RgbaImage, matte: [u8; 3]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(img.width() as usize * img.height() as usize * 3);
    for px in img.pixels() {
        let [r, g, b, a] = px.0;
        let a = a as u32;
        for (channel, m) in [r, g, b].into_iter().zip(matte) {
            let blended = (channel as u32 * a + m as u32 * (255 - a) + 127) / 255;
            rgb.push(blended as u8);
        }
    }
    rgb
}
