//! Places a cut-out product onto a generated background.
//!
//! The canvas is at least the product plus [`PADDING`] on every side and never
//! smaller than the background's natural size. The background is scaled to
//! cover the canvas, center-cropped, and the product is alpha-blended at the
//! center. The result is flattened to opaque RGB and returned as a PNG data URL.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{ImageFormat, Rgb, RgbImage, RgbaImage};
use tracing::{debug, instrument};

use crate::error::{ProcessingError, Result};
use crate::fetch::BackgroundFetcher;

/// Border margin around the product, in pixels.
pub const PADDING: u32 = 50;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// An encoded composite ready to hand back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeResult {
    pub width: u32,
    pub height: u32,
    /// `data:image/png;base64,...`
    pub data_url: String,
}

/// Canvas dimensions for a product and background, both `(width, height)`.
pub fn canvas_size(product: (u32, u32), background: (u32, u32)) -> (u32, u32) {
    (
        (product.0 + 2 * PADDING).max(background.0),
        (product.1 + 2 * PADDING).max(background.1),
    )
}

/// Size `source` scales to when covering `target` with its aspect ratio kept.
///
/// A source relatively wider than the target is scaled by height and overflows
/// horizontally; otherwise it is scaled by width. Neither side is ever smaller
/// than the target.
pub fn cover_size(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = (u64::from(source.0), u64::from(source.1));
    let (tw, th) = (u64::from(target.0), u64::from(target.1));

    if sw * th > tw * sh {
        ((sw * th).div_ceil(sh) as u32, target.1)
    } else {
        (target.0, (sh * tw).div_ceil(sw) as u32)
    }
}

/// Top-left corner of a centered `target` crop inside `scaled`.
pub fn crop_origin(scaled: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    (
        scaled.0.saturating_sub(target.0) / 2,
        scaled.1.saturating_sub(target.1) / 2,
    )
}

/// Where the product's top-left corner goes to center it on the canvas.
pub fn paste_offset(product: (u32, u32), canvas: (u32, u32)) -> (u32, u32) {
    (
        canvas.0.saturating_sub(product.0) / 2,
        canvas.1.saturating_sub(product.1) / 2,
    )
}

/// Scale `background` to cover `target` and center-crop it to exactly that size.
pub fn cover_and_crop(background: &RgbaImage, target: (u32, u32)) -> RgbaImage {
    let natural = background.dimensions();
    let scaled_size = cover_size(natural, target);

    let scaled = if scaled_size == natural {
        background.clone()
    } else {
        image::imageops::resize(background, scaled_size.0, scaled_size.1, FilterType::Lanczos3)
    };

    if scaled_size == target {
        return scaled;
    }
    let (x, y) = crop_origin(scaled_size, target);
    image::imageops::crop_imm(&scaled, x, y, target.0, target.1).to_image()
}

/// Blend `top` onto an opaque canvas at `(x, y)` using `top`'s alpha as the mask.
///
/// Parts of `top` outside the canvas are dropped.
pub fn blend_onto(canvas: &mut RgbImage, top: &RgbaImage, x: u32, y: u32) {
    let (cw, ch) = canvas.dimensions();
    for (tx, ty, src) in top.enumerate_pixels() {
        let (cx, cy) = (x + tx, y + ty);
        if cx >= cw || cy >= ch {
            continue;
        }
        let alpha = u32::from(src[3]);
        let dst = canvas.get_pixel_mut(cx, cy);
        for c in 0..3 {
            let fg = u32::from(src[c]);
            let bg = u32::from(dst[c]);
            dst[c] = ((fg * alpha + bg * (255 - alpha) + 127) / 255) as u8;
        }
    }
}

/// Composite `image` against white, dropping its alpha channel.
pub fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut out = RgbImage::from_pixel(w, h, WHITE);
    blend_onto(&mut out, image, 0, 0);
    out
}

/// Build the final opaque composite of `product` centered over `background`.
pub fn composite_images(product: &RgbaImage, background: &RgbaImage) -> RgbImage {
    let target = canvas_size(product.dimensions(), background.dimensions());
    let cropped = cover_and_crop(background, target);

    let mut canvas = RgbImage::from_pixel(target.0, target.1, WHITE);
    blend_onto(&mut canvas, &cropped, 0, 0);

    let (x, y) = paste_offset(product.dimensions(), target);
    blend_onto(&mut canvas, product, x, y);
    canvas
}

/// PNG-encode and wrap as an inline data URL.
pub fn encode_data_url(image: &RgbImage) -> std::result::Result<String, ProcessingError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;
    Ok(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(buf.into_inner())
    ))
}

fn decode_background(data: &[u8]) -> std::result::Result<RgbaImage, ProcessingError> {
    let background = image::load_from_memory(data)
        .map_err(|e| ProcessingError::Decode(format!("background: {e}")))?
        .to_rgba8();
    if background.width() == 0 || background.height() == 0 {
        return Err(ProcessingError::Decode("background has no pixels".into()));
    }
    Ok(background)
}

#[derive(Clone)]
pub struct Compositor {
    fetcher: BackgroundFetcher,
}

impl Compositor {
    pub fn new(fetcher: BackgroundFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch the background at `background_url` and composite `product` onto it.
    #[instrument(skip_all, fields(product_w = product.width(), product_h = product.height()))]
    pub async fn composite(
        &self,
        product: RgbaImage,
        background_url: &str,
    ) -> Result<CompositeResult> {
        let data = self.fetcher.fetch(background_url).await?;

        let result = tokio::task::spawn_blocking(move || {
            let background = decode_background(&data)?;
            let composite = composite_images(&product, &background);
            let (width, height) = composite.dimensions();
            let data_url = encode_data_url(&composite)?;
            Ok::<_, ProcessingError>(CompositeResult {
                width,
                height,
                data_url,
            })
        })
        .await
        .map_err(ProcessingError::from)??;

        debug!(
            width = result.width,
            height = result.height,
            "Composite encoded"
        );
        Ok(result)
    }
}
