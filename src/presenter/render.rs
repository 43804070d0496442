use std::io::Cursor;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb as Pixel, RgbImage};
use tracing::warn;

use crate::llm::media::{bytes_to_data_url, decode_data_url};
use crate::presenter::card::{Card, Gradient, Rgb};

/// Logical card geometry, scaled by the pixel ratio when drawn.
const CARD_WIDTH: u32 = 400;
const CARD_HEIGHT: u32 = 560;
const ART_INSET: u32 = 16;
const ART_TOP: u32 = 72;
const BANNER_RULE_Y: u32 = 40;
const BANNER_RULE_WIDTH: u32 = 64;
const ART_BACKDROP: Rgb = [245, 243, 239];
const WARM_GRAY: Rgb = [168, 162, 158];
const STONE_RULE: Rgb = [231, 229, 228];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    pub pixel_ratio: u32,
    pub background: Rgb,
}

impl Default for RasterOptions {
    fn default() -> Self {
        RasterOptions {
            pixel_ratio: 2,
            background: [255, 255, 255],
        }
    }
}

/// Turns the card (and nothing around it) into a PNG data URL.
pub trait Rasterizer {
    fn rasterize(&self, card: &Card, options: &RasterOptions) -> Result<String>;
}

impl<T: Rasterizer + ?Sized> Rasterizer for &T {
    fn rasterize(&self, card: &Card, options: &RasterOptions) -> Result<String> {
        (**self).rasterize(card, options)
    }
}

/// Draws the card natively: opaque background, artwork cropped to a square
/// (or the energy gradient), banner rule and dividers for the note block.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardRasterizer;

impl CardRasterizer {
    pub fn canvas_size(options: &RasterOptions) -> (u32, u32) {
        let ratio = options.pixel_ratio.max(1);
        (CARD_WIDTH * ratio, CARD_HEIGHT * ratio)
    }

    fn artwork(card: &Card, size: u32) -> RgbImage {
        if card.result.has_image() {
            match decode_artwork(&card.result.image, size) {
                Ok(art) => return art,
                Err(err) => warn!("Card artwork could not be decoded, using placeholder: {err:#}"),
            }
        }
        gradient_square(&card.placeholder_gradient(), size)
    }
}

fn decode_artwork(data_url: &str, size: u32) -> Result<RgbImage> {
    let blob = decode_data_url(data_url)?;
    let decoded = image::load_from_memory(&blob.bytes)
        .with_context(|| format!("unsupported artwork ({})", blob.mime_type))?;
    Ok(decoded.resize_to_fill(size, size, FilterType::Lanczos3).to_rgb8())
}

fn gradient_square(gradient: &Gradient, size: u32) -> RgbImage {
    let span = (2 * size.saturating_sub(1)).max(1) as f32;
    RgbImage::from_fn(size, size, |x, y| Pixel(gradient.sample((x + y) as f32 / span)))
}

fn fill_rect(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb) {
    let x_end = (x + width).min(canvas.width());
    let y_end = (y + height).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, Pixel(color));
        }
    }
}

impl Rasterizer for CardRasterizer {
    fn rasterize(&self, card: &Card, options: &RasterOptions) -> Result<String> {
        let ratio = options.pixel_ratio.max(1);
        let (width, height) = Self::canvas_size(options);
        let mut canvas = RgbImage::from_pixel(width, height, Pixel(options.background));

        let rule = ratio;
        fill_rect(
            &mut canvas,
            (width - BANNER_RULE_WIDTH * ratio) / 2,
            BANNER_RULE_Y * ratio,
            BANNER_RULE_WIDTH * ratio,
            rule,
            WARM_GRAY,
        );

        let art_size = (CARD_WIDTH - 2 * ART_INSET) * ratio;
        let art_x = ART_INSET * ratio;
        let art_y = ART_TOP * ratio;
        fill_rect(&mut canvas, art_x, art_y, art_size, art_size, ART_BACKDROP);
        let art = Self::artwork(card, art_size);
        imageops::overlay(&mut canvas, &art, art_x as i64, art_y as i64);

        let mut divider_y = art_y + art_size + 24 * ratio;
        for _ in 0..card.note_lines().len().clamp(1, 4) {
            fill_rect(&mut canvas, art_x, divider_y, art_size, rule, STONE_RULE);
            divider_y += 16 * ratio;
        }

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("failed to encode card PNG")?;
        Ok(bytes_to_data_url("image/png", &bytes))
    }
}
