//! Dominant-color extraction.
//!
//! The photograph is scaled down onto a small scratch surface, sampled with a
//! fixed stride, and every sample is quantized into 16-level-per-channel
//! buckets. The bucket with the most votes becomes the card's color.

use crate::error::ExtractError;
use crate::models::SourceImage;
use std::collections::HashMap;
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, Transform};

/// Longer edge of the scratch surface.
const MAX_SCRATCH_EDGE: u32 = 200;

/// Sampling stride over the RGBA byte buffer: every 10th pixel.
const SAMPLE_STRIDE_BYTES: usize = 40;

/// Width of a quantization bucket per channel.
const BUCKET_WIDTH: u8 = 16;

/// A `#RRGGBB` color string, always uppercase and well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DominantColor(String);

impl DominantColor {
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{r:02X}{g:02X}{b:02X}"))
    }

    pub fn hex(&self) -> &str {
        &self.0
    }
}

impl Default for DominantColor {
    /// White, the color shown before any image is supplied.
    fn default() -> Self {
        Self::from_rgb(255, 255, 255)
    }
}

impl std::fmt::Display for DominantColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One histogram bucket: a quantized RGB triple and its vote count.
struct ColorSample {
    rgb: (u8, u8, u8),
    count: u32,
}

/// Reduce a decoded photograph to its dominant color.
pub fn dominant_color(image: &SourceImage) -> Result<DominantColor, ExtractError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(ExtractError::InvalidImage(format!(
            "zero dimensions: {width}x{height}"
        )));
    }

    let scratch = downscale_to_scratch(image)?;
    let samples = sample_buckets(scratch.data());

    let mut winner = (255u8, 255u8, 255u8);
    let mut max_count = 0u32;
    for sample in &samples {
        if sample.count > max_count {
            max_count = sample.count;
            winner = sample.rgb;
        }
    }

    let color = DominantColor::from_rgb(winner.0, winner.1, winner.2);
    tracing::debug!(
        color = %color,
        buckets = samples.len(),
        votes = max_count,
        "Extracted dominant color"
    );
    Ok(color)
}

/// Draw the photograph scaled down so its longer edge is at most
/// [`MAX_SCRATCH_EDGE`], preserving aspect ratio. Dimensions are floored with
/// a 1px minimum per side.
fn downscale_to_scratch(image: &SourceImage) -> Result<Pixmap, ExtractError> {
    let (width, height) = (image.width() as f32, image.height() as f32);
    let max = MAX_SCRATCH_EDGE as f32;
    let scale = (max / width).min(max / height).min(1.0);

    let scratch_w = ((width * scale).floor() as u32).max(1);
    let scratch_h = ((height * scale).floor() as u32).max(1);

    let mut scratch =
        Pixmap::new(scratch_w, scratch_h).ok_or(ExtractError::RenderingUnavailable)?;
    scratch.fill(Color::WHITE);

    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    let transform = Transform::from_scale(
        scratch_w as f32 / width,
        scratch_h as f32 / height,
    );
    scratch
        .as_mut()
        .draw_pixmap(0, 0, image.pixmap().as_ref(), &paint, transform, None);

    Ok(scratch)
}

/// Walk the RGBA buffer with the sampling stride and vote quantized triples
/// into buckets, preserving first-seen order for deterministic tie-breaks.
fn sample_buckets(data: &[u8]) -> Vec<ColorSample> {
    let mut samples: Vec<ColorSample> = Vec::new();
    let mut index: HashMap<(u8, u8, u8), usize> = HashMap::new();

    let mut i = 0;
    while i + 2 < data.len() {
        let rgb = (
            quantize(data[i]),
            quantize(data[i + 1]),
            quantize(data[i + 2]),
        );
        match index.get(&rgb) {
            Some(&slot) => samples[slot].count += 1,
            None => {
                index.insert(rgb, samples.len());
                samples.push(ColorSample { rgb, count: 1 });
            }
        }
        i += SAMPLE_STRIDE_BYTES;
    }

    samples
}

fn quantize(channel: u8) -> u8 {
    (channel / BUCKET_WIDTH) * BUCKET_WIDTH
}
