use crate::error::ExtractError;
use tiny_skia::{IntSize, Pixmap};

/// A decoded user photograph.
///
/// Immutable once decoded; a re-upload replaces the whole value. Pixels are
/// held as a premultiplied RGBA pixmap so both the extraction scratch pass
/// and the compositor can draw it directly.
pub struct SourceImage {
    pixmap: Pixmap,
}

impl SourceImage {
    /// Decode raw image bytes (JPEG/PNG/GIF/WebP).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ExtractError::InvalidImage(e.to_string()))?;
        let rgba = decoded.to_rgba8();

        let (width, height) = (rgba.width(), rgba.height());
        if width == 0 || height == 0 {
            return Err(ExtractError::InvalidImage(format!(
                "zero dimensions: {width}x{height}"
            )));
        }

        let size =
            IntSize::from_wh(width, height).ok_or(ExtractError::RenderingUnavailable)?;
        let data = premultiply_rgba(rgba.as_raw());
        let pixmap = Pixmap::from_vec(data, size).ok_or(ExtractError::RenderingUnavailable)?;

        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Convert straight-alpha RGBA bytes to tiny-skia's premultiplied layout.
fn premultiply_rgba(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len());
    for pixel in rgba.chunks_exact(4) {
        let (r, g, b, a) = (pixel[0], pixel[1], pixel[2], pixel[3]);
        if a == 255 {
            out.extend_from_slice(&[r, g, b, a]);
        } else {
            let af = a as u16;
            out.extend_from_slice(&[
                ((r as u16 * af) / 255) as u8,
                ((g as u16 * af) / 255) as u8,
                ((b as u16 * af) / 255) as u8,
                a,
            ]);
        }
    }
    out
}
