//! Card compositing.
//!
//! Draws the laid-out card into an off-screen pixmap at a supersampled
//! resolution: photo with cover-crop semantics, a hard white text section,
//! the logo, and the user name. All geometry is computed in the profile's
//! logical pixels and uniformly multiplied by [`PIXEL_RATIO`].

use crate::assets::AssetStore;
use crate::error::RenderError;
use crate::models::size_profile::SizeProfile;
use crate::models::SourceImage;
use crate::rendering::layout::CardLayout;
use resvg::usvg::{self, Transform};
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, Rect};

/// Supersampling factor applied to every layout dimension.
pub const PIXEL_RATIO: u32 = 2;

const NAME_FONT_FAMILY: &str = "Helvetica Neue, Helvetica, Arial, sans-serif";
const NAME_FILL: &str = "#1A1A1A";

/// Renders finished card bitmaps.
pub struct CardRenderer {
    /// Font database for text rendering
    fontdb: Arc<fontdb::Database>,
    logo_svg: Vec<u8>,
}

impl CardRenderer {
    pub fn new(assets: &AssetStore) -> Result<Self, RenderError> {
        let logo_svg = assets.logo_svg()?;
        Ok(Self {
            fontdb: Arc::new(assets.font_database()),
            logo_svg,
        })
    }

    /// Compose the card into a pixmap of
    /// `profile.width * PIXEL_RATIO x profile.height * PIXEL_RATIO`.
    ///
    /// A missing photograph leaves the image section white; the export still
    /// completes best-effort. An empty user name is omitted entirely.
    pub fn compose(
        &self,
        profile: &SizeProfile,
        layout: &CardLayout,
        image: Option<&SourceImage>,
        user_name: &str,
    ) -> Result<Pixmap, RenderError> {
        let ratio = PIXEL_RATIO as f32;
        let out_w = profile.width * PIXEL_RATIO;
        let out_h = profile.height * PIXEL_RATIO;

        let mut canvas = Pixmap::new(out_w, out_h).ok_or(RenderError::PixmapAllocation)?;
        canvas.fill(Color::WHITE);

        if let Some(image) = image {
            self.draw_photo(&mut canvas, profile, layout, image)?;
        }

        // Hard seam between the sections
        let text_top = (layout.image_section_height * PIXEL_RATIO) as f32;
        let text_rect = Rect::from_xywh(
            0.0,
            text_top,
            out_w as f32,
            (layout.text_section_height * PIXEL_RATIO) as f32,
        )
        .ok_or(RenderError::PixmapAllocation)?;
        let mut white = tiny_skia::Paint::default();
        white.set_color(Color::WHITE);
        canvas
            .as_mut()
            .fill_rect(text_rect, &white, Transform::identity(), None);

        let logo_x = (layout.padding_h * PIXEL_RATIO) as f32;
        let logo_y = text_top + (layout.padding_v * PIXEL_RATIO) as f32;
        let logo_h = (layout.logo_height * PIXEL_RATIO) as f32;
        self.render_svg_at(&mut canvas, &self.logo_svg, logo_h, logo_x, logo_y)?;

        if !user_name.is_empty() {
            let name_y = logo_y + logo_h + (layout.logo_margin_bottom * PIXEL_RATIO) as f32;
            let svg = name_text_svg(profile, layout, user_name);
            let options = usvg::Options {
                fontdb: self.fontdb.clone(),
                ..Default::default()
            };
            let tree = usvg::Tree::from_data(svg.as_bytes(), &options)
                .map_err(|e| RenderError::SvgParse(e.to_string()))?;
            let transform =
                Transform::from_scale(ratio, ratio).post_translate(logo_x, name_y);
            resvg::render(&tree, transform, &mut canvas.as_mut());
        }

        Ok(canvas)
    }

    /// Compose and encode, recompressing the PNG before returning it.
    pub fn render_to_png(
        &self,
        profile: &SizeProfile,
        layout: &CardLayout,
        image: Option<&SourceImage>,
        user_name: &str,
    ) -> Result<Vec<u8>, RenderError> {
        let pixmap = self.compose(profile, layout, image, user_name)?;
        let png_bytes = encode_rgba_png(&pixmap)?;

        // Re-compress with oxipng (zopfli + adaptive filter selection)
        let optimized = oxipng::optimize_from_memory(
            &png_bytes,
            &oxipng::Options {
                strip: oxipng::StripChunks::Safe,
                optimize_alpha: false,
                ..Default::default()
            },
        )
        .unwrap_or(png_bytes);
        Ok(optimized)
    }

    /// Scale the photo so it fully covers the image section, center-cropping
    /// the overflow dimension.
    fn draw_photo(
        &self,
        canvas: &mut Pixmap,
        profile: &SizeProfile,
        layout: &CardLayout,
        image: &SourceImage,
    ) -> Result<(), RenderError> {
        let sect_w = profile.width * PIXEL_RATIO;
        let sect_h = layout.image_section_height * PIXEL_RATIO;
        let (img_w, img_h) = (image.width() as f32, image.height() as f32);

        let target_aspect = sect_w as f32 / sect_h as f32;
        let image_aspect = img_w / img_h;

        let (scale, offset_x, offset_y) = if image_aspect > target_aspect {
            // Wider than the section: fit height, center horizontally
            let scale = sect_h as f32 / img_h;
            (scale, (sect_w as f32 - img_w * scale) / 2.0, 0.0)
        } else {
            // Taller than the section: fit width, center vertically
            let scale = sect_w as f32 / img_w;
            (scale, 0.0, (sect_h as f32 - img_h * scale) / 2.0)
        };

        // Draw into a section-sized buffer so the overflow is cropped, then
        // blit the section onto the card.
        let mut section =
            Pixmap::new(sect_w, sect_h).ok_or(RenderError::PixmapAllocation)?;
        section.fill(Color::WHITE);

        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        section.as_mut().draw_pixmap(
            0,
            0,
            image.pixmap().as_ref(),
            &paint,
            Transform::from_scale(scale, scale).post_translate(offset_x, offset_y),
            None,
        );

        canvas.as_mut().draw_pixmap(
            0,
            0,
            section.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    /// Parse an SVG and render it into the canvas scaled to `target_h`,
    /// preserving its aspect ratio.
    fn render_svg_at(
        &self,
        canvas: &mut Pixmap,
        svg_data: &[u8],
        target_h: f32,
        x: f32,
        y: f32,
    ) -> Result<(), RenderError> {
        let options = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(svg_data, &options)
            .map_err(|e| RenderError::SvgParse(e.to_string()))?;

        let scale = target_h / tree.size().height();
        let transform = Transform::from_scale(scale, scale).post_translate(x, y);
        resvg::render(&tree, transform, &mut canvas.as_mut());
        Ok(())
    }
}

/// The user-name text as a standalone SVG in logical units.
fn name_text_svg(profile: &SizeProfile, layout: &CardLayout, name: &str) -> String {
    let font_size = layout.name_font_size;
    let box_w = profile.width;
    let box_h = font_size * 2;
    let baseline = font_size as f32 * 0.8;
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{box_w}" height="{box_h}"><text x="0" y="{baseline}" font-family="{NAME_FONT_FAMILY}" font-size="{font_size}" font-weight="500" fill="{NAME_FILL}">{}</text></svg>"#,
        xml_escape(name)
    )
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Encode a pixmap as an RGBA8 PNG (fast settings; oxipng re-compresses).
fn encode_rgba_png(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        encoder.set_filter(png::FilterType::NoFilter);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(&data)
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}
