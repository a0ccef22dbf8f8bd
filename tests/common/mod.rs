//! Shared fixtures for integration tests.

use colorcard::assets::AssetStore;
use colorcard::models::CardState;
use colorcard::rendering::CardRenderer;
use colorcard::services::{Exporter, GateTimings, ImageSlot};
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Encode a solid-color PNG in memory.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([rgb[0], rgb[1], rgb[2], 255]),
    );
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// A card session holding the given upload.
pub fn session_with_image(bytes: Vec<u8>, name: &str) -> Arc<Mutex<CardState>> {
    let state = Arc::new(Mutex::new(CardState::new()));
    {
        let mut card = state.lock().unwrap();
        card.set_name(name);
        card.set_image(Arc::new(ImageSlot::new(bytes)));
    }
    state
}

/// An exporter writing into `dir` with test-friendly gate timings.
pub fn test_exporter(dir: &Path) -> Exporter {
    let renderer = Arc::new(CardRenderer::new(&AssetStore::default()).unwrap());
    Exporter::new(renderer, dir).with_gate_timings(GateTimings {
        settle_delay: Duration::from_millis(10),
        poll_interval: Duration::from_millis(10),
        max_poll_attempts: 3,
        max_wait: Duration::from_secs(5),
    })
}

/// An exporter whose gate settles slowly, keeping the card in flight long
/// enough for concurrency tests.
pub fn slow_exporter(dir: &Path) -> Exporter {
    let renderer = Arc::new(CardRenderer::new(&AssetStore::default()).unwrap());
    Exporter::new(renderer, dir).with_gate_timings(GateTimings {
        settle_delay: Duration::from_millis(500),
        poll_interval: Duration::from_millis(10),
        max_poll_attempts: 3,
        max_wait: Duration::from_secs(5),
    })
}
