//! The asynchronously decoding image resource backing a card session.

use crate::models::SourceImage;
use crate::services::readiness::{ImageEvent, ImageResource};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Decode progress for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Pending,
    Decoding,
    Complete { width: u32, height: u32 },
    Failed,
}

/// Holds the raw upload bytes and, once decode lands, the pixels.
///
/// Decode runs off the cooperative loop under `spawn_blocking`; progress is
/// published over a watch channel so the readiness gate can await it.
/// Replaced wholesale on re-upload, never mutated in place.
pub struct ImageSlot {
    bytes: Arc<Vec<u8>>,
    state: Arc<watch::Sender<DecodeState>>,
    decoded: Arc<Mutex<Option<Arc<SourceImage>>>>,
}

impl ImageSlot {
    pub fn new(bytes: Vec<u8>) -> Self {
        let (state, _) = watch::channel(DecodeState::Pending);
        Self {
            bytes: Arc::new(bytes),
            state: Arc::new(state),
            decoded: Arc::new(Mutex::new(None)),
        }
    }

    pub fn state(&self) -> DecodeState {
        *self.state.borrow()
    }

    /// The decoded raster, once available.
    pub fn decoded(&self) -> Option<Arc<SourceImage>> {
        self.decoded.lock().unwrap().clone()
    }

    /// Kick off (or re-trigger) the decode. Must run inside a tokio runtime.
    pub fn begin_decode(&self) {
        let bytes = self.bytes.clone();
        let decoded = self.decoded.clone();
        let state = self.state.clone();

        let _ = state.send(DecodeState::Decoding);
        tokio::task::spawn_blocking(move || match SourceImage::from_bytes(&bytes) {
            Ok(image) => {
                let (width, height) = (image.width(), image.height());
                *decoded.lock().unwrap() = Some(Arc::new(image));
                tracing::debug!(width, height, "Image decoded");
                let _ = state.send(DecodeState::Complete { width, height });
            }
            Err(e) => {
                tracing::warn!(%e, "Image decode failed");
                let _ = state.send(DecodeState::Failed);
            }
        });
    }
}

impl std::fmt::Debug for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSlot")
            .field("bytes", &self.bytes.len())
            .field("state", &self.state())
            .finish()
    }
}

#[async_trait]
impl ImageResource for ImageSlot {
    fn is_complete(&self) -> bool {
        matches!(self.state(), DecodeState::Complete { .. })
    }

    fn natural_size(&self) -> Option<(u32, u32)> {
        match self.state() {
            DecodeState::Complete { width, height } => Some((width, height)),
            _ => None,
        }
    }

    fn is_displayable(&self) -> bool {
        self.decoded.lock().unwrap().is_some()
    }

    fn has_failed(&self) -> bool {
        matches!(self.state(), DecodeState::Failed)
    }

    fn reload(&self) {
        self.begin_decode();
    }

    async fn next_event(&self) -> ImageEvent {
        let mut rx = self.state.subscribe();
        loop {
            match *rx.borrow_and_update() {
                DecodeState::Complete { .. } => return ImageEvent::Loaded,
                DecodeState::Failed => return ImageEvent::Errored,
                DecodeState::Pending | DecodeState::Decoding => {}
            }
            if rx.changed().await.is_err() {
                return ImageEvent::Errored;
            }
        }
    }
}
