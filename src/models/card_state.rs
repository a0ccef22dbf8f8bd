use crate::error::ExportError;
use crate::extract::DominantColor;
use crate::models::size_profile::SizeProfile;
use crate::services::image_slot::ImageSlot;
use std::sync::Arc;

/// Mutable session aggregate for one card.
///
/// Mutated only through the named transitions below; never persisted. The
/// `export_in_flight` flag is the sole guard against two exports mutating
/// shared state at once.
#[derive(Debug)]
pub struct CardState {
    dominant_color: DominantColor,
    user_name: String,
    source: Option<Arc<ImageSlot>>,
    processing: bool,
    export_in_flight: bool,
    selected_profile: &'static SizeProfile,
}

impl CardState {
    pub fn new() -> Self {
        Self {
            dominant_color: DominantColor::default(),
            user_name: String::new(),
            source: None,
            processing: false,
            export_in_flight: false,
            selected_profile: &SizeProfile::NORMAL,
        }
    }

    /// Replace the source photograph. Resets the dominant color to the
    /// default until a fresh extraction lands.
    pub fn set_image(&mut self, slot: Arc<ImageSlot>) {
        self.source = Some(slot);
        self.dominant_color = DominantColor::default();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.user_name = name.into();
    }

    pub fn set_dominant_color(&mut self, color: DominantColor) {
        self.dominant_color = color;
    }

    pub fn select_profile(&mut self, profile: &'static SizeProfile) {
        self.selected_profile = profile;
    }

    pub fn begin_processing(&mut self) {
        self.processing = true;
    }

    pub fn end_processing(&mut self) {
        self.processing = false;
    }

    /// Claim the card for an export run.
    ///
    /// Rejects when an export is already in flight or no source image is
    /// present; on success the in-flight flag is set and the source slot is
    /// returned for the exporter to drive.
    pub fn begin_export(&mut self) -> Result<Arc<ImageSlot>, ExportError> {
        if self.export_in_flight {
            return Err(ExportError::ExportInProgress);
        }
        let slot = self
            .source
            .clone()
            .ok_or_else(|| ExportError::InvalidImage("no source image".to_string()))?;
        self.export_in_flight = true;
        Ok(slot)
    }

    pub fn end_export(&mut self) {
        self.export_in_flight = false;
    }

    pub fn dominant_color(&self) -> &DominantColor {
        &self.dominant_color
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn source(&self) -> Option<&Arc<ImageSlot>> {
        self.source.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn export_in_flight(&self) -> bool {
        self.export_in_flight
    }

    pub fn selected_profile(&self) -> &'static SizeProfile {
        self.selected_profile
    }
}

impl Default for CardState {
    fn default() -> Self {
        Self::new()
    }
}
