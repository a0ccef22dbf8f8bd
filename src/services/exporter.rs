//! Export orchestration: guard -> readiness gate -> layout -> compositor ->
//! PNG emission.

use crate::error::{ExportError, RenderError};
use crate::models::size_profile::SizeProfile;
use crate::models::CardState;
use crate::rendering::{layout, CardRenderer};
use crate::services::image_slot::ImageSlot;
use crate::services::readiness::{GateResolution, GateTimings, ReadinessGate};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Lifecycle of one export invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    AwaitingImage,
    Compositing,
    Done,
    Failed,
}

/// One export run. Created per invocation, destroyed on completion; at most
/// one job per card is past `Pending` at a time.
#[derive(Debug)]
pub struct ExportJob {
    pub profile: &'static SizeProfile,
    pub user_name: String,
    status: JobStatus,
}

impl ExportJob {
    fn new(profile: &'static SizeProfile, user_name: String) -> Self {
        Self {
            profile,
            user_name,
            status: JobStatus::Pending,
        }
    }

    fn advance(&mut self, status: JobStatus) {
        tracing::debug!(profile = self.profile.name, ?status, "Export job");
        self.status = status;
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }
}

/// A finished export.
#[derive(Debug)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub bytes_written: usize,
    /// The readiness gate escaped via its timeout; the card may have shipped
    /// without the photo.
    pub timed_out: bool,
}

/// Drives a card session through a complete export.
pub struct Exporter {
    renderer: Arc<CardRenderer>,
    gate_timings: GateTimings,
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(renderer: Arc<CardRenderer>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            gate_timings: GateTimings::default(),
            output_dir: output_dir.into(),
        }
    }

    /// Override the readiness gate timings (tests, impatient callers).
    pub fn with_gate_timings(mut self, timings: GateTimings) -> Self {
        self.gate_timings = timings;
        self
    }

    /// Export the card at the given profile.
    ///
    /// Rejects with `ExportInProgress` while another export holds the card,
    /// and always releases the in-flight flag on the way out.
    pub async fn export(
        &self,
        state: &Arc<Mutex<CardState>>,
        profile: &'static SizeProfile,
    ) -> Result<ExportOutcome, ExportError> {
        let (slot, user_name) = {
            let mut card = state.lock().unwrap();
            let slot = card.begin_export()?;
            (slot, card.user_name().to_string())
        };

        let mut job = ExportJob::new(profile, user_name);
        let result = self.run(&mut job, slot).await;
        if result.is_err() && job.status() != JobStatus::Failed {
            job.advance(JobStatus::Failed);
        }

        state.lock().unwrap().end_export();
        result
    }

    async fn run(
        &self,
        job: &mut ExportJob,
        slot: Arc<ImageSlot>,
    ) -> Result<ExportOutcome, ExportError> {
        job.advance(JobStatus::AwaitingImage);
        let gate = ReadinessGate::new(self.gate_timings);
        let timed_out = match gate.wait_until_ready(slot.as_ref()).await {
            GateResolution::Failed => {
                job.advance(JobStatus::Failed);
                return Err(ExportError::ImageLoadFailed);
            }
            GateResolution::Ready { timed_out } => timed_out,
        };

        job.advance(JobStatus::Compositing);
        let image = slot.decoded();
        if timed_out && image.is_none() {
            tracing::warn!("Exporting without a decoded photo (gate timed out)");
        }

        let renderer = self.renderer.clone();
        let profile = job.profile;
        let user_name = job.user_name.clone();
        let png_bytes = tokio::task::spawn_blocking(move || {
            let card_layout = layout(profile);
            renderer.render_to_png(profile, &card_layout, image.as_deref(), &user_name)
        })
        .await
        .map_err(|e| RenderError::PngEncode(format!("Render task failed: {e}")))
        .map_err(ExportError::Render)??;

        let path = self.output_dir.join(export_file_name(&job.user_name, profile));
        tokio::fs::write(&path, &png_bytes).await?;

        job.advance(JobStatus::Done);
        tracing::info!(
            path = %path.display(),
            bytes = png_bytes.len(),
            profile = profile.name,
            "Exported card"
        );

        Ok(ExportOutcome {
            path,
            bytes_written: png_bytes.len(),
            timed_out,
        })
    }
}

/// `pantone-card-{name-or-"color"}{suffix}.png`, with path separators kept
/// out of the name.
pub fn export_file_name(user_name: &str, profile: &SizeProfile) -> String {
    let name = user_name.trim();
    let name = if name.is_empty() { "color" } else { name };
    let safe: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("pantone-card-{safe}{}.png", profile.file_suffix)
}
