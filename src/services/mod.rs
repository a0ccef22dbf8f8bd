pub mod exporter;
pub mod image_slot;
pub mod readiness;

pub use exporter::{ExportJob, ExportOutcome, Exporter, JobStatus};
pub use image_slot::{DecodeState, ImageSlot};
pub use readiness::{GateResolution, GateState, GateTimings, ImageEvent, ImageResource, ReadinessGate};
