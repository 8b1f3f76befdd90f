//! Estimation service: validates images, snapshots the catalog, calls the
//! estimator, then decodes and enriches its answer.

mod error;
pub mod images;
pub mod orchestrator;

pub use error::{ErrorBody, EstimateError, Notice};
pub use images::{ImageCheck, ImageRejection, RawImage, RejectReason, ServiceLimits, check_images};
pub use orchestrator::{EstimationOutcome, Orchestrator};
