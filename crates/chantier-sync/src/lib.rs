//! Outbound calls: the upstream estimator and the mail-service status probe.

pub mod cache;
pub mod classify;
mod error;

pub use cache::TtlCache;
pub use classify::{UpstreamFailure, classify_failure};
pub use error::UpstreamError;

#[cfg(feature = "http")]
pub mod anthropic;
#[cfg(feature = "http")]
pub mod mail;

#[cfg(feature = "http")]
pub use anthropic::{AnthropicClient, ClientConfig};
#[cfg(feature = "http")]
pub use mail::MailStatusProbe;

use async_trait::async_trait;
use chantier_core::EstimateRequest;

/// Anything that can turn an estimate request into raw estimator text.
///
/// The text is returned as-is; decoding is the caller's job.
#[async_trait]
pub trait EstimationBackend: Send + Sync {
    async fn generate(&self, request: &EstimateRequest) -> Result<String, UpstreamError>;
}
