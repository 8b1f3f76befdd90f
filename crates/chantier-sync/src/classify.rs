//! Upstream failure classification.
//!
//! Providers report quota, rate-limit and credential problems only through
//! free-text messages, so classification is substring matching. All rules
//! live here.

use serde::Serialize;

/// User-relevant category of an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamFailure {
    /// Credits or quota exhausted on the provider account.
    QuotaExceeded,
    /// Too many requests in a short time.
    RateLimited,
    /// Missing, invalid, or revoked API key.
    InvalidCredentials,
    Generic,
}

const QUOTA_MARKERS: &[&str] = &[
    "quota",
    "credit balance",
    "insufficient_quota",
    "billing",
    "crédit",
];

const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "rate_limit",
    "too many requests",
    "overloaded",
];

const CREDENTIAL_MARKERS: &[&str] = &[
    "invalid x-api-key",
    "invalid api key",
    "api key",
    "authentication",
    "unauthorized",
    "permission_error",
];

/// Classify an upstream error message. Checked in order: quota, rate limit,
/// credentials; anything else is [`UpstreamFailure::Generic`].
pub fn classify_failure(message: &str) -> UpstreamFailure {
    let message = message.to_lowercase();
    let has_any = |markers: &[&str]| markers.iter().any(|m| message.contains(m));

    if has_any(QUOTA_MARKERS) {
        UpstreamFailure::QuotaExceeded
    } else if has_any(RATE_LIMIT_MARKERS) {
        UpstreamFailure::RateLimited
    } else if has_any(CREDENTIAL_MARKERS) {
        UpstreamFailure::InvalidCredentials
    } else {
        UpstreamFailure::Generic
    }
}
