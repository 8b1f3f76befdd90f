//! Estimation reconciliation: turn free-form estimator output into priced,
//! catalog-backed estimates.

pub mod decoder;
pub mod enricher;
pub mod matcher;
pub mod prompt;
mod repair;

pub use decoder::{DecodeError, decode};
pub use enricher::{ACCEPTANCE_THRESHOLD, Enricher, EnrichmentSummary};
pub use matcher::{MatchQuery, MatchResult, find_best_match, similarity};
pub use prompt::{SYSTEM_PROMPT, build_user_prompt};
