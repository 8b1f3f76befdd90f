use chantier_ai::DecodeError;
use chantier_store::StoreError;
use chantier_sync::{UpstreamError, UpstreamFailure};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::images::ImageRejection;

const BILLING_URL: &str = "https://console.anthropic.com/settings/billing";
const API_KEYS_URL: &str = "https://console.anthropic.com/settings/keys";

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("no valid image ({} rejected)", .rejected.len())]
    NoValidImages { rejected: Vec<ImageRejection> },

    #[error("request payload is {size} bytes (max {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("upstream estimator failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Title and description shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    fn new(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
        }
    }
}

/// Error payload returned to HTTP callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
}

impl EstimateError {
    /// Stable machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoValidImages { .. } => "no_valid_images",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Upstream(e) => match e.failure() {
                UpstreamFailure::QuotaExceeded => "upstream_quota_exceeded",
                UpstreamFailure::RateLimited => "upstream_rate_limited",
                UpstreamFailure::InvalidCredentials => "upstream_auth_error",
                UpstreamFailure::Generic => "upstream_error",
            },
            Self::Decode(DecodeError::EmptyResponse) => "empty_response",
            Self::Decode(DecodeError::MalformedResponse { .. }) => "malformed_response",
            Self::Decode(DecodeError::SchemaValidation { .. }) => "schema_validation_error",
            Self::Store(_) => "catalog_error",
            Self::Json(_) => "internal_error",
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            Self::NoValidImages { rejected } => Notice::new(
                "Aucune image valide",
                format!(
                    "Aucune des {} images n'est exploitable. Utilisez des photos JPEG, PNG ou WebP d'au moins 400×400 pixels et de moins de 15 Mo.",
                    rejected.len()
                ),
            ),
            Self::PayloadTooLarge { .. } => Notice::new(
                "Images trop volumineuses",
                "L'ensemble des images dépasse la taille autorisée. Réduisez leur nombre ou compressez-les.",
            ),
            Self::Upstream(e) => match e.failure() {
                UpstreamFailure::QuotaExceeded => Notice::new(
                    "Crédits épuisés",
                    "Le quota du service d'estimation est atteint. Rechargez les crédits du compte puis réessayez.",
                ),
                UpstreamFailure::RateLimited => Notice::new(
                    "Trop de demandes",
                    "Le service d'estimation est saturé. Patientez une minute avant de réessayer.",
                ),
                UpstreamFailure::InvalidCredentials => Notice::new(
                    "Clé d'API invalide",
                    "La clé d'API du service d'estimation est absente ou refusée.",
                ),
                UpstreamFailure::Generic => Notice::new(
                    "Erreur du service d'estimation",
                    "Le service d'estimation n'a pas pu traiter la demande. Réessayez plus tard.",
                ),
            },
            Self::Decode(_) => Notice::new(
                "Réponse inexploitable",
                "L'estimation reçue est incomplète ou mal formée. Relancez l'estimation.",
            ),
            Self::Store(_) => Notice::new(
                "Bibliothèque indisponible",
                "La bibliothèque de matériaux n'a pas pu être lue.",
            ),
            Self::Json(_) => Notice::new("Erreur interne", "La demande n'a pas pu être préparée."),
        }
    }

    /// HTTP status: 4xx for problems with the caller's input, 5xx otherwise.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoValidImages { .. } => 400,
            Self::PayloadTooLarge { .. } => 413,
            Self::Upstream(e) => match e.failure() {
                UpstreamFailure::QuotaExceeded => 402,
                UpstreamFailure::RateLimited => 429,
                UpstreamFailure::InvalidCredentials => 401,
                UpstreamFailure::Generic => 502,
            },
            Self::Decode(_) => 502,
            Self::Store(_) | Self::Json(_) => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let notice = self.notice();
        let details = match self {
            Self::NoValidImages { rejected } => serde_json::to_value(rejected).ok(),
            Self::PayloadTooLarge { size, limit } => {
                Some(serde_json::json!({ "size": size, "limit": limit }))
            }
            Self::Decode(DecodeError::SchemaValidation { field, index, .. }) => {
                Some(serde_json::json!({ "field": field, "index": index }))
            }
            other => Some(Value::String(other.to_string())),
        };
        let help_url = match self {
            Self::Upstream(e) => match e.failure() {
                UpstreamFailure::QuotaExceeded => Some(BILLING_URL.to_string()),
                UpstreamFailure::InvalidCredentials => Some(API_KEYS_URL.to_string()),
                _ => None,
            },
            _ => None,
        };
        ErrorBody {
            error: notice.title,
            message: Some(notice.description),
            details,
            help_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::RejectReason;

    fn upstream(status: u16, body: &str) -> EstimateError {
        EstimateError::Upstream(UpstreamError::Server {
            status,
            body: body.into(),
        })
    }

    #[test]
    fn upstream_failures_map_to_categories() {
        let quota = upstream(400, "Your credit balance is too low");
        assert_eq!(quota.kind(), "upstream_quota_exceeded");
        assert_eq!(quota.status_code(), 402);
        assert_eq!(quota.body().help_url.as_deref(), Some(BILLING_URL));

        let rate = upstream(429, "rate_limit_error: Number of requests exceeded");
        assert_eq!(rate.kind(), "upstream_rate_limited");
        assert_eq!(rate.status_code(), 429);
        assert_eq!(rate.body().help_url, None);

        let auth = EstimateError::Upstream(UpstreamError::MissingApiKey);
        assert_eq!(auth.kind(), "upstream_auth_error");
        assert_eq!(auth.status_code(), 401);

        let other = upstream(500, "internal server error");
        assert_eq!(other.kind(), "upstream_error");
        assert_eq!(other.status_code(), 502);
    }

    #[test]
    fn no_valid_images_lists_rejections() {
        let err = EstimateError::NoValidImages {
            rejected: vec![ImageRejection {
                name: "flou.png".into(),
                reason: RejectReason::UnsupportedFormat,
            }],
        };
        assert_eq!(err.status_code(), 400);
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["error"], "Aucune image valide");
        assert_eq!(body["details"][0]["name"], "flou.png");
        assert!(body.get("helpUrl").is_none());
    }

    #[test]
    fn schema_error_names_field_and_index() {
        let err = EstimateError::Decode(DecodeError::SchemaValidation {
            field: "prixTotal".into(),
            index: Some(2),
            reason: "missing required field".into(),
        });
        assert_eq!(err.kind(), "schema_validation_error");
        assert_eq!(err.status_code(), 502);
        let body = err.body();
        assert_eq!(
            body.details,
            Some(serde_json::json!({ "field": "prixTotal", "index": 2 }))
        );
    }

    #[test]
    fn payload_too_large_is_client_error() {
        let err = EstimateError::PayloadTooLarge {
            size: 5_000_000,
            limit: 4_500_000,
        };
        assert_eq!(err.status_code(), 413);
        assert_eq!(err.notice().title, "Images trop volumineuses");
    }
}
