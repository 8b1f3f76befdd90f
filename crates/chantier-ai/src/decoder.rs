//! Decoding of raw estimator text into a typed [`Estimation`].
//!
//! The estimator is asked for bare JSON but regularly wraps it in markdown
//! fences, surrounds it with prose, or emits almost-JSON. Decoding goes:
//!
//! 1. strip a surrounding ```` ```json ```` / ```` ``` ```` fence
//! 2. keep the span from the first `{` to the last `}`
//! 3. strict parse, then one repair pass and a second parse
//! 4. check required fields, top-level and per material
//! 5. typed deserialisation

use chantier_core::{Estimation, EstimationMaterial};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::repair::repair;

/// Top-level fields every estimate must carry.
pub const REQUIRED_FIELDS: &[&str] = &["tempsRealisation", "materiaux", "nombreOuvriers", "coutTotal"];

/// Fields every material line must carry.
pub const REQUIRED_MATERIAL_FIELDS: &[&str] = &["nom", "quantite", "unite", "prixTotal"];

/// Raw content kept in errors is truncated to this many characters.
const RAW_EXCERPT_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("estimator returned an empty response")]
    EmptyResponse,

    #[error("estimator response is not valid JSON: {source}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
        /// Excerpt of the raw response, for diagnostics.
        raw: String,
    },

    #[error("invalid estimate: `{field}`{}: {reason}", material_suffix(.index))]
    SchemaValidation {
        field: String,
        /// Index of the offending material line, if the problem is inside one.
        index: Option<usize>,
        reason: String,
    },
}

fn material_suffix(index: &Option<usize>) -> String {
    index.map(|i| format!(" (material {i})")).unwrap_or_default()
}

impl DecodeError {
    fn missing(field: &str, index: Option<usize>) -> Self {
        Self::SchemaValidation {
            field: field.to_string(),
            index,
            reason: "missing required field".into(),
        }
    }

    fn invalid(field: &str, index: Option<usize>, reason: impl Into<String>) -> Self {
        Self::SchemaValidation {
            field: field.to_string(),
            index,
            reason: reason.into(),
        }
    }
}

/// Decode raw estimator text into an [`Estimation`].
pub fn decode(raw: &str) -> Result<Estimation, DecodeError> {
    if raw.trim().is_empty() {
        return Err(DecodeError::EmptyResponse);
    }

    let candidate = extract_object(strip_fences(raw));
    let value = parse_with_repair(candidate).map_err(|source| DecodeError::MalformedResponse {
        source,
        raw: raw.chars().take(RAW_EXCERPT_CHARS).collect(),
    })?;

    let object = value
        .as_object()
        .ok_or_else(|| DecodeError::invalid("estimation", None, "expected a JSON object"))?;
    validate(object)?;
    into_estimation(value)
}

/// Remove a markdown code fence wrapping the whole text.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `JSON`, ...) up to the end of the first line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Keep the span from the first `{` to the last `}` when the text is not
/// already a bare object.
pub fn extract_object(text: &str) -> &str {
    let text = text.trim();
    if text.starts_with('{') && text.ends_with('}') {
        return text;
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn parse_with_repair(text: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            debug!(error = %strict_err, "strict parse failed, attempting repair");
            match serde_json::from_str(&repair(text)) {
                Ok(value) => {
                    warn!(error = %strict_err, "estimator response needed JSON repair");
                    Ok(value)
                }
                Err(_) => Err(strict_err),
            }
        }
    }
}

fn is_present(object: &Map<String, Value>, field: &str) -> bool {
    object.get(field).is_some_and(|v| !v.is_null())
}

fn validate(object: &Map<String, Value>) -> Result<(), DecodeError> {
    for field in REQUIRED_FIELDS {
        if !is_present(object, field) {
            return Err(DecodeError::missing(field, None));
        }
    }

    let materials = object["materiaux"]
        .as_array()
        .ok_or_else(|| DecodeError::invalid("materiaux", None, "expected an array"))?;

    for (index, material) in materials.iter().enumerate() {
        let line = material
            .as_object()
            .ok_or_else(|| DecodeError::invalid("materiaux", Some(index), "expected an object"))?;
        for field in REQUIRED_MATERIAL_FIELDS {
            if !is_present(line, field) {
                return Err(DecodeError::missing(field, Some(index)));
            }
        }
    }
    Ok(())
}

fn into_estimation(mut value: Value) -> Result<Estimation, DecodeError> {
    // Material lines are decoded one by one so type errors carry their index.
    let raw_materials = value
        .get_mut("materiaux")
        .map(Value::take)
        .unwrap_or_default();
    let mut materials = Vec::new();
    if let Value::Array(items) = raw_materials {
        for (index, item) in items.into_iter().enumerate() {
            let material = EstimationMaterial::deserialize(item)
                .map_err(|e| DecodeError::invalid("materiaux", Some(index), e.to_string()))?;
            materials.push(material);
        }
    }
    value["materiaux"] = Value::Array(Vec::new());

    let mut estimation = Estimation::<EstimationMaterial>::deserialize(value)
        .map_err(|e| DecodeError::invalid("estimation", None, e.to_string()))?;
    estimation.materials = materials;
    Ok(estimation)
}
