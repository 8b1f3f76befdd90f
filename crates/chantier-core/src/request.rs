//! Outbound estimation request: job parameters, catalog context, images.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogMaterial;
use crate::lenient;

/// What the user describes about the job before asking for an estimate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobParameters {
    /// Surface in m².
    #[serde(deserialize_with = "lenient::amount")]
    pub surface: f64,
    pub job_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

/// A validated image, base64-encoded for transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub name: String,
    /// e.g. `image/jpeg`
    pub media_type: String,
    pub data: String,
}

/// Body sent to the estimation endpoint.
///
/// The catalog travels as a JSON string, matching what the endpoint forwards
/// verbatim into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    #[serde(flatten)]
    pub job: JobParameters,
    pub materials_catalog: String,
    pub images: Vec<EncodedImage>,
}

impl EstimateRequest {
    pub fn new(
        job: JobParameters,
        catalog: &[CatalogMaterial],
        images: Vec<EncodedImage>,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            job,
            materials_catalog: serde_json::to_string(catalog)?,
            images,
        })
    }

    /// Serialised body size in bytes.
    pub fn payload_size(&self) -> serde_json::Result<usize> {
        Ok(serde_json::to_vec(self)?.len())
    }

    /// Decode the embedded catalog string.
    pub fn catalog(&self) -> serde_json::Result<Vec<CatalogMaterial>> {
        if self.materials_catalog.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.materials_catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobParameters {
        JobParameters {
            surface: 25.0,
            job_type: "carrelage".into(),
            materials_description: Some("grès cérame 60x60".into()),
            location: Some("Lyon".into()),
            deadline: None,
        }
    }

    #[test]
    fn request_flattens_job_and_embeds_catalog_string() {
        let catalog = vec![CatalogMaterial::new("m1", "Colle", 12.0, "sac")];
        let req = EstimateRequest::new(job(), &catalog, Vec::new()).unwrap();
        let out = serde_json::to_value(&req).unwrap();
        assert_eq!(out["jobType"], "carrelage");
        assert_eq!(out["surface"], 25.0);
        assert!(out.get("deadline").is_none());
        assert!(out["materialsCatalog"].is_string());
        assert_eq!(req.catalog().unwrap(), catalog);
    }

    #[test]
    fn payload_size_grows_with_images() {
        let empty = EstimateRequest::new(job(), &[], Vec::new()).unwrap();
        let with_image = EstimateRequest::new(
            job(),
            &[],
            vec![EncodedImage {
                name: "sol.jpg".into(),
                media_type: "image/jpeg".into(),
                data: "A".repeat(1000),
            }],
        )
        .unwrap();
        assert!(with_image.payload_size().unwrap() > empty.payload_size().unwrap() + 1000);
    }

    #[test]
    fn surface_accepts_text() {
        let job: JobParameters =
            serde_json::from_str(r#"{"surface": "45 m²", "jobType": "peinture"}"#).unwrap();
        assert_eq!(job.surface, 45.0);
        assert_eq!(job.location, None);
    }
}
