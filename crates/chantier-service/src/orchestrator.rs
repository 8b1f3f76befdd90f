//! One estimation request, end to end.

use std::sync::Arc;

use chantier_ai::{Enricher, EnrichmentSummary, decode};
use chantier_core::{EnrichedEstimation, EstimateRequest, JobParameters};
use chantier_store::CatalogStore;
use chantier_sync::EstimationBackend;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::EstimateError;
use crate::images::{ImageRejection, RawImage, ServiceLimits, check_images};

/// A successful estimation, with the images that were left out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationOutcome {
    pub estimation: EnrichedEstimation,
    pub summary: EnrichmentSummary,
    /// Non-empty means the estimate was built from a subset of the upload.
    pub rejected: Vec<ImageRejection>,
    pub produced_at: DateTime<Utc>,
}

pub struct Orchestrator {
    catalog: Arc<dyn CatalogStore>,
    backend: Arc<dyn EstimationBackend>,
    enricher: Enricher,
    limits: ServiceLimits,
}

impl Orchestrator {
    pub fn new(catalog: Arc<dyn CatalogStore>, backend: Arc<dyn EstimationBackend>) -> Self {
        Self {
            catalog,
            backend,
            enricher: Enricher::default(),
            limits: ServiceLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ServiceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_enricher(mut self, enricher: Enricher) -> Self {
        self.enricher = enricher;
        self
    }

    pub fn limits(&self) -> &ServiceLimits {
        &self.limits
    }

    /// Validate images, snapshot the catalog, ask the estimator, then decode
    /// and enrich its answer against that same snapshot.
    ///
    /// Rejected images only abort the request when none are left. Nothing is
    /// retried.
    pub async fn produce_estimation(
        &self,
        images: Vec<RawImage>,
        job: JobParameters,
    ) -> Result<EstimationOutcome, EstimateError> {
        let check = check_images(images, &self.limits).await;
        if check.accepted.is_empty() {
            return Err(EstimateError::NoValidImages {
                rejected: check.rejected,
            });
        }
        if !check.rejected.is_empty() {
            warn!(
                rejected = check.rejected.len(),
                accepted = check.accepted.len(),
                "continuing with a subset of the images"
            );
        }

        let catalog = self.catalog.list().await?;
        info!(materials = catalog.len(), "catalog snapshot loaded");

        let request = EstimateRequest::new(job, &catalog, check.accepted)?;
        let size = request.payload_size()?;
        if size > self.limits.max_payload_bytes {
            return Err(EstimateError::PayloadTooLarge {
                size,
                limit: self.limits.max_payload_bytes,
            });
        }

        let raw = self.backend.generate(&request).await.inspect_err(|e| {
            warn!(error = %e, failure = ?e.failure(), "estimator call failed");
        })?;
        let estimation = decode(&raw)?;
        let estimation = self.enricher.enrich(estimation, &catalog);
        let summary = EnrichmentSummary::of(&estimation);

        Ok(EstimationOutcome {
            estimation,
            summary,
            rejected: check.rejected,
            produced_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chantier_core::CatalogMaterial;
    use chantier_store::MemoryCatalog;
    use chantier_sync::UpstreamError;

    use super::*;
    use crate::images::RejectReason;
    use crate::images::fixtures::png;

    /// Replays a canned answer and records what it was asked.
    struct CannedBackend {
        answer: Result<String, (u16, String)>,
        seen: Mutex<Vec<EstimateRequest>>,
    }

    impl CannedBackend {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Err((status, body.to_string())),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EstimationBackend for CannedBackend {
        async fn generate(&self, request: &EstimateRequest) -> Result<String, UpstreamError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err((status, body)) => Err(UpstreamError::Server {
                    status: *status,
                    body: body.clone(),
                }),
            }
        }
    }

    const ANSWER: &str = r#"Voici l'estimation :
```json
{
  "tempsRealisation": "2 jours",
  "nombreOuvriers": 1,
  "materiaux": [
    {"nom": "Carrelage gres 60x60 blanc", "quantite": "2 m²", "unite": "m²", "prixUnitaire": 14, "prixTotal": 28},
    {"nom": "Ragréage fibré", "quantite": 1, "unite": "sac", "prixUnitaire": 50, "prixTotal": 50},
  ],
  "repartitionCouts": {"materiaux": 78, "mainOeuvre": 100, "transport": 10, "outillage": 5, "gestionDechets": 5},
  "coutTotal": 198,
  "marge": 30,
  "benefice": 12,
  "recommandations": ["Prévoir un primaire d'accrochage"]
}
```"#;

    fn catalog() -> Arc<MemoryCatalog> {
        Arc::new(MemoryCatalog::new(vec![
            CatalogMaterial::new("tile-60", "Carrelage gres 60x60 blanc mat", 10.0, "m²"),
            CatalogMaterial::new("joint", "Joint époxy", 32.0, "kg"),
        ]))
    }

    fn job() -> JobParameters {
        JobParameters {
            surface: 2.0,
            job_type: "Pose de carrelage".into(),
            ..JobParameters::default()
        }
    }

    #[tokio::test]
    async fn end_to_end_enriches_against_catalog() {
        let backend = CannedBackend::ok(ANSWER);
        let service = Orchestrator::new(catalog(), backend.clone());
        let images = vec![
            RawImage::new("sol.png", png(600, 600)),
            RawImage::new("detail.png", png(120, 120)),
        ];

        let outcome = service.produce_estimation(images, job()).await.unwrap();
        let est = &outcome.estimation;

        let tile = &est.materials[0];
        assert!(tile.is_real_price);
        assert_eq!(tile.catalog_material_id.as_deref(), Some("tile-60"));
        assert!((tile.confidence.unwrap() - 0.9).abs() < 1e-9);
        assert_eq!(tile.line.total_price, 20.0);

        let screed = &est.materials[1];
        assert!(!screed.is_real_price);
        assert_eq!(screed.confidence, Some(0.0));
        assert_eq!(screed.needs_adding, Some(true));
        assert_eq!(screed.line.total_price, 50.0);

        assert_eq!(est.cost_breakdown.materials, Some(70.0));
        assert_eq!(est.total_cost, 190.0);
        assert_eq!(est.profit, Some(30.0));
        assert_eq!(outcome.summary.matched, 1);
        assert_eq!(outcome.summary.needs_adding, 1);

        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].name, "detail.png");
        assert!(matches!(
            outcome.rejected[0].reason,
            RejectReason::ResolutionTooLow { .. }
        ));

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].images.len(), 1);
        assert_eq!(seen[0].catalog().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn all_images_rejected_skips_upstream() {
        let backend = CannedBackend::ok(ANSWER);
        let service = Orchestrator::new(catalog(), backend.clone());
        let images = vec![
            RawImage::new("a.png", png(50, 50)),
            RawImage::new("b.gif", b"GIF89a".to_vec()),
        ];

        let err = service.produce_estimation(images, job()).await.unwrap_err();
        match &err {
            EstimateError::NoValidImages { rejected } => assert_eq!(rejected.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.status_code(), 400);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn empty_upload_is_no_valid_images() {
        let backend = CannedBackend::ok(ANSWER);
        let service = Orchestrator::new(catalog(), backend.clone());
        let err = service.produce_estimation(Vec::new(), job()).await.unwrap_err();
        assert_eq!(err.kind(), "no_valid_images");
    }

    #[tokio::test]
    async fn payload_budget_is_checked_before_sending() {
        let backend = CannedBackend::ok(ANSWER);
        let service = Orchestrator::new(catalog(), backend.clone()).with_limits(ServiceLimits {
            max_payload_bytes: 512,
            ..ServiceLimits::default()
        });
        let err = service
            .produce_estimation(vec![RawImage::new("sol.png", png(600, 600))], job())
            .await
            .unwrap_err();
        assert!(matches!(err, EstimateError::PayloadTooLarge { limit: 512, .. }));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_is_classified() {
        let backend = CannedBackend::failing(429, "rate_limit_error: too many requests");
        let service = Orchestrator::new(catalog(), backend);
        let err = service
            .produce_estimation(vec![RawImage::new("sol.png", png(600, 600))], job())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream_rate_limited");
        assert_eq!(err.notice().title, "Trop de demandes");
    }

    #[tokio::test]
    async fn undecodable_answer_surfaces_decode_error() {
        let service = Orchestrator::new(catalog(), CannedBackend::ok("désolé, je ne peux pas"));
        let err = service
            .produce_estimation(vec![RawImage::new("sol.png", png(600, 600))], job())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn empty_catalog_leaves_estimate_prices() {
        let service = Orchestrator::new(Arc::new(MemoryCatalog::default()), CannedBackend::ok(ANSWER));
        let outcome = service
            .produce_estimation(vec![RawImage::new("sol.png", png(600, 600))], job())
            .await
            .unwrap();
        assert_eq!(outcome.summary.matched, 0);
        assert_eq!(outcome.estimation.cost_breakdown.materials, Some(78.0));
        assert_eq!(outcome.estimation.total_cost, 198.0);
    }
}
