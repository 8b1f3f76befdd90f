//! Price enrichment: replace estimated prices with catalog prices where the
//! match is confident, then recompute the totals.

use chantier_core::{
    CatalogMaterial, EnrichedEstimation, EnrichedMaterial, Estimation, EstimationMaterial,
    Quantity, round_cents,
};
use serde::Serialize;
use tracing::info;

use crate::matcher::{MatchQuery, find_best_match};

/// Minimum confidence for a catalog price to replace the estimated one.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.7;

/// Unit assumed for lines where the estimator left it blank.
const DEFAULT_UNIT: &str = "unite";

/// Reconciles decoded estimates against a catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Enricher {
    threshold: f64,
}

impl Default for Enricher {
    fn default() -> Self {
        Self {
            threshold: ACCEPTANCE_THRESHOLD,
        }
    }
}

/// Outcome counts of one enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentSummary {
    pub matched: usize,
    pub needs_adding: usize,
    pub materials_total: f64,
    pub total_cost: f64,
}

impl EnrichmentSummary {
    pub fn of(estimation: &EnrichedEstimation) -> Self {
        let matched = estimation.matched_count();
        Self {
            matched,
            needs_adding: estimation.materials.len() - matched,
            materials_total: estimation.cost_breakdown.materials.unwrap_or(0.0),
            total_cost: estimation.total_cost,
        }
    }
}

impl Enricher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Price every material line from the catalog where possible and
    /// recompute `materiaux`, `coutTotal` and `benefice`.
    ///
    /// Non-material breakdown components are kept as given; absent ones count
    /// as 0. Pure: the same estimate and catalog always give the same result.
    pub fn enrich(&self, estimation: Estimation, catalog: &[CatalogMaterial]) -> EnrichedEstimation {
        let mut enriched = estimation.map_materials(|line| self.enrich_line(line, catalog));

        let materials_total = round_cents(enriched.materials_total());
        let breakdown = &mut enriched.cost_breakdown;
        breakdown.materials = Some(materials_total);
        let total_cost = round_cents(materials_total + breakdown.non_material_total());
        enriched.total_cost = total_cost;

        // Algebraically this is just the margin.
        let margin = enriched.margin.unwrap_or(0.0);
        enriched.profit = Some(round_cents(total_cost - (total_cost - margin)));

        let summary = EnrichmentSummary::of(&enriched);
        info!(
            lines = enriched.materials.len(),
            matched = summary.matched,
            needs_adding = summary.needs_adding,
            materials_total,
            total_cost,
            "enriched estimate"
        );
        enriched
    }

    fn enrich_line(&self, line: EstimationMaterial, catalog: &[CatalogMaterial]) -> EnrichedMaterial {
        let quantity = line.quantity.numeric();
        let unit = if line.unit.trim().is_empty() {
            DEFAULT_UNIT
        } else {
            line.unit.as_str()
        };
        let query = MatchQuery {
            name: &line.name,
            quantity: Quantity::Number(quantity),
            unit,
            unit_price: line.unit_price.unwrap_or(0.0),
            total_price: line.total_price,
        };
        let best = find_best_match(&query, catalog);

        match best {
            Some(m) if m.confidence >= self.threshold => EnrichedMaterial {
                line: EstimationMaterial {
                    unit_price: Some(m.material.unit_price),
                    total_price: m.computed_price,
                    ..line
                },
                is_real_price: true,
                catalog_material_id: Some(m.material.id.clone()),
                confidence: Some(m.confidence),
                needs_adding: None,
            },
            other => EnrichedMaterial {
                line,
                is_real_price: false,
                catalog_material_id: None,
                confidence: Some(other.map_or(0.0, |m| m.confidence)),
                needs_adding: Some(true),
            },
        }
    }
}
