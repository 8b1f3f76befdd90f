//! Cost estimation types as exchanged with the upstream estimator.
//!
//! Wire names are the French keys the estimator is prompted to produce
//! (`materiaux`, `prixTotal`, ...). Enrichment markers use the camelCase
//! names the front end reads (`isRealPrice`, `catalogMaterialId`, ...).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;
use crate::quantity::Quantity;

/// One material line as produced by the estimator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EstimationMaterial {
    #[serde(rename = "nom", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "quantite", default, deserialize_with = "lenient::or_default")]
    pub quantity: Quantity,
    #[serde(rename = "unite", default, deserialize_with = "lenient::text")]
    pub unit: String,
    #[serde(
        rename = "prixUnitaire",
        default,
        deserialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_price: Option<f64>,
    #[serde(rename = "prixTotal", default, deserialize_with = "lenient::amount")]
    pub total_price: f64,
    #[serde(
        rename = "coefficientPerte",
        default,
        deserialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub loss_coefficient: Option<f64>,
}

/// A material line after reconciliation against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedMaterial {
    #[serde(flatten)]
    pub line: EstimationMaterial,
    #[serde(rename = "isRealPrice")]
    pub is_real_price: bool,
    #[serde(
        rename = "catalogMaterialId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub catalog_material_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(rename = "needsAdding", default, skip_serializing_if = "Option::is_none")]
    pub needs_adding: Option<bool>,
}

/// Access to the underlying estimator line, enriched or not.
pub trait MaterialLine {
    fn line(&self) -> &EstimationMaterial;
}

impl MaterialLine for EstimationMaterial {
    fn line(&self) -> &EstimationMaterial {
        self
    }
}

impl MaterialLine for EnrichedMaterial {
    fn line(&self) -> &EstimationMaterial {
        &self.line
    }
}

/// Cost split reported by the estimator. Absent components count as 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    #[serde(
        rename = "materiaux",
        default,
        deserialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub materials: Option<f64>,
    #[serde(
        rename = "mainOeuvre",
        default,
        deserialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub labor: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub transport: Option<f64>,
    #[serde(
        rename = "outillage",
        default,
        deserialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub tooling: Option<f64>,
    #[serde(
        rename = "gestionDechets",
        default,
        deserialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub waste_management: Option<f64>,
}

impl CostBreakdown {
    /// Sum of every non-material component.
    pub fn non_material_total(&self) -> f64 {
        self.labor.unwrap_or(0.0)
            + self.transport.unwrap_or(0.0)
            + self.tooling.unwrap_or(0.0)
            + self.waste_management.unwrap_or(0.0)
    }
}

/// A full cost estimate. `M` is the material line type: the raw
/// [`EstimationMaterial`] straight from the decoder, or [`EnrichedMaterial`]
/// once prices were reconciled.
///
/// Top-level fields the estimator adds beyond the known ones are kept in
/// `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimation<M = EstimationMaterial> {
    #[serde(rename = "tempsRealisation", deserialize_with = "lenient::text")]
    pub labor_time: String,
    #[serde(rename = "materiaux")]
    pub materials: Vec<M>,
    #[serde(rename = "nombreOuvriers", deserialize_with = "lenient::count")]
    pub worker_count: u32,
    #[serde(rename = "coutTotal", deserialize_with = "lenient::amount")]
    pub total_cost: f64,
    #[serde(
        rename = "repartitionCouts",
        default,
        deserialize_with = "lenient::or_default"
    )]
    pub cost_breakdown: CostBreakdown,
    #[serde(
        rename = "marge",
        default,
        deserialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub margin: Option<f64>,
    #[serde(
        rename = "benefice",
        default,
        deserialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub profit: Option<f64>,
    #[serde(
        rename = "recommandations",
        default,
        deserialize_with = "lenient::or_default"
    )]
    pub recommendations: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An estimate whose material lines were reconciled against the catalog.
pub type EnrichedEstimation = Estimation<EnrichedMaterial>;

impl<M: MaterialLine> Estimation<M> {
    /// Sum of every line's total price, unrounded.
    pub fn materials_total(&self) -> f64 {
        self.materials.iter().map(|m| m.line().total_price).sum()
    }
}

impl<M> Estimation<M> {
    /// Rebuild the estimate with a different material line type.
    pub fn map_materials<N>(self, f: impl FnMut(M) -> N) -> Estimation<N> {
        Estimation {
            labor_time: self.labor_time,
            materials: self.materials.into_iter().map(f).collect(),
            worker_count: self.worker_count,
            total_cost: self.total_cost,
            cost_breakdown: self.cost_breakdown,
            margin: self.margin,
            profit: self.profit,
            recommendations: self.recommendations,
            extra: self.extra,
        }
    }
}

impl EnrichedEstimation {
    /// Drop the enrichment markers, keeping current prices, so the estimate
    /// can be reconciled again (e.g. after the catalog changed).
    pub fn into_estimation(self) -> Estimation {
        self.map_materials(|m| m.line)
    }

    /// Lines that were priced from the catalog.
    pub fn matched_count(&self) -> usize {
        self.materials.iter().filter(|m| m.is_real_price).count()
    }
}
