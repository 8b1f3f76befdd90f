//! Materials from the user's own library, with authoritative prices.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// A material the user maintains in their library.
///
/// Read-only from the estimation side: prices here override whatever the
/// estimator guessed once a line is confidently matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMaterial {
    pub id: String,
    #[serde(alias = "nom")]
    pub name: String,
    #[serde(
        alias = "prixUnitaire",
        alias = "prix",
        deserialize_with = "lenient::amount"
    )]
    pub unit_price: f64,
    #[serde(default, alias = "unite")]
    pub unit: String,
}

impl CatalogMaterial {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            unit: unit.into(),
        }
    }
}
