//! Storage layer for the material catalog.
//!
//! The catalog is a plain record store reachable through CRUD operations.
//! Estimation only ever reads a snapshot of it through [`CatalogStore::list`].

mod error;
pub use error::StoreError;

mod file;
mod memory;
pub use file::JsonFileCatalog;
pub use memory::MemoryCatalog;

use async_trait::async_trait;
use chantier_core::CatalogMaterial;

/// CRUD access to the user's material library.
///
/// `list` returns materials in insertion order; the matcher relies on that
/// order to break ties deterministically.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list(&self) -> Result<Vec<CatalogMaterial>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<CatalogMaterial>, StoreError>;

    /// Insert a material, or replace the one with the same id in place.
    async fn upsert(&self, material: CatalogMaterial) -> Result<(), StoreError>;

    /// Remove and return a material.
    async fn remove(&self, id: &str) -> Result<CatalogMaterial, StoreError>;
}

fn validate(material: &CatalogMaterial) -> Result<(), StoreError> {
    if material.id.trim().is_empty() {
        return Err(StoreError::Invalid("empty id".into()));
    }
    if material.name.trim().is_empty() {
        return Err(StoreError::Invalid(format!("material {} has no name", material.id)));
    }
    if !material.unit_price.is_finite() || material.unit_price < 0.0 {
        return Err(StoreError::Invalid(format!(
            "material {} has unit price {}",
            material.id, material.unit_price
        )));
    }
    Ok(())
}

/// Returns `true` when an existing entry was replaced.
fn upsert_into(materials: &mut Vec<CatalogMaterial>, material: CatalogMaterial) -> bool {
    match materials.iter_mut().find(|m| m.id == material.id) {
        Some(existing) => {
            *existing = material;
            true
        }
        None => {
            materials.push(material);
            false
        }
    }
}

fn remove_from(
    materials: &mut Vec<CatalogMaterial>,
    id: &str,
) -> Result<CatalogMaterial, StoreError> {
    let idx = materials
        .iter()
        .position(|m| m.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    Ok(materials.remove(idx))
}
