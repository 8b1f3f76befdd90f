//! In-memory catalog, for tests and one-off runs.

use async_trait::async_trait;
use chantier_core::CatalogMaterial;
use tokio::sync::RwLock;

use crate::{CatalogStore, StoreError, remove_from, upsert_into, validate};

#[derive(Default)]
pub struct MemoryCatalog {
    materials: RwLock<Vec<CatalogMaterial>>,
}

impl MemoryCatalog {
    pub fn new(materials: Vec<CatalogMaterial>) -> Self {
        Self {
            materials: RwLock::new(materials),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn list(&self) -> Result<Vec<CatalogMaterial>, StoreError> {
        Ok(self.materials.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<CatalogMaterial>, StoreError> {
        Ok(self.materials.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn upsert(&self, material: CatalogMaterial) -> Result<(), StoreError> {
        validate(&material)?;
        upsert_into(&mut *self.materials.write().await, material);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<CatalogMaterial, StoreError> {
        remove_from(&mut *self.materials.write().await, id)
    }
}
