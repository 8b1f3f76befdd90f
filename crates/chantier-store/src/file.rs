//! JSON-file catalog: one array of materials on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chantier_core::CatalogMaterial;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{CatalogStore, StoreError, remove_from, upsert_into, validate};

/// Catalog persisted as a pretty-printed JSON array.
///
/// A missing file reads as an empty catalog. Writes go to a sibling temp
/// file that is renamed over the original, so readers never see a partial
/// file. Mutations within one process are serialised.
pub struct JsonFileCatalog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<CatalogMaterial>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "catalog file absent, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    async fn write_all(&self, materials: &[CatalogMaterial]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(materials)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        info!(count = materials.len(), path = %self.path.display(), "saved catalog");
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for JsonFileCatalog {
    async fn list(&self) -> Result<Vec<CatalogMaterial>, StoreError> {
        let materials = self.read_all().await?;
        info!(count = materials.len(), "loaded catalog");
        Ok(materials)
    }

    async fn get(&self, id: &str) -> Result<Option<CatalogMaterial>, StoreError> {
        Ok(self.read_all().await?.into_iter().find(|m| m.id == id))
    }

    async fn upsert(&self, material: CatalogMaterial) -> Result<(), StoreError> {
        validate(&material)?;
        let _guard = self.write_lock.lock().await;
        let mut materials = self.read_all().await?;
        let id = material.id.clone();
        let replaced = upsert_into(&mut materials, material);
        debug!(id = %id, replaced, "upserting catalog material");
        self.write_all(&materials).await
    }

    async fn remove(&self, id: &str) -> Result<CatalogMaterial, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut materials = self.read_all().await?;
        let removed = remove_from(&mut materials, id)?;
        self.write_all(&materials).await?;
        Ok(removed)
    }
}
