use crate::catalog::{CatalogStore, InMemoryCatalog};
use crate::config::{CatalogBackend, CatalogConfig};
use crate::error::{AppError, Result};
use crate::models::{Application, ClosureCode, IncidentRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A full catalog snapshot, the standalone stand-in for the upstream
/// incident-management database
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub applications: Vec<Application>,

    #[serde(default)]
    pub closure_codes: Vec<ClosureCode>,

    #[serde(default)]
    pub incidents: Vec<IncidentRecord>,
}

impl CatalogSnapshot {
    /// Load a snapshot from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Database(format!(
                "Failed to read catalog snapshot {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Materialize the snapshot into an in-memory catalog
    pub fn into_catalog(self) -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        for application in self.applications {
            catalog.insert_application(application);
        }
        for code in self.closure_codes {
            catalog.insert_closure_code(code);
        }
        for incident in self.incidents {
            catalog.insert_incident(incident);
        }
        catalog
    }
}

/// Create a catalog store from configuration
pub fn create_catalog(config: &CatalogConfig) -> Result<Arc<dyn CatalogStore>> {
    match config.backend {
        CatalogBackend::Memory => {
            tracing::info!("Using empty in-memory catalog");
            Ok(Arc::new(InMemoryCatalog::new()))
        }
        CatalogBackend::JsonSnapshot => {
            let path = config.snapshot_path.as_ref().ok_or_else(|| {
                AppError::Configuration(
                    "catalog.snapshot_path is required for the json_snapshot backend".to_string(),
                )
            })?;

            let snapshot = CatalogSnapshot::from_file(path)?;
            tracing::info!(
                path = %path.display(),
                applications = snapshot.applications.len(),
                closure_codes = snapshot.closure_codes.len(),
                incidents = snapshot.incidents.len(),
                "Catalog snapshot loaded"
            );
            Ok(Arc::new(snapshot.into_catalog()))
        }
    }
}
