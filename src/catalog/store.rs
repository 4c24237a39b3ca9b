use crate::catalog::CatalogStore;
use crate::error::Result;
use crate::models::{Application, ClosureCode, IncidentRecord};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory catalog (for standalone deployments and testing)
#[derive(Clone)]
pub struct InMemoryCatalog {
    applications: Arc<DashMap<i64, Application>>,
    closure_codes: Arc<DashMap<i64, ClosureCode>>,
    incidents: Arc<DashMap<Uuid, IncidentRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            applications: Arc::new(DashMap::new()),
            closure_codes: Arc::new(DashMap::new()),
            incidents: Arc::new(DashMap::new()),
        }
    }

    pub fn insert_application(&self, application: Application) {
        self.applications.insert(application.id, application);
    }

    pub fn insert_closure_code(&self, code: ClosureCode) {
        self.closure_codes.insert(code.id, code);
    }

    pub fn insert_incident(&self, incident: IncidentRecord) {
        self.incidents.insert(incident.id, incident);
    }

    /// Remove a closure code from the catalog. Codes already baked into a
    /// model artifact become stale references and are skipped at query time.
    pub fn remove_closure_code(&self, id: i64) -> Option<ClosureCode> {
        self.closure_codes.remove(&id).map(|(_, code)| code)
    }

    pub fn closure_code_count(&self) -> usize {
        self.closure_codes.len()
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn list_closure_codes(&self) -> Result<Vec<ClosureCode>> {
        let mut codes: Vec<ClosureCode> = self
            .closure_codes
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        // Stable catalog order so repeated model builds see the same rows
        codes.sort_by_key(|code| code.id);
        Ok(codes)
    }

    async fn get_closure_code(&self, id: i64) -> Result<Option<ClosureCode>> {
        Ok(self.closure_codes.get(&id).map(|entry| entry.clone()))
    }

    async fn recent_incidents_for_code(
        &self,
        code_id: i64,
        limit: usize,
    ) -> Result<Vec<IncidentRecord>> {
        let mut incidents: Vec<IncidentRecord> = self
            .incidents
            .iter()
            .filter(|entry| entry.value().closure_code_id == code_id)
            .map(|entry| entry.value().clone())
            .collect();

        // Newest first
        incidents.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));
        incidents.truncate(limit);

        Ok(incidents)
    }
}
