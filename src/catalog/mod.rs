pub mod factory;
pub mod store;

pub use factory::{create_catalog, CatalogSnapshot};
pub use store::InMemoryCatalog;

use crate::error::Result;
use crate::models::{ClosureCode, IncidentRecord};
use async_trait::async_trait;

/// Read-only access to the closure-code catalog and incident history.
///
/// The recommender never writes through this trait; the catalog is owned by
/// the surrounding incident-management system.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// List all closure codes, in stable catalog order
    async fn list_closure_codes(&self) -> Result<Vec<ClosureCode>>;

    /// Get a closure code by id
    async fn get_closure_code(&self, id: i64) -> Result<Option<ClosureCode>>;

    /// The most recent incidents resolved with the given closure code,
    /// ordered by opening timestamp descending, at most `limit` records
    async fn recent_incidents_for_code(
        &self,
        code_id: i64,
        limit: usize,
    ) -> Result<Vec<IncidentRecord>>;
}
