use crate::catalog::CatalogStore;
use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::recommender::artifact::{ArtifactStore, ModelArtifact};
use crate::recommender::builder::{normalize_text, ModelBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Action recommended to the operator for a single suggestion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    /// Score cleared the similarity threshold; safe to apply directly
    UseSuggestion,

    /// Low-confidence match; operator should review before applying
    Review,
}

/// One ranked closure-code suggestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Closure-code catalog identifier
    pub closure_code_id: i64,

    /// Short code
    pub code: String,

    /// Code description
    pub description: String,

    /// Confidence as a percentage string (e.g. "87.50%")
    pub confidence: String,

    /// Raw cosine similarity in [0, 1]
    pub raw_score: f64,

    /// Recommended action
    pub action: RecommendedAction,

    /// Human-readable match quality
    pub message: String,
}

/// Model status, for operators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStats {
    pub loaded: bool,
    pub document_count: usize,
    pub vocab_size: usize,
    pub trained_at: Option<DateTime<Utc>>,
}

/// Online closure-code recommendation service.
///
/// Holds at most one loaded model artifact behind a swap-on-write cell.
/// Concurrent queries share the artifact read-only; `reload` builds a
/// complete replacement off-lock and swaps it in atomically, so in-flight
/// queries keep using the old artifact until the swap lands.
pub struct RecommenderService {
    config: ModelConfig,
    catalog: Arc<dyn CatalogStore>,
    builder: ModelBuilder,
    artifact_store: ArtifactStore,
    model: RwLock<Option<Arc<ModelArtifact>>>,
}

impl RecommenderService {
    pub fn new(catalog: Arc<dyn CatalogStore>, config: ModelConfig) -> Self {
        let artifact_store = ArtifactStore::new(config.artifact_path.clone());
        let builder = ModelBuilder::new(catalog.clone(), config.clone());

        Self {
            config,
            catalog,
            builder,
            artifact_store,
            model: RwLock::new(None),
        }
    }

    /// Load the model artifact from disk.
    ///
    /// On failure the service reports `ServiceUnavailable` and any
    /// previously loaded artifact keeps serving; a bad load never clears
    /// good state.
    pub async fn load(&self) -> Result<()> {
        match self.artifact_store.load() {
            Ok(artifact) => {
                info!(
                    documents = artifact.document_count(),
                    vocab_size = artifact.vectorizer.vocab_size(),
                    "Similarity model loaded"
                );
                *self.model.write().await = Some(Arc::new(artifact));
                Ok(())
            }
            Err(e) => {
                warn!(
                    path = %self.artifact_store.path().display(),
                    error = %e,
                    "Could not load similarity model; run the trainer to create it"
                );
                Err(AppError::ServiceUnavailable(format!(
                    "No model artifact could be loaded: {}",
                    e
                )))
            }
        }
    }

    /// Retrain from the current catalog, persist, and reload.
    ///
    /// Safe to call while queries are in flight: the build runs without
    /// touching the live model, and a failed build leaves the last good
    /// artifact serving.
    pub async fn reload(&self) -> Result<ModelStats> {
        info!("Manual model retraining requested");
        self.builder.build_and_save(&self.artifact_store).await?;
        self.load().await?;
        Ok(self.stats().await)
    }

    /// Whether a model artifact is currently loaded
    pub async fn is_loaded(&self) -> bool {
        self.model.read().await.is_some()
    }

    /// Current model status
    pub async fn stats(&self) -> ModelStats {
        match self.current_model().await {
            Some(model) => ModelStats {
                loaded: true,
                document_count: model.document_count(),
                vocab_size: model.vectorizer.vocab_size(),
                trained_at: Some(model.trained_at),
            },
            None => ModelStats {
                loaded: false,
                document_count: 0,
                vocab_size: 0,
                trained_at: None,
            },
        }
    }

    async fn current_model(&self) -> Option<Arc<ModelArtifact>> {
        self.model.read().await.clone()
    }

    /// Rank the closure codes most similar to a free-text description.
    ///
    /// With `application_id` set, only codes visible under that application
    /// qualify: unscoped codes always do, scoped codes only when their
    /// app-set contains the id. Ties rank stably by catalog row order.
    pub async fn recommend(
        &self,
        description: &str,
        application_id: Option<i64>,
    ) -> Result<Vec<Suggestion>> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::Validation(
                "Description must not be empty".to_string(),
            ));
        }

        // Lazy load: the artifact may have been trained after startup
        let model = match self.current_model().await {
            Some(model) => model,
            None => {
                self.load().await?;
                self.current_model().await.ok_or_else(|| {
                    AppError::ServiceUnavailable("No model artifact is loaded".to_string())
                })?
            }
        };

        // Candidate rows under the application-scope filter
        let candidates: Vec<(usize, i64)> = model
            .code_ids
            .iter()
            .enumerate()
            .filter(|(_, code_id)| match application_id {
                None => true,
                Some(app_id) => model
                    .code_apps
                    .get(code_id)
                    .map(|apps| apps.is_empty() || apps.contains(&app_id))
                    .unwrap_or(true),
            })
            .map(|(row, code_id)| (row, *code_id))
            .collect();

        if candidates.is_empty() {
            return Err(AppError::NoCandidates(format!(
                "No closure codes are visible under application {}",
                application_id.unwrap_or_default()
            )));
        }

        let query = model.vectorizer.transform(&normalize_text(description))?;

        let mut scored: Vec<(i64, f64)> = candidates
            .iter()
            .map(|&(row, code_id)| (code_id, query.cosine_similarity(&model.matrix[row])))
            .collect();

        // Stable sort keeps catalog row order among equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.config.top_k.min(scored.len()));

        let mut suggestions = Vec::with_capacity(scored.len());
        for (code_id, score) in scored {
            // Codes deleted since the model was built are skipped silently
            let Some(code) = self.catalog.get_closure_code(code_id).await? else {
                debug!(closure_code_id = code_id, "Skipping stale closure code");
                continue;
            };

            let (action, message) = if score >= self.config.similarity_threshold {
                (RecommendedAction::UseSuggestion, "High match".to_string())
            } else {
                (RecommendedAction::Review, "Low match".to_string())
            };

            suggestions.push(Suggestion {
                closure_code_id: code.id,
                code: code.code,
                description: code.description,
                confidence: format!("{:.2}%", score * 100.0),
                raw_score: score,
                action,
                message,
            });
        }

        debug!(
            count = suggestions.len(),
            application_id = ?application_id,
            "Suggestions computed"
        );
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::models::ClosureCode;

    fn test_config(dir: &std::path::Path) -> ModelConfig {
        ModelConfig {
            artifact_path: dir.join("model.bin"),
            english_stop_words: false,
            ..Default::default()
        }
    }

    fn seeded_catalog() -> Arc<InMemoryCatalog> {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert_closure_code(ClosureCode::new(1, "PW-RST", "password reset"));
        catalog.insert_closure_code(ClosureCode::new(2, "NET-TO", "network timeout"));
        catalog
    }

    async fn trained_service(
        catalog: Arc<InMemoryCatalog>,
        config: ModelConfig,
    ) -> RecommenderService {
        let service = RecommenderService::new(catalog, config);
        service.reload().await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_recommend_without_artifact_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let service = RecommenderService::new(seeded_catalog(), test_config(dir.path()));

        let err = service.recommend("anything", None).await.unwrap_err();
        assert_eq!(err.error_code(), "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_empty_description_rejected_before_model_access() {
        let dir = tempfile::tempdir().unwrap();
        let service = RecommenderService::new(seeded_catalog(), test_config(dir.path()));

        // No artifact exists, yet validation fires first
        let err = service.recommend("   ", None).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_exact_match_ranks_first_with_unit_score() {
        let dir = tempfile::tempdir().unwrap();
        let service = trained_service(seeded_catalog(), test_config(dir.path())).await;

        let suggestions = service.recommend("password reset", None).await.unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].closure_code_id, 1);
        assert!((suggestions[0].raw_score - 1.0).abs() < 1e-9);
        assert_eq!(suggestions[0].action, RecommendedAction::UseSuggestion);
        assert!(suggestions[1].raw_score.abs() < 1e-9);
        assert_eq!(suggestions[1].action, RecommendedAction::Review);
    }

    #[tokio::test]
    async fn test_disjoint_query_scores_zero_but_returns_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let service = trained_service(seeded_catalog(), test_config(dir.path())).await;

        let suggestions = service.recommend("impresora atascada", None).await.unwrap();
        assert_eq!(suggestions.len(), 2);
        for suggestion in &suggestions {
            assert_eq!(suggestion.raw_score, 0.0);
            assert_eq!(suggestion.action, RecommendedAction::Review);
            assert_eq!(suggestion.message, "Low match");
        }
    }

    #[tokio::test]
    async fn test_application_scope_filter_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert_closure_code(
            ClosureCode::new(1, "PW-RST", "password reset").with_application(7),
        );
        catalog.insert_closure_code(ClosureCode::new(2, "NET-TO", "network timeout"));
        let service = trained_service(catalog, test_config(dir.path())).await;

        // Scoped to app 9: code 1 (app-set {7}) must never appear
        let scoped = service.recommend("password reset", Some(9)).await.unwrap();
        assert!(scoped.iter().all(|s| s.closure_code_id != 1));

        // Scoped to app 7 and unscoped: code 1 appears
        let matching = service.recommend("password reset", Some(7)).await.unwrap();
        assert_eq!(matching[0].closure_code_id, 1);
        let unscoped = service.recommend("password reset", None).await.unwrap();
        assert_eq!(unscoped[0].closure_code_id, 1);
    }

    #[tokio::test]
    async fn test_filter_excluding_all_rows_is_no_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert_closure_code(
            ClosureCode::new(1, "PW-RST", "password reset").with_application(7),
        );
        let service = trained_service(catalog, test_config(dir.path())).await;

        let err = service.recommend("password reset", Some(9)).await.unwrap_err();
        assert_eq!(err.error_code(), "NO_CANDIDATES");
    }

    #[tokio::test]
    async fn test_stale_codes_skipped_silently() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = seeded_catalog();
        let service = trained_service(catalog.clone(), test_config(dir.path())).await;

        catalog.remove_closure_code(1);

        let suggestions = service.recommend("password reset", None).await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].closure_code_id, 2);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_last_good_model() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = seeded_catalog();
        let service = trained_service(catalog.clone(), test_config(dir.path())).await;

        // Empty the catalog so the next build fails
        catalog.remove_closure_code(1);
        catalog.remove_closure_code(2);

        let err = service.reload().await.unwrap_err();
        assert_eq!(err.error_code(), "BUILD_FAILED");

        // The previously loaded model still serves (codes are stale in the
        // catalog now, so the result list is empty but the call succeeds)
        assert!(service.is_loaded().await);
        let suggestions = service.recommend("password reset", None).await.unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_lazy_load_picks_up_artifact_built_after_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let catalog = seeded_catalog();

        // Train through a separate builder, as the offline trainer would
        let builder = ModelBuilder::new(catalog.clone(), config.clone());
        builder
            .build_and_save(&ArtifactStore::new(config.artifact_path.clone()))
            .await
            .unwrap();

        let service = RecommenderService::new(catalog, config);
        assert!(!service.is_loaded().await);

        let suggestions = service.recommend("network timeout", None).await.unwrap();
        assert_eq!(suggestions[0].closure_code_id, 2);
        assert!(service.is_loaded().await);
    }

    #[tokio::test]
    async fn test_confidence_formatting() {
        let dir = tempfile::tempdir().unwrap();
        let service = trained_service(seeded_catalog(), test_config(dir.path())).await;

        let suggestions = service.recommend("password reset", None).await.unwrap();
        assert_eq!(suggestions[0].confidence, "100.00%");
        assert_eq!(suggestions[1].confidence, "0.00%");
    }

    #[tokio::test]
    async fn test_stats_reflect_loaded_model() {
        let dir = tempfile::tempdir().unwrap();
        let service = trained_service(seeded_catalog(), test_config(dir.path())).await;

        let stats = service.stats().await;
        assert!(stats.loaded);
        assert_eq!(stats.document_count, 2);
        assert!(stats.vocab_size > 0);
        assert!(stats.trained_at.is_some());
    }
}
