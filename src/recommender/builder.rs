use crate::catalog::CatalogStore;
use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::recommender::artifact::{ArtifactStore, ModelArtifact, ARTIFACT_FORMAT_VERSION};
use crate::recommender::vectorizer::{TfidfVectorizer, VectorizerConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Normalize free text the same way for training documents and queries
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().trim().to_string()
}

/// Offline corpus builder: reads the closure-code catalog and incident
/// history, fits the TF-IDF vectorizer, and produces a complete model
/// artifact. Runs on demand; never touches the live service state.
pub struct ModelBuilder {
    catalog: Arc<dyn CatalogStore>,
    config: ModelConfig,
}

impl ModelBuilder {
    pub fn new(catalog: Arc<dyn CatalogStore>, config: ModelConfig) -> Self {
        Self { catalog, config }
    }

    /// Build a model artifact from the current catalog state.
    ///
    /// Fails with `BuildFailed` when the catalog has no closure codes.
    pub async fn build(&self) -> Result<ModelArtifact> {
        let codes = self.catalog.list_closure_codes().await?;

        if codes.is_empty() {
            return Err(AppError::BuildFailed(
                "No closure codes in the catalog to build the similarity model".to_string(),
            ));
        }

        info!(closure_codes = codes.len(), "Starting hybrid model training");

        let mut corpus = Vec::with_capacity(codes.len());
        let mut code_ids = Vec::with_capacity(codes.len());
        let mut code_apps: HashMap<i64, Vec<i64>> = HashMap::with_capacity(codes.len());

        for code in &codes {
            // Theoretical definition
            let base_text = format!("{} {}", code.description, code.cause);

            // Practical evidence: recent incidents resolved with this code
            let incidents = self
                .catalog
                .recent_incidents_for_code(code.id, self.config.history_limit)
                .await?;
            let history_text = incidents
                .iter()
                .map(|incident| incident.free_text())
                .collect::<Vec<_>>()
                .join(" ");

            corpus.push(normalize_text(&format!("{} {}", base_text, history_text)));
            code_ids.push(code.id);
            code_apps.insert(code.id, code.application_id.into_iter().collect());
        }

        let mut vectorizer = TfidfVectorizer::new(VectorizerConfig {
            max_features: self.config.max_features,
            ngram_range: self.config.ngram_range,
            english_stop_words: self.config.english_stop_words,
        });

        info!("Building the closure-code document-term matrix");
        let matrix = vectorizer.fit_transform(&corpus)?;

        let artifact = ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            trained_at: chrono::Utc::now(),
            vectorizer,
            matrix,
            code_ids,
            code_apps,
        };
        artifact.validate()?;

        info!(
            documents = artifact.document_count(),
            vocab_size = artifact.vectorizer.vocab_size(),
            "Model training completed"
        );
        Ok(artifact)
    }

    /// Build and persist in one step. An I/O failure while writing leaves
    /// the prior on-disk artifact untouched.
    pub async fn build_and_save(&self, store: &ArtifactStore) -> Result<ModelArtifact> {
        let artifact = self.build().await?;
        store.save(&artifact).map_err(|e| {
            AppError::BuildFailed(format!("Failed to persist model artifact: {}", e))
        })?;
        Ok(artifact)
    }
}
