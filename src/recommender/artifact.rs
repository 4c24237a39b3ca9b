use crate::error::{AppError, Result};
use crate::recommender::vectorizer::{SparseVector, TfidfVectorizer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Bump when the serialized layout changes so mismatched artifacts are
/// rejected instead of silently misread
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// The persisted similarity model: one immutable snapshot, replaced
/// wholesale on retraining, never patched in place
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Serialization format version
    pub format_version: u32,

    /// Training timestamp
    pub trained_at: DateTime<Utc>,

    /// Fitted vectorizer (vocabulary, IDF weights, n-gram configuration)
    pub vectorizer: TfidfVectorizer,

    /// Document-term matrix, rows aligned 1:1 with `code_ids`
    pub matrix: Vec<SparseVector>,

    /// Ordered closure-code identifiers, one per matrix row
    pub code_ids: Vec<i64>,

    /// Closure-code id -> application ids it is visible under.
    /// An empty set means the code is visible under any application.
    pub code_apps: HashMap<i64, Vec<i64>>,
}

impl ModelArtifact {
    pub fn document_count(&self) -> usize {
        self.code_ids.len()
    }

    /// Check internal consistency: row count must match the id sequence
    pub fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(AppError::Serialization(format!(
                "Model artifact format version {} does not match expected {}",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if self.matrix.len() != self.code_ids.len() {
            return Err(AppError::Serialization(format!(
                "Model artifact is inconsistent: {} matrix rows for {} closure codes",
                self.matrix.len(),
                self.code_ids.len()
            )));
        }
        Ok(())
    }
}

/// Persistence for the model artifact: a single serialized blob on local
/// storage, replaced atomically via temp-file-plus-rename
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the artifact, atomically replacing any prior one. The prior
    /// artifact stays valid until the rename lands.
    pub fn save(&self, artifact: &ModelArtifact) -> Result<()> {
        artifact.validate()?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let bytes = bincode::serialize(artifact)?;
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, &bytes)?;
        std::fs::rename(&tmp_path, &self.path)?;

        tracing::info!(
            path = %self.path.display(),
            bytes = bytes.len(),
            documents = artifact.document_count(),
            "Model artifact saved"
        );
        Ok(())
    }

    /// Load and validate the artifact from disk
    pub fn load(&self) -> Result<ModelArtifact> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("No model artifact at {}", self.path.display()))
            } else {
                AppError::Io(e)
            }
        })?;

        let artifact: ModelArtifact = bincode::deserialize(&bytes)?;
        artifact.validate()?;
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommender::vectorizer::VectorizerConfig;

    fn build_test_artifact() -> ModelArtifact {
        let docs = vec!["password reset".to_string(), "network timeout".to_string()];
        let mut vectorizer = TfidfVectorizer::new(VectorizerConfig::default());
        let matrix = vectorizer.fit_transform(&docs).unwrap();

        ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            trained_at: Utc::now(),
            vectorizer,
            matrix,
            code_ids: vec![1, 2],
            code_apps: HashMap::from([(1, vec![]), (2, vec![7])]),
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("model.bin"));

        let artifact = build_test_artifact();
        store.save(&artifact).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.code_ids, artifact.code_ids);
        assert_eq!(loaded.matrix, artifact.matrix);
        assert_eq!(loaded.code_apps, artifact.code_apps);
        assert_eq!(
            loaded.vectorizer.vocab_size(),
            artifact.vectorizer.vocab_size()
        );
    }

    #[test]
    fn test_load_missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("missing.bin"));

        let err = store.load().unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("model.bin"));

        let mut artifact = build_test_artifact();
        store.save(&artifact).unwrap();

        artifact.format_version = ARTIFACT_FORMAT_VERSION + 1;
        let bytes = bincode::serialize(&artifact).unwrap();
        std::fs::write(store.path(), bytes).unwrap();

        let err = store.load().unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_row_count_mismatch_rejected() {
        let mut artifact = build_test_artifact();
        artifact.code_ids.push(99);
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn test_save_replaces_prior_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("model.bin"));

        let first = build_test_artifact();
        store.save(&first).unwrap();

        let mut second = build_test_artifact();
        second.code_ids = vec![10, 20];
        second.code_apps = HashMap::new();
        store.save(&second).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.code_ids, vec![10, 20]);
    }
}
