use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Catalog backend configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Similarity model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with compiled-in defaults
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: CCR_)
            .add_source(
                config::Environment::with_prefix("CCR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            catalog: CatalogConfig::default(),
            model: ModelConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog backend type
    #[serde(default)]
    pub backend: CatalogBackend,

    /// JSON snapshot path (json_snapshot backend)
    pub snapshot_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: CatalogBackend::default(),
            snapshot_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CatalogBackend {
    #[default]
    Memory,
    JsonSnapshot,
}

/// Configuration for the TF-IDF similarity model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Artifact file path
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// Maximum vocabulary size
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// N-gram range (min, max)
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),

    /// Strip English stop words during tokenization.
    /// The corpus is often not English; this is a tunable, not a requirement.
    #[serde(default = "default_true")]
    pub english_stop_words: bool,

    /// Incidents per closure code used as training evidence
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Number of suggestions returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Score at or above which a suggestion is marked "use_suggestion"
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            max_features: default_max_features(),
            ngram_range: default_ngram_range(),
            english_stop_words: true,
            history_limit: default_history_limit(),
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON-formatted logs
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("./data/similarity_model.bin")
}

fn default_max_features() -> usize {
    5000
}

fn default_ngram_range() -> (usize, usize) {
    (1, 2)
}

fn default_history_limit() -> usize {
    50
}

fn default_top_k() -> usize {
    3
}

fn default_similarity_threshold() -> f64 {
    0.20
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
