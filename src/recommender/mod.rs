/// Closure-code recommendation subsystem
///
/// Two components, used in strict order:
/// - the corpus builder, an offline job that fits a TF-IDF model over one
///   hybrid document per closure code (catalog definition + recent incident
///   history) and persists it as a single artifact
/// - the recommendation service, which loads the artifact and answers
///   free-text queries with the top-K most similar closure codes by cosine
///   similarity, optionally scoped to one application

pub mod artifact;
pub mod builder;
pub mod service;
pub mod vectorizer;

pub use artifact::{ArtifactStore, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use builder::{normalize_text, ModelBuilder};
pub use service::{ModelStats, RecommendedAction, RecommenderService, Suggestion};
pub use vectorizer::{SparseVector, TfidfVectorizer, VectorizerConfig};
