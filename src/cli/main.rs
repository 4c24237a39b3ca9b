//! Offline trainer: builds the similarity model artifact from the catalog
//! and exits. Run this before (or instead of restarting) the serving
//! process; the server picks the new artifact up via its reload endpoint or
//! lazily on the next query after a restart.

use clap::Parser;
use closure_recommender::{
    catalog::create_catalog,
    config::{CatalogBackend, Config},
    recommender::{ArtifactStore, ModelBuilder},
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "closure-recommender-trainer")]
#[command(about = "Train the closure-code similarity model", long_about = None)]
struct Cli {
    /// Catalog snapshot JSON file (overrides configuration)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Artifact output path (overrides configuration)
    #[arg(short, long)]
    artifact: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "closure_recommender=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    if let Some(snapshot) = cli.snapshot {
        config.catalog.backend = CatalogBackend::JsonSnapshot;
        config.catalog.snapshot_path = Some(snapshot);
    }
    if let Some(artifact) = cli.artifact {
        config.model.artifact_path = artifact;
    }

    let catalog = create_catalog(&config.catalog)?;
    let store = ArtifactStore::new(config.model.artifact_path.clone());
    let builder = ModelBuilder::new(catalog, config.model);

    let artifact = builder.build_and_save(&store).await?;

    tracing::info!(
        path = %store.path().display(),
        documents = artifact.document_count(),
        vocab_size = artifact.vectorizer.vocab_size(),
        "Training complete"
    );
    Ok(())
}
