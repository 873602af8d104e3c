//! Langwatch Service - Main Entry Point
//!
//! Watches an input directory and writes language and token statistics
//! for every text file dropped into it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use langwatch::ingest::{Backlog, IngestQueue};
use langwatch::pipeline::{PipelineCoordinator, Worker};
use langwatch::processing::{LanguageClassifier, ProfileClassifier, StatsFormatter, TokenFilter, Tokenizer};
use langwatch::router::FileRouter;
use langwatch::types::ServiceConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let json = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "langwatch=info".into()),
        ))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    info!("Starting Langwatch Service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_file = PathBuf::from(
        std::env::var("LANGWATCH_CONFIG").unwrap_or_else(|_| "langwatch.toml".into()),
    );
    let config = ServiceConfig::load(Some(&config_file)).context("loading configuration")?;
    config.validate().context("validating configuration")?;

    info!(
        input = %config.input_path.display(),
        output = %config.output_path.display(),
        archive = %config.archive_root().display(),
        threshold = config.confidence_threshold,
        "Configuration loaded"
    );

    std::fs::create_dir_all(&config.output_path).with_context(|| {
        format!("creating output directory {}", config.output_path.display())
    })?;

    // Initialize components
    let filter = TokenFilter::from_file(&config.nontoken_file)
        .context("loading nontoken exclusion list")?;
    info!(entries = filter.len(), "Exclusion list loaded");

    let classifier: Arc<dyn LanguageClassifier> = Arc::new(
        ProfileClassifier::load(&config.language_profiles_path, config.detector_seed)
            .context("loading language profiles")?,
    );

    let coordinator = PipelineCoordinator::new(
        classifier,
        Tokenizer::new(Arc::new(filter)),
        StatsFormatter::new(config.confidence_threshold, config.languages_to_show),
    );
    let router = FileRouter::from_config(&config);

    let backlog = Arc::new(Backlog::new());
    let queue = IngestQueue::start(&config.input_path, backlog)
        .context("starting input directory watch")?;

    let worker = Worker::new(
        queue,
        coordinator,
        router,
        Duration::from_millis(config.idle_delay_ms),
    );

    let stats = worker
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    stats.log_summary();
    info!("Langwatch Service stopped");

    Ok(())
}
