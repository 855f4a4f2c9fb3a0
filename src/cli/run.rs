use crate::batch::{BatchDriver, CommandRenderer, LogSink, Renderer, RunSummary};
use crate::catalog::{filter, CatalogQuery, CatalogSource, UsgsCatalog};
use crate::config::parse::load_config;
use crate::config::types::BatchConfig;
use crate::report;
use chrono::Utc;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config not found; searched ~/.config/gmv-batch/config.yml and /etc/gmv-batch/config.yml (use --config <path> or run 'gmv-batch config init')")]
    ConfigNotFound,

    #[error("config error: {0}")]
    Config(#[from] crate::config::parse::ConfigError),

    #[error("catalog error: {0}")]
    DataFetch(#[from] crate::catalog::DataFetchError),

    #[error("log sink error: {0}")]
    LogSink(#[from] crate::batch::LogSinkError),

    #[error("batch driver error: {0}")]
    Driver(#[from] crate::batch::DriverError),

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub report_only: bool,
    pub dry_run: bool,
}

pub async fn run(config_path: Option<PathBuf>, options: RunOptions) -> Result<RunSummary, RunError> {
    let config_path = config_path.ok_or(RunError::ConfigNotFound)?;

    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(&config_path)?;

    let catalog = UsgsCatalog::from_config(&config.catalog)?;
    let renderer = CommandRenderer::from_config(&config.renderer);

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let mut stdout = std::io::stdout();
    let result = execute(&config, &catalog, &renderer, options, cancel, &mut stdout).await;
    watcher.abort();

    result
}

/// One full pass: query, filter, then either print the report or drive the
/// renderer over every qualifying event.
pub async fn execute(
    config: &BatchConfig,
    catalog: &dyn CatalogSource,
    renderer: &dyn Renderer,
    options: RunOptions,
    cancel: CancellationToken,
    out: &mut dyn Write,
) -> Result<RunSummary, RunError> {
    let run_id = Uuid::new_v4();
    let span = info_span!("run", run_id = %run_id, dataset = %config.dataset);

    async move {
        let query = CatalogQuery::from_config(&config.catalog, Utc::now().date_naive());
        let raw = catalog.fetch(&query).await?;
        let fetched = raw.len();

        let outcome = filter(raw, config.catalog.min_magnitude, config.catalog.bbox.as_ref());
        if outcome.malformed > 0 {
            warn!(count = outcome.malformed, "Dropped malformed catalog records");
        }
        info!(
            fetched,
            qualifying = outcome.events.len(),
            duplicates = outcome.duplicates,
            "Catalog filtered"
        );

        if options.report_only {
            writeln!(out, "{}", report::format(&outcome.events, config))?;
            return Ok(RunSummary {
                total: outcome.events.len(),
                malformed: outcome.malformed,
                ..RunSummary::default()
            });
        }

        let mut sink = LogSink::open(&config.log.path)?;
        sink.run_started(run_id, &config.dataset, outcome.events.len())?;

        let driver = BatchDriver::new(config, renderer).with_cancellation(cancel);
        let batch = driver.run(&outcome.events, options.dry_run, &mut sink).await?;
        sink.close()?;

        let summary = RunSummary::from_results(&batch.results, outcome.malformed, batch.cancelled);
        writeln!(out, "{}", summary)?;
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Batch processing complete"
        );

        Ok(summary)
    }
    .instrument(span)
    .await
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received, cancelling remaining events");
        cancel.cancel();
    }
}

