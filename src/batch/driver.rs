use super::job::{InvalidTransition, Job, JobResult, JobState, JobStatus};
use super::log_sink::LogSink;
use super::naming::FilenameAllocator;
use super::renderer::{RenderError, RenderRequest, Renderer};
use crate::catalog::{EventRecord, FilteredEvents};
use crate::config::types::BatchConfig;
use crate::selection::StationNetworkSelector;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to create output directory '{path}': {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("job state machine violated: {0}")]
    State(#[from] InvalidTransition),
}

/// What a run produced: one result per input event, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchRun {
    pub results: Vec<JobResult>,
    pub cancelled: bool,
}

/// Walks filtered events one at a time, rendering each.
///
/// A failing, timed-out or skipped event never stops the batch; only
/// cancellation does, and even then every remaining event gets a result.
pub struct BatchDriver<'a> {
    config: &'a BatchConfig,
    renderer: &'a dyn Renderer,
    cancel: CancellationToken,
}

impl<'a> BatchDriver<'a> {
    pub fn new(config: &'a BatchConfig, renderer: &'a dyn Renderer) -> Self {
        Self {
            config,
            renderer,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run<W: Write>(
        &self,
        events: &FilteredEvents,
        dry_run: bool,
        sink: &mut LogSink<W>,
    ) -> Result<BatchRun, DriverError> {
        let selector = StationNetworkSelector::new(&self.config.selection);
        let mut names = FilenameAllocator::new(&self.config.output);
        let output_dir = &self.config.output.directory;

        if !dry_run {
            std::fs::create_dir_all(output_dir).map_err(|source| DriverError::OutputDirectory {
                path: output_dir.clone(),
                source,
            })?;
        }

        let total = events.len();
        let mut run = BatchRun {
            results: Vec::with_capacity(total),
            cancelled: false,
        };

        for (idx, event) in events.iter().enumerate() {
            let job = Job::new(event.id.clone(), output_dir.join(names.allocate(event)));

            let result = if run.cancelled || self.cancel.is_cancelled() {
                run.cancelled = true;
                job.finish(JobState::Skipped, Some("cancelled".to_string()))?
            } else {
                self.process(job, event, dry_run, &selector).await?
            };

            if result.status == JobStatus::Failed && self.cancel.is_cancelled() {
                run.cancelled = true;
            }

            log_result(idx + 1, total, &result);
            if let Err(e) = sink.record(&result) {
                warn!(error = %e, event_id = %result.event_id, "Failed to write log sink");
            }

            let rendered = result.elapsed.is_some();
            run.results.push(result);

            if rendered && !run.cancelled && idx + 1 < total {
                self.pause().await;
            }
        }

        Ok(run)
    }

    async fn process(
        &self,
        mut job: Job,
        event: &EventRecord,
        dry_run: bool,
        selector: &StationNetworkSelector<'_>,
    ) -> Result<JobResult, DriverError> {
        let window = event.window(&self.config.window);

        let selection = match selector.select(event, &window) {
            Ok(selection) => selection,
            Err(empty) => {
                return job
                    .finish(JobState::Skipped, Some(empty.to_string()))
                    .map_err(DriverError::from)
            }
        };

        if dry_run {
            return job.finish(JobState::Previewed, None).map_err(DriverError::from);
        }

        if self.config.output.skip_existing && job.output_path().exists() {
            return job
                .finish(JobState::Skipped, Some("output already exists".to_string()))
                .map_err(DriverError::from);
        }

        job.start_rendering()?;
        info!(
            event_id = %event.id,
            time = %event.time.format("%Y-%m-%d %H:%M:%S UTC"),
            magnitude = event.magnitude,
            place = %event.place,
            reference = %selection.reference,
            output = %job.output_path().display(),
            "Rendering event"
        );

        let request = RenderRequest {
            event: event.clone(),
            window,
            selection,
            output_path: job.output_path().clone(),
        };

        let timeout = self.config.renderer.timeout;
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(RenderError::Cancelled),
            res = tokio::time::timeout(timeout, self.renderer.render(&request)) => match res {
                Ok(rendered) => rendered,
                Err(_) => Err(RenderError::Timeout(timeout)),
            },
        };

        let finished = match outcome {
            Ok(()) => job.finish(JobState::Succeeded, None),
            Err(e) => job.finish(JobState::Failed, Some(e.to_string())),
        };
        finished.map_err(DriverError::from)
    }

    async fn pause(&self) {
        let pause = self.config.renderer.pause_between;
        if pause.is_zero() {
            return;
        }

        info!(seconds = pause.as_secs_f64(), "Waiting before next earthquake");
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(pause) => {}
        }
    }
}

fn log_result(index: usize, total: usize, result: &JobResult) {
    let reason = result.reason.as_deref().unwrap_or("");
    match result.status {
        JobStatus::Failed => error!(
            index,
            total,
            event_id = %result.event_id,
            reason,
            "Event failed"
        ),
        JobStatus::Skipped => warn!(
            index,
            total,
            event_id = %result.event_id,
            reason,
            "Event skipped"
        ),
        status => info!(
            index,
            total,
            event_id = %result.event_id,
            status = %status,
            output = %result.output_path.display(),
            "Event finished"
        ),
    }
}
