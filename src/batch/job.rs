use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Per-event lifecycle:
///
/// ```text
/// Pending -> Skipped | Previewed | Rendering
/// Rendering -> Succeeded | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Rendering,
    Succeeded,
    Failed,
    Skipped,
    Previewed,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid job transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: JobState,
    pub to: JobState,
}

impl JobState {
    pub fn advance(self, to: JobState) -> Result<JobState, InvalidTransition> {
        use JobState::*;

        let legal = matches!(
            (self, to),
            (Pending, Rendering)
                | (Pending, Skipped)
                | (Pending, Previewed)
                | (Rendering, Succeeded)
                | (Rendering, Failed)
        );

        if legal {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }

    pub fn is_terminal(self) -> bool {
        self.status().is_some()
    }

    pub fn status(self) -> Option<JobStatus> {
        match self {
            JobState::Succeeded => Some(JobStatus::Succeeded),
            JobState::Failed => Some(JobStatus::Failed),
            JobState::Skipped => Some(JobStatus::Skipped),
            JobState::Previewed => Some(JobStatus::Previewed),
            JobState::Pending | JobState::Rendering => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Succeeded,
    Failed,
    Skipped,
    Previewed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Skipped => "skipped",
            JobStatus::Previewed => "previewed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    pub event_id: String,
    pub output_path: PathBuf,
    pub status: JobStatus,
    pub reason: Option<String>,
    pub elapsed: Option<Duration>,
}

/// One event moving through the state machine.
#[derive(Debug)]
pub struct Job {
    event_id: String,
    output_path: PathBuf,
    state: JobState,
    render_started: Option<Instant>,
}

impl Job {
    pub fn new(event_id: impl Into<String>, output_path: PathBuf) -> Self {
        Self {
            event_id: event_id.into(),
            output_path,
            state: JobState::Pending,
            render_started: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }

    pub fn start_rendering(&mut self) -> Result<(), InvalidTransition> {
        self.state = self.state.advance(JobState::Rendering)?;
        self.render_started = Some(Instant::now());
        Ok(())
    }

    /// Moves to a terminal state and produces the result record.
    pub fn finish(
        mut self,
        to: JobState,
        reason: Option<String>,
    ) -> Result<JobResult, InvalidTransition> {
        self.state = self.state.advance(to)?;
        let status = self
            .state
            .status()
            .ok_or(InvalidTransition { from: self.state, to })?;

        Ok(JobResult {
            event_id: self.event_id,
            output_path: self.output_path,
            status,
            reason,
            elapsed: self.render_started.map(|started| started.elapsed()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub previewed: usize,
    /// Catalog records dropped by the filter for missing fields.
    pub malformed: usize,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn from_results(results: &[JobResult], malformed: usize, cancelled: bool) -> Self {
        let count = |status: JobStatus| results.iter().filter(|r| r.status == status).count();

        Self {
            total: results.len(),
            succeeded: count(JobStatus::Succeeded),
            failed: count(JobStatus::Failed),
            skipped: count(JobStatus::Skipped),
            previewed: count(JobStatus::Previewed),
            malformed,
            cancelled,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.cancelled
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(80);
        writeln!(f, "{}", rule)?;
        writeln!(f, "  BATCH PROCESSING SUMMARY")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total earthquakes processed: {}", self.total)?;
        writeln!(f, "Succeeded:                   {}", self.succeeded)?;
        writeln!(f, "Failed:                      {}", self.failed)?;
        writeln!(f, "Skipped:                     {}", self.skipped)?;
        if self.previewed > 0 {
            writeln!(f, "Previewed:                   {}", self.previewed)?;
        }
        if self.malformed > 0 {
            writeln!(f, "Malformed catalog records:   {}", self.malformed)?;
        }
        if self.cancelled {
            writeln!(f, "Run was cancelled before completion")?;
        }
        write!(f, "{}", rule)
    }
}
