use crate::catalog::{EventRecord, TimeWindow};
use crate::config::types::RendererConfig;
use crate::selection::StationSelection;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to start renderer: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("renderer failed with {0}")]
    ExitStatus(String),

    #[error("renderer timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("render cancelled")]
    Cancelled,
}

/// Everything the renderer needs to produce one video.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub event: EventRecord,
    pub window: TimeWindow,
    pub selection: StationSelection,
    pub output_path: PathBuf,
}

/// The ground-motion visualization tool, seen from the batch driver.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> Result<(), RenderError>;
}

/// Runs the visualization tool as a child process.
///
/// The child is killed if the render future is dropped, which is how the
/// driver enforces timeouts and cancellation.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    region: String,
    extra_args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>, region: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args,
            region: region.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            region: config.region.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for one request, leading args first.
    ///
    /// The tool appends its own extension, so `-o` gets the output path
    /// without one.
    pub fn command_args(&self, request: &RenderRequest) -> Vec<String> {
        let event = &request.event;
        let lead = (event.time - request.window.start).num_seconds();
        let duration = request.window.duration().num_seconds();

        let mut args = self.args.clone();
        args.extend([
            "-e".to_string(),
            format!("{},{}", event.latitude, event.longitude),
            "-z".to_string(),
            event.depth_km.to_string(),
            "-m".to_string(),
            event.magnitude.to_string(),
            "-t".to_string(),
            event.time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "-r".to_string(),
            self.region.clone(),
            "-n".to_string(),
            request.selection.networks().join(","),
            "-b".to_string(),
            request.selection.channel_prefixes().join(","),
            "-d".to_string(),
            duration.to_string(),
            "-p".to_string(),
            (-lead).to_string(),
            "-S".to_string(),
            request.selection.reference.station.clone(),
            "-N".to_string(),
            request.selection.reference.network.clone(),
            "-o".to_string(),
            request
                .output_path
                .with_extension("")
                .to_string_lossy()
                .into_owned(),
        ]);
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<(), RenderError> {
        let args = self.command_args(request);
        debug!(program = %self.program, args = ?args, "Spawning renderer");

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(RenderError::ExitStatus(status.to_string()))
        }
    }
}
