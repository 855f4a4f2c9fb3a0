pub mod driver;
pub mod job;
pub mod log_sink;
pub mod naming;
pub mod renderer;

pub use driver::{BatchDriver, BatchRun, DriverError};
pub use job::{JobResult, JobState, JobStatus, RunSummary};
pub use log_sink::{LogSink, LogSinkError};
pub use naming::FilenameAllocator;
pub use renderer::{CommandRenderer, RenderError, RenderRequest, Renderer};
