use super::job::JobResult;
use chrono::{SecondsFormat, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LogSinkError {
    #[error("failed to open log sink '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write log sink: {0}")]
    Write(#[from] std::io::Error),
}

/// Append-only progress log, one tab-separated line per event:
///
/// ```text
/// 2025-11-03T18:22:05Z	us10006jxs	failed	renderer failed with exit status: 1
/// ```
///
/// Buffered output is flushed by [`LogSink::close`] and, failing that, on drop.
pub struct LogSink<W: Write = BufWriter<File>> {
    writer: Option<W>,
}

impl LogSink<BufWriter<File>> {
    pub fn open(path: &Path) -> Result<Self, LogSinkError> {
        let open_err = |source| LogSinkError::Open {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_err)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;

        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> LogSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    pub fn run_started(&mut self, run_id: Uuid, dataset: &str, events: usize) -> Result<(), LogSinkError> {
        self.write_line(&format!(
            "# {}\trun {}\tdataset={}\tevents={}",
            timestamp(),
            run_id,
            dataset,
            events
        ))
    }

    pub fn record(&mut self, result: &JobResult) -> Result<(), LogSinkError> {
        let mut line = format!("{}\t{}\t{}", timestamp(), result.event_id, result.status);
        if let Some(reason) = &result.reason {
            line.push('\t');
            line.push_str(&reason.replace(['\n', '\t'], " "));
        }
        self.write_line(&line)?;
        // tailing consumers see each event as soon as it finishes
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), LogSinkError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Flushes and hands back the underlying writer.
    pub fn close(mut self) -> Result<W, LogSinkError> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| std::io::Error::other("log sink already closed"))?;
        writer.flush()?;
        Ok(writer)
    }

    fn write_line(&mut self, line: &str) -> Result<(), LogSinkError> {
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for LogSink<W> {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
