use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use gmv_batch::batch::{
    BatchDriver, JobStatus, LogSink, RenderError, RenderRequest, Renderer, RunSummary,
};
use gmv_batch::catalog::{filter, FilteredEvents, RawEventRecord};
use gmv_batch::config::generate::{preset_yaml, Preset};
use gmv_batch::config::parse::parse_config_str;
use gmv_batch::config::types::BatchConfig;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Renderer double: records every request, writes the output file, and can be
/// told to fail, hang or cancel for particular events.
#[derive(Default)]
struct FakeRenderer {
    calls: Mutex<Vec<RenderRequest>>,
    fail: HashSet<String>,
    hang: HashSet<String>,
    cancel_on: Option<(String, CancellationToken)>,
}

impl FakeRenderer {
    fn calls(&self) -> Vec<RenderRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<(), RenderError> {
        self.calls.lock().unwrap().push(request.clone());
        let id = &request.event.id;

        if let Some((target, token)) = &self.cancel_on {
            if target == id {
                token.cancel();
                std::future::pending::<()>().await;
            }
        }
        if self.hang.contains(id) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.fail.contains(id) {
            return Err(RenderError::ExitStatus("exit status: 1".to_string()));
        }

        fs::write(&request.output_path, b"video").map_err(RenderError::Spawn)?;
        Ok(())
    }
}

fn config(dir: &Path) -> BatchConfig {
    let mut config = parse_config_str(preset_yaml(Preset::Global)).unwrap();
    config.output.directory = dir.join("videos");
    config.log.path = dir.join("gmv-batch.log");
    config.renderer.pause_between = Duration::ZERO;
    config
}

fn events(count: usize) -> FilteredEvents {
    let base = Utc.with_ymd_and_hms(2011, 3, 11, 5, 46, 24).unwrap();
    let raw = (0..count).map(|i| RawEventRecord {
        id: Some(format!("ev{}", i)),
        time: Some(base + ChronoDuration::days(i as i64 * 30)),
        magnitude: Some(7.5 + i as f64 / 10.0),
        latitude: Some(38.3),
        longitude: Some(142.4),
        depth_km: Some(29.0),
        place: Some("near the east coast of Honshu, Japan".to_string()),
        url: None,
    });
    filter(raw, 7.5, None).events
}

fn video_count(dir: &Path) -> usize {
    fs::read_dir(dir.join("videos"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_dry_run_previews_without_rendering() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(temp_dir.path());
    let renderer = FakeRenderer::default();
    let mut sink = LogSink::from_writer(Vec::new());

    let run = BatchDriver::new(&config, &renderer)
        .run(&events(3), true, &mut sink)
        .await
        .unwrap();

    assert_eq!(run.results.len(), 3);
    assert!(run.results.iter().all(|r| r.status == JobStatus::Previewed));
    assert!(renderer.calls().is_empty());
    assert_eq!(video_count(temp_dir.path()), 0);

    let log = String::from_utf8(sink.close().unwrap()).unwrap();
    assert_eq!(log.lines().count(), 3);
}

#[tokio::test]
async fn test_failure_does_not_stop_later_events() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(temp_dir.path());
    let renderer = FakeRenderer {
        fail: HashSet::from(["ev1".to_string()]),
        ..FakeRenderer::default()
    };
    let mut sink = LogSink::open(&config.log.path).unwrap();

    let run = BatchDriver::new(&config, &renderer)
        .run(&events(4), false, &mut sink)
        .await
        .unwrap();
    sink.close().unwrap();

    let statuses: Vec<_> = run.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        [
            JobStatus::Succeeded,
            JobStatus::Failed,
            JobStatus::Succeeded,
            JobStatus::Succeeded
        ]
    );
    assert_eq!(renderer.calls().len(), 4);
    assert_eq!(video_count(temp_dir.path()), 3);
    assert!(run.results[1].reason.as_deref().unwrap().contains("exit status: 1"));

    let summary = RunSummary::from_results(&run.results, 0, run.cancelled);
    assert!(summary.has_failures());

    let log = fs::read_to_string(&config.log.path).unwrap();
    let failed_line = log.lines().nth(1).unwrap();
    assert!(failed_line.contains("\tev1\tfailed\t"));
}

#[tokio::test]
async fn test_render_request_carries_event_and_selection() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(temp_dir.path());
    let renderer = FakeRenderer::default();
    let mut sink = LogSink::from_writer(Vec::new());

    let run = BatchDriver::new(&config, &renderer)
        .run(&events(1), false, &mut sink)
        .await
        .unwrap();

    let calls = renderer.calls();
    let request = &calls[0];
    assert_eq!(request.event.id, "ev0");
    assert_eq!(request.selection.reference.to_string(), "OK.SMO");
    assert!(request.selection.networks().contains(&"Y7"));
    assert_eq!(request.window.duration().num_seconds(), 2400);
    assert_eq!(
        request.output_path,
        temp_dir.path().join("videos/20110311_Magnitude7_5.mp4")
    );
    assert_eq!(run.results[0].output_path, request.output_path);
}

#[tokio::test]
async fn test_timeout_marks_event_failed() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config(temp_dir.path());
    config.renderer.timeout = Duration::from_millis(50);
    let renderer = FakeRenderer {
        hang: HashSet::from(["ev0".to_string()]),
        ..FakeRenderer::default()
    };
    let mut sink = LogSink::from_writer(Vec::new());

    let run = BatchDriver::new(&config, &renderer)
        .run(&events(2), false, &mut sink)
        .await
        .unwrap();

    assert_eq!(run.results[0].status, JobStatus::Failed);
    assert!(run.results[0].reason.as_deref().unwrap().contains("timed out"));
    assert_eq!(run.results[1].status, JobStatus::Succeeded);
}

#[tokio::test]
async fn test_excluded_networks_skip_event() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config(temp_dir.path());
    config.selection.networks = vec!["XQ".to_string(), "ZZ".to_string()];
    config.selection.allow_temporary.clear();
    let renderer = FakeRenderer::default();
    let mut sink = LogSink::from_writer(Vec::new());

    let run = BatchDriver::new(&config, &renderer)
        .run(&events(2), false, &mut sink)
        .await
        .unwrap();

    assert!(run.results.iter().all(|r| r.status == JobStatus::Skipped));
    assert!(renderer.calls().is_empty());
}

#[tokio::test]
async fn test_skip_existing_leaves_finished_videos_alone() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config(temp_dir.path());
    config.output.skip_existing = true;
    fs::create_dir_all(&config.output.directory).unwrap();
    fs::write(config.output.directory.join("20110311_Magnitude7_5.mp4"), b"old").unwrap();

    let renderer = FakeRenderer::default();
    let mut sink = LogSink::from_writer(Vec::new());
    let run = BatchDriver::new(&config, &renderer)
        .run(&events(2), false, &mut sink)
        .await
        .unwrap();

    assert_eq!(run.results[0].status, JobStatus::Skipped);
    assert_eq!(run.results[1].status, JobStatus::Succeeded);
    assert_eq!(renderer.calls().len(), 1);
    assert_eq!(
        fs::read(config.output.directory.join("20110311_Magnitude7_5.mp4")).unwrap(),
        b"old"
    );
}

#[tokio::test]
async fn test_cancellation_skips_remaining_events() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(temp_dir.path());
    let cancel = CancellationToken::new();
    let renderer = FakeRenderer {
        cancel_on: Some(("ev1".to_string(), cancel.clone())),
        ..FakeRenderer::default()
    };
    let mut sink = LogSink::from_writer(Vec::new());

    let run = BatchDriver::new(&config, &renderer)
        .with_cancellation(cancel)
        .run(&events(4), false, &mut sink)
        .await
        .unwrap();

    assert!(run.cancelled);
    assert_eq!(run.results.len(), 4);
    assert_eq!(run.results[0].status, JobStatus::Succeeded);
    assert_eq!(run.results[1].status, JobStatus::Failed);
    assert_eq!(run.results[1].reason.as_deref(), Some("render cancelled"));
    for result in &run.results[2..] {
        assert_eq!(result.status, JobStatus::Skipped);
        assert_eq!(result.reason.as_deref(), Some("cancelled"));
    }
    assert_eq!(renderer.calls().len(), 2);
}

#[tokio::test]
async fn test_result_count_matches_input_for_mixed_outcomes() {
    for size in 0..6 {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path());
        let renderer = FakeRenderer {
            fail: (0..size).step_by(2).map(|i| format!("ev{}", i)).collect(),
            ..FakeRenderer::default()
        };
        let mut sink = LogSink::from_writer(Vec::new());

        let run = BatchDriver::new(&config, &renderer)
            .run(&events(size), false, &mut sink)
            .await
            .unwrap();

        assert_eq!(run.results.len(), size);
        let ids: Vec<_> = run.results.iter().map(|r| r.event_id.clone()).collect();
        let expected: Vec<_> = (0..size).map(|i| format!("ev{}", i)).collect();
        assert_eq!(ids, expected);
    }
}
