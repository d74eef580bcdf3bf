mod common;

use std::time::Duration;

use asset_generator::api::GeneratedMedia;
use asset_generator::pipelines::{poll_videos_with, submit_videos_with};
use asset_generator::report::{ResultStatus, RunLog};
use asset_generator::store::{PendingOperation, PendingStore};
use asset_generator::video_ops::{BatchPacing, poll_pending, submit_batches, watch_pending};
use chrono::Local;
use common::{BROKEN_URL, FakeVideoOps, PollScript, prompt};

fn no_wait(batch_size: usize) -> BatchPacing {
    BatchPacing {
        batch_size,
        delay_between_batches: Duration::ZERO,
    }
}

fn pending(id: &str, dir: &std::path::Path) -> PendingOperation {
    PendingOperation {
        operation_name: format!("operations/{id}"),
        filename: format!("{id}.mp4"),
        filepath: dir.join(format!("{id}.mp4")),
        purpose: String::new(),
        submitted_at: Local::now(),
    }
}

#[tokio::test]
async fn submission_skips_existing_and_pending_assets() {
    let tmp = tempfile::tempdir().unwrap();
    let videos = tmp.path().join("videos");
    tokio::fs::create_dir_all(&videos).await.unwrap();
    tokio::fs::write(videos.join("a.mp4"), b"done").await.unwrap();

    let store = PendingStore::new(tmp.path().join("pending_operations.json"));
    store.insert("b", pending("b", &videos)).await.unwrap();

    let backend = FakeVideoOps::default().reject("d", "quota exceeded");
    let prompts = vec![
        prompt("a", "a.mp4"),
        prompt("b", "b.mp4"),
        prompt("c", "c.mp4"),
        prompt("d", "d.mp4"),
    ];

    let results = submit_batches(&backend, &store, &prompts, &videos, no_wait(2))
        .await
        .unwrap();

    let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            ResultStatus::Skipped,
            ResultStatus::Pending,
            ResultStatus::Submitted,
            ResultStatus::Error,
        ]
    );
    assert_eq!(results[2].operation.as_deref(), Some("operations/c"));
    assert!(results[3].error.as_deref().unwrap().contains("quota exceeded"));
    assert_eq!(backend.submitted(), vec!["c".to_string()]);

    let stored = store.load().await.unwrap();
    assert_eq!(stored.keys().cloned().collect::<Vec<_>>(), vec!["b", "c"]);
    assert_eq!(stored["c"].filepath, videos.join("c.mp4"));
}

#[tokio::test]
async fn resubmitting_does_not_duplicate_a_pending_operation() {
    let tmp = tempfile::tempdir().unwrap();
    let videos = tmp.path().join("videos");
    let store = PendingStore::new(tmp.path().join("pending_operations.json"));
    let backend = FakeVideoOps::default();
    let prompts = vec![prompt("a", "a.mp4")];

    submit_batches(&backend, &store, &prompts, &videos, no_wait(3)).await.unwrap();
    let second = submit_batches(&backend, &store, &prompts, &videos, no_wait(3))
        .await
        .unwrap();

    assert_eq!(second[0].status, ResultStatus::Pending);
    assert_eq!(backend.submitted().len(), 1);
    assert_eq!(store.load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn poll_resolves_each_record_by_outcome() {
    let tmp = tempfile::tempdir().unwrap();
    let videos = tmp.path().join("videos");
    let store = PendingStore::new(tmp.path().join("pending_operations.json"));
    for id in ["done", "running", "gone", "flaky", "broken", "blank"] {
        store.insert(id, pending(id, &videos)).await.unwrap();
    }

    let backend = FakeVideoOps::default()
        .on_poll(
            "operations/done",
            PollScript::Done(GeneratedMedia::Inline(b"video".to_vec())),
        )
        .on_poll("operations/running", PollScript::Running)
        .on_poll("operations/gone", PollScript::NotFound)
        .on_poll("operations/flaky", PollScript::Transient)
        .on_poll(
            "operations/broken",
            PollScript::Done(GeneratedMedia::Remote(BROKEN_URL.to_string())),
        )
        .on_poll("operations/blank", PollScript::DoneEmpty);

    let summary = poll_pending(&backend, &store).await.unwrap();

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.expired, 1);
    assert_eq!(summary.retained, 2);
    assert_eq!(summary.remaining, 3);
    assert_eq!(backend.polled().len(), 6);

    let left = store.load().await.unwrap();
    assert_eq!(
        left.keys().cloned().collect::<Vec<_>>(),
        vec!["broken", "flaky", "running"]
    );

    assert_eq!(tokio::fs::read(videos.join("done.mp4")).await.unwrap(), b"video");
    assert!(!videos.join("broken.mp4").exists());
    assert!(!videos.join("blank.mp4").exists());
}

#[tokio::test]
async fn poll_with_nothing_pending_is_a_no_op() {
    let tmp = tempfile::tempdir().unwrap();
    let store = PendingStore::new(tmp.path().join("pending_operations.json"));
    let backend = FakeVideoOps::default();

    let summary = poll_pending(&backend, &store).await.unwrap();

    assert_eq!(summary.remaining, 0);
    assert!(backend.polled().is_empty());
}

#[tokio::test]
async fn watch_stops_once_the_store_drains() {
    let tmp = tempfile::tempdir().unwrap();
    let videos = tmp.path().join("videos");
    let store = PendingStore::new(tmp.path().join("pending_operations.json"));
    store.insert("a", pending("a", &videos)).await.unwrap();
    store.insert("b", pending("b", &videos)).await.unwrap();

    let backend = FakeVideoOps::default()
        .on_poll(
            "operations/a",
            PollScript::Done(GeneratedMedia::Inline(b"a".to_vec())),
        )
        .on_poll("operations/b", PollScript::NotFound);

    let summary = watch_pending(&backend, &store, Duration::ZERO).await.unwrap();

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.expired, 1);
    assert_eq!(summary.remaining, 0);
    assert!(store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn poll_flow_without_watch_runs_one_pass() {
    let tmp = tempfile::tempdir().unwrap();
    let videos = tmp.path().join("videos");
    let store = PendingStore::new(tmp.path().join("pending_operations.json"));
    store.insert("a", pending("a", &videos)).await.unwrap();

    let backend = FakeVideoOps::default();
    let summary = poll_videos_with(&backend, &store, None).await.unwrap();

    assert_eq!(summary.remaining, 1);
    assert_eq!(backend.polled().len(), 1);
}

#[tokio::test]
async fn submission_flow_writes_its_log() {
    let tmp = tempfile::tempdir().unwrap();
    let videos = tmp.path().join("videos");
    let log_path = tmp.path().join("video_submission_log.json");
    let store = PendingStore::new(tmp.path().join("pending_operations.json"));
    let backend = FakeVideoOps::default().reject("b", "bad prompt");
    let prompts = vec![prompt("a", "a.mp4"), prompt("b", "b.mp4")];

    let tally = submit_videos_with(&backend, &store, &prompts, &videos, &log_path, no_wait(3))
        .await
        .unwrap();
    assert_eq!(tally.submitted, 1);
    assert_eq!(tally.errors, 1);

    let log: RunLog =
        serde_json::from_str(&tokio::fs::read_to_string(&log_path).await.unwrap()).unwrap();
    assert_eq!(log.model, "fake-video-model");
    assert_eq!(log.total, 2);
    assert_eq!(log.success, 1);
    assert_eq!(log.errors, 1);
}

#[tokio::test]
async fn operations_that_finish_with_an_error_leave_the_queue() {
    let tmp = tempfile::tempdir().unwrap();
    let videos = tmp.path().join("videos");
    let store = PendingStore::new(tmp.path().join("pending_operations.json"));
    store.insert("blocked", pending("blocked", &videos)).await.unwrap();
    store.insert("running", pending("running", &videos)).await.unwrap();

    let backend = FakeVideoOps::default().on_poll(
        "operations/blocked",
        PollScript::Failed("video blocked by safety filter".to_string()),
    );

    let summary = poll_pending(&backend, &store).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.retained, 0);
    assert_eq!(summary.remaining, 1);
    let left = store.load().await.unwrap();
    assert_eq!(left.keys().cloned().collect::<Vec<_>>(), vec!["running"]);
    assert!(!videos.join("blocked.mp4").exists());
}

#[tokio::test]
async fn watch_ends_when_the_only_operation_failed() {
    let tmp = tempfile::tempdir().unwrap();
    let videos = tmp.path().join("videos");
    let store = PendingStore::new(tmp.path().join("pending_operations.json"));
    store.insert("v", pending("v", &videos)).await.unwrap();

    let backend = FakeVideoOps::default()
        .on_poll("operations/v", PollScript::Failed("blocked".to_string()));

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        watch_pending(&backend, &store, Duration::from_millis(10)),
    )
    .await
    .expect("watch kept polling a failed operation")
    .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.remaining, 0);
    assert_eq!(backend.polled(), vec!["operations/v"]);
}

#[tokio::test(start_paused = true)]
async fn batch_pause_only_follows_batches_that_submitted() {
    let tmp = tempfile::tempdir().unwrap();
    let videos = tmp.path().join("videos");
    tokio::fs::create_dir_all(&videos).await.unwrap();
    tokio::fs::write(videos.join("a.mp4"), b"done").await.unwrap();
    tokio::fs::write(videos.join("b.mp4"), b"done").await.unwrap();

    let store = PendingStore::new(tmp.path().join("pending_operations.json"));
    let backend = FakeVideoOps::default();
    let pacing = BatchPacing {
        batch_size: 2,
        delay_between_batches: Duration::from_secs(15),
    };
    // Batch 1 is all on disk, batch 2 submits, batch 3 is last.
    let prompts = vec![
        prompt("a", "a.mp4"),
        prompt("b", "b.mp4"),
        prompt("c", "c.mp4"),
        prompt("d", "d.mp4"),
        prompt("e", "e.mp4"),
    ];

    let started = tokio::time::Instant::now();
    submit_batches(&backend, &store, &prompts, &videos, pacing).await.unwrap();
    let waited = started.elapsed();

    assert!(waited >= Duration::from_secs(15), "waited {waited:?}");
    assert!(waited < Duration::from_secs(30), "waited {waited:?}");
    assert_eq!(backend.submitted(), vec!["c", "d", "e"]);
}

#[tokio::test(start_paused = true)]
async fn fully_skipped_submission_never_pauses() {
    let tmp = tempfile::tempdir().unwrap();
    let videos = tmp.path().join("videos");
    tokio::fs::create_dir_all(&videos).await.unwrap();
    for id in ["a", "b", "c", "d"] {
        tokio::fs::write(videos.join(format!("{id}.mp4")), b"done").await.unwrap();
    }
    let store = PendingStore::new(tmp.path().join("pending_operations.json"));
    let backend = FakeVideoOps::default();
    let pacing = BatchPacing {
        batch_size: 1,
        delay_between_batches: Duration::from_secs(15),
    };
    let prompts: Vec<_> = ["a", "b", "c", "d"]
        .iter()
        .map(|id| prompt(id, &format!("{id}.mp4")))
        .collect();

    let started = tokio::time::Instant::now();
    submit_batches(&backend, &store, &prompts, &videos, pacing).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(15));
    assert!(backend.submitted().is_empty());
}
