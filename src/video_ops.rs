//! Asynchronous video generation: submit requests, record their operation
//! handles, and later poll the handles and download finished clips.
//!
//! A record lives in the [`PendingStore`] from a successful submit until the
//! poll that downloads its clip, finds the operation finished without output
//! or with an error, or learns the vendor no longer knows the handle. Any other poll or
//! download failure leaves the record in place for the next poll.

use crate::api::{OperationStatus, VideoOperations};
use crate::catalog::PromptDescriptor;
use crate::generator::{ensure_parent, file_exists};
use crate::report::{GenerationResult, ResultStatus, human_size};
use crate::store::{PendingOperation, PendingStore};
use crate::{loge, logi, logok, logw, snippet};
use anyhow::Result;
use chrono::Local;
use std::path::Path;
use std::time::Duration;

pub const BATCH_SIZE: usize = 3;
pub const DELAY_BETWEEN_BATCHES: Duration = Duration::from_secs(15);
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct BatchPacing {
    pub batch_size: usize,
    pub delay_between_batches: Duration,
}

impl Default for BatchPacing {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            delay_between_batches: DELAY_BETWEEN_BATCHES,
        }
    }
}

impl BatchPacing {
    pub fn batch_count(&self, prompts: usize) -> usize {
        prompts.div_ceil(self.batch_size.max(1))
    }
}

/// Submits one prompt. Store IO failures are returned; vendor failures become `error` results.
pub async fn submit_one(
    backend: &dyn VideoOperations,
    store: &PendingStore,
    prompt: &PromptDescriptor,
    output_dir: &Path,
) -> Result<GenerationResult> {
    let filepath = output_dir.join(&prompt.filename);
    ensure_parent(&filepath).await?;

    if file_exists(&filepath).await {
        logi(format!("SKIP (exists): {}", prompt.filename));
        return Ok(GenerationResult::skipped(&prompt.id, &filepath));
    }

    if store.contains(&prompt.id).await? {
        logi(format!(
            "SKIP (pending): {} (use `videos --poll` to check status)",
            prompt.id
        ));
        return Ok(GenerationResult::pending(&prompt.id));
    }

    logi(format!("Submitting: {}", prompt.id));
    logi(format!("   Purpose: {}", prompt.purpose));
    logi(format!("   Duration: {}s", prompt.duration()));

    let handle = match backend.submit(prompt).await {
        Ok(handle) => handle,
        Err(e) => {
            let msg = e.to_string();
            loge(format!("Error: {}", snippet(&msg, 150)));
            return Ok(GenerationResult::error(&prompt.id, msg));
        }
    };

    store
        .insert(
            &prompt.id,
            PendingOperation {
                operation_name: handle.clone(),
                filename: prompt.filename.clone(),
                filepath,
                purpose: prompt.purpose.clone(),
                submitted_at: Local::now(),
            },
        )
        .await?;

    logok(format!("Submitted! Operation: {}", snippet(&handle, 50)));
    Ok(GenerationResult::submitted(&prompt.id, &handle))
}

/// Submits in fixed-size batches, pausing between batches that actually submitted something.
pub async fn submit_batches(
    backend: &dyn VideoOperations,
    store: &PendingStore,
    prompts: &[PromptDescriptor],
    output_dir: &Path,
    pacing: BatchPacing,
) -> Result<Vec<GenerationResult>> {
    let size = pacing.batch_size.max(1);
    let batches: Vec<&[PromptDescriptor]> = prompts.chunks(size).collect();
    let mut results = Vec::with_capacity(prompts.len());

    for (batch_idx, batch) in batches.iter().enumerate() {
        println!("\n{}", "─".repeat(60));
        println!(
            "  BATCH {}/{} ({} videos)",
            batch_idx + 1,
            batches.len(),
            batch.len()
        );
        println!("{}", "─".repeat(60));

        let mut batch_had_submission = false;
        for (i, prompt) in batch.iter().enumerate() {
            let overall = batch_idx * size + i;
            println!("\n[{}/{}] {}", overall + 1, prompts.len(), "─".repeat(29));
            let result = submit_one(backend, store, prompt, output_dir).await?;
            if result.status == ResultStatus::Submitted {
                batch_had_submission = true;
            }
            results.push(result);
        }

        let last = batch_idx + 1 == batches.len();
        if !last && batch_had_submission && !pacing.delay_between_batches.is_zero() {
            logi(format!(
                "Batch {} done. Waiting {}s before next batch...",
                batch_idx + 1,
                pacing.delay_between_batches.as_secs()
            ));
            tokio::time::sleep(pacing.delay_between_batches).await;
        }
    }

    Ok(results)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Downloaded and removed from the store.
    pub completed: usize,
    /// Finished without any video; removed.
    pub empty: usize,
    /// Unknown to the vendor; removed.
    pub expired: usize,
    /// Finished with a vendor error; removed.
    pub failed: usize,
    /// Poll or download failed transiently; kept for the next poll.
    /// Across a watch this is the last pass's count, since the same records retry.
    pub retained: usize,
    /// Records left in the store after this pass.
    pub remaining: usize,
}

enum Outcome {
    Completed,
    Empty,
    Expired,
    Failed,
    Running,
    Retained,
}

async fn poll_one(backend: &dyn VideoOperations, op: &PendingOperation) -> Outcome {
    let status = match backend.poll(&op.operation_name).await {
        Ok(status) => status,
        Err(e) if e.is_expired() => {
            logw("Operation expired or not found. Removing from queue.");
            return Outcome::Expired;
        }
        Err(e) if e.is_terminal() => {
            logw(format!(
                "Operation finished with an error: {}. Removing from queue.",
                snippet(&e.to_string(), 120)
            ));
            return Outcome::Failed;
        }
        Err(e) => {
            loge(format!("Poll error: {}", snippet(&e.to_string(), 120)));
            return Outcome::Retained;
        }
    };

    let media = match status {
        OperationStatus::Running => {
            logi(format!(
                "Still processing (submitted {}m ago)",
                op.age_minutes(Local::now())
            ));
            return Outcome::Running;
        }
        OperationStatus::Done(None) => {
            logw("Operation done but no generated video in result");
            return Outcome::Empty;
        }
        OperationStatus::Done(Some(media)) => media,
    };

    logok("COMPLETE!");
    if let Err(e) = ensure_parent(&op.filepath).await {
        loge(format!("Cannot create {}: {}", op.filepath.display(), e));
        return Outcome::Retained;
    }
    match backend.download(&media, &op.filepath).await {
        Ok(size) => {
            logok(format!("Saved: {} ({})", op.filepath.display(), human_size(size)));
            Outcome::Completed
        }
        Err(e) => {
            logw(format!("Download error: {}", snippet(&e.to_string(), 100)));
            logw("Keeping in queue; re-run poll to retry");
            let _ = tokio::fs::remove_file(&op.filepath).await;
            Outcome::Retained
        }
    }
}

/// One pass over every pending record.
pub async fn poll_pending(backend: &dyn VideoOperations, store: &PendingStore) -> Result<PollSummary> {
    let pending = store.load().await?;
    let mut summary = PollSummary::default();
    if pending.is_empty() {
        logi("No pending video operations found.");
        return Ok(summary);
    }

    logi(format!("Polling {} pending operation(s)...", pending.len()));
    let mut finished = Vec::new();

    for (video_id, op) in &pending {
        println!("\n  [{}]", video_id);
        logi(format!("Operation: {}", snippet(&op.operation_name, 60)));

        match poll_one(backend, op).await {
            Outcome::Completed => {
                summary.completed += 1;
                finished.push(video_id.clone());
            }
            Outcome::Empty => {
                summary.empty += 1;
                finished.push(video_id.clone());
            }
            Outcome::Expired => {
                summary.expired += 1;
                finished.push(video_id.clone());
            }
            Outcome::Failed => {
                summary.failed += 1;
                finished.push(video_id.clone());
            }
            Outcome::Retained => summary.retained += 1,
            Outcome::Running => {}
        }
    }

    let left = store.remove(&finished).await?;
    summary.remaining = left.len();

    if summary.remaining > 0 {
        logi(format!(
            "{} video(s) still processing. Poll again in a few minutes.",
            summary.remaining
        ));
    } else {
        logok("All videos complete!");
    }
    Ok(summary)
}

/// Polls every `interval` until the store is empty.
pub async fn watch_pending(
    backend: &dyn VideoOperations,
    store: &PendingStore,
    interval: Duration,
) -> Result<PollSummary> {
    let mut total = PollSummary::default();
    loop {
        let pass = poll_pending(backend, store).await?;
        total.completed += pass.completed;
        total.empty += pass.empty;
        total.expired += pass.expired;
        total.failed += pass.failed;
        total.retained = pass.retained;
        total.remaining = pass.remaining;
        if pass.remaining == 0 {
            return Ok(total);
        }
        logi(format!("Next poll in {}s...", interval.as_secs()));
        tokio::time::sleep(interval).await;
    }
}
