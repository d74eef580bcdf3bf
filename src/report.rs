use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Skipped,
    Empty,
    Error,
    Submitted,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationResult {
    pub status: ResultStatus,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl GenerationResult {
    fn bare(status: ResultStatus, id: &str) -> Self {
        Self {
            status,
            id: id.to_string(),
            file: None,
            size: None,
            error: None,
            operation: None,
        }
    }

    pub fn success(id: &str, file: &Path, size: u64) -> Self {
        Self {
            file: Some(file.to_path_buf()),
            size: Some(size),
            ..Self::bare(ResultStatus::Success, id)
        }
    }

    pub fn skipped(id: &str, file: &Path) -> Self {
        Self {
            file: Some(file.to_path_buf()),
            ..Self::bare(ResultStatus::Skipped, id)
        }
    }

    pub fn empty(id: &str) -> Self {
        Self::bare(ResultStatus::Empty, id)
    }

    pub fn error(id: &str, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::bare(ResultStatus::Error, id)
        }
    }

    pub fn submitted(id: &str, operation: &str) -> Self {
        Self {
            operation: Some(operation.to_string()),
            ..Self::bare(ResultStatus::Submitted, id)
        }
    }

    pub fn pending(id: &str) -> Self {
        Self::bare(ResultStatus::Pending, id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub success: usize,
    pub skipped: usize,
    pub empty: usize,
    pub errors: usize,
    pub submitted: usize,
    pub pending: usize,
}

impl Tally {
    pub fn of(results: &[GenerationResult]) -> Self {
        let mut t = Tally::default();
        for r in results {
            match r.status {
                ResultStatus::Success => t.success += 1,
                ResultStatus::Skipped => t.skipped += 1,
                ResultStatus::Empty => t.empty += 1,
                ResultStatus::Error => t.errors += 1,
                ResultStatus::Submitted => t.submitted += 1,
                ResultStatus::Pending => t.pending += 1,
            }
        }
        t
    }

    /// Assets that are on disk after the run, fresh or from an earlier one.
    pub fn ready(&self) -> usize {
        self.success + self.skipped
    }
}

/// Log for a single-model run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunLog {
    pub timestamp: DateTime<Local>,
    pub model: String,
    pub total: usize,
    pub success: usize,
    pub skipped: usize,
    pub errors: usize,
    pub elapsed_seconds: f64,
    pub results: Vec<GenerationResult>,
}

impl RunLog {
    pub fn new(model: &str, results: Vec<GenerationResult>, elapsed_seconds: f64) -> Self {
        let tally = Tally::of(&results);
        Self {
            timestamp: Local::now(),
            model: model.to_string(),
            total: results.len(),
            success: tally.success + tally.submitted,
            skipped: tally.skipped + tally.pending,
            errors: tally.errors,
            elapsed_seconds,
            results,
        }
    }
}

/// Log for a run that drove an image model and a video model.
#[derive(Debug, Serialize)]
pub struct DualRunLog {
    pub timestamp: DateTime<Local>,
    pub image_model: String,
    pub video_model: String,
    pub image_results: Vec<GenerationResult>,
    pub video_results: Vec<GenerationResult>,
}

pub async fn write_json_log<T: Serialize>(path: &Path, log: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(log)?;
    fs::write(path, body)
        .await
        .with_context(|| format!("Failed to write log {}", path.display()))?;
    Ok(())
}

/// Error count from a previous run log, if one can be read.
pub async fn read_logged_errors(path: &Path) -> Option<usize> {
    let text = fs::read_to_string(path).await.ok()?;
    let value: serde_json::Value = serde_json::from_str(&text).ok()?;
    value.get("errors")?.as_u64().map(|n| n as usize)
}

pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB {
        format!("{:.1} MB", b / (KB * KB))
    } else {
        format!("{:.0} KB", b / KB)
    }
}
