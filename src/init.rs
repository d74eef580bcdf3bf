use crate::config::Config;
use crate::optimize::tool_available;
use crate::{logi, logw};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;

fn required_dirs(cfg: &Config) -> Vec<PathBuf> {
    vec![
        cfg.output_dir.clone(),
        cfg.images_dir(),
        cfg.videos_dir(),
        cfg.replicate_dir().join("images"),
        cfg.replicate_dir().join("videos"),
    ]
}

pub async fn ensure_directories(cfg: &Config) -> Result<()> {
    for dir in required_dirs(cfg) {
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            logi(format!("Created directory: {}", dir.display()));
        }
    }
    Ok(())
}

/// Warns about missing media tools; generation still works without them.
pub async fn check_tools() -> bool {
    let mut all = true;
    if !tool_available("ffmpeg", "-version").await {
        logw("FFmpeg not found in PATH. Video optimization will fall back to copying sources.");
        all = false;
    }
    if !tool_available("cwebp", "-version").await {
        logw("cwebp not found in PATH. Image variants will be JPEG via ffmpeg.");
        all = false;
    }
    all
}
