use crate::api::MediaGenerator;
use crate::catalog::PromptDescriptor;
use crate::report::{GenerationResult, ResultStatus, human_size};
use crate::{loge, logi, logok, logw, snippet};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

pub(crate) async fn file_exists(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

pub(crate) async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).await,
        None => Ok(()),
    }
}

/// Generates one asset unless its file is already on disk.
pub async fn generate_one(
    generator: &dyn MediaGenerator,
    prompt: &PromptDescriptor,
    output_dir: &Path,
) -> GenerationResult {
    let filepath = output_dir.join(&prompt.filename);
    if let Err(e) = ensure_parent(&filepath).await {
        return GenerationResult::error(&prompt.id, e.to_string());
    }

    if file_exists(&filepath).await {
        logi(format!("SKIP (exists): {}", prompt.filename));
        return GenerationResult::skipped(&prompt.id, &filepath);
    }

    logi(format!("Generating: {}", prompt.id));
    logi(format!("   Purpose: {}", prompt.purpose));

    let media = match generator.generate(prompt).await {
        Ok(Some(media)) => media,
        Ok(None) => {
            logw(format!("No output returned for: {}", prompt.id));
            return GenerationResult::empty(&prompt.id);
        }
        Err(e) => {
            let msg = e.to_string();
            loge(format!("Error: {}", snippet(&msg, 200)));
            return GenerationResult::error(&prompt.id, msg);
        }
    };

    match generator.download(&media, &filepath).await {
        Ok(size) => {
            logok(format!("Saved: {} ({})", filepath.display(), human_size(size)));
            GenerationResult::success(&prompt.id, &filepath, size)
        }
        Err(e) => {
            let msg = e.to_string();
            loge(format!("Save failed: {}", snippet(&msg, 200)));
            // A partial write must not look like a finished asset on the next run.
            let _ = fs::remove_file(&filepath).await;
            GenerationResult::error(&prompt.id, msg)
        }
    }
}

/// Runs prompts one after another, pausing `delay` after each real request.
pub async fn run_sequential(
    generator: &dyn MediaGenerator,
    prompts: &[PromptDescriptor],
    output_dir: &Path,
    delay: Duration,
) -> Vec<GenerationResult> {
    let mut results = Vec::with_capacity(prompts.len());
    for (i, prompt) in prompts.iter().enumerate() {
        println!("\n[{}/{}] {}", i + 1, prompts.len(), "─".repeat(29));
        let result = generate_one(generator, prompt, output_dir).await;
        let skipped = result.status == ResultStatus::Skipped;
        results.push(result);

        if i + 1 < prompts.len() && !skipped && !delay.is_zero() {
            logi(format!("Waiting {}s (rate limit)...", delay.as_secs()));
            tokio::time::sleep(delay).await;
        }
    }
    results
}
