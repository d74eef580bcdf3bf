//! Web-optimization pass. All real work is done by `ffmpeg` and `cwebp`.

use crate::report::human_size;
use crate::{logi, logok, logw, snippet};
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use walkdir::WalkDir;

const WEBP_QUALITY: &str = "85";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageVariant {
    pub suffix: &'static str,
    pub width: u32,
}

pub const RESPONSIVE_IMAGES: [ImageVariant; 3] = [
    ImageVariant { suffix: "sm", width: 640 },
    ImageVariant { suffix: "md", width: 1024 },
    ImageVariant { suffix: "lg", width: 1920 },
];

pub const RESPONSIVE_IMAGES_XL: [ImageVariant; 4] = [
    ImageVariant { suffix: "sm", width: 640 },
    ImageVariant { suffix: "md", width: 1024 },
    ImageVariant { suffix: "lg", width: 1920 },
    ImageVariant { suffix: "xl", width: 2560 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoVariant {
    pub label: &'static str,
    pub scale: &'static str,
    pub crf: &'static str,
}

pub const WEB_VIDEOS: [VideoVariant; 2] = [
    VideoVariant { label: "720p", scale: "1280:720", crf: "28" },
    VideoVariant { label: "480p", scale: "854:480", crf: "30" },
];

async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let output = Command::new(&args[0])
        .args(&args[1..])
        .output()
        .await
        .with_context(|| format!("Failed to launch {}", args[0]))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: String = {
            let chars: Vec<char> = stderr.trim().chars().collect();
            chars[chars.len().saturating_sub(300)..].iter().collect()
        };
        return Err(anyhow::anyhow!("Command failed: {} ({})", args[0], tail));
    }

    Ok(())
}

pub async fn tool_available(name: &str, version_flag: &str) -> bool {
    match Command::new(name).arg(version_flag).output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// `<stem>-<suffix>.<ext>` next to `base` (which has no extension).
pub fn variant_path(base: &Path, suffix: &str, ext: &str) -> PathBuf {
    let name = base
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or_default();
    base.with_file_name(format!("{}-{}.{}", name, suffix, ext))
}

/// `dir/rel` with the extension stripped, used as the stem for variants.
pub fn variant_base(dir: &Path, rel: &Path) -> PathBuf {
    dir.join(rel.with_extension(""))
}

pub fn video_variant_args(src: &Path, out: &Path, variant: &VideoVariant) -> Vec<String> {
    vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        src.display().to_string(),
        "-vf".to_string(),
        format!("scale={}:force_original_aspect_ratio=decrease", variant.scale),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "slow".to_string(),
        "-crf".to_string(),
        variant.crf.to_string(),
        "-an".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        out.display().to_string(),
    ]
}

pub fn webp_args(src: &Path, out: &Path, width: u32) -> Vec<String> {
    vec![
        "cwebp".to_string(),
        "-quiet".to_string(),
        "-q".to_string(),
        WEBP_QUALITY.to_string(),
        "-resize".to_string(),
        width.to_string(),
        "0".to_string(),
        src.display().to_string(),
        "-o".to_string(),
        out.display().to_string(),
    ]
}

pub fn jpeg_resize_args(src: &Path, out: &Path, width: u32) -> Vec<String> {
    vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        src.display().to_string(),
        "-vf".to_string(),
        format!("scale={}:-2", width),
        "-q:v".to_string(),
        "3".to_string(),
        out.display().to_string(),
    ]
}

async fn file_size(path: &Path) -> u64 {
    fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {}", parent.display()))?;
    }
    Ok(())
}

/// Writes 720p and 480p web encodes of `src` as `<base>-720p.mp4` / `<base>-480p.mp4`.
///
/// A failed 720p encode falls back to copying the source so the site always
/// has a desktop file; a failed 480p encode is only reported.
pub async fn web_video_variants(src: &Path, base: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (idx, variant) in WEB_VIDEOS.iter().enumerate() {
        let out = variant_path(base, variant.label, "mp4");
        ensure_parent(&out).await?;

        match run_cmd(&video_variant_args(src, &out, variant)).await {
            Ok(()) => {
                logok(format!(
                    "{}: {} ({})",
                    variant.label,
                    out.display(),
                    human_size(file_size(&out).await)
                ));
                written.push(out);
            }
            Err(e) if idx == 0 => {
                logw(format!("ffmpeg error ({}): {}", variant.label, snippet(&e.to_string(), 100)));
                fs::copy(src, &out)
                    .await
                    .with_context(|| format!("Failed to copy {} to {}", src.display(), out.display()))?;
                logw(format!("{}: copied source as fallback -> {}", variant.label, out.display()));
                written.push(out);
            }
            Err(e) => {
                logw(format!("ffmpeg error ({}): {}", variant.label, snippet(&e.to_string(), 100)));
            }
        }
    }
    Ok(written)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebpFallback {
    /// Produce `<base>-<suffix>.jpg` with ffmpeg when cwebp fails.
    Jpeg,
    /// Stop making variants for this image.
    Stop,
}

/// Responsive variants for one image: WebP via cwebp, optionally JPEG via ffmpeg when that fails.
pub async fn responsive_image_variants(
    src: &Path,
    base: &Path,
    variants: &[ImageVariant],
    fallback: WebpFallback,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for variant in variants {
        let webp = variant_path(base, variant.suffix, "webp");
        ensure_parent(&webp).await?;

        match run_cmd(&webp_args(src, &webp, variant.width)).await {
            Ok(()) => {
                logok(format!(
                    "{}: {} ({})",
                    variant.suffix,
                    webp.display(),
                    human_size(file_size(&webp).await)
                ));
                written.push(webp);
                continue;
            }
            Err(e) if fallback == WebpFallback::Stop => {
                logw(format!("cwebp not available, keeping original ({})", snippet(&e.to_string(), 80)));
                break;
            }
            Err(_) => {}
        }

        let jpg = variant_path(base, variant.suffix, "jpg");
        match run_cmd(&jpeg_resize_args(src, &jpg, variant.width)).await {
            Ok(()) => {
                logok(format!(
                    "{}: {} ({}, jpg fallback)",
                    variant.suffix,
                    jpg.display(),
                    human_size(file_size(&jpg).await)
                ));
                written.push(jpg);
            }
            Err(e) => logw(format!(
                "{}: no variant written: {}",
                variant.suffix,
                snippet(&e.to_string(), 100)
            )),
        }
    }
    Ok(written)
}

fn has_extension(path: &Path, wanted: &[&str]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|e| wanted.iter().any(|w| e.eq_ignore_ascii_case(w)))
        .unwrap_or(false)
}

/// Files under `root` with one of the given extensions, paired with their path relative to `root`.
pub fn collect_files(root: &Path, extensions: &[&str]) -> Vec<(PathBuf, PathBuf)> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name().into_iter().flatten() {
        let path = entry.path();
        if !entry.file_type().is_file() || !has_extension(path, extensions) {
            continue;
        }
        if let Some(rel) = pathdiff::diff_paths(path, root) {
            out.push((path.to_path_buf(), rel));
        }
    }
    out
}

async fn publish_tree_image(
    src: &Path,
    rel: &Path,
    dest_dir: &Path,
    variants: &[ImageVariant],
) -> Result<()> {
    responsive_image_variants(src, &variant_base(dest_dir, rel), variants, WebpFallback::Jpeg)
        .await?;

    let original = dest_dir.join(rel);
    ensure_parent(&original).await?;
    fs::copy(src, &original)
        .await
        .with_context(|| format!("Failed to copy {}", src.display()))?;
    logok(format!("Original: {}", original.display()));
    Ok(())
}

/// Copies every source image into `dest_dir` at the same relative path and writes its variants beside it.
///
/// A file that fails is reported and skipped; the count is of files that made it.
pub async fn optimize_image_tree(
    src_dir: &Path,
    dest_dir: &Path,
    variants: &[ImageVariant],
) -> Result<usize> {
    if !src_dir.is_dir() {
        logi("No images to optimize.");
        return Ok(0);
    }

    let files = collect_files(src_dir, &["jpg", "jpeg", "png"]);
    let mut done = 0;
    for (src, rel) in &files {
        match publish_tree_image(src, rel, dest_dir, variants).await {
            Ok(()) => done += 1,
            Err(e) => logw(format!("{}: {:#}", rel.display(), e)),
        }
    }
    Ok(done)
}

/// Web encodes for every source video, mirrored under `dest_dir`. Failing files are skipped.
pub async fn optimize_video_tree(src_dir: &Path, dest_dir: &Path) -> Result<usize> {
    if !src_dir.is_dir() {
        logi("No videos to optimize.");
        return Ok(0);
    }

    let files = collect_files(src_dir, &["mp4", "webm"]);
    let mut done = 0;
    for (src, rel) in &files {
        match web_video_variants(src, &variant_base(dest_dir, rel)).await {
            Ok(_) => done += 1,
            Err(e) => logw(format!("{}: {:#}", rel.display(), e)),
        }
    }
    logok("Video optimization complete.");
    Ok(done)
}
