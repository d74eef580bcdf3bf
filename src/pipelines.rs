//! The user-facing flows, one per subcommand.
//!
//! Each flow loads its prompt collection, builds the vendor backend from
//! [`Config`], runs generation, optionally runs the optimization pass, and
//! writes a JSON run log. The `*_with` functions take the backend as a trait
//! object so they can be driven by fakes.

use crate::api::gemini::{GeminiClient, ImagenGenerator, VeoOperations};
use crate::api::replicate::{ReplicateClient, ReplicateGenerator, ReplicateKind};
use crate::api::{MediaGenerator, VideoOperations, http_client};
use crate::catalog::{self, Collection, PromptDescriptor};
use crate::config::Config;
use crate::generator::{file_exists, generate_one, run_sequential};
use crate::optimize::{self, RESPONSIVE_IMAGES, RESPONSIVE_IMAGES_XL, WebpFallback};
use crate::report::{
    DualRunLog, ResultStatus, RunLog, Tally, read_logged_errors, write_json_log,
};
use crate::store::{PendingMap, PendingStore};
use crate::video_ops::{self, BatchPacing, POLL_INTERVAL, PollSummary};
use crate::{logi, logok, logw, snippet};
use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;
use std::time::{Duration, Instant};

/// 10 requests per minute against Imagen.
pub const IMAGE_REQUEST_DELAY: Duration = Duration::from_secs(6);
pub const HERO_REQUEST_DELAY: Duration = Duration::from_secs(5);

pub const IMAGE_PRIORITY: [&str; 8] = [
    "hero",
    "divisions",
    "sectors",
    "about",
    "sustainability",
    "careers",
    "partners",
    "ui-elements",
];

fn rule(ch: &str) -> String {
    ch.repeat(60)
}

fn banner(title: &str, lines: &[String]) {
    println!("{}", rule("="));
    println!("  {}", title);
    for line in lines {
        println!("  {}", line);
    }
    println!("{}", rule("="));
}

fn phase(title: &str) {
    println!("\n{}", rule("─"));
    println!("  {}", title);
    println!("{}\n", rule("─"));
}

fn gemini(cfg: &Config) -> Result<GeminiClient> {
    let key = cfg.google_key()?;
    Ok(GeminiClient::new(http_client()?, key))
}

fn replicate(cfg: &Config) -> Result<ReplicateClient> {
    let token = cfg.replicate_token()?;
    Ok(ReplicateClient::new(http_client()?, token))
}

pub fn print_listing(prompts: &[PromptDescriptor], with_duration: bool) {
    for p in prompts {
        if with_duration {
            println!(
                "  {:30} [{:12}] {}s - {}",
                p.id,
                p.category,
                p.duration(),
                p.purpose
            );
        } else {
            println!("  {:35} [{:15}] {}", p.id, p.category, p.purpose);
        }
    }
}

pub fn print_dry_run(prompts: &[PromptDescriptor], with_duration: bool) {
    for p in prompts {
        println!("\n  [{}] {}", p.id, p.filename);
        println!("  Category: {}", p.category);
        if with_duration {
            println!("  Duration: {}s", p.duration());
        } else {
            println!("  Aspect:   {}", p.aspect_ratio());
        }
        println!("  Purpose:  {}", p.purpose);
        println!("  Prompt:   {}", snippet(&p.prompt, 200));
    }
}

pub fn print_summary() -> Result<()> {
    let images = catalog::load(Collection::SiteImages)?;
    let videos = catalog::load(Collection::SiteVideos)?;

    banner("Asset Generation Summary", &[]);
    println!("\n  Total Images: {}", images.len());
    for (cat, n) in catalog::count_by_category(&images) {
        println!("    {:20} : {} images", cat, n);
    }
    println!("\n  Total Videos: {}", videos.len());
    for (cat, n) in catalog::count_by_category(&videos) {
        println!("    {:20} : {} videos", cat, n);
    }
    println!("\n  Grand Total: {} assets", images.len() + videos.len());
    println!("{}\n", rule("="));
    Ok(())
}

// ---------------------------------------------------------------------------
// images
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ImageOptions {
    pub category: Option<String>,
    pub id: Option<String>,
    pub dry_run: bool,
    pub list: bool,
}

pub async fn site_images(cfg: &Config, opts: &ImageOptions) -> Result<()> {
    let all = catalog::load(Collection::SiteImages)?;
    if opts.list {
        print_listing(&all, false);
        return Ok(());
    }
    let prompts = catalog::select(&all, opts.id.as_deref(), opts.category.as_deref())?;
    run_site_images(cfg, &prompts, opts.dry_run).await
}

async fn run_site_images(cfg: &Config, prompts: &[PromptDescriptor], dry_run: bool) -> Result<()> {
    let mut lines = vec![
        format!("Model: {}", cfg.image_model),
        format!("Images to generate: {}", prompts.len()),
        format!("Output: {}", cfg.images_dir().display()),
    ];
    if dry_run {
        lines.push("MODE: DRY RUN (no API calls)".to_string());
    }
    banner("Image Generation", &lines);

    if dry_run {
        print_dry_run(prompts, false);
        return Ok(());
    }

    let generator = ImagenGenerator::new(gemini(cfg)?, cfg.image_model.clone());
    site_images_with(
        &generator,
        prompts,
        &cfg.images_dir(),
        &cfg.output_dir.join("image_generation_log.json"),
        IMAGE_REQUEST_DELAY,
    )
    .await?;
    Ok(())
}

pub async fn site_images_with(
    generator: &dyn MediaGenerator,
    prompts: &[PromptDescriptor],
    images_dir: &Path,
    log_path: &Path,
    delay: Duration,
) -> Result<Tally> {
    let started = Instant::now();
    let results = run_sequential(generator, prompts, images_dir, delay).await;
    let elapsed = started.elapsed().as_secs_f64();
    let tally = Tally::of(&results);

    println!();
    banner(
        "GENERATION COMPLETE",
        &[format!(
            "Time: {:.0}s | Success: {} | Skipped: {} | Errors: {}",
            elapsed, tally.success, tally.skipped, tally.errors
        )],
    );

    write_json_log(log_path, &RunLog::new(generator.model(), results, elapsed)).await?;
    logi(format!("Log saved: {}", log_path.display()));

    if tally.errors > 0 {
        logw(format!(
            "{} image(s) failed. Re-run to retry failed images.",
            tally.errors
        ));
    }
    Ok(tally)
}

// ---------------------------------------------------------------------------
// videos
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct VideoOptions {
    pub category: Option<String>,
    pub id: Option<String>,
    pub dry_run: bool,
    pub list: bool,
    pub poll: bool,
    pub watch: bool,
}

pub async fn site_videos(cfg: &Config, opts: &VideoOptions) -> Result<()> {
    let all = catalog::load(Collection::SiteVideos)?;
    if opts.list {
        print_listing(&all, true);
        return Ok(());
    }

    let store = PendingStore::new(cfg.pending_operations_path());
    if opts.poll {
        let backend = VeoOperations::new(gemini(cfg)?, cfg.video_model.clone());
        poll_videos_with(&backend, &store, opts.watch.then_some(POLL_INTERVAL)).await?;
        return Ok(());
    }

    let prompts = catalog::select(&all, opts.id.as_deref(), opts.category.as_deref())?;
    run_site_videos(cfg, &prompts, opts.dry_run).await
}

async fn run_site_videos(cfg: &Config, prompts: &[PromptDescriptor], dry_run: bool) -> Result<()> {
    let pacing = BatchPacing::default();
    let mut lines = vec![
        format!("Model: {}", cfg.video_model),
        format!(
            "Videos to generate: {} ({} batches of {})",
            prompts.len(),
            pacing.batch_count(prompts.len()),
            pacing.batch_size
        ),
        format!("Output: {}", cfg.videos_dir().display()),
    ];
    if dry_run {
        lines.push("MODE: DRY RUN (no API calls)".to_string());
    }
    banner("Video Generation", &lines);

    if dry_run {
        print_dry_run(prompts, true);
        return Ok(());
    }

    let backend = VeoOperations::new(gemini(cfg)?, cfg.video_model.clone());
    let store = PendingStore::new(cfg.pending_operations_path());
    submit_videos_with(
        &backend,
        &store,
        prompts,
        &cfg.videos_dir(),
        &cfg.output_dir.join("video_submission_log.json"),
        pacing,
    )
    .await?;
    Ok(())
}

pub async fn submit_videos_with(
    backend: &dyn VideoOperations,
    store: &PendingStore,
    prompts: &[PromptDescriptor],
    videos_dir: &Path,
    log_path: &Path,
    pacing: BatchPacing,
) -> Result<Tally> {
    let started = Instant::now();
    let results = video_ops::submit_batches(backend, store, prompts, videos_dir, pacing).await?;
    let elapsed = started.elapsed().as_secs_f64();
    let tally = Tally::of(&results);

    println!();
    let mut lines = vec![format!(
        "Submitted: {} | Skipped: {} | Errors: {}",
        tally.submitted,
        tally.skipped + tally.pending,
        tally.errors
    )];
    if tally.submitted > 0 {
        lines.push(String::new());
        lines.push("Videos are generating asynchronously.".to_string());
        lines.push("Run this to check status:".to_string());
        lines.push("asset-generator videos --poll".to_string());
    }
    banner("SUBMISSION COMPLETE", &lines);

    write_json_log(log_path, &RunLog::new(backend.model(), results, elapsed)).await?;
    Ok(tally)
}

pub async fn poll_videos_with(
    backend: &dyn VideoOperations,
    store: &PendingStore,
    watch: Option<Duration>,
) -> Result<PollSummary> {
    match watch {
        Some(interval) => video_ops::watch_pending(backend, store, interval).await,
        None => video_ops::poll_pending(backend, store).await,
    }
}

// ---------------------------------------------------------------------------
// hero-videos
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct HeroOptions {
    pub id: Option<String>,
    pub dry_run: bool,
    pub skip_optimize: bool,
}

pub async fn hero_videos(cfg: &Config, opts: &HeroOptions) -> Result<()> {
    let all = catalog::load(Collection::HeroVideos)?;
    let videos = match opts.id.as_deref() {
        Some(id) => {
            let picked: Vec<_> = all.iter().filter(|v| v.id == id).cloned().collect();
            if picked.is_empty() {
                let available: Vec<_> = all.iter().map(|v| v.id.as_str()).collect();
                anyhow::bail!(
                    "No video with id '{}' (available: {})",
                    id,
                    available.join(", ")
                );
            }
            picked
        }
        None => all,
    };

    let out_dir = cfg.replicate_dir().join("videos").join("hero");
    let mut lines = vec![
        format!("Model: {}", cfg.replicate_video_model),
        format!("Videos: {}", videos.len()),
        format!("Output: {}", out_dir.display()),
    ];
    if opts.dry_run {
        lines.push("MODE: DRY RUN".to_string());
    }
    banner("Hero Video Generator", &lines);

    if opts.dry_run {
        print_dry_run(&videos, true);
        return Ok(());
    }

    let generator = ReplicateGenerator::new(
        replicate(cfg)?,
        cfg.replicate_video_model.clone(),
        ReplicateKind::Video,
    );
    let website_hero = (!opts.skip_optimize).then(|| cfg.website_videos_dir().join("hero"));
    hero_videos_with(
        &generator,
        &videos,
        &out_dir,
        website_hero.as_deref(),
        HERO_REQUEST_DELAY,
    )
    .await?;
    Ok(())
}

/// Generates hero clips; with `website_dir`, each fresh clip also gets its web encodes there.
pub async fn hero_videos_with(
    generator: &dyn MediaGenerator,
    videos: &[PromptDescriptor],
    out_dir: &Path,
    website_dir: Option<&Path>,
    delay: Duration,
) -> Result<Tally> {
    let started = Instant::now();
    let mut results = Vec::with_capacity(videos.len());

    for (i, video) in videos.iter().enumerate() {
        phase(&format!("[{}/{}] {}", i + 1, videos.len(), video.id.to_uppercase()));
        let result = generate_one(generator, video, out_dir).await;

        if i + 1 < videos.len() && result.status != ResultStatus::Skipped && !delay.is_zero() {
            logi(format!("Waiting {}s for rate limit...", delay.as_secs()));
            tokio::time::sleep(delay).await;
        }

        if let (ResultStatus::Success, Some(dir), Some(file)) =
            (result.status, website_dir, result.file.as_deref())
        {
            logi("Optimizing for web...");
            let base = dir.join(format!("hero_{}", video.id));
            if let Err(e) = optimize::web_video_variants(file, &base).await {
                logw(format!("Optimization failed for {}: {:#}", video.id, e));
            }
        }
        results.push(result);
    }

    let tally = Tally::of(&results);
    println!();
    banner(
        &format!(
            "COMPLETE: {} generated | {} skipped | {} errors",
            tally.success, tally.skipped, tally.errors
        ),
        &[],
    );

    let elapsed = started.elapsed().as_secs_f64();
    let log_path = out_dir.join("hero_generation_log.json");
    write_json_log(&log_path, &RunLog::new(generator.model(), results, elapsed)).await?;
    Ok(tally)
}

// ---------------------------------------------------------------------------
// media-images
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MediaOptions {
    pub dry_run: bool,
    pub skip_optimize: bool,
}

pub async fn media_images(cfg: &Config, opts: &MediaOptions) -> Result<()> {
    let images = catalog::load(Collection::MediaImages)?;
    let out_dir = cfg.replicate_dir().join("images");

    let counts = catalog::count_by_category(&images);
    let mut lines = vec![format!("Model: {}", cfg.replicate_image_model)];
    for (cat, n) in &counts {
        lines.push(format!("{} images: {}", cat, n));
    }
    lines.push(format!("Total: {}", images.len()));
    if opts.dry_run {
        lines.push("MODE: DRY RUN".to_string());
    }
    banner("Media Page Image Generator", &lines);

    if opts.dry_run {
        print_dry_run(&images, false);
        return Ok(());
    }

    let generator = ReplicateGenerator::new(
        replicate(cfg)?,
        cfg.replicate_image_model.clone(),
        ReplicateKind::Image,
    );
    let website = (!opts.skip_optimize).then(|| cfg.website_images_dir());
    media_images_with(
        &generator,
        &images,
        &out_dir,
        website.as_deref(),
        &cfg.replicate_dir().join("media_generation_log.json"),
    )
    .await?;
    Ok(())
}

/// Copies the original into the website images dir and writes its sm/md/lg variants.
async fn publish_image(src: &Path, website: &Path, filename: &str) -> Result<()> {
    let dest = website.join(filename);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::copy(src, &dest)
        .await
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;
    logok(format!("Original: {}", dest.display()));

    let base = optimize::variant_base(website, Path::new(filename));
    optimize::responsive_image_variants(src, &base, &RESPONSIVE_IMAGES, WebpFallback::Jpeg).await?;
    Ok(())
}

pub async fn media_images_with(
    generator: &dyn MediaGenerator,
    images: &[PromptDescriptor],
    out_dir: &Path,
    website_images: Option<&Path>,
    log_path: &Path,
) -> Result<Tally> {
    let started = Instant::now();
    phase("PHASE 1: Generating Images");
    let results = run_sequential(generator, images, out_dir, Duration::ZERO).await;
    let tally = Tally::of(&results);
    logi(format!("Results: {} ready, {} errors", tally.ready(), tally.errors));

    if let Some(website) = website_images {
        phase("PHASE 2: Optimizing for Web (responsive WebP)");
        for image in images {
            let src = out_dir.join(&image.filename);
            if !file_exists(&src).await {
                continue;
            }
            if let Err(e) = publish_image(&src, website, &image.filename).await {
                logw(format!("Optimization failed for {}: {:#}", image.id, e));
            }
        }
    }

    println!();
    banner(
        "COMPLETE",
        &[
            format!("Generated: {} images | Errors: {}", tally.ready(), tally.errors),
            format!("Output: {}", out_dir.display()),
        ],
    );

    let elapsed = started.elapsed().as_secs_f64();
    write_json_log(log_path, &RunLog::new(generator.model(), results, elapsed)).await?;
    Ok(tally)
}

// ---------------------------------------------------------------------------
// news-images
// ---------------------------------------------------------------------------

pub async fn news_images(cfg: &Config, skip_optimize: bool) -> Result<()> {
    let images = catalog::load(Collection::NewsImages)?;
    let out_dir = cfg.website_images_dir().join("news");
    banner(
        "Generating News Section Images",
        &[
            format!("Model: {}", cfg.replicate_image_model),
            format!("Output: {}", out_dir.display()),
        ],
    );

    let generator = ReplicateGenerator::new(
        replicate(cfg)?,
        cfg.replicate_image_model.clone(),
        ReplicateKind::Image,
    );
    news_images_with(
        &generator,
        &images,
        &out_dir,
        !skip_optimize,
        &cfg.replicate_dir().join("news_generation_log.json"),
    )
    .await?;
    Ok(())
}

pub async fn news_images_with(
    generator: &dyn MediaGenerator,
    images: &[PromptDescriptor],
    out_dir: &Path,
    optimize_images: bool,
    log_path: &Path,
) -> Result<Tally> {
    let started = Instant::now();
    let mut results = Vec::with_capacity(images.len());

    for (i, image) in images.iter().enumerate() {
        println!("\n[{}/{}] {}", i + 1, images.len(), "─".repeat(21));
        let result = generate_one(generator, image, out_dir).await;
        if let (true, Some(file)) = (optimize_images, result.file.as_deref()) {
            logi("Optimizing to WebP...");
            let base = file.with_extension("");
            if let Err(e) = optimize::responsive_image_variants(
                file,
                &base,
                &RESPONSIVE_IMAGES,
                WebpFallback::Stop,
            )
            .await
            {
                logw(format!("Optimization failed for {}: {:#}", image.id, e));
            }
        }
        results.push(result);
    }

    banner("DONE", &[]);
    let tally = Tally::of(&results);
    let elapsed = started.elapsed().as_secs_f64();
    write_json_log(log_path, &RunLog::new(generator.model(), results, elapsed)).await?;
    Ok(tally)
}

// ---------------------------------------------------------------------------
// backfill
// ---------------------------------------------------------------------------

pub async fn backfill(cfg: &Config, skip_optimize: bool) -> Result<()> {
    let images = catalog::load(Collection::BackfillImages)?;
    let videos = catalog::load(Collection::BackfillVideos)?;

    banner(
        "Replicate Asset Generator",
        &[
            format!("Image Model: {}", cfg.replicate_image_model),
            format!("Video Model: {}", cfg.replicate_video_model),
            format!("Missing Images: {}", images.len()),
            format!("Videos: {}", videos.len()),
        ],
    );

    let client = replicate(cfg)?;
    let image_gen = ReplicateGenerator::new(
        client.clone(),
        cfg.replicate_image_model.clone(),
        ReplicateKind::Image,
    );
    let video_gen =
        ReplicateGenerator::new(client, cfg.replicate_video_model.clone(), ReplicateKind::Video);

    let website = (!skip_optimize).then(|| cfg.website_public_dir.clone());
    backfill_with(
        &image_gen,
        &video_gen,
        &images,
        &videos,
        &cfg.replicate_dir(),
        website.as_deref(),
    )
    .await?;
    Ok(())
}

/// Phase 1 images, phase 2 videos, phase 3 optimization of whichever kind produced something new.
pub async fn backfill_with(
    image_gen: &dyn MediaGenerator,
    video_gen: &dyn MediaGenerator,
    images: &[PromptDescriptor],
    videos: &[PromptDescriptor],
    replicate_dir: &Path,
    website_public: Option<&Path>,
) -> Result<(Tally, Tally)> {
    let images_dir = replicate_dir.join("images");
    let videos_dir = replicate_dir.join("videos");

    phase("PHASE 1: Generating Missing Images");
    let image_results = run_sequential(image_gen, images, &images_dir, Duration::ZERO).await;
    let img = Tally::of(&image_results);
    logi(format!("Images: {} generated, {} errors", img.success, img.errors));

    phase("PHASE 2: Generating Videos");
    let video_results = run_sequential(video_gen, videos, &videos_dir, Duration::ZERO).await;
    let vid = Tally::of(&video_results);
    logi(format!("Videos: {} generated, {} errors", vid.success, vid.errors));

    if let Some(public) = website_public {
        phase("PHASE 3: Optimizing for Web (responsive + compressed)");
        if img.success > 0 {
            logi("Optimizing images...");
            if let Err(e) =
                optimize::optimize_image_tree(&images_dir, &public.join("images"), &RESPONSIVE_IMAGES_XL)
                    .await
            {
                logw(format!("Image optimization stopped: {:#}", e));
            }
        }
        if vid.success > 0 {
            logi("Optimizing videos...");
            if let Err(e) = optimize::optimize_video_tree(&videos_dir, &public.join("videos")).await {
                logw(format!("Video optimization stopped: {:#}", e));
            }
        }
    }

    println!();
    banner(
        "COMPLETE",
        &[
            format!(
                "Images: {} generated | Videos: {} generated",
                img.success, vid.success
            ),
            format!("Output: {}", replicate_dir.display()),
        ],
    );

    let log = DualRunLog {
        timestamp: Local::now(),
        image_model: image_gen.model().to_string(),
        video_model: video_gen.model().to_string(),
        image_results,
        video_results,
    };
    write_json_log(&replicate_dir.join("generation_log.json"), &log).await?;
    Ok((img, vid))
}

// ---------------------------------------------------------------------------
// all
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AllOptions {
    pub images_only: bool,
    pub videos_only: bool,
    pub dry_run: bool,
}

pub async fn run_all(cfg: &Config, opts: &AllOptions) -> Result<()> {
    print_summary()?;

    if !opts.videos_only {
        println!("\n{}\n  PHASE 1: Image Generation\n{}\n", rule("="), rule("="));
        let all = catalog::load(Collection::SiteImages)?;
        let ordered = catalog::order_by_category(&all, &IMAGE_PRIORITY);
        run_site_images(cfg, &ordered, opts.dry_run).await?;
    }

    if !opts.images_only {
        println!("\n{}\n  PHASE 2: Video Generation (Async)\n{}\n", rule("="), rule("="));
        let all = catalog::load(Collection::SiteVideos)?;
        run_site_videos(cfg, &all, opts.dry_run).await?;
    }

    if !opts.dry_run {
        println!();
        banner(
            "GENERATION PIPELINE COMPLETE",
            &[
                format!("Images are saved to: {}", cfg.images_dir().display()),
                "Videos are processing asynchronously.".to_string(),
                "Check video status with:".to_string(),
                "  asset-generator videos --poll".to_string(),
                "or".to_string(),
                "  asset-generator status".to_string(),
            ],
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AssetStatus {
    pub total: usize,
    pub missing: Vec<PromptDescriptor>,
}

impl AssetStatus {
    pub fn done(&self) -> usize {
        self.total - self.missing.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    pub images: AssetStatus,
    pub videos: AssetStatus,
    pub pending: PendingMap,
    pub last_image_errors: Option<usize>,
}

impl StatusReport {
    pub fn total(&self) -> usize {
        self.images.total + self.videos.total
    }

    pub fn done(&self) -> usize {
        self.images.done() + self.videos.done()
    }

    pub fn percent(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.done() as f64 / self.total() as f64 * 100.0
    }
}

async fn asset_status(prompts: Vec<PromptDescriptor>, dir: &Path) -> AssetStatus {
    let total = prompts.len();
    let mut missing = Vec::new();
    for p in prompts {
        if !file_exists(&dir.join(&p.filename)).await {
            missing.push(p);
        }
    }
    AssetStatus { total, missing }
}

pub async fn collect_status(cfg: &Config) -> Result<StatusReport> {
    let images = asset_status(catalog::load(Collection::SiteImages)?, &cfg.images_dir()).await;
    let videos = asset_status(catalog::load(Collection::SiteVideos)?, &cfg.videos_dir()).await;
    let pending = PendingStore::new(cfg.pending_operations_path()).load().await?;
    let last_image_errors =
        read_logged_errors(&cfg.output_dir.join("image_generation_log.json")).await;

    Ok(StatusReport {
        images,
        videos,
        pending,
        last_image_errors,
    })
}

fn print_asset_status(label: &str, status: &AssetStatus) {
    println!("\n  {}: {}/{} generated", label, status.done(), status.total);
    if !status.missing.is_empty() {
        println!("     Missing:");
        for p in &status.missing {
            println!("       - {} ({})", p.id, p.purpose);
        }
    }
}

pub fn print_status(report: &StatusReport) {
    println!();
    banner("Asset Generation Status", &[]);

    print_asset_status("Images", &report.images);
    print_asset_status("Videos", &report.videos);

    if !report.pending.is_empty() {
        println!("\n  Pending video operations: {}", report.pending.len());
        for (id, op) in &report.pending {
            println!(
                "       - {} (submitted: {})",
                id,
                op.submitted_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    if let Some(errors) = report.last_image_errors.filter(|n| *n > 0) {
        println!("\n  Last image run had {} error(s)", errors);
    }

    println!(
        "\n  Overall: {}/{} assets ready ({:.0}%)",
        report.done(),
        report.total(),
        report.percent()
    );
    println!("{}\n", rule("="));
}

pub async fn status(cfg: &Config) -> Result<StatusReport> {
    let report = collect_status(cfg).await?;
    print_status(&report);
    Ok(report)
}
