//! `asset-generator`: generates the website's images and videos with vendor
//! AI APIs and prepares web-ready variants.
//!
//! # Environment variables
//!
//! | Variable                | Required            | Default                        |
//! |-------------------------|---------------------|--------------------------------|
//! | `GOOGLE_API_KEY`        | images, videos, all | --                             |
//! | `REPLICATE_API_TOKEN`   | replicate flows     | --                             |
//! | `IMAGE_MODEL`           | no                  | `imagen-3.0-generate-002`      |
//! | `VIDEO_MODEL`           | no                  | `veo-2.0-generate-001`         |
//! | `REPLICATE_IMAGE_MODEL` | no                  | `black-forest-labs/flux-2-pro` |
//! | `REPLICATE_VIDEO_MODEL` | no                  | `google/veo-3-fast`            |
//! | `ASSET_OUTPUT_DIR`      | no                  | `output`                       |
//! | `WEBSITE_PUBLIC_DIR`    | no                  | `../website/public`            |

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asset_generator::config::Config;
use asset_generator::init;
use asset_generator::pipelines::{
    self, AllOptions, HeroOptions, ImageOptions, MediaOptions, VideoOptions,
};

#[derive(Parser)]
#[command(name = "asset-generator", version, about = "Generate website images and videos")]
struct Cli {
    /// Output root; overrides ASSET_OUTPUT_DIR.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Filter {
    /// Only prompts in this category.
    #[arg(long)]
    category: Option<String>,

    /// Only the prompt with this id.
    #[arg(long)]
    id: Option<String>,

    /// Print the prompts without calling any API.
    #[arg(long)]
    dry_run: bool,

    /// List every prompt id and exit.
    #[arg(long)]
    list: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Site images with Imagen.
    Images(Filter),

    /// Site videos with Veo: submit, or poll pending operations.
    Videos {
        #[command(flatten)]
        filter: Filter,

        /// Check pending operations and download finished videos.
        #[arg(long)]
        poll: bool,

        /// With --poll, keep polling until nothing is pending.
        #[arg(long, requires = "poll")]
        watch: bool,
    },

    /// Hero background clips through Replicate.
    HeroVideos {
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        dry_run: bool,

        /// Skip the ffmpeg web encodes.
        #[arg(long)]
        skip_optimize: bool,
    },

    /// Blog and gallery images through Replicate.
    MediaImages {
        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        skip_optimize: bool,
    },

    /// News card images through Replicate, written into the website.
    NewsImages {
        #[arg(long)]
        skip_optimize: bool,
    },

    /// Missing images and extra videos through Replicate.
    Backfill {
        #[arg(long)]
        skip_optimize: bool,
    },

    /// Images in priority order, then video submission.
    All {
        /// Images only.
        #[arg(long, conflicts_with = "videos")]
        images: bool,

        /// Videos only.
        #[arg(long)]
        videos: bool,

        #[arg(long)]
        dry_run: bool,
    },

    /// What exists, what is missing, what is still pending.
    Status,
}

impl From<Filter> for ImageOptions {
    fn from(f: Filter) -> Self {
        Self {
            category: f.category,
            id: f.id,
            dry_run: f.dry_run,
            list: f.list,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asset_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let cfg = Config::from_env().with_output_dir(cli.output_dir);

    init::ensure_directories(&cfg).await?;

    match cli.command {
        Command::Images(filter) => pipelines::site_images(&cfg, &filter.into()).await,
        Command::Videos {
            filter,
            poll,
            watch,
        } => {
            let opts = VideoOptions {
                category: filter.category,
                id: filter.id,
                dry_run: filter.dry_run,
                list: filter.list,
                poll,
                watch,
            };
            pipelines::site_videos(&cfg, &opts).await
        }
        Command::HeroVideos {
            id,
            dry_run,
            skip_optimize,
        } => {
            if !skip_optimize {
                init::check_tools().await;
            }
            let opts = HeroOptions {
                id,
                dry_run,
                skip_optimize,
            };
            pipelines::hero_videos(&cfg, &opts).await
        }
        Command::MediaImages {
            dry_run,
            skip_optimize,
        } => {
            if !skip_optimize {
                init::check_tools().await;
            }
            let opts = MediaOptions {
                dry_run,
                skip_optimize,
            };
            pipelines::media_images(&cfg, &opts).await
        }
        Command::NewsImages { skip_optimize } => {
            if !skip_optimize {
                init::check_tools().await;
            }
            pipelines::news_images(&cfg, skip_optimize).await
        }
        Command::Backfill { skip_optimize } => {
            if !skip_optimize {
                init::check_tools().await;
            }
            pipelines::backfill(&cfg, skip_optimize).await
        }
        Command::All {
            images,
            videos,
            dry_run,
        } => {
            let opts = AllOptions {
                images_only: images,
                videos_only: videos,
                dry_run,
            };
            pipelines::run_all(&cfg, &opts).await
        }
        Command::Status => pipelines::status(&cfg).await.map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn watch_requires_poll() {
        assert!(Cli::try_parse_from(["asset-generator", "videos", "--watch"]).is_err());
        assert!(Cli::try_parse_from(["asset-generator", "videos", "--poll", "--watch"]).is_ok());
    }

    #[test]
    fn output_dir_is_global() {
        let cli = Cli::try_parse_from(["asset-generator", "status", "--output-dir", "/tmp/x"])
            .unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/x")));
    }
}
