use crate::error::ConfigError;
use std::path::PathBuf;

const PLACEHOLDER_KEY: &str = "PASTE_YOUR_KEY_HERE";

const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";
const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";
const DEFAULT_REPLICATE_IMAGE_MODEL: &str = "black-forest-labs/flux-2-pro";
const DEFAULT_REPLICATE_VIDEO_MODEL: &str = "google/veo-3-fast";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_WEBSITE_PUBLIC_DIR: &str = "../website/public";

#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: Option<String>,
    pub replicate_api_token: Option<String>,
    pub image_model: String,
    pub video_model: String,
    pub replicate_image_model: String,
    pub replicate_video_model: String,
    pub output_dir: PathBuf,
    pub website_public_dir: PathBuf,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        Self {
            google_api_key: get("GOOGLE_API_KEY"),
            replicate_api_token: get("REPLICATE_API_TOKEN"),
            image_model: or("IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
            video_model: or("VIDEO_MODEL", DEFAULT_VIDEO_MODEL),
            replicate_image_model: or("REPLICATE_IMAGE_MODEL", DEFAULT_REPLICATE_IMAGE_MODEL),
            replicate_video_model: or("REPLICATE_VIDEO_MODEL", DEFAULT_REPLICATE_VIDEO_MODEL),
            output_dir: PathBuf::from(or("ASSET_OUTPUT_DIR", DEFAULT_OUTPUT_DIR)),
            website_public_dir: PathBuf::from(or("WEBSITE_PUBLIC_DIR", DEFAULT_WEBSITE_PUBLIC_DIR)),
        }
    }

    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.output_dir = dir;
        }
        self
    }

    pub fn google_key(&self) -> Result<&str, ConfigError> {
        require("GOOGLE_API_KEY", self.google_api_key.as_deref())
    }

    pub fn replicate_token(&self) -> Result<&str, ConfigError> {
        require("REPLICATE_API_TOKEN", self.replicate_api_token.as_deref())
    }

    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join("images")
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.output_dir.join("videos")
    }

    pub fn replicate_dir(&self) -> PathBuf {
        self.output_dir.join("replicate")
    }

    pub fn pending_operations_path(&self) -> PathBuf {
        self.output_dir.join("pending_video_operations.json")
    }

    pub fn website_images_dir(&self) -> PathBuf {
        self.website_public_dir.join("images")
    }

    pub fn website_videos_dir(&self) -> PathBuf {
        self.website_public_dir.join("videos")
    }
}

fn require<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, ConfigError> {
    match value {
        None => Err(ConfigError::MissingKey(name)),
        Some(PLACEHOLDER_KEY) => Err(ConfigError::PlaceholderKey(name)),
        Some(v) => Ok(v),
    }
}
