//! Vendor clients and the traits the workflows drive them through.

pub mod gemini;
pub mod replicate;

use crate::catalog::PromptDescriptor;
use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// What a vendor hands back for a finished asset.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedMedia {
    Inline(Vec<u8>),
    Remote(String),
}

/// Request/response text-to-image or text-to-video.
#[async_trait]
pub trait MediaGenerator: Send + Sync {
    fn model(&self) -> &str;

    /// `Ok(None)` means the vendor answered but produced nothing (filtered, empty output).
    async fn generate(&self, prompt: &PromptDescriptor)
    -> Result<Option<GeneratedMedia>, GenerationError>;

    /// Saves the media to `dest` and returns the number of bytes written.
    async fn download(&self, media: &GeneratedMedia, dest: &Path) -> Result<u64, GenerationError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    Running,
    Done(Option<GeneratedMedia>),
}

/// Long-running text-to-video: submit now, poll later.
#[async_trait]
pub trait VideoOperations: Send + Sync {
    fn model(&self) -> &str;

    /// Returns the vendor's opaque operation handle.
    async fn submit(&self, prompt: &PromptDescriptor) -> Result<String, GenerationError>;

    async fn poll(&self, handle: &str) -> Result<OperationStatus, GenerationError>;

    async fn download(&self, media: &GeneratedMedia, dest: &Path) -> Result<u64, GenerationError>;
}

pub fn http_client() -> Result<Client, GenerationError> {
    Ok(Client::builder()
        .user_agent(concat!("asset-generator/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(30))
        .build()?)
}

pub(crate) async fn write_bytes(dest: &Path, bytes: &[u8]) -> Result<u64, GenerationError> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(dest, bytes).await?;
    Ok(fs::metadata(dest).await?.len())
}

/// Writes inline bytes, or fetches a remote URL with `client`.
pub(crate) async fn save_media(
    client: &Client,
    media: &GeneratedMedia,
    dest: &Path,
) -> Result<u64, GenerationError> {
    match media {
        GeneratedMedia::Inline(bytes) => write_bytes(dest, bytes).await,
        GeneratedMedia::Remote(url) => {
            let resp = client.get(url).timeout(DOWNLOAD_TIMEOUT).send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(GenerationError::Http {
                    status: status.as_u16(),
                    body: crate::snippet(&body, 200),
                });
            }
            let bytes = resp.bytes().await?;
            write_bytes(dest, &bytes).await
        }
    }
}

/// Reads an error body into a `GenerationError::Http`.
pub(crate) async fn http_error(resp: reqwest::Response) -> GenerationError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    GenerationError::Http {
        status,
        body: crate::snippet(&body, 800),
    }
}
