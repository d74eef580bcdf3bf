use super::{GeneratedMedia, MediaGenerator, OperationStatus, VideoOperations};
use crate::catalog::PromptDescriptor;
use crate::error::GenerationError;
use crate::logw;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const VEO_DURATIONS: [u32; 3] = [5, 6, 8];
const VEO_RESOLUTION: &str = "1080p";
const VEO_ASPECT_RATIO: &str = "16:9";

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(http: Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, GenerationError> {
        let resp = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(super::http_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn get_json(&self, path: &str) -> Result<Value, GenerationError> {
        let resp = self
            .http
            .get(format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .header("x-goog-api-key", &self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GenerationError::OperationNotFound(path.to_string()));
        }
        if !resp.status().is_success() {
            return Err(super::http_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// Generated file URIs need the key as a query parameter.
    fn authenticated_uri(&self, uri: &str) -> String {
        let separator = if uri.contains('?') { '&' } else { '?' };
        format!("{}{}key={}", uri, separator, self.api_key)
    }

    async fn save(&self, media: &GeneratedMedia, dest: &Path) -> Result<u64, GenerationError> {
        match media {
            GeneratedMedia::Remote(uri) => {
                let signed = GeneratedMedia::Remote(self.authenticated_uri(uri));
                super::save_media(&self.http, &signed, dest).await
            }
            inline => super::save_media(&self.http, inline, dest).await,
        }
    }
}

/// Imagen text-to-image through the `:predict` endpoint.
pub struct ImagenGenerator {
    client: GeminiClient,
    model: String,
}

impl ImagenGenerator {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

pub(crate) fn imagen_request(prompt: &PromptDescriptor) -> Value {
    json!({
        "instances": [{"prompt": prompt.prompt}],
        "parameters": {
            "sampleCount": 1,
            "aspectRatio": prompt.aspect_ratio(),
            "safetyFilterLevel": "block_low_and_above",
            "personGeneration": "allow_adult",
            "outputOptions": {"mimeType": "image/png"},
        },
    })
}

/// First prediction's bytes, or `None` with the filter reason when nothing came back.
pub(crate) fn parse_imagen_response(
    root: &Value,
) -> Result<(Option<Vec<u8>>, Option<String>), GenerationError> {
    let predictions = root.get("predictions").and_then(Value::as_array);
    let Some(predictions) = predictions else {
        return Ok((None, filter_reason(root)));
    };

    for p in predictions {
        if let Some(b64) = p.get("bytesBase64Encoded").and_then(Value::as_str) {
            return Ok((Some(STANDARD.decode(b64)?), None));
        }
    }

    let reason = predictions
        .iter()
        .find_map(filter_reason)
        .or_else(|| filter_reason(root));
    Ok((None, reason))
}

fn filter_reason(v: &Value) -> Option<String> {
    v.get("raiFilteredReason")
        .or_else(|| v.get("filteredReason"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl MediaGenerator for ImagenGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &PromptDescriptor,
    ) -> Result<Option<GeneratedMedia>, GenerationError> {
        let path = format!("models/{}:predict", self.model);
        let root = self.client.post_json(&path, &imagen_request(prompt)).await?;
        let (bytes, reason) = parse_imagen_response(&root)?;
        if let Some(reason) = reason {
            logw(format!("Reason: {}", reason));
        }
        Ok(bytes.map(GeneratedMedia::Inline))
    }

    async fn download(&self, media: &GeneratedMedia, dest: &Path) -> Result<u64, GenerationError> {
        self.client.save(media, dest).await
    }
}

/// Veo text-to-video through long-running operations.
pub struct VeoOperations {
    client: GeminiClient,
    model: String,
}

impl VeoOperations {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

/// Veo only accepts a few clip lengths; anything else falls back to 8 s.
pub fn normalize_veo_duration(requested: u32) -> u32 {
    if VEO_DURATIONS.contains(&requested) {
        requested
    } else {
        8
    }
}

pub(crate) fn veo_request(prompt: &PromptDescriptor) -> Value {
    json!({
        "instances": [{"prompt": prompt.prompt}],
        "parameters": {
            "sampleCount": 1,
            "durationSeconds": normalize_veo_duration(prompt.duration()),
            "aspectRatio": VEO_ASPECT_RATIO,
            "resolution": VEO_RESOLUTION,
        },
    })
}

pub(crate) fn parse_operation(root: &Value) -> Result<OperationStatus, GenerationError> {
    if let Some(err) = root.get("error") {
        let code = err.get("code").and_then(Value::as_i64).unwrap_or(0);
        let status = err.get("status").and_then(Value::as_str).unwrap_or("");
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("operation failed")
            .to_string();
        if code == 404 || status == "NOT_FOUND" {
            return Err(GenerationError::OperationNotFound(message));
        }
        if root.get("done").and_then(Value::as_bool).unwrap_or(false) {
            return Err(GenerationError::OperationFailed(message));
        }
        return Err(GenerationError::Vendor(message));
    }

    if !root.get("done").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(OperationStatus::Running);
    }

    let response = root.get("response");
    let samples = response
        .and_then(|r| r.get("generateVideoResponse"))
        .and_then(|r| r.get("generatedSamples"))
        .or_else(|| response.and_then(|r| r.get("generatedVideos")))
        .and_then(Value::as_array);

    let video = samples
        .and_then(|s| s.first())
        .and_then(|s| s.get("video"));
    let Some(video) = video else {
        return Ok(OperationStatus::Done(None));
    };

    if let Some(b64) = video
        .get("bytesBase64Encoded")
        .or_else(|| video.get("videoBytes"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return Ok(OperationStatus::Done(Some(GeneratedMedia::Inline(
            STANDARD.decode(b64)?,
        ))));
    }

    if let Some(uri) = video
        .get("uri")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return Ok(OperationStatus::Done(Some(GeneratedMedia::Remote(
            uri.to_string(),
        ))));
    }

    Ok(OperationStatus::Done(None))
}

#[async_trait]
impl VideoOperations for VeoOperations {
    fn model(&self) -> &str {
        &self.model
    }

    async fn submit(&self, prompt: &PromptDescriptor) -> Result<String, GenerationError> {
        let path = format!("models/{}:predictLongRunning", self.model);
        let root = self.client.post_json(&path, &veo_request(prompt)).await?;
        root.get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GenerationError::Vendor("submit response carried no operation name".into()))
    }

    async fn poll(&self, handle: &str) -> Result<OperationStatus, GenerationError> {
        let root = self.client.get_json(handle).await?;
        parse_operation(&root)
    }

    async fn download(&self, media: &GeneratedMedia, dest: &Path) -> Result<u64, GenerationError> {
        self.client.save(media, dest).await
    }
}
