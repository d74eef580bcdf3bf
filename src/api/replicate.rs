use super::{GeneratedMedia, MediaGenerator};
use crate::catalog::PromptDescriptor;
use crate::error::GenerationError;
use crate::logi;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use std::time::{Duration, Instant};

pub const REPLICATE_BASE_URL: &str = "https://api.replicate.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const PREDICTION_POLL_INTERVAL: Duration = Duration::from_secs(2);
const PREDICTION_MAX_WAIT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub error: Value,
    #[serde(default)]
    pub urls: PredictionUrls,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
}

impl Prediction {
    fn is_running(&self) -> bool {
        matches!(self.status.as_str(), "starting" | "processing")
    }
}

/// Output URLs from a finished prediction; models return a string, a list, or nothing.
pub(crate) fn output_urls(output: &Value) -> Vec<String> {
    match output {
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Clone)]
pub struct ReplicateClient {
    http: Client,
    token: String,
    base_url: String,
    poll_interval: Duration,
}

impl ReplicateClient {
    pub fn new(http: Client, token: impl Into<String>) -> Self {
        Self {
            http,
            token: token.into(),
            base_url: REPLICATE_BASE_URL.to_string(),
            poll_interval: PREDICTION_POLL_INTERVAL,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn read_prediction(resp: reqwest::Response) -> Result<Prediction, GenerationError> {
        if !resp.status().is_success() {
            return Err(super::http_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// Runs `model` to completion and returns its output URLs (possibly empty).
    pub async fn run(&self, model: &str, input: Value) -> Result<Vec<String>, GenerationError> {
        let resp = self
            .http
            .post(format!("{}/models/{}/predictions", self.base_url, model))
            .bearer_auth(&self.token)
            .header("Prefer", "wait")
            .json(&json!({ "input": input }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let mut prediction = Self::read_prediction(resp).await?;

        let started = Instant::now();
        while prediction.is_running() {
            if started.elapsed() > PREDICTION_MAX_WAIT {
                return Err(GenerationError::Timeout(prediction.id));
            }
            let Some(url) = prediction.urls.get.clone() else {
                return Err(GenerationError::Vendor(format!(
                    "prediction {} is {} but has no polling URL",
                    prediction.id, prediction.status
                )));
            };
            tokio::time::sleep(self.poll_interval).await;
            let resp = self
                .http
                .get(url)
                .bearer_auth(&self.token)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await?;
            prediction = Self::read_prediction(resp).await?;
        }

        if prediction.status != "succeeded" {
            let detail = match &prediction.error {
                Value::Null => "no error detail".to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(GenerationError::PredictionFailed {
                id: prediction.id,
                status: prediction.status,
                detail,
            });
        }

        logi(format!(
            "Prediction {} succeeded in {:.0}s",
            prediction.id,
            started.elapsed().as_secs_f64()
        ));
        Ok(output_urls(&prediction.output))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicateKind {
    /// FLUX-style still image, JPEG out.
    Image,
    /// Veo-style clip at 720p.
    Video,
}

pub(crate) fn replicate_input(kind: ReplicateKind, prompt: &PromptDescriptor) -> Value {
    match kind {
        ReplicateKind::Image => json!({
            "prompt": prompt.prompt,
            "aspect_ratio": prompt.aspect_ratio(),
            "output_format": "jpg",
            "output_quality": 95,
            "safety_tolerance": 2,
            "steps": 30,
        }),
        ReplicateKind::Video => json!({
            "prompt": prompt.prompt,
            "duration": prompt.duration(),
            "aspect_ratio": "16:9",
            "resolution": "720p",
        }),
    }
}

pub struct ReplicateGenerator {
    client: ReplicateClient,
    model: String,
    kind: ReplicateKind,
}

impl ReplicateGenerator {
    pub fn new(client: ReplicateClient, model: impl Into<String>, kind: ReplicateKind) -> Self {
        Self {
            client,
            model: model.into(),
            kind,
        }
    }
}

#[async_trait]
impl MediaGenerator for ReplicateGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &PromptDescriptor,
    ) -> Result<Option<GeneratedMedia>, GenerationError> {
        let urls = self
            .client
            .run(&self.model, replicate_input(self.kind, prompt))
            .await?;
        Ok(urls.into_iter().next().map(GeneratedMedia::Remote))
    }

    async fn download(&self, media: &GeneratedMedia, dest: &Path) -> Result<u64, GenerationError> {
        super::save_media(&self.client.http, media, dest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_shapes() {
        assert_eq!(output_urls(&json!("https://r/a.jpg")), vec!["https://r/a.jpg"]);
        assert_eq!(
            output_urls(&json!(["https://r/a.mp4", 3, "https://r/b.mp4"])),
            vec!["https://r/a.mp4", "https://r/b.mp4"]
        );
        assert!(output_urls(&Value::Null).is_empty());
        assert!(output_urls(&json!("")).is_empty());
    }

    #[test]
    fn prediction_parses_with_missing_fields() {
        let p: Prediction = serde_json::from_value(json!({
            "id": "abc",
            "status": "processing",
            "urls": {"get": "https://api.replicate.com/v1/predictions/abc"}
        }))
        .unwrap();
        assert!(p.is_running());
        assert!(p.output.is_null());
        assert_eq!(p.urls.get.as_deref(), Some("https://api.replicate.com/v1/predictions/abc"));
    }

    #[test]
    fn inputs_follow_kind() {
        let prompt = PromptDescriptor {
            id: "hero".into(),
            filename: "hero.mp4".into(),
            category: "hero".into(),
            prompt: "dolly shot".into(),
            aspect_ratio: Some("3:4".into()),
            duration: Some(4),
            purpose: String::new(),
        };
        let image = replicate_input(ReplicateKind::Image, &prompt);
        assert_eq!(image["aspect_ratio"], "3:4");
        assert_eq!(image["output_format"], "jpg");
        assert!(image.get("duration").is_none());

        let video = replicate_input(ReplicateKind::Video, &prompt);
        assert_eq!(video["duration"], 4);
        assert_eq!(video["aspect_ratio"], "16:9");
        assert_eq!(video["resolution"], "720p");
    }
}
