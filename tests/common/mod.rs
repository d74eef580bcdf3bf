#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use asset_generator::api::{GeneratedMedia, MediaGenerator, OperationStatus, VideoOperations};
use asset_generator::catalog::PromptDescriptor;
use asset_generator::error::GenerationError;
use async_trait::async_trait;

pub fn prompt(id: &str, filename: &str) -> PromptDescriptor {
    PromptDescriptor {
        id: id.to_string(),
        filename: filename.to_string(),
        category: "hero".to_string(),
        prompt: format!("a picture of {id}"),
        aspect_ratio: None,
        duration: None,
        purpose: format!("{id} purpose"),
    }
}

/// Remote URL the fakes refuse to download.
pub const BROKEN_URL: &str = "https://cdn.invalid/broken";

async fn fake_download(media: &GeneratedMedia, dest: &Path) -> Result<u64, GenerationError> {
    match media {
        GeneratedMedia::Inline(bytes) => {
            tokio::fs::write(dest, bytes).await?;
            Ok(bytes.len() as u64)
        }
        GeneratedMedia::Remote(url) if url == BROKEN_URL => {
            // Leave a partial file behind, as an interrupted transfer would.
            tokio::fs::write(dest, b"part").await?;
            Err(GenerationError::Http {
                status: 502,
                body: "bad gateway".to_string(),
            })
        }
        GeneratedMedia::Remote(url) => {
            tokio::fs::write(dest, url.as_bytes()).await?;
            Ok(url.len() as u64)
        }
    }
}

#[derive(Debug, Clone)]
pub enum Scripted {
    Media(GeneratedMedia),
    Nothing,
    Fail(String),
}

/// Request/response generator answering from a per-id script; unknown ids get inline bytes.
#[derive(Default)]
pub struct FakeGenerator {
    pub script: HashMap<String, Scripted>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn with(mut self, id: &str, outcome: Scripted) -> Self {
        self.script.insert(id.to_string(), outcome);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaGenerator for FakeGenerator {
    fn model(&self) -> &str {
        "fake-image-model"
    }

    async fn generate(
        &self,
        prompt: &PromptDescriptor,
    ) -> Result<Option<GeneratedMedia>, GenerationError> {
        self.calls.lock().unwrap().push(prompt.id.clone());
        match self.script.get(&prompt.id) {
            Some(Scripted::Media(m)) => Ok(Some(m.clone())),
            Some(Scripted::Nothing) => Ok(None),
            Some(Scripted::Fail(msg)) => Err(GenerationError::Vendor(msg.clone())),
            None => Ok(Some(GeneratedMedia::Inline(b"fake-bytes".to_vec()))),
        }
    }

    async fn download(&self, media: &GeneratedMedia, dest: &Path) -> Result<u64, GenerationError> {
        fake_download(media, dest).await
    }
}

#[derive(Debug, Clone)]
pub enum PollScript {
    Running,
    Done(GeneratedMedia),
    DoneEmpty,
    NotFound,
    Failed(String),
    Transient,
}

/// Long-running video backend. Submissions hand out `operations/<id>`.
#[derive(Default)]
pub struct FakeVideoOps {
    pub rejected: HashMap<String, String>,
    pub polls: HashMap<String, PollScript>,
    pub submitted: Mutex<Vec<String>>,
    pub polled: Mutex<Vec<String>>,
}

impl FakeVideoOps {
    pub fn reject(mut self, id: &str, msg: &str) -> Self {
        self.rejected.insert(id.to_string(), msg.to_string());
        self
    }

    pub fn on_poll(mut self, handle: &str, script: PollScript) -> Self {
        self.polls.insert(handle.to_string(), script);
        self
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn polled(&self) -> Vec<String> {
        self.polled.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoOperations for FakeVideoOps {
    fn model(&self) -> &str {
        "fake-video-model"
    }

    async fn submit(&self, prompt: &PromptDescriptor) -> Result<String, GenerationError> {
        if let Some(msg) = self.rejected.get(&prompt.id) {
            return Err(GenerationError::Http {
                status: 429,
                body: msg.clone(),
            });
        }
        self.submitted.lock().unwrap().push(prompt.id.clone());
        Ok(format!("operations/{}", prompt.id))
    }

    async fn poll(&self, handle: &str) -> Result<OperationStatus, GenerationError> {
        self.polled.lock().unwrap().push(handle.to_string());
        match self.polls.get(handle) {
            Some(PollScript::Running) | None => Ok(OperationStatus::Running),
            Some(PollScript::Done(m)) => Ok(OperationStatus::Done(Some(m.clone()))),
            Some(PollScript::DoneEmpty) => Ok(OperationStatus::Done(None)),
            Some(PollScript::NotFound) => Err(GenerationError::OperationNotFound(handle.to_string())),
            Some(PollScript::Failed(msg)) => Err(GenerationError::OperationFailed(msg.clone())),
            Some(PollScript::Transient) => Err(GenerationError::Http {
                status: 503,
                body: "service unavailable".to_string(),
            }),
        }
    }

    async fn download(&self, media: &GeneratedMedia, dest: &Path) -> Result<u64, GenerationError> {
        fake_download(media, dest).await
    }
}
