//! Pending video operations, persisted as one flat JSON object keyed by asset id.
//!
//! The whole file is rewritten on every change. There is no locking, so two
//! runs touching the same store at once will race.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingOperation {
    pub operation_name: String,
    pub filename: String,
    pub filepath: PathBuf,
    #[serde(default)]
    pub purpose: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub submitted_at: DateTime<Local>,
}

// Older stores carry naive local timestamps without an offset.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(serde::de::Error::custom)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| serde::de::Error::custom(format!("ambiguous local time {raw}")))
}

impl PendingOperation {
    pub fn age_minutes(&self, now: DateTime<Local>) -> i64 {
        (now - self.submitted_at).num_minutes().max(0)
    }
}

pub type PendingMap = BTreeMap<String, PendingOperation>;

#[derive(Debug, Clone)]
pub struct PendingStore {
    path: PathBuf,
}

impl PendingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<PendingMap> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PendingMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };
        if text.trim().is_empty() {
            return Ok(PendingMap::new());
        }
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    pub async fn save(&self, operations: &PendingMap) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
        }

        let body = serde_json::to_string_pretty(operations)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    pub async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.load().await?.contains_key(id))
    }

    pub async fn insert(&self, id: &str, operation: PendingOperation) -> Result<()> {
        let mut operations = self.load().await?;
        operations.insert(id.to_string(), operation);
        self.save(&operations).await
    }

    pub async fn remove(&self, ids: &[String]) -> Result<PendingMap> {
        let mut operations = self.load().await?;
        for id in ids {
            operations.remove(id);
        }
        self.save(&operations).await?;
        Ok(operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(name: &str) -> PendingOperation {
        PendingOperation {
            operation_name: format!("models/veo/operations/{name}"),
            filename: format!("hero/{name}.mp4"),
            filepath: PathBuf::from(format!("output/videos/hero/{name}.mp4")),
            purpose: "test".into(),
            submitted_at: Local::now(),
        }
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::new(dir.path().join("nested/pending.json"));
        assert!(store.load().await.unwrap().is_empty());
        assert!(!store.contains("anything").await.unwrap());
    }

    #[tokio::test]
    async fn insert_and_remove_rewrite_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::new(dir.path().join("out/pending.json"));

        store.insert("a", record("a")).await.unwrap();
        store.insert("b", record("b")).await.unwrap();
        assert!(store.contains("a").await.unwrap());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["a"]["operation_name"], "models/veo/operations/a");
        assert!(value["b"]["submitted_at"].is_string());

        let left = store.remove(&["a".to_string(), "zzz".to_string()]).await.unwrap();
        assert_eq!(left.keys().collect::<Vec<_>>(), vec!["b"]);
        assert!(!dir.path().join("out/pending.json.tmp").exists());
    }

    #[test]
    fn naive_timestamps_are_read_as_local_time() {
        let raw = r#"{
            "video_hero_main": {
                "operation_name": "models/veo-2.0-generate-001/operations/abc",
                "filename": "hero/hero_main_loop.mp4",
                "filepath": "output/videos/hero/hero_main_loop.mp4",
                "purpose": "Homepage hero",
                "submitted_at": "2025-02-01T09:30:15.123456"
            }
        }"#;
        let map: PendingMap = serde_json::from_str(raw).unwrap();
        let op = &map["video_hero_main"];
        assert_eq!(
            op.submitted_at.naive_local().to_string(),
            "2025-02-01 09:30:15.123456"
        );
    }

    #[test]
    fn age_counts_whole_minutes_across_days() {
        let mut op = record("x");
        let now = Local::now();
        op.submitted_at = now - Duration::hours(25) - Duration::minutes(3);
        assert_eq!(op.age_minutes(now), 25 * 60 + 3);
    }
}
