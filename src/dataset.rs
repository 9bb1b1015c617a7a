//! Append-only dataset sink for flagged messages.
//!
//! Records feed offline retraining. The sink is write-only from the
//! pipeline's point of view: a false-alarm reversal never rewrites history
//! here. The read side exists for reporting only and never drives pipeline
//! decisions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::events::{ChannelId, UserId};

/// One flagged-message record, as appended to the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedSample {
    pub content: String,
    pub author_id: UserId,
    pub author_name: String,
    pub channel_id: ChannelId,
    pub confidence: f32,
    pub reason: String,
    pub ruleset_version: u32,
    pub joined_at: Option<DateTime<Utc>>,
    pub detected_at: DateTime<Utc>,
}

/// Read-side summary for reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetStats {
    pub exists: bool,
    pub total_messages: u64,
    pub file_size_bytes: u64,
    /// Record counts keyed by detection method.
    pub by_method: BTreeMap<String, u64>,
}

#[async_trait]
pub trait DatasetSink: Send + Sync {
    async fn append(&self, sample: &FlaggedSample) -> Result<()>;
    async fn stats(&self) -> Result<DatasetStats>;
}

/// JSON-lines sink: one record per line, append-only.
pub struct JsonlDataset {
    path: PathBuf,
}

impl JsonlDataset {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl DatasetSink for JsonlDataset {
    async fn append(&self, sample: &FlaggedSample) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .context("creating dataset directory")?;
        }

        let mut line = serde_json::to_string(sample).context("serializing dataset record")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening dataset file {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .context("appending dataset record")?;
        Ok(())
    }

    async fn stats(&self) -> Result<DatasetStats> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(m) => m,
            Err(_) => return Ok(DatasetStats::default()),
        };

        let body = tokio::fs::read_to_string(&self.path)
            .await
            .context("reading dataset file")?;

        let mut by_method: BTreeMap<String, u64> = BTreeMap::new();
        let mut total = 0u64;
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            total += 1;
            if let Ok(sample) = serde_json::from_str::<FlaggedSample>(line) {
                *by_method.entry(sample.reason).or_insert(0) += 1;
            }
        }

        Ok(DatasetStats {
            exists: true,
            total_messages: total,
            file_size_bytes: meta.len(),
            by_method,
        })
    }
}

/// In-memory sink for tests.
#[derive(Default)]
pub struct MemoryDataset {
    samples: Mutex<Vec<FlaggedSample>>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<FlaggedSample> {
        self.samples.lock().expect("dataset mutex poisoned").clone()
    }
}

#[async_trait]
impl DatasetSink for MemoryDataset {
    async fn append(&self, sample: &FlaggedSample) -> Result<()> {
        self.samples
            .lock()
            .expect("dataset mutex poisoned")
            .push(sample.clone());
        Ok(())
    }

    async fn stats(&self) -> Result<DatasetStats> {
        let samples = self.samples();
        let mut by_method: BTreeMap<String, u64> = BTreeMap::new();
        for s in &samples {
            *by_method.entry(s.reason.clone()).or_insert(0) += 1;
        }
        Ok(DatasetStats {
            exists: true,
            total_messages: samples.len() as u64,
            file_size_bytes: 0,
            by_method,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(reason: &str) -> FlaggedSample {
        FlaggedSample {
            content: "free nitro, dm me".to_string(),
            author_id: 42,
            author_name: "scammer".to_string(),
            channel_id: 7,
            confidence: 0.92,
            reason: reason.to_string(),
            ruleset_version: crate::patterns::RULESET_VERSION,
            joined_at: None,
            detected_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn jsonl_append_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlDataset::new(dir.path().join("flagged.jsonl"));

        sink.append(&sample("ML Detection")).await.unwrap();
        sink.append(&sample("ML Detection")).await.unwrap();
        sink.append(&sample("Pattern Detection")).await.unwrap();

        let stats = sink.stats().await.unwrap();
        assert!(stats.exists);
        assert_eq!(stats.total_messages, 3);
        assert!(stats.file_size_bytes > 0);
        assert_eq!(stats.by_method.get("ML Detection"), Some(&2));
        assert_eq!(stats.by_method.get("Pattern Detection"), Some(&1));
    }

    #[tokio::test]
    async fn missing_file_reports_not_existing() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlDataset::new(dir.path().join("nope.jsonl"));
        let stats = sink.stats().await.unwrap();
        assert!(!stats.exists);
        assert_eq!(stats.total_messages, 0);
    }
}
