//! Classifier wrapper: provider abstraction over one pre-loaded
//! text-classification model.
//!
//! The model is consumed strictly as a black box: text in, `(label, score)`
//! out. The remote provider talks to an inference endpoint over HTTP with a
//! bounded timeout and no retries. An inference failure propagates as an
//! error ("could not classify"), never as a clean negative.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Binary semantic mapped from the raw model label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Ham,
    Spam,
    /// Unknown raw labels pass through uppercased.
    Other(String),
}

impl Label {
    /// Fixed mapping table; unknown labels pass through uppercased.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "LABEL_0" | "HAM" | "ham" => Label::Ham,
            "LABEL_1" | "SPAM" | "spam" => Label::Spam,
            other => Label::Other(other.to_uppercase()),
        }
    }
}

/// One inference result: mapped label plus confidence in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Label,
    pub score: f32,
}

/// Seam between the detector and the model. Implementations must be cheap to
/// share; the pipeline holds one instance for the process lifetime.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification>;
    fn model_name(&self) -> &str;
}

/// HTTP inference provider. One reqwest client, connect/read timeouts, no
/// retries; a hung call stalls only the message being analyzed.
pub struct RemoteClassifier {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
    model: String,
}

#[derive(Deserialize)]
struct RawScore {
    label: String,
    score: f32,
}

impl RemoteClassifier {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("scam-sentinel/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.inference_timeout_secs))
            .build()
            .context("building inference HTTP client")?;

        Ok(Self {
            http,
            url: format!("{}/{}", cfg.inference_url.trim_end_matches('/'), cfg.model),
            token: cfg.inference_token.clone(),
            model: cfg.model.clone(),
        })
    }

    /// One-off inference at startup. Model load failure is fatal: callers
    /// abort the process instead of running without a classifier.
    pub async fn warmup(&self) -> Result<()> {
        let c = self
            .classify("warmup")
            .await
            .with_context(|| format!("model '{}' failed to load", self.model))?;
        tracing::info!(model = %self.model, label = ?c.label, "classifier warmed up");
        Ok(())
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        let mut req = self
            .http
            .post(&self.url)
            .json(&serde_json::json!({ "inputs": text }));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.context("inference request failed")?;
        if !resp.status().is_success() {
            bail!("inference endpoint returned {}", resp.status());
        }

        // Response shape: one list of {label, score} per input.
        let body: Vec<Vec<RawScore>> = resp.json().await.context("invalid inference response")?;
        let top = body
            .first()
            .and_then(|scores| {
                scores
                    .iter()
                    .max_by(|a, b| a.score.total_cmp(&b.score))
            })
            .context("empty inference response")?;

        Ok(Classification {
            label: Label::from_raw(&top.label),
            score: top.score.clamp(0.0, 1.0),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Deterministic classifier for tests and local runs: a fixed fallback plus
/// optional per-text scripted answers.
pub struct MockClassifier {
    fixed: Classification,
    scripted: Mutex<HashMap<String, Classification>>,
    fail: bool,
}

impl MockClassifier {
    pub fn new(label: Label, score: f32) -> Self {
        Self {
            fixed: Classification { label, score },
            scripted: Mutex::new(HashMap::new()),
            fail: false,
        }
    }

    /// Always errors; drives the "could not classify" path in tests.
    pub fn failing() -> Self {
        Self {
            fixed: Classification { label: Label::Ham, score: 0.0 },
            scripted: Mutex::new(HashMap::new()),
            fail: true,
        }
    }

    /// Answer `response` whenever the (normalized) input equals `text`.
    pub fn script(self, text: &str, label: Label, score: f32) -> Self {
        self.scripted
            .lock()
            .expect("mock classifier mutex poisoned")
            .insert(text.to_string(), Classification { label, score });
        self
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        if self.fail {
            bail!("mock inference failure");
        }
        let scripted = self
            .scripted
            .lock()
            .expect("mock classifier mutex poisoned");
        Ok(scripted.get(text).cloned().unwrap_or_else(|| self.fixed.clone()))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_mapping_table() {
        assert_eq!(Label::from_raw("LABEL_0"), Label::Ham);
        assert_eq!(Label::from_raw("LABEL_1"), Label::Spam);
        assert_eq!(Label::from_raw("SPAM"), Label::Spam);
        assert_eq!(
            Label::from_raw("toxic"),
            Label::Other("TOXIC".to_string())
        );
    }

    #[tokio::test]
    async fn mock_returns_scripted_answer_then_fallback() {
        let mock = MockClassifier::new(Label::Ham, 0.99).script("free nitro", Label::Spam, 0.92);
        let spam = mock.classify("free nitro").await.unwrap();
        assert_eq!(spam.label, Label::Spam);
        let ham = mock.classify("good morning").await.unwrap();
        assert_eq!(ham.label, Label::Ham);
    }

    #[tokio::test]
    async fn failing_mock_propagates_error() {
        let mock = MockClassifier::failing();
        assert!(mock.classify("anything").await.is_err());
    }
}
