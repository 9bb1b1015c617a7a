//! Verdict fusion: one decision from the classifier and the pattern rules.
//!
//! Policy (single, fixed): a SPAM label with score strictly above the
//! threshold wins as ML detection, regardless of pattern evidence; otherwise
//! any pattern match alone flags the message. The reported confidence is
//! always the raw classifier score, even for pattern-only detections.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, Label};
use crate::normalize;
use crate::patterns;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionReason {
    /// Clean verdict; renders as an empty string.
    None,
    /// Empty or whitespace-only input; detection was skipped.
    Empty,
    MlDetection,
    PatternDetection,
}

impl DetectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionReason::None => "",
            DetectionReason::Empty => "empty",
            DetectionReason::MlDetection => "ML Detection",
            DetectionReason::PatternDetection => "Pattern Detection",
        }
    }
}

impl std::fmt::Display for DetectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The detector's output for one message. Immutable, consumed synchronously.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub is_scam: bool,
    pub confidence: f32,
    pub reason: DetectionReason,
    /// First matched rule ids, for diagnostics (at most 3).
    pub matched_rules: Vec<&'static str>,
}

impl Verdict {
    fn empty() -> Self {
        Self {
            is_scam: false,
            confidence: 0.0,
            reason: DetectionReason::Empty,
            matched_rules: Vec::new(),
        }
    }
}

pub struct ScamDetector {
    classifier: Arc<dyn Classifier>,
    threshold: f32,
}

impl ScamDetector {
    pub fn new(classifier: Arc<dyn Classifier>, threshold: f32) -> Self {
        Self {
            classifier,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn model_name(&self) -> &str {
        self.classifier.model_name()
    }

    /// Classify one message. `Err` means "could not classify" and is distinct
    /// from a clean negative verdict.
    pub async fn detect(&self, text: &str) -> Result<Verdict> {
        if text.trim().is_empty() {
            return Ok(Verdict::empty());
        }

        let normalized = normalize::normalize(text);
        if normalized.is_empty() {
            return Ok(Verdict::empty());
        }

        let scan = patterns::scan(&normalized);
        let c = self
            .classifier
            .classify(&normalized)
            .await
            .context("classifier inference failed")?;

        // Strict inequality: a score exactly at the threshold is not scam.
        let ml_hit = c.label == Label::Spam && c.score > self.threshold;
        let (is_scam, reason) = if ml_hit {
            (true, DetectionReason::MlDetection)
        } else if scan.suspicious {
            (true, DetectionReason::PatternDetection)
        } else {
            (false, DetectionReason::None)
        };

        tracing::debug!(
            is_scam,
            score = c.score,
            label = ?c.label,
            suspicious = scan.suspicious,
            reason = %reason,
            "detector verdict"
        );

        Ok(Verdict {
            is_scam,
            confidence: c.score,
            reason,
            matched_rules: scan.matched,
        })
    }
}
