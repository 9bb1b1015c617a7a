//! Runtime configuration: TOML file plus environment overrides.
//!
//! `AppConfig::load()` reads `SENTINEL_CONFIG_PATH` (default
//! `config/sentinel.toml`); a missing file falls back to defaults so the
//! service can boot from environment variables alone. Values are sanitized
//! after the merge.

use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const ENV_CONFIG_PATH: &str = "SENTINEL_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/sentinel.toml";

fn default_model() -> String {
    "mrm8488/bert-tiny-finetuned-sms-spam-detection".to_string()
}
fn default_inference_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}
fn default_inference_timeout() -> u64 {
    10
}
fn default_threshold() -> f32 {
    0.85
}
fn default_prefix() -> String {
    "!".to_string()
}
fn default_whitelist() -> Vec<String> {
    vec!["Admin".to_string(), "Moderator".to_string()]
}
fn default_registry_capacity() -> usize {
    512
}
fn default_dataset_path() -> String {
    "data/flagged.jsonl".to_string()
}
fn default_stats_path() -> String {
    "data/stats.json".to_string()
}
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Where the reversal confirmation summary is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationTarget {
    ModChannel,
    ReactorDm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Classification model identifier, resolved by the inference endpoint.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_inference_url")]
    pub inference_url: String,
    /// Bearer token for the inference endpoint; `None` for anonymous access.
    #[serde(default)]
    pub inference_token: Option<String>,
    #[serde(default = "default_inference_timeout")]
    pub inference_timeout_secs: u64,
    /// Scam confidence threshold (strict inequality applies).
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
    /// Role names whose members bypass analysis entirely.
    #[serde(default = "default_whitelist")]
    pub whitelist_roles: Vec<String>,
    /// Moderator-only channel receiving audit posts.
    #[serde(default)]
    pub mod_channel_id: u64,
    /// Role pinged in audit posts, if set.
    #[serde(default)]
    pub moderator_role_id: Option<u64>,
    #[serde(default = "default_registry_capacity")]
    pub registry_capacity: usize,
    #[serde(default = "ConfirmationTarget::default")]
    pub reversal_confirmation: ConfirmationTarget,
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,
    #[serde(default = "default_stats_path")]
    pub stats_path: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ConfirmationTarget {
    fn default() -> Self {
        ConfirmationTarget::ModChannel
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str("").expect("defaults deserialize")
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.as_ref().display()))?;
        let mut cfg: AppConfig = toml::from_str(&data).context("parsing config")?;
        cfg.apply_env();
        cfg.sanitize();
        Ok(cfg)
    }

    /// Config path from env (or default); a missing file yields defaults plus
    /// env overrides so the service can boot without a config file at all.
    pub fn load() -> Result<Self> {
        let path = env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        match fs::read_to_string(&path) {
            Ok(data) => {
                let mut cfg: AppConfig = toml::from_str(&data).context("parsing config")?;
                cfg.apply_env();
                cfg.sanitize();
                Ok(cfg)
            }
            Err(_) => {
                tracing::warn!(path = %path, "config file not found, using defaults + env");
                let mut cfg = AppConfig::default();
                cfg.apply_env();
                cfg.sanitize();
                Ok(cfg)
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(v) = env::var("SENTINEL_MODEL") {
            self.model = v;
        }
        if let Ok(v) = env::var("SENTINEL_INFERENCE_TOKEN") {
            self.inference_token = Some(v);
        }
        if let Ok(v) = env::var("SENTINEL_THRESHOLD") {
            if let Ok(t) = v.parse::<f32>() {
                self.threshold = t;
            }
        }
        if let Ok(v) = env::var("SENTINEL_MOD_CHANNEL_ID") {
            if let Ok(id) = v.parse::<u64>() {
                self.mod_channel_id = id;
            }
        }
        if let Ok(v) = env::var("SENTINEL_BIND_ADDR") {
            self.bind_addr = v;
        }
    }

    fn sanitize(&mut self) {
        if !(0.0..=1.0).contains(&self.threshold) {
            tracing::warn!(threshold = self.threshold, "threshold out of range, using default");
            self.threshold = default_threshold();
        }
        if self.registry_capacity == 0 {
            self.registry_capacity = default_registry_capacity();
        }
        if self.command_prefix.is_empty() {
            self.command_prefix = default_prefix();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.threshold, 0.85);
        assert_eq!(cfg.command_prefix, "!");
        assert_eq!(cfg.registry_capacity, 512);
        assert_eq!(cfg.reversal_confirmation, ConfirmationTarget::ModChannel);
        assert!(cfg.whitelist_roles.contains(&"Moderator".to_string()));
    }

    #[test]
    fn toml_roundtrip_with_partial_file() {
        let cfg: AppConfig = toml::from_str(
            r#"
            threshold = 0.9
            mod_channel_id = 123
            whitelist_roles = ["executive", "chat revive ping"]
            reversal_confirmation = "reactor-dm"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.threshold, 0.9);
        assert_eq!(cfg.mod_channel_id, 123);
        assert_eq!(cfg.reversal_confirmation, ConfirmationTarget::ReactorDm);
        // Unset fields fall back to defaults.
        assert_eq!(cfg.model, default_model());
    }

    #[test]
    #[serial]
    fn env_overrides_and_sanitation() {
        env::set_var("SENTINEL_THRESHOLD", "7.5");
        env::set_var("SENTINEL_MOD_CHANNEL_ID", "999");
        let mut cfg = AppConfig::default();
        cfg.apply_env();
        cfg.sanitize();
        env::remove_var("SENTINEL_THRESHOLD");
        env::remove_var("SENTINEL_MOD_CHANNEL_ID");

        // Out-of-range threshold falls back to default; valid id sticks.
        assert_eq!(cfg.threshold, 0.85);
        assert_eq!(cfg.mod_channel_id, 999);
    }
}
