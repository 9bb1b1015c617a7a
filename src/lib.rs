// src/lib.rs
// Public library surface for integration tests and embedding connectors.

pub mod api;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod detector;
pub mod events;
pub mod gateway;
pub mod metrics;
pub mod normalize;
pub mod patterns;
pub mod pipeline;
pub mod registry;
pub mod reversal;
pub mod stats;

// ---- Re-exports for stable public API ----
pub use crate::classifier::{Classification, Classifier, Label, MockClassifier, RemoteClassifier};
pub use crate::config::AppConfig;
pub use crate::detector::{DetectionReason, ScamDetector, Verdict};
pub use crate::events::{InboundEvent, Message, Reaction};
pub use crate::gateway::{ChatGateway, GatewayError, FALSE_ALARM_EMOJI};
pub use crate::pipeline::ModerationPipeline;
pub use crate::registry::{FlaggedRecord, FlaggedRegistry};
pub use crate::reversal::FalseAlarmWorkflow;
pub use crate::stats::StatsTracker;
