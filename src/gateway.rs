//! Outbound chat-platform seam.
//!
//! The core never talks to a chat platform directly; it calls this trait.
//! Payloads are typed — rendering (embeds, formatting) belongs to the
//! connector behind the trait. Every call is attempted exactly once; the
//! pipeline decides per call site whether a failure aborts or degrades.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::detector::DetectionReason;
use crate::events::{ChannelId, MessageId, UserId};

/// Reaction affordance attached to audit posts; a moderator reacting with
/// this emoji triggers the false-alarm reversal.
pub const FALSE_ALARM_EMOJI: &str = "❌";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("missing permission")]
    PermissionDenied,
    #[error("target not found")]
    NotFound,
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Structured body of an audit post documenting one detection. The connector
/// renders it; the reversal workflow edits it in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditCard {
    pub author_id: UserId,
    pub author_name: String,
    pub joined_at: Option<DateTime<Utc>>,
    pub reason: DetectionReason,
    pub confidence: f32,
    pub origin_channel: ChannelId,
    pub sent_at: DateTime<Utc>,
    pub detected_at: DateTime<Utc>,
    /// Original content, truncated to 1024 characters.
    pub content: String,
    pub reversed: bool,
    pub reversed_by: Option<String>,
}

/// One outbound channel message: plain text plus an optional audit card and
/// an optional false-alarm reaction affordance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelPost {
    pub content: String,
    pub card: Option<AuditCard>,
    pub false_alarm_affordance: bool,
}

impl ChannelPost {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            card: None,
            false_alarm_affordance: false,
        }
    }
}

#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), GatewayError>;

    async fn send_private_message(&self, user: UserId, content: &str)
        -> Result<(), GatewayError>;

    /// Post to a channel; returns the platform-assigned message id.
    async fn post_channel_message(
        &self,
        channel: ChannelId,
        post: &ChannelPost,
    ) -> Result<MessageId, GatewayError>;

    async fn edit_channel_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        post: &ChannelPost,
    ) -> Result<(), GatewayError>;

    async fn clear_reactions(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), GatewayError>;
}
