//! Inbound events as a closed set of tagged variants.
//!
//! The platform connector translates its own payloads into these structs at
//! the boundary; malformed events are rejected there, not deep in the
//! pipeline. All fields are read-only snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type ChannelId = u64;
pub type MessageId = u64;
pub type GuildId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    /// Automated accounts are never moderated and never accepted as reactors.
    pub bot: bool,
}

/// Immutable snapshot of one inbound chat message. Attachments are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub author: Author,
    /// Role names held by the author at receive time (not cached).
    pub author_roles: Vec<String>,
    pub joined_at: Option<DateTime<Utc>>,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// A reaction added to a message, with the reactor's moderation capability
/// resolved by the connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub reactor: Author,
    pub emoji: String,
    pub reactor_can_manage_messages: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    Message(Message),
    Reaction(Reaction),
}
