//! Message-handling workflow: filter, detect, then the ordered side-effect
//! sequence on a positive verdict.
//!
//! Sequence: dataset append -> delete -> DM notify -> audit post -> registry
//! insert. Each step after the verdict is best-effort and never rolls back a
//! prior step. A delete failure aborts the remainder (the message is still
//! live, so notifying or auditing would lie); a DM failure is swallowed; a
//! failed audit post leaves no registry entry. Nothing here may crash the
//! event dispatcher.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use crate::config::AppConfig;
use crate::dataset::{DatasetSink, FlaggedSample};
use crate::detector::ScamDetector;
use crate::events::{InboundEvent, Message};
use crate::gateway::{AuditCard, ChannelPost, ChatGateway, GatewayError};
use crate::patterns::RULESET_VERSION;
use crate::registry::{FlaggedRecord, FlaggedRegistry};
use crate::reversal::FalseAlarmWorkflow;
use crate::stats::StatsTracker;

/// Audit cards cap the quoted content at this many characters.
pub const AUDIT_CONTENT_CAP: usize = 1024;

pub struct ModerationPipeline {
    detector: Arc<ScamDetector>,
    gateway: Arc<dyn ChatGateway>,
    dataset: Arc<dyn DatasetSink>,
    registry: Arc<FlaggedRegistry>,
    stats: Arc<StatsTracker>,
    reversal: Arc<FalseAlarmWorkflow>,
    cfg: Arc<AppConfig>,
}

impl ModerationPipeline {
    pub fn new(
        detector: Arc<ScamDetector>,
        gateway: Arc<dyn ChatGateway>,
        dataset: Arc<dyn DatasetSink>,
        registry: Arc<FlaggedRegistry>,
        stats: Arc<StatsTracker>,
        cfg: Arc<AppConfig>,
    ) -> Self {
        let reversal = Arc::new(FalseAlarmWorkflow::new(
            Arc::clone(&gateway),
            Arc::clone(&registry),
            Arc::clone(&stats),
            Arc::clone(&cfg),
        ));
        Self {
            detector,
            gateway,
            dataset,
            registry,
            stats,
            reversal,
            cfg,
        }
    }

    pub fn reversal(&self) -> Arc<FalseAlarmWorkflow> {
        Arc::clone(&self.reversal)
    }

    /// Dispatch one inbound event. Always returns `Ok`: failures are logged
    /// and degrade per step, they never terminate the dispatcher.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Message(msg) => self.handle_message(msg).await,
            InboundEvent::Reaction(r) => self.reversal.handle_reaction(r).await,
        }
    }

    pub async fn handle_message(&self, msg: Message) -> Result<()> {
        if msg.author.bot {
            return Ok(());
        }
        if msg.content.starts_with(&self.cfg.command_prefix) {
            return Ok(());
        }
        // Whitelist bypass, evaluated against the roles carried on the event
        // (current at receive time).
        if msg
            .author_roles
            .iter()
            .any(|r| self.cfg.whitelist_roles.iter().any(|w| w == r))
        {
            tracing::debug!(author = %msg.author.name, "whitelisted role, skipping");
            return Ok(());
        }

        self.stats.record_analyzed();

        let verdict = match self.detector.detect(&msg.content).await {
            Ok(v) => v,
            Err(e) => {
                // Undetermined, not "not scam": no action on this message.
                tracing::warn!(error = %e, message_id = msg.id, "classification failed");
                return Ok(());
            }
        };

        if !verdict.is_scam {
            return Ok(());
        }

        self.stats.record_flagged();
        tracing::warn!(
            author = %msg.author.name,
            author_id = msg.author.id,
            confidence = verdict.confidence,
            reason = %verdict.reason,
            "scam detected"
        );

        self.run_scam_sequence(&msg, verdict.confidence, verdict.reason).await;
        Ok(())
    }

    async fn run_scam_sequence(
        &self,
        msg: &Message,
        confidence: f32,
        reason: crate::detector::DetectionReason,
    ) {
        let detected_at = Utc::now();

        // 1) Dataset first: keep the evidence even if deletion fails later.
        let sample = FlaggedSample {
            content: msg.content.clone(),
            author_id: msg.author.id,
            author_name: msg.author.name.clone(),
            channel_id: msg.channel_id,
            confidence,
            reason: reason.as_str().to_string(),
            ruleset_version: RULESET_VERSION,
            joined_at: msg.joined_at,
            detected_at,
        };
        if let Err(e) = self.dataset.append(&sample).await {
            tracing::warn!(error = %e, "dataset append failed, continuing");
        }

        // 2) Delete. Any failure aborts the remaining sequence.
        match self.gateway.delete_message(msg.channel_id, msg.id).await {
            Ok(()) => {}
            Err(GatewayError::PermissionDenied) => {
                tracing::error!(message_id = msg.id, "lacking permission to delete, aborting");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, message_id = msg.id, "delete failed, aborting");
                return;
            }
        }

        // 3) DM notify: author may be unreachable; non-fatal.
        let notice = format!(
            "Your message was removed because it was flagged as a likely scam ({}). \
             If you believe this was a mistake, a moderator can restore it.",
            reason.as_str()
        );
        if let Err(e) = self
            .gateway
            .send_private_message(msg.author.id, &notice)
            .await
        {
            tracing::debug!(error = %e, user = msg.author.id, "author DM failed, continuing");
        }

        // 4) Audit post to the moderator channel.
        let card = AuditCard {
            author_id: msg.author.id,
            author_name: msg.author.name.clone(),
            joined_at: msg.joined_at,
            reason,
            confidence,
            origin_channel: msg.channel_id,
            sent_at: msg.sent_at,
            detected_at,
            content: truncate_chars(&msg.content, AUDIT_CONTENT_CAP),
            reversed: false,
            reversed_by: None,
        };
        let ping = match self.cfg.moderator_role_id {
            Some(role) => format!("<@&{role}> Scam detected!"),
            None => "Scam detected!".to_string(),
        };
        let post = ChannelPost {
            content: ping,
            card: Some(card),
            false_alarm_affordance: true,
        };

        let audit_id = match self
            .gateway
            .post_channel_message(self.cfg.mod_channel_id, &post)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    channel = self.cfg.mod_channel_id,
                    "audit post failed, no registry entry"
                );
                return;
            }
        };

        // 5) Register only after the audit post succeeded: the record is
        // keyed by the platform-assigned audit message id.
        self.registry.insert(
            audit_id,
            FlaggedRecord {
                content: msg.content.clone(),
                author_id: msg.author.id,
                author_name: msg.author.name.clone(),
                origin_channel: msg.channel_id,
                confidence,
                reason,
                flagged_at: detected_at,
            },
        );
        tracing::info!(audit_id, author = %msg.author.name, "flagged message registered");
    }
}

/// Truncate on a char boundary; audit cards cap quoted content.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // Multi-byte chars count as one.
        assert_eq!(truncate_chars("ééééé", 2), "éé");
    }
}
