//! False-alarm reversal: a moderator reaction on an audit post undoes a
//! wrong call.
//!
//! The registry `take` is the atomic lookup-and-remove; it runs before any
//! await point, so two near-simultaneous reactions on the same audit post
//! cannot both succeed — the loser observes "not found" and only the reactor
//! is notified. Reversal never touches the dataset sink.

use std::sync::Arc;

use anyhow::Result;

use crate::config::{AppConfig, ConfirmationTarget};
use crate::events::Reaction;
use crate::gateway::{AuditCard, ChannelPost, ChatGateway, FALSE_ALARM_EMOJI};
use crate::pipeline::{truncate_chars, AUDIT_CONTENT_CAP};
use crate::registry::{FlaggedRecord, FlaggedRegistry};
use crate::stats::StatsTracker;

pub struct FalseAlarmWorkflow {
    gateway: Arc<dyn ChatGateway>,
    registry: Arc<FlaggedRegistry>,
    stats: Arc<StatsTracker>,
    cfg: Arc<AppConfig>,
}

impl FalseAlarmWorkflow {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        registry: Arc<FlaggedRegistry>,
        stats: Arc<StatsTracker>,
        cfg: Arc<AppConfig>,
    ) -> Self {
        Self {
            gateway,
            registry,
            stats,
            cfg,
        }
    }

    /// Handle one reaction event. Always `Ok`: reversal failures notify the
    /// acting moderator, they never crash the dispatcher.
    pub async fn handle_reaction(&self, r: Reaction) -> Result<()> {
        if r.reactor.bot {
            return Ok(());
        }
        // Only the affordance emoji on the moderator channel is a reversal
        // trigger; everything else is ordinary chatter.
        if r.channel_id != self.cfg.mod_channel_id || r.emoji != FALSE_ALARM_EMOJI {
            return Ok(());
        }

        if !r.reactor_can_manage_messages {
            let _ = self
                .gateway
                .send_private_message(
                    r.reactor.id,
                    "You need the message-management permission to mark a detection \
                     as a false alarm.",
                )
                .await;
            tracing::info!(reactor = %r.reactor.name, "reversal denied: missing permission");
            return Ok(());
        }

        // Atomic consume. A duplicate reaction racing on the same record
        // lands here with `None`.
        let Some(record) = self.registry.take(r.message_id) else {
            let _ = self
                .gateway
                .send_private_message(
                    r.reactor.id,
                    "That detection is no longer tracked (already reversed or expired).",
                )
                .await;
            return Ok(());
        };

        self.stats.record_false_alarm();
        tracing::info!(
            audit_id = r.message_id,
            moderator = %r.reactor.name,
            author = %record.author_name,
            "false alarm confirmed, restoring message"
        );

        self.restore(&r, &record).await;
        Ok(())
    }

    async fn restore(&self, r: &Reaction, record: &FlaggedRecord) {
        // Repost the original content where it was deleted from.
        let notice = format!(
            "Message from {} restored by {} (false alarm):\n{}",
            record.author_name, r.reactor.name, record.content
        );
        if let Err(e) = self
            .gateway
            .post_channel_message(record.origin_channel, &ChannelPost::plain(notice))
            .await
        {
            tracing::warn!(error = %e, channel = record.origin_channel, "restore post failed");
        }

        // Rewrite the audit post to its reversed form and drop the affordance.
        let card = AuditCard {
            author_id: record.author_id,
            author_name: record.author_name.clone(),
            joined_at: None,
            reason: record.reason,
            confidence: record.confidence,
            origin_channel: record.origin_channel,
            sent_at: record.flagged_at,
            detected_at: record.flagged_at,
            content: truncate_chars(&record.content, AUDIT_CONTENT_CAP),
            reversed: true,
            reversed_by: Some(r.reactor.name.clone()),
        };
        let edited = ChannelPost {
            content: "False alarm — message restored.".to_string(),
            card: Some(card),
            false_alarm_affordance: false,
        };
        if let Err(e) = self
            .gateway
            .edit_channel_message(self.cfg.mod_channel_id, r.message_id, &edited)
            .await
        {
            tracing::warn!(error = %e, audit_id = r.message_id, "audit edit failed");
        }
        if let Err(e) = self
            .gateway
            .clear_reactions(self.cfg.mod_channel_id, r.message_id)
            .await
        {
            tracing::warn!(error = %e, audit_id = r.message_id, "clearing reactions failed");
        }

        // Confirmation summary; delivery target is a deployment choice.
        let summary = format!(
            "{} marked the detection against {} as a false alarm; the message was restored.",
            r.reactor.name, record.author_name
        );
        let sent = match self.cfg.reversal_confirmation {
            ConfirmationTarget::ModChannel => self
                .gateway
                .post_channel_message(self.cfg.mod_channel_id, &ChannelPost::plain(summary))
                .await
                .map(|_| ()),
            ConfirmationTarget::ReactorDm => {
                self.gateway.send_private_message(r.reactor.id, &summary).await
            }
        };
        if let Err(e) = sent {
            tracing::warn!(error = %e, "reversal confirmation failed");
        }
    }
}
