//! In-memory registry of flagged messages awaiting review.
//!
//! Keyed by the audit post's message id, which the platform assigns only
//! after the post succeeds — so insertion always happens last in the
//! side-effect sequence. `take` is the single lookup-and-remove: two racing
//! reversal events for the same id cannot both succeed, because the whole
//! operation runs under one lock with no await points.
//!
//! Growth is bounded: beyond `capacity`, the oldest unresolved entry is
//! evicted on insert.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::detector::DetectionReason;
use crate::events::{ChannelId, MessageId, UserId};

/// Restorable snapshot of a deleted message.
#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedRecord {
    pub content: String,
    pub author_id: UserId,
    pub author_name: String,
    pub origin_channel: ChannelId,
    pub confidence: f32,
    pub reason: DetectionReason,
    pub flagged_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    map: HashMap<MessageId, FlaggedRecord>,
    // Insertion order for eviction; may hold stale ids already taken.
    order: VecDeque<MessageId>,
}

pub struct FlaggedRegistry {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl FlaggedRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&self, audit_id: MessageId, record: FlaggedRecord) {
        let mut g = self.inner.lock().expect("registry mutex poisoned");
        g.map.insert(audit_id, record);
        g.order.push_back(audit_id);

        while g.map.len() > self.capacity {
            match g.order.pop_front() {
                Some(old) => {
                    if g.map.remove(&old).is_some() {
                        tracing::warn!(audit_id = old, "evicted unresolved flagged record");
                    }
                    // Stale ids (already taken) are skipped silently.
                }
                None => break,
            }
        }
    }

    /// Atomic lookup-and-remove. The second of two racing calls for the same
    /// id observes `None`.
    pub fn take(&self, audit_id: MessageId) -> Option<FlaggedRecord> {
        let mut g = self.inner.lock().expect("registry mutex poisoned");
        g.map.remove(&audit_id)
    }

    pub fn contains(&self, audit_id: MessageId) -> bool {
        let g = self.inner.lock().expect("registry mutex poisoned");
        g.map.contains_key(&audit_id)
    }

    pub fn len(&self) -> usize {
        let g = self.inner.lock().expect("registry mutex poisoned");
        g.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u64) -> FlaggedRecord {
        FlaggedRecord {
            content: format!("msg {n}"),
            author_id: n,
            author_name: format!("user{n}"),
            origin_channel: 10,
            confidence: 0.9,
            reason: DetectionReason::MlDetection,
            flagged_at: Utc::now(),
        }
    }

    #[test]
    fn insert_then_take_roundtrips() {
        let reg = FlaggedRegistry::with_capacity(8);
        reg.insert(1, record(1));
        assert!(reg.contains(1));
        let rec = reg.take(1).expect("record present");
        assert_eq!(rec.content, "msg 1");
        assert!(reg.is_empty());
    }

    #[test]
    fn second_take_observes_not_found() {
        let reg = FlaggedRegistry::with_capacity(8);
        reg.insert(7, record(7));
        assert!(reg.take(7).is_some());
        assert!(reg.take(7).is_none());
        // And again, still a clean miss.
        assert!(reg.take(7).is_none());
    }

    #[test]
    fn capacity_evicts_oldest_entries() {
        let reg = FlaggedRegistry::with_capacity(2);
        reg.insert(1, record(1));
        reg.insert(2, record(2));
        reg.insert(3, record(3));
        assert_eq!(reg.len(), 2);
        assert!(!reg.contains(1));
        assert!(reg.contains(2));
        assert!(reg.contains(3));
    }

    #[test]
    fn stale_order_entries_do_not_evict_live_records() {
        let reg = FlaggedRegistry::with_capacity(2);
        reg.insert(1, record(1));
        reg.insert(2, record(2));
        // Resolve the oldest, then fill up again: 2 and 3 must survive.
        assert!(reg.take(1).is_some());
        reg.insert(3, record(3));
        assert!(reg.contains(2));
        assert!(reg.contains(3));
        assert_eq!(reg.len(), 2);
    }
}
