//! Session and lifetime counters for the moderation pipeline.
//!
//! Two independently-lifetimed aggregates: `session` resets at process
//! start, `overall` persists across restarts as a small JSON file. Both
//! pipelines mutate state only through the increment methods here, which
//! also mirror into Prometheus counters.
//!
//! Invariant after every mutation: `analyzed >= flagged >= false_alarms`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub analyzed: u64,
    pub flagged: u64,
    pub false_alarms: u64,
}

#[derive(Default)]
struct State {
    session: Counters,
    overall: Counters,
}

pub struct StatsTracker {
    state: Mutex<State>,
    started_at: DateTime<Utc>,
    path: Option<PathBuf>,
}

/// Derived view for reporting; pure computation over the stored counters.
#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveStats {
    pub session: Counters,
    pub overall: Counters,
    /// overall flagged / analyzed, percent. 0 when nothing analyzed.
    pub detection_rate_pct: f32,
    /// (flagged - false_alarms) / flagged, percent. 100 when nothing flagged.
    pub accuracy_pct: f32,
    pub uptime_secs: u64,
    pub started_at: DateTime<Utc>,
}

impl StatsTracker {
    /// Fresh tracker with no persistence (tests, embedding without a disk).
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(State::default()),
            started_at: Utc::now(),
            path: None,
        }
    }

    /// Load overall counters from `path`; a missing or corrupt file starts
    /// from zero with a warning. Session counters always start at zero.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let overall = match std::fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "corrupt stats file, starting at zero");
                Counters::default()
            }),
            Err(_) => Counters::default(),
        };

        Self {
            state: Mutex::new(State {
                session: Counters::default(),
                overall,
            }),
            started_at: Utc::now(),
            path: Some(path),
        }
    }

    pub fn record_analyzed(&self) {
        let overall = {
            let mut g = self.state.lock().expect("stats mutex poisoned");
            g.session.analyzed += 1;
            g.overall.analyzed += 1;
            g.overall
        };
        metrics::counter!("messages_analyzed_total").increment(1);
        self.persist(overall);
    }

    pub fn record_flagged(&self) {
        let overall = {
            let mut g = self.state.lock().expect("stats mutex poisoned");
            g.session.flagged += 1;
            g.overall.flagged += 1;
            g.overall
        };
        metrics::counter!("messages_flagged_total").increment(1);
        self.persist(overall);
    }

    pub fn record_false_alarm(&self) {
        let overall = {
            let mut g = self.state.lock().expect("stats mutex poisoned");
            // flagged >= false_alarms must survive every mutation; the
            // reversal workflow guarantees the ordering, this guard keeps the
            // invariant even against a misbehaving caller.
            if g.overall.false_alarms >= g.overall.flagged {
                tracing::warn!("false alarm without a matching flag, ignoring");
                return;
            }
            g.session.false_alarms += 1;
            g.overall.false_alarms += 1;
            g.overall
        };
        metrics::counter!("false_alarms_total").increment(1);
        self.persist(overall);
    }

    pub fn clear_session(&self) {
        let mut g = self.state.lock().expect("stats mutex poisoned");
        g.session = Counters::default();
    }

    pub fn clear_overall(&self) {
        let overall = {
            let mut g = self.state.lock().expect("stats mutex poisoned");
            g.overall = Counters::default();
            g.overall
        };
        self.persist(overall);
    }

    pub fn snapshot(&self) -> (Counters, Counters) {
        let g = self.state.lock().expect("stats mutex poisoned");
        (g.session, g.overall)
    }

    pub fn comprehensive(&self) -> ComprehensiveStats {
        let (session, overall) = self.snapshot();

        let detection_rate_pct = if overall.analyzed > 0 {
            overall.flagged as f32 / overall.analyzed as f32 * 100.0
        } else {
            0.0
        };
        let accuracy_pct = if overall.flagged > 0 {
            (overall.flagged - overall.false_alarms) as f32 / overall.flagged as f32 * 100.0
        } else {
            100.0
        };
        let uptime_secs = (Utc::now() - self.started_at).num_seconds().max(0) as u64;

        ComprehensiveStats {
            session,
            overall,
            detection_rate_pct,
            accuracy_pct,
            uptime_secs,
            started_at: self.started_at,
        }
    }

    // Best-effort: a write failure degrades persistence, never the pipeline.
    fn persist(&self, overall: Counters) {
        let Some(path) = &self.path else { return };
        if let Err(e) = write_counters(path, &overall) {
            tracing::warn!(path = %path.display(), error = %e, "failed to persist stats");
        }
    }
}

fn write_counters(path: &Path, overall: &Counters) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).context("creating stats directory")?;
    }
    let body = serde_json::to_string_pretty(overall).context("serializing stats")?;
    std::fs::write(path, body).context("writing stats file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invariant_holds(c: &Counters) -> bool {
        c.analyzed >= c.flagged && c.flagged >= c.false_alarms
    }

    #[test]
    fn increments_touch_both_aggregates() {
        let s = StatsTracker::in_memory();
        s.record_analyzed();
        s.record_analyzed();
        s.record_flagged();
        let (session, overall) = s.snapshot();
        assert_eq!(session.analyzed, 2);
        assert_eq!(overall.flagged, 1);
        assert!(invariant_holds(&overall));
    }

    #[test]
    fn false_alarm_without_flag_is_ignored() {
        let s = StatsTracker::in_memory();
        s.record_analyzed();
        s.record_false_alarm();
        let (_, overall) = s.snapshot();
        assert_eq!(overall.false_alarms, 0);
        assert!(invariant_holds(&overall));
    }

    #[test]
    fn invariant_survives_arbitrary_sequences() {
        let s = StatsTracker::in_memory();
        for i in 0..50u32 {
            s.record_analyzed();
            if i % 3 == 0 {
                s.record_flagged();
            }
            if i % 7 == 0 {
                s.record_false_alarm();
            }
        }
        let (session, overall) = s.snapshot();
        assert!(invariant_holds(&session));
        assert!(invariant_holds(&overall));
    }

    #[test]
    fn accuracy_is_full_when_nothing_flagged() {
        let s = StatsTracker::in_memory();
        let c = s.comprehensive();
        assert_eq!(c.accuracy_pct, 100.0);
        assert_eq!(c.detection_rate_pct, 0.0);
    }

    #[test]
    fn accuracy_accounts_for_false_alarms() {
        let s = StatsTracker::in_memory();
        for _ in 0..4 {
            s.record_analyzed();
            s.record_flagged();
        }
        s.record_false_alarm();
        let c = s.comprehensive();
        assert!((c.accuracy_pct - 75.0).abs() < 1e-3);
    }

    #[test]
    fn clear_session_leaves_overall_untouched() {
        let s = StatsTracker::in_memory();
        s.record_analyzed();
        s.clear_session();
        let (session, overall) = s.snapshot();
        assert_eq!(session.analyzed, 0);
        assert_eq!(overall.analyzed, 1);
    }

    #[test]
    fn overall_counters_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");

        let s = StatsTracker::load(&path);
        s.record_analyzed();
        s.record_flagged();
        drop(s);

        let reloaded = StatsTracker::load(&path);
        let (session, overall) = reloaded.snapshot();
        assert_eq!(session, Counters::default());
        assert_eq!(overall.analyzed, 1);
        assert_eq!(overall.flagged, 1);
    }
}
