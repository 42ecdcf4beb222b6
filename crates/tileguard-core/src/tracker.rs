//! Defacement state tracker.
//!
//! Turns the raw per-cycle error counts into notify/no-notify decisions.
//! A notification fires when:
//! - errors increased since the last cycle (escalation)
//! - errors dropped to zero after being non-zero (restoration)
//! - errors persist and the reminder interval has elapsed since the last
//!   notification
//!
//! The reminder rule keeps a sustained defacement from notifying once and
//! going silent forever; it refires at most once per elapsed interval.

use crate::pattern::PatternId;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Long-lived per-identity state, owned exclusively by the tracker.
#[derive(Debug, Clone, Copy)]
pub struct PatternState {
    last_error_count: u32,
    last_defaced_at: DateTime<Utc>,
}

impl PatternState {
    /// Error count observed on the previous cycle
    #[inline]
    #[must_use]
    pub fn last_error_count(&self) -> u32 {
        self.last_error_count
    }

    /// When the last notification for this identity was sent
    #[inline]
    #[must_use]
    pub fn last_defaced_at(&self) -> DateTime<Utc> {
        self.last_defaced_at
    }
}

/// A decision to notify, handed to the dispatcher for rendering and delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyDecision {
    pub id: PatternId,
    pub errors_before: u32,
    pub errors_now: u32,
    pub defaced_since: DateTime<Utc>,
}

/// Per-pattern-identity state machine with hysteresis and a reminder timer.
///
/// Single-threaded by design: the scheduling loop serializes repository swaps
/// and reconciliation cycles, so no interior locking is needed.
#[derive(Debug)]
pub struct DefacementTracker {
    remind_interval: Duration,
    states: HashMap<PatternId, PatternState>,
}

impl DefacementTracker {
    /// Create a tracker with the given reminder interval
    #[must_use]
    pub fn new(remind_interval: Duration) -> Self {
        Self {
            remind_interval,
            states: HashMap::new(),
        }
    }

    /// Fold one cycle's error count for `id` into the state, returning a
    /// decision when a notification should fire.
    ///
    /// `last_error_count` is always updated; `last_defaced_at` only moves
    /// when a notification fires.
    pub fn reconcile(
        &mut self,
        id: &PatternId,
        current_errors: u32,
        now: DateTime<Utc>,
    ) -> Option<NotifyDecision> {
        let state = self.states.entry(id.clone()).or_insert(PatternState {
            last_error_count: 0,
            last_defaced_at: now,
        });
        let before = state.last_error_count;
        debug!(pattern = %id, before, now = current_errors, "reconciled pattern errors");

        let escalated = current_errors > before;
        let restored = current_errors == 0 && before != 0;
        let remind_due =
            current_errors > 0 && now >= state.last_defaced_at + self.remind_interval;

        state.last_error_count = current_errors;
        if !(escalated || restored || remind_due) {
            return None;
        }

        state.last_defaced_at = now;
        Some(NotifyDecision {
            id: id.clone(),
            errors_before: before,
            errors_now: current_errors,
            defaced_since: now,
        })
    }

    /// Drop state for identities no longer in the active pattern set.
    ///
    /// Called after each repository swap; a pattern that moved gets a fresh
    /// identity and therefore fresh state.
    pub fn retain(&mut self, live: &HashSet<PatternId>) {
        self.states.retain(|id, _| live.contains(id));
    }

    /// Current state for an identity, if it has been seen
    #[must_use]
    pub fn state(&self, id: &PatternId) -> Option<&PatternState> {
        self.states.get(id)
    }

    /// Number of tracked identities
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no identity is tracked
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
