//! Deferred work keyed to the simulation clock.
//!
//! Scan windows, spawn fallbacks and target rotations all run off the
//! same clock that drives motion. Pausing the simulation pauses them,
//! and a room reset cancels them without racing an OS timer thread.

use serde::{Deserialize, Serialize};

/// What to do when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Scan aggregation window expired; finish with whatever arrived.
    ScanTimeout,
    /// Spawn the population even though no scan data ever arrived.
    SpawnFallback,
    /// Rotate the round's target species.
    TargetRotate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Timer {
    kind: TimerKind,
    due_at: f64,
}

/// Pending timers. At most one timer per kind is live at a time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerQueue {
    timers: Vec<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire `delay` seconds after `now`, replacing
    /// any pending timer of the same kind.
    pub fn schedule(&mut self, kind: TimerKind, now: f64, delay: f32) {
        self.cancel(kind);
        self.timers.push(Timer {
            kind,
            due_at: now + delay.max(0.0) as f64,
        });
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.timers.retain(|t| t.kind != kind);
    }

    /// Remove and return every timer due at or before `now`, in firing
    /// order.
    pub fn fire_due(&mut self, now: f64) -> Vec<TimerKind> {
        let mut due: Vec<Timer> = Vec::new();
        self.timers.retain(|t| {
            if t.due_at <= now {
                due.push(*t);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due_at.total_cmp(&b.due_at));
        due.into_iter().map(|t| t.kind).collect()
    }
}
