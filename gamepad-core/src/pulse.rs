//! Owned queue of scheduled button releases.
//!
//! A pulse presses a button now and releases it once the clock passes the
//! deadline. Releases are driven explicitly by [`PulseQueue::release_due`], and
//! can be enumerated or cancelled at teardown.

use crate::registry::GamepadRegistry;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingRelease {
    pub slot: usize,
    pub button: usize,
    pub due_ms: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PulseQueue {
    pending: Vec<PendingRelease>,
}

impl PulseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presses `button` on `slot` and schedules its release `hold_ms` after
    /// `now_ms`. If a release for the same button is already pending, the
    /// later of the two deadlines wins, so overlapping pulses keep the button
    /// held until the last one ends.
    ///
    /// The release is scheduled even if the device is missing; it is then a
    /// no-op when it fires.
    pub fn press(
        &mut self,
        registry: &mut GamepadRegistry,
        slot: usize,
        button: usize,
        now_ms: f64,
        hold_ms: f64,
    ) {
        registry.set_button(slot, button, true);
        let due_ms = now_ms + hold_ms.max(0.0);
        match self
            .pending
            .iter_mut()
            .find(|release| release.slot == slot && release.button == button)
        {
            Some(existing) => existing.due_ms = existing.due_ms.max(due_ms),
            None => self.pending.push(PendingRelease {
                slot,
                button,
                due_ms,
            }),
        }
    }

    /// Fires every release whose deadline is at or before `now_ms` and returns
    /// the ones fired, earliest first.
    pub fn release_due(
        &mut self,
        registry: &mut GamepadRegistry,
        now_ms: f64,
    ) -> Vec<PendingRelease> {
        let mut fired = Vec::new();
        self.pending.retain(|release| {
            if release.due_ms <= now_ms {
                registry.set_button(release.slot, release.button, false);
                fired.push(*release);
                false
            } else {
                true
            }
        });
        fired.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        fired
    }

    /// Drops every pending release and lets go of the buttons right away.
    pub fn cancel_all(&mut self, registry: &mut GamepadRegistry) -> Vec<PendingRelease> {
        let cancelled = self.pending();
        for release in self.pending.drain(..) {
            registry.set_button(release.slot, release.button, false);
        }
        cancelled
    }

    /// Pending releases, earliest first.
    pub fn pending(&self) -> Vec<PendingRelease> {
        let mut pending = self.pending.clone();
        pending.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
