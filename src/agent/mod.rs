pub mod strategy;

pub use strategy::{BehaviorMode, ButtonLayout, PlayerStrategy, PolicyConfig, TickCounters};

use arc_gamepad_core::{GamepadRegistry, PulseQueue};
use serde::Serialize;

pub const AXIS_TURN: usize = 0;
pub const AXIS_THRUST: usize = 1;

/// Something that turns the passage of ticks into gamepad input for one slot.
pub trait InputAgent: Send {
    fn player(&self) -> usize;
    fn name(&self) -> &str;
    fn reset(&mut self, seed: u32);
    fn update(&mut self, controls: &mut Controls<'_>);
    fn mode(&self) -> Option<BehaviorMode> {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    ModeSwitch {
        tick: u64,
        player: usize,
        from: BehaviorMode,
        to: BehaviorMode,
        bias: i8,
    },
    Pulse {
        tick: u64,
        player: usize,
        button: usize,
        hold_ms: f64,
    },
    Release {
        tick: u64,
        player: usize,
        button: usize,
    },
}

/// Everything an agent may touch during one tick.
pub struct Controls<'a> {
    registry: &'a mut GamepadRegistry,
    pulses: &'a mut PulseQueue,
    events: &'a mut Vec<SessionEvent>,
    tick: u64,
    now_ms: f64,
}

impl<'a> Controls<'a> {
    pub fn new(
        registry: &'a mut GamepadRegistry,
        pulses: &'a mut PulseQueue,
        events: &'a mut Vec<SessionEvent>,
        tick: u64,
        now_ms: f64,
    ) -> Self {
        Self {
            registry,
            pulses,
            events,
            tick,
            now_ms,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn set_axis(&mut self, slot: usize, axis: usize, value: f64) {
        self.registry.set_axis(slot, axis, value);
    }

    /// Presses `button` now; the session releases it `hold_ms` later.
    pub fn pulse(&mut self, slot: usize, button: usize, hold_ms: f64) {
        tracing::trace!(tick = self.tick, player = slot, button, hold_ms, "pulse");
        self.pulses
            .press(self.registry, slot, button, self.now_ms, hold_ms);
        self.events.push(SessionEvent::Pulse {
            tick: self.tick,
            player: slot,
            button,
            hold_ms,
        });
    }

    pub fn record(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}
