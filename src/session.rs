//! Tick loop that drives agents against one shared registry.
//!
//! [`Session`] is fully deterministic: time only advances through
//! [`Session::step`], so a seed replays the same inputs every run.
//! [`RealtimeSession`] paces the same loop on a background thread.

use crate::agent::{Controls, InputAgent, PlayerStrategy, SessionEvent};
use crate::util::player_seed;
use anyhow::{anyhow, Result};
use arc_gamepad_core::{
    Clock, GamepadList, ManualClock, PendingRelease, PulseQueue, SharedRegistry,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const PLAYER_LABELS: [&str; 2] = ["Test Player 1", "Test Player 2"];
pub const AGENT_NAMES: [&str; 2] = ["Player 1", "Player 2"];

pub struct Session {
    registry: SharedRegistry,
    clock: Arc<ManualClock>,
    pulses: PulseQueue,
    agents: Vec<Box<dyn InputAgent>>,
    events: Vec<SessionEvent>,
    tick: u64,
    tick_ms: f64,
    releases_fired: u64,
}

impl Session {
    /// Empty session: no devices, no agents.
    pub fn new(tick_ms: f64) -> Self {
        let clock = Arc::new(ManualClock::new());
        let registry = SharedRegistry::with_clock(clock.clone());
        Self {
            registry,
            clock,
            pulses: PulseQueue::new(),
            agents: Vec::new(),
            events: Vec::new(),
            tick: 0,
            tick_ms: if tick_ms.is_finite() && tick_ms > 0.0 {
                tick_ms
            } else {
                crate::config::DEFAULT_TICK_MS as f64
            },
            releases_fired: 0,
        }
    }

    /// Devices at slots 0 and 1, each driven by its own strategy.
    pub fn two_player(seed: u32, tick_ms: f64) -> Self {
        let mut session = Self::new(tick_ms);
        for (slot, (label, name)) in PLAYER_LABELS.iter().zip(AGENT_NAMES).enumerate() {
            session.registry.create_device(slot, *label);
            session.add_agent(Box::new(PlayerStrategy::new(
                slot,
                name,
                player_seed(seed, slot),
            )));
        }
        session
    }

    pub fn add_agent(&mut self, agent: Box<dyn InputAgent>) {
        self.agents.push(agent);
    }

    pub fn agents(&self) -> &[Box<dyn InputAgent>] {
        &self.agents
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn tick_ms(&self) -> f64 {
        self.tick_ms
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn releases_fired(&self) -> u64 {
        self.releases_fired
    }

    pub fn pending_releases(&self) -> Vec<PendingRelease> {
        self.pulses.pending()
    }

    pub fn enumerate(&self) -> GamepadList {
        self.registry.gamepads()
    }

    /// One tick: advance the clock, fire due releases, update every agent.
    pub fn step(&mut self) {
        let now = self.clock.advance(self.tick_ms);
        self.tick += 1;
        let tick = self.tick;

        let pulses = &mut self.pulses;
        let agents = &mut self.agents;
        let events = &mut self.events;
        let fired = self.registry.with(|registry| {
            let fired = pulses.release_due(registry, now);
            events.extend(fired.iter().map(|release| SessionEvent::Release {
                tick,
                player: release.slot,
                button: release.button,
            }));
            for agent in agents.iter_mut() {
                let mut controls = Controls::new(registry, pulses, events, tick, now);
                agent.update(&mut controls);
            }
            fired.len()
        });
        self.releases_fired += fired as u64;
    }

    pub fn run_for(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Cancels pending releases and resets every device. Nothing scheduled
    /// before the stop fires afterwards.
    pub fn stop(&mut self) -> Vec<PendingRelease> {
        let pulses = &mut self.pulses;
        let cancelled = self.registry.with(|registry| {
            let cancelled = pulses.cancel_all(registry);
            registry.reset_all();
            cancelled
        });
        tracing::info!(
            tick = self.tick,
            cancelled = cancelled.len(),
            "stopped automated players"
        );
        cancelled
    }
}

/// Fixed-rate driver for a [`Session`] on its own thread.
pub struct RealtimeSession {
    registry: SharedRegistry,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Session>>,
}

impl RealtimeSession {
    pub fn start(session: Session) -> Result<Self> {
        let registry = session.registry().clone();
        let stop = Arc::new(AtomicBool::new(false));
        let period = Duration::from_secs_f64(session.tick_ms() / 1000.0);
        let stop_flag = stop.clone();
        tracing::info!(
            agents = session.agents().len(),
            tick_ms = session.tick_ms(),
            "starting automated players"
        );

        let handle = thread::Builder::new()
            .name("autopilot-tick".to_string())
            .spawn(move || {
                let mut session = session;
                let mut next = Instant::now() + period;
                while !stop_flag.load(Ordering::Acquire) {
                    session.step();
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                        next += period;
                    } else {
                        // Behind schedule: resume from now rather than bursting.
                        next = now + period;
                    }
                }
                session
            })
            .map_err(|err| anyhow!("failed to spawn tick thread: {err}"))?;

        Ok(Self {
            registry,
            stop,
            handle: Some(handle),
        })
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the loop, then stops the session (cancel releases, reset devices)
    /// and hands it back.
    pub fn stop(mut self) -> Result<Session> {
        self.stop.store(true, Ordering::Release);
        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow!("tick thread already joined"))?;
        let mut session = handle
            .join()
            .map_err(|_| anyhow!("tick thread panicked"))?;
        session.stop();
        Ok(session)
    }
}

impl Drop for RealtimeSession {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if let Ok(mut session) = handle.join() {
                session.stop();
            }
        }
    }
}
