use crate::agent::{BehaviorMode, SessionEvent};
use crate::session::Session;
use crate::util::{player_seed, seed_to_hex};
use anyhow::{anyhow, Context, Result};
use arc_gamepad_core::{enumeration, GamepadList};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    pub seed: u32,
    pub ticks: u64,
    pub tick_ms: f64,
    /// Sample the enumeration entry point every this many ticks (0 disables).
    pub sample_every: u64,
    /// Install the registry as the process-wide entry point for the run.
    pub inject: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModeTicks {
    pub explore: u64,
    pub circle: u64,
    pub zigzag: u64,
    pub aggressive: u64,
}

impl ModeTicks {
    fn add(&mut self, mode: BehaviorMode) {
        match mode {
            BehaviorMode::Explore => self.explore += 1,
            BehaviorMode::Circle => self.circle += 1,
            BehaviorMode::Zigzag => self.zigzag += 1,
            BehaviorMode::Aggressive => self.aggressive += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.explore + self.circle + self.zigzag + self.aggressive
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerSummary {
    pub player: usize,
    pub name: String,
    /// Seed the player's strategy was created with.
    pub seed: u32,
    pub final_mode: Option<BehaviorMode>,
    pub mode_ticks: ModeTicks,
    pub mode_switches: u32,
    /// Button index -> number of pulses.
    pub pulses: BTreeMap<usize, u32>,
}

impl PlayerSummary {
    pub fn total_pulses(&self) -> u32 {
        self.pulses.values().sum()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Sample {
    pub tick: u64,
    pub now_ms: f64,
    pub gamepads: GamepadList,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub seed: u32,
    pub seed_hex: String,
    pub ticks: u64,
    pub tick_ms: f64,
    pub duration_ms: f64,
    pub injected: bool,
    pub players: Vec<PlayerSummary>,
    pub releases_fired: u64,
    pub cancelled_at_stop: usize,
    pub final_gamepads: GamepadList,
    pub samples: Vec<Sample>,
}

pub fn run_simulation(config: SimulationConfig) -> Result<SimulationReport> {
    if config.ticks == 0 {
        return Err(anyhow!("ticks must be > 0"));
    }

    let mut session = Session::two_player(config.seed, config.tick_ms);
    let injection = config.inject.then(|| session.registry().inject_scoped());
    tracing::info!(
        seed = %seed_to_hex(config.seed),
        ticks = config.ticks,
        injected = config.inject,
        "starting automated players"
    );

    let mut mode_ticks = vec![ModeTicks::default(); session.agents().len()];
    let mut samples = Vec::new();
    for _ in 0..config.ticks {
        session.step();
        for (ticks, agent) in mode_ticks.iter_mut().zip(session.agents()) {
            if let Some(mode) = agent.mode() {
                ticks.add(mode);
            }
        }
        if config.sample_every > 0 && session.tick() % config.sample_every == 0 {
            // Read the way the program under test would.
            let gamepads = if injection.is_some() {
                enumeration::get_gamepads()
            } else {
                session.enumerate()
            };
            samples.push(Sample {
                tick: session.tick(),
                now_ms: session.now_ms(),
                gamepads,
            });
        }
    }

    let final_gamepads = session.enumerate();
    let players = summarize_players(&session, config.seed, mode_ticks);
    let cancelled_at_stop = session.stop().len();
    drop(injection);

    for player in &players {
        tracing::info!(
            player = player.player,
            switches = player.mode_switches,
            pulses = player.total_pulses(),
            "player summary"
        );
    }

    Ok(SimulationReport {
        seed: config.seed,
        seed_hex: seed_to_hex(config.seed),
        ticks: session.tick(),
        tick_ms: session.tick_ms(),
        duration_ms: session.now_ms(),
        injected: config.inject,
        players,
        releases_fired: session.releases_fired(),
        cancelled_at_stop,
        final_gamepads,
        samples,
    })
}

fn summarize_players(
    session: &Session,
    session_seed: u32,
    mode_ticks: Vec<ModeTicks>,
) -> Vec<PlayerSummary> {
    session
        .agents()
        .iter()
        .zip(mode_ticks)
        .map(|(agent, mode_ticks)| {
            let player = agent.player();
            let mut mode_switches = 0;
            let mut pulses = BTreeMap::new();
            for event in session.events() {
                match event {
                    SessionEvent::ModeSwitch { player: p, .. } if *p == player => {
                        mode_switches += 1;
                    }
                    SessionEvent::Pulse {
                        player: p, button, ..
                    } if *p == player => {
                        *pulses.entry(*button).or_insert(0) += 1;
                    }
                    _ => {}
                }
            }
            PlayerSummary {
                player,
                name: agent.name().to_string(),
                seed: player_seed(session_seed, player),
                final_mode: agent.mode(),
                mode_ticks,
                mode_switches,
                pulses,
            }
        })
        .collect()
}

pub fn write_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    let encoded = serde_json::to_vec_pretty(report)?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}
