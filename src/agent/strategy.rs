//! Heuristic twin-stick pilot.
//!
//! Every tick the strategy steers with axis 0 (turn) and axis 1 (thrust,
//! negative is forward) according to its current mode, and pulses its weapon
//! buttons on fixed cadences. The mode is redrawn uniformly every
//! [`ACTION_SWITCH_TICKS`] ticks together with a fresh rotation bias.

use super::{Controls, InputAgent, SessionEvent, AXIS_THRUST, AXIS_TURN};
use arc_gamepad_core::{RandomSource, SeededRng};
use serde::{Deserialize, Serialize};

pub const ACTION_SWITCH_TICKS: u64 = 180;
pub const EXPLORE_FLIP_TICKS: u64 = 90;
pub const ZIGZAG_SWING_TICKS: u64 = 30;
pub const PRIMARY_FIRE_TICKS: u64 = 15;
pub const SPECIAL_FIRE_TICKS: u64 = 120;

pub const PRIMARY_FIRE_HOLD_MS: f64 = 50.0;
pub const SPECIAL_FIRE_HOLD_MS: f64 = 100.0;
pub const STRAFE_HOLD_MS: f64 = 100.0;
/// A strafe fires when a draw lands above this (30% per draw).
pub const STRAFE_DRAW_THRESHOLD: f64 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorMode {
    Explore,
    Circle,
    Zigzag,
    Aggressive,
}

impl BehaviorMode {
    pub const ALL: [Self; 4] = [Self::Explore, Self::Circle, Self::Zigzag, Self::Aggressive];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explore => "explore",
            Self::Circle => "circle",
            Self::Zigzag => "zigzag",
            Self::Aggressive => "aggressive",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonLayout {
    pub primary_fire: usize,
    pub special_fire: usize,
    pub strafe_left: usize,
    pub strafe_right: usize,
}

impl ButtonLayout {
    /// Player one fires on 9/8; every other seat uses 3/2. Strafe is shared.
    pub fn for_player(player: usize) -> Self {
        let (primary_fire, special_fire) = if player == 0 { (9, 8) } else { (3, 2) };
        Self {
            primary_fire,
            special_fire,
            strafe_left: 5,
            strafe_right: 6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PolicyConfig {
    pub movement_enabled: bool,
    pub weapons_enabled: bool,
    pub layout: ButtonLayout,
}

impl PolicyConfig {
    pub fn for_player(player: usize) -> Self {
        Self {
            movement_enabled: true,
            weapons_enabled: true,
            layout: ButtonLayout::for_player(player),
        }
    }

    pub fn weapons_only(player: usize) -> Self {
        Self {
            movement_enabled: false,
            ..Self::for_player(player)
        }
    }
}

/// Tick counters; each grows by one per update and returns to zero when its
/// own trigger fires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickCounters {
    pub action: u64,
    pub fire: u64,
    pub special: u64,
    pub movement: u64,
}

pub struct PlayerStrategy {
    player: usize,
    name: String,
    config: PolicyConfig,
    counters: TickCounters,
    mode: BehaviorMode,
    bias: i8,
    rng: Box<dyn RandomSource>,
}

impl PlayerStrategy {
    pub fn new(player: usize, name: impl Into<String>, seed: u32) -> Self {
        Self::with_random(
            player,
            name,
            PolicyConfig::for_player(player),
            Box::new(SeededRng::new(seed)),
        )
    }

    pub fn with_random(
        player: usize,
        name: impl Into<String>,
        config: PolicyConfig,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            player,
            name: name.into(),
            config,
            counters: TickCounters::default(),
            mode: BehaviorMode::Explore,
            bias: 1,
            rng,
        }
    }

    pub fn with_config(mut self, config: PolicyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn counters(&self) -> TickCounters {
        self.counters
    }

    pub fn current_mode(&self) -> BehaviorMode {
        self.mode
    }

    pub fn bias(&self) -> i8 {
        self.bias
    }

    fn switch_mode(&mut self, controls: &mut Controls<'_>) {
        let from = self.mode;
        self.mode = BehaviorMode::ALL[self.rng.pick_index(BehaviorMode::ALL.len())];
        self.bias = if self.rng.next_unit() > 0.5 { 1 } else { -1 };
        tracing::debug!(
            player = self.player,
            tick = controls.tick(),
            from = from.as_str(),
            to = self.mode.as_str(),
            bias = self.bias,
            "mode switch"
        );
        controls.record(SessionEvent::ModeSwitch {
            tick: controls.tick(),
            player: self.player,
            from,
            to: self.mode,
            bias: self.bias,
        });
    }

    fn steer(&mut self, controls: &mut Controls<'_>) {
        let bias = f64::from(self.bias);
        match self.mode {
            BehaviorMode::Explore => {
                controls.set_axis(self.player, AXIS_TURN, 0.3 * bias);
                controls.set_axis(self.player, AXIS_THRUST, -0.7);
                if self.counters.movement >= EXPLORE_FLIP_TICKS {
                    self.counters.movement = 0;
                    self.bias = -self.bias;
                }
            }
            BehaviorMode::Circle => {
                controls.set_axis(self.player, AXIS_TURN, 0.6 * bias);
                controls.set_axis(self.player, AXIS_THRUST, -0.5);
            }
            BehaviorMode::Zigzag => {
                let swing = if (self.counters.movement / ZIGZAG_SWING_TICKS) % 2 == 0 {
                    1.0
                } else {
                    -1.0
                };
                controls.set_axis(self.player, AXIS_TURN, 0.8 * swing);
                controls.set_axis(self.player, AXIS_THRUST, -0.8);
            }
            BehaviorMode::Aggressive => {
                let turn = (self.rng.next_unit() - 0.5) * 2.0;
                controls.set_axis(self.player, AXIS_TURN, turn);
                controls.set_axis(self.player, AXIS_THRUST, -1.0);

                let layout = self.config.layout;
                if self.rng.next_unit() > STRAFE_DRAW_THRESHOLD {
                    controls.pulse(self.player, layout.strafe_left, STRAFE_HOLD_MS);
                } else if self.rng.next_unit() > STRAFE_DRAW_THRESHOLD {
                    controls.pulse(self.player, layout.strafe_right, STRAFE_HOLD_MS);
                }
            }
        }
    }

    fn fire_weapons(&mut self, controls: &mut Controls<'_>) {
        let layout = self.config.layout;
        if self.counters.fire >= PRIMARY_FIRE_TICKS {
            self.counters.fire = 0;
            controls.pulse(self.player, layout.primary_fire, PRIMARY_FIRE_HOLD_MS);
        }
        if self.counters.special >= SPECIAL_FIRE_TICKS {
            self.counters.special = 0;
            controls.pulse(self.player, layout.special_fire, SPECIAL_FIRE_HOLD_MS);
        }
    }
}

impl InputAgent for PlayerStrategy {
    fn player(&self) -> usize {
        self.player
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// Back to the initial state with a freshly seeded generator.
    fn reset(&mut self, seed: u32) {
        self.counters = TickCounters::default();
        self.mode = BehaviorMode::Explore;
        self.bias = 1;
        self.rng = Box::new(SeededRng::new(seed));
    }

    fn update(&mut self, controls: &mut Controls<'_>) {
        self.counters.action += 1;
        self.counters.fire += 1;
        self.counters.special += 1;
        self.counters.movement += 1;

        if self.counters.action >= ACTION_SWITCH_TICKS {
            self.counters.action = 0;
            self.switch_mode(controls);
        }

        if self.config.movement_enabled {
            self.steer(controls);
        }
        if self.config.weapons_enabled {
            self.fire_weapons(controls);
        }
    }

    fn mode(&self) -> Option<BehaviorMode> {
        Some(self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_gamepad_core::{GamepadRegistry, ManualClock, PulseQueue};
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Replays a fixed list of draws, then repeats the last one.
    struct Scripted {
        draws: VecDeque<f64>,
        last: f64,
    }

    impl Scripted {
        fn new(draws: &[f64]) -> Box<Self> {
            Box::new(Self {
                draws: draws.iter().copied().collect(),
                last: draws.last().copied().unwrap_or(0.0),
            })
        }
    }

    impl RandomSource for Scripted {
        fn next_unit(&mut self) -> f64 {
            self.draws.pop_front().unwrap_or(self.last)
        }
    }

    struct Rig {
        clock: Arc<ManualClock>,
        registry: GamepadRegistry,
        pulses: PulseQueue,
        events: Vec<SessionEvent>,
        tick: u64,
    }

    impl Rig {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new());
            let mut registry = GamepadRegistry::with_clock(clock.clone());
            registry.create_device(0, "Test Player 1");
            registry.create_device(1, "Test Player 2");
            Self {
                clock,
                registry,
                pulses: PulseQueue::new(),
                events: Vec::new(),
                tick: 0,
            }
        }

        fn step(&mut self, agent: &mut PlayerStrategy) {
            self.tick += 1;
            let now = self.clock.advance(16.0);
            self.pulses.release_due(&mut self.registry, now);
            let mut controls = Controls::new(
                &mut self.registry,
                &mut self.pulses,
                &mut self.events,
                self.tick,
                now,
            );
            agent.update(&mut controls);
        }

        fn axes(&self, slot: usize) -> [f64; 4] {
            *self.registry.get_device(slot).expect("device").axes()
        }

        fn pressed(&self, slot: usize, button: usize) -> bool {
            self.registry
                .get_device(slot)
                .and_then(|pad| pad.button(button))
                .is_some_and(|b| b.pressed)
        }

        fn pulses_on(&self, button: usize) -> usize {
            self.events
                .iter()
                .filter(|e| matches!(e, SessionEvent::Pulse { button: b, .. } if *b == button))
                .count()
        }
    }

    #[test]
    fn layouts_differ_per_player() {
        assert_eq!(ButtonLayout::for_player(0).primary_fire, 9);
        assert_eq!(ButtonLayout::for_player(0).special_fire, 8);
        assert_eq!(ButtonLayout::for_player(1).primary_fire, 3);
        assert_eq!(ButtonLayout::for_player(1).special_fire, 2);
    }

    #[test]
    fn fifteen_ticks_fire_exactly_one_primary_pulse() {
        let mut rig = Rig::new();
        let mut agent =
            PlayerStrategy::new(0, "Player 1", 1).with_config(PolicyConfig::weapons_only(0));

        for _ in 0..14 {
            rig.step(&mut agent);
        }
        assert!(rig.pulses.is_empty());
        assert!(!rig.pressed(0, 9));

        rig.step(&mut agent);
        assert_eq!(rig.pulses_on(9), 1);
        assert_eq!(rig.events.len(), 1);
        assert!(rig.pressed(0, 9));
        let pending = rig.pulses.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].button, 9);
        assert_eq!(pending[0].due_ms, 240.0 + PRIMARY_FIRE_HOLD_MS);
        // No movement output in weapons-only mode.
        assert_eq!(rig.axes(0), [0.0; 4]);

        // Released on the first tick at or past 290ms (tick 19, 304ms).
        for _ in 0..3 {
            rig.step(&mut agent);
            assert!(rig.pressed(0, 9));
        }
        rig.step(&mut agent);
        assert!(!rig.pressed(0, 9));
    }

    #[test]
    fn special_fire_every_120_ticks_for_player_two() {
        let mut rig = Rig::new();
        let mut agent =
            PlayerStrategy::new(1, "Player 2", 9).with_config(PolicyConfig::weapons_only(1));
        for _ in 0..240 {
            rig.step(&mut agent);
        }
        assert_eq!(rig.pulses_on(2), 2);
        assert_eq!(rig.pulses_on(3), 16);
        assert_eq!(rig.pulses_on(9), 0);
    }

    #[test]
    fn explore_steers_and_flips_every_90_ticks() {
        let mut rig = Rig::new();
        let mut agent = PlayerStrategy::new(0, "Player 1", 3).with_config(PolicyConfig {
            weapons_enabled: false,
            ..PolicyConfig::for_player(0)
        });

        rig.step(&mut agent);
        assert_eq!(rig.axes(0)[0], 0.3);
        assert_eq!(rig.axes(0)[1], -0.7);

        let mut flips = Vec::new();
        let mut bias = agent.bias();
        for tick in 2..=179u64 {
            rig.step(&mut agent);
            assert_eq!(agent.current_mode(), BehaviorMode::Explore);
            if agent.bias() != bias {
                flips.push(tick);
                bias = agent.bias();
            }
        }
        assert_eq!(flips, vec![90]);
        // Steering follows the flipped bias until the next flip.
        assert_eq!(rig.axes(0)[0], 0.3 * f64::from(bias));
    }

    #[test]
    fn explore_keeps_flipping_every_90_ticks_across_a_switch() {
        let mut rig = Rig::new();
        // tick 180: 0.1 -> explore again, 0.9 -> bias +1
        let mut agent = PlayerStrategy::with_random(
            0,
            "Player 1",
            PolicyConfig {
                weapons_enabled: false,
                ..PolicyConfig::for_player(0)
            },
            Scripted::new(&[0.1, 0.9]),
        );

        let mut flips = Vec::new();
        for tick in 1..=300u64 {
            rig.step(&mut agent);
            assert_eq!(agent.current_mode(), BehaviorMode::Explore, "tick {tick}");
            if agent.counters().movement == 0 {
                flips.push((tick, agent.bias()));
            } else {
                // On a flip tick the axis still carries the bias from before it.
                assert_eq!(rig.axes(0)[0], 0.3 * f64::from(agent.bias()), "tick {tick}");
            }
        }
        // The bias redrawn at tick 180 is flipped on that same tick.
        assert_eq!(flips, vec![(90, -1), (180, -1), (270, 1)]);
        assert!(rig.events.iter().any(|e| matches!(
            e,
            SessionEvent::ModeSwitch {
                tick: 180,
                to: BehaviorMode::Explore,
                bias: 1,
                ..
            }
        )));
    }

    #[test]
    fn mode_switch_every_180_ticks_uses_draws() {
        let mut rig = Rig::new();
        // mode draw 0.3 -> circle, bias draw 0.2 -> -1
        let mut agent = PlayerStrategy::with_random(
            0,
            "Player 1",
            PolicyConfig::for_player(0),
            Scripted::new(&[0.3, 0.2]),
        );
        for _ in 0..179 {
            rig.step(&mut agent);
        }
        assert_eq!(agent.current_mode(), BehaviorMode::Explore);
        assert_eq!(agent.counters().action, 179);

        rig.step(&mut agent);
        assert_eq!(agent.current_mode(), BehaviorMode::Circle);
        assert_eq!(agent.bias(), -1);
        assert_eq!(agent.counters().action, 0);
        assert_eq!(rig.axes(0)[0], -0.6);
        assert_eq!(rig.axes(0)[1], -0.5);
        assert!(rig.events.iter().any(|e| matches!(
            e,
            SessionEvent::ModeSwitch {
                tick: 180,
                from: BehaviorMode::Explore,
                to: BehaviorMode::Circle,
                bias: -1,
                ..
            }
        )));
    }

    #[test]
    fn zigzag_alternates_every_30_movement_ticks() {
        let mut rig = Rig::new();
        // 0.6 -> zigzag, 0.9 -> bias +1
        let mut agent = PlayerStrategy::with_random(
            0,
            "Player 1",
            PolicyConfig::for_player(0),
            Scripted::new(&[0.6, 0.9]),
        );
        for _ in 0..180 {
            rig.step(&mut agent);
        }
        assert_eq!(agent.current_mode(), BehaviorMode::Zigzag);

        for _ in 0..120 {
            rig.step(&mut agent);
            let movement = agent.counters().movement;
            let expected = if (movement / 30) % 2 == 0 { 0.8 } else { -0.8 };
            assert_eq!(rig.axes(0)[0], expected, "movement {movement}");
            assert_eq!(rig.axes(0)[1], -0.8);
        }
    }

    #[test]
    fn aggressive_strafes_left_before_right() {
        let mut rig = Rig::new();
        // switch: 0.9 -> aggressive, 0.9 -> bias +1
        // tick 180: turn 0.75 -> 0.5, left 0.8 -> strafe left
        let mut agent = PlayerStrategy::with_random(
            0,
            "Player 1",
            PolicyConfig::for_player(0),
            Scripted::new(&[0.9, 0.9, 0.75, 0.8, 0.25, 0.1, 0.95, 0.25, 0.1, 0.1]),
        );
        for _ in 0..180 {
            rig.step(&mut agent);
        }
        assert_eq!(agent.current_mode(), BehaviorMode::Aggressive);
        assert_eq!(rig.axes(0)[0], 0.5);
        assert_eq!(rig.axes(0)[1], -1.0);
        assert!(rig.pressed(0, 5));
        assert!(!rig.pressed(0, 6));

        // tick 181: turn 0.25 -> -0.5, left 0.1 misses, right 0.95 hits
        rig.step(&mut agent);
        assert_eq!(rig.axes(0)[0], -0.5);
        assert!(rig.pressed(0, 6));

        // tick 182: both miss, nothing new scheduled
        let before = rig.pulses_on(5) + rig.pulses_on(6);
        rig.step(&mut agent);
        assert_eq!(rig.pulses_on(5) + rig.pulses_on(6), before);
    }

    #[test]
    fn counters_and_modes_stay_bounded_over_1000_ticks() {
        let mut rig = Rig::new();
        let mut agent = PlayerStrategy::new(0, "Player 1", 0xA8C0_0001);
        let mut switches = 0;
        for _ in 0..1_000 {
            rig.step(&mut agent);
            let counters = agent.counters();
            assert!(counters.action < ACTION_SWITCH_TICKS);
            assert!(counters.fire < PRIMARY_FIRE_TICKS);
            assert!(counters.special < SPECIAL_FIRE_TICKS);
            assert!(BehaviorMode::ALL.contains(&agent.current_mode()));
            let axes = rig.axes(0);
            assert!(axes.iter().all(|a| (-1.0..=1.0).contains(a)));
            if counters.action == 0 {
                switches += 1;
            }
        }
        assert_eq!(switches, 1_000 / 180);
    }

    #[test]
    fn removed_device_does_not_stop_the_policy() {
        let mut rig = Rig::new();
        let mut agent = PlayerStrategy::new(0, "Player 1", 5);
        for _ in 0..10 {
            rig.step(&mut agent);
        }
        rig.registry.remove_device(0);
        for _ in 0..400 {
            rig.step(&mut agent);
        }
        assert!(rig.registry.get_device(0).is_none());
        assert!(rig.pulses_on(9) >= 27);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut rig = Rig::new();
        let mut agent = PlayerStrategy::new(0, "Player 1", 11);
        for _ in 0..500 {
            rig.step(&mut agent);
        }
        agent.reset(11);
        assert_eq!(agent.counters(), TickCounters::default());
        assert_eq!(agent.current_mode(), BehaviorMode::Explore);
        assert_eq!(agent.bias(), 1);
        assert_eq!(agent.name(), "Player 1");
        assert_eq!(agent.player(), 0);
    }
}
