use crate::util::parse_seed;
use std::env;

pub const DEFAULT_TICK_MS: u64 = 16;
pub const DEFAULT_TEST_DURATION_MS: u64 = 30_000;
pub const DEFAULT_MIN_SCORE: u64 = 100;
pub const DEFAULT_SEED: u32 = 0xA8C0_0001;
pub const DEFAULT_POLL_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    pub tick_ms: u64,
    pub test_duration_ms: u64,
    pub min_score: u64,
    pub seed: u32,
    pub poll_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            test_duration_ms: DEFAULT_TEST_DURATION_MS,
            min_score: DEFAULT_MIN_SCORE,
            seed: DEFAULT_SEED,
            poll_ms: DEFAULT_POLL_MS,
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        let tick_ms = read_env_u64("AUTOPILOT_TICK_MS", DEFAULT_TICK_MS);
        let test_duration_ms = read_env_u64("AUTOPILOT_TEST_DURATION_MS", DEFAULT_TEST_DURATION_MS);
        let mut poll_ms = read_env_u64("AUTOPILOT_POLL_MS", DEFAULT_POLL_MS);

        if poll_ms > test_duration_ms {
            tracing::warn!(
                "AUTOPILOT_POLL_MS ({}) > AUTOPILOT_TEST_DURATION_MS ({}). Polling once at the end.",
                poll_ms,
                test_duration_ms
            );
            poll_ms = test_duration_ms;
        }

        Self {
            tick_ms,
            test_duration_ms,
            min_score: read_env_u64_allow_zero("AUTOPILOT_MIN_SCORE", DEFAULT_MIN_SCORE),
            seed: read_env_seed("AUTOPILOT_SEED", DEFAULT_SEED),
            poll_ms,
        }
    }

    /// Layers command-line values over this config. The tick period is at least
    /// 1ms and the poll interval never exceeds the test duration.
    pub fn with_overrides(
        mut self,
        tick_ms: Option<u64>,
        test_duration_ms: Option<u64>,
        poll_ms: Option<u64>,
    ) -> Self {
        self.tick_ms = tick_ms.unwrap_or(self.tick_ms).max(1);
        self.test_duration_ms = test_duration_ms.unwrap_or(self.test_duration_ms);
        self.poll_ms = poll_ms
            .unwrap_or(self.poll_ms)
            .clamp(1, self.test_duration_ms.max(1));
        self
    }

    /// Number of ticks that cover the configured test duration.
    pub fn duration_ticks(&self) -> u64 {
        ticks_for(self.test_duration_ms, self.tick_ms)
    }

    /// Ticks between two enumeration samples; at least one.
    pub fn poll_every_ticks(&self) -> u64 {
        ticks_for(self.poll_ms, self.tick_ms).max(1)
    }
}

pub fn ticks_for(duration_ms: u64, tick_ms: u64) -> u64 {
    duration_ms.div_ceil(tick_ms.max(1))
}

pub(crate) fn read_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_u64_allow_zero(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn read_env_seed(name: &str, default: u32) -> u32 {
    match env::var(name) {
        Ok(raw) => parse_seed(&raw).unwrap_or_else(|err| {
            tracing::warn!("{name}={raw:?} is not a valid seed ({err}). Using default.");
            default
        }),
        Err(_) => default,
    }
}
