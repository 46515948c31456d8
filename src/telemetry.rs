//! Game-side telemetry and the pass/fail verdict built from it.
//!
//! The game exposes five values (two scores, the game-over flag and one
//! destroyed flag per player). Samples arrive as JSON objects using the game's
//! own field names; missing or `null` fields read as zero/false.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::io::BufRead;

/// Scores are plain JSON numbers as the game reports them; fractional or
/// negative values are kept and judged, not rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    #[serde(default, deserialize_with = "null_as_default")]
    pub score_p1: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score_p2: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_over: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub p1_dead: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub p2_dead: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One telemetry sample per non-blank line.
pub fn read_samples(reader: impl BufRead) -> Result<Vec<TelemetrySample>> {
    let mut samples = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed reading telemetry line {}", line_no + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let sample = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid telemetry on line {}", line_no + 1))?;
        samples.push(sample);
    }
    Ok(samples)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TelemetryEvent {
    ScoresChanged { p1: f64, p2: f64 },
    PlayerDestroyed { player: u8 },
    GameOver { p1: f64, p2: f64 },
}

/// Follows successive samples until the game reports it is over.
#[derive(Clone, Debug, Default)]
pub struct TelemetryMonitor {
    last: TelemetrySample,
    final_scores: Option<(f64, f64)>,
    samples_seen: usize,
}

impl TelemetryMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignores everything after game over; the final scores are frozen then.
    pub fn observe(&mut self, sample: TelemetrySample) -> Vec<TelemetryEvent> {
        if self.is_game_over() {
            return Vec::new();
        }
        let mut events = Vec::new();

        if (sample.score_p1, sample.score_p2) != (self.last.score_p1, self.last.score_p2) {
            tracing::info!(p1 = sample.score_p1, p2 = sample.score_p2, "scores");
            events.push(TelemetryEvent::ScoresChanged {
                p1: sample.score_p1,
                p2: sample.score_p2,
            });
        }
        if sample.p1_dead && !self.last.p1_dead {
            tracing::info!("player 1 destroyed");
            events.push(TelemetryEvent::PlayerDestroyed { player: 1 });
        }
        if sample.p2_dead && !self.last.p2_dead {
            tracing::info!("player 2 destroyed");
            events.push(TelemetryEvent::PlayerDestroyed { player: 2 });
        }
        if sample.game_over {
            tracing::info!("game over detected");
            self.final_scores = Some((sample.score_p1, sample.score_p2));
            events.push(TelemetryEvent::GameOver {
                p1: sample.score_p1,
                p2: sample.score_p2,
            });
        }

        self.last = sample;
        self.samples_seen += 1;
        events
    }

    pub fn is_game_over(&self) -> bool {
        self.final_scores.is_some()
    }

    pub fn samples_seen(&self) -> usize {
        self.samples_seen
    }

    /// Scores at game over, or the latest scores if the game is still running.
    pub fn final_scores(&self) -> (f64, f64) {
        self.final_scores
            .unwrap_or((self.last.score_p1, self.last.score_p2))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Verdict {
    pub score_p1: f64,
    pub score_p2: f64,
    pub min_score: u64,
    pub passed: bool,
    pub failures: Vec<String>,
}

impl Verdict {
    /// Passes when both players reach `min_score`.
    pub fn evaluate(scores: (f64, f64), min_score: u64) -> Self {
        let (score_p1, score_p2) = scores;
        let failures: Vec<String> = [(1, score_p1), (2, score_p2)]
            .into_iter()
            .filter(|(_, score)| *score < min_score as f64)
            .map(|(player, score)| format!("Player {player} score too low ({score} < {min_score})"))
            .collect();
        Self {
            score_p1,
            score_p2,
            min_score,
            passed: failures.is_empty(),
            failures,
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "player_1_score={}", self.score_p1)?;
        writeln!(f, "player_2_score={}", self.score_p2)?;
        writeln!(f, "min_score={}", self.min_score)?;
        write!(f, "result={}", if self.passed { "PASSED" } else { "FAILED" })?;
        for failure in &self.failures {
            write!(f, "\nfailure={failure}")?;
        }
        Ok(())
    }
}
