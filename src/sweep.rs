use crate::runner::{run_simulation, write_report, PlayerSummary, SimulationConfig};
use crate::util::{seed_to_hex, unix_now};
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct SweepConfig {
    pub seeds: Vec<u32>,
    pub ticks: u64,
    pub tick_ms: f64,
    pub jobs: Option<usize>,
    pub out_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SweepRun {
    pub seed: u32,
    pub seed_hex: String,
    pub releases_fired: u64,
    pub players: Vec<PlayerSummary>,
}

/// Fraction of agent-ticks spent in each mode, across every run and player.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ModeShare {
    pub explore: f64,
    pub circle: f64,
    pub zigzag: f64,
    pub aggressive: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SweepReport {
    pub generated_unix_s: u64,
    pub ticks: u64,
    pub tick_ms: f64,
    pub jobs: Option<usize>,
    pub run_count: usize,
    pub mode_share: ModeShare,
    pub avg_mode_switches: f64,
    pub avg_pulses_per_player: f64,
    pub runs: Vec<SweepRun>,
}

pub fn run_sweep(config: SweepConfig) -> Result<SweepReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("sweep requires at least one seed"));
    }
    if config.ticks == 0 {
        return Err(anyhow!("sweep requires ticks > 0"));
    }
    if config.jobs == Some(0) {
        return Err(anyhow!("sweep --jobs must be >= 1 when provided"));
    }

    // The entry point is process-wide, so parallel runs read their own
    // registries instead of injecting.
    let run_one = |seed: &u32| -> Result<SweepRun> {
        let report = run_simulation(SimulationConfig {
            seed: *seed,
            ticks: config.ticks,
            tick_ms: config.tick_ms,
            sample_every: 0,
            inject: false,
        })
        .with_context(|| format!("sweep run failed for seed={}", seed_to_hex(*seed)))?;
        Ok(SweepRun {
            seed: report.seed,
            seed_hex: report.seed_hex,
            releases_fired: report.releases_fired,
            players: report.players,
        })
    };

    let results: Vec<Result<SweepRun>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| config.seeds.par_iter().map(run_one).collect())
    } else {
        config.seeds.par_iter().map(run_one).collect()
    };
    let runs = results.into_iter().collect::<Result<Vec<_>>>()?;

    let report = aggregate(&config, runs);
    if let Some(out_dir) = &config.out_dir {
        let path = out_dir.join("summary.json");
        write_report(&path, &report)?;
        tracing::info!(path = %path.display(), "wrote sweep summary");
    }
    Ok(report)
}

fn aggregate(config: &SweepConfig, runs: Vec<SweepRun>) -> SweepReport {
    let players: Vec<&PlayerSummary> = runs.iter().flat_map(|run| &run.players).collect();
    let agent_ticks: u64 = players.iter().map(|p| p.mode_ticks.total()).sum();
    let share = |pick: fn(&PlayerSummary) -> u64| {
        if agent_ticks == 0 {
            0.0
        } else {
            players.iter().map(|p| pick(p)).sum::<u64>() as f64 / agent_ticks as f64
        }
    };
    let mode_share = ModeShare {
        explore: share(|p| p.mode_ticks.explore),
        circle: share(|p| p.mode_ticks.circle),
        zigzag: share(|p| p.mode_ticks.zigzag),
        aggressive: share(|p| p.mode_ticks.aggressive),
    };

    let player_count = players.len().max(1) as f64;
    let avg_mode_switches =
        players.iter().map(|p| f64::from(p.mode_switches)).sum::<f64>() / player_count;
    let avg_pulses_per_player =
        players.iter().map(|p| f64::from(p.total_pulses())).sum::<f64>() / player_count;

    SweepReport {
        generated_unix_s: unix_now(),
        ticks: config.ticks,
        tick_ms: config.tick_ms,
        jobs: config.jobs,
        run_count: runs.len(),
        mode_share,
        avg_mode_switches,
        avg_pulses_per_player,
        runs,
    }
}
