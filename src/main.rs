use anyhow::{anyhow, Context, Result};
use arc_autopilot::config::HarnessConfig;
use arc_autopilot::runner::{run_simulation, write_report, SimulationConfig};
use arc_autopilot::session::{RealtimeSession, Session};
use arc_autopilot::sweep::{run_sweep, SweepConfig};
use arc_autopilot::telemetry::{read_samples, TelemetryMonitor, Verdict};
use arc_autopilot::util::{parse_seed, parse_seed_csv, seed_sequence, seed_to_hex, unix_now};
use arc_gamepad_core::{enumeration, GamepadSnapshot};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "arc-autopilot")]
#[command(about = "Virtual gamepads driven by scripted players for automated two-player game runs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one deterministic two-player session and write a JSON report
    Simulate {
        #[arg(long)]
        seed: Option<String>,
        /// Defaults to AUTOPILOT_TEST_DURATION_MS worth of ticks
        #[arg(long)]
        ticks: Option<u64>,
        #[arg(long)]
        tick_ms: Option<u64>,
        /// Enumeration sample interval in ticks (0 disables sampling)
        #[arg(long)]
        sample_every: Option<u64>,
        /// Keep the process-wide enumeration entry point untouched
        #[arg(long, default_value_t = false)]
        no_inject: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run many seeds in parallel and aggregate mode and pulse statistics
    Sweep {
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[arg(long)]
        ticks: Option<u64>,
        #[arg(long)]
        tick_ms: Option<u64>,
        #[arg(long)]
        jobs: Option<usize>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Drive the virtual pads in real time and log what enumeration reports
    Watch {
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        duration_ms: Option<u64>,
        #[arg(long)]
        poll_ms: Option<u64>,
        #[arg(long)]
        tick_ms: Option<u64>,
    },
    /// Judge a JSON-lines telemetry capture against the minimum score
    Evaluate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        min_score: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let Cli { command } = Cli::parse();
    let defaults = HarnessConfig::from_env();

    match command {
        Commands::Simulate {
            seed,
            ticks,
            tick_ms,
            sample_every,
            no_inject,
            output,
        } => {
            let seed = match seed {
                Some(raw) => parse_seed(&raw)?,
                None => defaults.seed,
            };
            let harness = defaults.with_overrides(tick_ms, None, None);
            let ticks = ticks.unwrap_or_else(|| harness.duration_ticks());
            let sample_every = sample_every.unwrap_or_else(|| harness.poll_every_ticks());

            let report = run_simulation(SimulationConfig {
                seed,
                ticks,
                tick_ms: harness.tick_ms as f64,
                sample_every,
                inject: !no_inject,
            })?;
            let output_path = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "reports/simulate-{}-ticks{}.json",
                    seed_to_hex(seed).replace("0x", "seed"),
                    report.ticks
                ))
            });
            write_report(&output_path, &report)?;

            println!("seed={}", report.seed_hex);
            println!("ticks={}", report.ticks);
            println!("duration_ms={}", report.duration_ms);
            println!("injected={}", report.injected);
            for player in &report.players {
                println!(
                    "player={} name={} final_mode={} switches={} pulses={}",
                    player.player,
                    player.name,
                    player.final_mode.map_or("none", |mode| mode.as_str()),
                    player.mode_switches,
                    player.total_pulses()
                );
            }
            println!("releases_fired={}", report.releases_fired);
            println!("cancelled_at_stop={}", report.cancelled_at_stop);
            println!("samples={}", report.samples.len());
            println!("output={}", output_path.display());
        }
        Commands::Sweep {
            seeds,
            seed_start,
            seed_count,
            ticks,
            tick_ms,
            jobs,
            out_dir,
        } => {
            let seeds = if let Some(raw) = seeds {
                parse_seed_csv(&raw)?
            } else {
                let start = match seed_start {
                    Some(raw) => parse_seed(&raw)?,
                    None => defaults.seed,
                };
                seed_sequence(start, seed_count)
            };
            let harness = defaults.with_overrides(tick_ms, None, None);
            let ticks = ticks.unwrap_or_else(|| harness.duration_ticks());
            let out_dir =
                out_dir.unwrap_or_else(|| PathBuf::from(format!("sweeps/{}", unix_now())));

            let report = run_sweep(SweepConfig {
                seeds,
                ticks,
                tick_ms: harness.tick_ms as f64,
                jobs,
                out_dir: Some(out_dir.clone()),
            })?;

            println!("runs={}", report.run_count);
            println!("ticks={}", report.ticks);
            println!(
                "mode_share explore={:.3} circle={:.3} zigzag={:.3} aggressive={:.3}",
                report.mode_share.explore,
                report.mode_share.circle,
                report.mode_share.zigzag,
                report.mode_share.aggressive
            );
            println!("avg_mode_switches={:.2}", report.avg_mode_switches);
            println!("avg_pulses_per_player={:.2}", report.avg_pulses_per_player);
            println!("out_dir={}", out_dir.display());
        }
        Commands::Watch {
            seed,
            duration_ms,
            poll_ms,
            tick_ms,
        } => {
            let seed = match seed {
                Some(raw) => parse_seed(&raw)?,
                None => defaults.seed,
            };
            let harness = defaults.with_overrides(tick_ms, duration_ms, poll_ms);

            let running =
                RealtimeSession::start(Session::two_player(seed, harness.tick_ms as f64))?;
            let injection = running.registry().inject_scoped();
            let deadline = Instant::now() + Duration::from_millis(harness.test_duration_ms);
            let mut polls = 0u64;
            while Instant::now() < deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                thread::sleep(remaining.min(Duration::from_millis(harness.poll_ms)));
                polls += 1;
                for pad in enumeration::get_gamepads().iter().flatten() {
                    log_snapshot(pad);
                }
            }
            drop(injection);
            let session = running.stop()?;

            println!("seed={}", seed_to_hex(seed));
            println!("ticks={}", session.tick());
            println!("polls={polls}");
            println!("releases_fired={}", session.releases_fired());
        }
        Commands::Evaluate { input, min_score } => {
            let min_score = min_score.unwrap_or(defaults.min_score);
            let file =
                File::open(&input).with_context(|| format!("failed opening {}", input.display()))?;
            let samples = read_samples(BufReader::new(file))?;
            if samples.is_empty() {
                return Err(anyhow!("no telemetry samples in {}", input.display()));
            }

            let mut monitor = TelemetryMonitor::new();
            for sample in samples {
                monitor.observe(sample);
            }
            if !monitor.is_game_over() {
                tracing::warn!("capture ended before game over; using latest scores");
            }
            let verdict = Verdict::evaluate(monitor.final_scores(), min_score);
            println!("{verdict}");
            if !verdict.passed {
                std::process::exit(verdict.exit_code());
            }
        }
    }

    Ok(())
}

fn log_snapshot(pad: &GamepadSnapshot) {
    let pressed: Vec<usize> = pad
        .buttons
        .iter()
        .enumerate()
        .filter(|(_, button)| button.pressed)
        .map(|(index, _)| index)
        .collect();
    tracing::info!(
        index = pad.index,
        id = %pad.id,
        timestamp = pad.timestamp,
        turn = pad.axes[0],
        thrust = pad.axes[1],
        pressed = ?pressed,
        "gamepad"
    );
}
