//! Headless line wars runner CLI.
//!
//! Usage:
//! ```bash
//! # Agent session over stdin/stdout
//! linewars_headless run --seed 7
//!
//! # One scripted match, metrics as JSON on stdout
//! linewars_headless play --one greedy --two random --replay out.replay
//!
//! # Batch run for balance testing
//! linewars_headless batch --count 200 --output results/
//!
//! # Verify determinism
//! linewars_headless verify --seed 12345 --runs 5
//!
//! # Re-verify a replay
//! linewars_headless replay out.replay --verify
//! ```

use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use linewars_core::data::MatchConfig;
use linewars_core::replay::{Replay, ReplayPlayer};
use linewars_headless::batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
use linewars_headless::config_loader::load_or_default;
use linewars_headless::controllers::ControllerKind;
use linewars_headless::game_runner::{run_game, GameConfig, DEFAULT_MAX_TICKS};
use linewars_headless::runner::{HeadlessConfig, HeadlessRunner};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "linewars_headless")]
#[command(about = "Headless line wars runner for agents, batch runs and CI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Match configuration (RON); the built-in default when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a match over JSON lines on stdin/stdout
    Run {
        /// Seed of the first episode
        #[arg(short, long, default_value = "0")]
        seed: u64,
    },

    /// Play one match between two built-in controllers
    Play {
        /// Match seed
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Controller for player one
        #[arg(long, value_enum, default_value_t = ControllerKind::Greedy)]
        one: ControllerKind,

        /// Controller for player two
        #[arg(long, value_enum, default_value_t = ControllerKind::Greedy)]
        two: ControllerKind,

        /// Tick cap; an undecided match is a draw
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Save a replay of the match here
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Run many seeds in parallel and summarize win rates
    Batch {
        /// Number of games to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Seed of the first game
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Controller for player one
        #[arg(long, value_enum, default_value_t = ControllerKind::Greedy)]
        one: ControllerKind,

        /// Controller for player two
        #[arg(long, value_enum, default_value_t = ControllerKind::Greedy)]
        two: ControllerKind,

        /// Tick cap per game
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Output directory for batch_results.json
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Verify that repeated runs of one seed agree
    Verify {
        /// Seed to test
        #[arg(short, long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "3")]
        runs: u32,

        /// Controller for player one
        #[arg(long, value_enum, default_value_t = ControllerKind::Random)]
        one: ControllerKind,

        /// Controller for player two
        #[arg(long, value_enum, default_value_t = ControllerKind::Greedy)]
        two: ControllerKind,

        /// Tick cap per run
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,
    },

    /// Play back a recorded replay
    Replay {
        /// Replay file
        file: PathBuf,

        /// Only check the final hash
        #[arg(long)]
        verify: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries protocol output and JSON results
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Some(Commands::Run { seed }) => cmd_run(config, seed),
        Some(Commands::Play {
            seed,
            one,
            two,
            max_ticks,
            replay,
        }) => cmd_play(config, seed, [one, two], max_ticks, replay),
        Some(Commands::Batch {
            count,
            parallel,
            seed,
            one,
            two,
            max_ticks,
            output,
        }) => {
            let batch = BatchConfig {
                match_config: load_match_config(config),
                game_count: count,
                parallel_games: parallel,
                seed_start: seed,
                max_ticks,
                controllers: [one, two],
            };
            cmd_batch(batch, &output);
        }
        Some(Commands::Verify {
            seed,
            runs,
            one,
            two,
            max_ticks,
        }) => {
            let batch = BatchConfig::new(load_match_config(config), 1)
                .with_controllers(one, two)
                .with_max_ticks(max_ticks);
            cmd_verify(&batch, seed, runs);
        }
        Some(Commands::Replay { file, verify }) => cmd_replay(&file, verify),
        None => {
            // Default: agent session
            cmd_run(config, 0);
        }
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn load_match_config(path: Option<&Path>) -> MatchConfig {
    load_or_default(path).unwrap_or_else(|e| fail(format!("Failed to load config: {e}")))
}

/// Run an agent session on stdin/stdout
fn cmd_run(config: Option<&Path>, seed: u64) {
    tracing::info!(seed, "Starting agent session");

    let headless = HeadlessConfig {
        match_config: load_match_config(config),
        seed,
    };
    let mut runner =
        HeadlessRunner::new(headless).unwrap_or_else(|e| fail(format!("Failed to start: {e}")));

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = runner.run(stdin.lock(), BufWriter::new(stdout.lock())) {
        fail(format!("Session failed: {e}"));
    }
}

/// Play one match and print its metrics
fn cmd_play(
    config: Option<&Path>,
    seed: u64,
    controllers: [ControllerKind; 2],
    max_ticks: u64,
    replay_path: Option<PathBuf>,
) {
    let mut game = GameConfig::new(load_match_config(config), seed)
        .with_controllers(controllers[0], controllers[1])
        .with_max_ticks(max_ticks);
    if replay_path.is_some() {
        game = game.recording();
    }

    let result = run_game(game).unwrap_or_else(|e| fail(format!("Match failed: {e}")));

    if let (Some(path), Some(replay)) = (replay_path, &result.replay) {
        if let Err(e) = replay.save(&path) {
            fail(format!("Failed to save replay: {e}"));
        }
        eprintln!("Replay saved to: {}", path.display());
    }

    match serde_json::to_string_pretty(&result.metrics) {
        Ok(json) => println!("{json}"),
        Err(e) => fail(format!("Failed to serialize metrics: {e}")),
    }
}

/// Run batch of games for balance testing
fn cmd_batch(config: BatchConfig, output: &Path) {
    if let Err(e) = std::fs::create_dir_all(output) {
        fail(format!(
            "FATAL: Cannot create output directory '{}': {e}",
            output.display()
        ));
    }

    let results = run_batch(config);

    let results_path = BatchResults::default_path(output);
    if let Err(e) = results.save(&results_path) {
        fail(format!("FATAL: Failed to save results: {e}"));
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Throughput: {:.1} games/sec",
        results.games.len() as f64 / results.duration_seconds.max(0.001)
    );
    eprintln!("\nWin Rates:");
    for (player, rate) in &summary.win_rates {
        eprintln!("  {player}: {:.1}%", rate * 100.0);
    }
    eprintln!("  draws: {}", summary.draws);
    eprintln!("Average length: {:.0} ticks", summary.avg_duration_ticks);
    if let Some(player) = summary.dominant_player(0.1) {
        eprintln!("Imbalance: {player} wins noticeably more often");
    }

    for error in results.errors.iter().take(10) {
        eprintln!(
            "  Game {} (seed {}): {}",
            error.game_index, error.seed, error.message
        );
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}

/// Verify determinism
fn cmd_verify(config: &BatchConfig, seed: u64, runs: u32) {
    tracing::info!(seed, runs, "Verifying determinism");

    let hashes = verify_determinism(config, seed, runs)
        .unwrap_or_else(|e| fail(format!("FAIL: Error during verification: {e}")));

    if hashes.len() <= 1 {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        fail(format!(
            "FAIL: Non-determinism detected! {} distinct hashes: {hashes:016x?}",
            hashes.len()
        ));
    }
}

/// Replay a recorded match
fn cmd_replay(file: &Path, verify: bool) {
    if verify {
        tracing::info!("Verifying replay: {}", file.display());
    } else {
        tracing::info!("Playing replay: {}", file.display());
    }

    let replay =
        Replay::load(file).unwrap_or_else(|e| fail(format!("Failed to load replay: {e}")));

    eprintln!("Loaded replay:");
    eprintln!("  Seed: {}", replay.seed);
    eprintln!("  Inputs: {}", replay.inputs.len());
    eprintln!("  Duration: {} ticks", replay.duration());

    let mut player = ReplayPlayer::new(replay)
        .unwrap_or_else(|e| fail(format!("Failed to create replay player: {e}")));

    if verify {
        match player.verify() {
            Ok(()) => {
                eprintln!("PASS: Replay verification successful");
                eprintln!("  Hash: {:016x}", player.game().state_hash());
            }
            Err(e) => fail(format!("FAIL: {e}")),
        }
        return;
    }

    let total = player.replay().duration();
    let mut last_percent = 0;
    while player.advance() {
        let percent = player.current_tick() * 100 / total.max(1);
        if percent > last_percent && percent % 10 == 0 {
            eprintln!("Progress: {percent}%");
            last_percent = percent;
        }
    }

    let game = player.game();
    eprintln!("Replay complete at tick {}", player.current_tick());
    eprintln!("Final state hash: {:016x}", game.state_hash());
    eprintln!("Winner: {:?}", game.winner());
    if game.state_hash() != player.replay().final_hash {
        eprintln!("WARNING: final hash differs from the recorded one");
    }
}
