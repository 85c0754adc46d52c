//! elo_eval CLI
//!
//! Estimate an engine's rating from matches against a strength-limited
//! reference engine.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use elo_eval::{evaluate, CancelFlag, EngineSpec, EvalError, RunConfig, Strategy};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "elo_eval")]
#[command(about = "Estimate a UCI engine's rating against a strength-limited reference")]
struct Args {
    /// Path to the engine to evaluate
    engine: Option<String>,

    /// TOML run configuration; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of matches
    #[arg(short, long)]
    matches: Option<u32>,

    /// Games per match
    #[arg(short, long)]
    games: Option<u32>,

    /// Time per move in milliseconds
    #[arg(long)]
    movetime: Option<u64>,

    /// How each match's reference rating is chosen
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Lowest reference rating (default: read from the reference engine)
    #[arg(long)]
    min_elo: Option<i32>,

    /// Highest reference rating (default: read from the reference engine)
    #[arg(long)]
    max_elo: Option<i32>,

    /// Path to the reference engine
    #[arg(long, alias = "stockfish")]
    reference: Option<String>,

    /// Matches excluded from the final rating (default: 2)
    #[arg(long)]
    warmup: Option<u32>,

    /// Start games from random opening lines
    #[arg(long)]
    openings: bool,

    /// Seed for opening selection
    #[arg(long)]
    seed: Option<u64>,

    /// Write the JSON report here
    #[arg(long)]
    report: Option<PathBuf>,

    /// Save every game as PGN under this directory
    #[arg(long)]
    game_log_dir: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<RunConfig, EvalError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };

        if let Some(engine) = self.engine {
            config.engine = EngineSpec::new(engine);
        }
        if let Some(reference) = self.reference {
            config.reference = EngineSpec::new(reference);
        }
        if let Some(matches) = self.matches {
            config.matches = matches;
        }
        if let Some(games) = self.games {
            config.games_per_match = games;
        }
        if let Some(movetime) = self.movetime {
            config.movetime_ms = movetime;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if self.min_elo.is_some() {
            config.min_rating = self.min_elo;
        }
        if self.max_elo.is_some() {
            config.max_rating = self.max_elo;
        }
        if self.warmup.is_some() {
            config.warmup = self.warmup;
        }
        if self.openings {
            config.use_openings = true;
        }
        if self.seed.is_some() {
            config.opening_seed = self.seed;
        }
        if self.report.is_some() {
            config.report = self.report;
        }
        if self.game_log_dir.is_some() {
            config.game_log_dir = self.game_log_dir;
        }
        Ok(config)
    }
}

/// First Ctrl-C finishes the current game and reports what was played;
/// a second one exits at once.
fn install_interrupt_handler(cancel: &CancelFlag) {
    let cancel = cancel.clone();
    let installed = ctrlc::set_handler(move || {
        if cancel.is_cancelled() {
            std::process::exit(130);
        }
        warn!("interrupted, stopping after the current game");
        cancel.cancel();
    });
    if let Err(e) = installed {
        warn!(error = %e, "Ctrl-C handler not installed");
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "elo_eval=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cancel = CancelFlag::new();
    install_interrupt_handler(&cancel);
    let result = args
        .into_config()
        .and_then(|config| evaluate(&config, cancel));

    match result {
        Ok(report) => {
            println!();
            print!("{}", report.summary());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
