//! End-to-end runs against real child processes.
//!
//! Uses the bundled `random_mover` engine and `/bin/sh` scripts, so these
//! only run on unix.

#![cfg(unix)]

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::time::Duration;

use elo_eval::{
    detect_rating_range, evaluate, CancelFlag, EngineError, EngineMatchPlayer, EngineSpec,
    EvalError, EvaluationReport, MatchConfig, MatchPlayer, MatchRunner, MoveBudget,
    ProtocolTimeouts, RatingRange, RunConfig, Strategy,
};

const RANDOM_MOVER: &str = env!("CARGO_BIN_EXE_random_mover");
const ELO_EVAL: &str = env!("CARGO_BIN_EXE_elo_eval");

/// Answers the handshake but never replies to `go`.
const SILENT: &str = r#"
while read line; do
  case "$line" in
    uci) echo "id name Silent"; echo uciok ;;
    isready) echo readyok ;;
    quit) exit 0 ;;
  esac
done
"#;

fn random_mover() -> EngineSpec {
    EngineSpec::new(RANDOM_MOVER)
}

fn script(body: &str) -> EngineSpec {
    EngineSpec::new("/bin/sh").with_args(["-c", body])
}

fn fast_timeouts() -> ProtocolTimeouts {
    ProtocolTimeouts {
        handshake: Duration::from_secs(5),
        quit_grace: Duration::from_millis(500),
    }
}

fn runner(games: u32, grace_ms: u64) -> MatchRunner {
    MatchRunner::new(MatchConfig {
        games,
        budget: MoveBudget::new(Duration::from_millis(10), Duration::from_millis(grace_ms)),
    })
}

#[test]
fn test_random_mover_match() {
    let mut player = EngineMatchPlayer::new(random_mover(), random_mover(), runner(2, 2_000))
        .with_timeouts(fast_timeouts());
    let result = player.play_match(1500).unwrap();
    assert_eq!(result.rating, 1500);
    assert_eq!(result.games, 2);
    assert_eq!(result.wins + result.draws + result.losses, 2);
}

#[test]
fn test_detects_range_from_reference() {
    let range = detect_rating_range(&random_mover(), fast_timeouts(), "UCI_Elo");
    assert_eq!(range, RatingRange { min: 1000, max: 2600 });

    // Unknown option falls back to the default range.
    let range = detect_rating_range(&random_mover(), fast_timeouts(), "Strength");
    assert_eq!(range, RatingRange::default());
}

#[test]
fn test_silent_candidate_loses_on_time() {
    let mut player = EngineMatchPlayer::new(script(SILENT), random_mover(), runner(2, 100))
        .with_timeouts(fast_timeouts());
    let result = player.play_match(1200).unwrap();
    assert_eq!(result.games, 2);
    assert_eq!(result.losses, 2);
}

#[test]
fn test_missing_candidate_aborts() {
    let mut player = EngineMatchPlayer::new(
        EngineSpec::new("/definitely/not/an/engine"),
        random_mover(),
        runner(2, 100),
    );
    let err = player.play_match(1500).unwrap_err();
    assert!(matches!(err, EngineError::Spawn { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_full_evaluation_writes_report() {
    let report_path =
        std::env::temp_dir().join(format!("elo_eval_process_{}.json", std::process::id()));
    let log_base = std::env::temp_dir().join(format!("elo_eval_games_{}", std::process::id()));
    let config = RunConfig {
        engine: random_mover(),
        reference: random_mover(),
        matches: 2,
        games_per_match: 2,
        movetime_ms: 10,
        strategy: Strategy::Linear,
        use_openings: true,
        opening_seed: Some(11),
        handshake_timeout_ms: 5_000,
        quit_grace_ms: 500,
        report: Some(report_path.clone()),
        game_log_dir: Some(log_base.clone()),
        ..RunConfig::default()
    };

    let report = evaluate(&config, CancelFlag::new()).unwrap();
    assert_eq!(report.range, RatingRange { min: 1000, max: 2600 });
    assert_eq!(
        report.matches.iter().map(|m| m.rating).collect::<Vec<_>>(),
        vec![1000, 2600]
    );
    assert_eq!(report.total_games, 4);
    assert!((0.0..=5000.0).contains(&report.rating));

    let loaded = EvaluationReport::load(&report_path).unwrap();
    let _ = std::fs::remove_file(&report_path);
    assert_eq!(loaded.matches, report.matches);
    assert!(report.matches.iter().all(|m| m.records.len() == 2));

    // One run directory holding 1-1, 1-2, 2-1 and 2-2.
    let run_dirs: Vec<_> = std::fs::read_dir(&log_base)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(run_dirs.len(), 1);
    let mut games: Vec<String> = std::fs::read_dir(&run_dirs[0])
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    games.sort();
    let first = std::fs::read_to_string(run_dirs[0].join("1-1.pgn")).unwrap();
    let _ = std::fs::remove_dir_all(&log_base);
    assert_eq!(games, vec!["1-1.pgn", "1-2.pgn", "2-1.pgn", "2-2.pgn"]);
    assert!(first.contains("[Round \"1.1\"]"));
}

#[test]
fn test_invalid_config_is_rejected_before_starting() {
    let config = RunConfig {
        engine: random_mover(),
        matches: 2,
        warmup: Some(2),
        ..RunConfig::default()
    };
    let err = evaluate(&config, CancelFlag::new()).unwrap_err();
    assert!(matches!(err, EvalError::Config(_)));
}

#[test]
fn test_interrupt_stops_after_current_game() {
    let mut child = Command::new(ELO_EVAL)
        .args([RANDOM_MOVER, "--reference", RANDOM_MOVER])
        .args(["--matches", "3", "--games", "200", "--movetime", "10"])
        .args(["--min-elo", "1500", "--max-elo", "1600"])
        .env("RUST_LOG", "elo_eval=info")
        .env("NO_COLOR", "1")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // Wait for the first finished game, then send SIGINT once.
    let mut stderr = BufReader::new(child.stderr.take().unwrap());
    let mut line = String::new();
    loop {
        line.clear();
        assert!(stderr.read_line(&mut line).unwrap() > 0, "no game finished");
        if line.contains("score ") {
            break;
        }
    }
    let sent = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let mut rest = String::new();
    stderr.read_to_string(&mut rest).unwrap();
    let status = child.wait().unwrap();
    let mut stdout = String::new();
    child.stdout.take().unwrap().read_to_string(&mut stdout).unwrap();

    assert!(rest.contains("interrupted"));
    assert!(status.success(), "stderr: {rest}");
    // The partial first match is reported; no further matches start.
    assert!(!rest.contains("match 2/3"));
    assert!(stdout.contains("Performance ELO"));
}
