use super::*;
use crate::error::EngineError;
use crate::estimator::expected_score;

/// Scores exactly what the Elo model predicts for a player of `strength`,
/// rounded to the nearest half point.
struct ModelPlayer {
    strength: f64,
    games: u32,
    played: Vec<i32>,
    empty_from: Option<usize>,
    fail_at: Option<usize>,
    cancel: Option<(usize, CancelFlag)>,
}

impl ModelPlayer {
    fn new(strength: f64, games: u32) -> Self {
        Self {
            strength,
            games,
            played: Vec::new(),
            empty_from: None,
            fail_at: None,
            cancel: None,
        }
    }
}

impl MatchPlayer for ModelPlayer {
    fn play_match(&mut self, rating: i32) -> Result<MatchResult, EngineError> {
        let index = self.played.len();
        self.played.push(rating);
        if self.fail_at == Some(index) {
            return Err(EngineError::Protocol {
                engine: "model".to_string(),
                message: "exited during setup".to_string(),
            });
        }
        if let Some((at, flag)) = &self.cancel {
            if *at == index {
                flag.cancel();
            }
        }
        let mut result = MatchResult::new(rating);
        if self.empty_from.is_some_and(|from| index >= from) {
            return Ok(result);
        }

        let e = expected_score(self.strength, f64::from(rating));
        let points = (2.0 * f64::from(self.games) * e).round() / 2.0;
        result.wins = points.floor() as u32;
        result.draws = if points.fract() > 0.0 { 1 } else { 0 };
        result.losses = self.games - result.wins - result.draws;
        result.games = self.games;
        Ok(result)
    }
}

fn full_range() -> RatingRange {
    RatingRange::new(800, 2800).unwrap()
}

#[test]
fn test_every_strategy_finds_the_model_strength() {
    for strategy in [Strategy::Adaptive, Strategy::Linear, Strategy::Bsearch] {
        let mut player = ModelPlayer::new(1650.0, 200);
        let report = Evaluator::new(strategy, full_range(), 10, 2)
            .run(&mut player)
            .unwrap();
        assert_eq!(report.matches.len(), 10);
        assert!(
            (report.rating - 1650.0).abs() <= 15.0,
            "{strategy}: {:.1}",
            report.rating
        );
    }
}

#[test]
fn test_adaptive_first_match_at_midpoint_then_closes_in() {
    let mut player = ModelPlayer::new(1650.0, 200);
    Evaluator::new(Strategy::Adaptive, full_range(), 10, 2)
        .run(&mut player)
        .unwrap();
    assert_eq!(player.played[0], 1800);
    let last = *player.played.last().unwrap();
    assert!((last - 1650).abs() <= 10, "last rating {last}");
}

#[test]
fn test_linear_schedule_is_fixed() {
    let mut player = ModelPlayer::new(2700.0, 10);
    Evaluator::new(Strategy::Linear, full_range(), 5, 0)
        .run(&mut player)
        .unwrap();
    assert_eq!(player.played, vec![800, 1300, 1800, 2300, 2800]);
}

#[test]
fn test_warmup_matches_are_flagged_and_excluded() {
    let mut player = ModelPlayer::new(1500.0, 20);
    let report = Evaluator::new(Strategy::Linear, full_range(), 5, 2)
        .run(&mut player)
        .unwrap();

    let flags: Vec<bool> = report.matches.iter().map(|m| m.warmup).collect();
    assert_eq!(flags, vec![true, true, false, false, false]);
    assert_eq!(report.warmup_excluded, 2);
    assert_eq!(report.total_games, 100);
    assert_eq!(report.rated_games, 60);

    let all: f64 = report.matches.iter().map(MatchResult::score).sum();
    let rated: f64 = report.matches[2..].iter().map(MatchResult::score).sum();
    assert_eq!(report.total_score, all);
    assert_eq!(report.rated_score, rated);

    let expected = Estimator::default()
        .estimate_matches(&report.matches[2..])
        .unwrap();
    assert!((report.rating - expected).abs() < 1e-9);
}

#[test]
fn test_no_warmup_exclusion_with_three_matches() {
    let mut player = ModelPlayer::new(1500.0, 10);
    let report = Evaluator::new(Strategy::Adaptive, full_range(), 3, 2)
        .run(&mut player)
        .unwrap();
    assert_eq!(report.warmup_excluded, 0);
    assert_eq!(report.rated_games, report.total_games);
}

#[test]
fn test_cancelled_before_start() {
    let cancel = CancelFlag::new();
    cancel.cancel();
    let mut player = ModelPlayer::new(1500.0, 10);
    let err = Evaluator::new(Strategy::Adaptive, full_range(), 4, 1)
        .with_cancel(cancel)
        .run(&mut player)
        .unwrap_err();
    assert!(matches!(err, EvalError::NoMatches));
    assert!(player.played.is_empty());
}

#[test]
fn test_cancel_keeps_finished_matches() {
    let cancel = CancelFlag::new();
    let mut player = ModelPlayer::new(1500.0, 10);
    player.cancel = Some((1, cancel.clone()));
    let report = Evaluator::new(Strategy::Linear, full_range(), 6, 0)
        .with_cancel(cancel)
        .run(&mut player)
        .unwrap();
    assert_eq!(report.matches.len(), 2);
}

#[test]
fn test_empty_match_is_not_recorded() {
    let mut player = ModelPlayer::new(1500.0, 10);
    player.empty_from = Some(2);
    let report = Evaluator::new(Strategy::Linear, full_range(), 6, 0)
        .run(&mut player)
        .unwrap();
    assert_eq!(report.matches.len(), 2);
    assert_eq!(report.total_games, 20);
}

#[test]
fn test_fatal_error_aborts_the_run() {
    let mut player = ModelPlayer::new(1500.0, 10);
    player.fail_at = Some(1);
    let err = Evaluator::new(Strategy::Adaptive, full_range(), 4, 1)
        .run(&mut player)
        .unwrap_err();
    assert!(matches!(err, EvalError::Engine(EngineError::Protocol { .. })));
    assert_eq!(player.played.len(), 2);
}

#[test]
fn test_report_save_load_and_summary() {
    let mut player = ModelPlayer::new(1900.0, 10);
    let report = Evaluator::new(Strategy::Bsearch, full_range(), 4, 1)
        .run(&mut player)
        .unwrap();

    let path = std::env::temp_dir().join(format!("elo_eval_report_{}.json", std::process::id()));
    report.save(&path).unwrap();
    let loaded = EvaluationReport::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.strategy, Strategy::Bsearch);
    assert_eq!(loaded.matches, report.matches);
    assert_eq!(loaded.warmup_excluded, report.warmup_excluded);
    assert!((loaded.rating - report.rating).abs() < 1e-6);

    let summary = report.summary();
    assert_eq!(summary.matches("(warmup)").count(), report.warmup_excluded);
    assert!(summary.contains("Total: "));
    assert!(summary.contains(&format!("Performance ELO: {:.0}", report.rating)));
}

#[test]
fn test_load_missing_report() {
    let err = EvaluationReport::load(Path::new("/nonexistent/report.json")).unwrap_err();
    assert!(matches!(err, EvalError::ReportIo { .. }));
}
