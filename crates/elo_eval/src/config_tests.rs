use super::*;

fn with_engine() -> RunConfig {
    RunConfig {
        engine: EngineSpec::new("./my_engine"),
        ..RunConfig::default()
    }
}

#[test]
fn test_defaults() {
    let config = RunConfig::default();
    assert_eq!(config.matches, 6);
    assert_eq!(config.games_per_match, 10);
    assert_eq!(config.strategy, Strategy::Adaptive);
    assert_eq!(config.reference.program, "stockfish");
    assert_eq!(config.rating_option, "UCI_Elo");
    assert_eq!(config.game_log_dir, None);
    assert_eq!(config.budget().limit(), Duration::from_millis(2_100));
    // No engine configured yet.
    assert!(config.validate().is_err());
    assert!(with_engine().validate().is_ok());
    assert_eq!(with_engine().resolved_warmup().unwrap(), 2);
}

#[test]
fn test_partial_toml() {
    let config = RunConfig::from_toml(
        r#"
        matches = 4
        strategy = "bsearch"
        min_rating = 1200
        use_openings = true

        [engine]
        program = "/opt/engines/candidate"
        args = ["--threads", "1"]
        "#,
    )
    .unwrap();

    assert_eq!(config.matches, 4);
    assert_eq!(config.strategy, Strategy::Bsearch);
    assert_eq!(config.min_rating, Some(1200));
    assert!(config.use_openings);
    assert_eq!(config.engine.args, vec!["--threads", "1"]);
    // Untouched keys keep their defaults.
    assert_eq!(config.games_per_match, 10);
    assert_eq!(config.reference, EngineSpec::new("stockfish"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_unknown_keys_rejected() {
    assert!(RunConfig::from_toml("games = 10").is_err());
    assert!(RunConfig::from_toml("strategy = \"random\"").is_err());
}

#[test]
fn test_invalid_configs() {
    let cases = [
        RunConfig {
            matches: 0,
            ..with_engine()
        },
        RunConfig {
            games_per_match: 0,
            ..with_engine()
        },
        RunConfig {
            matches: 3,
            warmup: Some(3),
            ..with_engine()
        },
        RunConfig {
            min_rating: Some(2500),
            max_rating: Some(1500),
            ..with_engine()
        },
        RunConfig {
            reference: EngineSpec::new(" "),
            ..with_engine()
        },
    ];
    for config in cases {
        assert!(
            matches!(config.validate(), Err(ConfigError::Invalid(_))),
            "{config:?}"
        );
    }
}

#[test]
fn test_rating_range_fills_missing_bound() {
    let detected = RatingRange::new(1320, 3190).unwrap();
    let config = RunConfig {
        max_rating: Some(2000),
        ..with_engine()
    };
    assert!(!config.has_explicit_range());
    assert_eq!(
        config.rating_range(detected).unwrap(),
        RatingRange { min: 1320, max: 2000 }
    );

    let inverted = RunConfig {
        min_rating: Some(3500),
        ..with_engine()
    };
    assert!(inverted.rating_range(detected).is_err());
}

#[test]
fn test_load_missing_file() {
    let err = RunConfig::load(Path::new("/nonexistent/elo_eval.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_game_log_dir_from_toml() {
    let config = RunConfig::from_toml(r#"game_log_dir = "logs/pgn""#).unwrap();
    assert_eq!(config.game_log_dir, Some(PathBuf::from("logs/pgn")));
}
