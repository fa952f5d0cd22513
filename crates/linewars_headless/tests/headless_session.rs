//! End-to-end tests of the headless runner against the public API.

use linewars_core::components::PlayerId;
use linewars_core::observation::Observation;
use linewars_core::replay::Replay;
use linewars_headless::batch::{run_batch, BatchConfig};
use linewars_headless::controllers::ControllerKind;
use linewars_headless::game_runner::{run_game, GameConfig};
use linewars_headless::protocol::Response;
use linewars_headless::runner::{HeadlessConfig, HeadlessRunner};
use linewars_test_utils::fixtures::{shipped_config, small_config};

fn session(seed: u64, lines: &[&str]) -> Vec<Response> {
    let mut runner = HeadlessRunner::new(HeadlessConfig {
        match_config: small_config(),
        seed,
    })
    .unwrap();

    let input = lines.join("\n");
    let mut output = Vec::new();
    runner.run(input.as_bytes(), &mut output).unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_observe_mirrors_for_player_two() {
    let responses = session(
        1,
        &[
            r#"{"cmd":"observe","player":"One"}"#,
            r#"{"cmd":"observe","player":"Two"}"#,
            r#"{"cmd":"quit"}"#,
        ],
    );

    let layers = |r: &Response| match r {
        Response::Observation {
            observation: Observation::Layers { layers, .. },
            ..
        } => layers.clone(),
        other => panic!("expected layers, got {other:?}"),
    };
    assert_eq!(layers(&responses[1]), layers(&responses[2]));
}

#[test]
fn test_same_seed_sessions_agree() {
    let script = [
        r#"{"cmd":"step","player":"One","action":2,"intensity":0.0}"#,
        r#"{"cmd":"step","player":"Two","action":2,"intensity":0.9}"#,
        r#"{"cmd":"tick","count":40}"#,
        r#"{"cmd":"hash"}"#,
    ];
    let hash = |responses: &[Response]| match responses.last() {
        Some(Response::Hash { hash, .. }) => *hash,
        other => panic!("expected hash, got {other:?}"),
    };

    let a = session(8, &script);
    let b = session(8, &script);
    assert_eq!(hash(&a), hash(&b));
}

#[test]
fn test_status_after_spawn() {
    let responses = session(
        2,
        &[
            r#"{"cmd":"step","player":"One","action":2,"intensity":0.0}"#,
            r#"{"cmd":"status"}"#,
        ],
    );

    let Response::Status { tick, players, .. } = &responses[2] else {
        panic!("expected status, got {:?}", responses[2]);
    };
    assert_eq!(*tick, 1);
    assert_eq!(players[0].units, 1);
    assert_eq!(players[0].gold, 490);
    assert_eq!(players[1].units, 0);
}

#[test]
fn test_small_lane_match_resolves() {
    let result = run_game(
        GameConfig::new(small_config(), 4)
            .with_controllers(ControllerKind::Greedy, ControllerKind::Idle)
            .with_max_ticks(5_000)
            .recording(),
    )
    .unwrap();

    assert_eq!(result.metrics.winner, Some(PlayerId::One));
    let replay = result.replay.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.replay");
    replay.save(&path).unwrap();
    assert!(Replay::load(&path).unwrap().verify().is_ok());
}

#[test]
fn test_batch_on_shipped_config() {
    let results = run_batch(
        BatchConfig::new(shipped_config(), 4)
            .with_seed(10)
            .with_controllers(ControllerKind::Greedy, ControllerKind::Random)
            .with_max_ticks(1_000),
    );

    assert!(results.errors.is_empty());
    assert_eq!(results.summary.total_games, 4);
    let decided: u32 = results.summary.wins.values().sum();
    assert_eq!(decided + results.summary.draws, 4);
}
