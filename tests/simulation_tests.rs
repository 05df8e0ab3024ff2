use pokemon_turn_engine::battle::{BattleController, BattleOutcome};
use pokemon_turn_engine::battle_logger::BattleLogger;
use pokemon_turn_engine::config::EngineConfig;
use pokemon_turn_engine::driver::{run_battle, RandomDecider};
use pokemon_turn_engine::load_scenario;
use pokemon_turn_engine::model::{ScenarioFile, ScenarioKind};
use pokemon_turn_engine::rng::SeededRandom;
use pokemon_turn_engine::simulate::{simulate_battle, simulate_battles};
use std::path::PathBuf;

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/demo_scenario.json")
}

#[test]
fn demo_scenario_loads() {
    let scenario = load_scenario(&demo_path(), &EngineConfig::default()).unwrap();
    assert_eq!(scenario.kind, ScenarioKind::Wild);
    assert_eq!(scenario.player.len(), 2);
    assert_eq!(scenario.opponent.len(), 1);
    assert!(scenario.player.iter().all(|pokemon| !pokemon.moves.is_empty()));
}

#[test]
fn demo_battle_runs_to_completion_with_a_log() {
    let scenario = load_scenario(&demo_path(), &EngineConfig::default()).unwrap();
    for seed in 0..20u64 {
        let mut controller = BattleController::start_wild_battle(
            scenario.player.clone(),
            scenario.opponent[0].clone(),
            EngineConfig::default(),
            SeededRandom::new(seed),
        )
        .unwrap();
        let mut logger = BattleLogger::new("wild");
        let mut decider = RandomDecider::new(seed + 1);
        let outcome = run_battle(&mut controller, &mut logger, &mut decider).unwrap();

        assert_eq!(controller.outcome(), Some(outcome));
        assert_eq!(logger.dialogue()[0], "A wild Oddish appeared!");
        let last = logger.log_lines().last().cloned().unwrap_or_default();
        if outcome == BattleOutcome::Defeat {
            assert_eq!(last, "|win|p2");
        } else {
            assert_eq!(last, "|win|p1");
        }
        let roster = controller.into_roster();
        assert!(roster.iter().all(|pokemon| pokemon.volatile_status.is_none()));
    }
}

#[test]
fn same_seeds_replay_the_same_battle() {
    let scenario = load_scenario(&demo_path(), &EngineConfig::default()).unwrap();
    let config = EngineConfig::default();
    for seed in 0..10u64 {
        assert_eq!(
            simulate_battle(&scenario, seed, seed * 7 + 3, &config),
            simulate_battle(&scenario, seed, seed * 7 + 3, &config)
        );
    }
}

#[test]
fn simulation_summary_is_reproducible() {
    let scenario = load_scenario(&demo_path(), &EngineConfig::default()).unwrap();
    let config = EngineConfig::default();
    let first = simulate_battles(&scenario, 64, 42, &config);
    let second = simulate_battles(&scenario, 64, 42, &config);
    assert_eq!(first, second);
    assert_eq!(first.battles, 64);
    assert_eq!(
        first.victories + first.defeats + first.captures + first.escapes + first.stalled,
        64
    );
    assert_eq!(first.stalled, 0);
}

#[test]
fn wild_scenario_with_two_opponents_is_rejected() {
    let raw = r#"{
        "dex": {
            "moves": [{ "name": "Tackle", "type": "normal", "category": "physical", "power": 40, "pp": 35 }],
            "species": [{
                "name": "Rattata", "types": ["normal"],
                "base_stats": { "hp": 30, "attack": 56, "defense": 35, "sp_attack": 25, "sp_defense": 35, "speed": 72 },
                "catch_rate": 255, "base_exp": 51, "growth_rate": "medium_fast",
                "learnset": [{ "level": 1, "move": "Tackle" }]
            }]
        },
        "player": [{ "species": "Rattata", "level": 5 }],
        "opponent": [{ "species": "Rattata", "level": 3 }, { "species": "Rattata", "level": 4 }]
    }"#;
    let file: ScenarioFile = serde_json::from_str(raw).unwrap();
    assert!(file.clone().build(6).is_err());

    let mut trainer = file;
    trainer.kind = ScenarioKind::Trainer;
    let scenario = trainer.build(6).unwrap();
    assert_eq!(scenario.opponent[1].level, 4);
    assert_eq!(scenario.player[0].moves[0].name(), "Tackle");
}
