pub mod battle;
pub mod battle_logger;
pub mod config;
pub mod driver;
pub mod error;
pub mod model;
pub mod rng;
pub mod sim;
pub mod simulate;
pub mod types;

pub mod prelude {
    pub use crate::battle::{
        ActionChoice, BallKind, BattleController, BattleEvent, BattleOutcome, BattleSession,
        BattleType, Decision, EffectKind, ForgetChoice, Phase, Side, StepStatus,
    };
    pub use crate::battle_logger::BattleLogger;
    pub use crate::config::EngineConfig;
    pub use crate::driver::{run_battle, DecisionProvider, Presenter, RandomDecider};
    pub use crate::error::BattleError;
    pub use crate::model::{Dex, MoveDefinition, Scenario, Species};
    pub use crate::rng::{RandomSource, ScriptedRandom, SeededRandom};
    pub use crate::sim::pokemon::Pokemon;
    pub use crate::sim::status::{StatusConditionId, StatusRegistry};
}

use crate::battle::BattleController;
use crate::battle_logger::BattleLogger;
use crate::config::{load_config, EngineConfig};
use crate::driver::{run_battle, RandomDecider};
use crate::model::{Scenario, ScenarioFile, ScenarioKind};
use crate::rng::SeededRandom;
use crate::simulate::{simulate_battles, write_csv};
use anyhow::Context;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub scenario_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub seed: u64,
    pub battles: usize,
    pub output_path: Option<PathBuf>,
    pub verbose: bool,
}

pub fn load_scenario(path: &Path, config: &EngineConfig) -> anyhow::Result<Scenario> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file at {}", path.display()))?;
    let parsed: ScenarioFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    parsed
        .build(config.max_party_size)
        .with_context(|| format!("Invalid scenario in {}", path.display()))
}

pub fn run(opts: CliOptions) -> anyhow::Result<()> {
    if opts.battles == 0 {
        anyhow::bail!("--battles must be > 0");
    }
    let config = match &opts.config_path {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let scenario = load_scenario(&opts.scenario_path, &config)?;

    if opts.battles == 1 {
        return play_single(&scenario, &opts, config);
    }

    let summary = simulate_battles(&scenario, opts.battles, opts.seed, &config);
    let output_path = opts
        .output_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("summary.csv"));
    write_csv(&summary, &output_path)?;
    println!(
        "Played {} battles: {} won, {} lost, {} captured, {} escaped ({:.1}% not lost). Wrote {}",
        summary.battles,
        summary.victories,
        summary.defeats,
        summary.captures,
        summary.escapes,
        summary.win_rate() * 100.0,
        output_path.display()
    );
    Ok(())
}

fn play_single(scenario: &Scenario, opts: &CliOptions, config: EngineConfig) -> anyhow::Result<()> {
    let rng = SeededRandom::new(opts.seed);
    let mut controller = match scenario.kind {
        ScenarioKind::Wild => BattleController::start_wild_battle(
            scenario.player.clone(),
            scenario.opponent[0].clone(),
            config,
            rng,
        )?,
        ScenarioKind::Trainer | ScenarioKind::Leader => BattleController::start_trainer_battle(
            scenario.player.clone(),
            scenario.opponent.clone(),
            scenario.kind == ScenarioKind::Leader,
            config,
            rng,
        )?,
    };
    let mut logger = BattleLogger::new(controller.session().battle_type.label()).echoing();
    let mut decider = RandomDecider::new(opts.seed.wrapping_add(1));
    let outcome = run_battle(&mut controller, &mut logger, &mut decider)?;
    println!("Outcome: {outcome:?}");

    if let Some(path) = &opts.output_path {
        let json = serde_json::to_string_pretty(&logger.to_json())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write battle log to {}", path.display()))?;
        println!("Wrote battle log to {}", path.display());
    }
    Ok(())
}
