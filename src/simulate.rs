use crate::battle::{BattleController, BattleOutcome};
use crate::config::EngineConfig;
use crate::driver::{run_battle, NullPresenter, RandomDecider};
use crate::error::BattleError;
use crate::model::{Scenario, ScenarioKind};
use crate::rng::SeededRandom;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::warn;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SimulationSummary {
    pub battles: usize,
    pub victories: usize,
    pub defeats: usize,
    pub captures: usize,
    pub escapes: usize,
    /// Battles abandoned by the driver (retry budget or step bound).
    pub stalled: usize,
}

impl SimulationSummary {
    fn record(&mut self, result: &Result<BattleOutcome, BattleError>) {
        self.battles += 1;
        match result {
            Ok(BattleOutcome::Victory) => self.victories += 1,
            Ok(BattleOutcome::Defeat) => self.defeats += 1,
            Ok(BattleOutcome::Captured) => self.captures += 1,
            Ok(BattleOutcome::Escaped) => self.escapes += 1,
            Err(_) => self.stalled += 1,
        }
    }

    /// Share of battles the player did not lose. Stalled battles count as losses.
    pub fn win_rate(&self) -> f64 {
        if self.battles == 0 {
            return 0.0;
        }
        (self.victories + self.captures + self.escapes) as f64 / self.battles as f64
    }
}

/// Plays one unattended battle with its own engine and decider seeds.
pub fn simulate_battle(
    scenario: &Scenario,
    engine_seed: u64,
    decider_seed: u64,
    config: &EngineConfig,
) -> Result<BattleOutcome, BattleError> {
    let rng = SeededRandom::new(engine_seed);
    let mut controller = match scenario.kind {
        ScenarioKind::Wild => BattleController::start_wild_battle(
            scenario.player.clone(),
            scenario.opponent[0].clone(),
            config.clone(),
            rng,
        )?,
        ScenarioKind::Trainer | ScenarioKind::Leader => BattleController::start_trainer_battle(
            scenario.player.clone(),
            scenario.opponent.clone(),
            scenario.kind == ScenarioKind::Leader,
            config.clone(),
            rng,
        )?,
    };
    let mut decider = RandomDecider::new(decider_seed);
    run_battle(&mut controller, &mut NullPresenter, &mut decider)
}

/// Runs `battles` independent battles in parallel. Battle `i` always gets the
/// same seeds for a given `seed`, so the summary is reproducible.
pub fn simulate_battles(
    scenario: &Scenario,
    battles: usize,
    seed: u64,
    config: &EngineConfig,
) -> SimulationSummary {
    let results: Vec<Result<BattleOutcome, BattleError>> = (0..battles)
        .into_par_iter()
        .map(|idx| {
            let mut battle_rng = SmallRng::seed_from_u64(seed ^ ((idx as u64) << 32));
            let engine_seed: u64 = battle_rng.gen();
            let decider_seed: u64 = battle_rng.gen();
            let result = simulate_battle(scenario, engine_seed, decider_seed, config);
            if let Err(err) = &result {
                warn!(battle = idx, %err, "battle abandoned");
            }
            result
        })
        .collect();

    let mut summary = SimulationSummary::default();
    for result in &results {
        summary.record(result);
    }
    summary
}

pub fn write_csv(summary: &SimulationSummary, path: &std::path::Path) -> anyhow::Result<()> {
    let mut out = String::from("battles,victories,defeats,captures,escapes,stalled,win_rate\n");
    out.push_str(&format!(
        "{},{},{},{},{},{},{:.4}",
        summary.battles,
        summary.victories,
        summary.defeats,
        summary.captures,
        summary.escapes,
        summary.stalled,
        summary.win_rate()
    ));
    std::fs::write(path, out)?;
    Ok(())
}
