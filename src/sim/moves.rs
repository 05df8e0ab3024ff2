//! Single-move resolution: accuracy, primary effect and secondary effects.

use crate::config::EngineConfig;
use crate::model::{MoveCategory, MoveDefinition, MoveStatEffect, MoveTarget};
use crate::rng::RandomSource;
use crate::sim::damage::DamageDescription;
use crate::sim::pokemon::Pokemon;
use crate::sim::stats::{accuracy_multiplier, Stat};
use crate::sim::status::StatusRegistry;
use tracing::trace;

/// Accuracy check for one use of `move_def`.
///
/// Both the accuracy and the evasion stage are read from the attacker; the
/// target's evasion never enters the roll.
pub fn move_hits(move_def: &MoveDefinition, attacker: &Pokemon, rng: &mut dyn RandomSource) -> bool {
    if move_def.always_hit {
        return true;
    }
    let roll = rng.uniform_float(0.0, 100.0);
    let mut accuracy = move_def.accuracy as f32;

    let accuracy_stage = attacker.stat_stages.get(Stat::Accuracy);
    let evasion_stage = attacker.stat_stages.get(Stat::Evasion);

    if accuracy_stage > 0 {
        accuracy *= accuracy_multiplier(accuracy_stage);
    } else {
        accuracy /= accuracy_multiplier(accuracy_stage);
    }
    if evasion_stage > 0 {
        accuracy /= accuracy_multiplier(evasion_stage);
    } else {
        accuracy *= accuracy_multiplier(evasion_stage);
    }

    trace!(roll, accuracy, "accuracy roll");
    roll < accuracy
}

/// Applies boosts (each to its own target) and statuses (to `scope`).
pub fn apply_stat_effect(
    attacker: &mut Pokemon,
    target: &mut Pokemon,
    effect: &MoveStatEffect,
    scope: MoveTarget,
    registry: &StatusRegistry,
    rng: &mut dyn RandomSource,
) {
    for boost in &effect.boostings {
        match boost.target {
            MoveTarget::Me => attacker.apply_boost(boost.stat, boost.boost),
            MoveTarget::Other => target.apply_boost(boost.stat, boost.boost),
        }
    }

    if let Some(status) = effect.status {
        match scope {
            MoveTarget::Me => attacker.set_status(status, registry, rng),
            MoveTarget::Other => target.set_status(status, registry, rng),
        };
    }

    if let Some(volatile) = effect.volatile_status {
        match scope {
            MoveTarget::Me => attacker.set_volatile_status(volatile, registry, rng),
            MoveTarget::Other => target.set_volatile_status(volatile, registry, rng),
        };
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PrimaryOutcome {
    /// Stat-effect move; narration sits in the combatants' queues.
    StatEffect,
    Damage(DamageDescription),
}

pub fn resolve_primary(
    move_def: &MoveDefinition,
    attacker: &mut Pokemon,
    target: &mut Pokemon,
    registry: &StatusRegistry,
    config: &EngineConfig,
    rng: &mut dyn RandomSource,
) -> PrimaryOutcome {
    match move_def.category {
        MoveCategory::Stats => {
            apply_stat_effect(attacker, target, &move_def.effects, move_def.target, registry, rng);
            PrimaryOutcome::StatEffect
        }
        MoveCategory::Physical | MoveCategory::Special => {
            let description = target.receive_damage(
                attacker,
                move_def,
                config.critical_hit_chance,
                config.critical_hit_multiplier,
                rng,
            );
            PrimaryOutcome::Damage(description)
        }
    }
}

/// Rolls every secondary effect in declared order. Returns how many landed.
pub fn resolve_secondary_effects(
    move_def: &MoveDefinition,
    attacker: &mut Pokemon,
    target: &mut Pokemon,
    registry: &StatusRegistry,
    rng: &mut dyn RandomSource,
) -> usize {
    let mut applied = 0;
    for secondary in &move_def.secondary_effects {
        let receiver_alive = match secondary.target {
            MoveTarget::Me => !attacker.is_fainted(),
            MoveTarget::Other => !target.is_fainted(),
        };
        if !receiver_alive {
            continue;
        }
        let roll = rng.uniform_int(0, 99);
        trace!(roll, chance = secondary.chance, "secondary effect roll");
        if roll < i32::from(secondary.chance) {
            apply_stat_effect(attacker, target, &secondary.effect, secondary.target, registry, rng);
            applied += 1;
        }
    }
    applied
}
