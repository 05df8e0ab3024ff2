use crate::model::{MoveCategory, MoveDefinition};
use crate::rng::RandomSource;
use crate::sim::pokemon::Pokemon;
use crate::types::type_effectiveness;
use tracing::trace;

/// What a damaging hit did, for narration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageDescription {
    pub damage: u32,
    /// Multiplier applied for a critical hit (1.0 when not critical).
    pub critical: f32,
    pub type_effectiveness: f32,
    pub fainted: bool,
}

impl DamageDescription {
    pub fn is_critical(&self) -> bool {
        self.critical > 1.0
    }
}

pub(crate) fn compute_base_damage(level: u32, power: u32, attack: u32, defense: u32) -> f32 {
    let ratio = attack as f32 / defense.max(1) as f32;
    let level_factor = (2 * level / 5 + 2) as f32;
    level_factor * power as f32 * ratio / 50.0 + 2.0
}

/// Rolls critical hit then variance, in that order, and returns the damage
/// without touching the defender.
pub fn compute_damage(
    attacker: &Pokemon,
    defender: &Pokemon,
    move_def: &MoveDefinition,
    critical_chance: f32,
    critical_multiplier: f32,
    rng: &mut dyn RandomSource,
) -> DamageDescription {
    let critical = if rng.uniform_float(0.0, 100.0) < critical_chance {
        critical_multiplier
    } else {
        1.0
    };
    let effectiveness = type_effectiveness(move_def.move_type, &defender.species.types);
    let variance = rng.uniform_float(0.85, 1.0);

    let (attack, defense) = match move_def.category {
        MoveCategory::Special => (attacker.sp_attack(), defender.sp_defense()),
        MoveCategory::Physical | MoveCategory::Stats => (attacker.attack(), defender.defense()),
    };
    let damage = if effectiveness == 0.0 {
        0
    } else {
        let base = compute_base_damage(attacker.level, move_def.power, attack, defense);
        (base * variance * effectiveness * critical).floor() as u32
    };
    trace!(
        attack,
        defense,
        power = move_def.power,
        variance,
        effectiveness,
        critical,
        damage,
        "damage roll"
    );
    DamageDescription {
        damage,
        critical,
        type_effectiveness: effectiveness,
        fainted: false,
    }
}

/// Narration lines that follow a damaging hit.
pub fn damage_messages(description: &DamageDescription) -> Vec<&'static str> {
    let mut lines = Vec::new();
    if description.is_critical() {
        lines.push("A critical hit!");
    }
    if description.type_effectiveness == 0.0 {
        lines.push("It had no effect...");
    } else if description.type_effectiveness > 1.0 {
        lines.push("It's super effective!");
    } else if description.type_effectiveness < 1.0 {
        lines.push("It's not very effective...");
    }
    lines
}
