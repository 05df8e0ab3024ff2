use crate::config::ExperienceConfig;
use crate::sim::pokemon::Pokemon;

/// Experience for defeating `fainted`: `floor(base_exp * level * multiplier / divisor)`.
pub fn experience_award(fainted: &Pokemon, is_wild: bool, config: &ExperienceConfig) -> u32 {
    let multiplier = if is_wild {
        config.wild_multiplier
    } else {
        config.trainer_multiplier
    };
    let raw = fainted.species.base_exp as f32 * fainted.level as f32 * multiplier;
    (raw / config.divisor.max(1) as f32).floor() as u32
}

pub fn first_non_fainted(party: &[Pokemon]) -> Option<usize> {
    party.iter().position(|pokemon| !pokemon.is_fainted())
}

/// Any member other than `active` that can still battle.
pub fn has_reserve(party: &[Pokemon], active: usize) -> bool {
    party
        .iter()
        .enumerate()
        .any(|(idx, pokemon)| idx != active && !pokemon.is_fainted())
}
