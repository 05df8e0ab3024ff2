use crate::config::{CaptureConfig, EscapeConfig};
use crate::rng::RandomSource;
use crate::sim::pokemon::Pokemon;
use tracing::debug;

pub const CAPTURE_SHAKES: u32 = 4;

/// Catch value `a`. At 255 or more the capture cannot fail.
pub fn catch_value(target: &Pokemon, ball_bonus: f32, status_bonus: f32) -> f32 {
    let max_hp = target.max_hp() as f32;
    let hp = target.current_hp as f32;
    (3.0 * max_hp - 2.0 * hp) * target.species.catch_rate as f32 * ball_bonus * status_bonus
        / (3.0 * max_hp)
}

/// Number of shakes, 0..=4. Four means the creature was caught.
///
/// Each shake is an independent roll against the shake threshold and the
/// first failed roll stops the sequence.
pub fn shake_count(
    target: &Pokemon,
    ball_bonus: f32,
    capture: &CaptureConfig,
    rng: &mut dyn RandomSource,
) -> u32 {
    let a = catch_value(target, ball_bonus, capture.status_bonus(target.status));
    if a >= 255.0 {
        debug!(a, "capture guaranteed");
        return CAPTURE_SHAKES;
    }
    if a <= 0.0 {
        return 0;
    }
    let b = 1_048_560.0 / (16_711_680.0 / a).sqrt().sqrt();
    let mut shakes = 0;
    while shakes < CAPTURE_SHAKES {
        if rng.uniform_int(0, 65_535) as f32 >= b {
            break;
        }
        shakes += 1;
    }
    debug!(a, b, shakes, "capture attempt");
    shakes
}

/// `attempts` already counts the current attempt.
pub fn attempt_escape(
    player_speed: u32,
    enemy_speed: u32,
    attempts: u32,
    escape: &EscapeConfig,
    rng: &mut dyn RandomSource,
) -> bool {
    if player_speed >= enemy_speed {
        return true;
    }
    let odds = (player_speed * escape.speed_factor / enemy_speed.max(1)
        + escape.attempt_bonus * attempts)
        % 256;
    let roll = rng.uniform_int(0, 256);
    debug!(odds, roll, attempts, "escape roll");
    (roll as u32) < odds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BaseStats, GrowthRate, Species};
    use crate::rng::ScriptedRandom;
    use crate::sim::status::StatusConditionId;
    use crate::types::PokemonType;
    use std::sync::Arc;

    /// Level 10, 25 max HP, catch rate 45.
    fn wild() -> Pokemon {
        Pokemon::new(
            Arc::new(Species {
                name: "Rattata".to_string(),
                types: vec![PokemonType::Normal],
                base_stats: BaseStats {
                    hp: 50,
                    attack: 50,
                    defense: 50,
                    sp_attack: 50,
                    sp_defense: 50,
                    speed: 50,
                },
                catch_rate: 45,
                base_exp: 50,
                growth_rate: GrowthRate::MediumFast,
                learnable_moves: Vec::new(),
            }),
            10,
        )
    }

    #[test]
    fn catch_value_grows_with_missing_hp_and_status() {
        let mut target = wild();
        assert_eq!(target.max_hp(), 25);
        assert_eq!(catch_value(&target, 1.0, 1.0), 15.0);
        assert_eq!(catch_value(&target, 1.0, 2.0), 30.0);
        assert_eq!(catch_value(&target, 1.5, 1.0), 22.5);

        target.update_hp(24);
        // (75 - 2) * 45 / 75
        assert!((catch_value(&target, 1.0, 1.0) - 43.8).abs() < 1e-3);
    }

    #[test]
    fn first_failed_shake_stops_the_rolls() {
        let target = wild();
        // a = 15 gives a threshold of about 32274
        let mut rng = ScriptedRandom::with_ints([0, 0, 40_000, 0, 0]);
        assert_eq!(shake_count(&target, 1.0, &CaptureConfig::default(), &mut rng), 2);
        assert_eq!(rng.calls(), 3);
        assert_eq!(rng.remaining_ints(), 2);
    }

    #[test]
    fn four_passing_rolls_catch() {
        let target = wild();
        let mut rng = ScriptedRandom::with_ints([32_000, 32_000, 32_000, 32_000]);
        assert_eq!(
            shake_count(&target, 1.0, &CaptureConfig::default(), &mut rng),
            CAPTURE_SHAKES
        );
        assert_eq!(rng.calls(), 4);
    }

    #[test]
    fn roll_at_threshold_fails_the_shake() {
        let target = wild();
        let mut rng = ScriptedRandom::with_ints([32_275]);
        assert_eq!(shake_count(&target, 1.0, &CaptureConfig::default(), &mut rng), 0);
        assert_eq!(rng.calls(), 1);
    }

    #[test]
    fn sleep_bonus_raises_the_shake_threshold() {
        let capture = CaptureConfig::default();
        let mut target = wild();
        let mut rng = ScriptedRandom::with_ints([35_000]);
        assert_eq!(shake_count(&target, 1.0, &capture, &mut rng), 0);

        // a = 30 gives a threshold of about 38381
        target.status = Some(StatusConditionId::Slp);
        let mut rng = ScriptedRandom::with_ints([35_000, 35_000, 35_000, 39_000]);
        assert_eq!(shake_count(&target, 1.0, &capture, &mut rng), 3);
        assert_eq!(rng.remaining_ints(), 0);
    }

    #[test]
    fn guaranteed_catch_skips_the_rolls() {
        let target = wild();
        let mut rng = ScriptedRandom::new();
        assert_eq!(
            shake_count(&target, 255.0, &CaptureConfig::default(), &mut rng),
            CAPTURE_SHAKES
        );
        assert_eq!(rng.calls(), 0);
    }

    #[test]
    fn faster_player_escapes_without_rolling() {
        let mut rng = ScriptedRandom::new();
        assert!(attempt_escape(50, 50, 1, &EscapeConfig::default(), &mut rng));
        assert_eq!(rng.calls(), 0);
    }

    #[test]
    fn escape_odds_grow_with_attempts() {
        let escape = EscapeConfig::default();
        // 20*128/40 = 64; +30 per attempt
        let mut rng = ScriptedRandom::with_ints([100, 100]);
        assert!(!attempt_escape(20, 40, 1, &escape, &mut rng));
        assert!(attempt_escape(20, 40, 2, &escape, &mut rng));
    }

    #[test]
    fn escape_odds_wrap_at_256() {
        let escape = EscapeConfig::default();
        // 39*128/40 = 124; 124 + 30*5 = 274 -> 18
        let mut rng = ScriptedRandom::with_ints([18]);
        assert!(!attempt_escape(39, 40, 5, &escape, &mut rng));
    }
}
