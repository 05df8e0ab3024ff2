use crate::sim::pokemon::Pokemon;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }

    /// Short identifier used in battle logs.
    pub fn ident(self) -> &'static str {
        match self {
            Side::Player => "p1",
            Side::Opponent => "p2",
        }
    }
}

/// Move order for one turn. Speed is compared once; ties go to the player.
pub fn determine_order(player: &Pokemon, opponent: &Pokemon) -> [Side; 2] {
    if opponent.speed() > player.speed() {
        [Side::Opponent, Side::Player]
    } else {
        [Side::Player, Side::Opponent]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BaseStats, GrowthRate, Species};
    use crate::sim::stats::Stat;
    use crate::types::PokemonType;
    use std::sync::Arc;

    fn with_speed(speed: u32) -> Pokemon {
        Pokemon::new(
            Arc::new(Species {
                name: format!("Speed{speed}"),
                types: vec![PokemonType::Normal],
                base_stats: BaseStats {
                    hp: 50,
                    attack: 50,
                    defense: 50,
                    sp_attack: 50,
                    sp_defense: 50,
                    speed,
                },
                catch_rate: 100,
                base_exp: 50,
                growth_rate: GrowthRate::MediumFast,
                learnable_moves: Vec::new(),
            }),
            50,
        )
    }

    #[test]
    fn faster_side_moves_first_and_ties_favor_player() {
        assert_eq!(
            determine_order(&with_speed(40), &with_speed(80)),
            [Side::Opponent, Side::Player]
        );
        assert_eq!(
            determine_order(&with_speed(80), &with_speed(80)),
            [Side::Player, Side::Opponent]
        );
    }

    #[test]
    fn order_uses_boosted_speed() {
        let mut player = with_speed(40);
        let opponent = with_speed(60);
        player.stat_stages.apply(Stat::Speed, 2);
        assert_eq!(determine_order(&player, &opponent), [Side::Player, Side::Opponent]);
    }
}
