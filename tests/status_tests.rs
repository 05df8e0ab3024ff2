use pokemon_turn_engine::model::{
    BaseStats, GrowthRate, LearnableMove, MoveCategory, MoveDefinition, MoveStatEffect,
    MoveTarget, Species,
};
use pokemon_turn_engine::rng::{RandomSource, ScriptedRandom, SeededRandom};
use pokemon_turn_engine::sim::pokemon::Pokemon;
use pokemon_turn_engine::sim::stats::Stat;
use pokemon_turn_engine::sim::status::{StatusConditionId, StatusRegistry};
use pokemon_turn_engine::types::PokemonType;
use std::sync::Arc;

fn make_species(hp: u32) -> Arc<Species> {
    let tackle = Arc::new(MoveDefinition {
        name: "Tackle".to_string(),
        move_type: PokemonType::Normal,
        category: MoveCategory::Physical,
        power: 40,
        accuracy: 100,
        always_hit: false,
        pp: 35,
        target: MoveTarget::Other,
        effects: MoveStatEffect::default(),
        secondary_effects: Vec::new(),
    });
    Arc::new(Species {
        name: "Bulbasaur".to_string(),
        types: vec![PokemonType::Grass, PokemonType::Poison],
        base_stats: BaseStats {
            hp,
            attack: 50,
            defense: 50,
            sp_attack: 50,
            sp_defense: 50,
            speed: 50,
        },
        catch_rate: 45,
        base_exp: 64,
        growth_rate: GrowthRate::MediumSlow,
        learnable_moves: vec![LearnableMove {
            level: 1,
            definition: tackle,
        }],
    })
}

/// Records every integer roll it hands out.
struct RecordingRandom {
    inner: SeededRandom,
    ints: Vec<i32>,
}

impl RandomSource for RecordingRandom {
    fn uniform_int(&mut self, min: i32, max_exclusive: i32) -> i32 {
        let value = self.inner.uniform_int(min, max_exclusive);
        self.ints.push(value);
        value
    }

    fn uniform_float(&mut self, min: f32, max: f32) -> f32 {
        self.inner.uniform_float(min, max)
    }
}

#[test]
fn paralysis_skips_are_reproducible_for_a_seed() {
    let registry = StatusRegistry::standard();
    let run = |seed: u64| -> Vec<bool> {
        let mut rng = SeededRandom::new(seed);
        let mut pokemon = Pokemon::new(make_species(45), 10);
        pokemon.set_status(StatusConditionId::Par, &registry, &mut rng);
        (0..200)
            .map(|_| pokemon.on_start_turn(&registry, &mut rng))
            .collect()
    };
    let first = run(9);
    assert_eq!(first, run(9));
    let skipped = first.iter().filter(|can_act| !**can_act).count();
    assert!(skipped > 20 && skipped < 80, "skipped {skipped} of 200");
}

#[test]
fn paralysis_blocks_on_low_roll() {
    let registry = StatusRegistry::standard();
    let mut rng = ScriptedRandom::with_ints([24, 25]);
    let mut pokemon = Pokemon::new(make_species(45), 10);
    pokemon.set_status(StatusConditionId::Par, &registry, &mut rng);
    pokemon.drain_messages();
    assert!(!pokemon.on_start_turn(&registry, &mut rng));
    assert_eq!(
        pokemon.drain_messages(),
        vec!["Bulbasaur is paralyzed! It can't move!".to_string()]
    );
    assert!(pokemon.on_start_turn(&registry, &mut rng));
    assert!(!pokemon.has_messages());
}

#[test]
fn confusion_always_ends_within_five_turns() {
    let registry = StatusRegistry::standard();
    let mut rng = RecordingRandom {
        inner: SeededRandom::new(1234),
        ints: Vec::new(),
    };
    let mut self_hits = 0;
    let mut clear_turns = 0;
    for _ in 0..1000 {
        let mut pokemon = Pokemon::new(make_species(45), 50);
        let max_hp = pokemon.max_hp();
        rng.ints.clear();
        pokemon.set_volatile_status(StatusConditionId::Conf, &registry, &mut rng);
        let turns = rng.ints[0];
        assert!((2..=5).contains(&turns));

        let mut confused_turns = 0;
        while pokemon.volatile_status.is_some() {
            let hp_before = pokemon.current_hp;
            let counter_before = pokemon.volatile_status_turns;
            let rolls_before = rng.ints.len();
            let acted = pokemon.on_start_turn(&registry, &mut rng);

            if counter_before == 0 {
                assert!(acted);
                assert_eq!(rng.ints.len(), rolls_before);
                assert_eq!(pokemon.current_hp, hp_before);
                assert!(pokemon.volatile_status.is_none());
                continue;
            }

            confused_turns += 1;
            assert!(confused_turns <= 5);
            assert_eq!(rng.ints.len(), rolls_before + 1);
            let coin = rng.ints[rolls_before];
            if coin == 0 {
                assert!(acted);
                assert_eq!(pokemon.current_hp, hp_before);
                clear_turns += 1;
            } else {
                assert!(!acted);
                assert_eq!(pokemon.current_hp, hp_before - max_hp / 6);
                self_hits += 1;
            }
        }
        assert_eq!(confused_turns, turns);
        assert_eq!(pokemon.volatile_status_turns, 0);
    }
    assert!(self_hits > 0 && clear_turns > 0);
}

#[test]
fn confusion_self_hit_costs_a_sixth_of_max_hp() {
    let registry = StatusRegistry::standard();
    // counter 3, then the coin lands on the self-hit side
    let mut rng = ScriptedRandom::with_ints([3, 1]);
    let mut pokemon = Pokemon::new(make_species(45), 10);
    let max_hp = pokemon.max_hp();
    pokemon.set_volatile_status(StatusConditionId::Conf, &registry, &mut rng);
    pokemon.drain_messages();
    assert!(!pokemon.on_start_turn(&registry, &mut rng));
    assert_eq!(pokemon.current_hp, max_hp - max_hp / 6);
    assert_eq!(
        pokemon.drain_messages(),
        vec![
            "Bulbasaur is confused!".to_string(),
            "Bulbasaur hurt itself in its confusion!".to_string(),
        ]
    );
    assert_eq!(pokemon.volatile_status_turns, 2);
}

#[test]
fn poison_and_burn_round_damage_up() {
    let registry = StatusRegistry::standard();
    let mut rng = ScriptedRandom::new();

    // base 50 at level 5 gives 17 max HP
    let mut poisoned = Pokemon::new(make_species(50), 5);
    assert_eq!(poisoned.max_hp(), 17);
    poisoned.set_status(StatusConditionId::Psn, &registry, &mut rng);
    poisoned.on_finish_turn(&registry);
    assert_eq!(poisoned.current_hp, 14);
    assert_eq!(
        poisoned.drain_messages(),
        vec![
            "Bulbasaur was poisoned!".to_string(),
            "Bulbasaur is hurt by poison!".to_string(),
        ]
    );

    let mut burned = Pokemon::new(make_species(50), 5);
    burned.set_status(StatusConditionId::Brn, &registry, &mut rng);
    burned.on_finish_turn(&registry);
    assert_eq!(burned.current_hp, 15);
}

#[test]
fn end_of_turn_damage_never_goes_below_zero() {
    let registry = StatusRegistry::standard();
    let mut rng = ScriptedRandom::new();
    let mut pokemon = Pokemon::new(make_species(50), 5);
    pokemon.set_status(StatusConditionId::Psn, &registry, &mut rng);
    pokemon.update_hp(16);
    pokemon.on_finish_turn(&registry);
    assert_eq!(pokemon.current_hp, 0);
    assert!(pokemon.is_fainted());
}

#[test]
fn sleep_counts_down_then_wakes() {
    let registry = StatusRegistry::standard();
    let mut rng = ScriptedRandom::with_ints([2]);
    let mut pokemon = Pokemon::new(make_species(45), 10);
    pokemon.set_status(StatusConditionId::Slp, &registry, &mut rng);
    assert_eq!(pokemon.status_turns, 2);
    assert!(!pokemon.on_start_turn(&registry, &mut rng));
    assert!(!pokemon.on_start_turn(&registry, &mut rng));
    assert!(pokemon.on_start_turn(&registry, &mut rng));
    assert_eq!(pokemon.status, None);
    assert_eq!(
        pokemon.drain_messages().last().map(String::as_str),
        Some("Bulbasaur woke up!")
    );
}

#[test]
fn frozen_thaws_on_low_roll() {
    let registry = StatusRegistry::standard();
    let mut rng = ScriptedRandom::with_ints([80, 10]);
    let mut pokemon = Pokemon::new(make_species(45), 10);
    pokemon.set_status(StatusConditionId::Frz, &registry, &mut rng);
    assert!(!pokemon.on_start_turn(&registry, &mut rng));
    assert!(pokemon.on_start_turn(&registry, &mut rng));
    assert_eq!(pokemon.status, None);
}

#[test]
fn second_status_is_ignored() {
    let registry = StatusRegistry::standard();
    let mut rng = ScriptedRandom::new();
    let mut pokemon = Pokemon::new(make_species(45), 10);
    assert!(pokemon.set_status(StatusConditionId::Brn, &registry, &mut rng));
    assert!(!pokemon.set_status(StatusConditionId::Psn, &registry, &mut rng));
    assert_eq!(pokemon.status, Some(StatusConditionId::Brn));
    assert_eq!(pokemon.drain_messages().len(), 1);
}

#[test]
fn boosts_clamp_at_six_stages() {
    let mut pokemon = Pokemon::new(make_species(45), 10);
    pokemon.apply_boost(Stat::Attack, 2);
    pokemon.apply_boost(Stat::Attack, 2);
    pokemon.apply_boost(Stat::Attack, 2);
    pokemon.apply_boost(Stat::Attack, 1);
    assert_eq!(pokemon.stat_stages.get(Stat::Attack), 6);
    assert_eq!(
        pokemon.drain_messages().last().map(String::as_str),
        Some("Bulbasaur's Attack won't go any higher!")
    );

    pokemon.apply_boost(Stat::Speed, -8);
    assert_eq!(pokemon.stat_stages.get(Stat::Speed), -6);
    assert_eq!(
        pokemon.pop_message().as_deref(),
        Some("Bulbasaur's Speed harshly fell!")
    );
}

#[test]
fn battle_finish_clears_only_volatile_state() {
    let registry = StatusRegistry::standard();
    let mut rng = ScriptedRandom::with_ints([4]);
    let mut pokemon = Pokemon::new(make_species(45), 10);
    pokemon.set_volatile_status(StatusConditionId::Conf, &registry, &mut rng);
    pokemon.set_status(StatusConditionId::Par, &registry, &mut rng);
    pokemon.apply_boost(Stat::Evasion, 1);
    pokemon.on_battle_finish();
    assert_eq!(pokemon.volatile_status, None);
    assert_eq!(pokemon.status, Some(StatusConditionId::Par));
    assert!(pokemon.stat_stages.is_neutral());
    assert!(!pokemon.has_messages());
}
