use crate::sim::pokemon::Pokemon;
use crate::sim::stats::Stat;
use crate::sim::status::{StatusCategory, StatusConditionId};
use crate::types::PokemonType;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

pub const NUMBER_OF_LEARNABLE_MOVES: usize = 4;
pub const MAX_LEVEL: u32 = 100;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MoveCategory {
    Physical,
    Special,
    Stats,
}

/// Who an effect lands on, seen from the user of the move.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub enum MoveTarget {
    #[serde(rename = "self", alias = "me")]
    Me,
    #[serde(rename = "other")]
    Other,
}

fn default_target() -> MoveTarget {
    MoveTarget::Other
}

fn default_accuracy() -> u32 {
    100
}

fn default_pp() -> u32 {
    10
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub struct StatBoost {
    pub stat: Stat,
    pub boost: i32,
    #[serde(default = "default_target")]
    pub target: MoveTarget,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct MoveStatEffect {
    #[serde(default)]
    pub boostings: Vec<StatBoost>,
    #[serde(default)]
    pub status: Option<StatusConditionId>,
    #[serde(default)]
    pub volatile_status: Option<StatusConditionId>,
}

impl MoveStatEffect {
    pub fn is_empty(&self) -> bool {
        self.boostings.is_empty() && self.status.is_none() && self.volatile_status.is_none()
    }

    /// Persistent conditions belong in `status`, volatile ones in `volatile_status`.
    fn check_status_slots(&self, move_name: &str) -> anyhow::Result<()> {
        if let Some(status) = self.status {
            if status.category() != StatusCategory::Persistent {
                anyhow::bail!(
                    "Move '{move_name}' lists volatile condition {status} under 'status'"
                );
            }
        }
        if let Some(volatile) = self.volatile_status {
            if volatile.category() != StatusCategory::Volatile {
                anyhow::bail!(
                    "Move '{move_name}' lists persistent condition {volatile} under 'volatile_status'"
                );
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct SecondaryEffect {
    /// Percent chance, 0..=99.
    pub chance: u8,
    #[serde(default = "default_target")]
    pub target: MoveTarget,
    #[serde(flatten)]
    pub effect: MoveStatEffect,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MoveDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: PokemonType,
    pub category: MoveCategory,
    #[serde(default)]
    pub power: u32,
    #[serde(default = "default_accuracy")]
    pub accuracy: u32,
    #[serde(default)]
    pub always_hit: bool,
    #[serde(default = "default_pp")]
    pub pp: u32,
    #[serde(default = "default_target")]
    pub target: MoveTarget,
    #[serde(default)]
    pub effects: MoveStatEffect,
    #[serde(default)]
    pub secondary_effects: Vec<SecondaryEffect>,
}

impl MoveDefinition {
    fn validate(&self) -> anyhow::Result<()> {
        self.effects.check_status_slots(&self.name)?;
        for secondary in &self.secondary_effects {
            secondary.effect.check_status_slots(&self.name)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum GrowthRate {
    Erratic,
    Fast,
    MediumFast,
    MediumSlow,
    Slow,
    Fluctuating,
}

impl GrowthRate {
    /// Total experience a creature needs to be at `level`.
    pub fn necessary_exp_for_level(self, level: u32) -> u32 {
        let n = level.min(MAX_LEVEL) as i64;
        let cube = n * n * n;
        let exp = match self {
            GrowthRate::Fast => 4 * cube / 5,
            GrowthRate::MediumFast => cube,
            GrowthRate::MediumSlow => 6 * cube / 5 - 15 * n * n + 100 * n - 140,
            GrowthRate::Slow => 5 * cube / 4,
            GrowthRate::Erratic => {
                if n < 50 {
                    cube * (100 - n) / 50
                } else if n < 68 {
                    cube * (150 - n) / 100
                } else if n < 98 {
                    cube * ((1911 - 10 * n) / 3) / 500
                } else {
                    cube * (160 - n) / 100
                }
            }
            GrowthRate::Fluctuating => {
                if n < 15 {
                    cube * ((n + 1) / 3 + 24) / 50
                } else if n < 36 {
                    cube * (n + 14) / 50
                } else {
                    cube * (n / 2 + 32) / 50
                }
            }
        };
        exp.max(0) as u32
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub struct BaseStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub sp_attack: u32,
    pub sp_defense: u32,
    pub speed: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LearnableMove {
    pub level: u32,
    pub definition: Arc<MoveDefinition>,
}

/// Immutable species data shared by every instance of the creature.
#[derive(Clone, Debug, PartialEq)]
pub struct Species {
    pub name: String,
    pub types: Vec<PokemonType>,
    pub base_stats: BaseStats,
    pub catch_rate: u32,
    pub base_exp: u32,
    pub growth_rate: GrowthRate,
    pub learnable_moves: Vec<LearnableMove>,
}

impl Species {
    pub fn necessary_exp_for_level(&self, level: u32) -> u32 {
        self.growth_rate.necessary_exp_for_level(level)
    }

    pub fn learnable_move_at_level(&self, level: u32) -> Option<&Arc<MoveDefinition>> {
        self.learnable_moves
            .iter()
            .find(|learnable| learnable.level == level)
            .map(|learnable| &learnable.definition)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LearnsetEntry {
    pub level: u32,
    #[serde(rename = "move")]
    pub move_name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpeciesData {
    pub name: String,
    pub types: Vec<PokemonType>,
    pub base_stats: BaseStats,
    pub catch_rate: u32,
    pub base_exp: u32,
    pub growth_rate: GrowthRate,
    #[serde(default)]
    pub learnset: Vec<LearnsetEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DexFile {
    pub moves: Vec<MoveDefinition>,
    pub species: Vec<SpeciesData>,
}

/// Species and moves resolved by (case-insensitive) name.
#[derive(Clone, Debug, Default)]
pub struct Dex {
    moves: HashMap<String, Arc<MoveDefinition>>,
    species: HashMap<String, Arc<Species>>,
}

impl Dex {
    pub fn from_file(file: DexFile) -> anyhow::Result<Self> {
        let mut dex = Dex::default();
        for definition in file.moves {
            definition.validate()?;
            let id = normalize_id(&definition.name);
            if dex.moves.insert(id, Arc::new(definition.clone())).is_some() {
                anyhow::bail!("Duplicate move '{}'", definition.name);
            }
        }
        for data in file.species {
            if data.types.is_empty() || data.types.len() > 2 {
                anyhow::bail!("Species '{}' must have one or two types", data.name);
            }
            let mut learnable_moves = Vec::with_capacity(data.learnset.len());
            for entry in &data.learnset {
                let definition = dex.get_move(&entry.move_name).with_context(|| {
                    format!("Species '{}' learns unknown move '{}'", data.name, entry.move_name)
                })?;
                learnable_moves.push(LearnableMove {
                    level: entry.level,
                    definition,
                });
            }
            let species = Species {
                name: data.name.clone(),
                types: data.types,
                base_stats: data.base_stats,
                catch_rate: data.catch_rate,
                base_exp: data.base_exp,
                growth_rate: data.growth_rate,
                learnable_moves,
            };
            if dex
                .species
                .insert(normalize_id(&data.name), Arc::new(species))
                .is_some()
            {
                anyhow::bail!("Duplicate species '{}'", data.name);
            }
        }
        Ok(dex)
    }

    pub fn get_move(&self, name: &str) -> anyhow::Result<Arc<MoveDefinition>> {
        self.moves
            .get(&normalize_id(name))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Move '{}' not found in dex", name))
    }

    pub fn get_species(&self, name: &str) -> anyhow::Result<Arc<Species>> {
        self.species
            .get(&normalize_id(name))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Species '{}' not found in dex", name))
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    #[default]
    Wild,
    Trainer,
    Leader,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RosterEntry {
    pub species: String,
    pub level: u32,
}

/// A dex plus the two sides of one battle.
#[derive(Clone, Debug, Deserialize)]
pub struct ScenarioFile {
    pub dex: DexFile,
    pub player: Vec<RosterEntry>,
    pub opponent: Vec<RosterEntry>,
    #[serde(default)]
    pub kind: ScenarioKind,
}

/// Rosters built from a [`ScenarioFile`], ready to start a battle.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub player: Vec<Pokemon>,
    pub opponent: Vec<Pokemon>,
    pub kind: ScenarioKind,
}

impl ScenarioFile {
    pub fn build(self, max_party_size: usize) -> anyhow::Result<Scenario> {
        if self.player.is_empty() || self.opponent.is_empty() {
            anyhow::bail!("Both sides need at least one Pokemon");
        }
        if self.player.len() > max_party_size || self.opponent.len() > max_party_size {
            anyhow::bail!("A roster may hold at most {max_party_size} Pokemon");
        }
        if self.kind == ScenarioKind::Wild && self.opponent.len() != 1 {
            anyhow::bail!("A wild encounter has exactly one opponent");
        }
        let dex = Dex::from_file(self.dex)?;
        let build_roster = |entries: &[RosterEntry]| -> anyhow::Result<Vec<Pokemon>> {
            entries
                .iter()
                .map(|entry| {
                    if entry.level == 0 || entry.level > MAX_LEVEL {
                        anyhow::bail!("Level {} of '{}' is out of range", entry.level, entry.species);
                    }
                    let species = dex.get_species(&entry.species)?;
                    Ok(Pokemon::new(species, entry.level))
                })
                .collect()
        };
        Ok(Scenario {
            player: build_roster(&self.player).context("Invalid player roster")?,
            opponent: build_roster(&self.opponent).context("Invalid opponent roster")?,
            kind: self.kind,
        })
    }
}

pub(crate) fn normalize_id(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_curves_match_reference_points() {
        assert_eq!(GrowthRate::MediumFast.necessary_exp_for_level(10), 1000);
        assert_eq!(GrowthRate::Fast.necessary_exp_for_level(10), 800);
        assert_eq!(GrowthRate::Slow.necessary_exp_for_level(10), 1250);
        assert_eq!(GrowthRate::MediumSlow.necessary_exp_for_level(10), 560);
        assert_eq!(GrowthRate::MediumSlow.necessary_exp_for_level(1), 0);
        assert_eq!(GrowthRate::Erratic.necessary_exp_for_level(100), 600_000);
        assert_eq!(GrowthRate::Fluctuating.necessary_exp_for_level(100), 1_640_000);
    }

    #[test]
    fn growth_curves_are_monotonic_from_level_two() {
        for rate in [
            GrowthRate::Erratic,
            GrowthRate::Fast,
            GrowthRate::MediumFast,
            GrowthRate::MediumSlow,
            GrowthRate::Slow,
            GrowthRate::Fluctuating,
        ] {
            for level in 2..MAX_LEVEL {
                assert!(
                    rate.necessary_exp_for_level(level + 1) > rate.necessary_exp_for_level(level),
                    "{rate:?} not increasing at {level}"
                );
            }
        }
    }

    #[test]
    fn move_definition_parses_with_defaults() {
        let raw = r#"{
            "name": "Thunder Shock",
            "type": "electric",
            "category": "special",
            "power": 40,
            "secondary_effects": [ { "chance": 10, "status": "par" } ]
        }"#;
        let parsed: MoveDefinition = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.accuracy, 100);
        assert_eq!(parsed.target, MoveTarget::Other);
        assert!(parsed.effects.is_empty());
        assert_eq!(parsed.secondary_effects[0].effect.status, Some(StatusConditionId::Par));
        assert_eq!(parsed.secondary_effects[0].target, MoveTarget::Other);
    }

    fn dex_with_move(move_json: &str) -> anyhow::Result<Dex> {
        let raw = format!(r#"{{ "moves": [{move_json}], "species": [] }}"#);
        let file: DexFile = serde_json::from_str(&raw).unwrap();
        Dex::from_file(file)
    }

    #[test]
    fn dex_rejects_confusion_in_persistent_slot() {
        let err = dex_with_move(
            r#"{ "name": "Supersonic", "type": "normal", "category": "stats", "effects": { "status": "conf" } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Supersonic"));
    }

    #[test]
    fn dex_rejects_persistent_status_in_volatile_slot() {
        let secondary = dex_with_move(
            r#"{ "name": "Ember", "type": "fire", "category": "special", "power": 40,
                 "secondary_effects": [ { "chance": 10, "volatile_status": "brn" } ] }"#,
        );
        assert!(secondary.is_err());
        let primary = dex_with_move(
            r#"{ "name": "Hypnosis", "type": "psychic", "category": "stats", "effects": { "volatile_status": "slp" } }"#,
        );
        assert!(primary.is_err());
    }

    #[test]
    fn dex_accepts_statuses_in_their_own_slots() {
        let dex = dex_with_move(
            r#"{ "name": "Tri Hit", "type": "normal", "category": "physical", "power": 40,
                 "effects": { "volatile_status": "conf" },
                 "secondary_effects": [ { "chance": 20, "status": "par" } ] }"#,
        )
        .unwrap();
        assert!(dex.get_move("tri hit").is_ok());
    }

    #[test]
    fn dex_rejects_unknown_learnset_move() {
        let raw = r#"{
            "moves": [],
            "species": [{
                "name": "Rattata", "types": ["normal"],
                "base_stats": { "hp": 30, "attack": 56, "defense": 35, "sp_attack": 25, "sp_defense": 35, "speed": 72 },
                "catch_rate": 255, "base_exp": 51, "growth_rate": "medium_fast",
                "learnset": [{ "level": 1, "move": "Tackle" }]
            }]
        }"#;
        let file: DexFile = serde_json::from_str(raw).unwrap();
        assert!(Dex::from_file(file).is_err());
    }
}
