//! Status-condition table.
//!
//! Each condition is a plain struct of optional hook functions, keyed by
//! [`StatusConditionId`]. The table is an ordinary value owned by whoever runs
//! the battle, so two battles never share mutable status state.

use crate::rng::RandomSource;
use crate::sim::pokemon::Pokemon;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(try_from = "String")]
pub enum StatusConditionId {
    Psn,
    Brn,
    Par,
    Frz,
    Slp,
    Conf,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusCategory {
    /// Survives the end of the battle.
    Persistent,
    /// Cleared when the battle finishes.
    Volatile,
}

static STATUS_IDS: phf::Map<&'static str, StatusConditionId> = phf::phf_map! {
    "psn" => StatusConditionId::Psn,
    "brn" => StatusConditionId::Brn,
    "par" => StatusConditionId::Par,
    "frz" => StatusConditionId::Frz,
    "slp" => StatusConditionId::Slp,
    "conf" => StatusConditionId::Conf,
};

impl StatusConditionId {
    pub const ALL: [StatusConditionId; 6] = [
        StatusConditionId::Psn,
        StatusConditionId::Brn,
        StatusConditionId::Par,
        StatusConditionId::Frz,
        StatusConditionId::Slp,
        StatusConditionId::Conf,
    ];

    pub fn category(self) -> StatusCategory {
        match self {
            StatusConditionId::Conf => StatusCategory::Volatile,
            _ => StatusCategory::Persistent,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            StatusConditionId::Psn => "psn",
            StatusConditionId::Brn => "brn",
            StatusConditionId::Par => "par",
            StatusConditionId::Frz => "frz",
            StatusConditionId::Slp => "slp",
            StatusConditionId::Conf => "conf",
        }
    }
}

impl FromStr for StatusConditionId {
    type Err = String;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        STATUS_IDS
            .get(code.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| format!("unknown status condition '{code}'"))
    }
}

impl TryFrom<String> for StatusConditionId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for StatusConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code().to_ascii_uppercase())
    }
}

pub type ApplyHook = fn(&mut Pokemon, &mut dyn RandomSource);
/// Returns whether the creature may act this turn.
pub type StartTurnHook = fn(&mut Pokemon, &mut dyn RandomSource) -> bool;
pub type FinishTurnHook = fn(&mut Pokemon);

#[derive(Clone, Debug)]
pub struct StatusCondition {
    pub id: StatusConditionId,
    pub name: &'static str,
    pub description: &'static str,
    /// Appended to the creature's name when the condition is installed.
    pub start_message: &'static str,
    pub on_apply: Option<ApplyHook>,
    pub on_start_turn: Option<StartTurnHook>,
    pub on_finish_turn: Option<FinishTurnHook>,
}

impl StatusCondition {
    fn new(name: &'static str, description: &'static str, start_message: &'static str) -> Self {
        Self {
            // stamped with the real key by StatusRegistry::init
            id: StatusConditionId::Psn,
            name,
            description,
            start_message,
            on_apply: None,
            on_start_turn: None,
            on_finish_turn: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StatusRegistry {
    conditions: BTreeMap<StatusConditionId, StatusCondition>,
}

impl StatusRegistry {
    /// The standard six conditions, already initialised.
    pub fn standard() -> Self {
        let mut conditions = BTreeMap::new();
        conditions.insert(
            StatusConditionId::Psn,
            StatusCondition {
                on_finish_turn: Some(poison_effect),
                ..StatusCondition::new(
                    "Poison",
                    "Damages the Pokemon at the end of every turn.",
                    "was poisoned!",
                )
            },
        );
        conditions.insert(
            StatusConditionId::Brn,
            StatusCondition {
                on_finish_turn: Some(burn_effect),
                ..StatusCondition::new(
                    "Burn",
                    "Damages the Pokemon at the end of every turn.",
                    "was burned!",
                )
            },
        );
        conditions.insert(
            StatusConditionId::Par,
            StatusCondition {
                on_start_turn: Some(paralyzed_effect),
                ..StatusCondition::new(
                    "Paralyzed",
                    "The Pokemon may be unable to move.",
                    "is paralyzed! It may be unable to move!",
                )
            },
        );
        conditions.insert(
            StatusConditionId::Frz,
            StatusCondition {
                on_start_turn: Some(frozen_effect),
                ..StatusCondition::new(
                    "Frozen",
                    "The Pokemon cannot attack until it thaws out at random.",
                    "was frozen solid!",
                )
            },
        );
        conditions.insert(
            StatusConditionId::Slp,
            StatusCondition {
                on_apply: Some(sleep_apply),
                on_start_turn: Some(sleep_effect),
                ..StatusCondition::new(
                    "Sleep",
                    "The Pokemon cannot attack until it wakes up after a few turns.",
                    "fell asleep!",
                )
            },
        );
        conditions.insert(
            StatusConditionId::Conf,
            StatusCondition {
                on_apply: Some(confusion_apply),
                on_start_turn: Some(confusion_effect),
                ..StatusCondition::new(
                    "Confused",
                    "The Pokemon may hurt itself in its confusion.",
                    "became confused!",
                )
            },
        );
        let mut registry = Self { conditions };
        registry.init();
        registry
    }

    /// Stamps every definition with the key it is registered under. Idempotent.
    pub fn init(&mut self) {
        for (id, condition) in self.conditions.iter_mut() {
            condition.id = *id;
        }
    }

    /// Adds or replaces a definition.
    pub fn register(&mut self, id: StatusConditionId, condition: StatusCondition) {
        self.conditions.insert(id, condition);
        self.init();
    }

    pub fn get(&self, id: StatusConditionId) -> &StatusCondition {
        self.conditions
            .get(&id)
            .unwrap_or_else(|| panic!("status condition {id:?} is not registered"))
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Chance out of 100 for the paralysis skip and the freeze thaw.
const PARALYSIS_SKIP_CHANCE: i32 = 25;
const FREEZE_THAW_CHANCE: i32 = 25;

fn poison_effect(pokemon: &mut Pokemon) {
    let damage = pokemon.max_hp().div_ceil(8);
    pokemon.update_hp(damage);
    pokemon.enqueue_message(format!("{} is hurt by poison!", pokemon.name()));
}

fn burn_effect(pokemon: &mut Pokemon) {
    let damage = pokemon.max_hp().div_ceil(15);
    pokemon.update_hp(damage);
    pokemon.enqueue_message(format!("{} is hurt by its burn!", pokemon.name()));
}

fn paralyzed_effect(pokemon: &mut Pokemon, rng: &mut dyn RandomSource) -> bool {
    if rng.uniform_int(0, 100) < PARALYSIS_SKIP_CHANCE {
        pokemon.enqueue_message(format!("{} is paralyzed! It can't move!", pokemon.name()));
        return false;
    }
    true
}

fn frozen_effect(pokemon: &mut Pokemon, rng: &mut dyn RandomSource) -> bool {
    if rng.uniform_int(0, 100) < FREEZE_THAW_CHANCE {
        pokemon.cure_status();
        pokemon.enqueue_message(format!("{} thawed out!", pokemon.name()));
        return true;
    }
    pokemon.enqueue_message(format!("{} is frozen solid!", pokemon.name()));
    false
}

fn sleep_apply(pokemon: &mut Pokemon, rng: &mut dyn RandomSource) {
    pokemon.status_turns = rng.uniform_int(2, 6);
    debug!(pokemon = pokemon.name(), turns = pokemon.status_turns, "sleep counter set");
}

fn sleep_effect(pokemon: &mut Pokemon, _rng: &mut dyn RandomSource) -> bool {
    if pokemon.status_turns <= 0 {
        pokemon.cure_status();
        pokemon.enqueue_message(format!("{} woke up!", pokemon.name()));
        return true;
    }
    pokemon.status_turns -= 1;
    pokemon.enqueue_message(format!("{} is fast asleep.", pokemon.name()));
    false
}

fn confusion_apply(pokemon: &mut Pokemon, rng: &mut dyn RandomSource) {
    pokemon.volatile_status_turns = rng.uniform_int(2, 6);
    debug!(
        pokemon = pokemon.name(),
        turns = pokemon.volatile_status_turns,
        "confusion counter set"
    );
}

fn confusion_effect(pokemon: &mut Pokemon, rng: &mut dyn RandomSource) -> bool {
    if pokemon.volatile_status_turns <= 0 {
        pokemon.cure_volatile_status();
        pokemon.enqueue_message(format!("{} snapped out of its confusion!", pokemon.name()));
        return true;
    }
    pokemon.volatile_status_turns -= 1;
    pokemon.enqueue_message(format!("{} is confused!", pokemon.name()));
    if rng.uniform_int(0, 2) == 0 {
        return true;
    }
    pokemon.update_hp(pokemon.max_hp() / 6);
    pokemon.enqueue_message(format!("{} hurt itself in its confusion!", pokemon.name()));
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_stamps_ids_and_is_idempotent() {
        let mut registry = StatusRegistry::standard();
        registry.init();
        registry.init();
        assert_eq!(registry.len(), 6);
        for id in StatusConditionId::ALL {
            assert_eq!(registry.get(id).id, id);
        }
    }

    #[test]
    fn only_confusion_is_volatile() {
        for id in StatusConditionId::ALL {
            let expected = if id == StatusConditionId::Conf {
                StatusCategory::Volatile
            } else {
                StatusCategory::Persistent
            };
            assert_eq!(id.category(), expected);
        }
    }

    #[test]
    fn hooks_match_condition_table() {
        let registry = StatusRegistry::standard();
        let psn = registry.get(StatusConditionId::Psn);
        assert!(psn.on_finish_turn.is_some() && psn.on_start_turn.is_none());
        let par = registry.get(StatusConditionId::Par);
        assert!(par.on_start_turn.is_some() && par.on_apply.is_none());
        let slp = registry.get(StatusConditionId::Slp);
        assert!(slp.on_apply.is_some() && slp.on_start_turn.is_some());
        assert!(slp.on_finish_turn.is_none());
    }

    #[test]
    fn codes_round_trip() {
        for id in StatusConditionId::ALL {
            assert_eq!(id.code().parse::<StatusConditionId>(), Ok(id));
        }
        assert!("tox".parse::<StatusConditionId>().is_err());
    }
}
