use crate::model::BaseStats;
use serde::Deserialize;
use std::fmt;

pub const MIN_STAGE: i32 = -6;
pub const MAX_STAGE: i32 = 6;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Attack,
    Defense,
    SpAttack,
    SpDefense,
    Speed,
    Accuracy,
    Evasion,
}

impl Stat {
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stat::Attack => "Attack",
            Stat::Defense => "Defense",
            Stat::SpAttack => "Sp. Atk",
            Stat::SpDefense => "Sp. Def",
            Stat::Speed => "Speed",
            Stat::Accuracy => "accuracy",
            Stat::Evasion => "evasiveness",
        };
        f.write_str(label)
    }
}

/// Boost stage per stat, each kept in `MIN_STAGE..=MAX_STAGE`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StatStages {
    stages: [i32; 7],
}

impl StatStages {
    pub fn get(&self, stat: Stat) -> i32 {
        self.stages[stat.index()]
    }

    /// Adds `delta` and clamps. Returns the stage change actually applied.
    pub fn apply(&mut self, stat: Stat, delta: i32) -> i32 {
        let current = self.get(stat);
        let next = current.saturating_add(delta).clamp(MIN_STAGE, MAX_STAGE);
        self.stages[stat.index()] = next;
        next - current
    }

    pub fn reset(&mut self) {
        self.stages = [0; 7];
    }

    pub fn is_neutral(&self) -> bool {
        self.stages.iter().all(|stage| *stage == 0)
    }
}

/// Standard boost curve: `(2+s)/2` for raised stages, `2/(2+|s|)` for lowered ones.
pub fn stage_multiplier(stage: i32) -> f32 {
    let stage = stage.clamp(MIN_STAGE, MAX_STAGE);
    if stage >= 0 {
        (2 + stage) as f32 / 2.0
    } else {
        2.0 / (2 - stage) as f32
    }
}

/// Factor applied to base accuracy for an accuracy or evasion stage.
pub fn accuracy_multiplier(stage: i32) -> f32 {
    1.0 + stage.abs() as f32 / 3.0
}

pub fn apply_stage_multiplier(base: u32, stage: i32) -> u32 {
    let value = base as f32 * stage_multiplier(stage);
    value.floor().max(1.0) as u32
}

pub fn calc_hp(base: u32, level: u32) -> u32 {
    base * level / 100 + 10 + level
}

pub fn calc_stat(base: u32, level: u32) -> u32 {
    base * level / 100 + 5
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatsSet {
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub sp_attack: u32,
    pub sp_defense: u32,
    pub speed: u32,
}

impl StatsSet {
    pub fn from_base(base: &BaseStats, level: u32) -> Self {
        Self {
            max_hp: calc_hp(base.hp, level),
            attack: calc_stat(base.attack, level),
            defense: calc_stat(base.defense, level),
            sp_attack: calc_stat(base.sp_attack, level),
            sp_defense: calc_stat(base.sp_defense, level),
            speed: calc_stat(base.speed, level),
        }
    }

    /// Raw value of a boostable stat. Accuracy and evasion have no raw value.
    pub fn raw(&self, stat: Stat) -> Option<u32> {
        match stat {
            Stat::Attack => Some(self.attack),
            Stat::Defense => Some(self.defense),
            Stat::SpAttack => Some(self.sp_attack),
            Stat::SpDefense => Some(self.sp_defense),
            Stat::Speed => Some(self.speed),
            Stat::Accuracy | Stat::Evasion => None,
        }
    }
}
