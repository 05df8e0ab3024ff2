//! Tunable battle constants.
//!
//! Every field has a default, so a config file only needs to list what it
//! overrides.

use crate::sim::status::StatusConditionId;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Percent chance (0..100) that a damaging hit is critical.
    pub critical_hit_chance: f32,
    pub critical_hit_multiplier: f32,
    pub max_party_size: usize,
    pub experience: ExperienceConfig,
    pub escape: EscapeConfig,
    pub capture: CaptureConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            critical_hit_chance: 6.25,
            critical_hit_multiplier: 2.0,
            max_party_size: 6,
            experience: ExperienceConfig::default(),
            escape: EscapeConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExperienceConfig {
    pub divisor: u32,
    pub wild_multiplier: f32,
    pub trainer_multiplier: f32,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            divisor: 7,
            wild_multiplier: 1.0,
            trainer_multiplier: 1.5,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EscapeConfig {
    pub speed_factor: u32,
    pub attempt_bonus: u32,
}

impl Default for EscapeConfig {
    fn default() -> Self {
        Self {
            speed_factor: 128,
            attempt_bonus: 30,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    pub sleep_bonus: f32,
    pub freeze_bonus: f32,
    pub paralysis_bonus: f32,
    pub poison_bonus: f32,
    pub burn_bonus: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sleep_bonus: 2.0,
            freeze_bonus: 2.0,
            paralysis_bonus: 1.5,
            poison_bonus: 1.5,
            burn_bonus: 1.5,
        }
    }
}

impl CaptureConfig {
    pub fn status_bonus(&self, status: Option<StatusConditionId>) -> f32 {
        match status {
            Some(StatusConditionId::Slp) => self.sleep_bonus,
            Some(StatusConditionId::Frz) => self.freeze_bonus,
            Some(StatusConditionId::Par) => self.paralysis_bonus,
            Some(StatusConditionId::Psn) => self.poison_bonus,
            Some(StatusConditionId::Brn) => self.burn_bonus,
            Some(StatusConditionId::Conf) | None => 1.0,
        }
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read engine config at {}", path.display()))?;
    let parsed: EngineConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    if parsed.max_party_size == 0 {
        anyhow::bail!("max_party_size must be > 0");
    }
    if parsed.experience.divisor == 0 {
        anyhow::bail!("experience.divisor must be > 0");
    }
    Ok(parsed)
}
