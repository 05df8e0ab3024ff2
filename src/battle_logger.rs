use crate::battle::{EffectKind, Side};
use crate::driver::Presenter;
use serde_json::json;

/// Presenter that records the battle as `|kind|args` lines.
#[derive(Clone, Debug, Default)]
pub struct BattleLogger {
    battle_type: String,
    log: Vec<String>,
    dialogue: Vec<String>,
    echo: bool,
}

impl BattleLogger {
    pub fn new(battle_type: impl Into<String>) -> Self {
        Self {
            battle_type: battle_type.into(),
            log: Vec::new(),
            dialogue: Vec::new(),
            echo: false,
        }
    }

    /// Also prints every dialogue line to stdout as it arrives.
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    pub fn dialogue(&self) -> &[String] {
        &self.dialogue
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "battle_type": self.battle_type,
            "log": self.log,
        })
    }
}

impl Presenter for BattleLogger {
    fn present_line(&mut self, text: &str) {
        if self.echo {
            println!("{text}");
        }
        self.dialogue.push(text.to_string());
        self.log.push(format!("|dialogue|{text}"));
    }

    fn play_effect(&mut self, effect: EffectKind) {
        let line = match effect {
            EffectKind::Attack(side) => format!("|-anim|attack|{}", side.ident()),
            EffectKind::Hit(side) => format!("|-anim|hit|{}", side.ident()),
            EffectKind::Faint(side) => format!("|faint|{}", side.ident()),
            EffectKind::Withdraw(side) => format!("|-anim|withdraw|{}", side.ident()),
            EffectKind::SendOut(side) => format!("|-anim|sendout|{}", side.ident()),
            EffectKind::BallThrown => "|-anim|ball".to_string(),
            EffectKind::BallShake => "|-anim|shake".to_string(),
            EffectKind::BreakOut => "|-anim|breakout".to_string(),
            EffectKind::Captured => "|-anim|captured".to_string(),
            EffectKind::LevelUp => "|-anim|levelup".to_string(),
            EffectKind::BattleEnd => "|-anim|end".to_string(),
        };
        self.log.push(line);
    }

    fn refresh_hp(&mut self, side: Side, name: &str, hp: u32, max_hp: u32) {
        self.log
            .push(format!("|hp|{}|{hp}/{max_hp}", ident(side, name)));
    }

    fn refresh_experience(&mut self, name: &str, experience: u32, next_level_at: u32) {
        self.log
            .push(format!("|exp|{}|{experience}/{next_level_at}", ident(Side::Player, name)));
    }

    fn refresh_level(&mut self, name: &str, level: u32) {
        self.log
            .push(format!("|level|{}|{level}", ident(Side::Player, name)));
    }

    fn battle_finished(&mut self, player_won: bool) {
        let winner = if player_won { Side::Player } else { Side::Opponent };
        self.log.push(format!("|win|{}", winner.ident()));
    }
}

pub fn ident(side: Side, name: &str) -> String {
    format!("{}a: {name}", side.ident())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_dialogue_and_protocol_lines() {
        let mut logger = BattleLogger::new("wild");
        logger.present_line("A wild Rattata appeared!");
        logger.refresh_hp(Side::Opponent, "Rattata", 12, 20);
        logger.battle_finished(true);
        assert_eq!(logger.dialogue(), ["A wild Rattata appeared!".to_string()]);
        assert_eq!(
            logger.log_lines(),
            [
                "|dialogue|A wild Rattata appeared!".to_string(),
                "|hp|p2a: Rattata|12/20".to_string(),
                "|win|p1".to_string(),
            ]
        );
        assert_eq!(logger.to_json()["battle_type"], "wild");
    }
}
