//! Driver loop connecting a [`BattleController`] to a presentation layer and
//! a source of player decisions.

use crate::battle::{
    ActionChoice, BallKind, BattleController, BattleEvent, BattleOutcome, BattleSession,
    Decision, EffectKind, ForgetChoice, Side, StepStatus,
};
use crate::error::BattleError;
use crate::rng::{RandomSource, SeededRandom};
use tracing::warn;

/// Consecutive invalid selections tolerated before the driver gives up.
pub const MAX_INVALID_SELECTIONS: usize = 32;
/// Upper bound on pipeline steps for one battle.
pub const MAX_STEPS: usize = 200_000;

pub trait Presenter {
    fn present_line(&mut self, text: &str);

    fn play_effect(&mut self, _effect: EffectKind) {}

    fn refresh_hp(&mut self, _side: Side, _name: &str, _hp: u32, _max_hp: u32) {}

    fn refresh_experience(&mut self, _name: &str, _experience: u32, _next_level_at: u32) {}

    fn refresh_level(&mut self, _name: &str, _level: u32) {}

    fn battle_finished(&mut self, _player_won: bool) {}
}

/// Source of player choices. `None` from a selection means "cancel".
pub trait DecisionProvider {
    fn collect_action(&mut self, session: &BattleSession) -> ActionChoice;

    fn collect_move_slot(&mut self, session: &BattleSession) -> Option<usize>;

    fn collect_party_member(&mut self, session: &BattleSession, forced: bool) -> Option<usize>;

    fn collect_forget_slot(&mut self, session: &BattleSession, new_move: &str) -> ForgetChoice;
}

/// Presenter that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present_line(&mut self, _text: &str) {}
}

pub fn dispatch_event(presenter: &mut dyn Presenter, event: &BattleEvent) {
    match event {
        BattleEvent::Dialogue(line) => presenter.present_line(line),
        BattleEvent::Effect(effect) => presenter.play_effect(*effect),
        BattleEvent::HpChanged {
            side,
            name,
            hp,
            max_hp,
        } => presenter.refresh_hp(*side, name, *hp, *max_hp),
        BattleEvent::ExpChanged {
            name,
            experience,
            next_level_at,
        } => presenter.refresh_experience(name, *experience, *next_level_at),
        BattleEvent::LevelChanged { name, level } => presenter.refresh_level(name, *level),
        BattleEvent::Prompt(_) => {}
        BattleEvent::BattleFinished { player_won } => presenter.battle_finished(*player_won),
    }
}

/// Plays a battle to the end.
pub fn run_battle<R: RandomSource>(
    controller: &mut BattleController<R>,
    presenter: &mut dyn Presenter,
    decider: &mut dyn DecisionProvider,
) -> Result<BattleOutcome, BattleError> {
    let mut invalid_in_a_row = 0usize;
    for _ in 0..MAX_STEPS {
        let status = controller.advance();
        for event in controller.drain_events() {
            dispatch_event(presenter, &event);
        }
        let decision = match status {
            StepStatus::Continue => continue,
            StepStatus::Finished(outcome) => return Ok(outcome),
            StepStatus::Awaiting(decision) => decision,
        };

        let result = apply_decision(controller, decider, &decision);
        match result {
            Ok(()) => invalid_in_a_row = 0,
            Err(err) if err.is_invalid_selection() => {
                invalid_in_a_row += 1;
                warn!(%err, attempt = invalid_in_a_row, "invalid selection, prompting again");
                if invalid_in_a_row >= MAX_INVALID_SELECTIONS {
                    return Err(BattleError::SelectionRetriesExhausted(invalid_in_a_row));
                }
            }
            Err(err) => return Err(err),
        }
    }
    Err(BattleError::Stalled(MAX_STEPS))
}

fn apply_decision<R: RandomSource>(
    controller: &mut BattleController<R>,
    decider: &mut dyn DecisionProvider,
    decision: &Decision,
) -> Result<(), BattleError> {
    match decision {
        Decision::Action => {
            let action = decider.collect_action(controller.session());
            controller.choose_action(action)
        }
        Decision::MoveSlot => match decider.collect_move_slot(controller.session()) {
            Some(slot) => controller.choose_move(slot),
            None => controller.cancel(),
        },
        Decision::PartyMember { forced } => {
            match decider.collect_party_member(controller.session(), *forced) {
                Some(index) => controller.choose_party_member(index),
                None => controller.cancel(),
            }
        }
        Decision::ForgetMove { new_move } => {
            let choice = decider.collect_forget_slot(controller.session(), new_move);
            controller.choose_forget_move(choice)
        }
    }
}

/// Picks uniformly among legal choices, weighted towards fighting.
#[derive(Clone, Debug)]
pub struct RandomDecider {
    rng: SeededRandom,
}

impl RandomDecider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SeededRandom::new(seed),
        }
    }

    fn pick(&mut self, candidates: &[usize]) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        let idx = self.rng.uniform_int(0, candidates.len() as i32) as usize;
        Some(candidates[idx])
    }
}

impl DecisionProvider for RandomDecider {
    fn collect_action(&mut self, session: &BattleSession) -> ActionChoice {
        let can_switch = session
            .player_party
            .iter()
            .enumerate()
            .any(|(idx, pokemon)| idx != session.player_active && !pokemon.is_fainted());
        let roll = self.rng.uniform_int(0, 100);
        match roll {
            0..=79 => ActionChoice::Fight,
            80..=89 if session.is_wild() => ActionChoice::ThrowBall(BallKind::Poke),
            90..=94 if session.is_wild() => ActionChoice::Run,
            95..=99 if can_switch => ActionChoice::SwitchPokemon,
            _ => ActionChoice::Fight,
        }
    }

    fn collect_move_slot(&mut self, session: &BattleSession) -> Option<usize> {
        let usable: Vec<usize> = session
            .player()
            .moves
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.pp > 0)
            .map(|(idx, _)| idx)
            .collect();
        self.pick(&usable)
    }

    fn collect_party_member(&mut self, session: &BattleSession, _forced: bool) -> Option<usize> {
        let candidates: Vec<usize> = session
            .player_party
            .iter()
            .enumerate()
            .filter(|(idx, pokemon)| *idx != session.player_active && !pokemon.is_fainted())
            .map(|(idx, _)| idx)
            .collect();
        self.pick(&candidates)
    }

    fn collect_forget_slot(&mut self, session: &BattleSession, _new_move: &str) -> ForgetChoice {
        let slots = session.player().moves.len() as i32;
        let roll = self.rng.uniform_int(0, slots + 1);
        if roll >= slots {
            ForgetChoice::Decline
        } else {
            ForgetChoice::Slot(roll as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        lines: Vec<String>,
        effects: Vec<EffectKind>,
        finished: Option<bool>,
    }

    impl Presenter for Recorder {
        fn present_line(&mut self, text: &str) {
            self.lines.push(text.to_string());
        }

        fn play_effect(&mut self, effect: EffectKind) {
            self.effects.push(effect);
        }

        fn battle_finished(&mut self, player_won: bool) {
            self.finished = Some(player_won);
        }
    }

    #[test]
    fn dispatch_routes_each_event_kind() {
        let mut recorder = Recorder::default();
        for event in [
            BattleEvent::Dialogue("hello".to_string()),
            BattleEvent::Effect(EffectKind::LevelUp),
            BattleEvent::Prompt(Decision::Action),
            BattleEvent::BattleFinished { player_won: false },
        ] {
            dispatch_event(&mut recorder, &event);
        }
        assert_eq!(recorder.lines, vec!["hello".to_string()]);
        assert_eq!(recorder.effects, vec![EffectKind::LevelUp]);
        assert_eq!(recorder.finished, Some(false));
    }
}
