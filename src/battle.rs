//! Top-level battle state machine.
//!
//! The controller owns the session and advances it one step at a time.
//! Steps that need a player decision park the pipeline in a selection phase;
//! the matching `choose_*` command resumes it. Everything the presentation
//! layer needs to show is queued as [`BattleEvent`]s.

use crate::config::EngineConfig;
use crate::error::BattleError;
use crate::model::{MoveDefinition, NUMBER_OF_LEARNABLE_MOVES};
use crate::rng::RandomSource;
use crate::sim::capture::{attempt_escape, shake_count, CAPTURE_SHAKES};
use crate::sim::damage::damage_messages;
use crate::sim::faint_handler::{experience_award, first_non_fainted, has_reserve};
use crate::sim::moves::{move_hits, resolve_primary, resolve_secondary_effects, PrimaryOutcome};
use crate::sim::pokemon::Pokemon;
use crate::sim::status::StatusRegistry;
use crate::sim::turn::determine_order;
pub use crate::sim::turn::Side;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    StartBattle,
    ActionSelection,
    MovementSelection,
    PerformMovement,
    Busy,
    PartySelectScreen,
    ForgetMovement,
    LoseTurn,
    FinishBattle,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BattleType {
    WildPokemon,
    Trainer,
    Leader,
}

impl BattleType {
    pub fn label(self) -> &'static str {
        match self {
            BattleType::WildPokemon => "wild",
            BattleType::Trainer => "trainer",
            BattleType::Leader => "leader",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BallKind {
    Poke,
    Great,
    Ultra,
    Master,
}

impl BallKind {
    pub fn bonus(self) -> f32 {
        match self {
            BallKind::Poke => 1.0,
            BallKind::Great => 1.5,
            BallKind::Ultra => 2.0,
            BallKind::Master => 255.0,
        }
    }
}

impl fmt::Display for BallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BallKind::Poke => "Poke Ball",
            BallKind::Great => "Great Ball",
            BallKind::Ultra => "Ultra Ball",
            BallKind::Master => "Master Ball",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionChoice {
    Fight,
    SwitchPokemon,
    ThrowBall(BallKind),
    Run,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ForgetChoice {
    Slot(usize),
    Decline,
}

/// What the pipeline is waiting for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Decision {
    Action,
    MoveSlot,
    PartyMember { forced: bool },
    ForgetMove { new_move: String },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Captured,
    Escaped,
}

impl BattleOutcome {
    pub fn player_won(self) -> bool {
        !matches!(self, BattleOutcome::Defeat)
    }
}

/// Audio-visual cues. The engine never waits on them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EffectKind {
    Attack(Side),
    Hit(Side),
    Faint(Side),
    Withdraw(Side),
    SendOut(Side),
    BallThrown,
    BallShake,
    BreakOut,
    Captured,
    LevelUp,
    BattleEnd,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BattleEvent {
    Dialogue(String),
    Effect(EffectKind),
    HpChanged {
        side: Side,
        name: String,
        hp: u32,
        max_hp: u32,
    },
    ExpChanged {
        name: String,
        experience: u32,
        next_level_at: u32,
    },
    LevelChanged {
        name: String,
        level: u32,
    },
    Prompt(Decision),
    BattleFinished {
        player_won: bool,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StepStatus {
    Continue,
    Awaiting(Decision),
    Finished(BattleOutcome),
}

#[derive(Clone, Debug)]
pub struct BattleSession {
    pub player_party: Vec<Pokemon>,
    pub player_active: usize,
    pub opponent_party: Vec<Pokemon>,
    pub opponent_active: usize,
    pub battle_type: BattleType,
    pub escape_attempts: u32,
    pub phase: Phase,
    /// Move waiting for a slot during the forget-move prompt.
    pub move_to_learn: Option<Arc<MoveDefinition>>,
    /// Slot replaced by the last forget-move choice.
    pub forget_slot: Option<usize>,
    forced_switch: bool,
    pending_send_out: bool,
}

impl BattleSession {
    pub fn player(&self) -> &Pokemon {
        &self.player_party[self.player_active]
    }

    pub fn opponent(&self) -> &Pokemon {
        &self.opponent_party[self.opponent_active]
    }

    pub fn active(&self, side: Side) -> &Pokemon {
        match side {
            Side::Player => self.player(),
            Side::Opponent => self.opponent(),
        }
    }

    fn active_mut(&mut self, side: Side) -> &mut Pokemon {
        match side {
            Side::Player => &mut self.player_party[self.player_active],
            Side::Opponent => &mut self.opponent_party[self.opponent_active],
        }
    }

    /// `(acting, other)` for the side that is moving.
    fn combatants_mut(&mut self, side: Side) -> (&mut Pokemon, &mut Pokemon) {
        let player = &mut self.player_party[self.player_active];
        let opponent = &mut self.opponent_party[self.opponent_active];
        match side {
            Side::Player => (player, opponent),
            Side::Opponent => (opponent, player),
        }
    }

    pub fn is_wild(&self) -> bool {
        self.battle_type == BattleType::WildPokemon
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Step {
    Intro,
    PromptAction,
    PromptParty,
    PromptForget,
    OpponentTurn,
    RunMove { side: Side, slot: Option<usize> },
    FinishMove(Side),
    Faint(Side),
    AwardExperience,
    LevelUp,
    FinishCheck(Side),
    TurnEnd,
    SwitchIn(usize),
    OpponentSendOut,
    ThrowBall(BallKind),
    Escape,
}

pub struct BattleController<R: RandomSource> {
    session: BattleSession,
    config: EngineConfig,
    statuses: StatusRegistry,
    rng: R,
    steps: VecDeque<Step>,
    events: VecDeque<BattleEvent>,
    resume_phase: Phase,
    outcome: Option<BattleOutcome>,
}

impl<R: RandomSource> BattleController<R> {
    pub fn start_wild_battle(
        roster: Vec<Pokemon>,
        wild: Pokemon,
        config: EngineConfig,
        rng: R,
    ) -> Result<Self, BattleError> {
        Self::start(roster, vec![wild], BattleType::WildPokemon, config, rng)
    }

    pub fn start_trainer_battle(
        roster: Vec<Pokemon>,
        opponent_roster: Vec<Pokemon>,
        is_leader: bool,
        config: EngineConfig,
        rng: R,
    ) -> Result<Self, BattleError> {
        let battle_type = if is_leader {
            BattleType::Leader
        } else {
            BattleType::Trainer
        };
        Self::start(roster, opponent_roster, battle_type, config, rng)
    }

    fn start(
        roster: Vec<Pokemon>,
        opponent_roster: Vec<Pokemon>,
        battle_type: BattleType,
        config: EngineConfig,
        rng: R,
    ) -> Result<Self, BattleError> {
        assert!(
            roster.len() <= config.max_party_size,
            "roster of {} exceeds the party limit of {}",
            roster.len(),
            config.max_party_size
        );
        for pokemon in roster.iter().chain(opponent_roster.iter()) {
            assert!(pokemon.moves.len() <= NUMBER_OF_LEARNABLE_MOVES);
            assert!(pokemon.current_hp <= pokemon.max_hp());
        }
        let player_active = first_non_fainted(&roster).ok_or(BattleError::NoUsablePokemon("player"))?;
        let opponent_active =
            first_non_fainted(&opponent_roster).ok_or(BattleError::NoUsablePokemon("opponent"))?;

        info!(battle_type = battle_type.label(), "battle started");
        Ok(Self {
            session: BattleSession {
                player_party: roster,
                player_active,
                opponent_party: opponent_roster,
                opponent_active,
                battle_type,
                escape_attempts: 0,
                phase: Phase::StartBattle,
                move_to_learn: None,
                forget_slot: None,
                forced_switch: false,
                pending_send_out: false,
            },
            config,
            statuses: StatusRegistry::standard(),
            rng,
            steps: VecDeque::from([Step::Intro]),
            events: VecDeque::new(),
            resume_phase: Phase::Busy,
            outcome: None,
        })
    }

    /// Replaces the standard status table.
    pub fn with_status_registry(mut self, mut registry: StatusRegistry) -> Self {
        registry.init();
        self.statuses = registry;
        self
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn session(&self) -> &BattleSession {
        &self.session
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.events.drain(..).collect()
    }

    /// Gives the roster back once the battle is over (or abandoned).
    pub fn into_roster(self) -> Vec<Pokemon> {
        self.session.player_party
    }

    pub fn pending_decision(&self) -> Option<Decision> {
        match self.session.phase {
            Phase::ActionSelection => Some(Decision::Action),
            Phase::MovementSelection => Some(Decision::MoveSlot),
            Phase::PartySelectScreen => Some(Decision::PartyMember {
                forced: self.session.forced_switch,
            }),
            Phase::ForgetMovement => self
                .session
                .move_to_learn
                .as_ref()
                .map(|definition| Decision::ForgetMove {
                    new_move: definition.name.clone(),
                }),
            _ => None,
        }
    }

    /// Runs the next queued step.
    pub fn advance(&mut self) -> StepStatus {
        if let Some(outcome) = self.outcome {
            return StepStatus::Finished(outcome);
        }
        if let Some(decision) = self.pending_decision() {
            return StepStatus::Awaiting(decision);
        }
        let step = self.steps.pop_front().unwrap_or_else(|| {
            debug!(phase = ?self.session.phase, "pipeline idle");
            Step::PromptAction
        });
        self.run_step(step);
        match (self.outcome, self.pending_decision()) {
            (Some(outcome), _) => StepStatus::Finished(outcome),
            (None, Some(decision)) => StepStatus::Awaiting(decision),
            (None, None) => StepStatus::Continue,
        }
    }

    /// Advances until a decision is needed or the battle is over.
    pub fn run_until_blocked(&mut self) -> StepStatus {
        loop {
            match self.advance() {
                StepStatus::Continue => continue,
                status => return status,
            }
        }
    }

    pub fn choose_action(&mut self, action: ActionChoice) -> Result<(), BattleError> {
        self.expect_phase(Phase::ActionSelection, "ActionSelection")?;
        match action {
            ActionChoice::Fight => {
                if self.session.player().has_usable_move() {
                    self.set_phase(Phase::MovementSelection);
                    self.events.push_back(BattleEvent::Prompt(Decision::MoveSlot));
                } else {
                    let name = self.session.player().name().to_string();
                    self.say(format!("{name} has no moves left!"));
                    self.lose_turn();
                }
            }
            ActionChoice::SwitchPokemon => {
                self.set_phase(Phase::PartySelectScreen);
                self.events
                    .push_back(BattleEvent::Prompt(Decision::PartyMember { forced: false }));
            }
            ActionChoice::ThrowBall(kind) => {
                self.set_phase(Phase::Busy);
                self.steps.push_back(Step::ThrowBall(kind));
            }
            ActionChoice::Run => {
                self.set_phase(Phase::Busy);
                self.steps.push_back(Step::Escape);
            }
        }
        Ok(())
    }

    /// Commits a move. The turn order is fixed here.
    pub fn choose_move(&mut self, slot: usize) -> Result<(), BattleError> {
        self.expect_phase(Phase::MovementSelection, "MovementSelection")?;
        let move_slot = self
            .session
            .player()
            .moves
            .get(slot)
            .ok_or(BattleError::MoveSlotOutOfRange(slot))?;
        if move_slot.pp == 0 {
            return Err(BattleError::NoPpLeft(slot));
        }
        let order = determine_order(self.session.player(), self.session.opponent());
        self.set_phase(Phase::PerformMovement);
        for side in order {
            let slot = (side == Side::Player).then_some(slot);
            self.steps.push_back(Step::RunMove { side, slot });
        }
        self.steps.push_back(Step::TurnEnd);
        Ok(())
    }

    pub fn choose_party_member(&mut self, index: usize) -> Result<(), BattleError> {
        self.expect_phase(Phase::PartySelectScreen, "PartySelectScreen")?;
        let pokemon = self
            .session
            .player_party
            .get(index)
            .ok_or(BattleError::PartySlotOutOfRange(index))?;
        if pokemon.is_fainted() {
            return Err(BattleError::FaintedPartyMember(index));
        }
        if index == self.session.player_active {
            return Err(BattleError::AlreadyInBattle(index));
        }
        self.set_phase(Phase::Busy);
        self.steps.push_front(Step::SwitchIn(index));
        Ok(())
    }

    pub fn choose_forget_move(&mut self, choice: ForgetChoice) -> Result<(), BattleError> {
        self.expect_phase(Phase::ForgetMovement, "ForgetMovement")?;
        let Some(new_move) = self.session.move_to_learn.clone() else {
            return Err(BattleError::WrongPhase {
                expected: "ForgetMovement",
                actual: self.session.phase,
            });
        };
        let player = self.session.active_mut(Side::Player);
        let name = player.name().to_string();
        let line = match choice {
            ForgetChoice::Slot(slot) => {
                if slot >= player.moves.len() {
                    return Err(BattleError::MoveSlotOutOfRange(slot));
                }
                let forgotten = player.replace_move(slot, Arc::clone(&new_move));
                self.session.forget_slot = Some(slot);
                format!(
                    "{name} forgot {} and learned {}!",
                    forgotten.name(),
                    new_move.name
                )
            }
            ForgetChoice::Decline => {
                self.session.forget_slot = None;
                format!("{name} did not learn {}.", new_move.name)
            }
        };
        self.say(line);
        self.session.move_to_learn = None;
        self.set_phase(self.resume_phase);
        Ok(())
    }

    /// Backs out of move or party selection. A forced switch cannot be cancelled.
    pub fn cancel(&mut self) -> Result<(), BattleError> {
        match self.session.phase {
            Phase::MovementSelection => {}
            Phase::PartySelectScreen if self.session.forced_switch => {
                return Err(BattleError::ForcedSwitch);
            }
            Phase::PartySelectScreen => {}
            actual => {
                return Err(BattleError::WrongPhase {
                    expected: "MovementSelection or PartySelectScreen",
                    actual,
                })
            }
        }
        self.set_phase(Phase::ActionSelection);
        self.events.push_back(BattleEvent::Prompt(Decision::Action));
        Ok(())
    }

    fn expect_phase(&self, expected: Phase, label: &'static str) -> Result<(), BattleError> {
        if self.session.phase == expected {
            Ok(())
        } else {
            Err(BattleError::WrongPhase {
                expected: label,
                actual: self.session.phase,
            })
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.session.phase != phase {
            debug!(from = ?self.session.phase, to = ?phase, "phase change");
        }
        self.session.phase = phase;
    }

    fn say(&mut self, line: impl Into<String>) {
        self.events.push_back(BattleEvent::Dialogue(line.into()));
    }

    fn effect(&mut self, effect: EffectKind) {
        self.events.push_back(BattleEvent::Effect(effect));
    }

    fn flush_messages(&mut self, side: Side) {
        let lines = self.session.active_mut(side).drain_messages();
        self.events.extend(lines.into_iter().map(BattleEvent::Dialogue));
    }

    fn refresh_hp(&mut self, side: Side) {
        let pokemon = self.session.active_mut(side);
        pokemon.hp_changed = false;
        let event = BattleEvent::HpChanged {
            side,
            name: pokemon.name().to_string(),
            hp: pokemon.current_hp,
            max_hp: pokemon.max_hp(),
        };
        self.events.push_back(event);
    }

    fn refresh_experience(&mut self) {
        let player = self.session.player();
        let event = BattleEvent::ExpChanged {
            name: player.name().to_string(),
            experience: player.experience,
            next_level_at: player.species.necessary_exp_for_level(player.level + 1),
        };
        self.events.push_back(event);
    }

    /// The turn is consumed and the opponent acts next.
    fn lose_turn(&mut self) {
        self.set_phase(Phase::LoseTurn);
        self.steps.push_back(Step::OpponentTurn);
        self.steps.push_back(Step::TurnEnd);
    }

    fn finish(&mut self, outcome: BattleOutcome) {
        self.set_phase(Phase::FinishBattle);
        for pokemon in &mut self.session.player_party {
            pokemon.on_battle_finish();
        }
        self.steps.clear();
        self.effect(EffectKind::BattleEnd);
        self.events.push_back(BattleEvent::BattleFinished {
            player_won: outcome.player_won(),
        });
        self.outcome = Some(outcome);
        info!(?outcome, "battle finished");
    }

    fn run_step(&mut self, step: Step) {
        match step {
            Step::Intro => self.intro(),
            Step::PromptAction => {
                self.set_phase(Phase::ActionSelection);
                self.events.push_back(BattleEvent::Prompt(Decision::Action));
            }
            Step::PromptParty => {
                self.set_phase(Phase::PartySelectScreen);
                self.events.push_back(BattleEvent::Prompt(Decision::PartyMember {
                    forced: self.session.forced_switch,
                }));
            }
            Step::PromptForget => self.prompt_forget(),
            Step::OpponentTurn => {
                self.set_phase(Phase::PerformMovement);
                self.steps.push_front(Step::RunMove {
                    side: Side::Opponent,
                    slot: None,
                });
            }
            Step::RunMove { side, slot } => self.run_move(side, slot),
            Step::FinishMove(side) => self.finish_move(side),
            Step::Faint(side) => self.handle_faint(side),
            Step::AwardExperience => self.award_experience(),
            Step::LevelUp => self.level_up(),
            Step::FinishCheck(side) => self.check_for_battle_finish(side),
            Step::TurnEnd => self.turn_end(),
            Step::SwitchIn(index) => self.switch_in(index),
            Step::OpponentSendOut => self.opponent_send_out(),
            Step::ThrowBall(kind) => self.throw_ball(kind),
            Step::Escape => self.try_to_escape(),
        }
    }

    fn intro(&mut self) {
        let name = self.session.opponent().name().to_string();
        let line = match self.session.battle_type {
            BattleType::WildPokemon => format!("A wild {name} appeared!"),
            BattleType::Trainer => format!("The opposing trainer sent out {name}!"),
            BattleType::Leader => format!("The gym leader sent out {name}!"),
        };
        self.say(line);
        self.refresh_hp(Side::Player);
        self.refresh_hp(Side::Opponent);
        self.refresh_experience();
        self.steps.push_front(Step::PromptAction);
    }

    fn prompt_forget(&mut self) {
        self.say("Choose a move to forget.");
        self.resume_phase = self.session.phase;
        self.set_phase(Phase::ForgetMovement);
        if let Some(definition) = &self.session.move_to_learn {
            let decision = Decision::ForgetMove {
                new_move: definition.name.clone(),
            };
            self.events.push_back(BattleEvent::Prompt(decision));
        }
    }

    fn run_move(&mut self, side: Side, slot: Option<usize>) {
        if self.session.phase != Phase::PerformMovement {
            debug!(?side, phase = ?self.session.phase, "move skipped");
            return;
        }
        if self.session.active(side).is_fainted() {
            return;
        }
        let slot = match slot {
            Some(slot) => slot,
            None => match self.session.active(side).random_move(&mut self.rng) {
                Some(slot) => slot,
                None => {
                    let name = self.session.active(side).name().to_string();
                    self.say(format!("{name} has no moves left!"));
                    self.steps.push_front(Step::FinishMove(side));
                    return;
                }
            },
        };

        let can_act = self
            .session
            .active_mut(side)
            .on_start_turn(&self.statuses, &mut self.rng);
        self.flush_messages(side);
        if !can_act {
            self.refresh_hp(side);
            if self.session.active(side).is_fainted() {
                self.steps.push_front(Step::Faint(side));
            }
            return;
        }

        let move_def = {
            let move_slot = &mut self.session.active_mut(side).moves[slot];
            move_slot.pp = move_slot.pp.saturating_sub(1);
            Arc::clone(&move_slot.definition)
        };
        let attacker_name = self.session.active(side).name().to_string();
        self.say(format!("{attacker_name} used {}!", move_def.name));

        let target_side = side.opponent();
        let mut target_fainted = false;
        if move_hits(&move_def, self.session.active(side), &mut self.rng) {
            self.effect(EffectKind::Attack(side));
            self.effect(EffectKind::Hit(target_side));

            let outcome = {
                let (attacker, target) = self.session.combatants_mut(side);
                resolve_primary(
                    &move_def,
                    attacker,
                    target,
                    &self.statuses,
                    &self.config,
                    &mut self.rng,
                )
            };
            match outcome {
                PrimaryOutcome::StatEffect => {
                    self.flush_messages(side);
                    self.flush_messages(target_side);
                }
                PrimaryOutcome::Damage(description) => {
                    self.refresh_hp(target_side);
                    for line in damage_messages(&description) {
                        self.say(line);
                    }
                }
            }

            {
                let (attacker, target) = self.session.combatants_mut(side);
                resolve_secondary_effects(&move_def, attacker, target, &self.statuses, &mut self.rng);
            }
            self.flush_messages(side);
            self.flush_messages(target_side);

            target_fainted = self.session.active(target_side).is_fainted();
        } else {
            self.say(format!("{attacker_name}'s attack missed!"));
        }

        self.steps.push_front(Step::FinishMove(side));
        if target_fainted {
            self.steps.push_front(Step::Faint(target_side));
        }
    }

    fn finish_move(&mut self, side: Side) {
        if self.session.active(side).is_fainted() {
            return;
        }
        self.session.active_mut(side).on_finish_turn(&self.statuses);
        self.flush_messages(side);
        self.refresh_hp(side);
        if self.session.active(side).is_fainted() {
            self.steps.push_front(Step::Faint(side));
        }
    }

    fn handle_faint(&mut self, side: Side) {
        let name = self.session.active(side).name().to_string();
        self.say(format!("{name} fainted!"));
        self.effect(EffectKind::Faint(side));
        self.set_phase(Phase::Busy);
        self.steps.push_front(Step::FinishCheck(side));
        if side == Side::Opponent {
            self.steps.push_front(Step::LevelUp);
            self.steps.push_front(Step::AwardExperience);
        }
    }

    fn award_experience(&mut self) {
        let amount = experience_award(
            self.session.opponent(),
            self.session.is_wild(),
            &self.config.experience,
        );
        let player = self.session.active_mut(Side::Player);
        player.experience += amount;
        let name = player.name().to_string();
        info!(pokemon = %name, amount, total = player.experience, "experience awarded");
        self.say(format!("{name} gained {amount} EXP. Points!"));
        self.refresh_experience();
    }

    /// One level per run; re-queues itself until the threshold is no longer met.
    fn level_up(&mut self) {
        let player = self.session.active_mut(Side::Player);
        if !player.needs_to_level_up() {
            return;
        }
        let name = player.name().to_string();
        let level = player.level;
        let learnable = player.learnable_move_at_current_level();

        self.effect(EffectKind::LevelUp);
        self.events.push_back(BattleEvent::LevelChanged {
            name: name.clone(),
            level,
        });
        self.refresh_hp(Side::Player);
        self.say(format!("{name} grew to level {level}!"));
        self.steps.push_front(Step::LevelUp);

        if let Some(new_move) = learnable {
            let player = self.session.active_mut(Side::Player);
            if player.moves.len() < NUMBER_OF_LEARNABLE_MOVES {
                player.learn_move(Arc::clone(&new_move));
                self.say(format!("{name} learned {}!", new_move.name));
            } else {
                self.say(format!("{name} is trying to learn {}.", new_move.name));
                self.say(format!(
                    "But {name} can't learn more than {NUMBER_OF_LEARNABLE_MOVES} moves."
                ));
                self.session.move_to_learn = Some(new_move);
                self.steps.push_front(Step::PromptForget);
            }
        }
        self.refresh_experience();
    }

    fn check_for_battle_finish(&mut self, side: Side) {
        match side {
            Side::Player => {
                if has_reserve(&self.session.player_party, self.session.player_active) {
                    self.session.forced_switch = true;
                } else {
                    self.finish(BattleOutcome::Defeat);
                }
            }
            Side::Opponent => {
                if !self.session.is_wild()
                    && has_reserve(&self.session.opponent_party, self.session.opponent_active)
                {
                    self.session.pending_send_out = true;
                } else {
                    self.finish(BattleOutcome::Victory);
                }
            }
        }
    }

    fn turn_end(&mut self) {
        if self.session.pending_send_out {
            self.session.pending_send_out = false;
            self.steps.push_front(Step::TurnEnd);
            self.steps.push_front(Step::OpponentSendOut);
        } else if self.session.forced_switch {
            self.steps.push_front(Step::PromptParty);
        } else {
            self.steps.push_front(Step::PromptAction);
        }
    }

    fn switch_in(&mut self, index: usize) {
        let forced = self.session.forced_switch;
        if !self.session.player().is_fainted() {
            let name = self.session.player().name().to_string();
            self.say(format!("{name}, come back!"));
            self.effect(EffectKind::Withdraw(Side::Player));
        }
        self.session.player_active = index;
        let name = self.session.player().name().to_string();
        self.say(format!("Go, {name}!"));
        self.effect(EffectKind::SendOut(Side::Player));
        self.refresh_hp(Side::Player);
        self.refresh_experience();

        self.steps.push_front(Step::TurnEnd);
        if forced {
            self.session.forced_switch = false;
        } else {
            self.steps.push_front(Step::OpponentTurn);
        }
    }

    fn opponent_send_out(&mut self) {
        let Some(next) = first_non_fainted(&self.session.opponent_party) else {
            self.finish(BattleOutcome::Victory);
            return;
        };
        self.session.opponent_active = next;
        let name = self.session.opponent().name().to_string();
        let line = match self.session.battle_type {
            BattleType::Leader => format!("The gym leader sent out {name}!"),
            _ => format!("The opposing trainer sent out {name}!"),
        };
        self.say(line);
        self.effect(EffectKind::SendOut(Side::Opponent));
        self.refresh_hp(Side::Opponent);
    }

    fn throw_ball(&mut self, kind: BallKind) {
        if !self.session.is_wild() {
            self.say("You can't steal another trainer's Pokemon!");
            self.lose_turn();
            return;
        }
        self.say(format!("You threw a {kind}!"));
        self.effect(EffectKind::BallThrown);

        let shakes = shake_count(
            self.session.opponent(),
            kind.bonus(),
            &self.config.capture,
            &mut self.rng,
        );
        for _ in 0..shakes.min(CAPTURE_SHAKES - 1) {
            self.effect(EffectKind::BallShake);
        }

        let name = self.session.opponent().name().to_string();
        if shakes == CAPTURE_SHAKES {
            self.say(format!("Gotcha! {name} was caught!"));
            self.effect(EffectKind::Captured);
            if self.session.player_party.len() < self.config.max_party_size {
                let caught = self.session.opponent().clone();
                self.session.player_party.push(caught);
                self.say(format!("{name} was added to your team."));
            } else {
                self.say(format!("{name} was sent to the PC."));
            }
            self.finish(BattleOutcome::Captured);
        } else {
            self.effect(EffectKind::BreakOut);
            if shakes < 2 {
                self.say(format!("Oh no! {name} broke free!"));
            } else {
                self.say("Aww! It appeared to be caught!");
            }
            self.lose_turn();
        }
    }

    fn try_to_escape(&mut self) {
        if !self.session.is_wild() {
            self.say("There's no running from a trainer battle!");
            self.lose_turn();
            return;
        }
        self.session.escape_attempts += 1;
        let escaped = attempt_escape(
            self.session.player().speed(),
            self.session.opponent().speed(),
            self.session.escape_attempts,
            &self.config.escape,
            &mut self.rng,
        );
        if escaped {
            self.say("Got away safely!");
            self.finish(BattleOutcome::Escaped);
        } else {
            self.say("Can't escape!");
            self.lose_turn();
        }
    }
}
