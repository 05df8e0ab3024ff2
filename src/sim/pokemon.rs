use crate::model::{MoveDefinition, Species, MAX_LEVEL, NUMBER_OF_LEARNABLE_MOVES};
use crate::rng::RandomSource;
use crate::sim::damage::{compute_damage, DamageDescription};
use crate::sim::stats::{apply_stage_multiplier, Stat, StatStages, StatsSet};
use crate::sim::status::{StatusCategory, StatusConditionId, StatusRegistry};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace};

/// One known move and the uses left for it.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveSlot {
    pub definition: Arc<MoveDefinition>,
    pub pp: u32,
}

impl MoveSlot {
    pub fn new(definition: Arc<MoveDefinition>) -> Self {
        let pp = definition.pp;
        Self { definition, pp }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Battle-relevant state of one creature instance.
#[derive(Clone, Debug)]
pub struct Pokemon {
    pub species: Arc<Species>,
    pub level: u32,
    pub experience: u32,
    pub stats: StatsSet,
    pub current_hp: u32,
    pub stat_stages: StatStages,
    pub status: Option<StatusConditionId>,
    pub volatile_status: Option<StatusConditionId>,
    pub status_turns: i32,
    pub volatile_status_turns: i32,
    pub moves: Vec<MoveSlot>,
    /// Set whenever HP changes; cleared by whoever refreshes the HUD.
    pub hp_changed: bool,
    messages: VecDeque<String>,
}

impl Pokemon {
    /// Full HP, the experience matching `level`, and the first learnset moves
    /// available at `level`.
    pub fn new(species: Arc<Species>, level: u32) -> Self {
        let level = level.clamp(1, MAX_LEVEL);
        let stats = StatsSet::from_base(&species.base_stats, level);
        let mut moves = Vec::with_capacity(NUMBER_OF_LEARNABLE_MOVES);
        for learnable in &species.learnable_moves {
            if learnable.level <= level {
                moves.push(MoveSlot::new(Arc::clone(&learnable.definition)));
            }
            if moves.len() >= NUMBER_OF_LEARNABLE_MOVES {
                break;
            }
        }
        let experience = species.necessary_exp_for_level(level);
        Self {
            species,
            level,
            experience,
            current_hp: stats.max_hp,
            stats,
            stat_stages: StatStages::default(),
            status: None,
            volatile_status: None,
            status_turns: 0,
            volatile_status_turns: 0,
            moves,
            hp_changed: false,
            messages: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.species.name
    }

    pub fn max_hp(&self) -> u32 {
        self.stats.max_hp
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    /// Raw stat scaled by its boost stage. Accuracy and evasion have no value
    /// of their own and report their stage instead.
    pub fn stat_value(&self, stat: Stat) -> u32 {
        match self.stats.raw(stat) {
            Some(raw) => apply_stage_multiplier(raw, self.stat_stages.get(stat)),
            None => self.stat_stages.get(stat).max(0) as u32,
        }
    }

    pub fn attack(&self) -> u32 {
        self.stat_value(Stat::Attack)
    }

    pub fn defense(&self) -> u32 {
        self.stat_value(Stat::Defense)
    }

    pub fn sp_attack(&self) -> u32 {
        self.stat_value(Stat::SpAttack)
    }

    pub fn sp_defense(&self) -> u32 {
        self.stat_value(Stat::SpDefense)
    }

    pub fn speed(&self) -> u32 {
        self.stat_value(Stat::Speed)
    }

    pub fn enqueue_message(&mut self, message: impl Into<String>) {
        self.messages.push_back(message.into());
    }

    pub fn pop_message(&mut self) -> Option<String> {
        self.messages.pop_front()
    }

    pub fn drain_messages(&mut self) -> Vec<String> {
        self.messages.drain(..).collect()
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    /// Subtracts `damage` from HP, never going below zero.
    pub fn update_hp(&mut self, damage: u32) {
        self.current_hp = self.current_hp.saturating_sub(damage);
        self.hp_changed = true;
    }

    pub fn apply_boost(&mut self, stat: Stat, stages: i32) {
        let applied = self.stat_stages.apply(stat, stages);
        trace!(pokemon = self.name(), ?stat, stages, applied, "boost applied");
        let message = match (stages.signum(), applied) {
            (1, 0) => format!("{}'s {} won't go any higher!", self.name(), stat),
            (-1, 0) => format!("{}'s {} won't go any lower!", self.name(), stat),
            (1, 1) => format!("{}'s {} rose!", self.name(), stat),
            (1, _) => format!("{}'s {} rose sharply!", self.name(), stat),
            (-1, -1) => format!("{}'s {} fell!", self.name(), stat),
            (-1, _) => format!("{}'s {} harshly fell!", self.name(), stat),
            _ => format!("Nothing happened to {}'s {}.", self.name(), stat),
        };
        self.enqueue_message(message);
    }

    /// Installs a persistent condition. No-op if one is already present.
    pub fn set_status(
        &mut self,
        id: StatusConditionId,
        registry: &StatusRegistry,
        rng: &mut dyn RandomSource,
    ) -> bool {
        debug_assert_eq!(id.category(), StatusCategory::Persistent);
        if self.status.is_some() {
            return false;
        }
        let condition = registry.get(id);
        self.status = Some(id);
        if let Some(on_apply) = condition.on_apply {
            on_apply(self, rng);
        }
        self.enqueue_message(format!("{} {}", self.name(), condition.start_message));
        true
    }

    /// Installs a volatile condition. No-op if one is already present.
    pub fn set_volatile_status(
        &mut self,
        id: StatusConditionId,
        registry: &StatusRegistry,
        rng: &mut dyn RandomSource,
    ) -> bool {
        debug_assert_eq!(id.category(), StatusCategory::Volatile);
        if self.volatile_status.is_some() {
            return false;
        }
        let condition = registry.get(id);
        self.volatile_status = Some(id);
        if let Some(on_apply) = condition.on_apply {
            on_apply(self, rng);
        }
        self.enqueue_message(format!("{} {}", self.name(), condition.start_message));
        true
    }

    pub fn cure_status(&mut self) {
        self.status = None;
        self.status_turns = 0;
    }

    pub fn cure_volatile_status(&mut self) {
        self.volatile_status = None;
        self.volatile_status_turns = 0;
    }

    /// Rolls damage for `move_def` used by `attacker` and subtracts it.
    pub fn receive_damage(
        &mut self,
        attacker: &Pokemon,
        move_def: &MoveDefinition,
        critical_chance: f32,
        critical_multiplier: f32,
        rng: &mut dyn RandomSource,
    ) -> DamageDescription {
        let mut description =
            compute_damage(attacker, self, move_def, critical_chance, critical_multiplier, rng);
        self.update_hp(description.damage);
        description.fainted = self.is_fainted();
        debug!(
            attacker = attacker.name(),
            target = self.name(),
            damage = description.damage,
            hp = self.current_hp,
            "damage received"
        );
        description
    }

    /// Runs the persistent then the volatile start-of-turn hook. Returns
    /// false if either one prevents the creature from acting.
    pub fn on_start_turn(&mut self, registry: &StatusRegistry, rng: &mut dyn RandomSource) -> bool {
        let mut can_act = true;
        if let Some(hook) = self.status.and_then(|id| registry.get(id).on_start_turn) {
            if !hook(self, rng) {
                can_act = false;
            }
        }
        if let Some(hook) = self.volatile_status.and_then(|id| registry.get(id).on_start_turn) {
            if !hook(self, rng) {
                can_act = false;
            }
        }
        can_act
    }

    pub fn on_finish_turn(&mut self, registry: &StatusRegistry) {
        if let Some(hook) = self.status.and_then(|id| registry.get(id).on_finish_turn) {
            hook(self);
        }
    }

    /// Volatile state is cleared; persistent status stays with the creature.
    pub fn on_battle_finish(&mut self) {
        self.cure_volatile_status();
        self.stat_stages.reset();
        self.messages.clear();
    }

    /// Picks a random slot that still has PP.
    pub fn random_move(&self, rng: &mut dyn RandomSource) -> Option<usize> {
        let usable: Vec<usize> = self
            .moves
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.pp > 0)
            .map(|(idx, _)| idx)
            .collect();
        if usable.is_empty() {
            return None;
        }
        let pick = rng.uniform_int(0, usable.len() as i32) as usize;
        Some(usable[pick])
    }

    pub fn has_usable_move(&self) -> bool {
        self.moves.iter().any(|slot| slot.pp > 0)
    }

    /// Gains one level if the experience reached the next threshold. Max HP
    /// grows and current HP grows by the same amount.
    pub fn needs_to_level_up(&mut self) -> bool {
        if self.level >= MAX_LEVEL {
            return false;
        }
        if self.experience < self.species.necessary_exp_for_level(self.level + 1) {
            return false;
        }
        let previous_max_hp = self.max_hp();
        self.level += 1;
        self.stats = StatsSet::from_base(&self.species.base_stats, self.level);
        self.current_hp += self.max_hp().saturating_sub(previous_max_hp);
        self.current_hp = self.current_hp.min(self.max_hp());
        self.hp_changed = true;
        debug!(pokemon = self.name(), level = self.level, "level up");
        true
    }

    pub fn learnable_move_at_current_level(&self) -> Option<Arc<MoveDefinition>> {
        self.species
            .learnable_move_at_level(self.level)
            .filter(|definition| !self.knows_move(&definition.name))
            .cloned()
    }

    pub fn knows_move(&self, name: &str) -> bool {
        self.moves.iter().any(|slot| slot.name() == name)
    }

    pub fn learn_move(&mut self, definition: Arc<MoveDefinition>) {
        assert!(
            self.moves.len() < NUMBER_OF_LEARNABLE_MOVES,
            "{} already knows {} moves",
            self.name(),
            NUMBER_OF_LEARNABLE_MOVES
        );
        self.moves.push(MoveSlot::new(definition));
    }

    /// Replaces the move in `slot`, returning the forgotten one.
    pub fn replace_move(&mut self, slot: usize, definition: Arc<MoveDefinition>) -> MoveSlot {
        std::mem::replace(&mut self.moves[slot], MoveSlot::new(definition))
    }
}
