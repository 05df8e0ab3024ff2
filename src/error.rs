use crate::battle::Phase;
use thiserror::Error;

/// Rejected commands and structural problems. Gameplay outcomes such as a
/// miss, a faint or a failed capture are never reported through this type.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BattleError {
    #[error("command not accepted during the {actual:?} phase (expected {expected})")]
    WrongPhase { expected: &'static str, actual: Phase },

    #[error("move slot {0} does not exist")]
    MoveSlotOutOfRange(usize),

    #[error("move slot {0} has no PP left")]
    NoPpLeft(usize),

    #[error("party slot {0} does not exist")]
    PartySlotOutOfRange(usize),

    #[error("party member {0} has fainted")]
    FaintedPartyMember(usize),

    #[error("party member {0} is already in battle")]
    AlreadyInBattle(usize),

    #[error("a fainted Pokemon must be replaced; the selection cannot be cancelled")]
    ForcedSwitch,

    #[error("no Pokemon able to battle in the {0} roster")]
    NoUsablePokemon(&'static str),

    #[error("gave up after {0} invalid selections in a row")]
    SelectionRetriesExhausted(usize),

    #[error("battle did not finish within {0} steps")]
    Stalled(usize),
}

impl BattleError {
    /// Invalid selections are recovered by prompting again without any state change.
    pub fn is_invalid_selection(&self) -> bool {
        matches!(
            self,
            BattleError::MoveSlotOutOfRange(_)
                | BattleError::NoPpLeft(_)
                | BattleError::PartySlotOutOfRange(_)
                | BattleError::FaintedPartyMember(_)
                | BattleError::AlreadyInBattle(_)
                | BattleError::ForcedSwitch
        )
    }
}
