//! State machine trait for phase enums.
//!
//! Gives explicit phase enums a single way to validate and perform
//! transitions instead of juggling boolean flags.

use super::ValidationError;

/// Trait for enums that represent a finite-state machine.
///
/// Implementors list their transition table; validated transitions and
/// terminal detection come for free.
///
/// # Example
///
/// ```ignore
/// let next = HandlerPhase::Gathering.transition_to(HandlerPhase::Ready)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_transition(self, target))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
