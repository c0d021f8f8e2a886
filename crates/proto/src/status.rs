//! # Delegator Contract Status Derivation
//!
//! The contract only moves to a terminal stage when someone sends a
//! transaction that reports it. Between the deadline passing and that
//! report, the stored `state` is stale. `state_cur` is the client-side view
//! that accounts for elapsed rounds.
//!
//! ## Rules
//!
//! | stored `state` | condition | `state_cur` |
//! |----------------|-----------|-------------|
//! | `Ready` | `round >= round_start + rounds_setup` | `EndedNotSubmitted` |
//! | `Submitted` | `round >= round_start + rounds_setup + rounds_confirm` | `EndedNotConfirmed` |
//! | `Live` | `round >= round_end` | `EndedExpired` |
//! | anything else | | unchanged |
//!
//! ## Invariants
//!
//! 1. Pure: same inputs, same output; no logging, no I/O.
//! 2. Terminal codes are absorbing.
//! 3. Monotone in `round`: once a deadline has passed it stays passed.
//! 4. Deadline sums saturate instead of overflowing.

use crate::state::ContractState;

/// Inputs needed to derive `state_cur`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInputs {
    pub state: ContractState,
    pub round_start: u64,
    pub round_end: u64,
    pub rounds_setup: u64,
    pub rounds_confirm: u64,
}

/// Compute the effective contract status at `round`.
pub fn derive_state_cur(
    state: ContractState,
    round_start: u64,
    round_end: u64,
    rounds_setup: u64,
    rounds_confirm: u64,
    round: u64,
) -> ContractState {
    match state {
        ContractState::Ready => {
            let deadline = round_start.saturating_add(rounds_setup);
            if round >= deadline {
                ContractState::EndedNotSubmitted
            } else {
                state
            }
        }
        ContractState::Submitted => {
            let deadline = round_start
                .saturating_add(rounds_setup)
                .saturating_add(rounds_confirm);
            if round >= deadline {
                ContractState::EndedNotConfirmed
            } else {
                state
            }
        }
        ContractState::Live => {
            if round >= round_end {
                ContractState::EndedExpired
            } else {
                state
            }
        }
        // ended codes are absorbing; unexpected codes pass through
        other => other,
    }
}

impl StatusInputs {
    pub fn derive(&self, round: u64) -> ContractState {
        derive_state_cur(
            self.state,
            self.round_start,
            self.round_end,
            self.rounds_setup,
            self.rounds_confirm,
            round,
        )
    }

    /// First round at which the stored state stops being current, if any.
    pub fn deadline(&self) -> Option<u64> {
        match self.state {
            ContractState::Ready => Some(self.round_start.saturating_add(self.rounds_setup)),
            ContractState::Submitted => Some(
                self.round_start
                    .saturating_add(self.rounds_setup)
                    .saturating_add(self.rounds_confirm),
            ),
            ContractState::Live => Some(self.round_end),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(state: ContractState) -> StatusInputs {
        StatusInputs {
            state,
            round_start: 100,
            round_end: 1_000,
            rounds_setup: 10,
            rounds_confirm: 5,
        }
    }

    #[test]
    fn test_submitted_boundary() {
        let i = inputs(ContractState::Submitted);
        assert_eq!(i.derive(114), ContractState::Submitted);
        assert_eq!(i.derive(115), ContractState::EndedNotConfirmed);
    }

    #[test]
    fn test_ready_boundary() {
        let i = inputs(ContractState::Ready);
        assert_eq!(i.derive(109), ContractState::Ready);
        assert_eq!(i.derive(110), ContractState::EndedNotSubmitted);
    }

    #[test]
    fn test_live_boundary() {
        let i = inputs(ContractState::Live);
        assert_eq!(i.derive(999), ContractState::Live);
        assert_eq!(i.derive(1_000), ContractState::EndedExpired);
    }

    #[test]
    fn test_ended_states_absorbing() {
        for code in 0x10u8..=0x17 {
            let state = ContractState::from_byte(code);
            let i = inputs(state);
            for round in [0, 50, 114, 115, 1_000, u64::MAX] {
                assert_eq!(i.derive(round), state);
            }
        }
    }

    #[test]
    fn test_unexpected_states_pass_through() {
        for state in [ContractState::NotDefined, ContractState::Unknown(0x42)] {
            assert_eq!(inputs(state).derive(u64::MAX), state);
        }
    }

    #[test]
    fn test_saturating_deadline() {
        let i = StatusInputs {
            state: ContractState::Submitted,
            round_start: u64::MAX - 1,
            round_end: 0,
            rounds_setup: 10,
            rounds_confirm: 10,
        };
        assert_eq!(i.deadline(), Some(u64::MAX));
        assert_eq!(i.derive(u64::MAX - 1), ContractState::Submitted);
        assert_eq!(i.derive(u64::MAX), ContractState::EndedNotConfirmed);
    }

    #[test]
    fn test_deadline_only_for_active() {
        assert_eq!(inputs(ContractState::Ready).deadline(), Some(110));
        assert_eq!(inputs(ContractState::Submitted).deadline(), Some(115));
        assert_eq!(inputs(ContractState::Live).deadline(), Some(1_000));
        assert_eq!(inputs(ContractState::EndedExpired).deadline(), None);
    }
}
