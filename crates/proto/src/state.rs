//! # Contract State Codes
//!
//! Single-byte stage codes written by the delegator contract and the
//! validator ad contract. The contracts are the only authority over these
//! values; the client just reads them (and derives `state_cur`, see
//! [`crate::status`]).
//!
//! ## Delegator contract
//!
//! | Code | Variant |
//! |------|---------|
//! | `0x00` | `NotDefined` |
//! | `0x01` | `Ready` |
//! | `0x02` | `Submitted` |
//! | `0x03` | `Live` |
//! | `0x10` | `EndedNotSubmitted` |
//! | `0x11` | `EndedNotConfirmed` |
//! | `0x12` | `EndedLimits` |
//! | `0x13` | `EndedWithdrawn` |
//! | `0x14` | `EndedExpired` |
//! | `0x15` | `EndedUptime` |
//! | `0x16` | `EndedCannotPay` |
//! | `0x17` | `EndedSuspended` |
//!
//! Every code with the `0x10` bit set is terminal.

use std::fmt;

use serde::{Serialize, Serializer};

/// Bit shared by every terminal delegator contract code.
pub const ENDED_MASK: u8 = 0x10;

// ════════════════════════════════════════════════════════════════════════════
// DELEGATOR CONTRACT STATE
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractState {
    NotDefined,
    Ready,
    Submitted,
    Live,
    EndedNotSubmitted,
    EndedNotConfirmed,
    EndedLimits,
    EndedWithdrawn,
    EndedExpired,
    EndedUptime,
    EndedCannotPay,
    EndedSuspended,
    /// Byte outside the known set; kept verbatim.
    Unknown(u8),
}

impl ContractState {
    pub fn from_byte(code: u8) -> Self {
        match code {
            0x00 => Self::NotDefined,
            0x01 => Self::Ready,
            0x02 => Self::Submitted,
            0x03 => Self::Live,
            0x10 => Self::EndedNotSubmitted,
            0x11 => Self::EndedNotConfirmed,
            0x12 => Self::EndedLimits,
            0x13 => Self::EndedWithdrawn,
            0x14 => Self::EndedExpired,
            0x15 => Self::EndedUptime,
            0x16 => Self::EndedCannotPay,
            0x17 => Self::EndedSuspended,
            other => Self::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::NotDefined => 0x00,
            Self::Ready => 0x01,
            Self::Submitted => 0x02,
            Self::Live => 0x03,
            Self::EndedNotSubmitted => 0x10,
            Self::EndedNotConfirmed => 0x11,
            Self::EndedLimits => 0x12,
            Self::EndedWithdrawn => 0x13,
            Self::EndedExpired => 0x14,
            Self::EndedUptime => 0x15,
            Self::EndedCannotPay => 0x16,
            Self::EndedSuspended => 0x17,
            Self::Unknown(code) => code,
        }
    }

    /// True for every known terminal code.
    ///
    /// Unknown bytes are never treated as terminal even if they carry the
    /// ended bit; they fall through derivation untouched either way.
    pub fn is_ended(self) -> bool {
        !matches!(self, Self::Unknown(_)) && self.to_byte() & ENDED_MASK != 0
    }

    /// Pre-terminal stages that have a round window.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Ready | Self::Submitted | Self::Live)
    }

    /// Whether the contract can legitimately report this code.
    pub fn is_expected(self) -> bool {
        self.is_active() || self.is_ended()
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::NotDefined => "Not Defined",
            Self::Ready => "Ready",
            Self::Submitted => "Submitted",
            Self::Live => "Live",
            Self::EndedNotSubmitted => "Ended - Not Submitted",
            Self::EndedNotConfirmed => "Ended - Not Confirmed",
            Self::EndedLimits => "Ended - Limits Breached",
            Self::EndedWithdrawn => "Ended - Withdrawn",
            Self::EndedExpired => "Ended - Expired",
            Self::EndedUptime => "Ended - Poor Performance",
            Self::EndedCannotPay => "Ended - Cannot Pay",
            Self::EndedSuspended => "Ended - Suspended",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for ContractState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Unknown (0x{:02x})", code),
            other => f.write_str(other.label()),
        }
    }
}

impl Serialize for ContractState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// VALIDATOR AD STATE
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdState {
    NotDefined,
    Created,
    TemplateLoad,
    TemplateLoaded,
    Set,
    Ready,
    NotReady,
    NotLive,
    Unknown(u8),
}

impl AdState {
    pub fn from_byte(code: u8) -> Self {
        match code {
            0x00 => Self::NotDefined,
            0x01 => Self::Created,
            0x02 => Self::TemplateLoad,
            0x03 => Self::TemplateLoaded,
            0x04 => Self::Set,
            0x05 => Self::Ready,
            0x06 => Self::NotReady,
            0x07 => Self::NotLive,
            other => Self::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::NotDefined => 0x00,
            Self::Created => 0x01,
            Self::TemplateLoad => 0x02,
            Self::TemplateLoaded => 0x03,
            Self::Set => 0x04,
            Self::Ready => 0x05,
            Self::NotReady => 0x06,
            Self::NotLive => 0x07,
            Self::Unknown(code) => code,
        }
    }

    /// Ad accepts new delegators only in `Ready`.
    pub fn accepts_delegators(self) -> bool {
        self == Self::Ready
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NotDefined => "Not Defined",
            Self::Created => "Created",
            Self::TemplateLoad => "Loading Template",
            Self::TemplateLoaded => "Template Loaded",
            Self::Set => "Set",
            Self::Ready => "Ready",
            Self::NotReady => "Not Ready",
            Self::NotLive => "Not Live",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for AdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Unknown (0x{:02x})", code),
            other => f.write_str(other.label()),
        }
    }
}

impl Serialize for AdState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// USER ROLE
// ════════════════════════════════════════════════════════════════════════════

/// Role tag stored in a user's `UserInfo` box (`byte[4]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Node runner publishing validator ads.
    Validator,
    /// Staker holding delegator contracts.
    Delegator,
}

impl UserRole {
    pub const VALIDATOR_TAG: [u8; 4] = *b"val\0";
    pub const DELEGATOR_TAG: [u8; 4] = *b"del\0";

    pub fn from_tag(tag: &[u8; 4]) -> Option<Self> {
        match *tag {
            Self::VALIDATOR_TAG => Some(Self::Validator),
            Self::DELEGATOR_TAG => Some(Self::Delegator),
            _ => None,
        }
    }

    pub fn tag(self) -> [u8; 4] {
        match self {
            Self::Validator => Self::VALIDATOR_TAG,
            Self::Delegator => Self::DELEGATOR_TAG,
        }
    }

    /// Short name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validator => "val",
            Self::Delegator => "del",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "val" | "validator" => Ok(Self::Validator),
            "del" | "delegator" => Ok(Self::Delegator),
            other => Err(format!("unknown role '{}', expected 'val' or 'del'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_state_byte_roundtrip() {
        for code in 0u8..=0xFF {
            assert_eq!(ContractState::from_byte(code).to_byte(), code);
        }
    }

    #[test]
    fn test_ended_classification() {
        assert!(ContractState::EndedExpired.is_ended());
        assert!(ContractState::EndedSuspended.is_ended());
        assert!(!ContractState::Live.is_ended());
        assert!(!ContractState::NotDefined.is_ended());
        assert!(!ContractState::Unknown(0x1F).is_ended());
    }

    #[test]
    fn test_expected_states() {
        assert!(ContractState::Ready.is_expected());
        assert!(ContractState::EndedWithdrawn.is_expected());
        assert!(!ContractState::NotDefined.is_expected());
        assert!(!ContractState::Unknown(0x42).is_expected());
    }

    #[test]
    fn test_contract_state_display() {
        assert_eq!(ContractState::EndedNotConfirmed.to_string(), "Ended - Not Confirmed");
        assert_eq!(ContractState::Unknown(0x42).to_string(), "Unknown (0x42)");
    }

    #[test]
    fn test_ad_state_roundtrip_and_ready() {
        for code in 0u8..=0x0F {
            assert_eq!(AdState::from_byte(code).to_byte(), code);
        }
        assert!(AdState::Ready.accepts_delegators());
        assert!(!AdState::NotLive.accepts_delegators());
    }

    #[test]
    fn test_user_role_tags() {
        assert_eq!(UserRole::from_tag(b"val\0"), Some(UserRole::Validator));
        assert_eq!(UserRole::from_tag(b"del\0"), Some(UserRole::Delegator));
        assert_eq!(UserRole::from_tag(&[0; 4]), None);
        assert_eq!("del".parse::<UserRole>(), Ok(UserRole::Delegator));
        assert!("xyz".parse::<UserRole>().is_err());
    }
}
