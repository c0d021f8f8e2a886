//! # Terms Schemas
//!
//! ABI tuples holding the commercial terms of a validator ad and of an
//! individual delegator contract.
//!
//! | Schema | Width |
//! |--------|-------|
//! | [`GatingAsa`] | 16 |
//! | [`TermsTime`] | 40 |
//! | [`TermsPrice`] | 40 |
//! | [`TermsStake`] | 16 |
//! | [`TermsReqs`] | 32 |
//! | [`TermsWarn`] | 16 |
//! | [`DelegationTermsGeneral`] | 96 |
//! | [`DelegationTermsBalance`] | 56 |

use serde::Serialize;

use crate::abi::{AbiCodec, AbiReader, AbiWriter};
use crate::address::Address;
use crate::error::DecodeError;

/// Number of gating asset slots in ad and contract requirements.
pub const GATING_ASA_SLOTS: usize = 2;

// ════════════════════════════════════════════════════════════════════════════
// GATING ASA
// ════════════════════════════════════════════════════════════════════════════

/// `(uint64 asset_id, uint64 min_amount)`; `asset_id == 0` means unused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GatingAsa {
    pub asset_id: u64,
    pub min_amount: u64,
}

impl GatingAsa {
    pub fn is_set(&self) -> bool {
        self.asset_id != 0
    }
}

impl AbiCodec for GatingAsa {
    const NAME: &'static str = "GatingAsa";
    const WIDTH: usize = 16;

    fn write_to(&self, w: &mut AbiWriter) {
        w.put_u64(self.asset_id);
        w.put_u64(self.min_amount);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            asset_id: r.read_u64()?,
            min_amount: r.read_u64()?,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// VALIDATOR AD TERMS
// ════════════════════════════════════════════════════════════════════════════

/// Timing terms of a validator ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TermsTime {
    /// Rounds the node runner has to submit participation keys.
    pub rounds_setup: u64,
    /// Rounds the delegator has to confirm the keys.
    pub rounds_confirm: u64,
    pub rounds_duration_min: u64,
    pub rounds_duration_max: u64,
    /// Last round any contract from this ad may end at.
    pub round_max_end: u64,
}

impl AbiCodec for TermsTime {
    const NAME: &'static str = "TermsTime";
    const WIDTH: usize = 40;

    fn write_to(&self, w: &mut AbiWriter) {
        w.put_u64(self.rounds_setup);
        w.put_u64(self.rounds_confirm);
        w.put_u64(self.rounds_duration_min);
        w.put_u64(self.rounds_duration_max);
        w.put_u64(self.round_max_end);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            rounds_setup: r.read_u64()?,
            rounds_confirm: r.read_u64()?,
            rounds_duration_min: r.read_u64()?,
            rounds_duration_max: r.read_u64()?,
            round_max_end: r.read_u64()?,
        })
    }
}

/// Pricing terms of a validator ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TermsPrice {
    /// Platform commission in parts per million.
    pub commission: u64,
    pub fee_round_min: u64,
    /// Variable per-round fee, scaled by stake.
    pub fee_round_var: u64,
    pub fee_setup: u64,
    /// Payment asset; `0` is ALGO.
    pub fee_asset_id: u64,
}

impl AbiCodec for TermsPrice {
    const NAME: &'static str = "TermsPrice";
    const WIDTH: usize = 40;

    fn write_to(&self, w: &mut AbiWriter) {
        w.put_u64(self.commission);
        w.put_u64(self.fee_round_min);
        w.put_u64(self.fee_round_var);
        w.put_u64(self.fee_setup);
        w.put_u64(self.fee_asset_id);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            commission: r.read_u64()?,
            fee_round_min: r.read_u64()?,
            fee_round_var: r.read_u64()?,
            fee_setup: r.read_u64()?,
            fee_asset_id: r.read_u64()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TermsStake {
    pub stake_max: u64,
    /// Tolerated overshoot of `stake_max`, parts per million.
    pub stake_gratis: u64,
}

impl AbiCodec for TermsStake {
    const NAME: &'static str = "TermsStake";
    const WIDTH: usize = 16;

    fn write_to(&self, w: &mut AbiWriter) {
        w.put_u64(self.stake_max);
        w.put_u64(self.stake_gratis);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            stake_max: r.read_u64()?,
            stake_gratis: r.read_u64()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TermsReqs {
    pub gating_asa_list: [GatingAsa; GATING_ASA_SLOTS],
}

impl AbiCodec for TermsReqs {
    const NAME: &'static str = "TermsReqs";
    const WIDTH: usize = <[GatingAsa; GATING_ASA_SLOTS]>::WIDTH;

    fn write_to(&self, w: &mut AbiWriter) {
        self.gating_asa_list.write_to(w);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            gating_asa_list: <[GatingAsa; GATING_ASA_SLOTS]>::read_from(r)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TermsWarn {
    pub cnt_warning_max: u64,
    pub rounds_warning: u64,
}

impl AbiCodec for TermsWarn {
    const NAME: &'static str = "TermsWarn";
    const WIDTH: usize = 16;

    fn write_to(&self, w: &mut AbiWriter) {
        w.put_u64(self.cnt_warning_max);
        w.put_u64(self.rounds_warning);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            cnt_warning_max: r.read_u64()?,
            rounds_warning: r.read_u64()?,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DELEGATION TERMS (per contract)
// ════════════════════════════════════════════════════════════════════════════

/// General terms frozen into a delegator contract at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DelegationTermsGeneral {
    pub commission: u64,
    pub fee_round: u64,
    pub fee_setup: u64,
    pub fee_asset_id: u64,
    /// Partner receiving the partner fees; zero address when none.
    pub partner_address: Address,
    pub fee_round_partner: u64,
    pub fee_setup_partner: u64,
    pub rounds_setup: u64,
    pub rounds_confirm: u64,
}

impl AbiCodec for DelegationTermsGeneral {
    const NAME: &'static str = "DelegationTermsGeneral";
    const WIDTH: usize = 96;

    fn write_to(&self, w: &mut AbiWriter) {
        w.put_u64(self.commission);
        w.put_u64(self.fee_round);
        w.put_u64(self.fee_setup);
        w.put_u64(self.fee_asset_id);
        self.partner_address.write_to(w);
        w.put_u64(self.fee_round_partner);
        w.put_u64(self.fee_setup_partner);
        w.put_u64(self.rounds_setup);
        w.put_u64(self.rounds_confirm);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            commission: r.read_u64()?,
            fee_round: r.read_u64()?,
            fee_setup: r.read_u64()?,
            fee_asset_id: r.read_u64()?,
            partner_address: Address::read_from(r)?,
            fee_round_partner: r.read_u64()?,
            fee_setup_partner: r.read_u64()?,
            rounds_setup: r.read_u64()?,
            rounds_confirm: r.read_u64()?,
        })
    }
}

/// Balance limits frozen into a delegator contract at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DelegationTermsBalance {
    pub stake_max: u64,
    pub cnt_breach_del_max: u64,
    pub rounds_breach: u64,
    pub gating_asa_list: [GatingAsa; GATING_ASA_SLOTS],
}

impl AbiCodec for DelegationTermsBalance {
    const NAME: &'static str = "DelegationTermsBalance";
    const WIDTH: usize = 24 + <[GatingAsa; GATING_ASA_SLOTS]>::WIDTH;

    fn write_to(&self, w: &mut AbiWriter) {
        w.put_u64(self.stake_max);
        w.put_u64(self.cnt_breach_del_max);
        w.put_u64(self.rounds_breach);
        self.gating_asa_list.write_to(w);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            stake_max: r.read_u64()?,
            cnt_breach_del_max: r.read_u64()?,
            rounds_breach: r.read_u64()?,
            gating_asa_list: <[GatingAsa; GATING_ASA_SLOTS]>::read_from(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_general() -> DelegationTermsGeneral {
        DelegationTermsGeneral {
            commission: 100_000,
            fee_round: 1_000,
            fee_setup: 5_000_000,
            fee_asset_id: 0,
            partner_address: Address::new([0x11; 32]),
            fee_round_partner: 10,
            fee_setup_partner: 20,
            rounds_setup: 100,
            rounds_confirm: 50,
        }
    }

    #[test]
    fn test_declared_widths_match_encoding() {
        assert_eq!(GatingAsa::default().encode().len(), GatingAsa::WIDTH);
        assert_eq!(TermsTime::default().encode().len(), 40);
        assert_eq!(TermsPrice::default().encode().len(), 40);
        assert_eq!(TermsStake::default().encode().len(), 16);
        assert_eq!(TermsReqs::default().encode().len(), 32);
        assert_eq!(TermsWarn::default().encode().len(), 16);
        assert_eq!(DelegationTermsGeneral::default().encode().len(), 96);
        assert_eq!(DelegationTermsBalance::default().encode().len(), 56);
    }

    #[test]
    fn test_general_field_offsets() {
        let terms = sample_general();
        let bytes = terms.encode();
        // partner address sits after four uint64 fields
        assert_eq!(&bytes[32..64], &[0x11; 32]);
        // rounds_confirm is the last field
        assert_eq!(&bytes[88..96], &50u64.to_be_bytes());
        assert_eq!(DelegationTermsGeneral::decode(&bytes), Ok(terms));
    }

    #[test]
    fn test_balance_roundtrip_with_gating() {
        let terms = DelegationTermsBalance {
            stake_max: 10_000_000_000,
            cnt_breach_del_max: 3,
            rounds_breach: 1_000,
            gating_asa_list: [
                GatingAsa { asset_id: 31566704, min_amount: 1 },
                GatingAsa::default(),
            ],
        };
        let decoded = DelegationTermsBalance::decode(&terms.encode()).unwrap();
        assert_eq!(decoded, terms);
        assert!(decoded.gating_asa_list[0].is_set());
        assert!(!decoded.gating_asa_list[1].is_set());
    }

    #[test]
    fn test_truncated_terms_rejected() {
        let bytes = TermsTime::default().encode();
        assert_eq!(
            TermsTime::decode(&bytes[..39]),
            Err(DecodeError::InvalidLength {
                schema: "TermsTime",
                expected: 40,
                actual: 39
            })
        );
    }

    #[test]
    fn test_oversized_terms_rejected() {
        let mut bytes = TermsWarn::default().encode();
        bytes.push(0);
        assert!(TermsWarn::decode(&bytes).is_err());
    }
}
