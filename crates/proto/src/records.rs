//! # Application Records
//!
//! Typed views over the global state of the three marketplace applications:
//!
//! - [`ContractRecord`]: one delegator contract
//! - [`ValidatorAdRecord`]: one validator ad
//! - [`NoticeboardRecord`]: the marketplace registry
//!
//! Records are built fresh on every fetch. The only field ever computed
//! client-side is [`ContractRecord::state_cur`]; it is never encoded or
//! written anywhere.

use serde::{Serialize, Serializer};

use crate::address::Address;
use crate::error::DecodeError;
use crate::global_state::{FromGlobalState, GlobalState};
use crate::state::{AdState, ContractState};
use crate::status::{derive_state_cur, StatusInputs};
use crate::terms::{
    DelegationTermsBalance, DelegationTermsGeneral, TermsPrice, TermsReqs, TermsStake, TermsTime,
    TermsWarn,
};
use crate::user::UsersDll;

/// Slot capacity of a validator ad's delegator contract list.
pub const AD_DEL_APP_SLOTS: usize = 14;

/// Global state keys, as written by the contracts.
pub mod keys {
    pub const NOTICEBOARD_APP_ID: &str = "noticeboard_app_id";
    pub const VALIDATOR_AD_APP_ID: &str = "validator_ad_app_id";
    pub const DEL_MANAGER: &str = "del_manager";
    pub const DEL_BENEFICIARY: &str = "del_beneficiary";
    pub const STATE: &str = "state";
    pub const ROUND_START: &str = "round_start";
    pub const ROUND_END: &str = "round_end";
    pub const ROUND_ENDED: &str = "round_ended";
    pub const ROUND_BREACH_LAST: &str = "round_breach_last";
    pub const ROUND_CLAIM_LAST: &str = "round_claim_last";
    pub const ROUND_EXPIRY_SOON_LAST: &str = "round_expiry_soon_last";
    pub const CNT_BREACH_DEL: &str = "cnt_breach_del";
    pub const FEE_OPERATIONAL: &str = "fee_operational";
    pub const FEE_OPERATIONAL_PARTNER: &str = "fee_operational_partner";
    pub const DELEGATION_TERMS_GENERAL: &str = "delegation_terms_general";
    pub const DELEGATION_TERMS_BALANCE: &str = "delegation_terms_balance";
    pub const VOTE_KEY: &str = "vote_key";
    pub const SEL_KEY: &str = "sel_key";
    pub const STATE_PROOF_KEY: &str = "state_proof_key";
    pub const VOTE_KEY_DILUTION: &str = "vote_key_dilution";
    pub const TC_SHA256: &str = "tc_sha256";

    pub const VAL_OWNER: &str = "val_owner";
    pub const VAL_MANAGER: &str = "val_manager";
    pub const CNT_DEL: &str = "cnt_del";
    pub const CNT_DEL_MAX: &str = "cnt_del_max";
    pub const DEL_APP_LIST: &str = "del_app_list";
    pub const TERMS_TIME: &str = "terms_time";
    pub const TERMS_PRICE: &str = "terms_price";
    pub const TERMS_STAKE: &str = "terms_stake";
    pub const TERMS_REQS: &str = "terms_reqs";
    pub const TERMS_WARN: &str = "terms_warn";
    pub const TOTAL_ALGO_EARNED: &str = "total_algo_earned";
    pub const TOTAL_ALGO_FEES_GENERATED: &str = "total_algo_fees_generated";

    pub const PLA_MANAGER: &str = "pla_manager";
    pub const DLL_VAL: &str = "dll_val";
    pub const DLL_DEL: &str = "dll_del";
}

// ════════════════════════════════════════════════════════════════════════════
// DELEGATOR CONTRACT
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractRecord {
    pub app_id: u64,
    pub noticeboard_app_id: u64,
    pub validator_ad_app_id: u64,
    pub del_manager: Address,
    pub del_beneficiary: Address,
    /// Stage as last written on-chain.
    pub state: ContractState,
    /// Effective stage at the round of the last derivation.
    pub state_cur: ContractState,
    pub round_start: u64,
    pub round_end: u64,
    pub round_ended: u64,
    pub round_breach_last: u64,
    pub round_claim_last: u64,
    pub round_expiry_soon_last: u64,
    pub cnt_breach_del: u64,
    pub fee_operational: u64,
    pub fee_operational_partner: u64,
    pub delegation_terms_general: DelegationTermsGeneral,
    pub delegation_terms_balance: DelegationTermsBalance,
    #[serde(serialize_with = "serialize_hex")]
    pub vote_key: [u8; 32],
    #[serde(serialize_with = "serialize_hex")]
    pub sel_key: [u8; 32],
    #[serde(serialize_with = "serialize_hex")]
    pub state_proof_key: [u8; 64],
    pub vote_key_dilution: u64,
    #[serde(serialize_with = "serialize_hex")]
    pub tc_sha256: [u8; 32],
}

impl ContractRecord {
    pub fn status_inputs(&self) -> StatusInputs {
        StatusInputs {
            state: self.state,
            round_start: self.round_start,
            round_end: self.round_end,
            rounds_setup: self.delegation_terms_general.rounds_setup,
            rounds_confirm: self.delegation_terms_general.rounds_confirm,
        }
    }

    /// Recompute `state_cur` against `round`, always from the stored `state`.
    pub fn apply_round(&mut self, round: u64) {
        self.state_cur = derive_state_cur(
            self.state,
            self.round_start,
            self.round_end,
            self.delegation_terms_general.rounds_setup,
            self.delegation_terms_general.rounds_confirm,
            round,
        );
    }

    /// Deadline passed but nobody has reported it on-chain yet.
    pub fn is_ended_unreported(&self) -> bool {
        self.state_cur.is_ended() && !self.state.is_ended()
    }
}

impl FromGlobalState for ContractRecord {
    fn from_global_state(app_id: u64, gs: &GlobalState) -> Result<Self, DecodeError> {
        let state = ContractState::from_byte(gs.byte(keys::STATE)?);
        Ok(Self {
            app_id,
            noticeboard_app_id: gs.uint(keys::NOTICEBOARD_APP_ID)?,
            validator_ad_app_id: gs.uint(keys::VALIDATOR_AD_APP_ID)?,
            del_manager: gs.address(keys::DEL_MANAGER)?,
            del_beneficiary: gs.address(keys::DEL_BENEFICIARY)?,
            state,
            state_cur: state,
            round_start: gs.uint(keys::ROUND_START)?,
            round_end: gs.uint(keys::ROUND_END)?,
            round_ended: gs.uint(keys::ROUND_ENDED)?,
            round_breach_last: gs.uint(keys::ROUND_BREACH_LAST)?,
            round_claim_last: gs.uint(keys::ROUND_CLAIM_LAST)?,
            round_expiry_soon_last: gs.uint(keys::ROUND_EXPIRY_SOON_LAST)?,
            cnt_breach_del: gs.uint(keys::CNT_BREACH_DEL)?,
            fee_operational: gs.uint(keys::FEE_OPERATIONAL)?,
            fee_operational_partner: gs.uint(keys::FEE_OPERATIONAL_PARTNER)?,
            delegation_terms_general: gs.schema(keys::DELEGATION_TERMS_GENERAL)?,
            delegation_terms_balance: gs.schema(keys::DELEGATION_TERMS_BALANCE)?,
            vote_key: gs.fixed(keys::VOTE_KEY)?,
            sel_key: gs.fixed(keys::SEL_KEY)?,
            state_proof_key: gs.fixed(keys::STATE_PROOF_KEY)?,
            vote_key_dilution: gs.uint(keys::VOTE_KEY_DILUTION)?,
            tc_sha256: gs.fixed(keys::TC_SHA256)?,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// VALIDATOR AD
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorAdRecord {
    pub app_id: u64,
    pub noticeboard_app_id: u64,
    pub val_owner: Address,
    pub val_manager: Address,
    pub state: AdState,
    pub cnt_del: u64,
    pub cnt_del_max: u64,
    /// Delegator contracts spawned by this ad; zero marks an empty slot.
    pub del_app_list: [u64; AD_DEL_APP_SLOTS],
    pub terms_time: TermsTime,
    pub terms_price: TermsPrice,
    pub terms_stake: TermsStake,
    pub terms_reqs: TermsReqs,
    pub terms_warn: TermsWarn,
    pub total_algo_earned: u64,
    pub total_algo_fees_generated: u64,
    #[serde(serialize_with = "serialize_hex")]
    pub tc_sha256: [u8; 32],
}

impl ValidatorAdRecord {
    /// Free delegator slots left on this ad.
    pub fn capacity_left(&self) -> u64 {
        self.cnt_del_max.saturating_sub(self.cnt_del)
    }

    pub fn occupied_del_app_ids(&self) -> Vec<u64> {
        self.del_app_list.iter().copied().filter(|id| *id != 0).collect()
    }
}

impl FromGlobalState for ValidatorAdRecord {
    fn from_global_state(app_id: u64, gs: &GlobalState) -> Result<Self, DecodeError> {
        Ok(Self {
            app_id,
            noticeboard_app_id: gs.uint(keys::NOTICEBOARD_APP_ID)?,
            val_owner: gs.address(keys::VAL_OWNER)?,
            val_manager: gs.address(keys::VAL_MANAGER)?,
            state: AdState::from_byte(gs.byte(keys::STATE)?),
            cnt_del: gs.uint(keys::CNT_DEL)?,
            cnt_del_max: gs.uint(keys::CNT_DEL_MAX)?,
            del_app_list: gs.schema(keys::DEL_APP_LIST)?,
            terms_time: gs.schema(keys::TERMS_TIME)?,
            terms_price: gs.schema(keys::TERMS_PRICE)?,
            terms_stake: gs.schema(keys::TERMS_STAKE)?,
            terms_reqs: gs.schema(keys::TERMS_REQS)?,
            terms_warn: gs.schema(keys::TERMS_WARN)?,
            total_algo_earned: gs.uint(keys::TOTAL_ALGO_EARNED)?,
            total_algo_fees_generated: gs.uint(keys::TOTAL_ALGO_FEES_GENERATED)?,
            tc_sha256: gs.fixed(keys::TC_SHA256)?,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NOTICEBOARD
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeboardRecord {
    pub app_id: u64,
    pub pla_manager: Address,
    pub state: u8,
    #[serde(serialize_with = "serialize_hex")]
    pub tc_sha256: [u8; 32],
    /// Validator list head.
    pub dll_val: UsersDll,
    /// Delegator list head.
    pub dll_del: UsersDll,
}

impl NoticeboardRecord {
    pub fn dll(&self, role: crate::state::UserRole) -> &UsersDll {
        match role {
            crate::state::UserRole::Validator => &self.dll_val,
            crate::state::UserRole::Delegator => &self.dll_del,
        }
    }
}

impl FromGlobalState for NoticeboardRecord {
    fn from_global_state(app_id: u64, gs: &GlobalState) -> Result<Self, DecodeError> {
        Ok(Self {
            app_id,
            pla_manager: gs.address(keys::PLA_MANAGER)?,
            state: gs.byte(keys::STATE)?,
            tc_sha256: gs.fixed(keys::TC_SHA256)?,
            dll_val: gs.schema(keys::DLL_VAL)?,
            dll_del: gs.schema(keys::DLL_DEL)?,
        })
    }
}

fn serialize_hex<S: Serializer, const N: usize>(bytes: &[u8; N], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

// ════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════
