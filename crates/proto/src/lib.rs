//! # DSTAKE Proto Crate
//!
//! Data contract between the marketplace smart contracts and every client
//! that reads them. Pure code only: no I/O, no async, no logging.
//!
//! ## Modules
//!
//! - [`abi`]: fixed-width ABI tuple reader/writer and the [`AbiCodec`] trait
//! - [`address`]: 32-byte account address with checksummed text form
//! - [`terms`]: validator ad terms and per-contract delegation terms
//! - [`user`]: `UserInfo` boxes and per-role `UsersDll` list heads
//! - [`global_state`]: TEAL key/value state and the [`FromGlobalState`] trait
//! - [`records`]: delegator contract, validator ad and noticeboard records
//! - [`state`]: stage codes and user roles
//! - [`status`]: derivation of the effective contract status
//!
//! ## Layering
//!
//! ```text
//!   bytes ──► AbiCodec ──► terms / user schemas ──┐
//!                                                 ├──► records ──► status
//!   GlobalState (key → TealValue) ────────────────┘
//! ```
//!
//! Every schema has a width fixed at compile time, and
//! `decode(encode(x)) == x` holds for all of them.

pub mod abi;
pub mod address;
pub mod error;
pub mod global_state;
pub mod records;
pub mod state;
pub mod status;
pub mod terms;
pub mod user;

pub use abi::{AbiCodec, AbiReader, AbiWriter};
pub use address::Address;
pub use error::DecodeError;
pub use global_state::{FromGlobalState, GlobalState, TealValue};
pub use records::{ContractRecord, NoticeboardRecord, ValidatorAdRecord, AD_DEL_APP_SLOTS};
pub use state::{AdState, ContractState, UserRole};
pub use status::{derive_state_cur, StatusInputs};
pub use terms::{
    DelegationTermsBalance, DelegationTermsGeneral, GatingAsa, TermsPrice, TermsReqs, TermsStake,
    TermsTime, TermsWarn,
};
pub use user::{UserInfo, UsersDll, USER_APP_ID_SLOTS};
