//! Offline ABI decoder: `dstake-agent decode <SCHEMA> <HEX>`.
//!
//! No node connection. Useful for inspecting box values and global state
//! bytes copied from an explorer.

use anyhow::{Context, Result};
use clap::ValueEnum;
use dstake_proto::{
    AbiCodec, Address, DelegationTermsBalance, DelegationTermsGeneral, GatingAsa, TermsPrice,
    TermsReqs, TermsStake, TermsTime, TermsWarn, UserInfo, UsersDll, AD_DEL_APP_SLOTS,
};
use serde::Serialize;
use serde_json::Value;

use crate::output::{kv_table, to_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Schema {
    Address,
    GatingAsa,
    TermsTime,
    TermsPrice,
    TermsStake,
    TermsReqs,
    TermsWarn,
    DelegationTermsGeneral,
    DelegationTermsBalance,
    UsersDll,
    UserInfo,
    DelAppList,
}

impl Schema {
    pub fn width(self) -> usize {
        match self {
            Schema::Address => Address::WIDTH,
            Schema::GatingAsa => GatingAsa::WIDTH,
            Schema::TermsTime => TermsTime::WIDTH,
            Schema::TermsPrice => TermsPrice::WIDTH,
            Schema::TermsStake => TermsStake::WIDTH,
            Schema::TermsReqs => TermsReqs::WIDTH,
            Schema::TermsWarn => TermsWarn::WIDTH,
            Schema::DelegationTermsGeneral => DelegationTermsGeneral::WIDTH,
            Schema::DelegationTermsBalance => DelegationTermsBalance::WIDTH,
            Schema::UsersDll => UsersDll::WIDTH,
            Schema::UserInfo => UserInfo::WIDTH,
            Schema::DelAppList => <[u64; AD_DEL_APP_SLOTS]>::WIDTH,
        }
    }

    /// Decode `bytes` and return the record as JSON.
    pub fn decode(self, bytes: &[u8]) -> Result<Value> {
        match self {
            Schema::Address => decode_as::<Address>(bytes),
            Schema::GatingAsa => decode_as::<GatingAsa>(bytes),
            Schema::TermsTime => decode_as::<TermsTime>(bytes),
            Schema::TermsPrice => decode_as::<TermsPrice>(bytes),
            Schema::TermsStake => decode_as::<TermsStake>(bytes),
            Schema::TermsReqs => decode_as::<TermsReqs>(bytes),
            Schema::TermsWarn => decode_as::<TermsWarn>(bytes),
            Schema::DelegationTermsGeneral => decode_as::<DelegationTermsGeneral>(bytes),
            Schema::DelegationTermsBalance => decode_as::<DelegationTermsBalance>(bytes),
            Schema::UsersDll => decode_as::<UsersDll>(bytes),
            Schema::UserInfo => decode_as::<UserInfo>(bytes),
            Schema::DelAppList => decode_as::<[u64; AD_DEL_APP_SLOTS]>(bytes),
        }
    }
}

fn decode_as<T: AbiCodec + Serialize>(bytes: &[u8]) -> Result<Value> {
    let record = T::decode(bytes).with_context(|| format!("failed to decode {}", T::NAME))?;
    serde_json::to_value(record).context("failed to convert record to JSON")
}

/// Handle `dstake-agent decode`.
pub fn handle_decode(schema: Schema, hex_input: &str, json: bool) -> Result<String> {
    let trimmed = hex_input.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).context("input is not valid hex")?;
    let value = schema.decode(&bytes)?;

    if json {
        return to_json(&value);
    }

    let title = format!("{:?} ({} bytes)", schema, schema.width());
    let rows: Vec<(&str, String)> = match &value {
        Value::Object(fields) => fields
            .iter()
            .map(|(k, v)| (k.as_str(), compact(v)))
            .collect(),
        other => vec![("value", compact(other))],
    };
    Ok(kv_table(&title, &rows))
}

fn compact(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
