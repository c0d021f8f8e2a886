//! # Chain Query Commands
//!
//! Handlers for every command that reads marketplace state from the node.
//!
//! ## Usage
//!
//! ```bash
//! dstake-agent round
//! dstake-agent contract 2713951245
//! dstake-agent ad 2713950001 --json
//! dstake-agent user <ADDRESS>
//! dstake-agent users del
//! dstake-agent user-contracts <ADDRESS>
//! dstake-agent user-ads <ADDRESS>
//! dstake-agent ad-contracts 2713950001
//! ```
//!
//! Handlers return the rendered output instead of printing so they can be
//! exercised against a `MockChain`.

use std::collections::{BTreeMap, HashMap};

use anyhow::{anyhow, Context, Result};
use dstake_common::{ChainRpc, ChainView};
use dstake_proto::{Address, ContractRecord, ContractState, UserInfo, UserRole, ValidatorAdRecord};
use serde::Serialize;

use crate::output::{kv_table, list_table, to_json, truncate};

const ADDRESS_COLUMN: usize = 16;

// ════════════════════════════════════════════════════════════════════════════
// HANDLERS
// ════════════════════════════════════════════════════════════════════════════

pub async fn handle_round<R: ChainRpc + 'static>(view: &ChainView<R>, json: bool) -> Result<String> {
    let round = view.current_round().await.context("failed to fetch current round")?;
    if json {
        #[derive(Serialize)]
        struct RoundOut {
            round: u64,
        }
        return to_json(&RoundOut { round });
    }
    Ok(kv_table("Chain Status", &[("Current Round", round.to_string())]))
}

pub async fn handle_contract<R: ChainRpc + 'static>(
    view: &ChainView<R>,
    app_id: u64,
    json: bool,
) -> Result<String> {
    let (record, round) = view
        .delegator_contract_at_round(app_id)
        .await
        .with_context(|| format!("failed to fetch delegator contract {}", app_id))?
        .ok_or_else(|| anyhow!("delegator contract {} not found", app_id))?;
    if json {
        return to_json(&record);
    }
    Ok(contract_table(&record, round))
}

pub async fn handle_ad<R: ChainRpc + 'static>(
    view: &ChainView<R>,
    app_id: u64,
    json: bool,
) -> Result<String> {
    let record = view
        .validator_ad(app_id)
        .await
        .with_context(|| format!("failed to fetch validator ad {}", app_id))?
        .ok_or_else(|| anyhow!("validator ad {} not found", app_id))?;
    if json {
        return to_json(&record);
    }
    Ok(ad_table(&record))
}

pub async fn handle_user<R: ChainRpc + 'static>(
    view: &ChainView<R>,
    address: &Address,
    json: bool,
) -> Result<String> {
    let info = view
        .user(address)
        .await
        .with_context(|| format!("failed to fetch user {}", address))?
        .ok_or_else(|| anyhow!("user {} is not registered", address))?;
    if json {
        return to_json(&info);
    }
    Ok(user_table(address, &info))
}

pub async fn handle_users<R: ChainRpc + 'static>(
    view: &ChainView<R>,
    role: UserRole,
    json: bool,
) -> Result<String> {
    let users = view
        .users(role)
        .await
        .with_context(|| format!("failed to list {} users", role.as_str()))?;
    let sorted: BTreeMap<Address, UserInfo> = users.into_iter().collect();
    if json {
        return to_json(&sorted);
    }
    let rows: Vec<Vec<String>> = sorted
        .iter()
        .map(|(address, info)| {
            vec![
                address.to_string(),
                info.user_role().map(|r| r.as_str().to_string()).unwrap_or_else(|| "?".to_string()),
                info.cnt_app_ids.to_string(),
            ]
        })
        .collect();
    Ok(list_table(&["Address", "Role", "Apps"], &rows))
}

pub async fn handle_user_contracts<R: ChainRpc + 'static>(
    view: &ChainView<R>,
    address: &Address,
    json: bool,
) -> Result<String> {
    let contracts = view
        .contracts_of_user(address)
        .await
        .with_context(|| format!("failed to fetch contracts of {}", address))?;
    render_contracts(contracts, json)
}

pub async fn handle_user_ads<R: ChainRpc + 'static>(
    view: &ChainView<R>,
    address: &Address,
    json: bool,
) -> Result<String> {
    let ads = view
        .ads_of_user(address)
        .await
        .with_context(|| format!("failed to fetch ads of {}", address))?;
    let sorted: BTreeMap<u64, ValidatorAdRecord> = ads.into_iter().collect();
    if json {
        return to_json(&sorted);
    }
    let rows: Vec<Vec<String>> = sorted
        .values()
        .map(|ad| {
            vec![
                ad.app_id.to_string(),
                ad.state.label().to_string(),
                format!("{}/{}", ad.cnt_del, ad.cnt_del_max),
                truncate(&ad.val_owner.to_string(), ADDRESS_COLUMN),
            ]
        })
        .collect();
    Ok(list_table(&["App ID", "State", "Delegators", "Owner"], &rows))
}

pub async fn handle_ad_contracts<R: ChainRpc + 'static>(
    view: &ChainView<R>,
    ad_app_id: u64,
    json: bool,
) -> Result<String> {
    let contracts = view
        .ad_delegator_contracts(ad_app_id)
        .await
        .with_context(|| format!("failed to fetch contracts of ad {}", ad_app_id))?;
    render_contracts(contracts, json)
}

// ════════════════════════════════════════════════════════════════════════════
// RENDERING
// ════════════════════════════════════════════════════════════════════════════

fn state_cell(state: ContractState) -> String {
    format!("{} (0x{:02x})", state.label(), state.to_byte())
}

fn render_contracts(contracts: HashMap<u64, ContractRecord>, json: bool) -> Result<String> {
    let sorted: BTreeMap<u64, ContractRecord> = contracts.into_iter().collect();
    if json {
        return to_json(&sorted);
    }
    let rows: Vec<Vec<String>> = sorted
        .values()
        .map(|c| {
            vec![
                c.app_id.to_string(),
                c.validator_ad_app_id.to_string(),
                c.state.label().to_string(),
                c.state_cur.label().to_string(),
                c.round_end.to_string(),
                truncate(&c.del_beneficiary.to_string(), ADDRESS_COLUMN),
            ]
        })
        .collect();
    Ok(list_table(
        &["App ID", "Ad", "State", "Current", "Round End", "Beneficiary"],
        &rows,
    ))
}

fn contract_table(c: &ContractRecord, round: u64) -> String {
    let general = &c.delegation_terms_general;
    let balance = &c.delegation_terms_balance;
    let mut rows = vec![
        ("App ID", c.app_id.to_string()),
        ("Validator Ad", c.validator_ad_app_id.to_string()),
        ("Manager", c.del_manager.to_string()),
        ("Beneficiary", c.del_beneficiary.to_string()),
        ("State", state_cell(c.state)),
        ("State (current)", state_cell(c.state_cur)),
        ("Derived At Round", round.to_string()),
        ("Round Start", c.round_start.to_string()),
        ("Round End", c.round_end.to_string()),
        ("Round Ended", c.round_ended.to_string()),
        ("Rounds Setup/Confirm", format!("{}/{}", general.rounds_setup, general.rounds_confirm)),
        ("Commission", general.commission.to_string()),
        ("Fee Round", general.fee_round.to_string()),
        ("Fee Setup", general.fee_setup.to_string()),
        ("Fee Asset", general.fee_asset_id.to_string()),
        ("Stake Max", balance.stake_max.to_string()),
        ("Breaches", format!("{}/{}", c.cnt_breach_del, balance.cnt_breach_del_max)),
        ("Fee Operational", c.fee_operational.to_string()),
    ];
    if !general.partner_address.is_zero() {
        rows.push(("Partner", general.partner_address.to_string()));
    }
    if c.is_ended_unreported() {
        rows.push(("Note", "ended on-chain window, not yet reported".to_string()));
    }
    kv_table("Delegator Contract", &rows)
}

fn ad_table(ad: &ValidatorAdRecord) -> String {
    let gating: Vec<String> = ad
        .terms_reqs
        .gating_asa_list
        .iter()
        .filter(|g| g.is_set())
        .map(|g| format!("{}≥{}", g.asset_id, g.min_amount))
        .collect();
    let rows = vec![
        ("App ID", ad.app_id.to_string()),
        ("Owner", ad.val_owner.to_string()),
        ("Manager", ad.val_manager.to_string()),
        ("State", format!("{} (0x{:02x})", ad.state.label(), ad.state.to_byte())),
        ("Delegators", format!("{}/{}", ad.cnt_del, ad.cnt_del_max)),
        ("Commission", ad.terms_price.commission.to_string()),
        ("Fee Round Min", ad.terms_price.fee_round_min.to_string()),
        ("Fee Round Var", ad.terms_price.fee_round_var.to_string()),
        ("Fee Setup", ad.terms_price.fee_setup.to_string()),
        ("Fee Asset", ad.terms_price.fee_asset_id.to_string()),
        ("Duration (rounds)", format!(
            "{}..{}",
            ad.terms_time.rounds_duration_min, ad.terms_time.rounds_duration_max
        )),
        ("Round Max End", ad.terms_time.round_max_end.to_string()),
        ("Stake Max", ad.terms_stake.stake_max.to_string()),
        ("Gating", if gating.is_empty() { "-".to_string() } else { gating.join(", ") }),
        ("Total Earned", ad.total_algo_earned.to_string()),
    ];
    kv_table("Validator Ad", &rows)
}

fn user_table(address: &Address, info: &UserInfo) -> String {
    let apps: Vec<String> = info.occupied_app_ids().iter().map(u64::to_string).collect();
    let rows = vec![
        ("Address", address.to_string()),
        ("Role", info.user_role().map(|r| r.as_str()).unwrap_or("?").to_string()),
        ("Previous", info.prev_user.to_string()),
        ("Next", info.next_user.to_string()),
        ("App Count", info.cnt_app_ids.to_string()),
        ("Apps", if apps.is_empty() { "-".to_string() } else { apps.join(", ") }),
    ];
    kv_table("User", &rows)
}
