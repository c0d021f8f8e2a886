//! # Chain View
//!
//! Marketplace queries composed from the fetcher, round clock and aggregator.
//!
//! | Query | Source | Result |
//! |-------|--------|--------|
//! | `current_round` | round clock | `u64` |
//! | `noticeboard` | noticeboard global state | `NoticeboardRecord` |
//! | `delegator_contract(s)` | contract global state + round | `ContractRecord` with `state_cur` derived |
//! | `validator_ad(s)` | ad global state | `ValidatorAdRecord` |
//! | `user` | `UserInfo` box in the noticeboard, keyed by address | `UserInfo` |
//! | `users(role)` | role list head + linked list walk | map by address |
//! | `contracts_of_user` / `ads_of_user` | user `app_ids` | map by app id |
//! | `ad_delegator_contracts` | ad `del_app_list` | map by app id |
//! | `created_apps` | account info | app ids |
//!
//! Every batch of contracts is derived against a single round read.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dstake_proto::{
    Address, ContractRecord, NoticeboardRecord, UserInfo, UserRole, ValidatorAdRecord,
};
use tracing::{debug, error, info, warn};

use crate::aggregator::{fetch_by_ids, fetch_linked_list, IntegrityError};
use crate::config::ChainConfig;
use crate::error::ViewError;
use crate::fetcher::{StateFetcher, NO_APP};
use crate::rpc::ChainRpc;
use crate::round_clock::RoundClock;

#[derive(Debug)]
pub struct ChainView<R> {
    fetcher: StateFetcher<R>,
    clock: RoundClock<R>,
    noticeboard_app_id: u64,
}

impl<R: ChainRpc + 'static> ChainView<R> {
    pub fn new(rpc: Arc<R>, config: &ChainConfig) -> Self {
        Self::with_parts(rpc, config.noticeboard_app_id, config.round_cache_ttl())
    }

    pub fn with_parts(rpc: Arc<R>, noticeboard_app_id: u64, round_ttl: Duration) -> Self {
        Self {
            fetcher: StateFetcher::new(Arc::clone(&rpc)),
            clock: RoundClock::new(rpc, round_ttl),
            noticeboard_app_id,
        }
    }

    pub fn noticeboard_app_id(&self) -> u64 {
        self.noticeboard_app_id
    }

    pub fn fetcher(&self) -> &StateFetcher<R> {
        &self.fetcher
    }

    pub fn clock(&self) -> &RoundClock<R> {
        &self.clock
    }

    pub async fn current_round(&self) -> Result<u64, ViewError> {
        Ok(self.clock.get_round().await?)
    }

    // ════════════════════════════════════════════════════════════════════════
    // NOTICEBOARD & USERS
    // ════════════════════════════════════════════════════════════════════════

    /// The marketplace registry. Its absence is an integrity fault.
    pub async fn noticeboard(&self) -> Result<NoticeboardRecord, ViewError> {
        match self
            .fetcher
            .fetch_global_state::<NoticeboardRecord>(self.noticeboard_app_id)
            .await?
        {
            Some(nb) => Ok(nb),
            None => {
                error!(app_id = self.noticeboard_app_id, "noticeboard missing");
                Err(IntegrityError::MissingNoticeboard(self.noticeboard_app_id).into())
            }
        }
    }

    /// `UserInfo` of `address`, or `None` if the address never registered.
    ///
    /// # Errors
    ///
    /// `IntegrityError::MissingNoticeboard` when no noticeboard app is
    /// configured; `IntegrityError::AppIdCountMismatch` when occupied slots
    /// disagree with `cnt_app_ids`.
    pub async fn user(&self, address: &Address) -> Result<Option<UserInfo>, ViewError> {
        if self.noticeboard_app_id == NO_APP {
            error!(%address, "no noticeboard app configured");
            return Err(IntegrityError::MissingNoticeboard(NO_APP).into());
        }
        let user = self
            .fetcher
            .fetch_box_record::<UserInfo>(self.noticeboard_app_id, address.as_bytes())
            .await?;

        if let Some(ref info) = user {
            if !info.app_ids_consistent() {
                let occupied = info.occupied_app_ids().len() as u64;
                error!(%address, declared = info.cnt_app_ids, occupied, "user app id count mismatch");
                return Err(IntegrityError::AppIdCountMismatch {
                    user: address.to_string(),
                    declared: info.cnt_app_ids,
                    occupied,
                }
                .into());
            }
        }
        Ok(user)
    }

    /// All users of `role`, walking the role's list from the noticeboard.
    pub async fn users(&self, role: UserRole) -> Result<HashMap<Address, UserInfo>, ViewError> {
        let nb = self.noticeboard().await?;
        let dll = *nb.dll(role);
        debug!(role = role.as_str(), count = dll.cnt_users, "walking user list");

        let users = fetch_linked_list(
            dll.user_first,
            dll.cnt_users,
            move |address| async move { self.user(&address).await },
            |info: &UserInfo| info.next_user,
        )
        .await?;

        for (address, info) in &users {
            if info.user_role() != Some(role) {
                warn!(%address, expected = role.as_str(), "user listed under another role");
            }
        }
        info!(role = role.as_str(), count = users.len(), "users loaded");
        Ok(users)
    }

    // ════════════════════════════════════════════════════════════════════════
    // DELEGATOR CONTRACTS
    // ════════════════════════════════════════════════════════════════════════

    /// One delegator contract with `state_cur` derived at the current round.
    pub async fn delegator_contract(&self, app_id: u64) -> Result<Option<ContractRecord>, ViewError> {
        Ok(self.delegator_contract_at_round(app_id).await?.map(|(record, _)| record))
    }

    /// Same as [`delegator_contract`](Self::delegator_contract), paired with
    /// the round `state_cur` was derived at.
    pub async fn delegator_contract_at_round(
        &self,
        app_id: u64,
    ) -> Result<Option<(ContractRecord, u64)>, ViewError> {
        let Some(mut record) = self.fetcher.fetch_global_state::<ContractRecord>(app_id).await? else {
            return Ok(None);
        };
        let round = self.current_round().await?;
        derive_at(&mut record, round);
        Ok(Some((record, round)))
    }

    /// Contracts for `ids`, all derived against the same round.
    pub async fn delegator_contracts(
        &self,
        ids: &[u64],
    ) -> Result<HashMap<u64, ContractRecord>, ViewError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let round = self.current_round().await?;
        let mut contracts = fetch_by_ids(ids.iter().copied(), |id| {
            self.fetcher.fetch_global_state::<ContractRecord>(id)
        })
        .await?;
        for record in contracts.values_mut() {
            derive_at(record, round);
        }
        Ok(contracts)
    }

    /// Contracts listed in the user's `app_ids`. Unregistered users have none.
    pub async fn contracts_of_user(
        &self,
        address: &Address,
    ) -> Result<HashMap<u64, ContractRecord>, ViewError> {
        match self.user(address).await? {
            Some(info) => self.delegator_contracts(&info.occupied_app_ids()).await,
            None => Ok(HashMap::new()),
        }
    }

    /// Contracts spawned by a validator ad.
    pub async fn ad_delegator_contracts(
        &self,
        ad_app_id: u64,
    ) -> Result<HashMap<u64, ContractRecord>, ViewError> {
        match self.validator_ad(ad_app_id).await? {
            Some(ad) => self.delegator_contracts(&ad.occupied_del_app_ids()).await,
            None => Ok(HashMap::new()),
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // VALIDATOR ADS
    // ════════════════════════════════════════════════════════════════════════

    pub async fn validator_ad(&self, app_id: u64) -> Result<Option<ValidatorAdRecord>, ViewError> {
        self.fetcher.fetch_global_state::<ValidatorAdRecord>(app_id).await
    }

    pub async fn validator_ads(
        &self,
        ids: &[u64],
    ) -> Result<HashMap<u64, ValidatorAdRecord>, ViewError> {
        fetch_by_ids(ids.iter().copied(), |id| {
            self.fetcher.fetch_global_state::<ValidatorAdRecord>(id)
        })
        .await
    }

    /// Ads listed in the user's `app_ids`.
    pub async fn ads_of_user(
        &self,
        address: &Address,
    ) -> Result<HashMap<u64, ValidatorAdRecord>, ViewError> {
        match self.user(address).await? {
            Some(info) => self.validator_ads(&info.occupied_app_ids()).await,
            None => Ok(HashMap::new()),
        }
    }

    pub async fn created_apps(&self, address: &Address) -> Result<Vec<u64>, ViewError> {
        Ok(self.fetcher.rpc().get_account_created_apps(address).await?)
    }
}

/// Derive `state_cur`, flagging stored states the deriver does not recognize.
fn derive_at(record: &mut ContractRecord, round: u64) {
    if !record.state.is_expected() {
        warn!(app_id = record.app_id, state = %record.state, "unexpected contract state, passing through");
    }
    record.apply_round(round);
    if record.is_ended_unreported() {
        debug!(app_id = record.app_id, state_cur = %record.state_cur, round, "contract ended, not yet reported");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_chain::MockChain;

    #[tokio::test]
    async fn test_missing_noticeboard_is_integrity_error() {
        let chain = Arc::new(MockChain::new());
        let view = ChainView::with_parts(chain, 99, Duration::from_secs(2));
        assert_eq!(
            view.noticeboard().await,
            Err(ViewError::Integrity(IntegrityError::MissingNoticeboard(99)))
        );
    }

    #[tokio::test]
    async fn test_unregistered_user_has_nothing() {
        let chain = Arc::new(MockChain::new());
        let view = ChainView::with_parts(Arc::clone(&chain), 1, Duration::from_secs(2));
        let who = Address::new([3; 32]);
        assert_eq!(view.user(&who).await, Ok(None));
        assert!(view.contracts_of_user(&who).await.expect("contracts").is_empty());
        assert!(view.ads_of_user(&who).await.expect("ads").is_empty());
    }

    #[tokio::test]
    async fn test_user_without_noticeboard_is_error() {
        let chain = Arc::new(MockChain::new());
        let who = Address::new([4; 32]);
        let info = UserInfo { role: UserRole::DELEGATOR_TAG, ..Default::default() };
        chain.put_box_record(77, who.as_bytes().to_vec(), &info);

        let view = ChainView::new(Arc::clone(&chain), &ChainConfig::default());
        let missing = Err(ViewError::Integrity(IntegrityError::MissingNoticeboard(0)));
        assert_eq!(view.user(&who).await, missing);
        assert!(view.contracts_of_user(&who).await.is_err());
        assert!(view.ads_of_user(&who).await.is_err());
        assert_eq!(chain.call_counts().boxes, 0);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_round() {
        let chain = Arc::new(MockChain::new());
        let view = ChainView::with_parts(Arc::clone(&chain), 1, Duration::from_secs(2));
        assert!(view.delegator_contracts(&[]).await.expect("empty").is_empty());
        assert_eq!(chain.call_counts().round, 0);
    }

    #[tokio::test]
    async fn test_inconsistent_user_rejected() {
        let chain = Arc::new(MockChain::new());
        let who = Address::new([5; 32]);
        let mut info = UserInfo {
            role: UserRole::DELEGATOR_TAG,
            cnt_app_ids: 2,
            ..Default::default()
        };
        info.app_ids[0] = 10;
        chain.put_box_record(1, who.as_bytes().to_vec(), &info);

        let view = ChainView::with_parts(Arc::clone(&chain), 1, Duration::from_secs(2));
        assert!(matches!(
            view.user(&who).await,
            Err(ViewError::Integrity(IntegrityError::AppIdCountMismatch { declared: 2, occupied: 1, .. }))
        ));
    }
}
