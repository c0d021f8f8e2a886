//! Mock Chain Backend for Testing
//!
//! Fully in-memory [`ChainRpc`] implementation. No network calls.
//!
//! # Features
//!
//! - Application global state, boxes and account → created apps maps
//! - Settable current round
//! - Failure injection per application or for the whole backend
//! - Per-query call counters (used to assert request coalescing)
//! - Optional simulated latency (async, non-blocking)
//!
//! # Example
//!
//! ```ignore
//! use dstake_common::MockChain;
//!
//! let chain = MockChain::new();
//! chain.set_round(1_000);
//! chain.put_global_state(42, state);
//! let gs = chain.get_application_global_state(42).await?;
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use dstake_proto::{AbiCodec, Address, GlobalState};
use parking_lot::RwLock;
use tracing::debug;

use crate::rpc::{ChainRpc, FetchError};

// ════════════════════════════════════════════════════════════════════════════
// CALL COUNTERS
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct CallCounters {
    global_state: AtomicUsize,
    boxes: AtomicUsize,
    created_apps: AtomicUsize,
    round: AtomicUsize,
}

/// Snapshot of how many times each query was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallCounts {
    pub global_state: usize,
    pub boxes: usize,
    pub created_apps: usize,
    pub round: usize,
}

// ════════════════════════════════════════════════════════════════════════════
// MOCK CHAIN
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct MockChain {
    apps: RwLock<HashMap<u64, GlobalState>>,
    boxes: RwLock<HashMap<(u64, Vec<u8>), Vec<u8>>>,
    created: RwLock<HashMap<Address, Vec<u64>>>,
    round: AtomicU64,
    /// Applications whose queries fail with `Unavailable`.
    failing_apps: RwLock<HashSet<u64>>,
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
    calls: CallCounters,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query sleeps `ms` before answering.
    pub fn with_latency(ms: u64) -> Self {
        let chain = Self::default();
        chain.latency_ms.store(ms, Ordering::SeqCst);
        chain
    }

    pub fn set_round(&self, round: u64) {
        self.round.store(round, Ordering::SeqCst);
    }

    pub fn advance_round(&self, by: u64) -> u64 {
        self.round.fetch_add(by, Ordering::SeqCst) + by
    }

    pub fn put_global_state(&self, app_id: u64, state: GlobalState) {
        self.apps.write().insert(app_id, state);
    }

    pub fn remove_app(&self, app_id: u64) {
        self.apps.write().remove(&app_id);
    }

    pub fn put_box(&self, app_id: u64, key: impl Into<Vec<u8>>, value: Vec<u8>) {
        self.boxes.write().insert((app_id, key.into()), value);
    }

    /// Store `record` ABI-encoded in box `key` of `app_id`.
    pub fn put_box_record<T: AbiCodec>(&self, app_id: u64, key: impl Into<Vec<u8>>, record: &T) {
        self.put_box(app_id, key, record.encode());
    }

    pub fn set_created_apps(&self, address: Address, app_ids: Vec<u64>) {
        self.created.write().insert(address, app_ids);
    }

    /// Queries touching `app_id` fail until [`MockChain::heal_app`].
    pub fn fail_app(&self, app_id: u64) {
        self.failing_apps.write().insert(app_id);
    }

    pub fn heal_app(&self, app_id: u64) {
        self.failing_apps.write().remove(&app_id);
    }

    /// Every query fails with `FetchError::Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn call_counts(&self) -> CallCounts {
        CallCounts {
            global_state: self.calls.global_state.load(Ordering::SeqCst),
            boxes: self.calls.boxes.load(Ordering::SeqCst),
            created_apps: self.calls.created_apps.load(Ordering::SeqCst),
            round: self.calls.round.load(Ordering::SeqCst),
        }
    }

    async fn simulate_latency(&self) {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn check_available(&self, app_id: Option<u64>) -> Result<(), FetchError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FetchError::Unavailable("mock chain offline".to_string()));
        }
        if let Some(id) = app_id {
            if self.failing_apps.read().contains(&id) {
                return Err(FetchError::Unavailable(format!("injected failure for app {}", id)));
            }
        }
        Ok(())
    }
}

impl ChainRpc for MockChain {
    async fn get_application_global_state(
        &self,
        app_id: u64,
    ) -> Result<Option<GlobalState>, FetchError> {
        self.calls.global_state.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.check_available(Some(app_id))?;
        debug!(app_id, "mock global state");
        Ok(self.apps.read().get(&app_id).cloned())
    }

    async fn get_application_box(
        &self,
        app_id: u64,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, FetchError> {
        self.calls.boxes.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.check_available(Some(app_id))?;
        Ok(self.boxes.read().get(&(app_id, key.to_vec())).cloned())
    }

    async fn get_account_created_apps(&self, address: &Address) -> Result<Vec<u64>, FetchError> {
        self.calls.created_apps.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.check_available(None)?;
        Ok(self.created.read().get(address).cloned().unwrap_or_default())
    }

    async fn get_current_round(&self) -> Result<u64, FetchError> {
        self.calls.round.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.check_available(None)?;
        Ok(self.round.load(Ordering::SeqCst))
    }
}
