//! # Round Clock
//!
//! Current chain round with a short-lived cache and a single outstanding
//! request.
//!
//! ## Slot States
//!
//! ```text
//!   Empty ──get_round──► InFlight ──Ok──► Fresh ──ttl elapsed──► (refetch)
//!                          │
//!                          └──Err──► Empty
//! ```
//!
//! Concurrent callers arriving while a request is in flight await the same
//! shared future, so N callers cost one RPC. A failed request is handed to
//! every waiter and never cached. Dropping one waiter does not cancel the
//! request for the others.
//!
//! The slot mutex is never held across an `.await`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::rpc::{ChainRpc, FetchError};

type RoundFuture = Shared<BoxFuture<'static, Result<u64, FetchError>>>;

enum Slot {
    Empty,
    Fresh { round: u64, fetched_at: Instant },
    InFlight { generation: u64, fut: RoundFuture },
}

pub struct RoundClock<R> {
    rpc: Arc<R>,
    ttl: Duration,
    slot: Mutex<Slot>,
    generation: AtomicU64,
}

impl<R> std::fmt::Debug for RoundClock<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.slot.lock() {
            Slot::Empty => "empty",
            Slot::Fresh { .. } => "fresh",
            Slot::InFlight { .. } => "in_flight",
        };
        f.debug_struct("RoundClock")
            .field("ttl", &self.ttl)
            .field("slot", &state)
            .finish()
    }
}

impl<R: ChainRpc + 'static> RoundClock<R> {
    pub fn new(rpc: Arc<R>, ttl: Duration) -> Self {
        Self {
            rpc,
            ttl,
            slot: Mutex::new(Slot::Empty),
            generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current round, served from cache while fresh.
    ///
    /// # Errors
    ///
    /// The `FetchError` of the underlying request, shared with every
    /// concurrent caller of the same request.
    pub async fn get_round(&self) -> Result<u64, FetchError> {
        let (generation, fut) = {
            let mut slot = self.slot.lock();
            if let Slot::Fresh { round, fetched_at } = *slot {
                if fetched_at.elapsed() < self.ttl {
                    return Ok(round);
                }
            }
            if let Slot::InFlight { generation, fut } = &*slot {
                debug!(generation, "joining in-flight round request");
                (*generation, fut.clone())
            } else {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let rpc = Arc::clone(&self.rpc);
                let fut = async move { rpc.get_current_round().await }.boxed().shared();
                *slot = Slot::InFlight { generation, fut: fut.clone() };
                debug!(generation, "issuing round request");
                (generation, fut)
            }
        };

        let result = fut.await;

        let mut slot = self.slot.lock();
        let owns_slot = matches!(&*slot, Slot::InFlight { generation: g, .. } if *g == generation);
        if owns_slot {
            *slot = match &result {
                Ok(round) => Slot::Fresh { round: *round, fetched_at: Instant::now() },
                Err(e) => {
                    warn!(error = %e, "round request failed");
                    Slot::Empty
                }
            };
        }
        result
    }

    /// Fresh cached round, without I/O.
    pub fn cached(&self) -> Option<u64> {
        match *self.slot.lock() {
            Slot::Fresh { round, fetched_at } if fetched_at.elapsed() < self.ttl => Some(round),
            _ => None,
        }
    }

    /// Forget the cached round. An in-flight request keeps running for its
    /// waiters but will not repopulate the cache.
    pub fn invalidate(&self) {
        *self.slot.lock() = Slot::Empty;
    }
}
