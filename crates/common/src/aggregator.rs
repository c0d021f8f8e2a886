//! # Collection Aggregator
//!
//! Builds keyed maps of records from on-chain collections.
//!
//! | Function | Shape | Order |
//! |----------|-------|-------|
//! | [`fetch_by_ids`] | flat ID array | concurrent |
//! | [`fetch_linked_list`] | doubly linked list head + count | sequential |
//!
//! Both are generic over the fetch closure so they work with any record type
//! and error type. Absent records are skipped by `fetch_by_ids` but are an
//! integrity fault inside a linked list.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::hash::Hash;

use dstake_proto::Address;
use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, error};

// ════════════════════════════════════════════════════════════════════════════
// INTEGRITY ERROR
// ════════════════════════════════════════════════════════════════════════════

/// On-chain data is structurally inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// List ended (null key or missing record) before `expected` hops.
    #[error("linked list ended after {found} of {expected} entries")]
    PrematureEnd { expected: u64, found: u64 },

    /// A key was visited twice.
    #[error("linked list cycle at {key} (hop {hop})")]
    Cycle { key: String, hop: u64 },

    /// `UserInfo.app_ids` non-zero slots disagree with `cnt_app_ids`.
    #[error("user {user} declares {declared} app ids but {occupied} slots are occupied")]
    AppIdCountMismatch {
        user: String,
        declared: u64,
        occupied: u64,
    },

    #[error("noticeboard app {0} not found")]
    MissingNoticeboard(u64),
}

// ════════════════════════════════════════════════════════════════════════════
// LIST KEY
// ════════════════════════════════════════════════════════════════════════════

/// Key type of an on-chain linked list.
pub trait ListKey: Copy + Eq + Hash + fmt::Display {
    /// The list terminator.
    fn is_null(&self) -> bool;
}

impl ListKey for Address {
    fn is_null(&self) -> bool {
        self.is_zero()
    }
}

impl ListKey for u64 {
    fn is_null(&self) -> bool {
        *self == 0
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FETCH BY IDS
// ════════════════════════════════════════════════════════════════════════════

/// Fetch every id concurrently into a map.
///
/// # Behavior
///
/// - Duplicate ids are fetched once
/// - `Ok(None)` results are left out of the map
/// - The first error aborts the whole batch
///
/// # Example
///
/// ```ignore
/// let map = fetch_by_ids([5, 0, 7], |id| fetcher.fetch_global_state::<ContractRecord>(id)).await?;
/// // app 0 is the "none" sentinel → map has keys {5, 7}
/// ```
pub async fn fetch_by_ids<K, V, E, F, Fut>(
    ids: impl IntoIterator<Item = K>,
    fetch: F,
) -> Result<HashMap<K, V>, E>
where
    K: Copy + Eq + Hash,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<Option<V>, E>>,
{
    let mut seen = HashSet::new();
    let unique: Vec<K> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

    let fetches = unique.into_iter().map(|id| {
        let fut = fetch(id);
        async move { fut.await.map(|record| (id, record)) }
    });
    let results = try_join_all(fetches).await?;

    let requested = results.len();
    let map: HashMap<K, V> = results
        .into_iter()
        .filter_map(|(id, record)| record.map(|r| (id, r)))
        .collect();
    debug!(requested, found = map.len(), "fetch_by_ids complete");
    Ok(map)
}

// ════════════════════════════════════════════════════════════════════════════
// LINKED LIST WALK
// ════════════════════════════════════════════════════════════════════════════

/// Walk a linked list of exactly `count` entries starting at `first`.
///
/// # Arguments
///
/// * `first` - head key
/// * `count` - declared length; iterations are capped here
/// * `fetch` - loads one entry
/// * `next` - reads the successor key out of an entry
///
/// # Errors
///
/// - `IntegrityError::PrematureEnd` on a null key or absent entry before `count` hops
/// - `IntegrityError::Cycle` when a key repeats
/// - whatever `fetch` returns
pub async fn fetch_linked_list<K, V, E, F, Fut, N>(
    first: K,
    count: u64,
    mut fetch: F,
    next: N,
) -> Result<HashMap<K, V>, E>
where
    K: ListKey,
    F: FnMut(K) -> Fut,
    Fut: Future<Output = Result<Option<V>, E>>,
    N: Fn(&V) -> K,
    E: From<IntegrityError>,
{
    let mut out = HashMap::new();
    let mut key = first;

    for hop in 0..count {
        if key.is_null() {
            error!(expected = count, found = hop, "linked list hit null before its declared length");
            return Err(IntegrityError::PrematureEnd { expected: count, found: hop }.into());
        }
        if out.contains_key(&key) {
            error!(%key, hop, "linked list cycle");
            return Err(IntegrityError::Cycle { key: key.to_string(), hop }.into());
        }

        let Some(entry) = fetch(key).await? else {
            error!(%key, expected = count, found = hop, "linked list entry missing");
            return Err(IntegrityError::PrematureEnd { expected: count, found: hop }.into());
        };
        let successor = next(&entry);
        out.insert(key, entry);
        key = successor;
    }

    debug!(count, "linked list walk complete");
    Ok(out)
}

// ════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════
