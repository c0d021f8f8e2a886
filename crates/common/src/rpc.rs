//! Chain RPC Boundary
//!
//! `ChainRpc` is the contract between the state view layer and whatever
//! talks to the Algorand node. It only names the four queries the view layer
//! needs. Implementations:
//!
//! - [`AlgodClient`](crate::algod::AlgodClient): node REST API over HTTP
//! - [`MockChain`](crate::mock_chain::MockChain): in-memory, for tests

use std::future::Future;

use dstake_proto::{Address, GlobalState};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// FETCH ERROR
// ════════════════════════════════════════════════════════════════════════════

/// Transport-level failure talking to the node.
///
/// `Clone` so the round clock can hand a single failed result to every
/// caller that was waiting on the same request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Node could not be reached.
    #[error("node unavailable: {0}")]
    Unavailable(String),

    /// Any other transport error.
    #[error("network error: {0}")]
    Network(String),

    /// Node answered with a non-success status other than 404.
    #[error("node returned HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    /// Response body did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Errors worth retrying at the transport level.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Unavailable(_) | FetchError::Network(_) => true,
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::InvalidResponse(_) => false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BOX VALUE
// ════════════════════════════════════════════════════════════════════════════

/// Result of a box lookup. A missing box is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoxValue {
    pub exists: bool,
    pub value: Vec<u8>,
}

impl BoxValue {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn found(value: Vec<u8>) -> Self {
        Self { exists: true, value }
    }
}

impl From<Option<Vec<u8>>> for BoxValue {
    fn from(raw: Option<Vec<u8>>) -> Self {
        match raw {
            Some(value) => Self::found(value),
            None => Self::missing(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CHAIN RPC TRAIT
// ════════════════════════════════════════════════════════════════════════════

/// Queries the view layer issues against the node.
///
/// # Contract for Implementors
///
/// - Thread-safe (`Send + Sync`), futures are `Send`
/// - "Does not exist" is `Ok(None)` / `Ok(vec![])`, never an error
/// - Transport problems are [`FetchError`]
/// - No caching: every call reflects the node at call time
pub trait ChainRpc: Send + Sync {
    /// Global state of `app_id`, or `None` if the application does not exist.
    fn get_application_global_state(
        &self,
        app_id: u64,
    ) -> impl Future<Output = Result<Option<GlobalState>, FetchError>> + Send;

    /// Raw box contents, or `None` if the box (or the app) does not exist.
    fn get_application_box(
        &self,
        app_id: u64,
        key: &[u8],
    ) -> impl Future<Output = Result<Option<Vec<u8>>, FetchError>> + Send;

    /// Application IDs created by `address`. Unknown accounts yield an empty list.
    fn get_account_created_apps(
        &self,
        address: &Address,
    ) -> impl Future<Output = Result<Vec<u64>, FetchError>> + Send;

    /// Latest round known to the node.
    fn get_current_round(&self) -> impl Future<Output = Result<u64, FetchError>> + Send;
}
