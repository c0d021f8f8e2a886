//! Error type returned by the fetcher, aggregator and chain view.

use dstake_proto::DecodeError;
use thiserror::Error;

use crate::aggregator::IntegrityError;
use crate::rpc::FetchError;

/// Everything that can go wrong reading marketplace state.
///
/// | Variant | Retry? |
/// |---------|--------|
/// | `Fetch` | only if transient (timeout, connect, 5xx); transport already retried per config |
/// | `Decode` | no, bytes on chain do not match the schema |
/// | `Integrity` | no, on-chain structure is inconsistent |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to decode {what} of app {app_id}: {source}")]
    Decode {
        what: &'static str,
        app_id: u64,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

impl ViewError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ViewError::Fetch(e) if e.is_transient())
    }
}
