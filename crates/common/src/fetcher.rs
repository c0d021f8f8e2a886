//! State Fetcher
//!
//! Retrieves application global state and boxes through a [`ChainRpc`] and
//! hands them to the record decoders. "Absent" is a normal outcome here:
//! unregistered users and not-yet-created apps come back as `None`.

use std::any::type_name;
use std::sync::Arc;

use dstake_proto::{AbiCodec, FromGlobalState, GlobalState};
use tracing::debug;

use crate::error::ViewError;
use crate::rpc::{BoxValue, ChainRpc, FetchError};

/// Application id `0` never refers to a real application.
pub const NO_APP: u64 = 0;

#[derive(Debug)]
pub struct StateFetcher<R> {
    rpc: Arc<R>,
}

impl<R> Clone for StateFetcher<R> {
    fn clone(&self) -> Self {
        Self { rpc: Arc::clone(&self.rpc) }
    }
}

impl<R: ChainRpc> StateFetcher<R> {
    pub fn new(rpc: Arc<R>) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &Arc<R> {
        &self.rpc
    }

    /// Raw global state. `None` for app `0`, missing apps and empty state.
    pub async fn fetch_raw_global_state(
        &self,
        app_id: u64,
    ) -> Result<Option<GlobalState>, FetchError> {
        if app_id == NO_APP {
            return Ok(None);
        }
        let state = self.rpc.get_application_global_state(app_id).await?;
        Ok(state.filter(|gs| !gs.is_empty()))
    }

    /// Global state decoded into `T`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(T))` - app exists with initialized state
    /// * `Ok(None)` - app `0`, app missing, or state empty
    ///
    /// # Errors
    ///
    /// * `ViewError::Fetch` - transport failure
    /// * `ViewError::Decode` - state present but does not match `T`
    pub async fn fetch_global_state<T: FromGlobalState>(
        &self,
        app_id: u64,
    ) -> Result<Option<T>, ViewError> {
        let Some(gs) = self.fetch_raw_global_state(app_id).await? else {
            debug!(app_id, "global state absent");
            return Ok(None);
        };
        T::from_global_state(app_id, &gs)
            .map(Some)
            .map_err(|source| ViewError::Decode { what: short_type_name::<T>(), app_id, source })
    }

    /// Box `key` of `app_id`. A missing box is `exists = false`.
    pub async fn fetch_box(&self, app_id: u64, key: &[u8]) -> Result<BoxValue, FetchError> {
        if app_id == NO_APP {
            return Ok(BoxValue::missing());
        }
        let raw = self.rpc.get_application_box(app_id, key).await?;
        Ok(BoxValue::from(raw))
    }

    /// Box decoded through an ABI schema. `None` when the box does not exist.
    pub async fn fetch_box_record<T: AbiCodec>(
        &self,
        app_id: u64,
        key: &[u8],
    ) -> Result<Option<T>, ViewError> {
        let value = self.fetch_box(app_id, key).await?;
        if !value.exists {
            debug!(app_id, schema = T::NAME, "box absent");
            return Ok(None);
        }
        T::decode(&value.value)
            .map(Some)
            .map_err(|source| ViewError::Decode { what: T::NAME, app_id, source })
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
