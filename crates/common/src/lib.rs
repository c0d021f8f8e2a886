//! # DSTAKE Common Crate
//!
//! Chain access layer for the staking marketplace: everything between the
//! Algorand node and the typed records of `dstake-proto`.
//!
//! ## Modules
//! - `rpc`: `ChainRpc` trait, `FetchError`, `BoxValue`
//! - `algod`: `ChainRpc` over the node REST API
//! - `mock_chain`: in-memory `ChainRpc` for tests
//! - `round_clock`: cached, single-flight current round
//! - `fetcher`: global state / box retrieval plus decoding
//! - `aggregator`: ID-array and linked-list collection walks
//! - `view`: marketplace queries (`ChainView`)
//! - `context`: explicit user session
//! - `config`: configuration management
//!
//! ## Architecture
//! ```text
//!              ┌──────────────┐
//!              │  ChainView   │
//!              └──────┬───────┘
//!        ┌────────────┼─────────────┐
//!   ┌────▼─────┐ ┌────▼──────┐ ┌────▼───────┐
//!   │RoundClock│ │StateFetcher│ │ aggregator │
//!   └────┬─────┘ └────┬──────┘ └────────────┘
//!        └──────┬─────┘
//!          ┌────▼─────┐  <- ChainRpc trait
//!     ┌────┴───┐  ┌───┴──────┐
//!     │ Algod  │  │MockChain │
//!     └────────┘  └──────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let config = ChainConfig::from_env()?;
//! let rpc = Arc::new(AlgodClient::new(config.clone())?);
//! let view = ChainView::new(rpc, &config);
//! let contract = view.delegator_contract(app_id).await?;
//! ```

pub mod aggregator;
pub mod algod;
pub mod config;
pub mod context;
pub mod error;
pub mod fetcher;
pub mod mock_chain;
pub mod round_clock;
pub mod rpc;
pub mod view;

pub use aggregator::{fetch_by_ids, fetch_linked_list, IntegrityError, ListKey};
pub use algod::AlgodClient;
pub use config::{load_from_file, ChainConfig, ConfigError};
pub use context::UserSession;
pub use error::ViewError;
pub use fetcher::StateFetcher;
pub use mock_chain::{CallCounts, MockChain};
pub use round_clock::RoundClock;
pub use rpc::{BoxValue, ChainRpc, FetchError};
pub use view::ChainView;
