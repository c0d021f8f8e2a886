//! # DSTAKE Agent CLI
//!
//! Command-line viewer for the staking marketplace's on-chain state.
//!
//! ## Commands
//!
//! ### Chain
//! - `round`: Current chain round
//!
//! ### Contracts & Ads
//! - `contract <APP_ID>`: Delegator contract with its current status
//! - `ad <APP_ID>`: Validator ad and its terms
//! - `ad-contracts <APP_ID>`: Delegator contracts spawned by an ad
//!
//! ### Users
//! - `user <ADDRESS>`: Registered user info
//! - `users <val|del>`: All users of a role, walked from the noticeboard
//! - `user-contracts <ADDRESS>`: Contracts listed for a user
//! - `user-ads <ADDRESS>`: Ads listed for a user
//!
//! ### Offline
//! - `decode <SCHEMA> <HEX>`: Decode ABI bytes without a node
//!
//! Every command accepts `--json`.
//!
//! ## Configuration
//!
//! Priority, highest first: CLI flags, `DSTAKE_*` environment variables,
//! `--config` TOML file, defaults.
//!
//! - `DSTAKE_ALGOD_URL`: node REST endpoint (default: http://localhost:4001)
//! - `DSTAKE_ALGOD_TOKEN`: node API token
//! - `DSTAKE_NOTICEBOARD_APP_ID`: marketplace noticeboard app
//! - `DSTAKE_TIMEOUT_MS`, `DSTAKE_RETRY_COUNT`, `DSTAKE_RETRY_DELAY_MS`,
//!   `DSTAKE_ROUND_CACHE_TTL_MS`
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); stdout carries only
//! command output.

mod cmd_decode;
mod cmd_query;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dstake_common::{load_from_file, AlgodClient, ChainConfig, ChainView};
use dstake_proto::{Address, UserRole};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cmd_decode::Schema;

#[derive(Parser, Debug)]
#[command(version, about = "DSTAKE Agent CLI")]
struct Cli {
    /// Algod REST endpoint
    #[arg(long, global = true, env = "DSTAKE_ALGOD_URL")]
    algod_url: Option<String>,

    /// Algod API token
    #[arg(long, global = true, env = "DSTAKE_ALGOD_TOKEN", hide_env_values = true)]
    algod_token: Option<String>,

    /// Noticeboard application id
    #[arg(long, global = true, env = "DSTAKE_NOTICEBOARD_APP_ID")]
    noticeboard_app_id: Option<u64>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode hex ABI bytes offline
    Decode {
        #[arg(value_enum)]
        schema: Schema,
        hex: String,
    },

    #[command(flatten)]
    Query(QueryCommand),
}

#[derive(Subcommand, Debug)]
enum QueryCommand {
    /// Show the current chain round
    Round,

    /// Show a delegator contract
    Contract { app_id: u64 },

    /// Show a validator ad
    Ad { app_id: u64 },

    /// Show a registered user
    User { address: Address },

    /// List all users of a role (val or del)
    Users { role: UserRole },

    /// List delegator contracts of a user
    UserContracts { address: Address },

    /// List validator ads of a user
    UserAds { address: Address },

    /// List delegator contracts of a validator ad
    AdContracts { app_id: u64 },
}

/// Merge config sources: defaults < file < env < flags.
fn resolve_config(cli: &Cli) -> Result<ChainConfig> {
    let mut config = match &cli.config {
        Some(path) => load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ChainConfig::default(),
    };
    config.apply_env().context("invalid DSTAKE_* environment variable")?;

    if let Some(ref url) = cli.algod_url {
        config.algod_url = url.clone();
    }
    if let Some(ref token) = cli.algod_token {
        config.algod_token = Some(token.clone()).filter(|t| !t.is_empty());
    }
    if let Some(id) = cli.noticeboard_app_id {
        config.noticeboard_app_id = id;
    }

    config.validate()?;
    Ok(config)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let out = match &cli.cmd {
        Commands::Decode { schema, hex } => cmd_decode::handle_decode(*schema, hex, cli.json)?,
        Commands::Query(query) => {
            let config = resolve_config(&cli)?;
            run_query(&config, query, cli.json).await?
        }
    };
    print!("{}", ensure_newline(out));
    Ok(())
}

async fn run_query(config: &ChainConfig, query: &QueryCommand, json: bool) -> Result<String> {
    debug!(algod_url = %config.algod_url, noticeboard = config.noticeboard_app_id, "config resolved");
    let rpc = Arc::new(AlgodClient::new(config.clone())?);
    let view = ChainView::new(rpc, config);

    match query {
        QueryCommand::Round => cmd_query::handle_round(&view, json).await,
        QueryCommand::Contract { app_id } => cmd_query::handle_contract(&view, *app_id, json).await,
        QueryCommand::Ad { app_id } => cmd_query::handle_ad(&view, *app_id, json).await,
        QueryCommand::User { address } => cmd_query::handle_user(&view, address, json).await,
        QueryCommand::Users { role } => cmd_query::handle_users(&view, *role, json).await,
        QueryCommand::UserContracts { address } => {
            cmd_query::handle_user_contracts(&view, address, json).await
        }
        QueryCommand::UserAds { address } => cmd_query::handle_user_ads(&view, address, json).await,
        QueryCommand::AdContracts { app_id } => {
            cmd_query::handle_ad_contracts(&view, *app_id, json).await
        }
    }
}

fn ensure_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}
