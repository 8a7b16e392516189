//! Configuration for the daybreakscan service.

use clap::{Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use std::path::PathBuf;

/// DaybreakScan deployer-reputation oracle
#[derive(Parser, Debug, Clone)]
#[command(name = "daybreakscan")]
#[command(about = "Solana deployer-reputation scan pipeline", long_about = None)]
pub struct Config {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Solana cluster the scan pipeline talks to.
    #[arg(long, env = "NETWORK", default_value = "solana")]
    pub network: String,

    /// Ordered fallback chain of basic JSON-RPC providers.
    #[arg(long, env = "BASIC_PROVIDER_URLS", value_delimiter = ',', default_value = "https://api.mainnet-beta.solana.com")]
    pub basic_provider_urls: Vec<String>,

    /// API key for the pinned enhanced-history provider (transaction history,
    /// enriched account lookups). No fallback chain applies to these calls.
    #[arg(long, env = "ENHANCED_PROVIDER_KEY")]
    pub enhanced_provider_key: Option<String>,

    /// Wallet that receives scan payments.
    #[arg(long, env = "TREASURY_WALLET")]
    pub treasury_wallet: Option<Pubkey>,

    /// USDC price of a single scan.
    #[arg(long, env = "PRICE_USD", default_value = "0.10")]
    pub price_usd: f64,

    /// Wallets exempt from quota and payment enforcement.
    #[arg(long, env = "ADMIN_WALLETS", value_delimiter = ',')]
    pub admin_wallets: Vec<Pubkey>,

    /// Free scans per wallet per calendar day (UTC).
    #[arg(long, env = "DAILY_LIMIT_WALLET", default_value = "3")]
    pub daily_limit_wallet: u32,

    /// Free scans per source IP per calendar day (UTC), for unauthenticated callers.
    #[arg(long, env = "DAILY_LIMIT_IP", default_value = "1")]
    pub daily_limit_ip: u32,

    /// SQLite database path.
    #[arg(long, env = "DATABASE_PATH", default_value = "daybreakscan.db")]
    pub db_path: PathBuf,

    /// Deadline for an entire scan before it is abandoned.
    #[arg(long, env = "SCAN_TIMEOUT_SECS", default_value = "60")]
    pub scan_timeout_secs: u64,

    /// Per-attempt timeout for a basic or enhanced RPC call.
    #[arg(long, env = "RPC_TIMEOUT_SECS", default_value = "15")]
    pub rpc_timeout_secs: u64,

    /// Background job cadence (cache sweep, stale-alive reverify poll).
    #[arg(long, env = "POLL_INTERVAL_MS", default_value = "60000")]
    pub poll_interval_ms: u64,

    /// Window after a deployer's first deploy within which incoming funding is
    /// treated as a burner signal (spec §9 Open Question, resolved with this
    /// configurable default — see SPEC_FULL.md §G).
    #[arg(long, env = "BURNER_FUNDING_WINDOW_SECS", default_value = "600")]
    pub burner_funding_window_secs: i64,

    /// Maximum number of a deployer's tokens that get full death classification
    /// before the rest are left `unverified` (spec §9 Open Question).
    #[arg(long, env = "DEATH_CLASSIFIER_CAP", default_value = "50")]
    pub death_classifier_cap: usize,

    /// Caller-facing request rate cap, applied before a scan's internal
    /// fan-out begins (spec §5 backpressure).
    #[arg(long, env = "CALLER_RATE_LIMIT_PER_SEC", default_value = "10")]
    pub caller_rate_limit_per_sec: u32,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scan the deployer behind a token mint.
    ScanMint {
        /// Token mint address.
        mint: String,
    },
    /// Scan a deployer wallet directly.
    ScanWallet {
        /// Deployer wallet address.
        wallet: String,
    },
    /// Run the daily-rezero and stale-alive-reverify background jobs in a loop.
    Run,
}
