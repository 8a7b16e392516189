//! The DaybreakScan service: RPC routing, caching, upstream clients, scan
//! pipeline orchestration, the quota/payment gate, and sqlite persistence.
//! The HTTP/route layer, report renderer, pub/sub feed, and agent surface are
//! external collaborators (spec §1) and are not built in this crate.

pub mod cache;
pub mod cex;
pub mod clients;
pub mod config;
pub mod consts;
pub mod db;
pub mod error;
pub mod payment;
pub mod pipeline;
pub mod quota;
pub mod ratelimit;
pub mod rpc;

use std::sync::Arc;
use std::time::Duration;

use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use daybreakscan_core::model::Scan;

use clients::Clients;
use error::ScanError;
use payment::PaymentDetails;
use pipeline::ScanSettings;
use quota::{Identity, QuotaGate};
use ratelimit::CallerRateLimiter;

/// Everything one running instance needs to serve scans: upstream clients,
/// caches, the persistence pool, and the resolved settings. Construct once at
/// startup (spec §9 "explicit init"); `Scanner::close` is the matching
/// teardown hook.
pub struct Scanner {
    pub clients: Clients,
    pub cache: cache::CacheRegistry,
    pub pool: Pool<Sqlite>,
    pub quota: QuotaGate,
    pub rate_limiter: CallerRateLimiter,
    pub settings: ScanSettings,
    pub scan_timeout: Duration,
    pub network: String,
    pub treasury_wallet: Option<String>,
    pub price_usd: f64,
}

impl Scanner {
    /// Scans the deployer behind a token mint: discovers the deployer, then
    /// runs every downstream pipeline stage (spec §5). `now` is the caller's
    /// clock reading, threaded through so every stage sees a consistent wall
    /// time and so tests don't race the real clock.
    #[instrument(skip(self), fields(mint = %token_address))]
    pub async fn scan_deployer(&self, token_address: &str, now: i64) -> Result<Scan, ScanError> {
        self.rate_limiter.check()?;
        let mint: daybreakscan_core::Address = token_address.parse()?;

        let scan = tokio::time::timeout(self.scan_timeout, async {
            let deployer = pipeline::deployer_discovery::find_deployer(&self.clients, mint.as_str())
                .await?
                .ok_or(ScanError::DeployerNotFound)?;

            pipeline::run_scan(&self.clients, &self.cache, &self.settings, deployer, Some(mint.as_str()), now).await
        })
        .await
        .map_err(|_| ScanError::ScanTimeout)??;

        self.log_scan(&scan, Some(mint.as_str()), now).await;
        Ok(scan)
    }

    /// Scans a deployer wallet directly, skipping discovery (spec §6 API
    /// surface `scan_wallet`).
    #[instrument(skip(self), fields(wallet = %wallet_address))]
    pub async fn scan_wallet(&self, wallet_address: &str, now: i64) -> Result<Scan, ScanError> {
        self.rate_limiter.check()?;
        let wallet: daybreakscan_core::Address = wallet_address.parse()?;
        let deployer = daybreakscan_core::model::Deployer {
            wallet: wallet.clone(),
            creation_tx_id: String::new(),
            method: daybreakscan_core::model::DetectionMethod::RpcFallback,
            first_seen: now,
            last_seen: now,
        };

        let scan = tokio::time::timeout(self.scan_timeout, pipeline::run_scan(&self.clients, &self.cache, &self.settings, deployer, None, now))
            .await
            .map_err(|_| ScanError::ScanTimeout)??;

        self.log_scan(&scan, None, now).await;
        Ok(scan)
    }

    async fn log_scan(&self, scan: &Scan, mint: Option<&str>, now: i64) {
        let verdict = serde_json::to_value(scan.reputation.verdict).ok().and_then(|v| v.as_str().map(String::from)).unwrap_or_default();
        if let Err(e) = db::log_scan(&self.pool, mint, scan.deployer.wallet.as_str(), scan.reputation.score, &verdict, None, now).await {
            warn!(error = %e, "failed to persist scan log entry");
        }
        let mint_strings: Vec<String> = scan.tokens.iter().map(|(m, _)| m.address.to_string()).collect();
        if let Err(e) = db::cache_deployer_tokens(&self.pool, scan.deployer.wallet.as_str(), &mint_strings, now).await {
            warn!(error = %e, "failed to cache deployer tokens");
            return;
        }
        for (mint, status) in &scan.tokens {
            let alive = status.liveness == daybreakscan_core::model::Liveness::Alive;
            if let Err(e) = db::update_liveness_row(&self.pool, scan.deployer.wallet.as_str(), mint.address.as_str(), alive, status.liquidity_usd, now).await {
                warn!(error = %e, mint = %mint.address, "failed to seed liveness row");
            }
        }
    }

    /// Checks and increments quota for `identity`; on exhaustion returns the
    /// `PaymentDetails` document the caller upgrades with (spec §4.10).
    pub async fn check_quota(&self, identity: &Identity, day: &str, now: i64) -> Result<(), ScanError> {
        let treasury = self.treasury_wallet.clone().unwrap_or_default();
        let network = self.network.clone();
        let price = self.price_usd;
        self.quota
            .check_and_increment(&self.pool, identity, day, || PaymentDetails::exact_usdc(&network, &treasury, price, now, 600))
            .await
    }

    /// `payment_required(scan_request) -> PaymentDetails` (spec §6 API
    /// surface): the document a 402 response carries.
    pub fn payment_required(&self, now: i64) -> PaymentDetails {
        let treasury = self.treasury_wallet.clone().unwrap_or_default();
        PaymentDetails::exact_usdc(&self.network, &treasury, self.price_usd, now, 600)
    }

    /// Background job: re-zero stale daily counters (spec §6 "hourly job
    /// re-zeros stale daily counters"). Implemented as a prune of rows from
    /// before `today` — a fresh `get_daily_usage` on a pruned day naturally
    /// reads back to zero.
    pub async fn rezero_stale_counters(&self, today: &str) {
        match db::prune_daily_usage(&self.pool, today).await {
            Ok(n) if n > 0 => info!(pruned = n, "rezeroed stale daily usage rows"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "daily usage rezero sweep failed"),
        }
    }

    /// Background job: flush expired cache entries (spec §4.2 "background
    /// sweep runs every 60s").
    pub fn sweep_caches(&self, now: i64) {
        self.cache.sweep_all(now);
    }

    /// Background job: reverify deployer-tokens-cache rows still marked alive
    /// whose liveness reading has gone stale by more than `stale_after_secs`
    /// (spec §6, default threshold 6h).
    pub async fn reverify_stale_alive(&self, now: i64, stale_after_secs: i64) {
        let rows = match db::find_stale_alive_rows(&self.pool, now, stale_after_secs).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "stale-alive lookup failed");
                return;
            }
        };
        if rows.is_empty() {
            return;
        }

        let mints: Vec<String> = rows.iter().map(|r| r.mint.clone()).collect();
        let liveness_map = pipeline::liveness::bulk_liveness(&self.clients, &self.cache, &mints, now).await;

        for row in &rows {
            let (alive, liquidity) = match liveness_map.get(&row.mint) {
                Some(status) => (status.liveness == daybreakscan_core::model::Liveness::Alive, status.liquidity_usd),
                None => (false, 0.0),
            };
            if let Err(e) = db::update_liveness_row(&self.pool, &row.deployer, &row.mint, alive, liquidity, now).await {
                warn!(error = %e, mint = %row.mint, "failed to persist stale-alive reverification");
            }
        }
    }

    /// Flush/close hook (spec §9 "explicit teardown"). Caches have nothing to
    /// flush to disk; this exists so callers have one place to extend if a
    /// future cache category gains persistence.
    pub async fn close(&self) {
        self.cache.clear_all();
    }
}

/// Build the production client bundle and wiring from parsed [`config::Config`].
pub fn build_clients(cfg: &config::Config) -> Clients {
    let router = Arc::new(rpc::RpcRouter::new(
        cfg.basic_provider_urls.clone(),
        cfg.enhanced_provider_key.clone(),
        Duration::from_secs(cfg.rpc_timeout_secs),
    ));

    Clients {
        enhanced_history: Arc::new(clients::adapters::HeliusEnhancedHistoryClient::new(router.clone())),
        chain_rpc: Arc::new(clients::adapters::SolanaChainRpcClient::new(router)),
        dex_index: Arc::new(clients::adapters::DexscreenerIndexClient::new("https://api.dexscreener.com/latest")),
        price_oracle: Arc::new(clients::adapters::JupiterPriceOracleClient::new("https://price.jup.ag/v6")),
        rug_report: Arc::new(clients::adapters::RugCheckClient::new("https://api.rugcheck.xyz/v1")),
    }
}
