use clap::Parser;
use tracing::{error, info};

use daybreakscan::config::{Command, Config};
use daybreakscan::pipeline::ScanSettings;
use daybreakscan::quota::{today, QuotaGate};
use daybreakscan::ratelimit::CallerRateLimiter;
use daybreakscan::{build_clients, Scanner};

/// Stale-alive rows are reverified once their last check is older than this
/// (spec §6 "> 6h").
const STALE_ALIVE_THRESHOLD_SECS: i64 = 6 * 60 * 60;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = Config::parse();

    if let Err(e) = run(config).await {
        error!(error = %e, "daybreakscan exited with error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), String> {
    let pool = daybreakscan::db::init_db(&config.db_path).await.map_err(|e| e.to_string())?;
    let clients = build_clients(&config);

    let scanner = Scanner {
        clients,
        cache: daybreakscan::cache::CacheRegistry::new(),
        pool,
        quota: QuotaGate {
            daily_limit_wallet: config.daily_limit_wallet,
            daily_limit_ip: config.daily_limit_ip,
            admin_wallets: config.admin_wallets.iter().map(|w| w.to_string()).collect(),
        },
        rate_limiter: CallerRateLimiter::new(config.caller_rate_limit_per_sec),
        settings: ScanSettings {
            death_classifier_cap: config.death_classifier_cap,
            burner_funding_window_secs: config.burner_funding_window_secs,
        },
        scan_timeout: std::time::Duration::from_secs(config.scan_timeout_secs),
        network: config.network.clone(),
        treasury_wallet: config.treasury_wallet.map(|w| w.to_string()),
        price_usd: config.price_usd,
    };

    match config.command.clone().unwrap_or(Command::Run) {
        Command::ScanMint { mint } => {
            let now = chrono::Utc::now().timestamp();
            let scan = scanner.scan_deployer(&mint, now).await.map_err(|e| e.to_string())?;
            println!("{}", serde_json::to_string_pretty(&scan).map_err(|e| e.to_string())?);
        }
        Command::ScanWallet { wallet } => {
            let now = chrono::Utc::now().timestamp();
            let scan = scanner.scan_wallet(&wallet, now).await.map_err(|e| e.to_string())?;
            println!("{}", serde_json::to_string_pretty(&scan).map_err(|e| e.to_string())?);
        }
        Command::Run => run_background_jobs(scanner, &config).await,
    }

    Ok(())
}

/// Runs the two background jobs named in spec §6 on the configured poll
/// interval: hourly daily-counter rezero, and cache sweep (the stale-alive
/// reverification sweep shares the same cadence and reads back through the
/// deployer-tokens cache, see `daybreakscan::db`).
async fn run_background_jobs(scanner: Scanner, config: &Config) {
    info!(poll_interval_ms = config.poll_interval_ms, "running daybreakscan background jobs");
    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(config.poll_interval_ms));
    let mut last_rezero_hour = -1i64;

    loop {
        ticker.tick().await;
        let now = chrono::Utc::now().timestamp();
        scanner.sweep_caches(now);

        let hour = now / 3600;
        if hour != last_rezero_hour {
            last_rezero_hour = hour;
            scanner.rezero_stale_counters(&today()).await;
            scanner.reverify_stale_alive(now, STALE_ALIVE_THRESHOLD_SECS).await;
        }
    }
}
