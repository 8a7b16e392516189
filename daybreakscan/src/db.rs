//! Persistence for daily quota counters, recorded payments, the scan audit
//! log, and the deployer→tokens enumeration cache.
//!
//! SQLite via sqlx, WAL mode, single writer pool (spec §9 "every write goes
//! through one pool; no multi-writer races").

use sqlx::sqlite::{SqlitePoolOptions, SqliteSynchronous};
use sqlx::{ConnectOptions, Pool, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// Open (creating if absent) the database and run schema migrations.
pub async fn init_db(db_path: &Path) -> Result<Pool<Sqlite>, sqlx::Error> {
    let opts = sqlx::sqlite::SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_usage (
            identity TEXT NOT NULL,
            day TEXT NOT NULL,
            count INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (identity, day)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scheme TEXT NOT NULL,
            replay_key TEXT NOT NULL UNIQUE,
            payer TEXT NOT NULL,
            amount_usdc REAL NOT NULL,
            recorded_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scan_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            mint TEXT,
            deployer TEXT NOT NULL,
            score INTEGER NOT NULL,
            verdict TEXT NOT NULL,
            identity TEXT,
            scanned_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_scan_log_deployer ON scan_log(deployer)")
        .execute(&pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS deployer_tokens_cache (
            deployer TEXT NOT NULL,
            mint TEXT NOT NULL,
            discovered_at INTEGER NOT NULL,
            alive INTEGER,
            liquidity_usd REAL,
            last_checked_at INTEGER,
            PRIMARY KEY (deployer, mint)
        )
        "#,
    )
    .execute(&pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_deployer_tokens_deployer ON deployer_tokens_cache(deployer)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_deployer_tokens_last_checked ON deployer_tokens_cache(last_checked_at)")
        .execute(&pool)
        .await?;

    Ok(pool)
}

/// Increment and return today's usage count for `identity` on `day` (an
/// `YYYY-MM-DD` string so the caller controls the calendar-day boundary).
pub async fn increment_daily_usage(pool: &Pool<Sqlite>, identity: &str, day: &str) -> Result<u32, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO daily_usage (identity, day, count) VALUES (?, ?, 1)
        ON CONFLICT(identity, day) DO UPDATE SET count = count + 1
        "#,
    )
    .bind(identity)
    .bind(day)
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT count FROM daily_usage WHERE identity = ? AND day = ?")
        .bind(identity)
        .bind(day)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count") as u32)
}

pub async fn get_daily_usage(pool: &Pool<Sqlite>, identity: &str, day: &str) -> Result<u32, sqlx::Error> {
    let row = sqlx::query("SELECT count FROM daily_usage WHERE identity = ? AND day = ?")
        .bind(identity)
        .bind(day)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.get::<i64, _>("count") as u32).unwrap_or(0))
}

/// Delete usage rows for days strictly before `cutoff_day`. Run by the hourly
/// rezero job so the table doesn't grow unbounded.
pub async fn prune_daily_usage(pool: &Pool<Sqlite>, cutoff_day: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM daily_usage WHERE day < ?")
        .bind(cutoff_day)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Record a payment under its replay key. Returns `false` without inserting if
/// the key was already recorded (caller must treat that as a replay attempt).
pub async fn record_payment_if_new(
    pool: &Pool<Sqlite>,
    scheme: &str,
    replay_key: &str,
    payer: &str,
    amount_usdc: f64,
    recorded_at: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO payments (scheme, replay_key, payer, amount_usdc, recorded_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(scheme)
    .bind(replay_key)
    .bind(payer)
    .bind(amount_usdc)
    .bind(recorded_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn payment_already_recorded(pool: &Pool<Sqlite>, replay_key: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM payments WHERE replay_key = ?")
        .bind(replay_key)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

pub async fn log_scan(
    pool: &Pool<Sqlite>,
    mint: Option<&str>,
    deployer: &str,
    score: u8,
    verdict: &str,
    identity: Option<&str>,
    scanned_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO scan_log (mint, deployer, score, verdict, identity, scanned_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(mint)
    .bind(deployer)
    .bind(score as i64)
    .bind(verdict)
    .bind(identity)
    .bind(scanned_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Persist the set of mints discovered for a deployer. Idempotent: re-running
/// discovery on the same deployer just no-ops the already-known mints.
pub async fn cache_deployer_tokens(
    pool: &Pool<Sqlite>,
    deployer: &str,
    mints: &[String],
    discovered_at: i64,
) -> Result<(), sqlx::Error> {
    for mint in mints {
        sqlx::query(
            "INSERT OR IGNORE INTO deployer_tokens_cache (deployer, mint, discovered_at) VALUES (?, ?, ?)",
        )
        .bind(deployer)
        .bind(mint)
        .bind(discovered_at)
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn get_cached_deployer_tokens(pool: &Pool<Sqlite>, deployer: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT mint FROM deployer_tokens_cache WHERE deployer = ?")
        .bind(deployer)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|r| r.get::<String, _>("mint")).collect())
}

/// Record a fresh liveness reading for one of a deployer's cached tokens
/// (spec §6 "deployer-tokens cache ... alive flag, liquidity, last-checked").
pub async fn update_liveness_row(
    pool: &Pool<Sqlite>,
    deployer: &str,
    mint: &str,
    alive: bool,
    liquidity_usd: f64,
    checked_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE deployer_tokens_cache
        SET alive = ?, liquidity_usd = ?, last_checked_at = ?
        WHERE deployer = ? AND mint = ?
        "#,
    )
    .bind(alive)
    .bind(liquidity_usd)
    .bind(checked_at)
    .bind(deployer)
    .bind(mint)
    .execute(pool)
    .await?;
    Ok(())
}

/// One row due for reverification: still marked alive but last checked more
/// than `stale_after_secs` ago (spec §6 "mark stale alive rows dead when
/// their liveness has expired by > 6h and reverifies").
#[derive(Debug, Clone, PartialEq)]
pub struct StaleAliveRow {
    pub deployer: String,
    pub mint: String,
}

pub async fn find_stale_alive_rows(pool: &Pool<Sqlite>, now: i64, stale_after_secs: i64) -> Result<Vec<StaleAliveRow>, sqlx::Error> {
    let cutoff = now - stale_after_secs;
    let rows = sqlx::query(
        r#"
        SELECT deployer, mint FROM deployer_tokens_cache
        WHERE alive = 1 AND (last_checked_at IS NULL OR last_checked_at < ?)
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| StaleAliveRow { deployer: r.get("deployer"), mint: r.get("mint") })
        .collect())
}
