//! Per-identity daily quota (spec §4.10). Wallets and IPs are separate
//! buckets with separate limits; admin wallets bypass the counter entirely.
//! Rollover is implicit: `daily_usage` is keyed by calendar day, so a new day
//! simply has no row yet.

use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Sqlite};

use crate::error::ScanError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Wallet(String),
    Ip(String),
}

impl Identity {
    fn bucket_key(&self) -> String {
        match self {
            Identity::Wallet(w) => format!("wallet:{w}"),
            Identity::Ip(ip) => format!("ip:{ip}"),
        }
    }
}

/// `YYYY-MM-DD` in UTC, the calendar-day boundary the spec's daily counters
/// roll over on.
pub fn today() -> String {
    Utc::now().date_naive().to_string()
}

/// Deterministic variant of [`today`] for tests.
pub fn day_from_unix(ts: i64) -> String {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .unwrap()
        .checked_add_signed(chrono::Duration::seconds(ts))
        .map(|d| d.to_string())
        .unwrap_or_else(today)
}

pub struct QuotaGate {
    pub daily_limit_wallet: u32,
    pub daily_limit_ip: u32,
    pub admin_wallets: Vec<String>,
}

impl QuotaGate {
    /// Returns `Ok(())` if the identity has remaining quota for `day` (and
    /// increments its counter), or `Err(ScanError::QuotaExceeded { .. })`
    /// carrying the payment document the caller must upgrade with.
    pub async fn check_and_increment(
        &self,
        pool: &Pool<Sqlite>,
        identity: &Identity,
        day: &str,
        payment_details: impl FnOnce() -> crate::payment::PaymentDetails,
    ) -> Result<(), ScanError> {
        if let Identity::Wallet(w) = identity {
            if self.admin_wallets.iter().any(|a| a == w) {
                return Ok(());
            }
        }

        let limit = match identity {
            Identity::Wallet(_) => self.daily_limit_wallet,
            Identity::Ip(_) => self.daily_limit_ip,
        };

        let used = crate::db::get_daily_usage(pool, &identity.bucket_key(), day).await?;
        if used >= limit {
            return Err(ScanError::QuotaExceeded { payment: payment_details() });
        }

        crate::db::increment_daily_usage(pool, &identity.bucket_key(), day).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> Pool<Sqlite> {
        crate::db::init_db(std::path::Path::new(":memory:")).await.unwrap()
    }

    fn gate() -> QuotaGate {
        QuotaGate { daily_limit_wallet: 3, daily_limit_ip: 1, admin_wallets: vec!["admin-wallet".to_string()] }
    }

    fn details() -> crate::payment::PaymentDetails {
        crate::payment::PaymentDetails::exact_usdc("solana", "treasury", 0.1, 0, 600)
    }

    #[tokio::test]
    async fn ip_bucket_exhausts_after_one_scan() {
        let pool = test_pool().await;
        let gate = gate();
        let ip = Identity::Ip("1.2.3.4".to_string());
        gate.check_and_increment(&pool, &ip, "2026-07-27", details).await.unwrap();
        let second = gate.check_and_increment(&pool, &ip, "2026-07-27", details).await;
        assert!(matches!(second, Err(ScanError::QuotaExceeded { .. })));
    }

    #[tokio::test]
    async fn admin_wallet_bypasses_quota() {
        let pool = test_pool().await;
        let gate = gate();
        let admin = Identity::Wallet("admin-wallet".to_string());
        for _ in 0..10 {
            gate.check_and_increment(&pool, &admin, "2026-07-27", details).await.unwrap();
        }
    }

    #[tokio::test]
    async fn counter_rolls_over_on_new_day() {
        let pool = test_pool().await;
        let gate = gate();
        let ip = Identity::Ip("9.9.9.9".to_string());
        gate.check_and_increment(&pool, &ip, "2026-07-27", details).await.unwrap();
        assert!(gate.check_and_increment(&pool, &ip, "2026-07-27", details).await.is_err());
        gate.check_and_increment(&pool, &ip, "2026-07-28", details).await.unwrap();
    }
}
