//! Token risk signals (spec §4.8): mint/freeze authority, holder
//! concentration, bundled-launch detection, LP-lock cross-check. Every field
//! is independently nullable; upstream failures recover locally to `None`
//! rather than propagating (spec §7 policy for §4.5-4.8).

use tracing::instrument;

use daybreakscan_core::model::RiskSignals;

use crate::cache::CacheRegistry;
use crate::clients::Clients;
use crate::rpc::types::SortOrder;

const BUNDLE_SLOT_WINDOW: u64 = 3;
const BUNDLE_MIN_BUYERS: usize = 3;
const BUNDLE_SAMPLE_TXS: u32 = 20;

/// Gathers every risk signal for `mint`, deployed by `deployer`, whose
/// creation transaction is `creation_sig` (when known).
#[instrument(skip(clients, cache), fields(mint = %mint))]
pub async fn gather_risk_signals(
    clients: &Clients,
    cache: &CacheRegistry,
    mint: &str,
    deployer: &str,
    creation_sig: Option<&str>,
    now: i64,
) -> RiskSignals {
    let (mint_authority, freeze_authority, deployer_holdings_pct) = mint_authority_and_holdings(clients, cache, mint, deployer, now).await;
    let (top_holder_pct, top5_pct) = holder_concentration(clients, mint).await;
    let bundle_detected = match creation_sig {
        Some(sig) => Some(detect_bundle(clients, mint, deployer, sig).await),
        None => None,
    };
    let (lp_locked, lp_lock_pct) = lp_lock_status(clients, cache, mint, now).await;

    RiskSignals {
        mint_authority: mint_authority.and_then(|s| s.parse().ok()),
        freeze_authority: freeze_authority.and_then(|s| s.parse().ok()),
        deployer_holdings_pct,
        top_holder_pct,
        top5_pct,
        bundle_detected,
        lp_locked,
        lp_lock_pct,
    }
}

async fn mint_authority_and_holdings(
    clients: &Clients,
    cache: &CacheRegistry,
    mint: &str,
    deployer: &str,
    now: i64,
) -> (Option<String>, Option<String>, Option<f64>) {
    let cached = cache.mint_authority.get(&mint.to_string(), now).and_then(|v| serde_json::from_value::<CachedMintInfo>(v).ok());

    let mint_account = match cached {
        Some(c) => c.into(),
        None => match clients.chain_rpc.get_mint_account(mint).await {
            Ok(info) => {
                let cacheable = CachedMintInfo::from(&info);
                if let Ok(json) = serde_json::to_value(&cacheable) {
                    cache.mint_authority.set(mint.to_string(), json, now);
                }
                info
            }
            Err(_) => return (None, None, None),
        },
    };

    let holdings_pct = if mint_account.supply == 0 {
        Some(0.0)
    } else {
        match clients.chain_rpc.get_token_accounts_by_owner(deployer, mint).await {
            Ok(accounts) => {
                let held: u64 = accounts.iter().map(|a| a.amount).sum();
                Some(held as f64 / mint_account.supply as f64 * 100.0)
            }
            Err(_) => None,
        }
    };

    (mint_account.mint_authority, mint_account.freeze_authority, holdings_pct)
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CachedMintInfo {
    mint_authority: Option<String>,
    freeze_authority: Option<String>,
    supply: u64,
    decimals: u8,
}

impl From<&crate::clients::types::MintAccountInfo> for CachedMintInfo {
    fn from(info: &crate::clients::types::MintAccountInfo) -> Self {
        Self {
            mint_authority: info.mint_authority.clone(),
            freeze_authority: info.freeze_authority.clone(),
            supply: info.supply,
            decimals: info.decimals,
        }
    }
}

impl From<CachedMintInfo> for crate::clients::types::MintAccountInfo {
    fn from(c: CachedMintInfo) -> Self {
        Self { mint_authority: c.mint_authority, freeze_authority: c.freeze_authority, supply: c.supply, decimals: c.decimals }
    }
}

async fn holder_concentration(clients: &Clients, mint: &str) -> (Option<f64>, Option<f64>) {
    let Ok(accounts) = clients.chain_rpc.get_token_largest_accounts(mint).await else {
        return (None, None);
    };
    if accounts.is_empty() {
        return (None, None);
    }
    let total: u64 = accounts.iter().map(|a| a.amount).sum();
    if total == 0 {
        return (Some(0.0), Some(0.0));
    }
    let top1 = accounts[0].amount as f64 / total as f64 * 100.0;
    let top5: u64 = accounts.iter().take(5).map(|a| a.amount).sum();
    let top5_pct = top5 as f64 / total as f64 * 100.0;
    (Some(top1), Some(top5_pct))
}

/// Spec §4.8: fetch the first 20 enhanced txs of the mint ascending, resolve
/// the creation slot, count unique non-deployer wallets that receive the
/// mint or pay fee on a mint-receipt tx within ±3 slots of creation.
async fn detect_bundle(clients: &Clients, mint: &str, deployer: &str, creation_sig: &str) -> bool {
    let Ok(txs) = clients.enhanced_history.transactions(mint, BUNDLE_SAMPLE_TXS, SortOrder::Ascending, None).await else {
        return false;
    };

    let Some(creation_slot) = txs.iter().find(|t| t.signature == creation_sig).and_then(|t| t.slot) else {
        return false;
    };

    let mut buyers = std::collections::HashSet::new();
    for tx in &txs {
        let Some(slot) = tx.slot else { continue };
        let within_window = slot.abs_diff(creation_slot) <= BUNDLE_SLOT_WINDOW;
        if !within_window {
            continue;
        }
        for transfer in &tx.token_transfers {
            if transfer.mint.as_deref() != Some(mint) {
                continue;
            }
            if let Some(to) = &transfer.to_user_account {
                if to != deployer {
                    buyers.insert(to.clone());
                }
            }
        }
        if let Some(payer) = &tx.fee_payer {
            if payer != deployer && tx.token_transfers.iter().any(|t| t.mint.as_deref() == Some(mint) && t.to_user_account.as_deref() == Some(payer)) {
                buyers.insert(payer.clone());
            }
        }
    }

    buyers.len() >= BUNDLE_MIN_BUYERS
}

async fn lp_lock_status(clients: &Clients, cache: &CacheRegistry, mint: &str, now: i64) -> (Option<bool>, Option<f64>) {
    if let Some(cached) = cache.rug_report.get(&mint.to_string(), now) {
        if let Ok(summary) = serde_json::from_value::<CachedRugReport>(cached) {
            return (summary.lp_locked, summary.lp_lock_pct);
        }
    }

    let Ok(report) = clients.rug_report.get_report(mint).await else {
        return (None, None);
    };
    let Some(summary) = report else {
        return (None, None);
    };

    let cacheable = CachedRugReport { lp_locked: summary.lp_locked, lp_lock_pct: summary.lp_lock_pct };
    if let Ok(json) = serde_json::to_value(&cacheable) {
        cache.rug_report.set(mint.to_string(), json, now);
    }

    (summary.lp_locked, summary.lp_lock_pct)
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CachedRugReport {
    lp_locked: Option<bool>,
    lp_lock_pct: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fakes::{FakeChainRpc, FakeDexIndex, FakeEnhancedHistory, FakePriceOracle, FakeRugReport};
    use crate::clients::types::{EnhancedTx, MintAccountInfo, RugReportSummary, TokenTransfer};
    use std::sync::Arc;

    fn test_clients(chain: FakeChainRpc, enhanced: FakeEnhancedHistory, rug: FakeRugReport) -> Clients {
        Clients {
            enhanced_history: Arc::new(enhanced),
            chain_rpc: Arc::new(chain),
            dex_index: Arc::new(FakeDexIndex::default()),
            price_oracle: Arc::new(FakePriceOracle::default()),
            rug_report: Arc::new(rug),
        }
    }

    #[tokio::test]
    async fn missing_mint_account_yields_null_fields() {
        let clients = test_clients(FakeChainRpc::default(), FakeEnhancedHistory::default(), FakeRugReport::default());
        let cache = CacheRegistry::new();
        let risks = gather_risk_signals(&clients, &cache, "mint", "deployer", None, 0).await;
        assert!(risks.mint_authority.is_none());
        assert!(risks.deployer_holdings_pct.is_none());
        assert!(risks.bundle_detected.is_none());
    }

    #[tokio::test]
    async fn zero_supply_mint_has_zero_holdings() {
        let mut chain = FakeChainRpc::default();
        chain.mint_accounts.insert(
            "mint".to_string(),
            MintAccountInfo { mint_authority: None, freeze_authority: None, supply: 0, decimals: 6 },
        );
        let clients = test_clients(chain, FakeEnhancedHistory::default(), FakeRugReport::default());
        let cache = CacheRegistry::new();
        let risks = gather_risk_signals(&clients, &cache, "mint", "deployer", None, 0).await;
        assert_eq!(risks.deployer_holdings_pct, Some(0.0));
    }

    #[tokio::test]
    async fn bundle_detected_with_three_distinct_buyers() {
        let mint = "MintBundleAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA1".to_string();
        let deployer = "DeployerAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA1".to_string();
        let mut enhanced = FakeEnhancedHistory::default();
        let txs = vec![
            EnhancedTx { signature: "creation".to_string(), slot: Some(100), ..Default::default() },
            EnhancedTx {
                signature: "buy1".to_string(),
                slot: Some(101),
                token_transfers: vec![TokenTransfer { mint: Some(mint.clone()), to_user_account: Some("buyer1".to_string()), ..Default::default() }],
                ..Default::default()
            },
            EnhancedTx {
                signature: "buy2".to_string(),
                slot: Some(99),
                token_transfers: vec![TokenTransfer { mint: Some(mint.clone()), to_user_account: Some("buyer2".to_string()), ..Default::default() }],
                ..Default::default()
            },
            EnhancedTx {
                signature: "buy3".to_string(),
                slot: Some(103),
                token_transfers: vec![TokenTransfer { mint: Some(mint.clone()), to_user_account: Some("buyer3".to_string()), ..Default::default() }],
                ..Default::default()
            },
        ];
        enhanced.by_address.insert(mint.clone(), txs);
        let clients = test_clients(FakeChainRpc::default(), enhanced, FakeRugReport::default());
        assert!(detect_bundle(&clients, &mint, &deployer, "creation").await);
    }

    #[tokio::test]
    async fn lp_lock_prefers_direct_field() {
        let mint = "mint".to_string();
        let mut rug = FakeRugReport::default();
        rug.reports.insert(mint.clone(), RugReportSummary { lp_locked: Some(true), lp_lock_pct: Some(97.5) });
        let clients = test_clients(FakeChainRpc::default(), FakeEnhancedHistory::default(), rug);
        let cache = CacheRegistry::new();
        let (locked, pct) = lp_lock_status(&clients, &cache, &mint, 0).await;
        assert_eq!(locked, Some(true));
        assert_eq!(pct, Some(97.5));
    }
}
