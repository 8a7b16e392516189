//! Death classification (spec §4.6): why did a dead token die.

use std::collections::HashMap;

use tracing::instrument;

use daybreakscan_core::classify::{classify_death, deployer_sold, lifespan_hours};
use daybreakscan_core::model::{DeathClassification, DeathEvidence, DeathType, TokenStatus};

use crate::clients::Clients;
use crate::consts::KNOWN_DEX_PROGRAMS;
use crate::rpc::types::SortOrder;

const EVIDENCE_BATCH_SIZE: usize = 5;
const INITIAL_TRANSFER_WINDOW_HOURS: f64 = 4.0;
const REAL_BUYERS_LIQUIDITY_USD: f64 = 500.0;

/// `death_type` for dead mints beyond the classifier's sample cap, or with no
/// DEX history at all: they default to `natural` per spec §4.6.
fn default_classification() -> DeathClassification {
    DeathClassification {
        death_type: DeathType::Natural,
        evidence: DeathEvidence {
            deployer_holdings_pct: None,
            deployer_sold: false,
            peak_liquidity_usd: 0.0,
            lifespan_hours: 0.0,
            had_real_buyers: false,
            initial_transfer_to: None,
            initial_transfer_is_dex: false,
            initial_transfer_is_associated: false,
        },
    }
}

/// Classifies every dead mint that has DEX history, in descending peak
/// liquidity order, capped at `cap` (spec §9 Open Question, default 50).
#[instrument(skip(clients, dead_mints), fields(count = dead_mints.len()))]
pub async fn classify_dead_tokens(
    clients: &Clients,
    deployer: &str,
    deployer_funding_source: Option<&str>,
    dead_mints: &HashMap<String, TokenStatus>,
    now: i64,
    cap: usize,
) -> HashMap<String, DeathClassification> {
    let mut with_history: Vec<&String> = dead_mints.keys().collect();
    with_history.sort_by(|a, b| {
        let la = dead_mints[*a].liquidity_usd;
        let lb = dead_mints[*b].liquidity_usd;
        lb.partial_cmp(&la).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut result = HashMap::new();
    let (to_classify, overflow) = with_history.split_at(with_history.len().min(cap));
    for mint in overflow {
        result.insert((*mint).clone(), default_classification());
    }

    for chunk in to_classify.chunks(EVIDENCE_BATCH_SIZE) {
        let futures = chunk.iter().map(|mint| {
            let status = &dead_mints[*mint];
            gather_and_classify(clients, deployer, deployer_funding_source, mint, status, now)
        });
        let outcomes = futures::future::join_all(futures).await;
        for (mint, classification) in chunk.iter().zip(outcomes) {
            result.insert((*mint).clone(), classification);
        }
    }

    result
}

async fn gather_and_classify(
    clients: &Clients,
    deployer: &str,
    deployer_funding_source: Option<&str>,
    mint: &str,
    status: &TokenStatus,
    now: i64,
) -> DeathClassification {
    let created_at = status.pair_created_at.unwrap_or(now);
    let hours_since_creation = ((now - created_at) as f64 / 3600.0).max(0.0);

    let deployer_holdings_pct = holdings_pct(clients, deployer, mint).await;
    let sold = deployer_sold(deployer_holdings_pct);
    let had_real_buyers = status.liquidity_usd >= REAL_BUYERS_LIQUIDITY_USD;

    let (initial_transfer_to, initial_transfer_is_dex, initial_transfer_is_associated) =
        find_initial_transfer(clients, deployer, deployer_funding_source, mint, created_at).await;

    let evidence = DeathEvidence {
        deployer_holdings_pct,
        deployer_sold: sold,
        peak_liquidity_usd: status.liquidity_usd,
        lifespan_hours: lifespan_hours(hours_since_creation),
        had_real_buyers,
        initial_transfer_to,
        initial_transfer_is_dex,
        initial_transfer_is_associated,
    };

    DeathClassification { death_type: classify_death(&evidence), evidence }
}

async fn holdings_pct(clients: &Clients, deployer: &str, mint: &str) -> Option<f64> {
    let mint_account = clients.chain_rpc.get_mint_account(mint).await.ok()?;
    if mint_account.supply == 0 {
        return Some(0.0);
    }
    let accounts = clients.chain_rpc.get_token_accounts_by_owner(deployer, mint).await.ok()?;
    let held: u64 = accounts.iter().map(|a| a.amount).sum();
    Some(held as f64 / mint_account.supply as f64 * 100.0)
}

async fn find_initial_transfer(
    clients: &Clients,
    deployer: &str,
    deployer_funding_source: Option<&str>,
    mint: &str,
    created_at: i64,
) -> (Option<daybreakscan_core::Address>, bool, bool) {
    let txs = match clients.enhanced_history.transactions(mint, 20, SortOrder::Ascending, None).await {
        Ok(txs) => txs,
        Err(_) => return (None, false, false),
    };

    for tx in &txs {
        let Some(ts) = tx.timestamp else { continue };
        if ((ts - created_at) as f64 / 3600.0) > INITIAL_TRANSFER_WINDOW_HOURS {
            continue;
        }
        for transfer in &tx.token_transfers {
            if transfer.mint.as_deref() != Some(mint) {
                continue;
            }
            if transfer.from_user_account.as_deref() != Some(deployer) {
                continue;
            }
            let Some(dest) = &transfer.to_user_account else { continue };
            let is_dex = KNOWN_DEX_PROGRAMS.contains(&dest.as_str())
                || tx.instructions.iter().any(|ix| ix.program_id.as_deref().map(|p| KNOWN_DEX_PROGRAMS.contains(&p)).unwrap_or(false));
            let is_associated = deployer_funding_source.map(|src| src == dest).unwrap_or(false);
            let address: Result<daybreakscan_core::Address, _> = dest.parse();
            return (address.ok(), is_dex, is_associated);
        }
    }
    (None, false, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fakes::{FakeChainRpc, FakeDexIndex, FakeEnhancedHistory, FakePriceOracle, FakeRugReport};
    use daybreakscan_core::model::Liveness;
    use std::sync::Arc;

    fn test_clients() -> Clients {
        Clients {
            enhanced_history: Arc::new(FakeEnhancedHistory::default()),
            chain_rpc: Arc::new(FakeChainRpc::default()),
            dex_index: Arc::new(FakeDexIndex::default()),
            price_oracle: Arc::new(FakePriceOracle::default()),
            rug_report: Arc::new(FakeRugReport::default()),
        }
    }

    fn dead_status() -> TokenStatus {
        TokenStatus { liveness: Liveness::Dead, liquidity_usd: 10.0, volume_24h_usd: 0.0, price_usd: None, socials: vec![], pair_created_at: Some(0) }
    }

    #[tokio::test]
    async fn tokens_beyond_cap_default_to_natural() {
        let clients = test_clients();
        let mut dead = HashMap::new();
        dead.insert("mint-a".to_string(), dead_status());
        dead.insert("mint-b".to_string(), dead_status());

        let result = classify_dead_tokens(&clients, "deployer", None, &dead, 10_000, 1).await;
        assert_eq!(result.len(), 2);
        let natural_count = result.values().filter(|c| c.death_type == DeathType::Natural).count();
        assert_eq!(natural_count, 2);
    }

    #[tokio::test]
    async fn no_holdings_fixture_falls_back_to_unverified_or_natural() {
        let clients = test_clients();
        let mut dead = HashMap::new();
        dead.insert("mint-a".to_string(), dead_status());
        let result = classify_dead_tokens(&clients, "deployer", None, &dead, 10_000, 50).await;
        let classification = &result["mint-a"];
        assert!(matches!(classification.death_type, DeathType::Natural | DeathType::Unverified));
    }
}
