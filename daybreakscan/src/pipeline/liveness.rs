//! Liveness classification (spec §4.5): is a mint's market still trading.

use std::collections::HashMap;

use tracing::instrument;

use daybreakscan_core::classify::classify_liveness;
use daybreakscan_core::model::TokenStatus;

use crate::cache::CacheRegistry;
use crate::clients::Clients;
use crate::error::ScanError;

const LIVENESS_BATCH_SIZE: usize = 30;

/// `bulk_liveness(mints) -> map<mint, TokenStatus>`. Mints with no DEX pair at
/// all are *unverified* and simply absent from the returned map — never
/// inserted as `dead`.
#[instrument(skip(clients, cache, mints), fields(count = mints.len()))]
pub async fn bulk_liveness(clients: &Clients, cache: &CacheRegistry, mints: &[String], now: i64) -> HashMap<String, TokenStatus> {
    let mut result = HashMap::new();
    let mut uncached = Vec::new();

    for mint in mints {
        match cache.liveness.get(mint, now).and_then(|v| serde_json::from_value::<TokenStatus>(v).ok()) {
            Some(status) => {
                result.insert(mint.clone(), status);
            }
            None => uncached.push(mint.clone()),
        }
    }

    let batches: Vec<Vec<String>> = uncached.chunks(LIVENESS_BATCH_SIZE).map(|c| c.to_vec()).collect();
    let fetches = batches.iter().map(|batch| fetch_batch(clients, batch));
    let batch_results = futures::future::join_all(fetches).await;

    for (batch, aggregates) in batches.iter().zip(batch_results) {
        let Ok(aggregates) = aggregates else {
            continue;
        };
        for mint in batch {
            let Some(agg) = aggregates.get(mint) else {
                continue;
            };
            if !agg.has_any_pair {
                continue;
            }
            let liveness = classify_liveness(agg.liquidity_usd, agg.volume_24h_usd);
            let status = TokenStatus {
                liveness,
                liquidity_usd: agg.liquidity_usd,
                volume_24h_usd: agg.volume_24h_usd,
                price_usd: agg.price_usd,
                socials: agg.socials.clone(),
                pair_created_at: agg.pair_created_at,
            };
            if let Ok(json) = serde_json::to_value(&status) {
                cache.liveness.set(mint.clone(), json, now);
            }
            result.insert(mint.clone(), status);
        }
    }

    result
}

async fn fetch_batch(clients: &Clients, batch: &[String]) -> Result<HashMap<String, crate::clients::types::DexAggregate>, ScanError> {
    clients.dex_index.get_pairs(batch).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fakes::{FakeChainRpc, FakeDexIndex, FakeEnhancedHistory, FakePriceOracle, FakeRugReport};
    use crate::clients::types::DexAggregate;
    use std::sync::Arc;

    fn test_clients(dex: FakeDexIndex) -> Clients {
        Clients {
            enhanced_history: Arc::new(FakeEnhancedHistory::default()),
            chain_rpc: Arc::new(FakeChainRpc::default()),
            dex_index: Arc::new(dex),
            price_oracle: Arc::new(FakePriceOracle::default()),
            rug_report: Arc::new(FakeRugReport::default()),
        }
    }

    #[tokio::test]
    async fn mint_with_no_pair_is_omitted_not_dead() {
        let dex = FakeDexIndex::default();
        let clients = test_clients(dex);
        let cache = CacheRegistry::new();
        let mints = vec!["MintNoPairAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA1".to_string()];
        let result = bulk_liveness(&clients, &cache, &mints, 0).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn dust_liquidity_pair_is_dead_regardless_of_age() {
        let dex = FakeDexIndex::default();
        dex.pairs.lock().unwrap().insert(
            "MintDustAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA2".to_string(),
            DexAggregate { liquidity_usd: 50.0, volume_24h_usd: 0.0, has_any_pair: true, pair_created_at: Some(300), ..Default::default() },
        );
        let clients = test_clients(dex);
        let cache = CacheRegistry::new();
        let mints = vec!["MintDustAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA2".to_string()];
        let result = bulk_liveness(&clients, &cache, &mints, 1_000).await;
        let status = result.get(&mints[0]).expect("mint present");
        assert_eq!(status.liveness, daybreakscan_core::model::Liveness::Dead);
    }

    #[tokio::test]
    async fn cached_entry_is_reused_without_refetch() {
        let dex = FakeDexIndex::default();
        let clients = test_clients(dex);
        let cache = CacheRegistry::new();
        let status = TokenStatus {
            liveness: daybreakscan_core::model::Liveness::Alive,
            liquidity_usd: 1000.0,
            volume_24h_usd: 10.0,
            price_usd: Some(0.01),
            socials: vec![],
            pair_created_at: Some(1),
        };
        let mint = "MintCachedAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA3".to_string();
        cache.liveness.set(mint.clone(), serde_json::to_value(&status).unwrap(), 0);
        let result = bulk_liveness(&clients, &cache, &[mint.clone()], 10).await;
        assert_eq!(result.get(&mint).unwrap().liveness, daybreakscan_core::model::Liveness::Alive);
    }
}
