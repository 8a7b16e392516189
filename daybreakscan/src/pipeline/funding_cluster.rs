//! Funding source and cluster analysis (spec §4.7): who bankrolled the
//! deployer, and who else that same funder bankrolled.

use tracing::instrument;

use daybreakscan_core::model::{Cluster, Funding};

use crate::cex;
use crate::clients::Clients;
use crate::consts::NATIVE_MINT;
use crate::error::ScanError;
use crate::rpc::types::SortOrder;

const FUNDER_OUTBOUND_PAGES: u32 = 5;
const FUNDER_OUTBOUND_PAGE_SIZE: u32 = 100;
const MIN_TRANSFER_LAMPORTS: u64 = 10_000_000; // 0.01 SOL
const CLUSTER_SAMPLE_CAP: usize = 25;
const DEPLOYER_CHECK_TX_WINDOW: u32 = 20;

/// `funding_source(wallet) -> {wallet, timestamp}?`. Earliest incoming native
/// transfer with an other-party sender; falls back to the first fee payer
/// that isn't `wallet` itself if no such transfer is found.
#[instrument(skip(clients), fields(wallet = %wallet))]
pub async fn funding_source(clients: &Clients, wallet: &str) -> Result<Option<Funding>, ScanError> {
    let txs = clients.enhanced_history.transactions(wallet, 100, SortOrder::Ascending, None).await;
    let txs = match txs {
        Ok(txs) if !txs.is_empty() => txs,
        _ => return funding_source_via_rpc_fallback(clients, wallet).await,
    };

    for tx in &txs {
        for transfer in &tx.native_transfers {
            let Some(from) = &transfer.from_user_account else { continue };
            if transfer.to_user_account.as_deref() != Some(wallet) {
                continue;
            }
            if from == wallet {
                continue;
            }
            return Ok(Some(build_funding(from, tx.timestamp)?));
        }
    }

    for tx in &txs {
        let Some(payer) = &tx.fee_payer else { continue };
        if payer != wallet {
            return Ok(Some(build_funding(payer, tx.timestamp)?));
        }
    }

    Ok(None)
}

async fn funding_source_via_rpc_fallback(clients: &Clients, wallet: &str) -> Result<Option<Funding>, ScanError> {
    let signatures = clients.chain_rpc.get_signatures_for_address(wallet, None, 1000).await?;
    let Some(oldest) = signatures.last() else {
        return Ok(None);
    };
    let tx = clients.chain_rpc.get_transaction(oldest).await?;
    match &tx.fee_payer {
        Some(payer) if payer != wallet => Ok(Some(build_funding(payer, tx.timestamp)?)),
        _ => Ok(None),
    }
}

fn build_funding(source_wallet: &str, timestamp: Option<i64>) -> Result<Funding, ScanError> {
    let address: daybreakscan_core::Address = source_wallet.parse().map_err(ScanError::from)?;
    let from_cex = cex::is_cex(source_wallet);
    Ok(Funding {
        source_wallet: address,
        timestamp: timestamp.unwrap_or(0),
        from_cex,
        cex_name: cex::lookup(source_wallet).map(String::from),
    })
}

/// `analyze_cluster(funder, exclude) -> {funded_wallets, deployer_count, from_cex, cex_name}`.
#[instrument(skip(clients), fields(funder = %funder))]
pub async fn analyze_cluster(clients: &Clients, funder: &str, exclude: &[String]) -> Result<Cluster, ScanError> {
    let from_cex = cex::is_cex(funder);
    let cex_name = cex::lookup(funder).map(String::from);

    let destinations = collect_outbound_destinations(clients, funder, exclude).await?;
    let sample: Vec<String> = destinations.into_iter().take(CLUSTER_SAMPLE_CAP).collect();

    let checks = sample.iter().map(|wallet| is_deployer(clients, wallet));
    let results = futures::future::join_all(checks).await;
    let deployer_count = results.into_iter().filter(|r| matches!(r, Ok(true))).count() as u32;

    let funded_wallets = sample
        .iter()
        .filter_map(|w| w.parse::<daybreakscan_core::Address>().ok())
        .collect();

    Ok(Cluster { funded_wallets, deployer_count, from_cex, cex_name })
}

async fn collect_outbound_destinations(clients: &Clients, funder: &str, exclude: &[String]) -> Result<Vec<String>, ScanError> {
    let mut destinations = Vec::new();
    let mut before: Option<String> = None;

    for _ in 0..FUNDER_OUTBOUND_PAGES {
        let page = match clients.enhanced_history.transactions(funder, FUNDER_OUTBOUND_PAGE_SIZE, SortOrder::Descending, before.as_deref()).await {
            Ok(page) => page,
            Err(_) => break,
        };
        if page.is_empty() {
            break;
        }
        for tx in &page {
            for transfer in &tx.native_transfers {
                if transfer.from_user_account.as_deref() != Some(funder) {
                    continue;
                }
                let Some(dest) = &transfer.to_user_account else { continue };
                if dest == funder || dest == NATIVE_MINT || exclude.contains(dest) {
                    continue;
                }
                if transfer.amount.unwrap_or(0) > MIN_TRANSFER_LAMPORTS && !destinations.contains(dest) {
                    destinations.push(dest.clone());
                }
            }
        }
        before = page.last().map(|t| t.signature.clone());
        if page.len() < FUNDER_OUTBOUND_PAGE_SIZE as usize {
            break;
        }
    }

    Ok(destinations)
}

async fn is_deployer(clients: &Clients, wallet: &str) -> Result<bool, ScanError> {
    let txs = clients.enhanced_history.transactions(wallet, DEPLOYER_CHECK_TX_WINDOW, SortOrder::Descending, None).await?;
    Ok(txs
        .iter()
        .any(|tx| tx.fee_payer.as_deref() == Some(wallet) && matches!(tx.tx_type.as_deref(), Some("CREATE") | Some("TOKEN_MINT"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fakes::{FakeChainRpc, FakeDexIndex, FakeEnhancedHistory, FakePriceOracle, FakeRugReport};
    use crate::clients::types::{EnhancedTx, NativeTransfer};
    use std::sync::Arc;

    fn test_clients(enhanced: FakeEnhancedHistory) -> Clients {
        Clients {
            enhanced_history: Arc::new(enhanced),
            chain_rpc: Arc::new(FakeChainRpc::default()),
            dex_index: Arc::new(FakeDexIndex::default()),
            price_oracle: Arc::new(FakePriceOracle::default()),
            rug_report: Arc::new(FakeRugReport::default()),
        }
    }

    #[tokio::test]
    async fn earliest_other_party_native_transfer_wins() {
        let wallet = "H8sMJSCQxfKiFTCfDR3DUMLPwcRbM61LGFJ61tW1MFa6".to_string();
        let funder = "5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9".to_string();
        let mut enhanced = FakeEnhancedHistory::default();
        enhanced.by_address.insert(
            wallet.clone(),
            vec![EnhancedTx {
                signature: "sig1".to_string(),
                timestamp: Some(42),
                native_transfers: vec![NativeTransfer {
                    from_user_account: Some(funder.clone()),
                    to_user_account: Some(wallet.clone()),
                    amount: Some(1_000_000_000),
                }],
                ..Default::default()
            }],
        );
        let clients = test_clients(enhanced);
        let funding = funding_source(&clients, &wallet).await.unwrap().expect("funding found");
        assert_eq!(funding.source_wallet.as_str(), funder);
        assert!(funding.from_cex);
        assert_eq!(funding.cex_name.as_deref(), Some("Binance"));
    }
}
