//! Deployer discovery (spec §4.3): who paid fees on a mint's creation.

use tracing::instrument;

use daybreakscan_core::model::{DetectionMethod, Deployer};

use crate::clients::Clients;
use crate::consts::PUMP_FUN_PROGRAM;
use crate::error::ScanError;
use crate::rpc::types::SortOrder;

const ENHANCED_OLDEST_SAMPLE: u32 = 5;
const FALLBACK_PAGE_SIZE: u32 = 1000;
const FALLBACK_MAX_PAGES: u32 = 10;

/// `find_deployer(mint) -> Deployer | None`. `None` is a legitimate outcome
/// (spec §8 scenario 1, "unknown token") distinct from an upstream failure,
/// which callers propagate as `ScanError` instead.
#[instrument(skip(clients), fields(mint = %mint))]
pub async fn find_deployer(clients: &Clients, mint: &str) -> Result<Option<Deployer>, ScanError> {
    if let Some(deployer) = find_via_enhanced(clients, mint).await? {
        return Ok(Some(deployer));
    }
    find_via_rpc_fallback(clients, mint).await
}

async fn find_via_enhanced(clients: &Clients, mint: &str) -> Result<Option<Deployer>, ScanError> {
    let txs = match clients.enhanced_history.transactions(mint, ENHANCED_OLDEST_SAMPLE, SortOrder::Ascending, None).await {
        Ok(txs) => txs,
        Err(_) => return Ok(None),
    };

    for tx in &txs {
        if tx.is_pump_fun_creation() {
            if let Some(fee_payer) = &tx.fee_payer {
                return Ok(Some(build_deployer(fee_payer, &tx.signature, DetectionMethod::Enhanced, tx.timestamp)?));
            }
        }
    }

    if let Some(oldest) = txs.first() {
        if oldest.touches_program(PUMP_FUN_PROGRAM) && oldest.has_initialize_mint2_for(mint) {
            if let Some(fee_payer) = &oldest.fee_payer {
                return Ok(Some(build_deployer(fee_payer, &oldest.signature, DetectionMethod::Enhanced, oldest.timestamp)?));
            }
        }
    }

    Ok(None)
}

async fn find_via_rpc_fallback(clients: &Clients, mint: &str) -> Result<Option<Deployer>, ScanError> {
    let mut before: Option<String> = None;
    let mut oldest_signature: Option<String> = None;

    for _ in 0..FALLBACK_MAX_PAGES {
        let page = clients
            .chain_rpc
            .get_signatures_for_address(mint, before.as_deref(), FALLBACK_PAGE_SIZE)
            .await?;
        if page.is_empty() {
            break;
        }
        oldest_signature = page.last().cloned();
        before = oldest_signature.clone();
        if page.len() < FALLBACK_PAGE_SIZE as usize {
            break;
        }
    }

    let Some(signature) = oldest_signature else {
        return Ok(None);
    };

    let tx = clients.chain_rpc.get_transaction(&signature).await?;

    // Spec §4.3 Strategy 2: if the oldest tx carries a matching
    // `initializeMint2`, the fee payer is the confirmed deployer; otherwise
    // we fall back to the same account under the "first signer" rule (the
    // fee payer is always account 0, the first signer, in this data model),
    // but that fallback is worth distinguishing in the logs from a confirmed
    // match.
    if !tx.has_initialize_mint2_for(mint) {
        tracing::debug!(signature = %signature, "oldest rpc-fallback tx has no matching initializeMint2, falling back to first signer");
    }

    let Some(fee_payer) = &tx.fee_payer else {
        return Ok(None);
    };

    Ok(Some(build_deployer(fee_payer, &signature, DetectionMethod::RpcFallback, tx.timestamp)?))
}

fn build_deployer(wallet: &str, creation_tx_id: &str, method: DetectionMethod, timestamp: Option<i64>) -> Result<Deployer, ScanError> {
    let address: daybreakscan_core::Address = wallet.parse().map_err(ScanError::from)?;
    let ts = timestamp.unwrap_or(0);
    Ok(Deployer {
        wallet: address,
        creation_tx_id: creation_tx_id.to_string(),
        method,
        first_seen: ts,
        last_seen: ts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fakes::{FakeChainRpc, FakeDexIndex, FakeEnhancedHistory, FakePriceOracle, FakeRugReport};
    use crate::clients::types::EnhancedTx;
    use std::sync::Arc;

    fn test_clients(enhanced: FakeEnhancedHistory, chain: FakeChainRpc) -> Clients {
        Clients {
            enhanced_history: Arc::new(enhanced),
            chain_rpc: Arc::new(chain),
            dex_index: Arc::new(FakeDexIndex::default()),
            price_oracle: Arc::new(FakePriceOracle::default()),
            rug_report: Arc::new(FakeRugReport::default()),
        }
    }

    fn sample_address() -> String {
        "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin".to_string()
    }

    #[tokio::test]
    async fn unknown_token_yields_none() {
        let clients = test_clients(FakeEnhancedHistory::default(), FakeChainRpc::default());
        let mint = sample_address();
        let result = find_deployer(&clients, &mint).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn enhanced_create_event_wins() {
        let mint = sample_address();
        let deployer_wallet = "H8sMJSCQxfKiFTCfDR3DUMLPwcRbM61LGFJ61tW1MFa6".to_string();
        let mut enhanced = FakeEnhancedHistory::default();
        enhanced.by_address.insert(
            mint.clone(),
            vec![EnhancedTx {
                signature: "sig1".to_string(),
                fee_payer: Some(deployer_wallet.clone()),
                timestamp: Some(100),
                tx_type: Some("CREATE".to_string()),
                source: Some("PUMP_FUN".to_string()),
                ..Default::default()
            }],
        );
        let clients = test_clients(enhanced, FakeChainRpc::default());
        let deployer = find_deployer(&clients, &mint).await.unwrap().expect("deployer found");
        assert_eq!(deployer.wallet.as_str(), deployer_wallet);
        assert_eq!(deployer.method, DetectionMethod::Enhanced);
    }

    fn init_mint2_instruction(mint: &str) -> crate::clients::types::Instruction {
        crate::clients::types::Instruction {
            program_id: Some(PUMP_FUN_PROGRAM.to_string()),
            parsed: Some(serde_json::json!({"type": "initializeMint2", "info": {"mint": mint}})),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn rpc_fallback_confirms_via_initialize_mint2() {
        let mint = sample_address();
        let deployer_wallet = "H8sMJSCQxfKiFTCfDR3DUMLPwcRbM61LGFJ61tW1MFa6".to_string();
        let mut chain = FakeChainRpc::default();
        chain.signatures.insert(mint.clone(), vec!["oldest-sig".to_string()]);
        chain.transactions.insert(
            "oldest-sig".to_string(),
            EnhancedTx {
                signature: "oldest-sig".to_string(),
                fee_payer: Some(deployer_wallet.clone()),
                timestamp: Some(50),
                instructions: vec![init_mint2_instruction(&mint)],
                ..Default::default()
            },
        );
        let clients = test_clients(FakeEnhancedHistory::default(), chain);
        let deployer = find_deployer(&clients, &mint).await.unwrap().expect("deployer found");
        assert_eq!(deployer.wallet.as_str(), deployer_wallet);
        assert_eq!(deployer.method, DetectionMethod::RpcFallback);
    }

    #[tokio::test]
    async fn rpc_fallback_without_initialize_mint2_still_returns_first_signer() {
        let mint = sample_address();
        let fallback_signer = "H8sMJSCQxfKiFTCfDR3DUMLPwcRbM61LGFJ61tW1MFa6".to_string();
        let mut chain = FakeChainRpc::default();
        chain.signatures.insert(mint.clone(), vec!["oldest-sig".to_string()]);
        chain.transactions.insert(
            "oldest-sig".to_string(),
            EnhancedTx {
                signature: "oldest-sig".to_string(),
                fee_payer: Some(fallback_signer.clone()),
                timestamp: Some(50),
                instructions: vec![],
                ..Default::default()
            },
        );
        let clients = test_clients(FakeEnhancedHistory::default(), chain);
        let deployer = find_deployer(&clients, &mint).await.unwrap().expect("deployer found");
        assert_eq!(deployer.wallet.as_str(), fallback_signer);
        assert_eq!(deployer.method, DetectionMethod::RpcFallback);
    }
}
