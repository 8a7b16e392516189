//! In-memory fakes for the upstream client traits (spec §9 "tests can
//! substitute in-memory fakes"). Used by pipeline unit tests and the
//! integration tests under `tests/`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ScanError;
use crate::rpc::types::SortOrder;

use super::traits::{ChainRpcClient, DexIndexClient, EnhancedHistoryClient, PriceOracleClient, RugReportClient};
use super::types::{AssetMetadata, DexAggregate, EnhancedTx, LargestAccount, MintAccountInfo, RugReportSummary, TokenAccountBalance};

#[derive(Default)]
pub struct FakeEnhancedHistory {
    /// Keyed by address; each call ignores pagination args and returns the
    /// full fixture list, which is enough for the bounded test fixtures used
    /// in this crate.
    pub by_address: HashMap<String, Vec<EnhancedTx>>,
}

#[async_trait]
impl EnhancedHistoryClient for FakeEnhancedHistory {
    async fn transactions(&self, address: &str, _limit: u32, _sort: SortOrder, _before: Option<&str>) -> Result<Vec<EnhancedTx>, ScanError> {
        Ok(self.by_address.get(address).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeChainRpc {
    pub mint_accounts: HashMap<String, MintAccountInfo>,
    pub token_accounts: HashMap<(String, String), Vec<TokenAccountBalance>>,
    pub largest_accounts: HashMap<String, Vec<LargestAccount>>,
    pub assets: HashMap<String, AssetMetadata>,
    pub signatures: HashMap<String, Vec<String>>,
    pub transactions: HashMap<String, EnhancedTx>,
}

#[async_trait]
impl ChainRpcClient for FakeChainRpc {
    async fn get_mint_account(&self, mint: &str) -> Result<MintAccountInfo, ScanError> {
        self.mint_accounts
            .get(mint)
            .cloned()
            .ok_or_else(|| ScanError::UpstreamError("no fixture for mint".to_string()))
    }

    async fn get_token_accounts_by_owner(&self, owner: &str, mint: &str) -> Result<Vec<TokenAccountBalance>, ScanError> {
        Ok(self.token_accounts.get(&(owner.to_string(), mint.to_string())).cloned().unwrap_or_default())
    }

    async fn get_token_largest_accounts(&self, mint: &str) -> Result<Vec<LargestAccount>, ScanError> {
        Ok(self.largest_accounts.get(mint).cloned().unwrap_or_default())
    }

    async fn get_asset(&self, id: &str) -> Result<AssetMetadata, ScanError> {
        Ok(self.assets.get(id).cloned().unwrap_or_default())
    }

    async fn get_signatures_for_address(&self, address: &str, _before: Option<&str>, _limit: u32) -> Result<Vec<String>, ScanError> {
        Ok(self.signatures.get(address).cloned().unwrap_or_default())
    }

    async fn get_transaction(&self, signature: &str) -> Result<EnhancedTx, ScanError> {
        self.transactions
            .get(signature)
            .cloned()
            .ok_or_else(|| ScanError::UpstreamError("no fixture for signature".to_string()))
    }
}

#[derive(Default)]
pub struct FakeDexIndex {
    pub pairs: Mutex<HashMap<String, DexAggregate>>,
}

#[async_trait]
impl DexIndexClient for FakeDexIndex {
    async fn get_pairs(&self, mints: &[String]) -> Result<HashMap<String, DexAggregate>, ScanError> {
        let pairs = self.pairs.lock().unwrap();
        Ok(mints.iter().filter_map(|m| pairs.get(m).map(|v| (m.clone(), v.clone()))).collect())
    }
}

#[derive(Default)]
pub struct FakePriceOracle {
    pub prices: HashMap<String, f64>,
}

#[async_trait]
impl PriceOracleClient for FakePriceOracle {
    async fn get_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>, ScanError> {
        Ok(ids.iter().filter_map(|id| self.prices.get(id).map(|p| (id.clone(), *p))).collect())
    }
}

#[derive(Default)]
pub struct FakeRugReport {
    pub reports: HashMap<String, RugReportSummary>,
}

#[async_trait]
impl RugReportClient for FakeRugReport {
    async fn get_report(&self, mint: &str) -> Result<Option<RugReportSummary>, ScanError> {
        Ok(self.reports.get(mint).cloned())
    }
}
