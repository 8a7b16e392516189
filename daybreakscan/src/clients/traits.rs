//! Upstream collaborators described behaviorally (spec §9 "dynamic
//! dispatch"): each is a trait with one production adapter, so tests can
//! substitute in-memory fakes without touching the pipeline code.

use async_trait::async_trait;

use crate::error::ScanError;
use crate::rpc::types::SortOrder;

use super::types::{AssetMetadata, DexAggregate, EnhancedTx, LargestAccount, MintAccountInfo, RugReportSummary, TokenAccountBalance};

#[async_trait]
pub trait EnhancedHistoryClient: Send + Sync {
    async fn transactions(
        &self,
        address: &str,
        limit: u32,
        sort: SortOrder,
        before: Option<&str>,
    ) -> Result<Vec<EnhancedTx>, ScanError>;
}

#[async_trait]
pub trait ChainRpcClient: Send + Sync {
    async fn get_mint_account(&self, mint: &str) -> Result<MintAccountInfo, ScanError>;
    async fn get_token_accounts_by_owner(&self, owner: &str, mint: &str) -> Result<Vec<TokenAccountBalance>, ScanError>;
    async fn get_token_largest_accounts(&self, mint: &str) -> Result<Vec<LargestAccount>, ScanError>;
    async fn get_asset(&self, id: &str) -> Result<AssetMetadata, ScanError>;
    /// Paginated basic-RPC signature walk used by the fallback discovery and
    /// enumeration strategies (spec §4.3 strategy 2, §4.4 fallback).
    async fn get_signatures_for_address(&self, address: &str, before: Option<&str>, limit: u32) -> Result<Vec<String>, ScanError>;
    async fn get_transaction(&self, signature: &str) -> Result<EnhancedTx, ScanError>;
}

#[async_trait]
pub trait DexIndexClient: Send + Sync {
    /// `mints` are batched by the caller (groups of 30, spec §4.5); this
    /// returns one aggregate per mint that has at least one pair.
    async fn get_pairs(&self, mints: &[String]) -> Result<std::collections::HashMap<String, DexAggregate>, ScanError>;
}

#[async_trait]
pub trait PriceOracleClient: Send + Sync {
    async fn get_prices(&self, ids: &[String]) -> Result<std::collections::HashMap<String, f64>, ScanError>;
}

#[async_trait]
pub trait RugReportClient: Send + Sync {
    async fn get_report(&self, mint: &str) -> Result<Option<RugReportSummary>, ScanError>;
}
