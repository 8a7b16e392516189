//! Production adapters over the RPC router and the DEX/price/rug-report HTTP
//! APIs (spec §6). Each failure is normalized to [`ScanError`]; callers in
//! §4.5-4.8 decide locally whether to swallow it into a `null` field.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::instrument;

use crate::error::ScanError;
use crate::rpc::types::SortOrder;
use crate::rpc::RpcRouter;

use super::traits::{ChainRpcClient, DexIndexClient, EnhancedHistoryClient, PriceOracleClient, RugReportClient};
use super::types::{AssetMetadata, DexAggregate, EnhancedTx, LargestAccount, MintAccountInfo, RugReportSummary, TokenAccountBalance};

pub struct HeliusEnhancedHistoryClient {
    router: Arc<RpcRouter>,
}

impl HeliusEnhancedHistoryClient {
    pub fn new(router: Arc<RpcRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl EnhancedHistoryClient for HeliusEnhancedHistoryClient {
    #[instrument(skip(self))]
    async fn transactions(
        &self,
        address: &str,
        limit: u32,
        sort: SortOrder,
        before: Option<&str>,
    ) -> Result<Vec<EnhancedTx>, ScanError> {
        let raw = self.router.enhanced_txs(address, limit, sort, before).await?;
        raw.into_iter()
            .map(|v| serde_json::from_value(v).map_err(|e| ScanError::UpstreamError(e.to_string())))
            .collect()
    }
}

pub struct SolanaChainRpcClient {
    router: Arc<RpcRouter>,
    native_mint: String,
}

impl SolanaChainRpcClient {
    pub fn new(router: Arc<RpcRouter>) -> Self {
        Self {
            router,
            native_mint: "So11111111111111111111111111111111111111112".to_string(),
        }
    }
}

#[async_trait]
impl ChainRpcClient for SolanaChainRpcClient {
    async fn get_mint_account(&self, mint: &str) -> Result<MintAccountInfo, ScanError> {
        let value = self
            .router
            .basic_rpc("getAccountInfo", json!([mint, { "encoding": "jsonParsed" }]))
            .await?;

        let info = value
            .pointer("/value/data/parsed/info")
            .ok_or_else(|| ScanError::UpstreamError("mint account missing parsed info".to_string()))?;

        Ok(MintAccountInfo {
            mint_authority: info.get("mintAuthority").and_then(|v| v.as_str()).map(String::from),
            freeze_authority: info.get("freezeAuthority").and_then(|v| v.as_str()).map(String::from),
            supply: info
                .get("supply")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            decimals: info.get("decimals").and_then(|v| v.as_u64()).unwrap_or(0) as u8,
        })
    }

    async fn get_token_accounts_by_owner(&self, owner: &str, mint: &str) -> Result<Vec<TokenAccountBalance>, ScanError> {
        let value = self
            .router
            .basic_rpc(
                "getTokenAccountsByOwner",
                json!([owner, { "mint": mint }, { "encoding": "jsonParsed" }]),
            )
            .await?;

        let accounts = value
            .pointer("/value")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(accounts
            .iter()
            .filter_map(|acc| {
                let info = acc.pointer("/account/data/parsed/info")?;
                let amount = info.pointer("/tokenAmount/amount")?.as_str()?.parse().ok()?;
                Some(TokenAccountBalance { owner: owner.to_string(), amount })
            })
            .collect())
    }

    async fn get_token_largest_accounts(&self, mint: &str) -> Result<Vec<LargestAccount>, ScanError> {
        let value = self.router.basic_rpc("getTokenLargestAccounts", json!([mint])).await?;
        let accounts = value
            .pointer("/value")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(accounts
            .iter()
            .filter_map(|acc| {
                let address = acc.get("address")?.as_str()?.to_string();
                let amount = acc.get("amount")?.as_str()?.parse().ok()?;
                Some(LargestAccount { address, amount })
            })
            .collect())
    }

    async fn get_asset(&self, id: &str) -> Result<AssetMetadata, ScanError> {
        let value = self.router.basic_rpc("getAsset", json!({ "id": id })).await?;
        let metadata = value.pointer("/content/metadata");
        Ok(AssetMetadata {
            name: metadata.and_then(|m| m.get("name")).and_then(|v| v.as_str()).map(String::from),
            symbol: metadata.and_then(|m| m.get("symbol")).and_then(|v| v.as_str()).map(String::from),
        })
    }

    async fn get_signatures_for_address(&self, address: &str, before: Option<&str>, limit: u32) -> Result<Vec<String>, ScanError> {
        let mut opts = json!({ "limit": limit });
        if let Some(before) = before {
            opts["before"] = json!(before);
        }
        let value = self.router.basic_rpc("getSignaturesForAddress", json!([address, opts])).await?;
        let sigs = value.as_array().cloned().unwrap_or_default();
        Ok(sigs
            .iter()
            .filter_map(|s| s.get("signature").and_then(|v| v.as_str()).map(String::from))
            .collect())
    }

    async fn get_transaction(&self, signature: &str) -> Result<EnhancedTx, ScanError> {
        let value = self
            .router
            .basic_rpc(
                "getTransaction",
                json!([signature, { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }]),
            )
            .await?;

        let fee_payer = value
            .pointer("/transaction/message/accountKeys/0/pubkey")
            .or_else(|| value.pointer("/transaction/message/accountKeys/0"))
            .and_then(|v| v.as_str())
            .map(String::from);
        let timestamp = value.get("blockTime").and_then(|v| v.as_i64());
        let slot = value.get("slot").and_then(|v| v.as_u64());

        Ok(EnhancedTx {
            signature: signature.to_string(),
            fee_payer,
            timestamp,
            slot,
            tx_type: None,
            source: None,
            token_transfers: Vec::new(),
            native_transfers: Vec::new(),
            account_data: Vec::new(),
            instructions: Vec::new(),
        })
    }

    #[allow(dead_code)]
    fn native_mint(&self) -> &str {
        &self.native_mint
    }
}

pub struct DexscreenerIndexClient {
    http: reqwest::Client,
    base_url: String,
}

impl DexscreenerIndexClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl DexIndexClient for DexscreenerIndexClient {
    async fn get_pairs(&self, mints: &[String]) -> Result<HashMap<String, DexAggregate>, ScanError> {
        if mints.is_empty() {
            return Ok(HashMap::new());
        }
        let csv = mints.join(",");
        let url = format!("{}/tokens/{csv}", self.base_url);
        let resp = self.http.get(&url).send().await.map_err(|e| ScanError::UpstreamError(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ScanError::UpstreamError(format!("dex index status {}", resp.status())));
        }
        let body: serde_json::Value = resp.json().await.map_err(|e| ScanError::UpstreamError(e.to_string()))?;

        let mut out: HashMap<String, DexAggregate> = HashMap::new();
        let pairs = body.get("pairs").and_then(|p| p.as_array()).cloned().unwrap_or_default();
        for pair in pairs {
            let address = match pair.pointer("/baseToken/address").and_then(|v| v.as_str()) {
                Some(a) => a.to_string(),
                None => continue,
            };
            let liquidity = pair.pointer("/liquidity/usd").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let volume = pair.pointer("/volume/h24").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let price = pair.get("priceUsd").and_then(|v| v.as_str()).and_then(|s| s.parse().ok());
            let pair_created_at = pair.get("pairCreatedAt").and_then(|v| v.as_i64());

            let entry = out.entry(address).or_insert_with(|| DexAggregate { has_any_pair: true, ..Default::default() });
            entry.has_any_pair = true;
            entry.liquidity_usd += liquidity;
            entry.volume_24h_usd += volume;
            if entry.price_usd.is_none() {
                entry.price_usd = price;
            }
            if entry.pair_created_at.is_none() {
                entry.pair_created_at = pair_created_at;
            }
        }
        Ok(out)
    }
}

pub struct JupiterPriceOracleClient {
    http: reqwest::Client,
    base_url: String,
}

impl JupiterPriceOracleClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl PriceOracleClient for JupiterPriceOracleClient {
    async fn get_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>, ScanError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let csv = ids.join(",");
        let url = format!("{}/price/v2?ids={csv}", self.base_url);
        let resp = self.http.get(&url).send().await.map_err(|e| ScanError::UpstreamError(e.to_string()))?;
        let body: serde_json::Value = resp.json().await.map_err(|e| ScanError::UpstreamError(e.to_string()))?;

        let mut out = HashMap::new();
        if let Some(data) = body.get("data").and_then(|d| d.as_object()) {
            for (id, entry) in data {
                if let Some(price) = entry.get("price").and_then(|p| p.as_str()).and_then(|s| s.parse().ok()) {
                    out.insert(id.clone(), price);
                }
            }
        }
        Ok(out)
    }
}

pub struct RugCheckClient {
    http: reqwest::Client,
    base_url: String,
}

impl RugCheckClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl RugReportClient for RugCheckClient {
    async fn get_report(&self, mint: &str) -> Result<Option<RugReportSummary>, ScanError> {
        let url = format!("{}/tokens/{mint}/report/summary", self.base_url);
        let resp = self.http.get(&url).send().await.map_err(|e| ScanError::UpstreamError(e.to_string()))?;
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(ScanError::UpstreamError(format!("rug report status {}", resp.status())));
        }
        let body: serde_json::Value = resp.json().await.map_err(|e| ScanError::UpstreamError(e.to_string()))?;

        let mut lp_locked = body.pointer("/markets/0/lp/lpLocked").and_then(|v| v.as_bool());
        let mut lp_lock_pct = body.pointer("/markets/0/lp/lpLockedPct").and_then(|v| v.as_f64());

        if lp_locked.is_none() {
            if let Some(risks) = body.get("risks").and_then(|r| r.as_array()) {
                for risk in risks {
                    let name = risk.get("name").and_then(|v| v.as_str()).unwrap_or("").to_lowercase();
                    let level = risk.get("level").and_then(|v| v.as_str()).unwrap_or("");
                    if name.contains("lp") && name.contains("lock") && level == "good" {
                        lp_locked = Some(true);
                        lp_lock_pct = lp_lock_pct.or(Some(100.0));
                    }
                }
            }
        }

        Ok(Some(RugReportSummary { lp_locked, lp_lock_pct }))
    }
}
