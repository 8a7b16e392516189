//! Multi-provider JSON-RPC dispatcher (spec §4.1). Segregates *enhanced*
//! calls, pinned to a single provider that owns data no fallback chain can
//! substitute for, from *basic* calls tried across a configured chain.

use std::time::Duration;

use serde_json::json;
use tracing::{instrument, warn};

use super::types::{JsonRpcResponse, RouterError, RpcCall, SortOrder};

pub struct RpcRouter {
    http: reqwest::Client,
    basic_provider_urls: Vec<String>,
    enhanced_provider_key: Option<String>,
    per_attempt_timeout: Duration,
}

impl RpcRouter {
    pub fn new(basic_provider_urls: Vec<String>, enhanced_provider_key: Option<String>, per_attempt_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(per_attempt_timeout)
            .build()
            .expect("reqwest client builds with static config");
        Self {
            http,
            basic_provider_urls,
            enhanced_provider_key,
            per_attempt_timeout,
        }
    }

    /// Iterate the configured basic providers in order; on network error or a
    /// JSON-RPC `error` field, try the next. Only surfaces an error once every
    /// provider has failed.
    #[instrument(skip(self, params), fields(method = %method))]
    pub async fn basic_rpc(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, RouterError> {
        if self.basic_provider_urls.is_empty() {
            return Err(RouterError::NoProvidersConfigured);
        }

        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });
        let mut last_err = RouterError::NoProvidersConfigured;

        for url in &self.basic_provider_urls {
            match self.post_one(url, &body).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(provider = %url, error = %e, "basic RPC provider failed, trying next");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    /// Pinned to the enhanced-history provider. No fallback: it owns data no
    /// other provider exposes.
    pub async fn enhanced_rpc(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, RouterError> {
        let url = self.enhanced_url()?;
        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });
        self.post_one(&url, &body).await
    }

    /// `GET /addresses/{addr}/transactions` against the enhanced provider. Up
    /// to 3 attempts; on HTTP 429 wait `(attempt+1)s` and retry. Non-array
    /// responses come back as an empty list rather than an error.
    pub async fn enhanced_txs(
        &self,
        address: &str,
        limit: u32,
        sort: SortOrder,
        before: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, RouterError> {
        let key = self.enhanced_provider_key.as_deref().ok_or(RouterError::NoProvidersConfigured)?;
        let mut url = format!(
            "https://api.helius.xyz/v0/addresses/{address}/transactions?api-key={key}&limit={limit}&sort-order={}",
            sort.as_str()
        );
        if let Some(before) = before {
            url.push_str(&format!("&before={before}"));
        }

        for attempt in 0..3u32 {
            let resp = self.http.get(&url).send().await;
            match resp {
                Ok(r) if r.status().as_u16() == 429 => {
                    tokio::time::sleep(Duration::from_secs((attempt + 1) as u64)).await;
                    continue;
                }
                Ok(r) if r.status().is_success() => {
                    let body: serde_json::Value = r.json().await.map_err(|e| RouterError::UpstreamError(e.to_string()))?;
                    return Ok(body.as_array().cloned().unwrap_or_default());
                }
                Ok(r) => {
                    return Err(RouterError::UpstreamError(format!("status {}", r.status())));
                }
                Err(e) if e.is_timeout() => return Err(RouterError::UpstreamTimeout),
                Err(e) => return Err(RouterError::UpstreamError(e.to_string())),
            }
        }
        Err(RouterError::UpstreamRateLimited)
    }

    /// Single multi-element JSON-RPC body against the basic provider chain.
    /// Any per-item error aborts the whole batch.
    pub async fn batch(&self, calls: Vec<RpcCall>) -> Result<Vec<serde_json::Value>, RouterError> {
        if self.basic_provider_urls.is_empty() {
            return Err(RouterError::NoProvidersConfigured);
        }
        let body: Vec<serde_json::Value> = calls
            .iter()
            .enumerate()
            .map(|(id, call)| json!({ "jsonrpc": "2.0", "id": id, "method": call.method, "params": call.params }))
            .collect();

        let mut last_err = RouterError::NoProvidersConfigured;
        for url in &self.basic_provider_urls {
            match self.post_batch(url, &body, calls.len()).await {
                Ok(values) => return Ok(values),
                Err(e) => {
                    warn!(provider = %url, error = %e, "basic RPC batch failed, trying next");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    fn enhanced_url(&self) -> Result<String, RouterError> {
        let key = self.enhanced_provider_key.as_deref().ok_or(RouterError::NoProvidersConfigured)?;
        Ok(format!("https://mainnet.helius-rpc.com/?api-key={key}"))
    }

    async fn post_one(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value, RouterError> {
        let resp = self
            .http
            .post(url)
            .json(body)
            .timeout(self.per_attempt_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RouterError::UpstreamTimeout
                } else {
                    RouterError::UpstreamError(e.to_string())
                }
            })?;

        if resp.status().as_u16() == 429 {
            return Err(RouterError::UpstreamRateLimited);
        }
        if !resp.status().is_success() {
            return Err(RouterError::UpstreamError(format!("status {}", resp.status())));
        }

        let parsed: JsonRpcResponse = resp.json().await.map_err(|e| RouterError::UpstreamError(e.to_string()))?;
        if let Some(err) = parsed.error {
            return Err(RouterError::UpstreamError(err.message));
        }
        parsed.result.ok_or_else(|| RouterError::UpstreamError("missing result".to_string()))
    }

    /// Batch responses aren't guaranteed to come back in request order, so
    /// each one is matched to its call by the `id` the request assigned it
    /// (0-indexed by position in `calls`) rather than trusted by position.
    async fn post_batch(&self, url: &str, body: &[serde_json::Value], expected: usize) -> Result<Vec<serde_json::Value>, RouterError> {
        let resp = self
            .http
            .post(url)
            .json(body)
            .timeout(self.per_attempt_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RouterError::UpstreamTimeout
                } else {
                    RouterError::UpstreamError(e.to_string())
                }
            })?;

        if resp.status().as_u16() == 429 {
            return Err(RouterError::UpstreamRateLimited);
        }
        if !resp.status().is_success() {
            return Err(RouterError::UpstreamError(format!("status {}", resp.status())));
        }

        let parsed: Vec<JsonRpcResponse> = resp.json().await.map_err(|e| RouterError::UpstreamError(e.to_string()))?;
        let mut by_id: std::collections::HashMap<u64, JsonRpcResponse> = parsed.into_iter().map(|item| (item.id, item)).collect();

        let mut results = Vec::with_capacity(expected);
        for id in 0..expected as u64 {
            let item = by_id.remove(&id).ok_or_else(|| RouterError::UpstreamError(format!("batch response missing id {id}")))?;
            if let Some(err) = item.error {
                return Err(RouterError::UpstreamError(err.message));
            }
            results.push(item.result.ok_or_else(|| RouterError::UpstreamError("missing result".to_string()))?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_providers_configured_short_circuits() {
        let router = RpcRouter::new(vec![], None, Duration::from_secs(1));
        assert!(matches!(
            futures::executor::block_on(router.basic_rpc("getHealth", json!([]))),
            Err(RouterError::NoProvidersConfigured)
        ));
    }
}
