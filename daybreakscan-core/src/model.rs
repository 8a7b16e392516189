//! Entities from spec §3, as plain data. No field here is fetched or computed by
//! this crate — that's the service's job. This module only carries the shapes
//! and the invariants that are checkable without I/O.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// How a deployer was identified (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMethod {
    Enhanced,
    RpcFallback,
}

/// A distinct token mint. Immutable once observed; metadata is fetched on demand
/// and cached by the service, never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mint {
    pub address: Address,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

impl Mint {
    pub fn new(address: Address) -> Self {
        Self { address, name: None, symbol: None }
    }
}

/// The wallet that paid fees on a mint's `initializeMint2` transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployer {
    pub wallet: Address,
    pub creation_tx_id: String,
    pub method: DetectionMethod,
    pub first_seen: i64,
    pub last_seen: i64,
}

/// Liveness label for a token (spec §3 `TokenStatus`, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Alive,
    Dead,
    Unverified,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLink {
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenStatus {
    pub liveness: Liveness,
    pub liquidity_usd: f64,
    pub volume_24h_usd: f64,
    pub price_usd: Option<f64>,
    pub socials: Vec<SocialLink>,
    pub pair_created_at: Option<i64>,
}

/// The liveness rule from spec §3/§4.5: invariant tested in `classify`.
///
/// `alive = (liquidity_usd >= 100) OR (volume_24h_usd > 0)`. Absence of any DEX
/// pair is handled upstream (the caller simply omits the mint rather than
/// calling this with zeroed fields) — this function never returns `unverified`.
pub fn is_alive(liquidity_usd: f64, volume_24h_usd: f64) -> bool {
    liquidity_usd >= 100.0 || volume_24h_usd > 0.0
}

/// Outcome of death classification (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathType {
    Natural,
    LikelyRug,
    DistributedRug,
    Unverified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathEvidence {
    /// `None` iff holdings could not be determined (e.g. the deployer's token
    /// accounts could not be fetched) — distinct from a determined `0.0`.
    pub deployer_holdings_pct: Option<f64>,
    pub deployer_sold: bool,
    pub peak_liquidity_usd: f64,
    pub lifespan_hours: f64,
    pub had_real_buyers: bool,
    pub initial_transfer_to: Option<Address>,
    pub initial_transfer_is_dex: bool,
    pub initial_transfer_is_associated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathClassification {
    pub death_type: DeathType,
    pub evidence: DeathEvidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Funding {
    pub source_wallet: Address,
    pub timestamp: i64,
    pub from_cex: bool,
    pub cex_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub funded_wallets: Vec<Address>,
    pub deployer_count: u32,
    pub from_cex: bool,
    pub cex_name: Option<String>,
}

/// Each field is independently nullable; `null` means "not determinable", never
/// "zero" or "false" (spec §9 Optionality).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSignals {
    pub mint_authority: Option<Address>,
    pub freeze_authority: Option<Address>,
    pub deployer_holdings_pct: Option<f64>,
    pub top_holder_pct: Option<f64>,
    pub top5_pct: Option<f64>,
    pub bundle_detected: Option<bool>,
    pub lp_locked: Option<bool>,
    pub lp_lock_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Clean,
    Suspicious,
    SerialRugger,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReputationBreakdown {
    pub death_component: f64,
    pub token_count_component: f64,
    pub lifespan_component: f64,
    pub cluster_component: f64,
    /// Sum of all risk deductions, always <= 0.
    pub risk_deductions: f64,
    pub narrative: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    pub score: u8,
    pub verdict: Verdict,
    pub breakdown: ReputationBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfidence {
    pub verified_count: u32,
    pub unverified_count: u32,
    pub cluster_checked: bool,
    pub method: DetectionMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub token: Address,
    pub deployer: Deployer,
    pub tokens: Vec<(Mint, TokenStatus)>,
    pub risks: RiskSignals,
    pub funding: Option<Funding>,
    pub cluster: Option<Cluster>,
    pub reputation: Reputation,
    pub confidence: ScanConfidence,
    pub scanned_at: i64,
    pub evidence_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identity {
    Wallet(Address),
    Ip(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentScheme {
    OnChain,
    SignedClaim,
}
