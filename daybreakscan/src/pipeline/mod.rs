//! Scan pipeline (spec §5): deployer discovery, token enumeration, liveness,
//! death classification, funding/cluster analysis, and risk signals, joined
//! at the reputation stage.
//!
//! ```text
//! find_deployer
//!     -> tokens_of (+ funding_source, independent)
//!         -> bulk_liveness
//!             -> classify_dead_tokens   \
//!             -> gather_risk_signals     >-- join --> score_reputation
//!             -> analyze_cluster        /
//! ```
//! No cross-dependency between the three branches after liveness; they only
//! rejoin at reputation (spec §5 "Ordering guarantees").

pub mod death_classifier;
pub mod deployer_discovery;
pub mod funding_cluster;
pub mod liveness;
pub mod risk_signals;
pub mod token_enumeration;

use std::collections::HashMap;

use tracing::{info, instrument, warn};

use daybreakscan_core::model::{
    Cluster, DeathType, Deployer, Liveness, Mint, Reputation, RiskSignals, Scan, ScanConfidence, TokenStatus,
};
use daybreakscan_core::reputation::{score_reputation, ReputationInputs, RiskDeductionInputs};

use crate::clients::Clients;
use crate::cache::CacheRegistry;
use crate::error::ScanError;

/// Configuration the coordinator needs that isn't an upstream client or
/// cache (spec §9 Open Questions, resolved in SPEC_FULL.md §G).
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub death_classifier_cap: usize,
    pub burner_funding_window_secs: i64,
}

/// Runs every pipeline stage for a deployer already known (spec §5, the
/// coordinator task). `scanned_token` is the mint that triggered the scan, if
/// any (absent for a direct `scan_wallet`), and is folded into the returned
/// token list as a safety net even if enumeration missed it.
#[instrument(skip(clients, cache, settings), fields(deployer = %deployer.wallet))]
pub async fn run_scan(
    clients: &Clients,
    cache: &CacheRegistry,
    settings: &ScanSettings,
    deployer: Deployer,
    scanned_token: Option<&str>,
    now: i64,
) -> Result<Scan, ScanError> {
    let enumeration = token_enumeration::tokens_of(clients, deployer.wallet.as_str()).await?;
    info!(count = enumeration.mints.len(), limit_reached = enumeration.limit_reached, "enumerated deployer tokens");

    let mut all_mints = enumeration.mints.clone();
    if let Some(token) = scanned_token {
        if !all_mints.iter().any(|m| m == token) {
            all_mints.push(token.to_string());
        }
    }

    let funding = funding_cluster::funding_source(clients, deployer.wallet.as_str()).await.unwrap_or_else(|e| {
        warn!(error = %e, "funding source lookup failed, continuing without it");
        None
    });

    let liveness_map = liveness::bulk_liveness(clients, cache, &all_mints, now).await;

    let dead_mints: HashMap<String, TokenStatus> =
        liveness_map.iter().filter(|(_, s)| s.liveness == Liveness::Dead).map(|(k, v)| (k.clone(), v.clone())).collect();

    let death_classifications = death_classifier::classify_dead_tokens(
        clients,
        deployer.wallet.as_str(),
        funding.as_ref().map(|f| f.source_wallet.as_str()),
        &dead_mints,
        now,
        settings.death_classifier_cap,
    )
    .await;

    let cluster: Option<Cluster> = match &funding {
        Some(f) => match funding_cluster::analyze_cluster(clients, f.source_wallet.as_str(), &[deployer.wallet.to_string()]).await {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(error = %e, "cluster analysis failed, continuing without it");
                None
            }
        },
        None => None,
    };

    let target_mint = scanned_token.unwrap_or_else(|| deployer.wallet.as_str());
    let risks: RiskSignals = risk_signals::gather_risk_signals(
        clients,
        cache,
        target_mint,
        deployer.wallet.as_str(),
        Some(&deployer.creation_tx_id),
        now,
    )
    .await;

    // Spec §3: `Scan.tokens` carries every created token with a status, over
    // the tri-state `{alive, dead, unverified}`. `bulk_liveness` omits mints
    // with no DEX pair at all from its map rather than labelling them dead
    // (spec §4.5), so those omissions are folded back in here as explicit
    // `Unverified` entries instead of being dropped from the scan.
    let tokens: Vec<(Mint, TokenStatus)> = all_mints
        .iter()
        .filter_map(|m| {
            let status = liveness_map.get(m).cloned().unwrap_or_else(unverified_status);
            let address: daybreakscan_core::Address = m.parse().ok()?;
            Some((Mint::new(address), status))
        })
        .collect();

    let verified_count = tokens.iter().filter(|(_, s)| s.liveness != Liveness::Unverified).count() as u32;
    let unverified_count = tokens.iter().filter(|(_, s)| s.liveness == Liveness::Unverified).count() as u32;
    let dead_count = tokens.iter().filter(|(_, s)| s.liveness == Liveness::Dead).count() as u32;

    let death_rate = if verified_count > 0 { dead_count as f64 / verified_count as f64 } else { 0.0 };
    let rug_count = death_classifications.values().filter(|c| matches!(c.death_type, DeathType::LikelyRug | DeathType::DistributedRug)).count();
    let rug_rate = if !death_classifications.is_empty() { rug_count as f64 / death_classifications.len() as f64 } else { 0.0 };

    let avg_lifespan_days = average_lifespan_days(&tokens, now);
    let cluster_size = cluster.as_ref().map(|c| c.funded_wallets.len() as u32).unwrap_or(0);

    let deploy_velocity_per_day = deploy_velocity(enumeration.first_creation_at, enumeration.last_creation_at, all_mints.len());
    let is_burner = is_burner_wallet(funding.as_ref().map(|f| f.timestamp), enumeration.first_creation_at, settings.burner_funding_window_secs);

    let risk_inputs = RiskDeductionInputs {
        mint_authority_active: risks.mint_authority.is_some(),
        freeze_authority_active: risks.freeze_authority.is_some(),
        top_holder_pct: risks.top_holder_pct,
        bundle_detected: risks.bundle_detected.unwrap_or(false),
        deployer_holdings_pct: risks.deployer_holdings_pct,
        deploy_velocity_per_day: Some(deploy_velocity_per_day),
        is_burner,
        burner_penalty: 0.0,
    };

    let reputation: Reputation = score_reputation(&ReputationInputs {
        death_rate,
        rug_rate,
        token_count: all_mints.len() as u32,
        verified_count,
        avg_lifespan_days,
        cluster_size,
        risk: risk_inputs,
    });

    let confidence = ScanConfidence {
        verified_count,
        unverified_count,
        cluster_checked: cluster.is_some(),
        method: deployer.method,
    };

    Ok(Scan {
        token: scanned_token.and_then(|t| t.parse().ok()).unwrap_or_else(|| deployer.wallet.clone()),
        deployer,
        tokens,
        risks,
        funding,
        cluster,
        reputation,
        confidence,
        scanned_at: now,
        evidence_urls: Vec::new(),
    })
}

/// Placeholder status for a mint `bulk_liveness` had no DEX pair for at all
/// (spec §4.5 "absence of any pair is never alive"). Kept in `Scan.tokens` as
/// an explicit `Unverified` entry rather than dropped, per spec §3.
fn unverified_status() -> TokenStatus {
    TokenStatus {
        liveness: Liveness::Unverified,
        liquidity_usd: 0.0,
        volume_24h_usd: 0.0,
        price_usd: None,
        socials: Vec::new(),
        pair_created_at: None,
    }
}

fn average_lifespan_days(tokens: &[(Mint, TokenStatus)], now: i64) -> f64 {
    let ages: Vec<f64> = tokens
        .iter()
        .filter_map(|(_, status)| status.pair_created_at)
        .map(|created_at| ((now - created_at) as f64 / 86_400.0).max(0.0))
        .collect();
    if ages.is_empty() {
        return 0.0;
    }
    ages.iter().sum::<f64>() / ages.len() as f64
}

/// `token_count / max(1, deployer_lifetime_days)` (SPEC_FULL.md §G decision).
fn deploy_velocity(first_creation_at: Option<i64>, last_creation_at: Option<i64>, token_count: usize) -> f64 {
    let lifetime_days = match (first_creation_at, last_creation_at) {
        (Some(first), Some(last)) => ((last - first) as f64 / 86_400.0).max(1.0),
        _ => 1.0,
    };
    token_count as f64 / lifetime_days
}

/// A deployer wallet is a burner iff its funding arrived within
/// `window_secs` of its first observed deploy (SPEC_FULL.md §G decision).
fn is_burner_wallet(funding_ts: Option<i64>, first_deploy_ts: Option<i64>, window_secs: i64) -> bool {
    match (funding_ts, first_deploy_ts) {
        (Some(f), Some(d)) => (d - f).abs() <= window_secs,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cache::CacheRegistry;
    use crate::clients::fakes::{FakeChainRpc, FakeDexIndex, FakeEnhancedHistory, FakePriceOracle, FakeRugReport};
    use crate::clients::types::{DexAggregate, EnhancedTx, TokenTransfer};
    use daybreakscan_core::model::DetectionMethod;

    #[tokio::test]
    async fn tokens_tri_state_partitions_every_created_mint() {
        let deployer_wallet = "H8sMJSCQxfKiFTCfDR3DUMLPwcRbM61LGFJ61tW1MFa6".to_string();
        let alive_mint = "MintAliveAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA1".to_string();
        let dead_mint = "MintDeadAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA2".to_string();
        let unverified_mint = "MintUnverifiedAAAAAAAAAAAAAAAAAAAAAAAAAA3".to_string();

        let creation_tx = |sig: &str, mint: &str| EnhancedTx {
            signature: sig.to_string(),
            fee_payer: Some(deployer_wallet.clone()),
            timestamp: Some(100),
            tx_type: Some("CREATE".to_string()),
            source: Some("PUMP_FUN".to_string()),
            token_transfers: vec![TokenTransfer { mint: Some(mint.to_string()), ..Default::default() }],
            ..Default::default()
        };

        let mut enhanced = FakeEnhancedHistory::default();
        enhanced.by_address.insert(
            deployer_wallet.clone(),
            vec![
                creation_tx("sig-alive", &alive_mint),
                creation_tx("sig-dead", &dead_mint),
                creation_tx("sig-unverified", &unverified_mint),
            ],
        );

        let dex = FakeDexIndex::default();
        dex.pairs.lock().unwrap().insert(
            alive_mint.clone(),
            DexAggregate { liquidity_usd: 1000.0, volume_24h_usd: 50.0, has_any_pair: true, ..Default::default() },
        );
        dex.pairs.lock().unwrap().insert(
            dead_mint.clone(),
            DexAggregate { liquidity_usd: 1.0, volume_24h_usd: 0.0, has_any_pair: true, ..Default::default() },
        );
        // unverified_mint deliberately has no dex fixture at all.

        let clients = Clients {
            enhanced_history: Arc::new(enhanced),
            chain_rpc: Arc::new(FakeChainRpc::default()),
            dex_index: Arc::new(dex),
            price_oracle: Arc::new(FakePriceOracle::default()),
            rug_report: Arc::new(FakeRugReport::default()),
        };
        let cache = CacheRegistry::new();
        let settings = ScanSettings { death_classifier_cap: 10, burner_funding_window_secs: 600 };
        let deployer = Deployer {
            wallet: deployer_wallet.parse().unwrap(),
            creation_tx_id: "sig-alive".to_string(),
            method: DetectionMethod::Enhanced,
            first_seen: 100,
            last_seen: 100,
        };

        let scan = run_scan(&clients, &cache, &settings, deployer, None, 1_000).await.unwrap();

        assert_eq!(scan.tokens.len(), 3);
        let alive = scan.tokens.iter().filter(|(_, s)| s.liveness == Liveness::Alive).count() as u32;
        let dead = scan.tokens.iter().filter(|(_, s)| s.liveness == Liveness::Dead).count() as u32;
        let unverified = scan.tokens.iter().filter(|(_, s)| s.liveness == Liveness::Unverified).count() as u32;
        assert_eq!(alive + dead + unverified, scan.tokens.len() as u32);
        assert_eq!(alive, 1);
        assert_eq!(dead, 1);
        assert_eq!(unverified, 1);
        assert_eq!(scan.confidence.verified_count, alive + dead);
        assert_eq!(scan.confidence.unverified_count, unverified);
        assert_eq!(scan.confidence.verified_count + scan.confidence.unverified_count, scan.tokens.len() as u32);
    }

    #[test]
    fn deploy_velocity_floors_lifetime_at_one_day() {
        let v = deploy_velocity(Some(0), Some(3600), 5);
        assert_eq!(v, 5.0);
    }

    #[test]
    fn deploy_velocity_unknown_timestamps_assumes_one_day() {
        let v = deploy_velocity(None, None, 3);
        assert_eq!(v, 3.0);
    }

    #[test]
    fn burner_detection_requires_both_timestamps() {
        assert!(!is_burner_wallet(None, Some(100), 600));
        assert!(!is_burner_wallet(Some(100), None, 600));
        assert!(is_burner_wallet(Some(100), Some(200), 600));
        assert!(!is_burner_wallet(Some(0), Some(10_000), 600));
    }
}
