//! Liveness and death classification rules (spec §4.5, §4.6). Pure functions
//! over already-gathered evidence — no fetching happens here.

use crate::model::{is_alive, DeathEvidence, DeathType, Liveness};

/// Label a token given its aggregated DEX liquidity/volume. Callers that found
/// no DEX pair at all must not call this — they report `Liveness::Unverified`
/// directly (spec: absence of any pair is never `alive`, and is excluded from
/// the liveness map entirely rather than being labelled `dead`).
pub fn classify_liveness(liquidity_usd: f64, volume_24h_usd: f64) -> Liveness {
    if is_alive(liquidity_usd, volume_24h_usd) {
        Liveness::Alive
    } else {
        Liveness::Dead
    }
}

/// Ordered death-classification rules from spec §4.6. First match wins.
pub fn classify_death(evidence: &DeathEvidence) -> DeathType {
    let holdings_known_positive = match evidence.deployer_holdings_pct {
        None => true,
        Some(pct) => pct > 0.0,
    };

    if evidence.initial_transfer_is_associated && evidence.deployer_sold {
        return DeathType::DistributedRug;
    }
    if evidence.deployer_sold && evidence.lifespan_hours < 48.0 {
        return DeathType::LikelyRug;
    }
    if evidence.had_real_buyers && evidence.deployer_sold {
        return DeathType::LikelyRug;
    }
    if !evidence.had_real_buyers && holdings_known_positive {
        return DeathType::Natural;
    }
    DeathType::Unverified
}

/// `deployer_sold` per spec §4.6: holdings below 0.01% counts as sold, treating
/// unknown holdings as "not sold" (we can't claim a sale we can't observe).
pub fn deployer_sold(deployer_holdings_pct: Option<f64>) -> bool {
    matches!(deployer_holdings_pct, Some(pct) if pct < 0.01)
}

/// `lifespan_hours` per spec §3: capped at 168 (one week), floored at the
/// token's observed age.
pub fn lifespan_hours(hours_since_creation: f64) -> f64 {
    hours_since_creation.max(0.0).min(168.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Liveness;

    #[test]
    fn liveness_rule_matches_spec() {
        assert_eq!(classify_liveness(100.0, 0.0), Liveness::Alive);
        assert_eq!(classify_liveness(99.99, 0.0), Liveness::Dead);
        assert_eq!(classify_liveness(0.0, 0.01), Liveness::Alive);
        assert_eq!(classify_liveness(0.0, 0.0), Liveness::Dead);
    }

    #[test]
    fn dust_liquidity_old_pair_not_alive() {
        // scenario 5 from spec §8
        assert_eq!(classify_liveness(50.0, 0.0), Liveness::Dead);
    }

    #[test]
    fn dust_liquidity_new_pair_still_not_alive() {
        // scenario 6 from spec §8: age alone doesn't rescue liveness.
        assert_eq!(classify_liveness(50.0, 0.0), Liveness::Dead);
    }

    fn base_evidence() -> DeathEvidence {
        DeathEvidence {
            deployer_holdings_pct: Some(50.0),
            deployer_sold: false,
            peak_liquidity_usd: 0.0,
            lifespan_hours: 10.0,
            had_real_buyers: false,
            initial_transfer_to: None,
            initial_transfer_is_dex: false,
            initial_transfer_is_associated: false,
        }
    }

    #[test]
    fn distributed_rug_takes_precedence() {
        let mut e = base_evidence();
        e.initial_transfer_is_associated = true;
        e.deployer_sold = true;
        e.had_real_buyers = true;
        e.lifespan_hours = 200.0;
        assert_eq!(classify_death(&e), DeathType::DistributedRug);
    }

    #[test]
    fn quick_dump_is_likely_rug() {
        let mut e = base_evidence();
        e.deployer_sold = true;
        e.lifespan_hours = 10.0;
        assert_eq!(classify_death(&e), DeathType::LikelyRug);
    }

    #[test]
    fn real_buyers_plus_sold_is_likely_rug() {
        let mut e = base_evidence();
        e.deployer_sold = true;
        e.had_real_buyers = true;
        e.lifespan_hours = 200.0;
        assert_eq!(classify_death(&e), DeathType::LikelyRug);
    }

    #[test]
    fn no_real_buyers_positive_holdings_is_natural() {
        let e = base_evidence();
        assert_eq!(classify_death(&e), DeathType::Natural);
    }

    #[test]
    fn unknown_holdings_no_buyers_is_natural() {
        let mut e = base_evidence();
        e.deployer_holdings_pct = None;
        assert_eq!(classify_death(&e), DeathType::Natural);
    }

    #[test]
    fn falls_through_to_unverified() {
        let mut e = base_evidence();
        e.had_real_buyers = true;
        e.deployer_sold = false;
        assert_eq!(classify_death(&e), DeathType::Unverified);
    }
}
