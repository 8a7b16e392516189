//! Bayesian reputation scoring (spec §4.9).

use crate::model::{Reputation, ReputationBreakdown, Verdict};

/// Pseudo-count and prior for the Bayesian shrinkage of the observed death rate.
pub const PRIOR_PSEUDO_COUNT: f64 = 5.0;
pub const PRIOR_DEATH_RATE: f64 = 0.5;

/// Default magnitude of the burner-wallet penalty (spec §9 Open Question,
/// decided in SPEC_FULL.md §G). Configurable by callers that want a different
/// heuristic strength.
pub const DEFAULT_BURNER_PENALTY: f64 = 8.0;

/// `bayes_rate = (death_rate * verified_count + prior_rate * pseudo_count) / (verified_count + pseudo_count)`
pub fn bayes_rate(death_rate: f64, verified_count: u32) -> f64 {
    let n = verified_count as f64;
    (death_rate * n + PRIOR_DEATH_RATE * PRIOR_PSEUDO_COUNT) / (n + PRIOR_PSEUDO_COUNT)
}

/// Risk-signal inputs that translate into point deductions (spec §4.9 table).
#[derive(Debug, Clone, Default)]
pub struct RiskDeductionInputs {
    pub mint_authority_active: bool,
    pub freeze_authority_active: bool,
    pub top_holder_pct: Option<f64>,
    pub bundle_detected: bool,
    pub deployer_holdings_pct: Option<f64>,
    pub deploy_velocity_per_day: Option<f64>,
    /// Whether the deployer's funding wallet was flagged as a short-lived
    /// throwaway (spec §9 Open Question; see `is_burner` in the service).
    pub is_burner: bool,
    /// Magnitude applied when `is_burner` is true. Defaults to
    /// [`DEFAULT_BURNER_PENALTY`] but is configurable per SPEC_FULL.md §G.
    pub burner_penalty: f64,
}

impl RiskDeductionInputs {
    /// Total deduction (a non-positive number) and the narrative lines for
    /// each signal that fired.
    pub fn apply(&self) -> (f64, Vec<String>) {
        let mut total = 0.0;
        let mut narrative = Vec::new();

        if self.mint_authority_active {
            total -= 10.0;
            narrative.push("mint authority active: -10".to_string());
        }
        if self.freeze_authority_active {
            total -= 5.0;
            narrative.push("freeze authority active: -5".to_string());
        }
        if let Some(pts) = bracket(self.top_holder_pct, &[(80.0, 5.0), (60.0, 3.0), (40.0, 2.0)]) {
            total -= pts;
            narrative.push(format!(
                "top holder {:.1}%: -{:.0}",
                self.top_holder_pct.unwrap_or(0.0),
                pts
            ));
        }
        if self.bundle_detected {
            total -= 5.0;
            narrative.push("bundled launch detected: -5".to_string());
        }
        if let Some(pts) = bracket(self.deployer_holdings_pct, &[(50.0, 10.0), (30.0, 5.0), (10.0, 3.0)]) {
            total -= pts;
            narrative.push(format!(
                "deployer holds {:.1}%: -{:.0}",
                self.deployer_holdings_pct.unwrap_or(0.0),
                pts
            ));
        }
        if let Some(pts) = bracket(self.deploy_velocity_per_day, &[(5.0, 10.0), (2.0, 5.0), (1.0, 3.0)]) {
            total -= pts;
            narrative.push(format!(
                "deploy velocity {:.1}/day: -{:.0}",
                self.deploy_velocity_per_day.unwrap_or(0.0),
                pts
            ));
        }
        if self.is_burner {
            let penalty = if self.burner_penalty > 0.0 {
                self.burner_penalty
            } else {
                DEFAULT_BURNER_PENALTY
            };
            total -= penalty;
            narrative.push(format!("deployer funding wallet looks like a burner: -{:.0}", penalty));
        }

        (total, narrative)
    }
}

/// `value` falls into the highest threshold it clears. `thresholds` must be
/// sorted descending by cutoff. Returns `None` if `value` is `None` or clears
/// no threshold.
fn bracket(value: Option<f64>, thresholds: &[(f64, f64)]) -> Option<f64> {
    let v = value?;
    thresholds.iter().find(|(cutoff, _)| v > *cutoff).map(|(_, pts)| *pts)
}

#[derive(Debug, Clone)]
pub struct ReputationInputs {
    pub death_rate: f64,
    pub rug_rate: f64,
    pub token_count: u32,
    pub verified_count: u32,
    pub avg_lifespan_days: f64,
    pub cluster_size: u32,
    pub risk: RiskDeductionInputs,
}

fn token_count_component(token_count: u32, rug_rate: f64) -> f64 {
    let base = (20.0 * (1.0 - (token_count.max(1) as f64).log10() / 3.0)).max(0.0);
    let lost = 20.0 - base;
    let scale = (rug_rate / 0.5).min(1.0);
    20.0 - lost * scale
}

fn lifespan_component(avg_lifespan_days: f64) -> f64 {
    (avg_lifespan_days * 0.5).min(20.0)
}

fn cluster_component(cluster_size: u32) -> f64 {
    (20.0 - (cluster_size as f64 * 2.0).min(20.0)).max(0.0)
}

/// Score a deployer per spec §4.9. `score = clamp(round(sum(components) + deductions), 0, 100)`.
pub fn score_reputation(inputs: &ReputationInputs) -> Reputation {
    let bayes = bayes_rate(inputs.death_rate, inputs.verified_count);
    let death_component = (1.0 - bayes) * 40.0;
    let token_component = token_count_component(inputs.token_count, inputs.rug_rate);
    let life_component = lifespan_component(inputs.avg_lifespan_days);
    let cluster_component = cluster_component(inputs.cluster_size);
    let (deductions, narrative) = inputs.risk.apply();

    let raw = death_component + token_component + life_component + cluster_component + deductions;
    let mut score = raw.round().clamp(0.0, 100.0) as u8;

    let low_confidence = inputs.verified_count < 3;
    if low_confidence {
        score = score.min(59);
    }

    let verdict = if low_confidence {
        Verdict::Suspicious
    } else if bayes > 0.8 && inputs.token_count >= 3 {
        Verdict::SerialRugger
    } else if score < 30 {
        Verdict::SerialRugger
    } else if score < 60 {
        Verdict::Suspicious
    } else {
        Verdict::Clean
    };

    Reputation {
        score,
        verdict,
        breakdown: ReputationBreakdown {
            death_component,
            token_count_component: token_component,
            lifespan_component: life_component,
            cluster_component,
            risk_deductions: deductions,
            narrative,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk_none() -> RiskDeductionInputs {
        RiskDeductionInputs::default()
    }

    #[test]
    fn score_is_always_in_range() {
        for tc in 0..300u32 {
            for vc in 0..300u32 {
                let inputs = ReputationInputs {
                    death_rate: 0.5,
                    rug_rate: 0.5,
                    token_count: tc,
                    verified_count: vc,
                    avg_lifespan_days: 10.0,
                    cluster_size: 3,
                    risk: risk_none(),
                };
                let rep = score_reputation(&inputs);
                assert!(rep.score <= 100);
            }
        }
    }

    #[test]
    fn scenario_single_token_clean_deployer() {
        // spec §8 scenario 2
        let inputs = ReputationInputs {
            death_rate: 0.0,
            rug_rate: 0.0,
            token_count: 1,
            verified_count: 3,
            avg_lifespan_days: 40.0,
            cluster_size: 0,
            risk: risk_none(),
        };
        let rep = score_reputation(&inputs);
        assert_eq!(rep.score, 88);
        assert_eq!(rep.verdict, Verdict::Clean);
    }

    #[test]
    fn scenario_low_confidence_clean() {
        // spec §8 scenario 3
        let inputs = ReputationInputs {
            death_rate: 0.0,
            rug_rate: 0.0,
            token_count: 1,
            verified_count: 1,
            avg_lifespan_days: 40.0,
            cluster_size: 0,
            risk: risk_none(),
        };
        let rep = score_reputation(&inputs);
        assert_eq!(rep.score, 59);
        assert_eq!(rep.verdict, Verdict::Suspicious);
    }

    #[test]
    fn scenario_serial_rugger() {
        // spec §8 scenario 4
        let inputs = ReputationInputs {
            death_rate: 0.809,
            rug_rate: 0.809,
            token_count: 194,
            verified_count: 194,
            avg_lifespan_days: 2.0,
            cluster_size: 0,
            risk: risk_none(),
        };
        let rep = score_reputation(&inputs);
        assert_eq!(rep.verdict, Verdict::SerialRugger);
    }

    #[test]
    fn low_confidence_never_clean() {
        for vc in 0..3u32 {
            let inputs = ReputationInputs {
                death_rate: 0.0,
                rug_rate: 0.0,
                token_count: 50,
                verified_count: vc,
                avg_lifespan_days: 100.0,
                cluster_size: 0,
                risk: risk_none(),
            };
            let rep = score_reputation(&inputs);
            assert_ne!(rep.verdict, Verdict::Clean);
        }
    }

    #[test]
    fn breakdown_components_sum_to_raw_before_clamp() {
        let inputs = ReputationInputs {
            death_rate: 0.2,
            rug_rate: 0.1,
            token_count: 12,
            verified_count: 12,
            avg_lifespan_days: 5.0,
            cluster_size: 4,
            risk: RiskDeductionInputs {
                mint_authority_active: true,
                ..Default::default()
            },
        };
        let rep = score_reputation(&inputs);
        let sum = rep.breakdown.death_component
            + rep.breakdown.token_count_component
            + rep.breakdown.lifespan_component
            + rep.breakdown.cluster_component
            + rep.breakdown.risk_deductions;
        let expected = sum.round().clamp(0.0, 100.0) as u8;
        assert_eq!(rep.score, expected);
        assert!(rep.breakdown.risk_deductions <= 0.0);
    }
}
