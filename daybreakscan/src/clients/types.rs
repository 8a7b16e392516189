//! Shapes the upstream clients parse into (spec §6 "the only shape the core
//! relies on"). These are intentionally partial views of much richer upstream
//! payloads — only the fields the pipeline reads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenTransfer {
    pub mint: Option<String>,
    #[serde(rename = "fromUserAccount")]
    pub from_user_account: Option<String>,
    #[serde(rename = "toUserAccount")]
    pub to_user_account: Option<String>,
    #[serde(rename = "tokenAmount")]
    pub token_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NativeTransfer {
    #[serde(rename = "fromUserAccount")]
    pub from_user_account: Option<String>,
    #[serde(rename = "toUserAccount")]
    pub to_user_account: Option<String>,
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenBalanceChange {
    pub mint: Option<String>,
    #[serde(rename = "userAccount")]
    pub user_account: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountData {
    #[serde(rename = "tokenBalanceChanges")]
    pub token_balance_changes: Vec<TokenBalanceChange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InnerInstruction {
    #[serde(rename = "programId")]
    pub program_id: Option<String>,
    pub parsed: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Instruction {
    #[serde(rename = "programId")]
    pub program_id: Option<String>,
    #[serde(rename = "innerInstructions", default)]
    pub inner_instructions: Vec<InnerInstruction>,
    pub parsed: Option<serde_json::Value>,
}

/// One entry from the enhanced-history endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnhancedTx {
    pub signature: String,
    #[serde(rename = "feePayer")]
    pub fee_payer: Option<String>,
    pub timestamp: Option<i64>,
    pub slot: Option<u64>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub source: Option<String>,
    #[serde(rename = "tokenTransfers", default)]
    pub token_transfers: Vec<TokenTransfer>,
    #[serde(rename = "nativeTransfers", default)]
    pub native_transfers: Vec<NativeTransfer>,
    #[serde(rename = "accountData", default)]
    pub account_data: Vec<AccountData>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

impl EnhancedTx {
    /// Walks every instruction (outer and inner) looking for a parsed
    /// `initializeMint2` whose `mint` argument matches. Spec §4.3/§4.4 both
    /// test this condition.
    pub fn has_initialize_mint2_for(&self, mint: &str) -> bool {
        let matches_init = |parsed: &serde_json::Value| -> bool {
            parsed.get("type").and_then(|t| t.as_str()) == Some("initializeMint2")
                && parsed
                    .get("info")
                    .and_then(|i| i.get("mint"))
                    .and_then(|m| m.as_str())
                    == Some(mint)
        };
        for ix in &self.instructions {
            if let Some(p) = &ix.parsed {
                if matches_init(p) {
                    return true;
                }
            }
            for inner in &ix.inner_instructions {
                if let Some(p) = &inner.parsed {
                    if matches_init(p) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Like [`has_initialize_mint2_for`] but without pinning to a particular
    /// mint — used where the caller is discovering mints rather than
    /// confirming one it already knows (spec §4.4 step 2).
    pub fn has_initialize_mint2_for_any(&self) -> bool {
        let is_init = |parsed: &serde_json::Value| parsed.get("type").and_then(|t| t.as_str()) == Some("initializeMint2");
        self.instructions.iter().any(|ix| {
            ix.parsed.as_ref().map(is_init).unwrap_or(false) || ix.inner_instructions.iter().any(|inner| inner.parsed.as_ref().map(is_init).unwrap_or(false))
        })
    }

    pub fn touches_program(&self, program_id: &str) -> bool {
        self.instructions.iter().any(|ix| ix.program_id.as_deref() == Some(program_id))
            || self
                .instructions
                .iter()
                .flat_map(|ix| ix.inner_instructions.iter())
                .any(|inner| inner.program_id.as_deref() == Some(program_id))
    }

    pub fn is_pump_fun_creation(&self) -> bool {
        self.tx_type.as_deref() == Some("CREATE") && self.source.as_deref() == Some("PUMP_FUN")
    }

    /// Every distinct non-native mint touched by this tx, per spec §4.4 step 3.
    pub fn distinct_mints(&self, native_mint: &str) -> Vec<String> {
        let mut seen = std::collections::BTreeSet::new();
        for t in &self.token_transfers {
            if let Some(m) = &t.mint {
                if m != native_mint {
                    seen.insert(m.clone());
                }
            }
        }
        for ad in &self.account_data {
            for change in &ad.token_balance_changes {
                if let Some(m) = &change.mint {
                    if m != native_mint {
                        seen.insert(m.clone());
                    }
                }
            }
        }
        seen.into_iter().collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MintAccountInfo {
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
    pub supply: u64,
    pub decimals: u8,
}

#[derive(Debug, Clone)]
pub struct TokenAccountBalance {
    pub owner: String,
    pub amount: u64,
}

#[derive(Debug, Clone)]
pub struct LargestAccount {
    pub address: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Default)]
pub struct AssetMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
}

/// Aggregated view of a mint's DEX pairs (spec §4.5/§6 `GET /tokens/{csv}`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct DexAggregate {
    pub liquidity_usd: f64,
    pub volume_24h_usd: f64,
    pub price_usd: Option<f64>,
    pub pair_created_at: Option<i64>,
    pub socials: Vec<daybreakscan_core::model::SocialLink>,
    pub has_any_pair: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RugReportSummary {
    pub lp_locked: Option<bool>,
    pub lp_lock_pct: Option<f64>,
}
