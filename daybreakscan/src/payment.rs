//! Quota & payment gate (spec §4.10): on-chain transfer verification and
//! Ed25519 signed-claim verification, both replay-safe via the `payments`
//! table's unique constraint on the recorded key.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{Pool, Sqlite};
use tracing::{instrument, warn};

use crate::error::ScanError;

const REPLAY_WINDOW_SECS: i64 = 600;
const USDC_DECIMALS: u32 = 6;

/// Document returned on a 402: `accepts[]` enumerates acceptable payment
/// methods (spec §4.10, scenario 8).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentDetails {
    pub accepts: Vec<PaymentOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentOption {
    pub scheme: String,
    pub network: String,
    pub asset: String,
    #[serde(rename = "maxAmountRequired")]
    pub max_amount_required: u64,
    #[serde(rename = "payTo")]
    pub pay_to: String,
    #[serde(rename = "validUntil")]
    pub valid_until: i64,
}

impl PaymentDetails {
    /// One `exact`-scheme USDC option against the treasury, per spec §4.10.
    pub fn exact_usdc(network: &str, treasury: &str, price_usd: f64, now: i64, valid_for_secs: i64) -> Self {
        Self {
            accepts: vec![PaymentOption {
                scheme: "exact".to_string(),
                network: network.to_string(),
                asset: "USDC".to_string(),
                max_amount_required: expected_micros(price_usd),
                pay_to: treasury.to_string(),
                valid_until: now + valid_for_secs,
            }],
        }
    }
}

fn expected_micros(price_usd: f64) -> u64 {
    (price_usd * 10f64.powi(USDC_DECIMALS as i32)).round() as u64
}

/// Payload for the on-chain verification scheme: caller claims a specific tx
/// signature paid the treasury.
#[derive(Debug, Clone, Deserialize)]
pub struct OnChainPaymentPayload {
    #[serde(rename = "txSignature")]
    pub tx_signature: String,
    pub payer: String,
}

/// What the on-chain verifier needs to read from the claimed transaction:
/// whether it succeeded, its block time, and the treasury USDC balance delta.
#[derive(Debug, Clone)]
pub struct OnChainTxView {
    pub success: bool,
    pub block_time: Option<i64>,
    pub signers: Vec<String>,
    pub treasury_usdc_pre: u64,
    pub treasury_usdc_post: u64,
}

#[async_trait::async_trait]
pub trait TxLookup: Send + Sync {
    async fn lookup(&self, signature: &str) -> Result<Option<OnChainTxView>, ScanError>;
}

/// Verify and record an on-chain payment. Returns the verified payer on
/// success; replay, staleness, signer mismatch, and amount-short all map to
/// `PaymentInvalid` without revealing which check failed (spec §7 policy).
#[instrument(skip(pool, tx_lookup, payload), fields(tx = %payload.tx_signature))]
pub async fn verify_on_chain(
    pool: &Pool<Sqlite>,
    tx_lookup: &dyn TxLookup,
    payload: &OnChainPaymentPayload,
    price_usd: f64,
    now: i64,
) -> Result<String, ScanError> {
    if crate::db::payment_already_recorded(pool, &payload.tx_signature).await? {
        return Err(ScanError::PaymentInvalid);
    }

    let tx = tx_lookup.lookup(&payload.tx_signature).await?.ok_or(ScanError::PaymentInvalid)?;

    if !tx.success {
        return Err(ScanError::PaymentInvalid);
    }
    let Some(block_time) = tx.block_time else {
        return Err(ScanError::PaymentInvalid);
    };
    if (now - block_time).abs() > REPLAY_WINDOW_SECS {
        return Err(ScanError::PaymentInvalid);
    }
    if !tx.signers.iter().any(|s| s == &payload.payer) {
        return Err(ScanError::PaymentInvalid);
    }

    let delta = tx.treasury_usdc_post.saturating_sub(tx.treasury_usdc_pre);
    let expected = expected_micros(price_usd);
    if delta < expected {
        warn!(delta, expected, "on-chain payment amount short");
        return Err(ScanError::PaymentInvalid);
    }

    let recorded = crate::db::record_payment_if_new(pool, "on-chain", &payload.tx_signature, &payload.payer, price_usd, now).await?;
    if !recorded {
        // Lost a race with a concurrent verification of the same signature.
        return Err(ScanError::PaymentInvalid);
    }

    Ok(payload.payer.clone())
}

/// Payload for the signed-claim (x402-style) verification scheme.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedClaimPayload {
    #[serde(rename = "paymentOption")]
    pub payment_option: PaymentOption,
    pub signature: String,
    pub payer: String,
    pub nonce: String,
    pub timestamp: i64,
}

/// The canonical message signed by the payer, in field order per spec §4.10.
#[derive(Debug, Clone, Serialize)]
struct CanonicalMessage<'a> {
    scheme: &'a str,
    network: &'a str,
    asset: &'a str,
    amount: u64,
    #[serde(rename = "payTo")]
    pay_to: &'a str,
    nonce: &'a str,
    timestamp: i64,
    #[serde(rename = "validUntil")]
    valid_until: i64,
}

/// Verify and record a signed-claim payment. Replay key is the nonce.
#[instrument(skip(pool, payload), fields(payer = %payload.payer))]
pub async fn verify_signed_claim(
    pool: &Pool<Sqlite>,
    payload: &SignedClaimPayload,
    treasury: &str,
    price_usd: f64,
    now: i64,
) -> Result<String, ScanError> {
    if (now - payload.timestamp).abs() > REPLAY_WINDOW_SECS {
        return Err(ScanError::PaymentInvalid);
    }
    if payload.payment_option.pay_to != treasury {
        warn!(pay_to = %payload.payment_option.pay_to, "signed-claim payTo mismatch");
        return Err(ScanError::PaymentInvalid);
    }
    let expected = expected_micros(price_usd);
    if payload.payment_option.max_amount_required < expected {
        return Err(ScanError::PaymentInvalid);
    }
    if crate::db::payment_already_recorded(pool, &payload.nonce).await? {
        return Err(ScanError::PaymentInvalid);
    }

    let message = CanonicalMessage {
        scheme: &payload.payment_option.scheme,
        network: &payload.payment_option.network,
        asset: &payload.payment_option.asset,
        amount: payload.payment_option.max_amount_required,
        pay_to: &payload.payment_option.pay_to,
        nonce: &payload.nonce,
        timestamp: payload.timestamp,
        valid_until: payload.payment_option.valid_until,
    };
    let canonical = serde_json::to_vec(&message).map_err(|e| ScanError::InternalError(e.to_string()))?;
    let digest = Sha256::digest(&canonical);

    if !verify_ed25519(&payload.payer, &payload.signature, &digest) {
        return Err(ScanError::PaymentInvalid);
    }

    let recorded = crate::db::record_payment_if_new(pool, "signed-claim", &payload.nonce, &payload.payer, price_usd, now).await?;
    if !recorded {
        return Err(ScanError::PaymentInvalid);
    }

    Ok(payload.payer.clone())
}

fn verify_ed25519(payer_base58: &str, signature_base58: &str, message: &[u8]) -> bool {
    let Ok(pubkey_bytes) = bs58::decode(payer_base58).into_vec() else {
        return false;
    };
    let Ok(pubkey_bytes): Result<[u8; 32], _> = pubkey_bytes.try_into() else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pubkey_bytes) else {
        return false;
    };

    let Ok(sig_bytes) = bs58::decode(signature_base58).into_vec() else {
        return false;
    };
    let Ok(sig_bytes): Result<[u8; 64], _> = sig_bytes.try_into() else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);

    verifying_key.verify(message, &signature).is_ok()
}
