//! Token enumeration (spec §4.4): every mint a deployer has ever launched.

use std::collections::BTreeSet;

use tracing::instrument;

use crate::clients::Clients;
use crate::consts::{NATIVE_MINT, PUMP_FUN_PROGRAM};
use crate::error::ScanError;
use crate::rpc::types::SortOrder;

const ENHANCED_PAGE_SIZE: u32 = 100;
const ENHANCED_MAX_PAGES: u32 = 50;
const ENHANCED_TX_CAP: u32 = ENHANCED_PAGE_SIZE * ENHANCED_MAX_PAGES;

const FALLBACK_SIGNATURE_CAP: u32 = 5_000;
const FALLBACK_PAGE_SIZE: u32 = 1_000;
const FALLBACK_PARSE_CAP: usize = 300;
const FALLBACK_PARSE_BATCH: usize = 10;

#[derive(Default)]
pub struct Enumeration {
    pub mints: Vec<String>,
    pub limit_reached: bool,
    /// Earliest/latest timestamp seen on a matched creation tx, used by the
    /// reputation engine's deploy-velocity and burner heuristics (SPEC_FULL.md
    /// §G). `None` when no creation tx carried a timestamp.
    pub first_creation_at: Option<i64>,
    pub last_creation_at: Option<i64>,
}

/// `tokens_of(deployer) -> (list<Mint>, limit_reached)`.
#[instrument(skip(clients), fields(deployer = %deployer))]
pub async fn tokens_of(clients: &Clients, deployer: &str) -> Result<Enumeration, ScanError> {
    let enhanced = enumerate_via_enhanced(clients, deployer).await?;
    if !enhanced.mints.is_empty() {
        return Ok(enhanced);
    }
    enumerate_via_rpc_fallback(clients, deployer).await
}

async fn enumerate_via_enhanced(clients: &Clients, deployer: &str) -> Result<Enumeration, ScanError> {
    let mut mints = BTreeSet::new();
    let mut before: Option<String> = None;
    let mut seen_txs: u32 = 0;
    let mut limit_reached = false;
    let mut first_creation_at: Option<i64> = None;
    let mut last_creation_at: Option<i64> = None;

    for _ in 0..ENHANCED_MAX_PAGES {
        let page = match clients
            .enhanced_history
            .transactions(deployer, ENHANCED_PAGE_SIZE, SortOrder::Descending, before.as_deref())
            .await
        {
            Ok(page) => page,
            Err(_) => break,
        };
        if page.is_empty() {
            break;
        }

        for tx in &page {
            if tx.fee_payer.as_deref() != Some(deployer) {
                continue;
            }
            let is_creation = (matches!(tx.tx_type.as_deref(), Some("CREATE") | Some("TOKEN_MINT")) && tx.source.as_deref() == Some("PUMP_FUN"))
                || (tx.touches_program(PUMP_FUN_PROGRAM) && tx.has_initialize_mint2_for_any());
            if is_creation {
                if let Some(ts) = tx.timestamp {
                    first_creation_at = Some(first_creation_at.map_or(ts, |f: i64| f.min(ts)));
                    last_creation_at = Some(last_creation_at.map_or(ts, |l: i64| l.max(ts)));
                }
                for mint in tx.distinct_mints(NATIVE_MINT) {
                    mints.insert(mint);
                }
            }
        }

        seen_txs += page.len() as u32;
        before = page.last().map(|t| t.signature.clone());

        if seen_txs >= ENHANCED_TX_CAP {
            limit_reached = true;
            break;
        }
        if page.len() < ENHANCED_PAGE_SIZE as usize {
            break;
        }
    }

    Ok(Enumeration { mints: mints.into_iter().collect(), limit_reached, first_creation_at, last_creation_at })
}

async fn enumerate_via_rpc_fallback(clients: &Clients, deployer: &str) -> Result<Enumeration, ScanError> {
    let mut signatures = Vec::new();
    let mut before: Option<String> = None;

    while signatures.len() < FALLBACK_SIGNATURE_CAP as usize {
        let page = clients
            .chain_rpc
            .get_signatures_for_address(deployer, before.as_deref(), FALLBACK_PAGE_SIZE)
            .await?;
        if page.is_empty() {
            break;
        }
        before = page.last().cloned();
        let remaining = FALLBACK_SIGNATURE_CAP as usize - signatures.len();
        let took_full_page = page.len() >= remaining.min(FALLBACK_PAGE_SIZE as usize);
        signatures.extend(page.into_iter().take(remaining));
        if !took_full_page {
            break;
        }
    }

    let mut mints = BTreeSet::new();
    for chunk in signatures.iter().take(FALLBACK_PARSE_CAP).collect::<Vec<_>>().chunks(FALLBACK_PARSE_BATCH) {
        let futures = chunk.iter().map(|sig| clients.chain_rpc.get_transaction(sig));
        let results = futures::future::join_all(futures).await;
        for tx in results.into_iter().flatten() {
            if tx.touches_program(PUMP_FUN_PROGRAM) {
                for mint in tx.distinct_mints(NATIVE_MINT) {
                    mints.insert(mint);
                }
            }
        }
    }

    Ok(Enumeration { mints: mints.into_iter().collect(), limit_reached: false, ..Default::default() })
}
