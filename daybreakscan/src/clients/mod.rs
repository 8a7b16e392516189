pub mod adapters;
pub mod fakes;
pub mod traits;
pub mod types;

pub use traits::{ChainRpcClient, DexIndexClient, EnhancedHistoryClient, PriceOracleClient, RugReportClient};

use std::sync::Arc;

/// The bundle of upstream collaborators a scan needs. Threaded through the
/// pipeline as a single `Arc` so production code and tests wire it up the
/// same way, just with different concrete members.
pub struct Clients {
    pub enhanced_history: Arc<dyn EnhancedHistoryClient>,
    pub chain_rpc: Arc<dyn ChainRpcClient>,
    pub dex_index: Arc<dyn DexIndexClient>,
    pub price_oracle: Arc<dyn PriceOracleClient>,
    pub rug_report: Arc<dyn RugReportClient>,
}
