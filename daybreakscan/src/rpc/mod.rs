pub mod router;
pub mod types;

pub use router::RpcRouter;
pub use types::RouterError;
