//! Static set of known centralized-exchange hot wallets (spec §4.7, §9
//! "process-wide singleton"). Used to tag funding sources as `from_cex`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// (wallet, display name) pairs for well-known exchange hot wallets on
/// mainnet. Not exhaustive; new wallets get added as they're observed.
static CEX_WALLETS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9", "Binance"),
        ("2ojv9BAiHUrvsm9gxDe7fJSzbNZSJcxZvf8dqmWGHG8S", "Binance"),
        ("H8sMJSCQxfKiFTCfDR3DUMLPwcRbM61LGFJ61tW1MFa6", "Coinbase"),
        ("GJRs4FwHtemZ5ZE9x3FNvJ8TMwitKTh21yxdRPqn7npE", "Coinbase"),
        ("FWznbcNXWQuHTawe9RxvQ2LdCENssh12dsznf4RiouN5", "Kraken"),
        ("AobVSwdW9BbpMdJvTqeCN4hPAmh2rFA4TqRVScaQ5qw", "OKX"),
    ])
});

pub fn lookup(wallet: &str) -> Option<&'static str> {
    CEX_WALLETS.get(wallet).copied()
}

pub fn is_cex(wallet: &str) -> bool {
    CEX_WALLETS.contains_key(wallet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_wallet() {
        assert!(is_cex("5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9"));
        assert_eq!(lookup("5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9"), Some("Binance"));
    }

    #[test]
    fn unknown_wallet_is_not_cex() {
        assert!(!is_cex("unknown-wallet"));
        assert_eq!(lookup("unknown-wallet"), None);
    }
}
