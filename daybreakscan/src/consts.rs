//! Well-known program and mint addresses referenced across the pipeline.

pub const PUMP_FUN_PROGRAM: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";
pub const NATIVE_MINT: &str = "So11111111111111111111111111111111111111112";

/// Programs treated as "a DEX" for the initial-transfer-is-dex check in death
/// classification (spec §4.6).
pub const KNOWN_DEX_PROGRAMS: &[&str] = &[
    "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8", // Raydium AMM v4
    "CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK", // Raydium CLMM
    "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc", // Orca Whirlpool
];
