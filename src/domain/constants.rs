// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, B256};
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Zero address doubles as the native-currency sentinel in v4 pool keys.
pub const NATIVE_TOKEN: Address = Address::ZERO;

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_ETHEREUM: u64 = 1;
pub const CHAIN_OPTIMISM: u64 = 10;
pub const CHAIN_POLYGON: u64 = 137;
pub const CHAIN_ARBITRUM: u64 = 42161;
pub const CHAIN_POLYGON_AMOY: u64 = 80002;
pub const CHAIN_SEPOLIA: u64 = 11155111;

lazy_static! {
    static ref EXPLORERS: HashMap<u64, &'static str> = {
        let mut m = HashMap::new();
        m.insert(CHAIN_ETHEREUM, "https://etherscan.io");
        m.insert(CHAIN_OPTIMISM, "https://optimistic.etherscan.io");
        m.insert(CHAIN_POLYGON, "https://polygonscan.com");
        m.insert(CHAIN_ARBITRUM, "https://arbiscan.io");
        m.insert(CHAIN_POLYGON_AMOY, "https://amoy.polygonscan.com");
        m.insert(CHAIN_SEPOLIA, "https://sepolia.etherscan.io");
        m
    };
}

/// Block-explorer link for a transaction, falling back to the bare hash on
/// chains without a known explorer.
pub fn transaction_link(chain_id: u64, hash: &B256) -> String {
    match EXPLORERS.get(&chain_id) {
        Some(base) => format!("{}/tx/{:#x}", base, hash),
        None => format!("{:#x}", hash),
    }
}

// =============================================================================
// PRICE CONSTANTS
// =============================================================================

pub const FEE_DIVIDER: f64 = 10_000.0;
pub const DEFAULT_PRICE_DECIMALS: usize = 6;
pub const DEFAULT_BALANCE_DECIMALS: usize = 4;
pub const DEFAULT_FEE_DECIMALS: usize = 8;
pub const MIN_DISPLAY_BALANCE: f64 = 0.0001;

// =============================================================================
// WORKFLOW DEFAULTS
// =============================================================================

pub const DEFAULT_SLIPPAGE_BPS: u64 = 100;
pub const DEFAULT_SWAP_RULE_ID: &str = "631";
pub const DEFAULT_LIQUIDITY_RULE_ID: &str = "631";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_link_uses_known_explorer() {
        let hash = B256::from([0x11u8; 32]);
        let link = transaction_link(CHAIN_POLYGON_AMOY, &hash);
        assert!(link.starts_with("https://amoy.polygonscan.com/tx/0x11"));

        let fallback = transaction_link(424242, &hash);
        assert!(fallback.starts_with("0x11"));
    }
}
