// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::NATIVE_TOKEN;
use alloy::primitives::{Address, U256};
use serde::Deserialize;

/// Token descriptor as configured for a pool. Mirrors the on-chain ERC-20
/// metadata so amounts can be scaled without extra reads.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenInfo {
    /// The native currency rides along as the zero-address sentinel and is
    /// exempt from allowance handling.
    pub fn is_native(&self) -> bool {
        self.address == NATIVE_TOKEN
    }
}

/// Static pool descriptor for a v4-style pool manager.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolInfo {
    pub token0: TokenInfo,
    pub token1: TokenInfo,
    pub hook: Address,
    pub tick_spacing: i32,
    pub swap_rule_id: String,
    pub liquidity_rule_id: String,
}

impl PoolInfo {
    /// Canonical ordering: the lexicographically-smaller contract address
    /// is always currency0. Config may list tokens either way around.
    pub fn sorted_tokens(&self) -> (&TokenInfo, &TokenInfo) {
        sort_tokens(&self.token0, &self.token1)
    }
}

pub fn sort_tokens<'a>(a: &'a TokenInfo, b: &'a TokenInfo) -> (&'a TokenInfo, &'a TokenInfo) {
    if a.address < b.address {
        (a, b)
    } else {
        (b, a)
    }
}

/// Snapshot of the pool manager's slot0 for a pool.
#[derive(Debug, Clone, Copy)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub protocol_fee: u32,
    pub swap_fee: u32,
}

/// Which side of a swap is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapKind {
    /// Exact input for output.
    ExactIn,
    /// Exact output for input.
    ExactOut,
}

/// Immutable snapshot of user intent, created when a workflow opens.
/// Subsequent edits to the underlying form never reach an in-flight
/// workflow.
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub sender: Address,
    pub chain_id: u64,
    pub router: Address,
    pub pool: PoolInfo,
    pub slot0: Slot0,
    /// Slippage tolerance in basis points, read from process-wide
    /// preference at open time.
    pub slippage_bps: u64,
    pub payload: RequestPayload,
}

/// Operation-specific frozen amounts.
#[derive(Debug, Clone)]
pub enum RequestPayload {
    Swap {
        kind: SwapKind,
        token_in: TokenInfo,
        token_out: TokenInfo,
        /// Raw token units, already scaled by decimals.
        amount_in: U256,
        amount_out: U256,
    },
    Liquidity {
        left_token: TokenInfo,
        right_token: TokenInfo,
        left_amount: U256,
        right_amount: U256,
        tick_lower: i32,
        tick_upper: i32,
    },
}

impl WorkflowRequest {
    pub fn rule_id(&self) -> &str {
        match self.payload {
            RequestPayload::Swap { .. } => &self.pool.swap_rule_id,
            RequestPayload::Liquidity { .. } => &self.pool.liquidity_rule_id,
        }
    }
}

/// Per-token allowance bookkeeping. `required` is fixed at workflow-open
/// time; `current` is refreshed after every approval receipt.
#[derive(Debug, Clone)]
pub struct AllowanceSnapshot {
    pub token: TokenInfo,
    pub required: U256,
    pub current: Option<U256>,
}

impl AllowanceSnapshot {
    pub fn new(token: TokenInfo, required: U256) -> Self {
        Self {
            token,
            required,
            current: None,
        }
    }

    pub fn satisfied(&self) -> bool {
        self.token.is_native() || self.current.is_some_and(|cur| cur >= self.required)
    }
}

/// Final on-chain outcome of an approval or execution transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxnReceipt {
    pub hash: alloy::primitives::B256,
    pub success: bool,
}

/// Terminal record of the Execution stage.
#[derive(Debug, Clone)]
pub struct ExecutionReceipt {
    pub hash: alloy::primitives::B256,
    pub success: bool,
    pub explorer_link: String,
}

/// Message + signature pair submitted to the compliance provider. Identical
/// payloads stay valid for repeated verification attempts, so Verify can be
/// retried without a fresh wallet prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub message: String,
    pub signature: String,
}

/// Opaque authorization blob returned by the compliance provider and
/// consumed by the router as hook data.
pub type ComplianceToken = String;

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    fn token(addr: Address, symbol: &str) -> TokenInfo {
        TokenInfo {
            address: addr,
            symbol: symbol.to_string(),
            decimals: 6,
        }
    }

    #[test]
    fn sort_tokens_orders_by_address() {
        let a = token(address!("8B2B5c60A45E1b3A32f6431689b94BC3E87738C5"), "USDC");
        let b = token(address!("b97CBF42B59Ab198c76876C380D47b6734f9fe2B"), "USDT");
        let (t0, t1) = sort_tokens(&b, &a);
        assert_eq!(t0.symbol, "USDC");
        assert_eq!(t1.symbol, "USDT");
    }

    #[test]
    fn native_sentinel_is_always_satisfied() {
        let snap = AllowanceSnapshot::new(token(NATIVE_TOKEN, "ETH"), U256::from(100u64));
        assert!(snap.satisfied());

        let mut erc20 = AllowanceSnapshot::new(
            token(address!("8B2B5c60A45E1b3A32f6431689b94BC3E87738C5"), "USDC"),
            U256::from(100u64),
        );
        assert!(!erc20.satisfied());
        erc20.current = Some(U256::from(100u64));
        assert!(erc20.satisfied());
    }
}
