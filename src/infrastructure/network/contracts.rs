// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use crate::infrastructure::network::provider::HttpProvider;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use std::future::Future;

sol! {
    /// Uniswap-v4-style pool key. currency0 is always the
    /// lexicographically-smaller address.
    struct PoolKey {
        address currency0;
        address currency1;
        uint24 fee;
        int24 tickSpacing;
        address hooks;
    }

    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
    }

    /// Swap router guarded by the compliance hook. The last argument is the
    /// opaque authorization blob returned by the compliance provider.
    interface ComplianceSwapRouter {
        struct SwapParams {
            bool zeroForOne;
            int256 amountSpecified;
            uint160 sqrtPriceLimitX96;
        }

        struct TestSettings {
            bool takeClaims;
            bool settleUsingBurn;
        }

        function swap(
            PoolKey memory key,
            SwapParams memory params,
            TestSettings memory testSettings,
            bytes memory complianceData
        ) external payable returns (int256 delta);
    }

    interface ComplianceLiquidityRouter {
        struct ModifyLiquidityParams {
            int24 tickLower;
            int24 tickUpper;
            int256 liquidityDelta;
            bytes32 salt;
        }

        function calculateLiquidityDelta(
            PoolKey memory key,
            int24 tickLower,
            int24 tickUpper,
            uint256 amount0,
            uint256 amount1
        ) external view returns (int256 liquidityDelta);

        function modifyLiquidity(
            PoolKey memory key,
            ModifyLiquidityParams memory params,
            bytes memory complianceData,
            bool settleUsingBurn,
            bool takeClaims
        ) external payable returns (int256 delta);
    }

    /// Helper used while composing a liquidity position: given one exact
    /// token amount and a range, derive the liquidity and the counter
    /// amount.
    interface LiquidityHelper {
        function calculateLiquidityExactAmount0(
            int24 tick,
            uint160 sqrtPriceX96,
            uint256 amount0,
            int24 tickLower,
            int24 tickUpper
        ) external view returns (int256 liquidity, int256 amount0Delta, int256 amount1Delta);

        function calculateLiquidityExactAmount1(
            int24 tick,
            uint160 sqrtPriceX96,
            uint256 amount1,
            int24 tickLower,
            int24 tickUpper
        ) external view returns (int256 liquidity, int256 amount0Delta, int256 amount1Delta);
    }

    interface Quoter {
        struct QuoteExactSingleParams {
            PoolKey poolKey;
            bool zeroForOne;
            uint128 exactAmount;
            bytes hookData;
        }

        function quoteExactInputSingle(QuoteExactSingleParams memory params)
            external
            returns (uint256 amountOut, uint256 gasEstimate);

        function quoteExactOutputSingle(QuoteExactSingleParams memory params)
            external
            returns (uint256 amountIn, uint256 gasEstimate);
    }

    interface PoolManagerViewer {
        function getSlot0(bytes32 poolId)
            external
            view
            returns (uint160 sqrtPriceX96, int24 tick, uint24 protocolFee, uint24 swapFee);
    }
}

impl PoolKey {
    /// Build a canonical pool key. Callers pass tokens already sorted by
    /// address (currency0 < currency1).
    pub fn build(
        currency0: Address,
        currency1: Address,
        fee: u32,
        tick_spacing: i32,
        hooks: Address,
    ) -> Result<Self, AppError> {
        Ok(Self {
            currency0,
            currency1,
            fee: to_u24(fee)?,
            tickSpacing: to_i24(tick_spacing)?,
            hooks,
        })
    }
}

pub fn to_u24(value: u32) -> Result<alloy::primitives::aliases::U24, AppError> {
    alloy::primitives::aliases::U24::try_from(value)
        .map_err(|_| AppError::Config(format!("Value {} does not fit uint24", value)))
}

pub fn to_i24(value: i32) -> Result<alloy::primitives::aliases::I24, AppError> {
    alloy::primitives::aliases::I24::try_from(value)
        .map_err(|_| AppError::Config(format!("Tick {} does not fit int24", value)))
}

/// Read/simulate access to fixed contracts. Mirrors the public-client split:
/// `call` for plain reads, `simulate` for dry runs of state-mutating
/// functions (no broadcast either way).
pub trait ContractReader: Send + Sync {
    fn call(
        &self,
        to: Address,
        calldata: Bytes,
    ) -> impl Future<Output = Result<Bytes, AppError>> + Send;

    fn simulate(
        &self,
        from: Address,
        to: Address,
        calldata: Bytes,
        value: U256,
    ) -> impl Future<Output = Result<Bytes, AppError>> + Send;
}

#[derive(Clone)]
pub struct RpcContractReader {
    provider: HttpProvider,
}

impl RpcContractReader {
    pub fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }
}

impl ContractReader for RpcContractReader {
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, AppError> {
        let req = TransactionRequest::default().with_to(to).with_input(calldata);
        self.provider
            .call(req)
            .await
            .map_err(|e| AppError::Rpc(e.to_string()))
    }

    async fn simulate(
        &self,
        from: Address,
        to: Address,
        calldata: Bytes,
        value: U256,
    ) -> Result<Bytes, AppError> {
        let req = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(calldata)
            .with_value(value);
        self.provider
            .call(req)
            .await
            .map_err(|e| AppError::SimulationReverted(short_revert_message(&e.to_string())))
    }
}

/// Node revert errors tend to arrive as long JSON-ish strings; keep the
/// leading human-readable part for display.
fn short_revert_message(raw: &str) -> String {
    let first_line = raw.lines().next().unwrap_or(raw);
    const MAX_CHARS: usize = 200;
    match first_line.char_indices().nth(MAX_CHARS) {
        Some((cut, _)) => format!("{}…", &first_line[..cut]),
        None => first_line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_messages_are_trimmed_to_one_line() {
        let raw = "execution reverted: HookNotAuthorized\n{\"code\":3,\"data\":\"0x\"}";
        assert_eq!(
            short_revert_message(raw),
            "execution reverted: HookNotAuthorized"
        );

        let long = "x".repeat(300);
        assert!(short_revert_message(&long).chars().count() <= 201);
    }

    #[test]
    fn truncation_never_splits_a_multibyte_character() {
        // Multibyte text pushes the 200-char mark off a byte boundary.
        let raw = "é".repeat(300);
        let short = short_revert_message(&raw);
        assert_eq!(short.chars().count(), 201);
        assert!(short.ends_with('…'));
    }
}
