// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use crate::domain::model::{PoolInfo, Slot0, SwapKind, TokenInfo};
use crate::infrastructure::network::contracts::{
    ContractReader, LiquidityHelper, PoolKey, PoolManagerViewer, Quoter, to_i24,
};
use alloy::primitives::aliases::U160;
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::sol_types::SolCall;

/// Result of a single-hop quote. The exact side echoes the request; the
/// other side comes from the quoter dry run.
#[derive(Debug, Clone)]
pub struct Quote {
    pub amount_in: U256,
    pub amount_out: U256,
    pub gas_estimate: U256,
}

/// Amount pairing for a liquidity range, derived on-chain.
#[derive(Debug, Clone, Default)]
pub struct LiquidityAmounts {
    pub liquidity: U256,
    pub amount0: U256,
    pub amount1: U256,
}

/// Thin wrapper around quoter/helper/viewer dry runs. Used to freeze the
/// counter-side amount before a workflow opens; owns no state of its own.
pub struct QuoteService<R: ContractReader> {
    reader: R,
    quoter: Address,
    liquidity_helper: Address,
    pool_manager_viewer: Address,
}

impl<R: ContractReader> QuoteService<R> {
    pub fn new(
        reader: R,
        quoter: Address,
        liquidity_helper: Address,
        pool_manager_viewer: Address,
    ) -> Self {
        Self {
            reader,
            quoter,
            liquidity_helper,
            pool_manager_viewer,
        }
    }

    pub async fn slot0(&self, pool_id: B256) -> Result<Slot0, AppError> {
        let calldata = PoolManagerViewer::getSlot0Call { poolId: pool_id }.abi_encode();
        let raw = self.reader.call(self.pool_manager_viewer, calldata.into()).await?;
        let decoded = PoolManagerViewer::getSlot0Call::abi_decode_returns(&raw)
            .map_err(|e| AppError::Rpc(format!("slot0 decode failed: {}", e)))?;

        Ok(Slot0 {
            sqrt_price_x96: U256::from(decoded.sqrtPriceX96),
            tick: decoded.tick.as_i32(),
            protocol_fee: decoded.protocolFee.to::<u32>(),
            swap_fee: decoded.swapFee.to::<u32>(),
        })
    }

    /// Quote a single-hop swap with one exact side. `token` is the exact
    /// token (input for ExactIn, output for ExactOut).
    pub async fn quote_exact_single(
        &self,
        kind: SwapKind,
        pool: &PoolInfo,
        slot0: &Slot0,
        token: &TokenInfo,
        exact_amount: U256,
        hook_data: Bytes,
    ) -> Result<Quote, AppError> {
        let (token0, token1) = pool.sorted_tokens();
        let key = PoolKey::build(
            token0.address,
            token1.address,
            slot0.swap_fee,
            pool.tick_spacing,
            pool.hook,
        )?;

        let is_token0 = token.address == token0.address;
        let zero_for_one = match kind {
            SwapKind::ExactIn => is_token0,
            SwapKind::ExactOut => !is_token0,
        };

        let params = Quoter::QuoteExactSingleParams {
            poolKey: key,
            zeroForOne: zero_for_one,
            exactAmount: exact_amount
                .try_into()
                .map_err(|_| AppError::Config("Amount does not fit uint128".into()))?,
            hookData: hook_data,
        };

        let (calldata, exact_is_input) = match kind {
            SwapKind::ExactIn => (
                Quoter::quoteExactInputSingleCall { params }.abi_encode(),
                true,
            ),
            SwapKind::ExactOut => (
                Quoter::quoteExactOutputSingleCall { params }.abi_encode(),
                false,
            ),
        };

        let raw = self
            .reader
            .simulate(Address::ZERO, self.quoter, calldata.into(), U256::ZERO)
            .await?;

        // Both quoter functions return (amount, gasEstimate).
        let decoded = Quoter::quoteExactInputSingleCall::abi_decode_returns(&raw)
            .map_err(|e| AppError::Rpc(format!("Quote decode failed: {}", e)))?;
        let (amount, gas_estimate) = (decoded.amountOut, decoded.gasEstimate);

        Ok(if exact_is_input {
            Quote {
                amount_in: exact_amount,
                amount_out: amount,
                gas_estimate,
            }
        } else {
            Quote {
                amount_in: amount,
                amount_out: exact_amount,
                gas_estimate,
            }
        })
    }

    /// Pair a liquidity range with both token amounts given one exact side.
    /// Helper failures degrade to zeroed amounts rather than erroring, so a
    /// form can keep rendering while the user adjusts inputs.
    pub async fn calculate_amounts(
        &self,
        exact_token0: bool,
        slot0: &Slot0,
        exact_amount: U256,
        tick_lower: i32,
        tick_upper: i32,
    ) -> LiquidityAmounts {
        match self
            .try_calculate_amounts(exact_token0, slot0, exact_amount, tick_lower, tick_upper)
            .await
        {
            Ok(amounts) => amounts,
            Err(e) => {
                tracing::warn!(target: "quote", error = %e, "Liquidity helper failure");
                LiquidityAmounts::default()
            }
        }
    }

    async fn try_calculate_amounts(
        &self,
        exact_token0: bool,
        slot0: &Slot0,
        exact_amount: U256,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<LiquidityAmounts, AppError> {
        let tick = to_i24(slot0.tick)?;
        let sqrt: U160 = slot0.sqrt_price_x96.saturating_to();
        let lower = to_i24(tick_lower)?;
        let upper = to_i24(tick_upper)?;

        let calldata = if exact_token0 {
            LiquidityHelper::calculateLiquidityExactAmount0Call {
                tick,
                sqrtPriceX96: sqrt,
                amount0: exact_amount,
                tickLower: lower,
                tickUpper: upper,
            }
            .abi_encode()
        } else {
            LiquidityHelper::calculateLiquidityExactAmount1Call {
                tick,
                sqrtPriceX96: sqrt,
                amount1: exact_amount,
                tickLower: lower,
                tickUpper: upper,
            }
            .abi_encode()
        };

        let raw = self
            .reader
            .simulate(Address::ZERO, self.liquidity_helper, calldata.into(), U256::ZERO)
            .await?;
        let decoded = LiquidityHelper::calculateLiquidityExactAmount0Call::abi_decode_returns(&raw)
            .map_err(|e| AppError::Rpc(format!("Liquidity helper decode failed: {}", e)))?;

        Ok(LiquidityAmounts {
            liquidity: decoded.liquidity.unsigned_abs(),
            amount0: decoded.amount0Delta.unsigned_abs(),
            amount1: decoded.amount1Delta.unsigned_abs(),
        })
    }
}
