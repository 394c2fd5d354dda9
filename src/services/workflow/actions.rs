// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use crate::domain::model::{RequestPayload, SwapKind, TokenInfo, WorkflowRequest};
use crate::infrastructure::network::contracts::{
    ComplianceLiquidityRouter, ComplianceSwapRouter, ContractReader, PoolKey, to_i24,
};
use crate::services::price::sqrt_price_limit;
use alloy::primitives::aliases::U160;
use alloy::primitives::{B256, Bytes, I256, U256};
use alloy::sol_types::SolCall;
use serde_json::json;
use std::future::Future;

/// Fully-built router invocation, identical for simulation and execution.
#[derive(Debug, Clone)]
pub struct PreparedCall {
    pub to: alloy::primitives::Address,
    pub calldata: Bytes,
    pub value: U256,
}

/// Strategy seam between the generic four-stage machine and the two
/// operation variants. Swap and liquidity provision share every stage;
/// only the spend set, the signed message and the router payload differ.
pub trait StageAction: Send + Sync {
    /// Human label for the final stage ("Swap", "Add Liquidity").
    fn label(&self) -> &'static str;

    /// Tokens the router will pull and the raw amount required of each.
    /// Native-sentinel entries are exempted from allowance handling
    /// upstream.
    fn spend_requirements(&self, request: &WorkflowRequest) -> Vec<(TokenInfo, U256)>;

    /// Structured message for the compliance signature, binding sender,
    /// receiver, rule and chain so the signed statement cannot be replayed
    /// against another router or chain.
    fn compliance_message(&self, request: &WorkflowRequest) -> String;

    /// Build the exact router call from the frozen request. Invoked once
    /// for simulation and again (same inputs, same output) for execution.
    fn build_call<R: ContractReader>(
        &self,
        reader: &R,
        request: &WorkflowRequest,
        compliance_data: &Bytes,
    ) -> impl Future<Output = Result<PreparedCall, AppError>> + Send;
}

/// Single-hop swap against the compliance-gated swap router.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwapAction;

impl StageAction for SwapAction {
    fn label(&self) -> &'static str {
        "Swap"
    }

    fn spend_requirements(&self, request: &WorkflowRequest) -> Vec<(TokenInfo, U256)> {
        match &request.payload {
            RequestPayload::Swap {
                token_in,
                amount_in,
                ..
            } => vec![(token_in.clone(), *amount_in)],
            RequestPayload::Liquidity { .. } => Vec::new(),
        }
    }

    fn compliance_message(&self, request: &WorkflowRequest) -> String {
        let (amount, token) = match &request.payload {
            RequestPayload::Swap {
                token_in,
                amount_in,
                ..
            } => (amount_in.to_string(), token_in.address),
            RequestPayload::Liquidity { .. } => (U256::ZERO.to_string(), Default::default()),
        };
        json!({
            "sender": request.sender,
            "receiver": request.router,
            "ruleId": request.rule_id(),
            "chainId": request.chain_id,
            "amount": amount,
            "token": token,
        })
        .to_string()
    }

    async fn build_call<R: ContractReader>(
        &self,
        _reader: &R,
        request: &WorkflowRequest,
        compliance_data: &Bytes,
    ) -> Result<PreparedCall, AppError> {
        let RequestPayload::Swap {
            kind,
            token_in,
            amount_in,
            amount_out,
            ..
        } = &request.payload
        else {
            return Err(AppError::Config("Swap action on non-swap request".into()));
        };

        let (token0, token1) = request.pool.sorted_tokens();
        let zero_for_one = token_in.address == token0.address;
        let key = PoolKey::build(
            token0.address,
            token1.address,
            request.slot0.swap_fee,
            request.pool.tick_spacing,
            request.pool.hook,
        )?;

        let limit: U160 = sqrt_price_limit(
            request.slot0.sqrt_price_x96,
            request.slippage_bps,
            zero_for_one,
        )
        .saturating_to();

        // Negative amountSpecified means "exact input" in v4 conventions.
        let amount_specified = match kind {
            SwapKind::ExactIn => -i256_from(*amount_in)?,
            SwapKind::ExactOut => i256_from(*amount_out)?,
        };

        let calldata = ComplianceSwapRouter::swapCall {
            key,
            params: ComplianceSwapRouter::SwapParams {
                zeroForOne: zero_for_one,
                amountSpecified: amount_specified,
                sqrtPriceLimitX96: limit,
            },
            testSettings: ComplianceSwapRouter::TestSettings {
                takeClaims: false,
                settleUsingBurn: false,
            },
            complianceData: compliance_data.clone(),
        }
        .abi_encode();

        let value = if token_in.is_native() {
            *amount_in
        } else {
            U256::ZERO
        };

        Ok(PreparedCall {
            to: request.router,
            calldata: calldata.into(),
            value,
        })
    }
}

/// Liquidity provision through the compliance-gated liquidity router. The
/// liquidity delta itself is computed on-chain from the frozen amounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiquidityAction;

impl StageAction for LiquidityAction {
    fn label(&self) -> &'static str {
        "Add Liquidity"
    }

    fn spend_requirements(&self, request: &WorkflowRequest) -> Vec<(TokenInfo, U256)> {
        match &request.payload {
            RequestPayload::Liquidity {
                left_token,
                right_token,
                left_amount,
                right_amount,
                ..
            } => vec![
                (left_token.clone(), *left_amount),
                (right_token.clone(), *right_amount),
            ],
            RequestPayload::Swap { .. } => Vec::new(),
        }
    }

    fn compliance_message(&self, request: &WorkflowRequest) -> String {
        // Liquidity rules bind identity, not amounts.
        json!({
            "sender": request.sender,
            "receiver": request.router,
            "ruleId": request.rule_id(),
            "chainId": request.chain_id,
        })
        .to_string()
    }

    async fn build_call<R: ContractReader>(
        &self,
        reader: &R,
        request: &WorkflowRequest,
        compliance_data: &Bytes,
    ) -> Result<PreparedCall, AppError> {
        let RequestPayload::Liquidity {
            left_token,
            left_amount,
            right_amount,
            tick_lower,
            tick_upper,
            ..
        } = &request.payload
        else {
            return Err(AppError::Config(
                "Liquidity action on non-liquidity request".into(),
            ));
        };

        let (token0, token1) = request.pool.sorted_tokens();
        let key = PoolKey::build(
            token0.address,
            token1.address,
            request.slot0.swap_fee,
            request.pool.tick_spacing,
            request.pool.hook,
        )?;

        // User-facing left/right order may not match canonical ordering.
        let (amount0, amount1) = if left_token.address == token0.address {
            (*left_amount, *right_amount)
        } else {
            (*right_amount, *left_amount)
        };

        let delta_calldata = ComplianceLiquidityRouter::calculateLiquidityDeltaCall {
            key: key.clone(),
            tickLower: to_i24(*tick_lower)?,
            tickUpper: to_i24(*tick_upper)?,
            amount0,
            amount1,
        }
        .abi_encode();
        let raw = reader.call(request.router, delta_calldata.into()).await?;
        let liquidity_delta =
            ComplianceLiquidityRouter::calculateLiquidityDeltaCall::abi_decode_returns(&raw)
                .map_err(|e| AppError::Rpc(format!("Liquidity delta decode failed: {}", e)))?;

        let calldata = ComplianceLiquidityRouter::modifyLiquidityCall {
            key,
            params: ComplianceLiquidityRouter::ModifyLiquidityParams {
                tickLower: to_i24(*tick_lower)?,
                tickUpper: to_i24(*tick_upper)?,
                liquidityDelta: liquidity_delta,
                salt: B256::ZERO,
            },
            complianceData: compliance_data.clone(),
            settleUsingBurn: false,
            takeClaims: false,
        }
        .abi_encode();

        let value = if token0.is_native() {
            amount0
        } else if token1.is_native() {
            amount1
        } else {
            U256::ZERO
        };

        Ok(PreparedCall {
            to: request.router,
            calldata: calldata.into(),
            value,
        })
    }
}

fn i256_from(value: U256) -> Result<I256, AppError> {
    I256::try_from(value).map_err(|_| AppError::Config("Amount does not fit int256".into()))
}
