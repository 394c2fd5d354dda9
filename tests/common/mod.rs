#![allow(dead_code)]

use alloy::primitives::{Address, B256, Bytes, I256, U256, address};
use alloy::sol_types::{SolCall, SolValue};
use dexflow::app::config::ApprovalPolicy;
use dexflow::domain::error::AppError;
use dexflow::domain::model::{
    ComplianceToken, PoolInfo, RequestPayload, SignedPayload, Slot0, SwapKind, TokenInfo,
    TxnReceipt, WorkflowRequest,
};
use dexflow::infrastructure::compliance::ComplianceGateway;
use dexflow::infrastructure::network::contracts::{
    ComplianceLiquidityRouter, ContractReader, IERC20,
};
use dexflow::infrastructure::network::wallet::WalletProvider;
use dexflow::services::workflow::{Notice, Notifier, WorkflowSettings};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SENDER: Address = address!("1111111111111111111111111111111111111111");
pub const SWAP_ROUTER: Address = address!("62D340AA89e3953063cF3884693d23cdbb5105cd");
pub const LIQUIDITY_ROUTER: Address = address!("9dd329cb352BA3b8aF1e3c0A2Da73C68f7ed1E29");
pub const HOOK: Address = address!("B746e09e18740B0A5ef316497E5E1cdbCe5B2aE0");
pub const CHAIN_ID: u64 = 80002;

// ---------------------------------------------------------------------------
// Gateway doubles. Each is a cheap handle over shared state so tests keep a
// copy for assertions after the workflow takes ownership.
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockWallet(pub Arc<WalletState>);

#[derive(Default)]
pub struct WalletState {
    pub sign_queue: Mutex<VecDeque<Result<String, AppError>>>,
    pub send_queue: Mutex<VecDeque<Result<B256, AppError>>>,
    pub receipt_queue: Mutex<VecDeque<Result<TxnReceipt, AppError>>>,
    pub signed_messages: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<(Address, Bytes, U256)>>,
}

impl WalletProvider for MockWallet {
    fn address(&self) -> Address {
        SENDER
    }

    async fn sign_message(&self, message: &str) -> Result<String, AppError> {
        self.0
            .signed_messages
            .lock()
            .unwrap()
            .push(message.to_string());
        self.0
            .sign_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("0xs19".to_string()))
    }

    async fn send_transaction(
        &self,
        to: Address,
        calldata: Bytes,
        value: U256,
    ) -> Result<B256, AppError> {
        self.0.sent.lock().unwrap().push((to, calldata, value));
        self.0
            .send_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(B256::repeat_byte(0x42)))
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TxnReceipt, AppError> {
        self.0
            .receipt_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TxnReceipt { hash, success: true }))
    }
}

#[derive(Clone, Default)]
pub struct MockReader(pub Arc<ReaderState>);

#[derive(Default)]
pub struct ReaderState {
    /// Live allowance per token contract, as the chain would report it.
    pub allowances: Mutex<HashMap<Address, U256>>,
    pub liquidity_delta: Mutex<I256>,
    pub calls: Mutex<Vec<(Address, Bytes)>>,
    pub simulate_queue: Mutex<VecDeque<Result<Bytes, AppError>>>,
    pub simulated: Mutex<Vec<(Address, Bytes, U256)>>,
}

impl MockReader {
    pub fn set_allowance(&self, token: Address, amount: U256) {
        self.0.allowances.lock().unwrap().insert(token, amount);
    }
}

impl ContractReader for MockReader {
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, AppError> {
        self.0.calls.lock().unwrap().push((to, calldata.clone()));
        let selector: [u8; 4] = calldata[..4].try_into().unwrap();
        if selector == IERC20::allowanceCall::SELECTOR {
            let current = self
                .0
                .allowances
                .lock()
                .unwrap()
                .get(&to)
                .copied()
                .unwrap_or_default();
            return Ok(current.abi_encode().into());
        }
        if selector == ComplianceLiquidityRouter::calculateLiquidityDeltaCall::SELECTOR {
            let delta = *self.0.liquidity_delta.lock().unwrap();
            return Ok(delta.abi_encode().into());
        }
        Err(AppError::Rpc(format!("Unexpected call to {to}")))
    }

    async fn simulate(
        &self,
        _from: Address,
        to: Address,
        calldata: Bytes,
        value: U256,
    ) -> Result<Bytes, AppError> {
        self.0.simulated.lock().unwrap().push((to, calldata, value));
        self.0
            .simulate_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Bytes::new()))
    }
}

#[derive(Clone, Default)]
pub struct MockCompliance(pub Arc<ComplianceState>);

#[derive(Default)]
pub struct ComplianceState {
    pub queue: Mutex<VecDeque<Result<ComplianceToken, AppError>>>,
    pub submitted: Mutex<Vec<SignedPayload>>,
    pub hang: AtomicBool,
}

impl ComplianceGateway for MockCompliance {
    async fn verify(&self, payload: &SignedPayload) -> Result<ComplianceToken, AppError> {
        if self.0.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.0.submitted.lock().unwrap().push(payload.clone());
        self.0
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("0xdeadbeef".to_string()))
    }
}

#[derive(Clone, Default)]
pub struct CollectingNotifier(pub Arc<Mutex<Vec<Notice>>>);

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        self.0.lock().unwrap().push(notice);
    }
}

impl CollectingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.0.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn usdc() -> TokenInfo {
    TokenInfo {
        address: address!("8B2B5c60A45E1b3A32f6431689b94BC3E87738C5"),
        symbol: "USDC".to_string(),
        decimals: 6,
    }
}

pub fn usdt() -> TokenInfo {
    TokenInfo {
        address: address!("b97CBF42B59Ab198c76876C380D47b6734f9fe2B"),
        symbol: "USDT".to_string(),
        decimals: 6,
    }
}

pub fn native_pol() -> TokenInfo {
    TokenInfo {
        address: Address::ZERO,
        symbol: "POL".to_string(),
        decimals: 18,
    }
}

pub fn pool(token0: TokenInfo, token1: TokenInfo) -> PoolInfo {
    PoolInfo {
        token0,
        token1,
        hook: HOOK,
        tick_spacing: 10,
        swap_rule_id: "631".to_string(),
        liquidity_rule_id: "631".to_string(),
    }
}

pub fn slot0() -> Slot0 {
    Slot0 {
        sqrt_price_x96: U256::from(1u128 << 96),
        tick: 0,
        protocol_fee: 0,
        swap_fee: 3000,
    }
}

pub fn settings() -> WorkflowSettings {
    WorkflowSettings {
        approval_policy: ApprovalPolicy::Unlimited,
        min_loading: Duration::ZERO,
    }
}

/// 100 USDC in for ~99 USDT out, exact input.
pub fn swap_request() -> WorkflowRequest {
    WorkflowRequest {
        sender: SENDER,
        chain_id: CHAIN_ID,
        router: SWAP_ROUTER,
        pool: pool(usdc(), usdt()),
        slot0: slot0(),
        slippage_bps: 100,
        payload: RequestPayload::Swap {
            kind: SwapKind::ExactIn,
            token_in: usdc(),
            token_out: usdt(),
            amount_in: U256::from(100_000_000u64),
            amount_out: U256::from(99_000_000u64),
        },
    }
}

pub fn liquidity_request(
    left_token: TokenInfo,
    right_token: TokenInfo,
    left_amount: U256,
    right_amount: U256,
) -> WorkflowRequest {
    let pool = pool(left_token.clone(), right_token.clone());
    WorkflowRequest {
        sender: SENDER,
        chain_id: CHAIN_ID,
        router: LIQUIDITY_ROUTER,
        pool,
        slot0: slot0(),
        slippage_bps: 100,
        payload: RequestPayload::Liquidity {
            left_token,
            right_token,
            left_amount,
            right_amount,
            tick_lower: -100,
            tick_upper: 100,
        },
    }
}
