mod common;

use alloy::primitives::{B256, I256, U256};
use alloy::sol_types::SolCall;
use common::*;
use dexflow::infrastructure::network::contracts::ComplianceLiquidityRouter;
use dexflow::services::workflow::{
    LiquidityAction, Stage, StepStatus, Workflow, WorkflowSettings,
};

async fn open_liquidity(
    wallet: MockWallet,
    reader: MockReader,
    compliance: MockCompliance,
    notifier: CollectingNotifier,
    settings: WorkflowSettings,
    request: dexflow::domain::model::WorkflowRequest,
) -> Workflow<MockWallet, MockReader, MockCompliance, LiquidityAction, CollectingNotifier> {
    Workflow::open(
        wallet,
        reader,
        compliance,
        LiquidityAction,
        notifier,
        settings,
        request,
    )
    .await
    .expect("open")
}

#[tokio::test]
async fn each_erc20_leg_needs_its_own_allowance() {
    let reader = MockReader::default();
    reader.set_allowance(usdt().address, U256::MAX);
    reader.set_allowance(usdc().address, U256::ZERO);

    let request = liquidity_request(
        usdt(),
        usdc(),
        U256::from(7_000_000u64),
        U256::from(5_000_000u64),
    );
    let flow = open_liquidity(
        MockWallet::default(),
        reader,
        MockCompliance::default(),
        CollectingNotifier::default(),
        settings(),
        request,
    )
    .await;

    assert_eq!(
        flow.tracker().status(Stage::Allowance),
        StepStatus::InProgress
    );
    let pending = flow.pending_approvals();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].1.token.symbol, "USDC");
}

#[tokio::test]
async fn modify_liquidity_call_uses_canonical_ordering_and_onchain_delta() {
    let wallet = MockWallet::default();
    let reader = MockReader::default();
    reader.set_allowance(usdc().address, U256::MAX);
    reader.set_allowance(usdt().address, U256::MAX);
    *reader.0.liquidity_delta.lock().unwrap() = I256::try_from(5_000_000i64).unwrap();

    // User entered USDT on the left, but USDC is currency0.
    let request = liquidity_request(
        usdt(),
        usdc(),
        U256::from(7_000_000u64),
        U256::from(5_000_000u64),
    );
    let mut flow = open_liquidity(
        wallet.clone(),
        reader.clone(),
        MockCompliance::default(),
        CollectingNotifier::default(),
        settings(),
        request,
    )
    .await;

    flow.sign().await.expect("sign");
    flow.execute().await.expect("execute");
    assert!(flow.is_complete());

    // The delta was derived on-chain with amounts in canonical order.
    let calls = reader.0.calls.lock().unwrap().clone();
    let delta_call = calls
        .iter()
        .find(|(to, data)| {
            *to == LIQUIDITY_ROUTER
                && data[..4] == ComplianceLiquidityRouter::calculateLiquidityDeltaCall::SELECTOR
        })
        .expect("delta read");
    let decoded =
        ComplianceLiquidityRouter::calculateLiquidityDeltaCall::abi_decode(&delta_call.1)
            .expect("decode delta call");
    assert_eq!(decoded.amount0, U256::from(5_000_000u64)); // USDC side
    assert_eq!(decoded.amount1, U256::from(7_000_000u64)); // USDT side

    let sent = wallet.0.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, LIQUIDITY_ROUTER);
    assert_eq!(sent[0].2, U256::ZERO);
    let call =
        ComplianceLiquidityRouter::modifyLiquidityCall::abi_decode(&sent[0].1).expect("decode");
    assert_eq!(call.params.liquidityDelta, I256::try_from(5_000_000i64).unwrap());
    assert_eq!(call.params.tickLower.as_i32(), -100);
    assert_eq!(call.params.tickUpper.as_i32(), 100);
    assert_eq!(call.params.salt, B256::ZERO);
    assert_eq!(call.key.currency0, usdc().address);
    assert_eq!(call.key.currency1, usdt().address);
    assert_eq!(call.complianceData.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
}

#[tokio::test]
async fn native_leg_attaches_value_and_skips_approval() {
    let wallet = MockWallet::default();
    let reader = MockReader::default();
    reader.set_allowance(usdt().address, U256::MAX);
    *reader.0.liquidity_delta.lock().unwrap() = I256::try_from(1_000i64).unwrap();

    let native_amount = U256::from(10u64).pow(U256::from(18u64));
    let request = liquidity_request(
        native_pol(),
        usdt(),
        native_amount,
        U256::from(5_000_000u64),
    );
    let mut flow = open_liquidity(
        wallet.clone(),
        reader,
        MockCompliance::default(),
        CollectingNotifier::default(),
        settings(),
        request,
    )
    .await;

    // The native sentinel never needs an approval.
    assert_eq!(flow.tracker().status(Stage::Allowance), StepStatus::Done);

    flow.sign().await.expect("sign");
    flow.execute().await.expect("execute");
    assert!(flow.is_complete());

    // Zero address sorts first, so the native amount rides as currency0 and
    // is attached as transaction value.
    let sent = wallet.0.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].2, native_amount);
}
