// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::ApprovalPolicy;
use crate::common::delay::with_min_delay;
use crate::common::parsing::parse_hex_bytes;
use crate::common::retry::retry_async;
use crate::domain::constants::transaction_link;
use crate::domain::error::AppError;
use crate::domain::model::{
    AllowanceSnapshot, ComplianceToken, ExecutionReceipt, SignedPayload, TokenInfo,
    WorkflowRequest,
};
use crate::infrastructure::compliance::ComplianceGateway;
use crate::infrastructure::network::contracts::{ContractReader, IERC20};
use crate::infrastructure::network::wallet::WalletProvider;
use crate::services::workflow::actions::StageAction;
use crate::services::workflow::events::{Notice, NoticeKind, Notifier};
use crate::services::workflow::machine::{ComplianceStep, Stage, StageTracker, StepStatus};
use alloy::primitives::{Bytes, U256};
use alloy::sol_types::SolCall;
use std::future::Future;
use std::time::Duration;
use tokio::select;
use tokio_util::sync::CancellationToken;

const ALLOWANCE_FETCH_ATTEMPTS: usize = 3;
const ALLOWANCE_FETCH_DELAY: Duration = Duration::from_millis(250);

/// Behavior knobs frozen at open time, like the request itself.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowSettings {
    pub approval_policy: ApprovalPolicy,
    pub min_loading: Duration,
}

/// One transaction workflow: a frozen request walked through Allowance,
/// Compliance, Simulation and Execution. Public operations only return
/// `Err` on cancellation; gateway failures become stage state and notices,
/// and out-of-order calls are no-ops.
pub struct Workflow<W, R, K, A, N> {
    wallet: W,
    reader: R,
    compliance: K,
    action: A,
    notifier: N,
    settings: WorkflowSettings,
    request: WorkflowRequest,
    tracker: StageTracker,
    allowances: Vec<AllowanceSnapshot>,
    signed: Option<SignedPayload>,
    token: Option<ComplianceToken>,
    simulation_error: Option<String>,
    receipt: Option<ExecutionReceipt>,
    cancel: CancellationToken,
}

/// Race a gateway call against workflow cancellation. Closing the workflow
/// abandons whatever was in flight.
async fn guarded<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        out = fut => out,
    }
}

impl<W, R, K, A, N> Workflow<W, R, K, A, N>
where
    W: WalletProvider,
    R: ContractReader,
    K: ComplianceGateway,
    A: StageAction,
    N: Notifier,
{
    /// Open a workflow: fetch current allowances and advance straight to
    /// Compliance when every spend is already covered.
    pub async fn open(
        wallet: W,
        reader: R,
        compliance: K,
        action: A,
        notifier: N,
        settings: WorkflowSettings,
        request: WorkflowRequest,
    ) -> Result<Self, AppError> {
        let allowances = action
            .spend_requirements(&request)
            .into_iter()
            .map(|(token, required)| AllowanceSnapshot::new(token, required))
            .collect();

        let mut flow = Self {
            wallet,
            reader,
            compliance,
            action,
            notifier,
            settings,
            request,
            tracker: StageTracker::new(),
            allowances,
            signed: None,
            token: None,
            simulation_error: None,
            receipt: None,
            cancel: CancellationToken::new(),
        };
        flow.load_allowances().await?;
        Ok(flow)
    }

    // ---------------------------------------------------------------------
    // Stage 1: Allowance
    // ---------------------------------------------------------------------

    async fn load_allowances(&mut self) -> Result<(), AppError> {
        let cancel = self.cancel.clone();
        let reader = &self.reader;
        let owner = self.request.sender;
        let spender = self.request.router;
        let snapshots = &self.allowances;
        let fetched = guarded(
            &cancel,
            with_min_delay(self.settings.min_loading, async move {
                let mut out = Vec::with_capacity(snapshots.len());
                for snapshot in snapshots {
                    if snapshot.token.is_native() {
                        out.push(None);
                        continue;
                    }
                    let current = retry_async(
                        |_| Self::fetch_allowance(reader, owner, spender, &snapshot.token),
                        ALLOWANCE_FETCH_ATTEMPTS,
                        ALLOWANCE_FETCH_DELAY,
                    )
                    .await?;
                    out.push(Some(current));
                }
                Ok::<_, AppError>(out)
            }),
        )
        .await;

        match fetched {
            Ok(values) => {
                for (snapshot, current) in self.allowances.iter_mut().zip(values) {
                    snapshot.current = current;
                }
                self.advance_allowance_if_satisfied();
                Ok(())
            }
            Err(AppError::Cancelled) => Err(AppError::Cancelled),
            Err(e) => {
                self.tracker.fail(Stage::Allowance);
                self.notifier.notify(Notice::transient(
                    NoticeKind::Error,
                    format!("Could not read token allowances: {}", e),
                ));
                Ok(())
            }
        }
    }

    async fn fetch_allowance(
        reader: &R,
        owner: alloy::primitives::Address,
        spender: alloy::primitives::Address,
        token: &TokenInfo,
    ) -> Result<U256, AppError> {
        let calldata = IERC20::allowanceCall { owner, spender }.abi_encode();
        let raw = reader.call(token.address, calldata.into()).await?;
        IERC20::allowanceCall::abi_decode_returns(&raw)
            .map_err(|e| AppError::Rpc(format!("Allowance decode failed: {}", e)))
    }

    fn advance_allowance_if_satisfied(&mut self) {
        if self.tracker.status(Stage::Allowance) == StepStatus::Failed {
            self.tracker.begin(Stage::Allowance);
        }
        if self.allowances.iter().all(AllowanceSnapshot::satisfied) {
            self.tracker.advance(Stage::Allowance);
        }
    }

    /// Retry the allowance read after a failure.
    pub async fn reload_allowances(&mut self) -> Result<(), AppError> {
        if self.tracker.active_stage() != Stage::Allowance {
            tracing::debug!(target: "workflow", "reload_allowances outside Allowance stage; ignored");
            return Ok(());
        }
        self.tracker.begin(Stage::Allowance);
        self.load_allowances().await
    }

    /// Submit an approval for the allowance at `index`.
    pub async fn approve(&mut self, index: usize) -> Result<(), AppError> {
        if self.tracker.active_stage() != Stage::Allowance {
            tracing::debug!(target: "workflow", "approve outside Allowance stage; ignored");
            return Ok(());
        }
        let Some(snapshot) = self.allowances.get(index) else {
            tracing::debug!(target: "workflow", index, "approve for unknown allowance; ignored");
            return Ok(());
        };
        if snapshot.satisfied() {
            return Ok(());
        }

        let amount = match self.settings.approval_policy {
            ApprovalPolicy::Unlimited => U256::MAX,
            ApprovalPolicy::Exact => snapshot.required,
        };
        let symbol = snapshot.token.symbol.clone();
        let token_address = snapshot.token.address;
        let calldata = IERC20::approveCall {
            spender: self.request.router,
            amount,
        }
        .abi_encode();

        let sent = guarded(
            &self.cancel.clone(),
            self.wallet
                .send_transaction(token_address, calldata.into(), U256::ZERO),
        )
        .await;
        let hash = match sent {
            Ok(hash) => hash,
            Err(AppError::Cancelled) => return Err(AppError::Cancelled),
            Err(AppError::UserCancelled) => {
                self.notifier.notify(Notice::transient(
                    NoticeKind::Info,
                    format!("{} approval cancelled", symbol),
                ));
                return Ok(());
            }
            Err(e) => {
                self.notifier.notify(Notice::transient(
                    NoticeKind::Error,
                    format!("{} approval failed: {}", symbol, e),
                ));
                return Ok(());
            }
        };

        let link = transaction_link(self.request.chain_id, &hash);
        self.notifier.notify(
            Notice::transient(NoticeKind::Info, format!("{} approval submitted", symbol))
                .with_link(link.clone()),
        );

        let receipt = guarded(&self.cancel.clone(), self.wallet.wait_for_receipt(hash)).await;
        match receipt {
            Ok(rcpt) if rcpt.success => {
                // Trust the chain, not the request: re-read the granted
                // allowance instead of assuming the approved amount.
                let token = self.allowances[index].token.clone();
                let refetched = guarded(
                    &self.cancel.clone(),
                    Self::fetch_allowance(
                        &self.reader,
                        self.request.sender,
                        self.request.router,
                        &token,
                    ),
                )
                .await;
                match refetched {
                    Ok(current) => self.allowances[index].current = Some(current),
                    Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                    Err(e) => {
                        tracing::warn!(target: "workflow", error = %e, "Allowance re-read failed after approval");
                        self.allowances[index].current = Some(amount);
                    }
                }
                self.notifier.notify(
                    Notice::transient(
                        NoticeKind::Success,
                        format!("{} approval confirmed", symbol),
                    )
                    .with_link(link),
                );
                self.advance_allowance_if_satisfied();
            }
            Ok(_) => {
                self.notifier.notify(
                    Notice::transient(
                        NoticeKind::Error,
                        format!("{} approval reverted", symbol),
                    )
                    .with_link(link),
                );
            }
            Err(AppError::Cancelled) => return Err(AppError::Cancelled),
            Err(e) => {
                self.notifier.notify(Notice::transient(
                    NoticeKind::Error,
                    format!("{} approval not confirmed: {}", symbol, e),
                ));
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Stage 2: Compliance (Signing -> Verifying)
    // ---------------------------------------------------------------------

    /// Ask the wallet to sign the compliance message and submit it for
    /// verification. With a signature already in hand this only re-verifies.
    pub async fn sign(&mut self) -> Result<(), AppError> {
        if self.tracker.active_stage() != Stage::Compliance {
            tracing::debug!(target: "workflow", "sign outside Compliance stage; ignored");
            return Ok(());
        }
        if self.signed.is_some() {
            return self.verify().await;
        }

        if self.tracker.status(Stage::Compliance) == StepStatus::Failed {
            self.tracker.begin(Stage::Compliance);
        }
        self.tracker.begin_compliance_step(ComplianceStep::Signing);

        let message = self.action.compliance_message(&self.request);
        let signed = guarded(&self.cancel.clone(), self.wallet.sign_message(&message)).await;
        match signed {
            Ok(signature) => {
                self.tracker.complete_compliance_step(ComplianceStep::Signing);
                self.signed = Some(SignedPayload { message, signature });
                self.verify().await
            }
            Err(AppError::Cancelled) => Err(AppError::Cancelled),
            Err(AppError::UserCancelled) => {
                self.notifier.notify(Notice::transient(
                    NoticeKind::Info,
                    "Signature request cancelled",
                ));
                Ok(())
            }
            Err(e) => {
                self.tracker.fail_compliance_step(ComplianceStep::Signing);
                self.tracker.fail(Stage::Compliance);
                self.notifier.notify(Notice::transient(
                    NoticeKind::Error,
                    format!("Signing failed: {}", e),
                ));
                Ok(())
            }
        }
    }

    /// Submit the signed payload for rule verification. A retry resubmits
    /// the exact same payload without a new wallet prompt.
    pub async fn verify(&mut self) -> Result<(), AppError> {
        if self.tracker.active_stage() != Stage::Compliance {
            tracing::debug!(target: "workflow", "verify outside Compliance stage; ignored");
            return Ok(());
        }
        let Some(payload) = self.signed.clone() else {
            tracing::debug!(target: "workflow", "verify before signing; ignored");
            return Ok(());
        };

        if self.tracker.status(Stage::Compliance) == StepStatus::Failed {
            self.tracker.begin(Stage::Compliance);
        }
        self.tracker.begin_compliance_step(ComplianceStep::Verifying);

        let verified = guarded(
            &self.cancel.clone(),
            with_min_delay(self.settings.min_loading, self.compliance.verify(&payload)),
        )
        .await;
        match verified {
            Ok(token) => {
                self.token = Some(token);
                self.tracker.complete_compliance_step(ComplianceStep::Verifying);
                self.tracker.advance(Stage::Compliance);
                self.simulate().await
            }
            Err(AppError::Cancelled) => Err(AppError::Cancelled),
            Err(AppError::ComplianceActionRequired { message, redirect }) => {
                // Onboarding happens on the provider's dashboard. The substep
                // shows the refusal, but the stage stays live so a retry
                // works once the user is done there.
                self.tracker.fail_compliance_step(ComplianceStep::Verifying);
                self.notifier.notify(
                    Notice::transient(NoticeKind::Warning, message)
                        .with_link(redirect)
                        .sticky(),
                );
                Ok(())
            }
            Err(e) => {
                self.tracker.fail_compliance_step(ComplianceStep::Verifying);
                self.tracker.fail(Stage::Compliance);
                self.notifier
                    .notify(Notice::transient(NoticeKind::Error, e.to_string()));
                Ok(())
            }
        }
    }

    // ---------------------------------------------------------------------
    // Stage 3: Simulation
    // ---------------------------------------------------------------------

    /// Dry-run the final router call. A failure parks the stage as Failed
    /// with the revert reason kept for display.
    pub async fn simulate(&mut self) -> Result<(), AppError> {
        if self.tracker.active_stage() != Stage::Simulation {
            tracing::debug!(target: "workflow", "simulate outside Simulation stage; ignored");
            return Ok(());
        }
        let Some(hook_data) = self.hook_data() else {
            tracing::debug!(target: "workflow", "simulate without compliance token; ignored");
            return Ok(());
        };

        if self.tracker.status(Stage::Simulation) == StepStatus::Failed {
            self.tracker.begin(Stage::Simulation);
        }
        self.simulation_error = None;

        let result = guarded(
            &self.cancel.clone(),
            with_min_delay(self.settings.min_loading, async {
                let call = self
                    .action
                    .build_call(&self.reader, &self.request, &hook_data)
                    .await?;
                self.reader
                    .simulate(self.request.sender, call.to, call.calldata, call.value)
                    .await
            }),
        )
        .await;
        match result {
            Ok(_) => {
                self.tracker.advance(Stage::Simulation);
                Ok(())
            }
            Err(AppError::Cancelled) => Err(AppError::Cancelled),
            Err(e) => {
                let reason = match &e {
                    AppError::SimulationReverted(reason) => reason.clone(),
                    other => other.to_string(),
                };
                self.simulation_error = Some(reason.clone());
                self.tracker.fail(Stage::Simulation);
                self.notifier.notify(Notice::transient(
                    NoticeKind::Warning,
                    format!("Simulation failed: {}", reason),
                ));
                Ok(())
            }
        }
    }

    /// Explicit user override of a failed simulation.
    pub fn proceed_anyway(&mut self) {
        if self.tracker.status(Stage::Simulation) != StepStatus::Failed
            || self.tracker.simulation_overridden()
        {
            tracing::debug!(target: "workflow", "proceed_anyway without failed simulation; ignored");
            return;
        }
        self.tracker.override_simulation();
        self.notifier.notify(Notice::transient(
            NoticeKind::Warning,
            "Proceeding without a passing simulation",
        ));
    }

    // ---------------------------------------------------------------------
    // Stage 4: Execution
    // ---------------------------------------------------------------------

    /// Send the real transaction. Always explicit, never auto-fired.
    pub async fn execute(&mut self) -> Result<(), AppError> {
        if self.tracker.active_stage() != Stage::Execution || self.tracker.is_complete() {
            tracing::debug!(target: "workflow", "execute outside Execution stage; ignored");
            return Ok(());
        }
        let Some(hook_data) = self.hook_data() else {
            tracing::debug!(target: "workflow", "execute without compliance token; ignored");
            return Ok(());
        };

        if self.tracker.status(Stage::Execution) == StepStatus::Failed {
            self.tracker.begin(Stage::Execution);
        }

        let sent = guarded(&self.cancel.clone(), async {
            let call = self
                .action
                .build_call(&self.reader, &self.request, &hook_data)
                .await?;
            self.wallet
                .send_transaction(call.to, call.calldata, call.value)
                .await
        })
        .await;
        let hash = match sent {
            Ok(hash) => hash,
            Err(AppError::Cancelled) => return Err(AppError::Cancelled),
            Err(AppError::UserCancelled) => {
                self.notifier
                    .notify(Notice::transient(NoticeKind::Info, "Transaction cancelled"));
                return Ok(());
            }
            Err(e) => {
                self.tracker.fail(Stage::Execution);
                self.notifier.notify(Notice::transient(
                    NoticeKind::Error,
                    format!("Transaction failed to send: {}", e),
                ));
                return Ok(());
            }
        };

        let link = transaction_link(self.request.chain_id, &hash);
        self.notifier.notify(
            Notice::transient(NoticeKind::Info, "Transaction submitted").with_link(link.clone()),
        );

        let receipt = guarded(&self.cancel.clone(), self.wallet.wait_for_receipt(hash)).await;
        match receipt {
            Ok(rcpt) => {
                self.receipt = Some(ExecutionReceipt {
                    hash: rcpt.hash,
                    success: rcpt.success,
                    explorer_link: link.clone(),
                });
                if rcpt.success {
                    self.tracker.complete(Stage::Execution);
                    self.notifier.notify(
                        Notice::transient(
                            NoticeKind::Success,
                            format!("{} completed", self.action.label()),
                        )
                        .with_link(link),
                    );
                } else {
                    self.tracker.fail(Stage::Execution);
                    self.notifier.notify(
                        Notice::transient(NoticeKind::Error, "Transaction reverted")
                            .with_link(link),
                    );
                }
                Ok(())
            }
            Err(AppError::Cancelled) => Err(AppError::Cancelled),
            Err(e) => {
                self.tracker.fail(Stage::Execution);
                self.notifier.notify(
                    Notice::transient(
                        NoticeKind::Error,
                        format!("Transaction not confirmed: {}", e),
                    )
                    .with_link(link),
                );
                Ok(())
            }
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle and views
    // ---------------------------------------------------------------------

    /// Close the workflow; in-flight gateway calls resolve to `Cancelled`.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    // The provider accepts the token verbatim; unparseable blobs pass
    // through as raw bytes.
    fn hook_data(&self) -> Option<Bytes> {
        let token = self.token.as_ref()?;
        Some(match parse_hex_bytes(token) {
            Some(bytes) => Bytes::from(bytes),
            None => Bytes::from(token.clone().into_bytes()),
        })
    }

    pub fn tracker(&self) -> &StageTracker {
        &self.tracker
    }

    pub fn request(&self) -> &WorkflowRequest {
        &self.request
    }

    pub fn allowances(&self) -> &[AllowanceSnapshot] {
        &self.allowances
    }

    /// Allowances still below their required amount, indexed for `approve`.
    pub fn pending_approvals(&self) -> Vec<(usize, &AllowanceSnapshot)> {
        self.allowances
            .iter()
            .enumerate()
            .filter(|(_, snapshot)| !snapshot.satisfied())
            .collect()
    }

    pub fn simulation_error(&self) -> Option<&str> {
        self.simulation_error.as_deref()
    }

    pub fn receipt(&self) -> Option<&ExecutionReceipt> {
        self.receipt.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.tracker.is_complete()
    }
}

impl<W, R, K, A, N> Drop for Workflow<W, R, K, A, N> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
