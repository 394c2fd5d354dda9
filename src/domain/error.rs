// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

/// Application-wide error taxonomy. Gateway adapters classify raw wallet,
/// RPC and compliance failures into these variants at the boundary, so the
/// workflow controller only ever matches on variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    /// Transient network/read failure. Manually retryable.
    #[error("RPC call failed: {0}")]
    Rpc(String),

    /// The user declined a wallet signature or transaction prompt.
    /// Non-fatal: surfaced as a transient notice, never as a stage failure.
    #[error("User rejected the request")]
    UserCancelled,

    /// Compliance provider requires the wallet to finish onboarding
    /// elsewhere. Not retryable within the workflow; offers navigation.
    #[error("Compliance verification required: {message}")]
    ComplianceActionRequired { message: String, redirect: String },

    /// Any other compliance refusal. Retryable with the same signed payload.
    #[error("Compliance denied: {0}")]
    ComplianceDenied(String),

    #[error("Simulation reverted: {0}")]
    SimulationReverted(String),

    #[error("Transaction reverted: {0}")]
    ExecutionReverted(String),

    #[error("{0} timed out")]
    TimedOut(String),

    /// The workflow was closed while a request was in flight.
    #[error("Workflow cancelled")]
    Cancelled,
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Wallet adapters call this to split user rejections from real
    /// failures. Provider error shapes differ, so matching on message
    /// content is confined to this single boundary.
    pub fn from_wallet_failure(message: impl AsRef<str>) -> Self {
        let msg = message.as_ref();
        let lower = msg.to_lowercase();
        if lower.contains("user rejected") || lower.contains("user denied") {
            AppError::UserCancelled
        } else {
            AppError::Rpc(msg.to_string())
        }
    }
}
