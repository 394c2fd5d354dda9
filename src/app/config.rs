// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants;
use crate::domain::error::AppError;
use crate::domain::model::{PoolInfo, TokenInfo};
use alloy::primitives::{Address, B256};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// How much an approval transaction asks for. Both policies exist in the
/// wild; unlimited (approve-once-forever) is the default here and the
/// exact-amount variant is opt-in per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalPolicy {
    Unlimited,
    Exact,
}

impl ApprovalPolicy {
    fn from_config(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "exact" | "exact_amount" | "exact-amount" => Self::Exact,
            _ => Self::Unlimited,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PoolSettings {
    pub id: B256,
    pub hook: Address,
    pub tick_spacing: i32,
    #[serde(default = "default_swap_rule_id")]
    pub swap_rule_id: String,
    #[serde(default = "default_liquidity_rule_id")]
    pub liquidity_rule_id: String,
    pub token0: TokenInfo,
    pub token1: TokenInfo,
}

impl PoolSettings {
    pub fn pool_info(&self) -> PoolInfo {
        PoolInfo {
            token0: self.token0.clone(),
            token1: self.token1.clone(),
            hook: self.hook,
            tick_spacing: self.tick_spacing,
            swap_rule_id: self.swap_rule_id.clone(),
            liquidity_rule_id: self.liquidity_rule_id.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    pub chain_id: Option<u64>,

    // RPC
    pub http_provider: String,

    // Identity
    pub wallet_key: String,

    // Workflow behavior
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u64,
    #[serde(default = "default_approval_policy")]
    pub approval_policy: String, // "unlimited" or "exact"
    #[serde(default = "default_min_loading_ms")]
    pub min_loading_ms: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,

    // Compliance provider
    pub verify_url: String,
    pub kyc_dashboard_url: Option<String>,
    #[serde(default = "default_verify_timeout_ms")]
    pub verify_timeout_ms: u64,

    // Contracts
    pub swap_router: Address,
    pub liquidity_router: Address,
    pub quoter: Address,
    pub liquidity_helper: Address,
    pub pool_manager_viewer: Address,
    #[serde(default)]
    pub pools: Vec<PoolSettings>,
}

// Defaults
fn default_debug() -> bool {
    false
}
fn default_slippage_bps() -> u64 {
    constants::DEFAULT_SLIPPAGE_BPS
}
fn default_approval_policy() -> String {
    "unlimited".to_string()
}
fn default_min_loading_ms() -> u64 {
    200
}
fn default_receipt_poll_ms() -> u64 {
    2_000
}
fn default_receipt_timeout_ms() -> u64 {
    120_000
}
fn default_verify_timeout_ms() -> u64 {
    30_000
}
fn default_swap_rule_id() -> String {
    constants::DEFAULT_SWAP_RULE_ID.to_string()
}
fn default_liquidity_rule_id() -> String {
    constants::DEFAULT_LIQUIDITY_RULE_ID.to_string()
}

impl GlobalSettings {
    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = Config::builder();
        builder = match path {
            Some(explicit) => builder.add_source(File::with_name(explicit)),
            None => builder.add_source(File::with_name("config").required(false)),
        };
        let cfg = builder
            .add_source(Environment::with_prefix("DEXFLOW").separator("__"))
            .build()?;

        let settings: GlobalSettings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.http_provider.trim().is_empty() {
            return Err(AppError::Config("http_provider must not be empty".into()));
        }
        if self.verify_url.trim().is_empty() {
            return Err(AppError::Config("verify_url must not be empty".into()));
        }
        if self.slippage_bps > 10_000 {
            return Err(AppError::Config(format!(
                "slippage_bps {} exceeds 100%",
                self.slippage_bps
            )));
        }
        Ok(())
    }

    pub fn approval_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::from_config(&self.approval_policy)
    }

    pub fn min_loading_floor(&self) -> Duration {
        Duration::from_millis(self.min_loading_ms)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms.max(1))
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms.max(1))
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms.max(1))
    }

    pub fn find_pool(&self, name_or_index: &str) -> Result<&PoolSettings, AppError> {
        if let Ok(idx) = name_or_index.parse::<usize>() {
            return self.pools.get(idx).ok_or_else(|| {
                AppError::Config(format!("No pool at index {}", idx))
            });
        }
        let wanted = name_or_index.to_uppercase();
        self.pools
            .iter()
            .find(|p| {
                format!("{}/{}", p.token0.symbol, p.token1.symbol).to_uppercase() == wanted
                    || format!("{}/{}", p.token1.symbol, p.token0.symbol).to_uppercase() == wanted
            })
            .ok_or_else(|| AppError::Config(format!("Unknown pool {}", name_or_index)))
    }

    pub fn find_token<'a>(
        &self,
        pool: &'a PoolSettings,
        symbol: &str,
    ) -> Result<&'a TokenInfo, AppError> {
        let wanted = symbol.to_uppercase();
        if pool.token0.symbol.to_uppercase() == wanted {
            Ok(&pool.token0)
        } else if pool.token1.symbol.to_uppercase() == wanted {
            Ok(&pool.token1)
        } else {
            Err(AppError::Config(format!(
                "Token {} is not part of pool {}/{}",
                symbol, pool.token0.symbol, pool.token1.symbol
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_policy_parses_both_variants() {
        assert_eq!(
            ApprovalPolicy::from_config("exact"),
            ApprovalPolicy::Exact
        );
        assert_eq!(
            ApprovalPolicy::from_config("exact-amount"),
            ApprovalPolicy::Exact
        );
        assert_eq!(
            ApprovalPolicy::from_config("unlimited"),
            ApprovalPolicy::Unlimited
        );
        // Unknown values fall back to the default policy.
        assert_eq!(
            ApprovalPolicy::from_config("whatever"),
            ApprovalPolicy::Unlimited
        );
    }
}
