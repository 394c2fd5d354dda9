// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::providers::Provider;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dexflow::app::config::{GlobalSettings, PoolSettings};
use dexflow::app::logging::setup_logging;
use dexflow::common::parsing::{format_units, parse_units};
use dexflow::domain::error::AppError;
use dexflow::domain::model::{RequestPayload, SwapKind, TokenInfo, WorkflowRequest};
use dexflow::infrastructure::compliance::HttpComplianceClient;
use dexflow::infrastructure::network::contracts::{ContractReader, RpcContractReader};
use dexflow::infrastructure::network::provider::ConnectionFactory;
use dexflow::infrastructure::network::wallet::{LocalWallet, WalletProvider};
use dexflow::services::price::{MAX_TICK, MIN_TICK, nearest_usable_tick, parse_fee};
use dexflow::services::quote::QuoteService;
use dexflow::services::workflow::{
    LiquidityAction, LogNotifier, Stage, StageAction, StepStatus, SwapAction, Workflow,
    WorkflowSettings,
};
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(author, version, about = "compliance-gated dex workflows")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Quote a single-hop swap without touching the wallet
    Quote {
        /// Pool, by index or "SYM/SYM" pair
        #[arg(long)]
        pool: String,
        /// Exact-side token symbol
        #[arg(long)]
        token: String,
        /// Human amount of the exact token, e.g. "1.5"
        #[arg(long)]
        amount: String,
        /// Treat the amount as exact output instead of exact input
        #[arg(long, default_value_t = false)]
        exact_out: bool,
    },
    /// Run a swap through the full workflow
    Swap {
        #[arg(long)]
        pool: String,
        /// Input token symbol (output when --exact-out)
        #[arg(long)]
        token: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value_t = false)]
        exact_out: bool,
        /// Override configured slippage, in basis points
        #[arg(long)]
        slippage_bps: Option<u64>,
        /// Stop after simulation; never broadcast
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Execute even if the simulation fails
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Add liquidity through the full workflow
    AddLiquidity {
        #[arg(long)]
        pool: String,
        /// Exact-side token symbol; the counter amount is derived on-chain
        #[arg(long)]
        token: String,
        #[arg(long)]
        amount: String,
        /// Lower tick (default: full range, rounded to the pool spacing)
        #[arg(long)]
        tick_lower: Option<i32>,
        /// Upper tick (default: full range, rounded to the pool spacing)
        #[arg(long)]
        tick_upper: Option<i32>,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(if settings.debug { "debug" } else { "info" }, cli.json_logs);

    let provider = ConnectionFactory::http(&settings.http_provider)?;
    let chain_id = match settings.chain_id {
        Some(id) => id,
        None => provider
            .get_chain_id()
            .await
            .context("Could not resolve chain id from RPC")?,
    };
    let reader = RpcContractReader::new(provider);
    let quotes = QuoteService::new(
        reader.clone(),
        settings.quoter,
        settings.liquidity_helper,
        settings.pool_manager_viewer,
    );

    match cli.command {
        Command::Quote {
            pool,
            token,
            amount,
            exact_out,
        } => {
            let pool = settings.find_pool(&pool)?.clone();
            let token = settings.find_token(&pool, &token)?.clone();
            quote(&quotes, &pool, &token, &amount, exact_out).await
        }
        Command::Swap {
            pool,
            token,
            amount,
            exact_out,
            slippage_bps,
            dry_run,
            force,
        } => {
            let pool = settings.find_pool(&pool)?.clone();
            let token = settings.find_token(&pool, &token)?.clone();
            let wallet = connect_wallet(&settings)?;
            let request = build_swap_request(
                &settings, &quotes, &pool, &token, &amount, exact_out, slippage_bps, chain_id,
                wallet.address(),
            )
            .await?;

            let flow = Workflow::open(
                wallet,
                reader.clone(),
                compliance_client(&settings)?,
                SwapAction,
                LogNotifier,
                workflow_settings(&settings),
                request,
            )
            .await?;
            drive(flow, dry_run, force).await
        }
        Command::AddLiquidity {
            pool,
            token,
            amount,
            tick_lower,
            tick_upper,
            dry_run,
            force,
        } => {
            let pool = settings.find_pool(&pool)?.clone();
            let token = settings.find_token(&pool, &token)?.clone();
            let wallet = connect_wallet(&settings)?;
            let request = build_liquidity_request(
                &settings, &quotes, &pool, &token, &amount, tick_lower, tick_upper, chain_id,
                wallet.address(),
            )
            .await?;

            let flow = Workflow::open(
                wallet,
                reader.clone(),
                compliance_client(&settings)?,
                LiquidityAction,
                LogNotifier,
                workflow_settings(&settings),
                request,
            )
            .await?;
            drive(flow, dry_run, force).await
        }
    }
}

fn connect_wallet(settings: &GlobalSettings) -> Result<LocalWallet, AppError> {
    let signer = PrivateKeySigner::from_str(&settings.wallet_key)
        .map_err(|e| AppError::Config(format!("Invalid wallet key: {}", e)))?;
    LocalWallet::connect(
        &settings.http_provider,
        signer,
        settings.receipt_poll_interval(),
        settings.receipt_timeout(),
    )
}

fn compliance_client(settings: &GlobalSettings) -> Result<HttpComplianceClient, AppError> {
    HttpComplianceClient::new(
        settings.verify_url.clone(),
        settings.kyc_dashboard_url.clone().unwrap_or_default(),
        settings.verify_timeout(),
    )
}

fn workflow_settings(settings: &GlobalSettings) -> WorkflowSettings {
    WorkflowSettings {
        approval_policy: settings.approval_policy(),
        min_loading: settings.min_loading_floor(),
    }
}

async fn quote(
    quotes: &QuoteService<RpcContractReader>,
    pool: &PoolSettings,
    token: &TokenInfo,
    amount: &str,
    exact_out: bool,
) -> anyhow::Result<()> {
    let info = pool.pool_info();
    let slot0 = quotes.slot0(pool.id).await?;
    let kind = if exact_out {
        SwapKind::ExactOut
    } else {
        SwapKind::ExactIn
    };
    let exact_amount = parse_units(amount, token.decimals)?;

    let other = if token.address == pool.token0.address {
        &pool.token1
    } else {
        &pool.token0
    };
    let (token_in, token_out) = if exact_out {
        (other, token)
    } else {
        (token, other)
    };

    let result = quotes
        .quote_exact_single(kind, &info, &slot0, token, exact_amount, Default::default())
        .await?;

    println!(
        "{} {} -> {} {} (pool fee {:.4}%, gas estimate {})",
        format_units(result.amount_in, token_in.decimals),
        token_in.symbol,
        format_units(result.amount_out, token_out.decimals),
        token_out.symbol,
        parse_fee(slot0.swap_fee) * 100.0,
        result.gas_estimate,
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn build_swap_request(
    settings: &GlobalSettings,
    quotes: &QuoteService<RpcContractReader>,
    pool: &PoolSettings,
    token: &TokenInfo,
    amount: &str,
    exact_out: bool,
    slippage_bps: Option<u64>,
    chain_id: u64,
    sender: alloy::primitives::Address,
) -> anyhow::Result<WorkflowRequest> {
    let info = pool.pool_info();
    let slot0 = quotes.slot0(pool.id).await?;
    let exact_amount = parse_units(amount, token.decimals)?;
    let kind = if exact_out {
        SwapKind::ExactOut
    } else {
        SwapKind::ExactIn
    };

    // Freeze both sides now; the quote taken here is the one the workflow
    // simulates and executes against.
    let quoted = quotes
        .quote_exact_single(kind, &info, &slot0, token, exact_amount, Default::default())
        .await?;

    let other = if token.address == pool.token0.address {
        pool.token1.clone()
    } else {
        pool.token0.clone()
    };
    let (token_in, token_out) = if exact_out {
        (other, token.clone())
    } else {
        (token.clone(), other)
    };

    tracing::info!(
        target: "workflow",
        amount_in = %format_units(quoted.amount_in, token_in.decimals),
        token_in = %token_in.symbol,
        amount_out = %format_units(quoted.amount_out, token_out.decimals),
        token_out = %token_out.symbol,
        "Opening swap workflow"
    );

    Ok(WorkflowRequest {
        sender,
        chain_id,
        router: settings.swap_router,
        pool: info,
        slot0,
        slippage_bps: slippage_bps.unwrap_or(settings.slippage_bps),
        payload: RequestPayload::Swap {
            kind,
            token_in,
            token_out,
            amount_in: quoted.amount_in,
            amount_out: quoted.amount_out,
        },
    })
}

#[allow(clippy::too_many_arguments)]
async fn build_liquidity_request(
    settings: &GlobalSettings,
    quotes: &QuoteService<RpcContractReader>,
    pool: &PoolSettings,
    token: &TokenInfo,
    amount: &str,
    tick_lower: Option<i32>,
    tick_upper: Option<i32>,
    chain_id: u64,
    sender: alloy::primitives::Address,
) -> anyhow::Result<WorkflowRequest> {
    let info = pool.pool_info();
    let slot0 = quotes.slot0(pool.id).await?;
    let exact_amount = parse_units(amount, token.decimals)?;

    let lower = nearest_usable_tick(tick_lower.unwrap_or(MIN_TICK), pool.tick_spacing);
    let upper = nearest_usable_tick(tick_upper.unwrap_or(MAX_TICK), pool.tick_spacing);
    if lower >= upper {
        bail!("Tick range [{}, {}] is empty after rounding", lower, upper);
    }

    let (token0, token1) = info.sorted_tokens();
    let exact_token0 = token.address == token0.address;
    let amounts = quotes
        .calculate_amounts(exact_token0, &slot0, exact_amount, lower, upper)
        .await;
    let counter_amount = if exact_token0 {
        amounts.amount1
    } else {
        amounts.amount0
    };
    if counter_amount.is_zero() && !exact_amount.is_zero() {
        bail!("Counter amount came back zero; range may be out of reach of the current price");
    }

    let other = if exact_token0 {
        token1.clone()
    } else {
        token0.clone()
    };
    tracing::info!(
        target: "workflow",
        left = %format!("{} {}", format_units(exact_amount, token.decimals), token.symbol),
        right = %format!("{} {}", format_units(counter_amount, other.decimals), other.symbol),
        tick_lower = lower,
        tick_upper = upper,
        "Opening liquidity workflow"
    );

    Ok(WorkflowRequest {
        sender,
        chain_id,
        router: settings.liquidity_router,
        pool: info.clone(),
        slot0,
        slippage_bps: settings.slippage_bps,
        payload: RequestPayload::Liquidity {
            left_token: token.clone(),
            right_token: other,
            left_amount: exact_amount,
            right_amount: counter_amount,
            tick_lower: lower,
            tick_upper: upper,
        },
    })
}

/// Walk a freshly opened workflow to completion. The library pauses at each
/// user decision; the CLI stands in for the user and always says yes, except
/// where --dry-run or a failed simulation without --force stops it.
async fn drive<W, R, K, A>(
    mut flow: Workflow<W, R, K, A, LogNotifier>,
    dry_run: bool,
    force: bool,
) -> anyhow::Result<()>
where
    W: WalletProvider,
    R: ContractReader,
    K: dexflow::infrastructure::compliance::ComplianceGateway,
    A: StageAction,
{
    if flow.tracker().status(Stage::Allowance) == StepStatus::Failed {
        bail!("Allowance check failed; see log for details");
    }
    let pending: Vec<usize> = flow.pending_approvals().iter().map(|(i, _)| *i).collect();
    for index in pending {
        flow.approve(index).await?;
    }
    if flow.tracker().active_stage() == Stage::Allowance {
        bail!("Token approvals incomplete");
    }

    // Sign rolls into verification, which rolls into simulation.
    flow.sign().await?;
    if flow.tracker().status(Stage::Compliance) != StepStatus::Done {
        bail!("Compliance verification did not complete");
    }

    if flow.tracker().status(Stage::Simulation) == StepStatus::Failed {
        let reason = flow.simulation_error().unwrap_or("unknown").to_string();
        if dry_run {
            println!("Simulation failed: {}", reason);
            return Ok(());
        }
        if !force {
            bail!("Simulation failed: {} (re-run with --force to override)", reason);
        }
        flow.proceed_anyway();
    } else if dry_run {
        println!("Simulation passed; skipping execution (--dry-run)");
        return Ok(());
    }

    flow.execute().await?;
    match flow.receipt() {
        Some(receipt) if receipt.success => {
            println!("Confirmed: {}", receipt.explorer_link);
            Ok(())
        }
        Some(receipt) => bail!("Transaction reverted: {}", receipt.explorer_link),
        None => bail!("Transaction was not confirmed"),
    }
}
