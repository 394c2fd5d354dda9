// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::{
    DEFAULT_BALANCE_DECIMALS, DEFAULT_PRICE_DECIMALS, FEE_DIVIDER, MIN_DISPLAY_BALANCE,
};
use crate::domain::model::Slot0;
use alloy::primitives::U256;

/// Tick base: each tick moves price by one hundredth of a percent.
const BASE: f64 = 1.0001;

/// Tick bounds of the pool manager's sqrt-price range.
pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

const Q96: f64 = 79_228_162_514_264_337_593_543_950_336.0; // 2^96

/// Float-precision display math. Exact amounts always come from contract
/// reads; these helpers only drive quotes, range pickers and formatting.
pub fn u256_to_f64(value: U256) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0)
}

pub fn price_by_sqrt_x96(sqrt_price_x96: U256, decimals0: u8, decimals1: u8) -> f64 {
    let ratio = u256_to_f64(sqrt_price_x96) / Q96;
    ratio * ratio / 10f64.powi(decimals1 as i32 - decimals0 as i32)
}

pub fn price_by_tick(tick: i32, decimals0: u8, decimals1: u8) -> f64 {
    BASE.powi(tick) / 10f64.powi(decimals1 as i32 - decimals0 as i32)
}

pub fn price_by_slot0(slot0: &Slot0, decimals0: u8, decimals1: u8) -> f64 {
    price_by_tick(slot0.tick, decimals0, decimals1)
}

fn tick_by_price(price: f64, decimals0: u8, decimals1: u8) -> i32 {
    let raw = price * 10f64.powi(decimals1 as i32 - decimals0 as i32);
    (raw.ln() / BASE.ln()).round() as i32
}

/// Round a tick to the nearest multiple of `tick_spacing`, clamped to the
/// usable range.
pub fn nearest_usable_tick(tick: i32, tick_spacing: i32) -> i32 {
    let spacing = tick_spacing.max(1);
    let rounded = ((tick as f64 / spacing as f64).round() as i32) * spacing;
    let lowest = (MIN_TICK + spacing - 1).div_euclid(spacing) * spacing;
    let highest = MAX_TICK.div_euclid(spacing) * spacing;
    rounded.clamp(lowest, highest)
}

/// Snap a user-entered price to the nearest usable tick; returns the
/// corrected price together with that tick.
pub fn correct_price(
    price: f64,
    tick_spacing: i32,
    decimals0: u8,
    decimals1: u8,
) -> (f64, i32) {
    let candidate = tick_by_price(price, decimals0, decimals1);
    let tick = nearest_usable_tick(candidate, tick_spacing);
    (price_by_tick(tick, decimals0, decimals1), tick)
}

pub fn correct_tick(tick: i32, tick_spacing: i32, decimals0: u8, decimals1: u8) -> (f64, i32) {
    let usable = nearest_usable_tick(tick, tick_spacing);
    (price_by_tick(usable, decimals0, decimals1), usable)
}

/// Slippage delta over an exact value: `value * slippage_bps / 10_000`.
pub fn calculate_delta(value: U256, slippage_bps: u64) -> U256 {
    value * U256::from(slippage_bps) / U256::from(10_000u64)
}

/// Worst acceptable sqrt price for a swap direction: selling currency0
/// pushes the price down, so the limit sits below spot; the other
/// direction sits above.
pub fn sqrt_price_limit(sqrt_price_x96: U256, slippage_bps: u64, zero_for_one: bool) -> U256 {
    let delta = calculate_delta(sqrt_price_x96, slippage_bps);
    if zero_for_one {
        sqrt_price_x96.saturating_sub(delta)
    } else {
        sqrt_price_x96.saturating_add(delta)
    }
}

pub fn format_price(price: f64) -> f64 {
    let scale = 10f64.powi(DEFAULT_PRICE_DECIMALS as i32);
    (price * scale).round() / scale
}

pub fn format_balance(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.abs() < MIN_DISPLAY_BALANCE {
        return format!("<{}", MIN_DISPLAY_BALANCE);
    }
    let rounded = format!("{:.*}", DEFAULT_BALANCE_DECIMALS, value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// Fee units (hundredths of a bip) to a fraction.
pub fn parse_fee(fee: u32) -> f64 {
    fee as f64 / FEE_DIVIDER
}
