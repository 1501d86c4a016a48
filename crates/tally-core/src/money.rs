//! Parsing and formatting of free-text currency amounts.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tally_domain::Money;

use crate::error::{CoreError, CoreResult};

pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";
const DISPLAY_PLACES: u32 = 2;

/// Largest magnitude a stored amount may have: one quadrillion.
pub const MAX_AMOUNT: Money = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.\-]+").expect("valid amount strip pattern"));
static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?)(\d*)(?:\.(\d+))?").expect("valid amount prefix pattern"));

/// An amount as it arrives from a form field: typed text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(value: String) -> Self {
        RawAmount::Text(value)
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        RawAmount::Number(value as f64)
    }
}

/// Coerces text or a number into [`Money`]. Never fails: anything that does
/// not start with a number once symbols and separators are stripped is zero.
pub fn parse_amount(input: impl Into<RawAmount>) -> Money {
    match input.into() {
        RawAmount::Number(value) if value.is_finite() => {
            Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
        }
        RawAmount::Number(_) => Decimal::ZERO,
        RawAmount::Text(text) => parse_text(&text),
    }
}

fn parse_text(text: &str) -> Money {
    let stripped = NON_NUMERIC.replace_all(text, "");
    let Some(captures) = LEADING_NUMBER.captures(&stripped) else {
        return Decimal::ZERO;
    };
    let sign = captures.get(1).map_or("", |m| m.as_str());
    let whole = captures.get(2).map_or("", |m| m.as_str());
    let fraction = captures.get(3).map(|m| m.as_str());
    if whole.is_empty() && fraction.is_none() {
        return Decimal::ZERO;
    }
    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = match fraction {
        Some(fraction) => format!("{sign}{whole}.{fraction}"),
        None => format!("{sign}{whole}"),
    };
    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

/// Rejects amounts whose magnitude exceeds [`MAX_AMOUNT`].
pub fn ensure_amount_in_range(amount: Money) -> CoreResult<Money> {
    if amount.abs() > MAX_AMOUNT {
        return Err(CoreError::Validation(format!(
            "Amount {amount} is out of range (limit {MAX_AMOUNT})"
        )));
    }
    Ok(amount)
}

/// `part / whole * 100`, saturating at the decimal bounds. `None` when `whole` is zero.
pub fn percent_of(part: Money, whole: Money) -> Option<Decimal> {
    if whole.is_zero() {
        return None;
    }
    let bound = if part.is_sign_negative() == whole.is_sign_negative() {
        Decimal::MAX
    } else {
        Decimal::MIN
    };
    let percent = part
        .checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(bound);
    Some(percent)
}

/// Rounds to cents, halves away from zero.
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(DISPLAY_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats with the default `$` symbol, e.g. `$1,234.50` or `-$5.00`.
pub fn format_amount(value: Money) -> String {
    format_amount_with(value, DEFAULT_CURRENCY_SYMBOL)
}

pub fn format_amount_with(value: Money, symbol: &str) -> String {
    let rounded = round_money(value);
    let mut magnitude = rounded.abs();
    magnitude.rescale(DISPLAY_PLACES);
    let digits = magnitude.to_string();
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{symbol}{}.{fraction}", group_thousands(whole))
}

fn group_thousands(whole: &str) -> String {
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats money for presentation.
pub trait AmountFormatter: Send + Sync {
    fn format_amount(&self, amount: Money) -> String;
}

/// Prefixes amounts with a fixed currency symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolFormatter {
    symbol: String,
}

impl SymbolFormatter {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

impl Default for SymbolFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_SYMBOL)
    }
}

impl AmountFormatter for SymbolFormatter {
    fn format_amount(&self, amount: Money) -> String {
        format_amount_with(amount, &self.symbol)
    }
}
