//! Fixed-point conversions between human token amounts and 18-decimal base
//! units.

use crate::constants::{MAX_REWARD_WEI, WEI_PER_CENT, WEI_PER_TOKEN};
use crate::error::AmountError;

/// Parses a catalog reward such as `"0.10"` into base units.
///
/// Accepts at most two decimal places, rejects zero and anything above
/// 10 tokens.
pub fn parse_token_amount(value: &str) -> Result<u128, AmountError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AmountError::Empty);
    }
    let malformed = || AmountError::Malformed {
        value: value.to_string(),
    };

    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(malformed());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(malformed());
    }
    if fraction.len() > 2 {
        return Err(AmountError::TooManyDecimals {
            value: value.to_string(),
        });
    }

    let whole_tokens: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| malformed())?
    };
    let cents: u128 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<u128>().map_err(|_| malformed())? * 10,
        _ => fraction.parse().map_err(|_| malformed())?,
    };

    let wei = whole_tokens
        .checked_mul(WEI_PER_TOKEN)
        .and_then(|wei| wei.checked_add(cents * WEI_PER_CENT))
        .ok_or_else(|| AmountError::AboveMaximum {
            value: value.to_string(),
        })?;
    if wei == 0 {
        return Err(AmountError::NotPositive);
    }
    if wei > MAX_REWARD_WEI {
        return Err(AmountError::AboveMaximum {
            value: value.to_string(),
        });
    }
    Ok(wei)
}

/// Formats base units as a token amount rounded half-up to two decimals.
pub fn format_token_amount_2dp(wei: u128) -> String {
    let cents = wei / WEI_PER_CENT + u128::from(wei % WEI_PER_CENT >= WEI_PER_CENT / 2);
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Exact decimal rendering with trailing zeros trimmed, e.g. `"0.1"`.
pub fn format_token_amount(wei: u128) -> String {
    let whole = wei / WEI_PER_TOKEN;
    let fraction = wei % WEI_PER_TOKEN;
    if fraction == 0 {
        return format!("{whole}.0");
    }
    let digits = format!("{fraction:018}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
