//! Fixed-point rounding rules shared by every engine.
//!
//! Rates carry 4 decimal places, percentages and averages carry 2, student
//! counts are whole numbers. All three round half away from zero, which for
//! the non-negative values handled here is round-half-up.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

pub const RATE_DP: u32 = 4;
pub const PERCENT_DP: u32 = 2;

const STRATEGY: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

pub fn round_rate(value: Decimal) -> Decimal {
    fixed(value, RATE_DP)
}

pub fn round_percent(value: Decimal) -> Decimal {
    fixed(value, PERCENT_DP)
}

/// Rounds and pads to exactly `dp` places so `1` renders as `1.0000`.
fn fixed(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, STRATEGY);
    rounded.rescale(dp);
    rounded
}

/// Rounds a fractional headcount to whole students. Negative values become 0.
pub fn round_students(value: Decimal) -> u32 {
    if value.is_sign_negative() {
        return 0;
    }
    value
        .round_dp_with_strategy(0, STRATEGY)
        .to_u32()
        .unwrap_or(u32::MAX)
}

/// `numerator / denominator` rounded as a rate, `None` when the denominator is zero.
pub fn ratio(numerator: u32, denominator: u32) -> Option<Decimal> {
    if denominator == 0 {
        return None;
    }
    Some(round_rate(
        Decimal::from(numerator) / Decimal::from(denominator),
    ))
}

/// `part / whole` expressed in percent with 2 places, 0 for an empty whole.
pub fn percent_of(part: u32, whole: u32) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    round_percent(Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole))
}
