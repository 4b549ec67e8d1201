//! Overdue-day derivation and tiered late-fee computation.
//!
//! The fee schedule is $0.50/day for the first 7 overdue days and $1.00/day
//! after that, capped at $15.00. With those rates the cap is first reached at
//! 19 overdue days (7 * 0.50 + 12 * 1.00 = 15.50, capped).
//!
//! Everything here is a pure function of calendar dates; time-of-day and
//! timezone never affect the result beyond the UTC date they fall on.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Standard loan period in days; due date = borrow date + this.
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Length of the cheaper first fee tier, in overdue days.
pub const FIRST_TIER_DAYS: i64 = 7;

/// Daily rate for the first tier, in dollars.
pub const FIRST_TIER_RATE: f64 = 0.50;

/// Daily rate past the first tier, in dollars.
pub const SECOND_TIER_RATE: f64 = 1.00;

/// Maximum fee per loan, in dollars.
pub const FEE_CAP: f64 = 15.00;

/// Outcome of a fee assessment for a single loan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeResult {
    /// Whole calendar days past due, floored at zero.
    pub days_overdue: i64,

    /// Accrued fee in dollars, rounded to 2 decimals, in [0.00, FEE_CAP].
    pub fee_amount: f64,
}

/// Whole calendar days between the due date and the reference date,
/// floored at zero. Date-only: a loan due at 23:59 is not overdue until
/// the following calendar day.
pub fn days_overdue(due: DateTime<Utc>, reference: DateTime<Utc>) -> i64 {
    (reference.date_naive() - due.date_naive()).num_days().max(0)
}

/// Fee for a given number of overdue days.
///
/// Deterministic function of `days_overdue` only: zero days is free, the
/// first [`FIRST_TIER_DAYS`] days accrue at [`FIRST_TIER_RATE`], the rest at
/// [`SECOND_TIER_RATE`], capped at [`FEE_CAP`] and rounded to 2 decimals.
pub fn fee_for_days(days_overdue: i64) -> f64 {
    if days_overdue <= 0 {
        return 0.0;
    }
    let first = days_overdue.min(FIRST_TIER_DAYS) as f64;
    let rest = (days_overdue - FIRST_TIER_DAYS).max(0) as f64;
    round_currency((first * FIRST_TIER_RATE + rest * SECOND_TIER_RATE).min(FEE_CAP))
}

/// Assess a loan against a reference date: the return date for closed loans,
/// "now" for active ones.
pub fn assess(due: DateTime<Utc>, reference: DateTime<Utc>) -> FeeResult {
    let days = days_overdue(due, reference);
    FeeResult {
        days_overdue: days,
        fee_amount: fee_for_days(days),
    }
}

/// Round a dollar amount to 2 decimal places.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
