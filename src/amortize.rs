// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::calendar::{add_months, with_day_clamped};

#[derive(Debug, Error)]
pub enum AmortizeError {
    #[error(
        "monthly payment {payment} does not cover interest {interest} on balance {balance}; the schedule cannot converge"
    )]
    NonConvergent {
        payment: Decimal,
        interest: Decimal,
        balance: Decimal,
    },
    #[error("amortization exceeded {0} installments without settling the balance")]
    IterationCap(u32),
}

/// One resolved installment of a credit's schedule.
#[derive(Debug, Clone, Serialize)]
pub struct Installment {
    pub amount: Decimal,
    pub principal: Decimal,
    pub interest: Decimal,
    /// Outstanding principal after this installment.
    pub remaining_balance: Decimal,
    pub payment_date: DateTime<Utc>,
    pub is_paid: bool,
}

pub fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / Decimal::from(100) / Decimal::from(12)
}

fn months_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let span = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    span.max(0) as u32
}

/// Simulate the declining-balance schedule from `start_date` to `end_date`,
/// pinned to `payment_day` (clamped per month). Each step pays interest on
/// the outstanding balance first; the rest of the fixed payment retires
/// principal, never more than what is outstanding. Entries dated before
/// `as_of` come back flagged paid. The loop stops early once the balance
/// reaches zero.
pub fn build_schedule(
    total_amount: Decimal,
    monthly_payment: Decimal,
    annual_rate_percent: Decimal,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    payment_day: u32,
    as_of: DateTime<Utc>,
) -> Result<Vec<Installment>, AmortizeError> {
    let rate = monthly_rate(annual_rate_percent);
    let cap = months_between(start_date, end_date) + 2;

    let mut schedule = Vec::new();
    let mut remaining = total_amount;
    let mut current = with_day_clamped(start_date, payment_day);

    while remaining > Decimal::ZERO && current <= end_date {
        if schedule.len() as u32 >= cap {
            return Err(AmortizeError::IterationCap(cap));
        }

        let interest = remaining * rate;
        if monthly_payment <= interest {
            return Err(AmortizeError::NonConvergent {
                payment: monthly_payment,
                interest,
                balance: remaining,
            });
        }

        let principal = (monthly_payment - interest).min(remaining);
        remaining -= principal;

        schedule.push(Installment {
            amount: monthly_payment,
            principal,
            interest,
            remaining_balance: remaining.max(Decimal::ZERO),
            payment_date: current,
            is_paid: current < as_of,
        });

        current = with_day_clamped(add_months(current, 1), payment_day);
    }

    Ok(schedule)
}

/// Outstanding principal of a credit opened at `start_date`, after every
/// installment that fell strictly before `as_of`. Simulates the same
/// interest/principal split as the schedule rather than assuming each
/// payment retired a full `monthly_payment` of principal.
pub fn remaining_principal(
    total_amount: Decimal,
    monthly_payment: Decimal,
    annual_rate_percent: Decimal,
    start_date: DateTime<Utc>,
    payment_day: u32,
    as_of: DateTime<Utc>,
) -> Result<Decimal, AmortizeError> {
    let rate = monthly_rate(annual_rate_percent);
    let cap = months_between(start_date, as_of) + 2;

    let mut remaining = total_amount;
    let mut current = with_day_clamped(start_date, payment_day);
    let mut steps = 0u32;

    while current < as_of && remaining > Decimal::ZERO {
        if steps >= cap {
            return Err(AmortizeError::IterationCap(cap));
        }
        steps += 1;

        let interest = remaining * rate;
        if monthly_payment <= interest {
            return Err(AmortizeError::NonConvergent {
                payment: monthly_payment,
                interest,
                balance: remaining,
            });
        }

        let principal = (monthly_payment - interest).min(remaining);
        remaining -= principal;
        current = with_day_clamped(add_months(current, 1), payment_day);
    }

    Ok(remaining.max(Decimal::ZERO))
}
