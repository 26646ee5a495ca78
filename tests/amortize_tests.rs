// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use centime::amortize::{build_schedule, remaining_principal, AmortizeError};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn balance_declines_monotonically_to_zero() {
    let schedule = build_schedule(
        dec("10000"),
        dec("500"),
        dec("6"),
        utc(2024, 1, 1),
        utc(2026, 12, 31),
        1,
        utc(2024, 1, 1),
    )
    .unwrap();

    assert!(!schedule.is_empty());
    let mut prev = dec("10000");
    for entry in &schedule {
        assert!(entry.principal > Decimal::ZERO);
        assert!(entry.remaining_balance <= prev);
        prev = entry.remaining_balance;
    }
    let last = schedule.last().unwrap();
    assert_eq!(last.remaining_balance, Decimal::ZERO);
    assert!(last.payment_date <= utc(2026, 12, 31));
}

#[test]
fn final_installment_only_pays_what_is_outstanding() {
    // Zero-rate credit of 1000 at 300/month: three full payments and a
    // 100 remainder.
    let schedule = build_schedule(
        dec("1000"),
        dec("300"),
        Decimal::ZERO,
        utc(2024, 1, 1),
        utc(2024, 12, 31),
        1,
        utc(2024, 1, 1),
    )
    .unwrap();

    assert_eq!(schedule.len(), 4);
    assert_eq!(schedule[2].principal, dec("300"));
    assert_eq!(schedule[3].principal, dec("100"));
    assert_eq!(schedule[3].remaining_balance, Decimal::ZERO);
    assert!(schedule.iter().all(|e| e.interest == Decimal::ZERO));
}

#[test]
fn payment_dates_pin_to_day_31_with_leap_february() {
    let schedule = build_schedule(
        dec("100000"),
        dec("2000"),
        dec("3"),
        utc(2024, 1, 15),
        utc(2024, 12, 31),
        31,
        utc(2024, 1, 15),
    )
    .unwrap();

    assert_eq!(schedule[0].payment_date, utc(2024, 1, 31));
    assert_eq!(schedule[1].payment_date, utc(2024, 2, 29));
    assert_eq!(schedule[2].payment_date, utc(2024, 3, 31));
    assert_eq!(schedule[3].payment_date, utc(2024, 4, 30));
}

#[test]
fn entries_before_as_of_are_marked_paid() {
    let schedule = build_schedule(
        dec("5000"),
        dec("400"),
        dec("4"),
        utc(2024, 1, 1),
        utc(2025, 12, 31),
        5,
        utc(2024, 3, 20),
    )
    .unwrap();

    // January, February and March installments predate the as-of instant.
    assert!(schedule[0].is_paid);
    assert!(schedule[1].is_paid);
    assert!(schedule[2].is_paid);
    assert!(!schedule[3].is_paid);
}

#[test]
fn retroactive_remaining_tracks_simulated_principal_not_flat_payments() {
    // Credit opened 24 months ago: 200000 at 1200/month, 2.5% annual.
    let total = dec("200000");
    let payment = dec("1200");
    let start = utc(2024, 1, 10);
    let now = utc(2026, 1, 10);

    let remaining = remaining_principal(total, payment, dec("2.5"), start, 10, now).unwrap();

    // Reference simulation of the 24 elapsed installments.
    let rate = dec("2.5") / dec("100") / dec("12");
    let mut expected = total;
    for _ in 0..24 {
        let interest = expected * rate;
        expected -= (payment - interest).min(expected);
    }
    assert_eq!(remaining, expected);

    // Interest accrued, so strictly more is left than the flat count says.
    assert!(remaining > total - dec("24") * payment);
    assert!(remaining < total);
}

#[test]
fn future_start_leaves_principal_untouched() {
    let remaining = remaining_principal(
        dec("5000"),
        dec("400"),
        dec("4"),
        utc(2030, 1, 1),
        1,
        utc(2024, 1, 1),
    )
    .unwrap();
    assert_eq!(remaining, dec("5000"));
}

#[test]
fn payment_below_interest_is_rejected() {
    // 50% annual on 10000 accrues ~416/month; a 10/month payment can never
    // retire the balance.
    let err = build_schedule(
        dec("10000"),
        dec("10"),
        dec("50"),
        utc(2024, 1, 1),
        utc(2034, 1, 1),
        1,
        utc(2024, 1, 1),
    )
    .unwrap_err();
    assert!(matches!(err, AmortizeError::NonConvergent { .. }));

    let err = remaining_principal(
        dec("10000"),
        dec("10"),
        dec("50"),
        utc(2020, 1, 1),
        1,
        utc(2024, 1, 1),
    )
    .unwrap_err();
    assert!(matches!(err, AmortizeError::NonConvergent { .. }));
}
