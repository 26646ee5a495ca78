// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use centime::calendar::{
    add_months, add_years, clamp_day_of_month, days_until, with_day_clamped,
};
use chrono::{DateTime, TimeZone, Utc};

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

#[test]
fn clamp_handles_short_months() {
    assert_eq!(clamp_day_of_month(2024, 2, 31), 29); // leap year
    assert_eq!(clamp_day_of_month(2023, 2, 30), 28);
    assert_eq!(clamp_day_of_month(2024, 4, 31), 30);
    assert_eq!(clamp_day_of_month(2024, 1, 15), 15);
}

#[test]
fn add_months_clamps_day_overflow() {
    assert_eq!(add_months(utc(2024, 1, 31), 1), utc(2024, 2, 29));
    assert_eq!(add_months(utc(2023, 1, 31), 1), utc(2023, 2, 28));
    assert_eq!(add_months(utc(2024, 3, 31), -1), utc(2024, 2, 29));
}

#[test]
fn add_months_rolls_over_years() {
    assert_eq!(add_months(utc(2024, 12, 15), 1), utc(2025, 1, 15));
    assert_eq!(add_months(utc(2024, 11, 30), 3), utc(2025, 2, 28));
    assert_eq!(add_months(utc(2024, 1, 15), -1), utc(2023, 12, 15));
}

#[test]
fn add_months_preserves_time_of_day() {
    let dt = Utc.with_ymd_and_hms(2024, 5, 10, 7, 30, 45).unwrap();
    let next = add_months(dt, 1);
    assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 10, 7, 30, 45).unwrap());
}

#[test]
fn add_years_handles_leap_day() {
    assert_eq!(add_years(utc(2024, 2, 29), 1), utc(2025, 2, 28));
    assert_eq!(add_years(utc(2024, 2, 29), 4), utc(2028, 2, 29));
}

#[test]
fn with_day_clamped_pins_within_month() {
    assert_eq!(with_day_clamped(utc(2024, 4, 2), 31), utc(2024, 4, 30));
    assert_eq!(with_day_clamped(utc(2024, 2, 10), 31), utc(2024, 2, 29));
    assert_eq!(with_day_clamped(utc(2024, 7, 10), 5), utc(2024, 7, 5));
}

#[test]
fn days_until_counts_whole_days() {
    let now = utc(2024, 6, 1);
    assert_eq!(days_until(utc(2024, 6, 4), now), 3);
    assert_eq!(days_until(utc(2024, 6, 1), now), 0);
    assert_eq!(days_until(utc(2024, 5, 30), now), -2); // overdue
}
