// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Project a desired day-of-month onto a concrete month: days that do not
/// exist clamp to the month's last day (31 in April reads as 30).
pub fn clamp_day_of_month(year: i32, month: u32, day: u32) -> u32 {
    day.min(days_in_month(year, month)).max(1)
}

pub fn add_days(date: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    date + Duration::days(days)
}

/// Calendar-aware month addition. The day-of-month clamps when the target
/// month is shorter (Jan 31 + 1 month = Feb 28/29); time of day is kept.
pub fn add_months(date: DateTime<Utc>, months: i32) -> DateTime<Utc> {
    let total = date.month() as i32 + months;
    let year = date.year() + (total - 1).div_euclid(12);
    let month = ((total - 1).rem_euclid(12) + 1) as u32;
    let day = clamp_day_of_month(year, month, date.day());

    // Clamped components are always constructible.
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(date.hour(), date.minute(), date.second())
        .unwrap();
    Utc.from_utc_datetime(&naive)
}

pub fn add_years(date: DateTime<Utc>, years: i32) -> DateTime<Utc> {
    add_months(date, years * 12)
}

/// Move `date` to `day` within its own month, clamped; time of day is kept.
pub fn with_day_clamped(date: DateTime<Utc>, day: u32) -> DateTime<Utc> {
    let clamped = clamp_day_of_month(date.year(), date.month(), day);
    let naive = NaiveDate::from_ymd_opt(date.year(), date.month(), clamped)
        .unwrap()
        .and_hms_opt(date.hour(), date.minute(), date.second())
        .unwrap();
    Utc.from_utc_datetime(&naive)
}

/// Whole days from `now` until `target`, comparing at day granularity.
/// Negative means overdue.
pub fn days_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    target
        .date_naive()
        .signed_duration_since(now.date_naive())
        .num_days()
}
