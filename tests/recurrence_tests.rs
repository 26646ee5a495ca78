// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use centime::recurrence::{first_occurrence_from_day, next_occurrence, Frequency};
use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

#[test]
fn daily_weekly_biweekly_are_fixed_strides() {
    let start = utc(2024, 1, 1);
    assert_eq!(next_occurrence(start, Frequency::Daily, None), utc(2024, 1, 2));
    assert_eq!(next_occurrence(start, Frequency::Weekly, None), utc(2024, 1, 8));
    assert_eq!(
        next_occurrence(start, Frequency::Biweekly, None),
        utc(2024, 1, 15)
    );
}

#[test]
fn monthly_day31_lands_on_last_valid_day_every_month() {
    // A day-31 schedule walks the whole year without skipping a month.
    let expected = [
        utc(2024, 2, 29),
        utc(2024, 3, 31),
        utc(2024, 4, 30),
        utc(2024, 5, 31),
        utc(2024, 6, 30),
        utc(2024, 7, 31),
        utc(2024, 8, 31),
        utc(2024, 9, 30),
        utc(2024, 10, 31),
        utc(2024, 11, 30),
        utc(2024, 12, 31),
        utc(2025, 1, 31),
    ];
    let mut current = utc(2024, 1, 31);
    for want in expected {
        current = next_occurrence(current, Frequency::Monthly, Some(31));
        assert_eq!(current, want);
    }
}

#[test]
fn quarterly_and_yearly_respect_payment_day() {
    assert_eq!(
        next_occurrence(utc(2024, 1, 31), Frequency::Quarterly, Some(31)),
        utc(2024, 4, 30)
    );
    assert_eq!(
        next_occurrence(utc(2024, 2, 29), Frequency::Yearly, Some(29)),
        utc(2025, 2, 28)
    );
}

#[test]
fn monthly_without_payment_day_keeps_clamped_day() {
    assert_eq!(
        next_occurrence(utc(2024, 1, 31), Frequency::Monthly, None),
        utc(2024, 2, 29)
    );
}

#[test]
fn unknown_stored_frequency_reads_as_monthly() {
    assert_eq!(Frequency::from_db("FORTNIGHTLY"), Frequency::Monthly);
    assert_eq!(Frequency::from_db("weekly"), Frequency::Weekly);
}

#[test]
fn first_occurrence_stays_in_month_when_day_ahead() {
    let d = first_occurrence_from_day(15, utc(2024, 3, 10));
    assert_eq!(d, utc(2024, 3, 15));
    // The day itself still counts as "not passed".
    assert_eq!(first_occurrence_from_day(15, utc(2024, 3, 15)), utc(2024, 3, 15));
}

#[test]
fn first_occurrence_rolls_to_next_month_and_year() {
    assert_eq!(first_occurrence_from_day(15, utc(2024, 3, 20)), utc(2024, 4, 15));
    assert_eq!(first_occurrence_from_day(15, utc(2024, 12, 20)), utc(2025, 1, 15));
}

#[test]
fn first_occurrence_clamps_missing_days() {
    assert_eq!(first_occurrence_from_day(31, utc(2024, 4, 5)), utc(2024, 4, 30));
}

#[test]
fn first_occurrence_is_normalized_to_noon() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
    let d = first_occurrence_from_day(15, now);
    assert_eq!(d.hour(), 12);
    assert_eq!(d.day(), 15);
}
