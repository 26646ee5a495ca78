// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::bail;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::calendar::{add_days, add_months, add_years, clamp_day_of_month, with_day_clamped};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Biweekly => "BIWEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Quarterly => "QUARTERLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    /// Lenient read for stored values: anything unrecognized falls back to
    /// monthly rather than failing the row.
    pub fn from_db(s: &str) -> Self {
        Frequency::from_str(s).unwrap_or(Frequency::Monthly)
    }
}

impl FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "BIWEEKLY" => Ok(Frequency::Biweekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "QUARTERLY" => Ok(Frequency::Quarterly),
            "YEARLY" => Ok(Frequency::Yearly),
            other => bail!(
                "Invalid frequency '{}', expected daily|weekly|biweekly|monthly|quarterly|yearly",
                other
            ),
        }
    }
}

/// Next occurrence after `current` for the given frequency. For monthly and
/// longer periods an optional `payment_day` re-pins the result to that day of
/// the target month, clamped to the month's length so a day-31 schedule never
/// skips a short month.
pub fn next_occurrence(
    current: DateTime<Utc>,
    frequency: Frequency,
    payment_day: Option<u32>,
) -> DateTime<Utc> {
    let pin = |date: DateTime<Utc>| match payment_day {
        Some(day) => with_day_clamped(date, day),
        None => date,
    };

    match frequency {
        Frequency::Daily => add_days(current, 1),
        Frequency::Weekly => add_days(current, 7),
        Frequency::Biweekly => add_days(current, 14),
        Frequency::Monthly => pin(add_months(current, 1)),
        Frequency::Quarterly => pin(add_months(current, 3)),
        Frequency::Yearly => pin(add_years(current, 1)),
    }
}

/// First occurrence for a bare day-of-month: this month if the day has not
/// passed yet, otherwise next month (December rolls into January). The result
/// is normalized to noon UTC so timezone boundaries cannot flap the date.
pub fn first_occurrence_from_day(payment_day: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let mut year = now.year();
    let mut month = now.month();

    if now.day() > payment_day {
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }

    let day = clamp_day_of_month(year, month, payment_day);
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    Utc.from_utc_datetime(&naive)
}
