// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::scheduler::process_due;
use crate::utils::{maybe_print_json, parse_date};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

/// Manual trigger for the scan-and-settle cycle. `--now` overrides the
/// clock so catch-up runs are reproducible.
pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let now = match m.get_one::<String>("now") {
        Some(s) => parse_date(s)?,
        None => Utc::now(),
    };
    let json_flag = m.get_flag("json");

    let summary = process_due(conn, now)?;
    if !maybe_print_json(json_flag, false, &summary)? {
        if summary.skipped {
            println!("A scan is already running; nothing processed");
        } else {
            println!(
                "Settled {} subscription(s), {} credit payment(s), {} recurring occurrence(s); {} failure(s)",
                summary.subscriptions_settled,
                summary.credit_payments_settled,
                summary.occurrences_created,
                summary.failures
            );
        }
    }
    Ok(())
}
