// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::calendar::{add_days, days_until};
use crate::recurrence::{first_occurrence_from_day, Frequency};
use crate::utils::{
    id_for_account, id_for_category, maybe_print_json, parse_amount, parse_day_of_month,
    pretty_table,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("upcoming", sub)) => upcoming(conn, sub)?,
        Some(("cancel", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let changed = conn.execute(
                "UPDATE subscriptions SET is_active=0 WHERE name=?1",
                params![name],
            )?;
            if changed == 0 {
                anyhow::bail!("Subscription '{}' not found", name);
            }
            println!("Cancelled subscription '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

/// Register a subscription. The first charge date is derived from the
/// payment day: this month if still ahead, otherwise next month.
pub fn create(
    conn: &Connection,
    name: &str,
    amount: Decimal,
    frequency: Frequency,
    payment_day: u32,
    account_id: i64,
    category_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<i64> {
    let next = first_occurrence_from_day(payment_day, now);
    conn.execute(
        "INSERT INTO subscriptions(name, amount, frequency, payment_day, next_payment_date,
                                   account_id, category_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            name,
            amount.to_string(),
            frequency.as_str(),
            payment_day,
            next.to_rfc3339(),
            account_id,
            category_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let frequency = match sub.get_one::<String>("frequency") {
        Some(s) => Frequency::from_str(s)?,
        None => Frequency::Monthly,
    };
    let payment_day = parse_day_of_month(sub.get_one::<String>("day").unwrap())?;
    let account_id = id_for_account(conn, sub.get_one::<String>("account").unwrap())?;
    let category_id = match sub.get_one::<String>("category") {
        Some(c) => Some(id_for_category(conn, c)?),
        None => None,
    };

    create(
        conn,
        name,
        amount,
        frequency,
        payment_day,
        account_id,
        category_id,
        Utc::now(),
    )?;
    println!(
        "Added subscription '{}' ({} every {}, day {})",
        name,
        amount,
        frequency.as_str().to_lowercase(),
        payment_day
    );
    Ok(())
}

#[derive(Serialize)]
pub struct SubscriptionRow {
    pub name: String,
    pub amount: String,
    pub frequency: String,
    pub next_payment_date: String,
    pub account: String,
    pub is_active: bool,
}

fn query_rows(conn: &Connection, active_only: bool) -> Result<Vec<SubscriptionRow>> {
    let sql = if active_only {
        "SELECT s.name, s.amount, s.frequency, s.next_payment_date, a.name, s.is_active
         FROM subscriptions s JOIN accounts a ON s.account_id=a.id
         WHERE s.is_active=1 ORDER BY s.next_payment_date ASC"
    } else {
        "SELECT s.name, s.amount, s.frequency, s.next_payment_date, a.name, s.is_active
         FROM subscriptions s JOIN accounts a ON s.account_id=a.id
         ORDER BY s.next_payment_date ASC"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |r| {
        Ok(SubscriptionRow {
            name: r.get(0)?,
            amount: r.get(1)?,
            frequency: r.get(2)?,
            next_payment_date: r.get(3)?,
            account: r.get(4)?,
            is_active: r.get::<_, i64>(5)? != 0,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, false)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|s| {
                vec![
                    s.name.clone(),
                    s.amount.clone(),
                    s.frequency.clone(),
                    s.next_payment_date.chars().take(10).collect(),
                    s.account.clone(),
                    if s.is_active { "yes".into() } else { "no".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Name", "Amount", "Frequency", "Next payment", "Account", "Active"],
                rows,
            )
        );
    }
    Ok(())
}

fn upcoming(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let days: i64 = sub
        .get_one::<String>("days")
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(30);
    let now = Utc::now();
    let horizon = add_days(now, days);

    let mut rows = Vec::new();
    for s in query_rows(conn, true)? {
        let due = crate::utils::date_from_db(&s.next_payment_date, "subscriptions")?;
        if due <= horizon {
            rows.push(vec![
                s.name,
                s.amount,
                s.next_payment_date.chars().take(10).collect(),
                format!("{}", days_until(due, now)),
            ]);
        }
    }
    println!(
        "{}",
        pretty_table(&["Name", "Amount", "Due", "In days"], rows)
    );
    Ok(())
}
