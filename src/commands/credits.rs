// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::amortize::{build_schedule, remaining_principal};
use crate::scheduler::{self, DueCreditPayment};
use crate::utils::{
    date_from_db, decimal_from_db, id_for_account, id_for_credit, maybe_print_json, parse_amount,
    parse_date, parse_day_of_month, parse_decimal, pretty_table,
};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("schedule", sub)) => schedule(conn, sub)?,
        Some(("record-payment", sub)) => record_payment(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub struct NewCredit {
    pub name: String,
    pub total_amount: Decimal,
    /// Explicit outstanding principal; when absent and the start date is in
    /// the past, it is inferred by simulating the elapsed installments.
    pub remaining_amount: Option<Decimal>,
    pub monthly_payment: Decimal,
    pub interest_rate: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_day: u32,
    pub account_id: i64,
}

/// Register a credit and generate its full payment schedule. Entries dated
/// before `now` are stored already flagged paid; creation never touches the
/// account balance.
pub fn create(conn: &mut Connection, new: &NewCredit, now: DateTime<Utc>) -> Result<i64> {
    if new.end_date <= new.start_date {
        bail!("Credit end date must be after its start date");
    }

    let remaining = match new.remaining_amount {
        Some(r) => r,
        None if new.start_date < now => remaining_principal(
            new.total_amount,
            new.monthly_payment,
            new.interest_rate,
            new.start_date,
            new.payment_day,
            now,
        )?,
        None => new.total_amount,
    };

    let installments = build_schedule(
        new.total_amount,
        new.monthly_payment,
        new.interest_rate,
        new.start_date,
        new.end_date,
        new.payment_day,
        now,
    )?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO credits(name, total_amount, remaining_amount, monthly_payment,
                             interest_rate, start_date, end_date, payment_day, account_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            new.name,
            new.total_amount.to_string(),
            remaining.to_string(),
            new.monthly_payment.to_string(),
            new.interest_rate.to_string(),
            new.start_date.to_rfc3339(),
            new.end_date.to_rfc3339(),
            new.payment_day,
            new.account_id,
        ],
    )?;
    let credit_id = tx.last_insert_rowid();

    for i in &installments {
        tx.execute(
            "INSERT INTO credit_payments(credit_id, amount, principal, interest,
                                         remaining_balance, payment_date, is_paid)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                credit_id,
                i.amount.to_string(),
                i.principal.to_string(),
                i.interest.to_string(),
                i.remaining_balance.to_string(),
                i.payment_date.to_rfc3339(),
                i.is_paid as i64,
            ],
        )?;
    }
    tx.commit()?;
    Ok(credit_id)
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().clone();
    let total_amount = parse_amount(sub.get_one::<String>("total").unwrap())?;
    let monthly_payment = parse_amount(sub.get_one::<String>("monthly").unwrap())?;
    let interest_rate = parse_decimal(sub.get_one::<String>("rate").unwrap())?;
    let start_date = parse_date(sub.get_one::<String>("start").unwrap())?;
    let end_date = parse_date(sub.get_one::<String>("end").unwrap())?;
    let payment_day = match sub.get_one::<String>("day") {
        Some(s) => parse_day_of_month(s)?,
        None => 1,
    };
    let remaining_amount = sub
        .get_one::<String>("remaining")
        .map(|s| parse_amount(s))
        .transpose()?;
    let account_id = id_for_account(conn, sub.get_one::<String>("account").unwrap())?;

    let credit = NewCredit {
        name: name.clone(),
        total_amount,
        remaining_amount,
        monthly_payment,
        interest_rate,
        start_date,
        end_date,
        payment_day,
        account_id,
    };
    create(conn, &credit, Utc::now())?;

    let remaining: String = conn.query_row(
        "SELECT remaining_amount FROM credits WHERE name=?1",
        params![name],
        |r| r.get(0),
    )?;
    println!(
        "Added credit '{}' (total {}, remaining {}, {} monthly at {}%)",
        name, total_amount, remaining, monthly_payment, interest_rate
    );
    Ok(())
}

#[derive(Serialize)]
pub struct CreditRow {
    pub name: String,
    pub total_amount: String,
    pub remaining_amount: String,
    pub monthly_payment: String,
    pub interest_rate: String,
    pub next_payment: Option<String>,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut stmt = conn.prepare(
        "SELECT id, name, total_amount, remaining_amount, monthly_payment, interest_rate
         FROM credits ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
        ))
    })?;

    let mut data = Vec::new();
    for row in rows {
        let (id, name, total, remaining, monthly, rate) = row?;
        let next_payment: Option<String> = conn
            .query_row(
                "SELECT payment_date FROM credit_payments
                 WHERE credit_id=?1 AND is_paid=0 ORDER BY payment_date ASC LIMIT 1",
                params![id],
                |r| r.get(0),
            )
            .optional()?;
        data.push(CreditRow {
            name,
            total_amount: total,
            remaining_amount: remaining,
            monthly_payment: monthly,
            interest_rate: rate,
            next_payment,
        });
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|c| {
                vec![
                    c.name.clone(),
                    c.total_amount.clone(),
                    c.remaining_amount.clone(),
                    c.monthly_payment.clone(),
                    format!("{}%", c.interest_rate),
                    c.next_payment
                        .as_deref()
                        .map(|d| d.chars().take(10).collect())
                        .unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Name", "Total", "Remaining", "Monthly", "Rate", "Next payment"],
                rows,
            )
        );
    }
    Ok(())
}

fn schedule(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let credit_id = id_for_credit(conn, name)?;

    let mut stmt = conn.prepare(
        "SELECT payment_date, amount, principal, interest, remaining_balance, is_paid
         FROM credit_payments WHERE credit_id=?1 ORDER BY payment_date ASC",
    )?;
    let rows = stmt.query_map(params![credit_id], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, i64>(5)?,
        ))
    })?;

    let mut data = Vec::new();
    for row in rows {
        let (date, amount, principal, interest, remaining, paid) = row?;
        data.push(vec![
            date.chars().take(10).collect(),
            amount,
            round_display(&principal)?,
            round_display(&interest)?,
            round_display(&remaining)?,
            if paid != 0 { "paid".into() } else { String::new() },
        ]);
    }
    println!(
        "{}",
        pretty_table(
            &["Date", "Amount", "Principal", "Interest", "Remaining", ""],
            data,
        )
    );
    Ok(())
}

fn round_display(raw: &str) -> Result<String> {
    Ok(decimal_from_db(raw, "credit_payments")?.round_dp(2).to_string())
}

/// Settle the earliest unpaid installment of a credit by hand, using the
/// same mutation set as the scheduled settlement.
fn record_payment(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => Utc::now(),
    };
    let credit_id = id_for_credit(conn, name)?;

    let row: Option<(i64, String, String, String)> = conn
        .query_row(
            "SELECT id, amount, principal, payment_date FROM credit_payments
             WHERE credit_id=?1 AND is_paid=0 ORDER BY payment_date ASC LIMIT 1",
            params![credit_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .optional()?;
    let (payment_id, amount, principal, payment_date) =
        row.with_context(|| format!("Credit '{}' has no unpaid installments", name))?;

    let account_id: i64 = conn.query_row(
        "SELECT account_id FROM credits WHERE id=?1",
        params![credit_id],
        |r| r.get(0),
    )?;

    let due = DueCreditPayment {
        payment_id,
        credit_id,
        credit_name: name.clone(),
        account_id,
        amount: decimal_from_db(&amount, "credit_payments.amount")?,
        principal: decimal_from_db(&principal, "credit_payments.principal")?,
        payment_date: date_from_db(&payment_date, "credit_payments.payment_date")?,
    };
    scheduler::settle_credit_payment(conn, &due, date)?;
    println!(
        "Recorded payment of {} on credit '{}' ({} principal)",
        due.amount,
        name,
        due.principal.round_dp(2)
    );
    Ok(())
}
