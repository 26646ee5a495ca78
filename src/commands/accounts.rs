// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::scheduler::adjust_balance;
use crate::utils::{
    account_balance, fmt_money, id_for_account, maybe_print_json, parse_amount, parse_date,
    parse_decimal, pretty_table,
};
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))?;
            if count <= 1 {
                bail!("Cannot delete the only account");
            }
            conn.execute("DELETE FROM accounts WHERE name=?1", params![name])?;
            println!("Removed account '{}'", name);
        }
        Some(("transfer", sub)) => {
            let from = sub.get_one::<String>("from").unwrap();
            let to = sub.get_one::<String>("to").unwrap();
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            let description = sub.get_one::<String>("description").map(|s| s.as_str());
            let date = match sub.get_one::<String>("date") {
                Some(s) => parse_date(s)?,
                None => Utc::now(),
            };
            transfer(conn, from, to, amount, description, date)?;
            println!("Transferred {} from '{}' to '{}'", amount, from, to);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let typ = sub.get_one::<String>("type").unwrap();
    let ccy = sub.get_one::<String>("currency").unwrap().to_uppercase();
    let balance = match sub.get_one::<String>("balance") {
        Some(s) => parse_decimal(s)?,
        None => Decimal::ZERO,
    };
    let is_default = sub.get_flag("default");

    if is_default {
        conn.execute("UPDATE accounts SET is_default=0 WHERE is_default=1", [])?;
    }
    conn.execute(
        "INSERT INTO accounts(name, type, currency, balance, is_default) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, typ, ccy, balance.to_string(), is_default as i64],
    )?;
    println!("Added account '{}' ({}, {})", name, typ, ccy);
    Ok(())
}

#[derive(Serialize)]
pub struct AccountRow {
    pub name: String,
    pub r#type: String,
    pub currency: String,
    pub balance: String,
    pub is_default: bool,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut stmt = conn.prepare(
        "SELECT name, type, currency, balance, is_default FROM accounts
         ORDER BY is_default DESC, name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(AccountRow {
            name: r.get(0)?,
            r#type: r.get(1)?,
            currency: r.get(2)?,
            balance: r.get(3)?,
            is_default: r.get::<_, i64>(4)? != 0,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|a| {
                let balance = a
                    .balance
                    .parse::<Decimal>()
                    .map(|d| fmt_money(&d, &a.currency))
                    .unwrap_or_else(|_| a.balance.clone());
                vec![
                    a.name.clone(),
                    a.r#type.clone(),
                    balance,
                    if a.is_default { "*".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Name", "Type", "Balance", "Default"], rows)
        );
    }
    Ok(())
}

/// Move `amount` between two accounts and record a single TRANSFER
/// transaction, all-or-nothing.
pub fn transfer(
    conn: &mut Connection,
    from: &str,
    to: &str,
    amount: Decimal,
    description: Option<&str>,
    date: DateTime<Utc>,
) -> Result<()> {
    let from_id = id_for_account(conn, from)?;
    let to_id = id_for_account(conn, to)?;
    if from_id == to_id {
        bail!("Cannot transfer to the same account");
    }
    if account_balance(conn, from_id)? < amount {
        bail!("Insufficient balance on '{}'", from);
    }

    let tx = conn.transaction()?;
    adjust_balance(&tx, from_id, -amount)?;
    adjust_balance(&tx, to_id, amount)?;
    tx.execute(
        "INSERT INTO transactions(date, account_id, to_account_id, amount, type, description)
         VALUES (?1, ?2, ?3, ?4, 'TRANSFER', ?5)",
        params![
            date.to_rfc3339(),
            from_id,
            to_id,
            amount.to_string(),
            description
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("Transfer to {}", to)),
        ],
    )?;
    tx.commit()?;
    Ok(())
}
