// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxType;
use crate::recurrence::Frequency;
use crate::scheduler::adjust_balance;
use crate::utils::{
    account_currency, fmt_money, id_for_account, id_for_category, maybe_print_json, parse_amount,
    parse_date, pretty_table,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub struct NewTransaction {
    pub date: DateTime<Utc>,
    pub account_id: i64,
    pub amount: Decimal,
    pub tx_type: TxType,
    pub description: String,
    pub category_id: Option<i64>,
    pub recurring_frequency: Option<Frequency>,
    pub recurring_end_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

/// Record a transaction and apply its signed amount to the account balance
/// in the same atomic transaction. Returns the new row id.
pub fn create(conn: &mut Connection, new: &NewTransaction) -> Result<i64> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO transactions(date, account_id, amount, type, description, category_id,
                                  is_recurring, recurring_frequency, recurring_end_date, tags)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            new.date.to_rfc3339(),
            new.account_id,
            new.amount.to_string(),
            new.tx_type.as_str(),
            new.description,
            new.category_id,
            new.recurring_frequency.is_some() as i64,
            new.recurring_frequency.map(|f| f.as_str()),
            new.recurring_end_date.map(|d| d.to_rfc3339()),
            serde_json::to_string(&new.tags)?,
        ],
    )?;
    let id = tx.last_insert_rowid();

    let delta = match new.tx_type {
        TxType::Income => new.amount,
        _ => -new.amount,
    };
    adjust_balance(&tx, new.account_id, delta)?;

    tx.commit()?;
    Ok(id)
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => Utc::now(),
    };
    let account_name = sub.get_one::<String>("account").unwrap();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let tx_type = TxType::parse(sub.get_one::<String>("type").unwrap())?;
    let description = sub
        .get_one::<String>("description")
        .cloned()
        .unwrap_or_default();
    let category = sub.get_one::<String>("category");
    let tags: Vec<String> = sub
        .get_many::<String>("tag")
        .map(|v| v.cloned().collect())
        .unwrap_or_default();
    let recurring_frequency = sub
        .get_one::<String>("every")
        .map(|s| Frequency::from_str(s))
        .transpose()?;
    let recurring_end_date = sub
        .get_one::<String>("until")
        .map(|s| parse_date(s))
        .transpose()?;

    let account_id = id_for_account(conn, account_name)?;
    let currency = account_currency(conn, account_id)?;
    let category_id = match category {
        Some(c) => Some(id_for_category(conn, c)?),
        None => None,
    };

    create(
        conn,
        &NewTransaction {
            date,
            account_id,
            amount,
            tx_type,
            description,
            category_id,
            recurring_frequency,
            recurring_end_date,
            tags,
        },
    )?;

    if let Some(freq) = recurring_frequency {
        println!(
            "Recorded recurring {} of {} at '{}' (every {})",
            tx_type.as_str().to_lowercase(),
            fmt_money(&amount, &currency),
            account_name,
            freq.as_str().to_lowercase()
        );
    } else {
        println!(
            "Recorded {} of {} at '{}'",
            tx_type.as_str().to_lowercase(),
            fmt_money(&amount, &currency),
            account_name
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub date: String,
    pub account: String,
    pub amount: String,
    pub r#type: String,
    pub description: String,
    pub category: String,
    pub recurring: bool,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.date, a.name, t.amount, t.type, t.description, c.name, t.is_recurring
         FROM transactions t
         LEFT JOIN accounts a ON t.account_id=a.id
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month.into());
    }
    if let Some(acct) = sub.get_one::<String>("account") {
        sql.push_str(" AND a.name=?");
        params_vec.push(acct.into());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND c.name=?");
        params_vec.push(cat.into());
    }
    if let Some(typ) = sub.get_one::<String>("type") {
        sql.push_str(" AND t.type=?");
        params_vec.push(typ.to_uppercase());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = if params_vec.is_empty() {
        stmt.query([])?
    } else {
        let params: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();
        stmt.query(rusqlite::params_from_iter(params))?
    };

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let date: String = r.get(0)?;
        let account: Option<String> = r.get(1)?;
        let amount: String = r.get(2)?;
        let typ: String = r.get(3)?;
        let description: String = r.get(4)?;
        let category: Option<String> = r.get(5)?;
        let recurring: i64 = r.get(6)?;
        data.push(TransactionRow {
            date,
            account: account.unwrap_or_default(),
            amount,
            r#type: typ,
            description,
            category: category.unwrap_or_default(),
            recurring: recurring != 0,
        });
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.account.clone(),
                    r.r#type.clone(),
                    r.amount.clone(),
                    r.description.clone(),
                    r.category.clone(),
                    if r.recurring { "R".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Account", "Type", "Amount", "Description", "Category", ""],
                rows,
            )
        );
    }
    Ok(())
}
