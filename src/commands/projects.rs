// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::ProjectStatus;
use crate::scheduler::adjust_balance;
use crate::utils::{
    account_balance, decimal_from_db, id_for_account, id_for_project, maybe_print_json,
    parse_amount, parse_date, pretty_table,
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
        Some(("contribute", sub)) => {
            let project = sub.get_one::<String>("project").unwrap();
            let account = sub.get_one::<String>("account").unwrap();
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            let notes = sub.get_one::<String>("notes").map(|s| s.as_str());
            contribute(conn, project, account, amount, notes, Utc::now())?;
            println!("Contributed {} to '{}'", amount, project);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let target = parse_amount(sub.get_one::<String>("target").unwrap())?;
    let deadline = sub
        .get_one::<String>("deadline")
        .map(|s| parse_date(s))
        .transpose()?;
    let account_id = sub
        .get_one::<String>("account")
        .map(|a| id_for_account(conn, a))
        .transpose()?;

    conn.execute(
        "INSERT INTO projects(name, target_amount, deadline, account_id) VALUES (?1, ?2, ?3, ?4)",
        params![
            name,
            target.to_string(),
            deadline.map(|d| d.to_rfc3339()),
            account_id,
        ],
    )?;
    println!("Added project '{}' (target {})", name, target);
    Ok(())
}

/// Fund a savings project from an account, atomically: one contribution
/// row, the project's running total bumped (completing it when the target
/// is met), the account debited, and one EXPENSE transaction.
pub fn contribute(
    conn: &mut Connection,
    project: &str,
    account: &str,
    amount: Decimal,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<()> {
    let project_id = id_for_project(conn, project)?;
    let account_id = id_for_account(conn, account)?;
    if account_balance(conn, account_id)? < amount {
        bail!("Insufficient balance on '{}'", account);
    }

    let (current_raw, target_raw): (String, String) = conn.query_row(
        "SELECT current_amount, target_amount FROM projects WHERE id=?1",
        params![project_id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    let current = decimal_from_db(&current_raw, "projects.current_amount")?;
    let target = decimal_from_db(&target_raw, "projects.target_amount")?;

    let new_amount = current + amount;
    let status = if new_amount >= target {
        ProjectStatus::Completed
    } else {
        ProjectStatus::Active
    };

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO project_contributions(project_id, account_id, amount, date, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            project_id,
            account_id,
            amount.to_string(),
            now.to_rfc3339(),
            notes,
        ],
    )?;
    tx.execute(
        "UPDATE projects SET current_amount=?1, status=?2 WHERE id=?3",
        params![new_amount.to_string(), status.as_str(), project_id],
    )?;
    adjust_balance(&tx, account_id, -amount)?;
    tx.execute(
        "INSERT INTO transactions(date, account_id, amount, type, description)
         VALUES (?1, ?2, ?3, 'EXPENSE', ?4)",
        params![
            now.to_rfc3339(),
            account_id,
            amount.to_string(),
            format!("Savings: {}", project),
        ],
    )?;
    tx.commit()?;
    Ok(())
}

#[derive(Serialize)]
pub struct ProjectRow {
    pub name: String,
    pub target_amount: String,
    pub current_amount: String,
    pub status: String,
    pub deadline: Option<String>,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut stmt = conn.prepare(
        "SELECT name, target_amount, current_amount, status, deadline
         FROM projects ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(ProjectRow {
            name: r.get(0)?,
            target_amount: r.get(1)?,
            current_amount: r.get(2)?,
            status: r.get(3)?,
            deadline: r.get(4)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|p| {
                vec![
                    p.name.clone(),
                    p.current_amount.clone(),
                    p.target_amount.clone(),
                    p.status.clone(),
                    p.deadline
                        .as_deref()
                        .map(|d| d.chars().take(10).collect())
                        .unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Name", "Saved", "Target", "Status", "Deadline"], rows)
        );
    }
    Ok(())
}
