// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Transaction as DbTransaction};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::models::{Subscription, TxType};
use crate::recurrence::{next_occurrence, Frequency};
use crate::utils::{date_from_db, decimal_from_db};

/// An unpaid credit installment that has come due, joined with the fields
/// of its credit needed to settle it.
#[derive(Debug, Clone, Serialize)]
pub struct DueCreditPayment {
    pub payment_id: i64,
    pub credit_id: i64,
    pub credit_name: String,
    pub account_id: i64,
    pub amount: Decimal,
    pub principal: Decimal,
    pub payment_date: DateTime<Utc>,
}

/// A recurring transaction template whose next occurrence has come due.
#[derive(Debug, Clone)]
pub struct DueRecurring {
    pub parent_id: i64,
    pub account_id: i64,
    pub amount: Decimal,
    pub tx_type: TxType,
    pub description: String,
    pub category_id: Option<i64>,
    /// Raw JSON tag array, copied verbatim onto the generated occurrence.
    pub tags: String,
    pub occurs_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessSummary {
    pub subscriptions_settled: usize,
    pub credit_payments_settled: usize,
    pub occurrences_created: usize,
    pub failures: usize,
    /// True when this invocation found another scan in flight and bailed.
    pub skipped: bool,
}

static SCAN_IN_FLIGHT: AtomicBool = AtomicBool::new(false);

struct ScanGuard;

impl Drop for ScanGuard {
    fn drop(&mut self) {
        SCAN_IN_FLIGHT.store(false, Ordering::SeqCst);
    }
}

/// Apply a signed delta to an account's stored balance. Requiring the live
/// transaction handle keeps every balance mutation inside an atomic scope;
/// the enclosing write transaction serializes concurrent mutations of the
/// same row.
pub fn adjust_balance(tx: &DbTransaction, account_id: i64, delta: Decimal) -> Result<()> {
    let raw: String = tx
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )
        .with_context(|| format!("Account id {} not found", account_id))?;
    let balance = decimal_from_db(&raw, "accounts.balance")?;
    tx.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![(balance + delta).to_string(), account_id],
    )?;
    Ok(())
}

pub fn find_due_subscriptions(conn: &Connection, now: DateTime<Utc>) -> Result<Vec<Subscription>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, amount, frequency, payment_day, next_payment_date, account_id, category_id
         FROM subscriptions
         WHERE is_active=1 AND next_payment_date<=?1
         ORDER BY next_payment_date ASC",
    )?;
    let rows = stmt.query_map(params![now.to_rfc3339()], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<u32>>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, i64>(6)?,
            r.get::<_, Option<i64>>(7)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, name, amount, frequency, payment_day, next, account_id, category_id) = row?;
        out.push(Subscription {
            id,
            name,
            amount: decimal_from_db(&amount, "subscriptions.amount")?,
            frequency: Frequency::from_db(&frequency),
            payment_day,
            next_payment_date: date_from_db(&next, "subscriptions.next_payment_date")?,
            is_active: true,
            account_id,
            category_id,
        });
    }
    Ok(out)
}

pub fn find_due_credit_payments(
    conn: &Connection,
    now: DateTime<Utc>,
) -> Result<Vec<DueCreditPayment>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.credit_id, c.name, c.account_id, p.amount, p.principal, p.payment_date
         FROM credit_payments p
         JOIN credits c ON p.credit_id = c.id
         WHERE p.is_paid=0 AND p.payment_date<=?1
         ORDER BY p.payment_date ASC",
    )?;
    let rows = stmt.query_map(params![now.to_rfc3339()], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, i64>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (payment_id, credit_id, credit_name, account_id, amount, principal, date) = row?;
        out.push(DueCreditPayment {
            payment_id,
            credit_id,
            credit_name,
            account_id,
            amount: decimal_from_db(&amount, "credit_payments.amount")?,
            principal: decimal_from_db(&principal, "credit_payments.principal")?,
            payment_date: date_from_db(&date, "credit_payments.payment_date")?,
        });
    }
    Ok(out)
}

/// Recurring templates are filtered in SQL by activity window only; whether
/// a new occurrence is actually due depends on the last generated child and
/// the recurrence resolver, so that check runs per candidate here.
pub fn find_due_recurring_parents(
    conn: &Connection,
    now: DateTime<Utc>,
) -> Result<Vec<DueRecurring>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, account_id, amount, type, description, category_id,
                recurring_frequency, tags
         FROM transactions
         WHERE is_recurring=1
           AND recurring_frequency IS NOT NULL
           AND (recurring_end_date IS NULL OR recurring_end_date>=?1)",
    )?;
    let rows = stmt.query_map(params![now.to_rfc3339()], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, i64>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, Option<i64>>(6)?,
            r.get::<_, String>(7)?,
            r.get::<_, String>(8)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, date, account_id, amount, tx_type, description, category_id, frequency, tags) =
            row?;

        let last_child: Option<String> = conn
            .query_row(
                "SELECT date FROM transactions WHERE parent_transaction_id=?1
                 ORDER BY date DESC LIMIT 1",
                params![id],
                |r| r.get(0),
            )
            .optional()?;

        let anchor = match last_child {
            Some(d) => date_from_db(&d, "transactions.date")?,
            None => date_from_db(&date, "transactions.date")?,
        };
        let next = next_occurrence(anchor, Frequency::from_db(&frequency), None);
        if next > now {
            continue;
        }

        out.push(DueRecurring {
            parent_id: id,
            account_id,
            amount: decimal_from_db(&amount, "transactions.amount")?,
            tx_type: TxType::parse(&tx_type)?,
            description,
            category_id,
            tags,
            occurs_at: next,
        });
    }
    Ok(out)
}

/// Charge one due subscription: one EXPENSE transaction, one balance
/// decrement, and the next-occurrence pointer advanced, atomically.
pub fn settle_subscription(
    conn: &mut Connection,
    sub: &Subscription,
    now: DateTime<Utc>,
) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO transactions(date, account_id, amount, type, description, category_id)
         VALUES (?1, ?2, ?3, 'EXPENSE', ?4, ?5)",
        params![
            now.to_rfc3339(),
            sub.account_id,
            sub.amount.to_string(),
            format!("Subscription: {}", sub.name),
            sub.category_id,
        ],
    )?;
    adjust_balance(&tx, sub.account_id, -sub.amount)?;

    let next = next_occurrence(sub.next_payment_date, sub.frequency, sub.payment_day);
    tx.execute(
        "UPDATE subscriptions SET next_payment_date=?1 WHERE id=?2",
        params![next.to_rfc3339(), sub.id],
    )?;

    tx.commit()?;
    Ok(())
}

/// Settle one due credit installment: mark it paid, retire its principal
/// from the credit, and charge the owning account, atomically.
pub fn settle_credit_payment(
    conn: &mut Connection,
    due: &DueCreditPayment,
    now: DateTime<Utc>,
) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "UPDATE credit_payments SET is_paid=1 WHERE id=?1",
        params![due.payment_id],
    )?;

    let raw: String = tx
        .query_row(
            "SELECT remaining_amount FROM credits WHERE id=?1",
            params![due.credit_id],
            |r| r.get(0),
        )
        .with_context(|| format!("Credit id {} not found", due.credit_id))?;
    let remaining = decimal_from_db(&raw, "credits.remaining_amount")?;
    let new_remaining = (remaining - due.principal).max(Decimal::ZERO);
    tx.execute(
        "UPDATE credits SET remaining_amount=?1 WHERE id=?2",
        params![new_remaining.to_string(), due.credit_id],
    )?;

    tx.execute(
        "INSERT INTO transactions(date, account_id, amount, type, description)
         VALUES (?1, ?2, ?3, 'EXPENSE', ?4)",
        params![
            now.to_rfc3339(),
            due.account_id,
            due.amount.to_string(),
            format!("Credit installment: {}", due.credit_name),
        ],
    )?;
    adjust_balance(&tx, due.account_id, -due.amount)?;

    tx.commit()?;
    Ok(())
}

/// Generate one child occurrence of a recurring transaction template and
/// apply its signed amount to the owning account, atomically.
pub fn settle_recurring_parent(conn: &mut Connection, due: &DueRecurring) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO transactions(date, account_id, amount, type, description, category_id,
                                  parent_transaction_id, tags)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            due.occurs_at.to_rfc3339(),
            due.account_id,
            due.amount.to_string(),
            due.tx_type.as_str(),
            due.description,
            due.category_id,
            due.parent_id,
            due.tags,
        ],
    )?;

    let delta = match due.tx_type {
        TxType::Income => due.amount,
        _ => -due.amount,
    };
    adjust_balance(&tx, due.account_id, delta)?;

    tx.commit()?;
    Ok(())
}

/// One scan-and-settle cycle over everything due at `now`. Items settle
/// sequentially, each in its own transaction; a failed item is logged and
/// counted but never aborts the rest of the scan, since it stays due and
/// is retried on the next cycle. Overlapping invocations skip instead of
/// double-processing.
pub fn process_due(conn: &mut Connection, now: DateTime<Utc>) -> Result<ProcessSummary> {
    if SCAN_IN_FLIGHT
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        warn!("Due-item scan already in flight; skipping this invocation");
        return Ok(ProcessSummary {
            skipped: true,
            ..ProcessSummary::default()
        });
    }
    let _guard = ScanGuard;

    let mut summary = ProcessSummary::default();

    let subscriptions = find_due_subscriptions(conn, now)?;
    info!("Found {} due subscription(s)", subscriptions.len());
    for sub in &subscriptions {
        match settle_subscription(conn, sub, now) {
            Ok(()) => {
                info!("Processed subscription payment: {} (id {})", sub.name, sub.id);
                summary.subscriptions_settled += 1;
            }
            Err(e) => {
                error!("Failed to process subscription {}: {:#}", sub.name, e);
                summary.failures += 1;
            }
        }
    }

    let payments = find_due_credit_payments(conn, now)?;
    info!("Found {} due credit payment(s)", payments.len());
    for due in &payments {
        match settle_credit_payment(conn, due, now) {
            Ok(()) => {
                info!(
                    "Processed credit payment: {} (installment {})",
                    due.credit_name, due.payment_id
                );
                summary.credit_payments_settled += 1;
            }
            Err(e) => {
                error!(
                    "Failed to process credit payment {}: {:#}",
                    due.credit_name, e
                );
                summary.failures += 1;
            }
        }
    }

    let recurring = find_due_recurring_parents(conn, now)?;
    info!("Found {} due recurring transaction(s)", recurring.len());
    for due in &recurring {
        match settle_recurring_parent(conn, due) {
            Ok(()) => {
                info!(
                    "Created recurring occurrence: {} (parent {})",
                    due.description, due.parent_id
                );
                summary.occurrences_created += 1;
            }
            Err(e) => {
                error!(
                    "Failed to process recurring transaction {}: {:#}",
                    due.description, e
                );
                summary.failures += 1;
            }
        }
    }

    info!(
        "Finished due-item scan: {} subscription(s), {} credit payment(s), {} occurrence(s), {} failure(s)",
        summary.subscriptions_settled,
        summary.credit_payments_settled,
        summary.occurrences_created,
        summary.failures
    );
    Ok(summary)
}
