// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use centime::commands::projects::contribute;
use centime::db;
use chrono::{TimeZone, Utc};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO accounts(name, type, currency, balance) VALUES('Checking','bank','EUR','500.00')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO projects(name, target_amount) VALUES('Bike', '300')",
        [],
    )
    .unwrap();
    conn
}

#[test]
fn contribution_moves_funds_and_completes_target() {
    let mut conn = setup();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    contribute(&mut conn, "Bike", "Checking", "120".parse().unwrap(), Some("first"), now).unwrap();

    let (current, status): (String, String) = conn
        .query_row(
            "SELECT current_amount, status FROM projects WHERE name='Bike'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(current, "120");
    assert_eq!(status, "ACTIVE");

    let balance: String = conn
        .query_row("SELECT balance FROM accounts WHERE id=1", [], |r| r.get(0))
        .unwrap();
    assert_eq!(balance, "380.00");

    // One contribution row and one EXPENSE transaction.
    let contributions: i64 = conn
        .query_row("SELECT COUNT(*) FROM project_contributions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(contributions, 1);
    let (tx_count, typ): (i64, String) = conn
        .query_row("SELECT COUNT(*), MAX(type) FROM transactions", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(tx_count, 1);
    assert_eq!(typ, "EXPENSE");

    // Reaching the target flips the project to COMPLETED.
    contribute(&mut conn, "Bike", "Checking", "180".parse().unwrap(), None, now).unwrap();
    let status: String = conn
        .query_row("SELECT status FROM projects WHERE name='Bike'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(status, "COMPLETED");
}

#[test]
fn contribution_rejects_overdraft() {
    let mut conn = setup();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let err = contribute(&mut conn, "Bike", "Checking", "900".parse().unwrap(), None, now)
        .unwrap_err();
    assert!(err.to_string().contains("Insufficient balance"));

    let row: i64 = conn
        .query_row("SELECT COUNT(*) FROM project_contributions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(row, 0);
    let balance: String = conn
        .query_row("SELECT balance FROM accounts WHERE id=1", [], |r| r.get(0))
        .unwrap();
    assert_eq!(balance, "500.00");
}
