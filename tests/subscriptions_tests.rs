// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use centime::commands::subscriptions::create;
use centime::db;
use centime::recurrence::Frequency;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection};

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO accounts(name, type, currency, balance) VALUES('Checking','bank','EUR','500.00')",
        [],
    )
    .unwrap();
    conn
}

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn next_payment(conn: &Connection, id: i64) -> String {
    conn.query_row(
        "SELECT next_payment_date FROM subscriptions WHERE id=?1",
        params![id],
        |r| r.get(0),
    )
    .unwrap()
}

#[test]
fn first_charge_lands_this_month_when_day_is_ahead() {
    let conn = setup();
    let id = create(
        &conn,
        "Netflix",
        "13.49".parse().unwrap(),
        Frequency::Monthly,
        15,
        1,
        None,
        utc(2024, 3, 10),
    )
    .unwrap();
    assert!(next_payment(&conn, id).starts_with("2024-03-15"));
}

#[test]
fn first_charge_rolls_to_next_month_when_day_passed() {
    let conn = setup();
    let id = create(
        &conn,
        "Netflix",
        "13.49".parse().unwrap(),
        Frequency::Monthly,
        15,
        1,
        None,
        utc(2024, 12, 20),
    )
    .unwrap();
    // December rolls into January of the next year.
    assert!(next_payment(&conn, id).starts_with("2025-01-15"));
}

#[test]
fn first_charge_clamps_day_to_month_length() {
    let conn = setup();
    let id = create(
        &conn,
        "Gym",
        "25".parse().unwrap(),
        Frequency::Monthly,
        31,
        1,
        None,
        utc(2024, 4, 5),
    )
    .unwrap();
    assert!(next_payment(&conn, id).starts_with("2024-04-30"));
}

#[test]
fn creation_does_not_touch_the_account() {
    let conn = setup();
    create(
        &conn,
        "Netflix",
        "13.49".parse().unwrap(),
        Frequency::Monthly,
        15,
        1,
        None,
        utc(2024, 3, 10),
    )
    .unwrap();

    let balance: String = conn
        .query_row("SELECT balance FROM accounts WHERE id=1", [], |r| r.get(0))
        .unwrap();
    assert_eq!(balance, "500.00");
    let tx_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(tx_count, 0);
}
