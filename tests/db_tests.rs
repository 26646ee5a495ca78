// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use centime::db;

#[test]
fn open_at_creates_schema_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("centime.sqlite");

    {
        let conn = db::open_at(&path).unwrap();
        conn.execute(
            "INSERT INTO accounts(name, type, currency) VALUES('Checking','bank','EUR')",
            [],
        )
        .unwrap();
    }

    let conn = db::open_at(&path).unwrap();
    let (name, balance): (String, String) = conn
        .query_row("SELECT name, balance FROM accounts", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(name, "Checking");
    assert_eq!(balance, "0"); // column default
}

#[test]
fn init_schema_is_idempotent() {
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    db::init_schema(&mut conn).unwrap();

    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
             ('accounts','categories','transactions','subscriptions','credits',
              'credit_payments','projects','project_contributions')",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(tables, 8);
}
