// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::recurrence::Frequency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxType {
    Income,
    Expense,
    Transfer,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Income => "INCOME",
            TxType::Expense => "EXPENSE",
            TxType::Transfer => "TRANSFER",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "INCOME" => Ok(TxType::Income),
            "EXPENSE" => Ok(TxType::Expense),
            "TRANSFER" => Ok(TxType::Transfer),
            other => bail!("Invalid transaction type '{}', expected income|expense|transfer", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectStatus {
    Active,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Cancelled => "CANCELLED",
        }
    }

    /// Stored values predate the CANCELLED state; anything unknown reads as active.
    pub fn from_db(s: &str) -> Self {
        match s {
            "COMPLETED" => ProjectStatus::Completed,
            "CANCELLED" => ProjectStatus::Cancelled,
            _ => ProjectStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub r#type: String,
    pub currency: String,
    pub balance: Decimal,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// INCOME or EXPENSE; purely informational for listings.
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub account_id: i64,
    pub to_account_id: Option<i64>,
    pub amount: Decimal,
    pub tx_type: TxType,
    pub description: String,
    pub category_id: Option<i64>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<Frequency>,
    pub recurring_end_date: Option<DateTime<Utc>>,
    pub parent_transaction_id: Option<i64>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    pub frequency: Frequency,
    /// Day of month the charge is pinned to; clamped per target month.
    pub payment_day: Option<u32>,
    pub next_payment_date: DateTime<Utc>,
    pub is_active: bool,
    pub account_id: i64,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credit {
    pub id: i64,
    pub name: String,
    pub total_amount: Decimal,
    pub remaining_amount: Decimal,
    pub monthly_payment: Decimal,
    /// Annual percentage rate.
    pub interest_rate: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_day: u32,
    pub account_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditPayment {
    pub id: i64,
    pub credit_id: i64,
    pub amount: Decimal,
    pub principal: Decimal,
    pub interest: Decimal,
    /// Outstanding principal snapshot after this installment.
    pub remaining_balance: Decimal,
    pub payment_date: DateTime<Utc>,
    pub is_paid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: Option<DateTime<Utc>>,
    pub status: ProjectStatus,
    pub account_id: Option<i64>,
}
