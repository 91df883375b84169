use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Economic direction of a transaction. The stored amount is always
/// non-negative; the sign comes from here, never from the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// Transaction row with its category name already resolved, as read back
/// from the ledger. A dangling category reference resolves to "Unknown".
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    pub transaction_id: i64,
    pub txn_date: NaiveDate,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub category_name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}
