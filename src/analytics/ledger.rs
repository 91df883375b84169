use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use sqlx::{Pool, Sqlite};

use crate::database::db::queries::{self, TransactionFilter};
use crate::database::models::{TransactionKind, TransactionRecord};

/// One ledger row with its category resolved, amounts already converted
/// to f64 for the numeric layers above.
#[derive(Debug, Clone)]
pub struct LedgerRow {
    pub transaction_id: i64,
    pub date: NaiveDate,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub category_name: String,
    pub description: Option<String>,
}

/// In-memory tabular view of the ledger, built fresh for every analytics
/// call and discarded afterwards.
#[derive(Debug, Clone, Default)]
pub struct LedgerView {
    pub rows: Vec<LedgerRow>,
}

impl LedgerView {
    pub fn from_records(records: Vec<TransactionRecord>) -> Self {
        let rows = records
            .into_iter()
            .map(|r| LedgerRow {
                transaction_id: r.transaction_id,
                date: r.txn_date,
                amount: r.amount.to_f64().unwrap_or(0.0),
                kind: r.kind,
                category_id: r.category_id,
                category_name: r.category_name,
                description: r.description,
            })
            .collect();
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn expenses(&self) -> impl Iterator<Item = &LedgerRow> {
        self.rows
            .iter()
            .filter(|r| r.kind == TransactionKind::Expense)
    }
}

/// Materialize the ledger, optionally restricted to an inclusive date
/// window. An empty result is a normal outcome, not an error.
pub async fn read_ledger(
    pool: &Pool<Sqlite>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<LedgerView, sqlx::Error> {
    let records = queries::list_transactions(
        pool,
        TransactionFilter {
            start_date,
            end_date,
            ..Default::default()
        },
    )
    .await?;

    Ok(LedgerView::from_records(records))
}
