use chrono::NaiveDateTime;
use serde::Serialize;

use super::transaction::TransactionKind;

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub category_id: i64,
    pub name: String,
    pub kind: TransactionKind,
    pub created_at: NaiveDateTime,
}
