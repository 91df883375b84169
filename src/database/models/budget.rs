use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

/// At most one budget exists per category (UNIQUE constraint).
/// `start_date` is informational metadata; alert and exhaustion math always
/// run against the current calendar month.
#[derive(Debug, Clone, Serialize)]
pub struct Budget {
    pub budget_id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub monthly_limit: Decimal,
    pub start_date: NaiveDate,
    pub created_at: NaiveDateTime,
}
