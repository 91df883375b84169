use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::analytics::ledger::LedgerView;
use crate::database::models::TransactionKind;
use crate::util::{month_key, round2};

/// Total for one calendar month, keyed `YYYY-MM`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyTotal {
    pub month: String,
    pub total: f64,
}

/// Group the view's rows of the given kind into calendar-month buckets,
/// chronologically ordered. An optional category name restricts the series
/// to a single category.
pub fn monthly_totals(
    view: &LedgerView,
    kind: TransactionKind,
    category: Option<&str>,
) -> Vec<MonthlyTotal> {
    let mut buckets: BTreeMap<(i32, u32), f64> = BTreeMap::new();

    for row in view.rows.iter().filter(|r| r.kind == kind) {
        if let Some(name) = category {
            if row.category_name != name {
                continue;
            }
        }
        *buckets
            .entry((row.date.year(), row.date.month()))
            .or_insert(0.0) += row.amount;
    }

    buckets
        .into_iter()
        .map(|((year, month), total)| MonthlyTotal {
            month: month_key(year, month),
            total: round2(total),
        })
        .collect()
}

/// "Last N months" means the last N calendar-month buckets present in the
/// grouped series, never a fixed N*30-day date window.
pub fn last_n_months(mut series: Vec<MonthlyTotal>, n: usize) -> Vec<MonthlyTotal> {
    if series.len() > n {
        series.drain(..series.len() - n);
    }
    series
}
