use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::analytics::ledger::{read_ledger, LedgerView};
use crate::util::round2;

/// Default z-score threshold for flagging a transaction.
pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// An expense transaction whose amount deviates significantly from its
/// category's typical amount.
#[derive(Debug, Clone, Serialize)]
pub struct UnusualTransaction {
    pub transaction_id: i64,
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
    pub category_mean: f64,
    pub z_score: f64,
    pub description: Option<String>,
}

/// Z-score outlier detection. For each category with at least two expense
/// transactions, a transaction is flagged when its amount lies more than
/// `threshold` sample standard deviations from the category mean.
/// Categories with zero or undefined deviation are skipped. Results are
/// sorted by |z| descending, ties by transaction id ascending.
pub fn detect_unusual(view: &LedgerView, threshold: f64) -> Vec<UnusualTransaction> {
    let mut by_category: HashMap<&str, Vec<f64>> = HashMap::new();
    for row in view.expenses() {
        by_category
            .entry(row.category_name.as_str())
            .or_default()
            .push(row.amount);
    }

    let mut stats: HashMap<&str, (f64, f64)> = HashMap::new();
    for (category, amounts) in &by_category {
        if amounts.len() < 2 {
            continue;
        }
        let n = amounts.len() as f64;
        let mean = amounts.iter().sum::<f64>() / n;
        // sample standard deviation (n - 1)
        let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let std_dev = variance.sqrt();
        if std_dev > 0.0 {
            stats.insert(*category, (mean, std_dev));
        }
    }

    let mut unusual: Vec<UnusualTransaction> = view
        .expenses()
        .filter_map(|row| {
            let (mean, std_dev) = stats.get(row.category_name.as_str())?;
            let z = (row.amount - mean) / std_dev;
            if z.abs() > threshold {
                Some(UnusualTransaction {
                    transaction_id: row.transaction_id,
                    date: row.date,
                    category: row.category_name.clone(),
                    amount: round2(row.amount),
                    category_mean: round2(*mean),
                    z_score: round2(z),
                    description: row.description.clone(),
                })
            } else {
                None
            }
        })
        .collect();

    unusual.sort_by(|a, b| {
        b.z_score
            .abs()
            .partial_cmp(&a.z_score.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.transaction_id.cmp(&b.transaction_id))
    });
    unusual
}

/// Flag outlier transactions across the whole ledger.
pub async fn unusual_transactions(
    pool: &Pool<Sqlite>,
) -> Result<Vec<UnusualTransaction>, sqlx::Error> {
    let view = read_ledger(pool, None, None).await?;
    Ok(detect_unusual(&view, DEFAULT_THRESHOLD))
}
