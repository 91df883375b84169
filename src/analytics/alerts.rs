use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::debug;

use crate::analytics::ledger::{read_ledger, LedgerView};
use crate::database::models::Budget;
use crate::util::{first_of_month, round2, today};

/// Severity bands: >=100% critical, >=90% warning, >=75% info. Below 75%
/// no alert is produced at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
    Info,
}

impl AlertLevel {
    fn classify(percentage: f64) -> Option<Self> {
        if percentage >= 100.0 {
            Some(Self::Critical)
        } else if percentage >= 90.0 {
            Some(Self::Warning)
        } else if percentage >= 75.0 {
            Some(Self::Info)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetAlert {
    pub category_id: i64,
    pub category: String,
    pub budget: f64,
    pub spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub alert_level: AlertLevel,
    pub message: String,
}

/// Current-month spend per category id from a view already restricted to
/// the current calendar month.
pub(crate) fn spend_by_category(view: &LedgerView) -> HashMap<i64, f64> {
    let mut spending: HashMap<i64, f64> = HashMap::new();
    for row in view.expenses() {
        if let Some(category_id) = row.category_id {
            *spending.entry(category_id).or_insert(0.0) += row.amount;
        }
    }
    spending
}

/// Compare each budget against this month's actual spend. A zero (or
/// negative) limit yields 0%, never a division error, and therefore never
/// an alert. Output is sorted by percentage descending.
pub fn compute_budget_alerts(view: &LedgerView, budgets: &[Budget]) -> Vec<BudgetAlert> {
    let spending = spend_by_category(view);

    let mut alerts: Vec<BudgetAlert> = budgets
        .iter()
        .filter_map(|budget| {
            let limit = budget.monthly_limit.to_f64().unwrap_or(0.0);
            let spent = spending.get(&budget.category_id).copied().unwrap_or(0.0);
            let percentage = if limit > 0.0 { spent / limit * 100.0 } else { 0.0 };

            let level = AlertLevel::classify(percentage)?;
            Some(BudgetAlert {
                category_id: budget.category_id,
                category: budget.category_name.clone(),
                budget: round2(limit),
                spent: round2(spent),
                remaining: round2(limit - spent),
                percentage: round2(percentage),
                alert_level: level,
                message: format!(
                    "{}: {:.1}% of budget used",
                    budget.category_name, percentage
                ),
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    alerts
}

/// Alerts for every budgeted category against the current calendar month
/// (first of month through today, inclusive).
pub async fn budget_alerts(pool: &Pool<Sqlite>) -> anyhow::Result<Vec<BudgetAlert>> {
    let now = today();
    let view = read_ledger(pool, Some(first_of_month(now)), Some(now)).await?;
    let budgets = crate::database::db::queries::list_budgets(pool).await?;

    let alerts = compute_budget_alerts(&view, &budgets);
    debug!(budgets = budgets.len(), alerts = alerts.len(), "budget alerts computed");
    Ok(alerts)
}
