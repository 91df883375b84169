use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::analytics::alerts::spend_by_category;
use crate::analytics::ledger::{read_ledger, LedgerView};
use crate::database::models::Budget;
use crate::util::{first_of_month, round2, today};

#[derive(Debug, Clone, Serialize)]
pub struct SavingsOpportunity {
    pub category: String,
    pub current_spending: f64,
    pub budget_limit: f64,
    pub percentage_used: f64,
    pub status: String,
    pub potential_savings: f64,
    pub recommendation: String,
}

/// Suggest cutbacks for categories that have burned through more than 75%
/// of their monthly budget, targeting 80% of the limit. Sorted with the
/// most critical (highest share of budget used) first; no budgets or no
/// category over the threshold yields an empty list.
pub fn compute_savings_opportunities(
    view: &LedgerView,
    budgets: &[Budget],
) -> Vec<SavingsOpportunity> {
    let spending = spend_by_category(view);

    let mut opportunities: Vec<SavingsOpportunity> = budgets
        .iter()
        .filter_map(|budget| {
            let limit = budget.monthly_limit.to_f64().unwrap_or(0.0);
            if limit <= 0.0 {
                return None;
            }
            let spent = spending.get(&budget.category_id).copied().unwrap_or(0.0);
            if spent <= limit * 0.75 {
                return None;
            }

            let percentage_used = spent / limit * 100.0;
            let potential_savings = (spent - limit * 0.8).max(0.0);
            let status = if spent > limit {
                "Over Budget"
            } else {
                "Approaching Limit"
            };

            Some(SavingsOpportunity {
                category: budget.category_name.clone(),
                current_spending: round2(spent),
                budget_limit: round2(limit),
                percentage_used: round2(percentage_used),
                status: status.to_string(),
                potential_savings: round2(potential_savings),
                recommendation: format!(
                    "You've used {:.0}% of your {} budget. Try to limit spending here for the rest of the month.",
                    percentage_used, budget.category_name
                ),
            })
        })
        .collect();

    opportunities.sort_by(|a, b| {
        b.percentage_used
            .partial_cmp(&a.percentage_used)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    opportunities
}

/// Ranked savings suggestions for the current calendar month.
pub async fn savings_opportunities(pool: &Pool<Sqlite>) -> anyhow::Result<Vec<SavingsOpportunity>> {
    let now = today();
    let view = read_ledger(pool, Some(first_of_month(now)), Some(now)).await?;
    let budgets = crate::database::db::queries::list_budgets(pool).await?;
    Ok(compute_savings_opportunities(&view, &budgets))
}
