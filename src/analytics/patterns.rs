use std::collections::HashMap;

use chrono::{Datelike, Weekday};
use serde::Serialize;

use crate::analytics::ledger::LedgerView;
use crate::util::round2;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayTotal {
    pub day: String,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PeriodTotal {
    pub period: String,
    pub total: f64,
}

/// Distributional summary of expense behaviour: weekday-vs-weekend
/// averages, per-weekday totals, and beginning/middle/end-of-month totals.
#[derive(Debug, Clone, Serialize)]
pub struct SpendingPatterns {
    pub weekday_avg: f64,
    pub weekend_avg: f64,
    pub by_day_of_week: Vec<DayTotal>,
    pub by_month_period: Vec<PeriodTotal>,
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(w: Weekday) -> &'static str {
    match w {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Expense categories ranked by total spend, descending. Ties break on
/// category name ascending so the ranking is deterministic.
pub fn top_categories(view: &LedgerView, limit: usize) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for row in view.expenses() {
        *totals.entry(row.category_name.as_str()).or_insert(0.0) += row.amount;
    }

    let mut ranked: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category: category.to_string(),
            amount: round2(amount),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    ranked.truncate(limit);
    ranked
}

fn avg(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}

/// All seven weekdays are always present in the output, zero-filled when a
/// day has no spend; empty weekday/weekend subsets average to 0, never NaN.
pub fn spending_patterns(view: &LedgerView) -> SpendingPatterns {
    let mut day_totals: HashMap<Weekday, f64> = HashMap::new();
    let mut period_totals = [0.0_f64; 3]; // Beginning / Middle / End
    let (mut weekday_sum, mut weekday_n) = (0.0, 0usize);
    let (mut weekend_sum, mut weekend_n) = (0.0, 0usize);

    for row in view.expenses() {
        let weekday = row.date.weekday();
        *day_totals.entry(weekday).or_insert(0.0) += row.amount;

        if matches!(weekday, Weekday::Sat | Weekday::Sun) {
            weekend_sum += row.amount;
            weekend_n += 1;
        } else {
            weekday_sum += row.amount;
            weekday_n += 1;
        }

        let slot = match row.date.day() {
            1..=10 => 0,
            11..=20 => 1,
            _ => 2,
        };
        period_totals[slot] += row.amount;
    }

    let by_day_of_week = WEEKDAYS
        .iter()
        .map(|&w| DayTotal {
            day: weekday_name(w).to_string(),
            total: round2(day_totals.get(&w).copied().unwrap_or(0.0)),
        })
        .collect();

    let by_month_period = ["Beginning", "Middle", "End"]
        .iter()
        .zip(period_totals.iter())
        .map(|(name, &total)| PeriodTotal {
            period: name.to_string(),
            total: round2(total),
        })
        .collect();

    SpendingPatterns {
        weekday_avg: avg(weekday_sum, weekday_n),
        weekend_avg: avg(weekend_sum, weekend_n),
        by_day_of_week,
        by_month_period,
    }
}
