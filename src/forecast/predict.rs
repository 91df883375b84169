use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::analytics::ledger::{read_ledger, LedgerView};
use crate::analytics::trends::{last_n_months, monthly_totals, MonthlyTotal};
use crate::database::db::queries;
use crate::database::models::{Budget, TransactionKind};
use crate::forecast::regression::{linear_fit, quadratic_fit};
use crate::util::{
    add_months, days_in_month, first_of_month, month_key, parse_month_key, round2, today,
};

/// Trailing window of history fed into the models, in calendar-month buckets.
const HISTORY_MONTHS: usize = 12;
/// Slope magnitudes below this fraction of the monthly average read as flat.
const STABLE_SLOPE_FRACTION: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Increasing,
    Decreasing,
    Stable,
}

fn confidence_label(months: usize, r_squared: f64) -> Confidence {
    if months >= 12 && r_squared >= 0.7 {
        Confidence::High
    } else if months >= 6 && r_squared >= 0.5 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn trend_label(slope: f64, historical_avg: f64) -> TrendLabel {
    let threshold = STABLE_SLOPE_FRACTION * historical_avg.abs();
    if slope.abs() <= threshold {
        TrendLabel::Stable
    } else if slope > 0.0 {
        TrendLabel::Increasing
    } else {
        TrendLabel::Decreasing
    }
}

/// Next-month spending forecast from a least-squares line over the monthly
/// series. Too little history is a normal outcome carried in `message`,
/// never an error.
#[derive(Debug, Clone, Serialize)]
pub struct SpendingForecast {
    pub predicted_amount: f64,
    pub confidence: Confidence,
    pub trend: TrendLabel,
    pub model_accuracy: f64,
    pub historical_avg: f64,
    pub months_of_data: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SpendingForecast {
    fn insufficient(months: usize) -> Self {
        Self {
            predicted_amount: 0.0,
            confidence: Confidence::Low,
            trend: TrendLabel::Stable,
            model_accuracy: 0.0,
            historical_avg: 0.0,
            months_of_data: months,
            message: Some(
                "Not enough historical data: at least 3 months of expenses are needed".to_string(),
            ),
        }
    }
}

/// Linear mode: fit `amount = a * month_index + b` over the series and
/// predict one step past the end. Negative predictions clamp to 0.
pub fn forecast_linear(series: &[MonthlyTotal]) -> SpendingForecast {
    if series.len() < 3 {
        return SpendingForecast::insufficient(series.len());
    }

    let ys: Vec<f64> = series.iter().map(|m| m.total).collect();
    let fit = linear_fit(&ys);
    let historical_avg = ys.iter().sum::<f64>() / ys.len() as f64;
    let predicted = fit.predict(ys.len() as f64).max(0.0);

    SpendingForecast {
        predicted_amount: round2(predicted),
        confidence: confidence_label(ys.len(), fit.r_squared),
        trend: trend_label(fit.slope, historical_avg),
        model_accuracy: round2(fit.r_squared),
        historical_avg: round2(historical_avg),
        months_of_data: ys.len(),
        message: None,
    }
}

/// Seasonal mode output: a short projection that blends a quadratic trend
/// with same-calendar-month and recent averages.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonalForecast {
    pub predicted_next_month: f64,
    pub predicted_3_months: Vec<f64>,
    pub confidence: Confidence,
    pub trend: TrendLabel,
    pub uses_seasonality: bool,
    pub months_of_data: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Blend weights: 0.4 quadratic trend, 0.3 same-calendar-month average,
/// 0.3 last-3-month average. Below 6 months of history the seasonal terms
/// are unreliable and the forecast falls back to the linear model.
pub fn forecast_seasonal(series: &[MonthlyTotal], from: NaiveDate) -> SeasonalForecast {
    if series.len() < 3 {
        let lin = SpendingForecast::insufficient(series.len());
        return SeasonalForecast {
            predicted_next_month: 0.0,
            predicted_3_months: vec![],
            confidence: lin.confidence,
            trend: lin.trend,
            uses_seasonality: false,
            months_of_data: series.len(),
            message: lin.message,
        };
    }

    let ys: Vec<f64> = series.iter().map(|m| m.total).collect();
    let lin = linear_fit(&ys);
    let historical_avg = ys.iter().sum::<f64>() / ys.len() as f64;
    let trend = trend_label(lin.slope, historical_avg);

    if series.len() < 6 {
        let predictions: Vec<f64> = (0..3)
            .map(|k| round2(lin.predict((ys.len() + k) as f64).max(0.0)))
            .collect();
        return SeasonalForecast {
            predicted_next_month: predictions[0],
            predicted_3_months: predictions,
            confidence: confidence_label(ys.len(), lin.r_squared),
            trend,
            uses_seasonality: false,
            months_of_data: ys.len(),
            message: None,
        };
    }

    let quad = quadratic_fit(&ys);
    let recent_avg = ys[ys.len() - 3..].iter().sum::<f64>() / 3.0;

    let seasonal_avg = |target_month: u32| -> f64 {
        let same_month: Vec<f64> = series
            .iter()
            .filter(|m| parse_month_key(&m.month).map(|(_, mo)| mo) == Some(target_month))
            .map(|m| m.total)
            .collect();
        if same_month.is_empty() {
            historical_avg
        } else {
            same_month.iter().sum::<f64>() / same_month.len() as f64
        }
    };

    let predictions: Vec<f64> = (1..=3u32)
        .map(|k| {
            let (_, target_month) = add_months(from.year(), from.month(), k);
            let trend_part = quad.predict((ys.len() + k as usize - 1) as f64);
            let blended =
                0.4 * trend_part + 0.3 * seasonal_avg(target_month) + 0.3 * recent_avg;
            round2(blended.max(0.0))
        })
        .collect();

    SeasonalForecast {
        predicted_next_month: predictions[0],
        predicted_3_months: predictions,
        confidence: confidence_label(ys.len(), quad.r_squared),
        trend,
        uses_seasonality: true,
        months_of_data: ys.len(),
        message: None,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthForecast {
    pub month: String,
    pub predicted_amount: f64,
}

/// Twelve projected months from the end of the historical series.
#[derive(Debug, Clone, Serialize)]
pub struct YearForecast {
    pub monthly_forecasts: Vec<MonthForecast>,
    pub total_predicted_spending: f64,
    pub avg_monthly_spending: f64,
    pub trend: TrendLabel,
    pub confidence: Confidence,
    pub based_on_months: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Iterate the fitted line 12 steps forward, labelling each step by
/// advancing from the current month.
pub fn forecast_year_from(series: &[MonthlyTotal], from: NaiveDate) -> YearForecast {
    if series.len() < 3 {
        return YearForecast {
            monthly_forecasts: vec![],
            total_predicted_spending: 0.0,
            avg_monthly_spending: 0.0,
            trend: TrendLabel::Stable,
            confidence: Confidence::Low,
            based_on_months: series.len(),
            message: Some(
                "Not enough historical data: at least 3 months of expenses are needed".to_string(),
            ),
        };
    }

    let ys: Vec<f64> = series.iter().map(|m| m.total).collect();
    let fit = linear_fit(&ys);
    let historical_avg = ys.iter().sum::<f64>() / ys.len() as f64;

    let monthly_forecasts: Vec<MonthForecast> = (1..=12u32)
        .map(|k| {
            let (year, month) = add_months(from.year(), from.month(), k);
            MonthForecast {
                month: month_key(year, month),
                predicted_amount: round2(fit.predict((ys.len() + k as usize - 1) as f64).max(0.0)),
            }
        })
        .collect();

    let total: f64 = monthly_forecasts.iter().map(|m| m.predicted_amount).sum();

    YearForecast {
        total_predicted_spending: round2(total),
        avg_monthly_spending: round2(total / 12.0),
        trend: trend_label(fit.slope, historical_avg),
        confidence: confidence_label(ys.len(), fit.r_squared),
        based_on_months: ys.len(),
        monthly_forecasts,
        message: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionStatus {
    Exhausted,
    NoSpending,
    AtRisk,
    OnTrack,
}

/// Projection of when a category's monthly budget runs out given the
/// spending rate so far this month.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetExhaustion {
    pub category_id: i64,
    pub category: String,
    pub budget_limit: f64,
    pub current_spending: f64,
    pub remaining: f64,
    pub daily_spending_rate: f64,
    pub days_elapsed: u32,
    pub days_remaining: u32,
    pub status: ExhaustionStatus,
    pub days_until_exhaustion: Option<f64>,
    pub projected_month_end_spending: f64,
    pub will_exceed_budget: bool,
    pub message: String,
}

pub fn compute_budget_exhaustion(budget: &Budget, spent: f64, now: NaiveDate) -> BudgetExhaustion {
    let limit = budget.monthly_limit.to_f64().unwrap_or(0.0);
    let days_elapsed = now.day().max(1);
    let days_remaining = days_in_month(now).saturating_sub(now.day());
    let daily_rate = spent / days_elapsed as f64;
    let remaining = limit - spent;
    let projected = spent + daily_rate * days_remaining as f64;

    let (status, days_until, will_exceed, message) = if remaining <= 0.0 && spent > 0.0 {
        (
            ExhaustionStatus::Exhausted,
            Some(0.0),
            true,
            format!(
                "Budget already exhausted: {:.2} over the {:.2} limit",
                -remaining, limit
            ),
        )
    } else if daily_rate <= 0.0 {
        (
            ExhaustionStatus::NoSpending,
            None,
            false,
            "No spending recorded this month".to_string(),
        )
    } else {
        let days = remaining / daily_rate;
        let exceeds = days <= days_remaining as f64;
        let status = if exceeds {
            ExhaustionStatus::AtRisk
        } else {
            ExhaustionStatus::OnTrack
        };
        let message = if exceeds {
            format!(
                "At the current rate the budget runs out in about {:.0} days, before month end",
                days
            )
        } else {
            "Spending is on track to stay within budget this month".to_string()
        };
        (status, Some(round2(days)), exceeds, message)
    };

    BudgetExhaustion {
        category_id: budget.category_id,
        category: budget.category_name.clone(),
        budget_limit: round2(limit),
        current_spending: round2(spent),
        remaining: round2(remaining),
        daily_spending_rate: round2(daily_rate),
        days_elapsed,
        days_remaining,
        status,
        days_until_exhaustion: days_until,
        projected_month_end_spending: round2(projected),
        will_exceed_budget: will_exceed,
        message,
    }
}

/// Per-category linear forecast, used for the ranked category view.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryForecast {
    pub category_id: i64,
    pub category: String,
    pub predicted_amount: f64,
    pub trend: TrendLabel,
    pub confidence: Confidence,
}

async fn history_view(pool: &Pool<Sqlite>) -> Result<LedgerView, sqlx::Error> {
    let now = today();
    let start = now.checked_sub_days(Days::new(365)).unwrap_or(now);
    read_ledger(pool, Some(start), Some(now)).await
}

fn history_series(view: &LedgerView, category: Option<&str>) -> Vec<MonthlyTotal> {
    last_n_months(
        monthly_totals(view, TransactionKind::Expense, category),
        HISTORY_MONTHS,
    )
}

/// Forecast next month's spending, overall or for one category by name.
pub async fn predict_next_month(
    pool: &Pool<Sqlite>,
    category: Option<&str>,
) -> anyhow::Result<SpendingForecast> {
    let view = history_view(pool).await?;
    Ok(forecast_linear(&history_series(&view, category)))
}

/// Seasonal-blend forecast for the next three months.
pub async fn predict_seasonal(
    pool: &Pool<Sqlite>,
    category: Option<&str>,
) -> anyhow::Result<SeasonalForecast> {
    let view = history_view(pool).await?;
    Ok(forecast_seasonal(&history_series(&view, category), today()))
}

/// Linear forecast for every expense category with enough history, ranked
/// by predicted amount descending.
pub async fn predict_by_category(pool: &Pool<Sqlite>) -> anyhow::Result<Vec<CategoryForecast>> {
    let view = history_view(pool).await?;
    let categories = queries::list_categories(pool, Some(TransactionKind::Expense)).await?;

    let mut forecasts: Vec<CategoryForecast> = categories
        .into_iter()
        .filter_map(|category| {
            let series = history_series(&view, Some(category.name.as_str()));
            if series.len() < 3 {
                return None; // not enough history for this category
            }
            let forecast = forecast_linear(&series);
            Some(CategoryForecast {
                category_id: category.category_id,
                category: category.name,
                predicted_amount: forecast.predicted_amount,
                trend: forecast.trend,
                confidence: forecast.confidence,
            })
        })
        .collect();

    forecasts.sort_by(|a, b| {
        b.predicted_amount
            .partial_cmp(&a.predicted_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    Ok(forecasts)
}

/// Twelve-month projection of overall expenses.
pub async fn forecast_year(pool: &Pool<Sqlite>) -> anyhow::Result<YearForecast> {
    let view = history_view(pool).await?;
    Ok(forecast_year_from(&history_series(&view, None), today()))
}

/// Budget exhaustion projection for one category. `Ok(None)` means the
/// category has no budget configured.
pub async fn predict_budget_exhaustion(
    pool: &Pool<Sqlite>,
    category_id: i64,
) -> anyhow::Result<Option<BudgetExhaustion>> {
    let Some(budget) = queries::get_budget_by_category(pool, category_id).await? else {
        return Ok(None);
    };

    let now = today();
    let view = read_ledger(pool, Some(first_of_month(now)), Some(now)).await?;
    let spent: f64 = view
        .expenses()
        .filter(|r| r.category_id == Some(category_id))
        .map(|r| r.amount)
        .sum();

    Ok(Some(compute_budget_exhaustion(&budget, spent, now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn series(totals: &[f64]) -> Vec<MonthlyTotal> {
        totals
            .iter()
            .enumerate()
            .map(|(i, &total)| MonthlyTotal {
                month: month_key(2024, 1 + i as u32),
                total,
            })
            .collect()
    }

    fn budget(limit: i64) -> Budget {
        Budget {
            budget_id: 1,
            category_id: 1,
            category_name: "Food".to_string(),
            monthly_limit: Decimal::from(limit),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn steady_growth_predicts_high_confidence_increase() {
        // 12 months increasing by a constant 20 from a base of 100
        let totals: Vec<f64> = (0..12).map(|i| 100.0 + 20.0 * i as f64).collect();
        let forecast = forecast_linear(&series(&totals));

        assert!((forecast.predicted_amount - 340.0).abs() < 1.0);
        assert_eq!(forecast.trend, TrendLabel::Increasing);
        assert_eq!(forecast.confidence, Confidence::High);
        assert!(forecast.model_accuracy > 0.99);
        assert!(forecast.message.is_none());
    }

    #[test]
    fn two_months_is_insufficient() {
        let forecast = forecast_linear(&series(&[100.0, 120.0]));
        assert_eq!(forecast.predicted_amount, 0.0);
        assert_eq!(forecast.confidence, Confidence::Low);
        assert!(forecast.message.is_some());
    }

    #[test]
    fn declining_series_never_predicts_negative() {
        let forecast = forecast_linear(&series(&[100.0, 60.0, 20.0]));
        assert_eq!(forecast.predicted_amount, 0.0);
        assert_eq!(forecast.trend, TrendLabel::Decreasing);
        assert!(forecast.message.is_none());
    }

    #[test]
    fn flat_series_reads_stable() {
        let forecast = forecast_linear(&series(&[200.0, 201.0, 199.0, 200.0, 200.0, 200.0]));
        assert_eq!(forecast.trend, TrendLabel::Stable);
        assert!((forecast.predicted_amount - 200.0).abs() < 5.0);
    }

    #[test]
    fn seasonal_falls_back_to_linear_below_six_months() {
        let forecast = forecast_seasonal(
            &series(&[100.0, 110.0, 120.0, 130.0]),
            NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
        );
        assert!(!forecast.uses_seasonality);
        assert_eq!(forecast.predicted_3_months.len(), 3);
        assert!(forecast.predicted_next_month > 0.0);
    }

    #[test]
    fn seasonal_blend_with_enough_history() {
        let totals: Vec<f64> = (0..12).map(|i| 100.0 + 10.0 * i as f64).collect();
        let forecast = forecast_seasonal(
            &series(&totals),
            NaiveDate::from_ymd_opt(2024, 12, 10).unwrap(),
        );
        assert!(forecast.uses_seasonality);
        assert_eq!(forecast.predicted_3_months.len(), 3);
        assert!(forecast.predicted_next_month > 0.0);
        assert!(forecast.message.is_none());
    }

    #[test]
    fn year_forecast_advances_month_labels() {
        let totals: Vec<f64> = (0..6).map(|i| 100.0 + 10.0 * i as f64).collect();
        let from = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap();
        let forecast = forecast_year_from(&series(&totals), from);

        assert_eq!(forecast.monthly_forecasts.len(), 12);
        assert_eq!(forecast.monthly_forecasts[0].month, "2025-12");
        assert_eq!(forecast.monthly_forecasts[1].month, "2026-01");
        assert_eq!(forecast.monthly_forecasts[11].month, "2026-11");
        assert_eq!(forecast.based_on_months, 6);

        let sum: f64 = forecast
            .monthly_forecasts
            .iter()
            .map(|m| m.predicted_amount)
            .sum();
        assert!((forecast.total_predicted_spending - round2(sum)).abs() < 0.01);
    }

    #[test]
    fn year_forecast_insufficient_data_is_a_value() {
        let forecast = forecast_year_from(&series(&[50.0]), today());
        assert!(forecast.monthly_forecasts.is_empty());
        assert_eq!(forecast.confidence, Confidence::Low);
        assert!(forecast.message.is_some());
    }

    #[test]
    fn exhaustion_already_over_budget() {
        let now = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap();
        let report = compute_budget_exhaustion(&budget(500), 620.0, now);

        assert_eq!(report.status, ExhaustionStatus::Exhausted);
        assert!(report.will_exceed_budget);
        assert_eq!(report.remaining, -120.0);
    }

    #[test]
    fn exhaustion_no_spending_has_no_projection() {
        let now = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap();
        let report = compute_budget_exhaustion(&budget(500), 0.0, now);

        assert_eq!(report.status, ExhaustionStatus::NoSpending);
        assert_eq!(report.days_until_exhaustion, None);
        assert!(!report.will_exceed_budget);
        assert_eq!(report.projected_month_end_spending, 0.0);
    }

    #[test]
    fn exhaustion_at_risk_before_month_end() {
        // Aug 20: 300 spent of 400 -> rate 15/day, 100 left lasts ~6.7 of 11
        // remaining days
        let now = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap();
        let report = compute_budget_exhaustion(&budget(400), 300.0, now);

        assert_eq!(report.status, ExhaustionStatus::AtRisk);
        assert!(report.will_exceed_budget);
        assert_eq!(report.days_elapsed, 20);
        assert_eq!(report.days_remaining, 11);
        assert_eq!(report.daily_spending_rate, 15.0);
        assert_eq!(report.projected_month_end_spending, 465.0);
        assert!((report.days_until_exhaustion.unwrap() - 6.67).abs() < 0.01);
    }

    #[test]
    fn exhaustion_on_track_with_slow_spending() {
        let now = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap();
        let report = compute_budget_exhaustion(&budget(1000), 200.0, now);

        assert_eq!(report.status, ExhaustionStatus::OnTrack);
        assert!(!report.will_exceed_budget);
        assert_eq!(report.projected_month_end_spending, 310.0);
    }
}
