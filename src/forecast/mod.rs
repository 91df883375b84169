//! Regression-based spending forecasts. Heuristic projections, not a
//! validated statistical model; every entry point degrades to a low
//! confidence structured result when history is thin.

pub mod predict;
pub mod regression;

pub use predict::{
    forecast_year, predict_budget_exhaustion, predict_by_category, predict_next_month,
    predict_seasonal, BudgetExhaustion, CategoryForecast, Confidence, SeasonalForecast,
    SpendingForecast, TrendLabel, YearForecast,
};
