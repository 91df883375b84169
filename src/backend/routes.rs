use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            post(handlers::create_transaction).get(handlers::list_transactions),
        )
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        .route(
            "/budgets",
            post(handlers::create_budget).get(handlers::list_budgets),
        )
        .route("/budgets/:id", delete(handlers::delete_budget))
        .route(
            "/categories",
            post(handlers::create_category).get(handlers::list_categories),
        )
        .route("/analytics/monthly-trend", get(handlers::monthly_trend))
        .route("/analytics/spending-patterns", get(handlers::spending_patterns))
        .route("/analytics/top-categories", get(handlers::top_categories))
        .route("/analytics/unusual-spending", get(handlers::unusual_spending))
        .route("/analytics/budget-alerts", get(handlers::budget_alerts))
        .route(
            "/analytics/savings-opportunities",
            get(handlers::savings_opportunities),
        )
        .route("/analytics/predict-spending", get(handlers::predict_spending))
        .route("/analytics/predict-seasonal", get(handlers::predict_seasonal))
        .route(
            "/analytics/predict-by-category",
            get(handlers::predict_by_category),
        )
        .route("/analytics/forecast-year", get(handlers::forecast_year))
        .route(
            "/analytics/budget-exhaustion/:category_id",
            get(handlers::budget_exhaustion),
        )
}
