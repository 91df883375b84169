use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analytics::{self, ledger, patterns, trends};
use crate::backend::AppState;
use crate::database::db::queries::{self, TransactionFilter};
use crate::database::models::{TransactionKind, TransactionRecord};
use crate::forecast;
use crate::util::round2;

/// anyhow -> 500 bridge so handlers can use `?` on core calls.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "internal server error" })),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

type ApiResult<T> = Result<T, AppError>;

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("{} not found", what) })),
    )
        .into_response()
}

fn bad_request(detail: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "detail": detail })),
    )
        .into_response()
}

/*==========Transactions===========*/

#[derive(Debug, Deserialize)]
pub struct CreateTransactionReq {
    pub date: NaiveDate,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub category: String,
    pub description: Option<String>,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(r: TransactionRecord) -> Self {
        Self {
            id: r.transaction_id,
            date: r.txn_date,
            amount: round2(r.amount.to_f64().unwrap_or(0.0)),
            kind: r.kind,
            category_id: r.category_id,
            category: r.category_name,
            description: r.description,
        }
    }
}

fn parse_amount(amount: f64) -> Result<Decimal, Response> {
    if amount < 0.0 || !amount.is_finite() {
        return Err(bad_request("amount must be a non-negative number"));
    }
    Decimal::from_f64(amount).ok_or_else(|| bad_request("amount is not representable"))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(req): Json<CreateTransactionReq>,
) -> ApiResult<Response> {
    let amount = match parse_amount(req.amount) {
        Ok(a) => a,
        Err(resp) => return Ok(resp),
    };

    let id = queries::create_transaction(
        &state.db,
        req.date,
        amount,
        req.kind,
        req.category_id,
        req.description.as_deref(),
    )
    .await?;

    match queries::get_transaction(&state.db, id).await? {
        Some(record) => Ok((
            StatusCode::CREATED,
            Json(TransactionResponse::from(record)),
        )
            .into_response()),
        None => Ok(not_found("transaction")),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub kind: Option<TransactionKind>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(q): Query<ListTransactionsQuery>,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    let records = queries::list_transactions(
        &state.db,
        TransactionFilter {
            start_date: q.start_date,
            end_date: q.end_date,
            category_id: q.category_id,
            kind: q.kind,
        },
    )
    .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    match queries::get_transaction(&state.db, id).await? {
        Some(record) => Ok(Json(TransactionResponse::from(record)).into_response()),
        None => Ok(not_found("transaction")),
    }
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateTransactionReq>,
) -> ApiResult<Response> {
    let amount = match parse_amount(req.amount) {
        Ok(a) => a,
        Err(resp) => return Ok(resp),
    };

    let updated = queries::update_transaction(
        &state.db,
        id,
        req.date,
        amount,
        req.kind,
        req.category_id,
        req.description.as_deref(),
    )
    .await?;

    if !updated {
        return Ok(not_found("transaction"));
    }
    match queries::get_transaction(&state.db, id).await? {
        Some(record) => Ok(Json(TransactionResponse::from(record)).into_response()),
        None => Ok(not_found("transaction")),
    }
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    if queries::delete_transaction(&state.db, id).await? {
        Ok(Json(json!({ "message": "transaction deleted" })).into_response())
    } else {
        Ok(not_found("transaction"))
    }
}

/*==========Budgets===========*/

#[derive(Debug, Deserialize)]
pub struct CreateBudgetReq {
    pub category_id: i64,
    pub monthly_limit: f64,
    pub start_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub id: i64,
    pub category_id: i64,
    pub category: String,
    pub monthly_limit: f64,
    pub start_date: NaiveDate,
}

impl From<crate::database::models::Budget> for BudgetResponse {
    fn from(b: crate::database::models::Budget) -> Self {
        Self {
            id: b.budget_id,
            category_id: b.category_id,
            category: b.category_name,
            monthly_limit: round2(b.monthly_limit.to_f64().unwrap_or(0.0)),
            start_date: b.start_date,
        }
    }
}

pub async fn create_budget(
    State(state): State<AppState>,
    Json(req): Json<CreateBudgetReq>,
) -> ApiResult<Response> {
    let limit = match parse_amount(req.monthly_limit) {
        Ok(a) => a,
        Err(resp) => return Ok(resp),
    };
    if queries::get_category(&state.db, req.category_id).await?.is_none() {
        return Ok(not_found("category"));
    }

    queries::create_budget(&state.db, req.category_id, limit, req.start_date).await?;
    match queries::get_budget_by_category(&state.db, req.category_id).await? {
        Some(budget) => {
            Ok((StatusCode::CREATED, Json(BudgetResponse::from(budget))).into_response())
        }
        None => Ok(not_found("budget")),
    }
}

pub async fn list_budgets(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<BudgetResponse>>> {
    let budgets = queries::list_budgets(&state.db).await?;
    Ok(Json(budgets.into_iter().map(Into::into).collect()))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    if queries::delete_budget(&state.db, id).await? {
        Ok(Json(json!({ "message": "budget deleted" })).into_response())
    } else {
        Ok(not_found("budget"))
    }
}

/*==========Categories===========*/

#[derive(Debug, Deserialize)]
pub struct CreateCategoryReq {
    pub name: String,
    pub kind: TransactionKind,
}

#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    pub kind: Option<TransactionKind>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub kind: TransactionKind,
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryReq>,
) -> ApiResult<Response> {
    if queries::get_category_by_name(&state.db, &req.name).await?.is_some() {
        return Ok(bad_request("category name already exists"));
    }

    let id = queries::create_category(&state.db, &req.name, req.kind).await?;
    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            id,
            name: req.name,
            kind: req.kind,
        }),
    )
        .into_response())
}

pub async fn list_categories(
    State(state): State<AppState>,
    Query(q): Query<ListCategoriesQuery>,
) -> ApiResult<Json<Vec<CategoryResponse>>> {
    let categories = queries::list_categories(&state.db, q.kind).await?;
    Ok(Json(
        categories
            .into_iter()
            .map(|c| CategoryResponse {
                id: c.category_id,
                name: c.name,
                kind: c.kind,
            })
            .collect(),
    ))
}

/*==========Analytics===========*/

#[derive(Debug, Deserialize)]
pub struct MonthlyTrendQuery {
    pub months: Option<usize>,
    pub category: Option<String>,
}

pub async fn monthly_trend(
    State(state): State<AppState>,
    Query(q): Query<MonthlyTrendQuery>,
) -> ApiResult<Json<Vec<trends::MonthlyTotal>>> {
    let view = ledger::read_ledger(&state.db, None, None).await?;
    let series = trends::monthly_totals(&view, TransactionKind::Expense, q.category.as_deref());
    Ok(Json(trends::last_n_months(series, q.months.unwrap_or(6))))
}

pub async fn spending_patterns(
    State(state): State<AppState>,
) -> ApiResult<Json<patterns::SpendingPatterns>> {
    let view = ledger::read_ledger(&state.db, None, None).await?;
    Ok(Json(patterns::spending_patterns(&view)))
}

#[derive(Debug, Deserialize)]
pub struct TopCategoriesQuery {
    pub limit: Option<usize>,
}

pub async fn top_categories(
    State(state): State<AppState>,
    Query(q): Query<TopCategoriesQuery>,
) -> ApiResult<Json<Vec<patterns::CategoryTotal>>> {
    let view = ledger::read_ledger(&state.db, None, None).await?;
    Ok(Json(patterns::top_categories(&view, q.limit.unwrap_or(5))))
}

pub async fn unusual_spending(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<analytics::anomalies::UnusualTransaction>>> {
    Ok(Json(analytics::unusual_transactions(&state.db).await?))
}

pub async fn budget_alerts(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<analytics::alerts::BudgetAlert>>> {
    Ok(Json(analytics::budget_alerts(&state.db).await?))
}

pub async fn savings_opportunities(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<analytics::advisor::SavingsOpportunity>>> {
    Ok(Json(analytics::savings_opportunities(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub category: Option<String>,
}

pub async fn predict_spending(
    State(state): State<AppState>,
    Query(q): Query<PredictQuery>,
) -> ApiResult<Json<forecast::SpendingForecast>> {
    Ok(Json(
        forecast::predict_next_month(&state.db, q.category.as_deref()).await?,
    ))
}

pub async fn predict_seasonal(
    State(state): State<AppState>,
    Query(q): Query<PredictQuery>,
) -> ApiResult<Json<forecast::SeasonalForecast>> {
    Ok(Json(
        forecast::predict_seasonal(&state.db, q.category.as_deref()).await?,
    ))
}

pub async fn predict_by_category(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<forecast::CategoryForecast>>> {
    Ok(Json(forecast::predict_by_category(&state.db).await?))
}

pub async fn forecast_year(
    State(state): State<AppState>,
) -> ApiResult<Json<forecast::YearForecast>> {
    Ok(Json(forecast::forecast_year(&state.db).await?))
}

pub async fn budget_exhaustion(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> ApiResult<Response> {
    match forecast::predict_budget_exhaustion(&state.db, category_id).await? {
        Some(report) => Ok(Json(report).into_response()),
        None => Ok(not_found("budget for category")),
    }
}
