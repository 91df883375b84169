use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

use crate::database::models::{Budget, Category, TransactionKind, TransactionRecord};

/*
CRUD queries for categories, transactions and budgets. Everything goes
through the runtime query API with explicit binds; money is stored as
TEXT and parsed back into Decimal on the way out.
 */

fn decode_decimal(s: &str, column: &str) -> Result<Decimal, sqlx::Error> {
    Decimal::from_str_exact(s)
        .map_err(|e| sqlx::Error::Decode(format!("invalid decimal in {}: {}", column, e).into()))
}

fn decode_kind(s: &str) -> Result<TransactionKind, sqlx::Error> {
    TransactionKind::parse(s)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown transaction kind: {}", s).into()))
}

/*==========Category Queries===========*/

pub async fn create_category(
    pool: &Pool<Sqlite>,
    name: &str,
    kind: TransactionKind,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO categories (name, kind)
        VALUES (?, ?)
        RETURNING category_id
        "#,
    )
    .bind(name)
    .bind(kind.as_str())
    .fetch_one(pool)
    .await?;

    row.try_get("category_id")
}

fn category_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Category, sqlx::Error> {
    let kind: String = row.try_get("kind")?;
    Ok(Category {
        category_id: row.try_get("category_id")?,
        name: row.try_get("name")?,
        kind: decode_kind(&kind)?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn get_category(
    pool: &Pool<Sqlite>,
    category_id: i64,
) -> Result<Option<Category>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT category_id, name, kind, created_at
        FROM categories
        WHERE category_id = ?
        "#,
    )
    .bind(category_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(category_from_row).transpose()
}

pub async fn get_category_by_name(
    pool: &Pool<Sqlite>,
    name: &str,
) -> Result<Option<Category>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT category_id, name, kind, created_at
        FROM categories
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(category_from_row).transpose()
}

pub async fn list_categories(
    pool: &Pool<Sqlite>,
    kind: Option<TransactionKind>,
) -> Result<Vec<Category>, sqlx::Error> {
    let mut qb =
        QueryBuilder::new("SELECT category_id, name, kind, created_at FROM categories WHERE 1 = 1");
    if let Some(kind) = kind {
        qb.push(" AND kind = ").push_bind(kind.as_str());
    }
    qb.push(" ORDER BY name ASC");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(category_from_row).collect()
}

/*==========Transaction Queries===========*/

pub async fn create_transaction(
    pool: &Pool<Sqlite>,
    txn_date: NaiveDate,
    amount: Decimal,
    kind: TransactionKind,
    category_id: Option<i64>,
    description: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let amount_str = amount.to_string();

    let row = sqlx::query(
        r#"
        INSERT INTO transactions (txn_date, amount, kind, category_id, description)
        VALUES (?, ?, ?, ?, ?)
        RETURNING transaction_id
        "#,
    )
    .bind(txn_date)
    .bind(amount_str)
    .bind(kind.as_str())
    .bind(category_id)
    .bind(description)
    .fetch_one(pool)
    .await?;

    row.try_get("transaction_id")
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<TransactionRecord, sqlx::Error> {
    let amount_text: String = row.try_get("amount")?;
    let kind: String = row.try_get("kind")?;
    // LEFT JOIN leaves the name NULL for dangling category references
    let category_name: Option<String> = row.try_get("category_name")?;

    Ok(TransactionRecord {
        transaction_id: row.try_get("transaction_id")?,
        txn_date: row.try_get("txn_date")?,
        amount: decode_decimal(&amount_text, "amount")?,
        kind: decode_kind(&kind)?,
        category_id: row.try_get("category_id")?,
        category_name: category_name.unwrap_or_else(|| "Unknown".to_string()),
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Optional filters for `list_transactions`. Date bounds are inclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub kind: Option<TransactionKind>,
}

const SELECT_RECORD: &str = r#"
        SELECT
            t.transaction_id,
            t.txn_date,
            t.amount,
            t.kind,
            t.category_id,
            c.name AS category_name,
            t.description,
            t.created_at
        FROM transactions t
        LEFT JOIN categories c ON c.category_id = t.category_id
        "#;

pub async fn list_transactions(
    pool: &Pool<Sqlite>,
    filter: TransactionFilter,
) -> Result<Vec<TransactionRecord>, sqlx::Error> {
    let mut qb = QueryBuilder::new(SELECT_RECORD);
    qb.push(" WHERE 1 = 1");

    if let Some(start) = filter.start_date {
        qb.push(" AND t.txn_date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND t.txn_date <= ").push_bind(end);
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND t.category_id = ").push_bind(category_id);
    }
    if let Some(kind) = filter.kind {
        qb.push(" AND t.kind = ").push_bind(kind.as_str());
    }
    qb.push(" ORDER BY t.txn_date DESC, t.transaction_id DESC");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(record_from_row).collect()
}

pub async fn get_transaction(
    pool: &Pool<Sqlite>,
    transaction_id: i64,
) -> Result<Option<TransactionRecord>, sqlx::Error> {
    let mut qb = QueryBuilder::new(SELECT_RECORD);
    qb.push(" WHERE t.transaction_id = ").push_bind(transaction_id);

    let row = qb.build().fetch_optional(pool).await?;
    row.as_ref().map(record_from_row).transpose()
}

pub async fn update_transaction(
    pool: &Pool<Sqlite>,
    transaction_id: i64,
    txn_date: NaiveDate,
    amount: Decimal,
    kind: TransactionKind,
    category_id: Option<i64>,
    description: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let amount_str = amount.to_string();

    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET txn_date = ?, amount = ?, kind = ?, category_id = ?, description = ?
        WHERE transaction_id = ?
        "#,
    )
    .bind(txn_date)
    .bind(amount_str)
    .bind(kind.as_str())
    .bind(category_id)
    .bind(description)
    .bind(transaction_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_transaction(
    pool: &Pool<Sqlite>,
    transaction_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE transaction_id = ?")
        .bind(transaction_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/*==========Budget Queries===========*/

// One budget per category: re-creating a budget for the same category
// replaces its limit and start date.
pub async fn create_budget(
    pool: &Pool<Sqlite>,
    category_id: i64,
    monthly_limit: Decimal,
    start_date: NaiveDate,
) -> Result<i64, sqlx::Error> {
    let limit_str = monthly_limit.to_string();

    let row = sqlx::query(
        r#"
        INSERT INTO budgets (category_id, monthly_limit, start_date)
        VALUES (?, ?, ?)
        ON CONFLICT (category_id)
        DO UPDATE SET monthly_limit = excluded.monthly_limit,
                      start_date = excluded.start_date
        RETURNING budget_id
        "#,
    )
    .bind(category_id)
    .bind(limit_str)
    .bind(start_date)
    .fetch_one(pool)
    .await?;

    row.try_get("budget_id")
}

fn budget_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Budget, sqlx::Error> {
    let limit_text: String = row.try_get("monthly_limit")?;
    let category_name: Option<String> = row.try_get("category_name")?;

    Ok(Budget {
        budget_id: row.try_get("budget_id")?,
        category_id: row.try_get("category_id")?,
        category_name: category_name.unwrap_or_else(|| "Unknown".to_string()),
        monthly_limit: decode_decimal(&limit_text, "monthly_limit")?,
        start_date: row.try_get("start_date")?,
        created_at: row.try_get("created_at")?,
    })
}

const SELECT_BUDGET: &str = r#"
        SELECT
            b.budget_id,
            b.category_id,
            c.name AS category_name,
            b.monthly_limit,
            b.start_date,
            b.created_at
        FROM budgets b
        LEFT JOIN categories c ON c.category_id = b.category_id
        "#;

pub async fn list_budgets(pool: &Pool<Sqlite>) -> Result<Vec<Budget>, sqlx::Error> {
    let mut qb = QueryBuilder::new(SELECT_BUDGET);
    qb.push(" ORDER BY b.budget_id ASC");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(budget_from_row).collect()
}

pub async fn get_budget_by_category(
    pool: &Pool<Sqlite>,
    category_id: i64,
) -> Result<Option<Budget>, sqlx::Error> {
    let mut qb = QueryBuilder::new(SELECT_BUDGET);
    qb.push(" WHERE b.category_id = ").push_bind(category_id);

    let row = qb.build().fetch_optional(pool).await?;
    row.as_ref().map(budget_from_row).transpose()
}

pub async fn delete_budget(pool: &Pool<Sqlite>, budget_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM budgets WHERE budget_id = ?")
        .bind(budget_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
