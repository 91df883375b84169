//! Persistence round-trip tests against an in-memory sqlite database.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use expense_tracker::database::db::queries::{self, TransactionFilter};
use expense_tracker::database::models::TransactionKind;

async fn setup() -> Pool<Sqlite> {
    // a single connection keeps every query on the same :memory: database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn transaction_round_trip() {
    let pool = setup().await;
    let food = queries::create_category(&pool, "Food", TransactionKind::Expense)
        .await
        .unwrap();

    let amount = Decimal::new(4250, 2); // 42.50
    let id = queries::create_transaction(
        &pool,
        date("2025-08-10"),
        amount,
        TransactionKind::Expense,
        Some(food),
        Some("groceries"),
    )
    .await
    .unwrap();

    let records = queries::list_transactions(&pool, TransactionFilter::default())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);

    let r = &records[0];
    assert_eq!(r.transaction_id, id);
    assert_eq!(r.txn_date, date("2025-08-10"));
    assert_eq!(r.amount, amount);
    assert_eq!(r.kind, TransactionKind::Expense);
    assert_eq!(r.category_id, Some(food));
    assert_eq!(r.category_name, "Food");
    assert_eq!(r.description.as_deref(), Some("groceries"));
}

#[tokio::test]
async fn date_filters_are_inclusive() {
    let pool = setup().await;
    let cat = queries::create_category(&pool, "Misc", TransactionKind::Expense)
        .await
        .unwrap();

    for day in ["2025-08-01", "2025-08-15", "2025-08-31"] {
        queries::create_transaction(
            &pool,
            date(day),
            Decimal::from(10),
            TransactionKind::Expense,
            Some(cat),
            None,
        )
        .await
        .unwrap();
    }

    let filter = TransactionFilter {
        start_date: Some(date("2025-08-01")),
        end_date: Some(date("2025-08-15")),
        ..Default::default()
    };
    let records = queries::list_transactions(&pool, filter).await.unwrap();
    assert_eq!(records.len(), 2);

    let unbounded = queries::list_transactions(&pool, TransactionFilter::default())
        .await
        .unwrap();
    assert_eq!(unbounded.len(), 3);
}

#[tokio::test]
async fn kind_and_category_filters() {
    let pool = setup().await;
    let food = queries::create_category(&pool, "Food", TransactionKind::Expense)
        .await
        .unwrap();
    let salary = queries::create_category(&pool, "Salary", TransactionKind::Income)
        .await
        .unwrap();

    queries::create_transaction(
        &pool,
        date("2025-08-05"),
        Decimal::from(80),
        TransactionKind::Expense,
        Some(food),
        None,
    )
    .await
    .unwrap();
    queries::create_transaction(
        &pool,
        date("2025-08-06"),
        Decimal::from(3000),
        TransactionKind::Income,
        Some(salary),
        None,
    )
    .await
    .unwrap();

    let expenses = queries::list_transactions(
        &pool,
        TransactionFilter {
            kind: Some(TransactionKind::Expense),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].category_name, "Food");

    let by_category = queries::list_transactions(
        &pool,
        TransactionFilter {
            category_id: Some(salary),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].kind, TransactionKind::Income);
}

#[tokio::test]
async fn dangling_category_reads_as_unknown() {
    let pool = setup().await;
    queries::create_transaction(
        &pool,
        date("2025-08-05"),
        Decimal::from(25),
        TransactionKind::Expense,
        None,
        None,
    )
    .await
    .unwrap();

    let records = queries::list_transactions(&pool, TransactionFilter::default())
        .await
        .unwrap();
    assert_eq!(records[0].category_name, "Unknown");
}

#[tokio::test]
async fn budget_upsert_per_category() {
    let pool = setup().await;
    let food = queries::create_category(&pool, "Food", TransactionKind::Expense)
        .await
        .unwrap();

    queries::create_budget(&pool, food, Decimal::from(500), date("2025-01-01"))
        .await
        .unwrap();
    queries::create_budget(&pool, food, Decimal::from(650), date("2025-06-01"))
        .await
        .unwrap();

    let budgets = queries::list_budgets(&pool).await.unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].monthly_limit, Decimal::from(650));
    assert_eq!(budgets[0].category_name, "Food");
    assert_eq!(budgets[0].start_date, date("2025-06-01"));
}

#[tokio::test]
async fn update_and_delete_transaction() {
    let pool = setup().await;
    let cat = queries::create_category(&pool, "Fun", TransactionKind::Expense)
        .await
        .unwrap();
    let id = queries::create_transaction(
        &pool,
        date("2025-08-05"),
        Decimal::from(30),
        TransactionKind::Expense,
        Some(cat),
        None,
    )
    .await
    .unwrap();

    let updated = queries::update_transaction(
        &pool,
        id,
        date("2025-08-06"),
        Decimal::from(45),
        TransactionKind::Expense,
        Some(cat),
        Some("cinema"),
    )
    .await
    .unwrap();
    assert!(updated);

    let record = queries::get_transaction(&pool, id).await.unwrap().unwrap();
    assert_eq!(record.amount, Decimal::from(45));
    assert_eq!(record.description.as_deref(), Some("cinema"));

    assert!(queries::delete_transaction(&pool, id).await.unwrap());
    assert!(queries::get_transaction(&pool, id).await.unwrap().is_none());
    assert!(!queries::delete_transaction(&pool, id).await.unwrap());
}
