mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use sqlx::SqlitePool;

use common::TestApp;

async fn insert_expense(pool: &SqlitePool, employee_id: i64, expense_type: &str, amount: f64, at: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        "INSERT INTO expenses (employee_id, expense_type, amount, description, category, submitted_at) VALUES (?, ?, ?, ?, 'General', ?)",
    )
    .bind(employee_id)
    .bind(expense_type)
    .bind(amount)
    .bind("seeded")
    .bind(at)
    .execute(pool)
    .await?;
    Ok(())
}

#[tokio::test]
async fn totals_group_by_type_within_the_month() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.user("Eve", "Engineering", "eve@example.com").await?;
    let employee_id: i64 = sqlx::query_scalar("SELECT id FROM employees WHERE email = ?")
        .bind("eve@example.com")
        .fetch_one(&app.pool)
        .await?;

    insert_expense(&app.pool, employee_id, "Travel", 40.0, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()).await?;
    insert_expense(&app.pool, employee_id, "Travel", 10.5, Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap()).await?;
    insert_expense(&app.pool, employee_id, "Meals", 12.0, Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()).await?;
    // neighbouring months and the same month of another year stay out
    insert_expense(&app.pool, employee_id, "Travel", 999.0, Utc.with_ymd_and_hms(2025, 2, 28, 23, 59, 59).unwrap()).await?;
    insert_expense(&app.pool, employee_id, "Travel", 999.0, Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()).await?;
    insert_expense(&app.pool, employee_id, "Travel", 999.0, Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()).await?;

    let (status, body) = app
        .call("GET", "/api/reports/monthly-summary?month=3&year=2025", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(
        body,
        json!([
            {"Expense_Type": "Meals", "Total_Amount": 12.0},
            {"Expense_Type": "Travel", "Total_Amount": 50.5},
        ])
    );

    let (status, body) = app
        .call("GET", "/api/reports/monthly-summary?month=7&year=2025", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    Ok(())
}

#[tokio::test]
async fn period_is_validated() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.user("Eve", "Engineering", "eve@example.com").await?;

    for (query, message) in [
        ("", "Month and year are required!"),
        ("?month=3", "Month and year are required!"),
        ("?month=13&year=2025", "Month must be between 1 and 12!"),
        ("?month=0&year=2025", "Month must be between 1 and 12!"),
        ("?month=3&year=soon", "Year must be a valid number!"),
    ] {
        let (status, body) = app
            .call("GET", &format!("/api/reports/monthly-summary{query}"), Some(&token), None)
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {query:?}");
        assert_eq!(body["message"], message, "query {query:?}");
    }

    let (status, _) = app.call("GET", "/api/reports/monthly-summary?month=3&year=2025", None, None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}
