mod common;

use anyhow::Result;
use axum::http::StatusCode;

use common::{travel, TestApp};

#[tokio::test]
async fn racing_approvals_have_exactly_one_winner() -> Result<()> {
    let app = TestApp::new().await?;
    let employee = app.user("Eve", "Engineering", "eve@example.com").await?;
    let first = app.user("Fin", "Finance", "fin@example.com").await?;
    let second = app.user("Fay", "Finance", "fay@example.com").await?;

    for _ in 0..5 {
        let id = app.submit_expense(&employee, travel(25.0)).await?;
        let uri = format!("/api/expenses/approve/{id}");

        let (a, b) = tokio::join!(
            app.call("PUT", &uri, Some(&first), None),
            app.call("PUT", &uri, Some(&second), None),
        );
        let mut statuses = [a?.0, b?.0];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::OK, StatusCode::NOT_FOUND]);
    }

    Ok(())
}

#[tokio::test]
async fn approve_and_reject_race_leaves_one_decision() -> Result<()> {
    let app = TestApp::new().await?;
    let employee = app.user("Eve", "Engineering", "eve@example.com").await?;
    let finance = app.user("Fin", "Finance", "fin@example.com").await?;

    let id = app.submit_expense(&employee, travel(25.0)).await?;
    let approve_uri = format!("/api/expenses/approve/{id}");
    let reject_uri = format!("/api/expenses/reject/{id}");
    let (approve, reject) = tokio::join!(
        app.call("PUT", &approve_uri, Some(&finance), None),
        app.call("PUT", &reject_uri, Some(&finance), None),
    );
    let (approve, reject) = (approve?.0, reject?.0);
    assert_ne!(approve, reject, "exactly one decision must land");

    let (_, body) = app.call("GET", &format!("/api/expenses/{id}"), Some(&finance), None).await?;
    let expected = if approve == StatusCode::OK { "Approved" } else { "Rejected" };
    assert_eq!(body["Approval_Status"], expected);

    Ok(())
}

#[tokio::test]
async fn racing_reimbursements_stamp_once() -> Result<()> {
    let app = TestApp::new().await?;
    let employee = app.user("Eve", "Engineering", "eve@example.com").await?;
    let finance = app.user("Fin", "Finance", "fin@example.com").await?;

    let id = app.submit_expense(&employee, travel(25.0)).await?;
    app.call("PUT", &format!("/api/expenses/approve/{id}"), Some(&finance), None).await?;

    let uri = format!("/api/expenses/reimburse/{id}");
    let (a, b) = tokio::join!(
        app.call("PUT", &uri, Some(&finance), None),
        app.call("PUT", &uri, Some(&finance), None),
    );
    let mut statuses = [a?.0, b?.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::NOT_FOUND]);

    Ok(())
}
