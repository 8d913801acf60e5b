mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

fn laptop(quantity: i64) -> Value {
    json!({"resource_name": "Laptop", "quantity": quantity, "reason": "New hire"})
}

#[tokio::test]
async fn manager_decides_once() -> Result<()> {
    let app = TestApp::new().await?;
    let employee = app.user("Eve", "Engineering", "eve@example.com").await?;
    let manager = app.user("Max", "Management", "max@example.com").await?;
    let finance = app.user("Fin", "Finance", "fin@example.com").await?;

    let approved = app.submit_resource(&employee, laptop(2)).await?;
    let rejected = app.submit_resource(&employee, laptop(1)).await?;

    let (status, _) = app.call("PUT", &format!("/api/resources/approve/{approved}"), Some(&finance), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.call("PUT", &format!("/api/resources/approve/{approved}"), Some(&employee), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only Managers can approve resource requests!");

    let (status, body) = app.call("PUT", &format!("/api/resources/approve/{approved}"), Some(&manager), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Resource request approved successfully!");
    let (status, _) = app.call("PUT", &format!("/api/resources/reject/{rejected}"), Some(&manager), None).await?;
    assert_eq!(status, StatusCode::OK);

    // decisions are final
    for (id, action) in [(approved, "reject"), (approved, "approve"), (rejected, "approve"), (9999, "approve")] {
        let (status, body) = app
            .call("PUT", &format!("/api/resources/{action}/{id}"), Some(&manager), None)
            .await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{action} on {id}");
        assert_eq!(body["message"], "Resource request not found or already processed!");
    }

    let (_, body) = app.call("GET", &format!("/api/resources/{approved}"), Some(&employee), None).await?;
    assert_eq!(body["Status"], "Approved");
    assert_eq!(body["Quantity"], 2);
    let (_, body) = app.call("GET", &format!("/api/resources/{rejected}"), Some(&manager), None).await?;
    assert_eq!(body["Status"], "Rejected");

    Ok(())
}

#[tokio::test]
async fn submission_is_validated_and_employee_only() -> Result<()> {
    let app = TestApp::new().await?;
    let employee = app.user("Eve", "Engineering", "eve@example.com").await?;
    let manager = app.user("Max", "Management", "max@example.com").await?;

    let (status, body) = app.call("POST", "/api/resources", Some(&manager), Some(laptop(1))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only employees can request resources!");

    let (status, body) = app.call("POST", "/api/resources", Some(&employee), Some(laptop(0))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quantity must be a positive integer!");

    let (status, body) = app
        .call("POST", "/api/resources", Some(&employee), Some(json!({"resource_name": "Desk", "quantity": 1})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Resource name, quantity and reason are required!");

    let (status, _) = app.call("POST", "/api/resources", None, Some(laptop(1))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn listing_scope_status_filter_and_owner_edits() -> Result<()> {
    let app = TestApp::new().await?;
    let eve = app.user("Eve", "Engineering", "eve@example.com").await?;
    let bob = app.user("Bob", "Sales", "bob@example.com").await?;
    let manager = app.user("Max", "Management", "max@example.com").await?;
    let finance = app.user("Fin", "Finance", "fin@example.com").await?;

    let eve_request = app.submit_resource(&eve, laptop(1)).await?;
    app.submit_resource(&bob, laptop(3)).await?;
    app.call("PUT", &format!("/api/resources/approve/{eve_request}"), Some(&manager), None).await?;

    let count = |body: &Value| body.as_array().map(Vec::len).unwrap_or(0);

    let (_, body) = app.call("GET", "/api/resources", Some(&eve), None).await?;
    assert_eq!(count(&body), 1);
    let (_, body) = app.call("GET", "/api/resources", Some(&finance), None).await?;
    assert_eq!(count(&body), 0);
    let (_, body) = app.call("GET", "/api/resources", Some(&manager), None).await?;
    assert_eq!(count(&body), 2);
    assert!(body[0]["Employee_Name"].is_string());

    let (_, body) = app.call("GET", "/api/resources?status=Pending", Some(&manager), None).await?;
    assert_eq!(count(&body), 1);
    assert_eq!(body[0]["Employee_Name"], "Bob");
    let (_, body) = app.call("GET", "/api/resources?status=approved", Some(&eve), None).await?;
    assert_eq!(count(&body), 1);
    let (status, _) = app.call("GET", "/api/resources?status=shipped", Some(&manager), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/resources/{eve_request}");
    let (status, _) = app.call("GET", &uri, Some(&bob), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call("PUT", &uri, Some(&manager), Some(json!({"quantity": 5}))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call("PUT", &uri, Some(&eve), Some(json!({"quantity": -5}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.call("PUT", &uri, Some(&eve), Some(json!({"quantity": 4, "reason": "Team grew"}))).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.call("GET", &uri, Some(&eve), None).await?;
    assert_eq!(body["Quantity"], 4);
    assert_eq!(body["Reason"], "Team grew");
    assert_eq!(body["Status"], "Approved");

    let (status, _) = app.call("DELETE", &uri, Some(&bob), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.call("DELETE", &uri, Some(&eve), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Resource request deleted successfully!");
    let (status, _) = app.call("GET", &uri, Some(&manager), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
