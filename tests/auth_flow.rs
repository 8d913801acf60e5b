mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{TestApp, JWT_SECRET, PASSWORD};
use fieldtrack::authz::Role;
use fieldtrack::jwt::JwtConfig;

#[tokio::test]
async fn register_derives_role_from_department() -> Result<()> {
    let app = TestApp::new().await?;

    for (email, department, role) in [
        ("fin@example.com", "Finance", "Finance"),
        ("mgr@example.com", "management", "Manager"),
        ("adm@example.com", "ADMIN", "Admin"),
        ("eng@example.com", "Engineering", "Employee"),
    ] {
        let (status, body) = app.register("Someone", department, email).await?;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["success"], true);
        assert_eq!(body["role"], role);
        assert_eq!(body["message"], "Registration successful! You can now log in.");
    }

    let (status, body) = app.login("mgr@example.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "Manager");
    assert_eq!(body["department"], "management");

    let claims = JwtConfig::new(JWT_SECRET, 1).decode(body["token"].as_str().unwrap())?;
    assert_eq!(claims.role, Role::Manager);
    assert_eq!(claims.department, "management");
    assert_eq!(claims.exp - claims.iat, 3600);

    Ok(())
}

#[tokio::test]
async fn registration_and_login_validation() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app
        .call("POST", "/api/auth/register", None, Some(json!({"name": "A", "email": "a@example.com"})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required!");

    let (status, _) = app.register("Ada", "ops", "ada@example.com").await?;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.register("Ada again", "finance", "ada@example.com").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists!");

    let (status, body) = app
        .call("POST", "/api/auth/login", None, Some(json!({"email": "ada@example.com"})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email and password are required!");

    let (status, body) = app.login("ada@example.com", "not-the-password").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password!");

    let (status, _) = app.login("nobody@example.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.call("POST", "/api/auth/logout", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    Ok(())
}

#[tokio::test]
async fn email_is_case_insensitive() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, _) = app.register("Ada", "ops", "Ada@Example.com").await?;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.register("Ada again", "finance", "ada@example.com").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists!");

    let (status, body) = app.login("ada@EXAMPLE.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["role"], "Employee");

    // rows written before emails were lowercased still collide
    sqlx::query(
        "INSERT INTO employees (name, department, email, password_hash, role, created_at) VALUES ('Old', 'ops', 'Legacy@Example.com', 'x', 'Employee', '2025-01-01T00:00:00Z')",
    )
    .execute(&app.pool)
    .await?;
    let (status, _) = app.register("New", "ops", "legacy@example.com").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn guard_distinguishes_missing_invalid_and_expired_tokens() -> Result<()> {
    let app = TestApp::new().await?;
    app.user("Ada", "ops", "ada@example.com").await?;

    let (status, body) = app.call("GET", "/api/expenses", None, None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied. No token provided.");

    let (status, body) = app.call("GET", "/api/expenses", Some("not.a.jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token.");

    let forged = JwtConfig::new("some-other-secret", 1).encode(1, Role::Finance, "Finance")?;
    let (status, _) = app.call("GET", "/api/expenses", Some(&forged), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = JwtConfig::new(JWT_SECRET, -2).encode(1, Role::Employee, "ops")?;
    let (status, body) = app.call("GET", "/api/expenses", Some(&expired), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Session expired. Please log in again.");

    Ok(())
}

#[tokio::test]
async fn profile_edit_never_recomputes_role() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.user("Ada", "operations", "ada@example.com").await?;

    let (status, body) = app.call("GET", "/api/profile/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Email"], "ada@example.com");
    assert_eq!(body["Role"], "Employee");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app
        .call("PUT", "/api/profile/me", Some(&token), Some(json!({"department": "finance", "name": "Ada K"})))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["Department"], "finance");
    assert_eq!(body["Name"], "Ada K");
    assert_eq!(body["Role"], "Employee");

    let (status, _) = app.call("PUT", "/api/profile/me", Some(&token), Some(json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.call("GET", "/api/employees", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let employees = body.as_array().cloned().unwrap_or_default();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0]["Name"], Value::from("Ada K"));

    Ok(())
}
