#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use fieldtrack::app::{build_router, AppState};
use fieldtrack::config::AppConfig;
use fieldtrack::jwt::JwtConfig;
use fieldtrack::store::SqliteStore;

pub const JWT_SECRET: &str = "test-secret";
pub const PASSWORD: &str = "password123";

/// Router over a migrated temp-file database with its own upload directory.
pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub upload_dir: PathBuf,
    _dir: TempDir,
}

pub async fn migrated_pool(dir: &Path) -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::new()
        .filename(dir.join("test.db"))
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    Ok(pool)
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create tempdir")?;
        let pool = migrated_pool(dir.path()).await?;

        let upload_dir = dir.path().join("uploads");
        std::fs::create_dir_all(&upload_dir)?;

        let config = AppConfig {
            upload_dir: upload_dir.clone(),
            ..AppConfig::default()
        };
        let state = AppState::new(
            Arc::new(SqliteStore::new(pool.clone())),
            JwtConfig::new(JWT_SECRET, 1),
            upload_dir.clone(),
        );

        Ok(Self {
            router: build_router(state, &config),
            pool,
            upload_dir,
            _dir: dir,
        })
    }

    pub async fn send(&self, req: Request<Body>) -> Result<(StatusCode, Vec<u8>)> {
        let resp = self.router.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        Ok((status, bytes.to_vec()))
    }

    /// JSON request; a non-JSON response body comes back as a string value.
    pub async fn call(&self, method: &str, uri: &str, token: Option<&str>, payload: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let req = match payload {
            Some(payload) => builder
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let (status, bytes) = self.send(req).await?;
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        Ok((status, value))
    }

    pub async fn register(&self, name: &str, department: &str, email: &str) -> Result<(StatusCode, Value)> {
        self.call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"name": name, "department": department, "email": email, "password": PASSWORD})),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(StatusCode, Value)> {
        self.call("POST", "/api/auth/login", None, Some(json!({"email": email, "password": password})))
            .await
    }

    /// Registers an account and returns its bearer token.
    pub async fn user(&self, name: &str, department: &str, email: &str) -> Result<String> {
        let (status, body) = self.register(name, department, email).await?;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);

        let (status, body) = self.login(email, PASSWORD).await?;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body.get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .context("missing token")
    }

    pub async fn submit_expense(&self, token: &str, payload: Value) -> Result<i64> {
        let (status, body) = self.call("POST", "/api/expenses", Some(token), Some(payload)).await?;
        assert_eq!(status, StatusCode::OK, "submit failed: {}", body);
        body.get("expenseId").and_then(Value::as_i64).context("missing expenseId")
    }

    pub async fn submit_resource(&self, token: &str, payload: Value) -> Result<i64> {
        let (status, body) = self.call("POST", "/api/resources", Some(token), Some(payload)).await?;
        assert_eq!(status, StatusCode::OK, "resource request failed: {}", body);
        body.get("resourceId").and_then(Value::as_i64).context("missing resourceId")
    }
}

pub fn travel(amount: f64) -> Value {
    json!({"expense_type": "Travel", "amount": amount, "description": "Taxi to site"})
}
