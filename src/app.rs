use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{approvals, auth, employees, expenses, health, profile, reports, resources};
use crate::store::{SqliteStore, Store};

const MAX_RECEIPT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub jwt: Arc<JwtConfig>,
    pub upload_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, jwt: JwtConfig, upload_dir: PathBuf) -> Self {
        Self {
            store,
            jwt: Arc::new(jwt),
            upload_dir: Arc::new(upload_dir),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let config = AppConfig::from_env()?;
    let jwt_config = JwtConfig::from_env()?;

    tokio::fs::create_dir_all(&config.upload_dir).await.map_err(|err| {
        AppError::configuration(format!("cannot create upload dir {}: {err}", config.upload_dir.display()))
    })?;

    let state = AppState::new(Arc::new(SqliteStore::new(pool)), jwt_config, config.upload_dir.clone());
    Ok(build_router(state, &config))
}

pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let origins = match &config.cors_origins {
        Some(list) => AllowOrigin::list(list.iter().cloned()),
        None => AllowOrigin::from(Any),
    };
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(origins)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    let expense_routes = Router::new()
        .route("/", get(expenses::list_expenses).post(expenses::submit_expense))
        .route(
            "/upload-receipt",
            post(expenses::upload_receipt).layer(DefaultBodyLimit::max(MAX_RECEIPT_BYTES)),
        )
        .route("/approve/:id", put(expenses::approve_expense))
        .route("/reject/:id", put(expenses::reject_expense))
        .route("/reimburse/:id", put(expenses::reimburse_expense))
        // legacy download path
        .route("/receipt/:id", get(expenses::download_receipt))
        .route(
            "/:id",
            get(expenses::get_expense)
                .put(expenses::update_expense)
                .delete(expenses::delete_expense),
        )
        .route("/:id/receipt", get(expenses::download_receipt));

    let approval_routes = Router::new()
        .route("/", get(approvals::list_approval_statuses))
        .route("/approve/:id", put(expenses::approve_expense))
        .route("/reject/:id", put(expenses::reject_expense))
        .route("/reimburse/:id", put(expenses::reimburse_expense))
        .route("/field-work-reimbursement/pending", get(approvals::pending_field_work));

    let resource_routes = Router::new()
        .route("/", get(resources::list_resources).post(resources::submit_resource))
        .route("/approve/:id", put(resources::approve_resource))
        .route("/reject/:id", put(resources::reject_resource))
        .route(
            "/:id",
            get(resources::get_resource)
                .put(resources::update_resource)
                .delete(resources::delete_resource),
        );

    let api = Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/expenses", expense_routes)
        .nest("/approvals", approval_routes)
        .nest("/resources", resource_routes)
        .route("/reports/monthly-summary", get(reports::monthly_summary))
        .route("/profile/me", get(profile::me).put(profile::update_me))
        .route("/employees", get(employees::list_employees));

    Router::new()
        .route("/", get(health::banner))
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
