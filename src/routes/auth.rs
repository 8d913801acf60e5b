use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::identity;
use crate::models::employee::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::models::SuccessResponse;

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    security(()),
    responses(
        (status = 200, description = "Employee registered", body = RegisterResponse),
        (status = 400, description = "Missing fields or email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<Json<RegisterResponse>> {
    let Json(payload) = payload?;
    let role = identity::register(state.store.as_ref(), payload).await?;

    Ok(Json(RegisterResponse {
        success: true,
        message: "Registration successful! You can now log in.".to_string(),
        role,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    security(()),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(payload) = payload?;
    let response = identity::login(state.store.as_ref(), &state.jwt, payload).await?;
    Ok(Json(response))
}

/// Tokens are stateless; the client simply discards its copy.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    security(()),
    responses((status = 200, description = "Logout acknowledged", body = SuccessResponse))
)]
pub async fn logout() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        success: true,
        message: "Logged out successfully!".to_string(),
    })
}
