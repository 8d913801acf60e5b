use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::identity;
use crate::jwt::AuthUser;
use crate::models::employee::{Employee, ProfileUpdateRequest};

#[utoipa::path(
    get,
    path = "/api/profile/me",
    tag = "Profile",
    responses(
        (status = 200, description = "Caller's employee record", body = Employee),
        (status = 404, description = "Employee no longer exists")
    )
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Employee>> {
    let employee = identity::profile(state.store.as_ref(), &auth).await?;
    Ok(Json(employee))
}

#[utoipa::path(
    put,
    path = "/api/profile/me",
    tag = "Profile",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated record; role is unchanged", body = Employee),
        (status = 400, description = "Nothing to update or blank field")
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> AppResult<Json<Employee>> {
    let Json(payload) = payload?;
    let employee = identity::update_profile(state.store.as_ref(), &auth, payload).await?;
    Ok(Json(employee))
}
