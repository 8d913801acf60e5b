use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::identity;
use crate::jwt::AuthUser;
use crate::models::employee::Employee;

#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Employees",
    responses((status = 200, description = "Employee directory", body = [Employee]))
)]
pub async fn list_employees(State(state): State<AppState>, _auth: AuthUser) -> AppResult<Json<Vec<Employee>>> {
    let employees = identity::list_employees(state.store.as_ref()).await?;
    Ok(Json(employees))
}
