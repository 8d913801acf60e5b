use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::expense::{ApprovalStatusEntry, Expense};
use crate::workflow::expense as workflow;

#[utoipa::path(
    get,
    path = "/api/approvals",
    tag = "Approvals",
    responses((status = 200, description = "Approval status of each visible expense", body = [ApprovalStatusEntry]))
)]
pub async fn list_approval_statuses(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<ApprovalStatusEntry>>> {
    let statuses = workflow::approval_statuses(state.store.as_ref(), &auth).await?;
    Ok(Json(statuses))
}

#[utoipa::path(
    get,
    path = "/api/approvals/field-work-reimbursement/pending",
    tag = "Approvals",
    responses(
        (status = 200, description = "Pending field work claims with the claimant's name", body = [Expense]),
        (status = 403, description = "Caller is not Finance")
    )
)]
pub async fn pending_field_work(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Expense>>> {
    let expenses = workflow::pending_field_work(state.store.as_ref(), &auth).await?;
    Ok(Json(expenses))
}
