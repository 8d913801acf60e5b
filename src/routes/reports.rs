use axum::extract::{Query, State};
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::report::{ExpenseTypeTotal, MonthlySummaryQuery};
use crate::reporting;

#[utoipa::path(
    get,
    path = "/api/reports/monthly-summary",
    tag = "Reports",
    params(MonthlySummaryQuery),
    responses(
        (status = 200, description = "Totals per expense type for the month", body = [ExpenseTypeTotal]),
        (status = 400, description = "Month or year missing or invalid")
    )
)]
pub async fn monthly_summary(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<MonthlySummaryQuery>,
) -> AppResult<Json<Vec<ExpenseTypeTotal>>> {
    let totals = reporting::monthly_summary(state.store.as_ref(), &query).await?;
    Ok(Json(totals))
}
