use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthlySummaryQuery {
    /// 1-12
    pub month: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct ExpenseTypeTotal {
    #[serde(rename = "Expense_Type")]
    pub expense_type: String,
    #[serde(rename = "Total_Amount")]
    pub total_amount: f64,
}
