use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::errors::AppError;
use crate::workflow::states::{ApprovalStatus, ExpenseState, ReimbursementStatus};

pub const DEFAULT_CATEGORY: &str = "General";
pub const FIELD_WORK_CATEGORY: &str = "Field Work";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Expense {
    #[serde(rename = "Expense_ID")]
    pub id: i64,
    #[serde(rename = "Employee_ID")]
    pub employee_id: i64,
    #[serde(rename = "Employee_Name", skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(rename = "Expense_Type")]
    pub expense_type: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Receipt")]
    pub receipt: Option<String>,
    #[serde(rename = "Expense_Category")]
    pub category: String,
    #[serde(rename = "Field_Work_Details")]
    #[schema(value_type = Option<Object>)]
    pub field_work_details: Option<Value>,
    #[serde(rename = "Date_Submitted")]
    pub submitted_at: DateTime<Utc>,
    #[serde(rename = "Approval_Status")]
    pub approval_status: ApprovalStatus,
    #[serde(rename = "Reimbursement_Status")]
    pub reimbursement_status: Option<ReimbursementStatus>,
    #[serde(rename = "Date_Reimbursed")]
    pub reimbursed_at: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn state(&self) -> ExpenseState {
        ExpenseState {
            approval: self.approval_status,
            reimbursement: self.reimbursement_status,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbExpense {
    pub id: i64,
    pub employee_id: i64,
    pub employee_name: Option<String>,
    pub expense_type: String,
    pub amount: f64,
    pub description: String,
    pub receipt: Option<String>,
    pub category: String,
    pub field_work_details: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub approval_status: String,
    pub reimbursement_status: Option<String>,
    pub reimbursed_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbExpense> for Expense {
    type Error = AppError;

    fn try_from(value: DbExpense) -> Result<Self, Self::Error> {
        let approval_status = ApprovalStatus::parse(&value.approval_status).ok_or_else(|| {
            AppError::internal(format!("invalid approval status {:?} on expense {}", value.approval_status, value.id))
        })?;

        let reimbursement_status = match value.reimbursement_status.as_deref() {
            None => None,
            Some(raw) => Some(ReimbursementStatus::parse(raw).ok_or_else(|| {
                AppError::internal(format!("invalid reimbursement status {:?} on expense {}", raw, value.id))
            })?),
        };

        let field_work_details = value
            .field_work_details
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose()
            .map_err(|err| AppError::internal(format!("invalid field work details on expense {}: {err}", value.id)))?;

        Ok(Expense {
            id: value.id,
            employee_id: value.employee_id,
            employee_name: value.employee_name,
            expense_type: value.expense_type,
            amount: value.amount,
            description: value.description,
            receipt: value.receipt,
            category: value.category,
            field_work_details,
            submitted_at: value.submitted_at,
            approval_status,
            reimbursement_status,
            reimbursed_at: value.reimbursed_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub employee_id: i64,
    pub expense_type: String,
    pub amount: f64,
    pub description: String,
    pub receipt: Option<String>,
    pub category: String,
    pub field_work_details: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Mutable fields; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ExpenseChanges {
    pub expense_type: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub field_work_details: Option<String>,
}

impl ExpenseChanges {
    pub fn is_empty(&self) -> bool {
        self.expense_type.is_none()
            && self.amount.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.field_work_details.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub owner: Option<i64>,
    pub approval_status: Option<ApprovalStatus>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExpenseCreateRequest {
    #[schema(example = "Travel")]
    pub expense_type: Option<String>,
    #[schema(example = 50.0)]
    pub amount: Option<f64>,
    #[schema(example = "Taxi from the airport")]
    pub description: Option<String>,
    pub receipt: Option<String>,
    #[schema(example = "General")]
    pub expense_category: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub field_work_details: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExpenseUpdateRequest {
    #[schema(example = "Meals")]
    pub expense_type: Option<String>,
    #[schema(example = 42.5)]
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub expense_category: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub field_work_details: Option<Value>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpenseListQuery {
    /// Pending, Approved or Rejected
    pub approval_status: Option<String>,
    pub expense_category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExpenseCreatedResponse {
    pub message: String,
    #[serde(rename = "expenseId")]
    pub expense_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalStatusEntry {
    #[serde(rename = "Expense_ID")]
    pub id: i64,
    #[serde(rename = "Approval_Status")]
    pub approval_status: ApprovalStatus,
}

/// Multipart body of a receipt upload; documentation only.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ReceiptUploadForm {
    #[schema(rename = "expenseId")]
    pub expense_id: i64,
    #[schema(value_type = String, format = Binary)]
    pub receipt: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptUploadResponse {
    pub success: bool,
    pub message: String,
    pub path: String,
}
