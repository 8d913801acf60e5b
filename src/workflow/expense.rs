use serde_json::Value;

use super::optional_text;
use crate::authz::{authorize, Action};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::expense::{
    ApprovalStatusEntry, Expense, ExpenseChanges, ExpenseCreateRequest, ExpenseFilter, ExpenseListQuery,
    ExpenseUpdateRequest, NewExpense, DEFAULT_CATEGORY, FIELD_WORK_CATEGORY,
};
use crate::store::Store;
use crate::utils::{non_blank, receipt_file_name, utc_now};
use crate::workflow::states::{ApprovalStatus, ExpenseTransition};

const NOT_FOUND: &str = "Expense not found!";

fn validate_amount(amount: f64) -> AppResult<f64> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(AppError::validation("Amount must be a positive number!"))
    }
}

/// Serialized detail object, kept only for field-work claims.
fn field_work_details(category: &str, details: Option<Value>) -> AppResult<Option<String>> {
    match details {
        Some(details) if category == FIELD_WORK_CATEGORY && !details.is_null() => serde_json::to_string(&details)
            .map(Some)
            .map_err(|err| AppError::internal(format!("failed to serialize field work details: {err}"))),
        _ => Ok(None),
    }
}

pub async fn submit(store: &dyn Store, user: &AuthUser, request: ExpenseCreateRequest) -> AppResult<i64> {
    authorize(user.role, Action::SubmitExpense)?;

    let (Some(expense_type), Some(amount), Some(description)) = (
        non_blank(request.expense_type.as_deref()),
        request.amount,
        non_blank(request.description.as_deref()),
    ) else {
        return Err(AppError::validation("Expense type, amount and description are required!"));
    };
    let amount = validate_amount(amount)?;

    let category = non_blank(request.expense_category.as_deref()).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let field_work_details = field_work_details(&category, request.field_work_details)?;

    let id = store
        .insert_expense(NewExpense {
            employee_id: user.employee_id,
            expense_type,
            amount,
            description,
            receipt: non_blank(request.receipt.as_deref()),
            category,
            field_work_details,
            submitted_at: utc_now(),
        })
        .await?;

    tracing::info!(expense_id = id, actor_id = user.employee_id, amount, "expense submitted");
    Ok(id)
}

/// Approve, reject or reimburse. Returns the success message.
pub async fn transition(store: &dyn Store, user: &AuthUser, id: i64, transition: ExpenseTransition) -> AppResult<String> {
    authorize(user.role, transition.action())?;

    if !store.transition_expense(id, transition, utc_now()).await? {
        tracing::info!(expense_id = id, actor_id = user.employee_id, ?transition, "expense transition refused");
        return Err(AppError::not_found(transition.unavailable_message()));
    }

    tracing::info!(expense_id = id, actor_id = user.employee_id, ?transition, "expense transitioned");
    Ok(format!("Expense {} successfully!", transition.verb()))
}

pub async fn edit(store: &dyn Store, user: &AuthUser, id: i64, request: ExpenseUpdateRequest) -> AppResult<()> {
    authorize(user.role, Action::EditExpense)?;
    let scope = Action::EditExpense.scope(user.role, user.employee_id);

    let category = optional_text(request.expense_category.as_deref(), "Expense category")?;
    let has_details = request.field_work_details.as_ref().is_some_and(|details| !details.is_null());
    if has_details && category.as_deref().is_some_and(|category| category != FIELD_WORK_CATEGORY) {
        return Err(AppError::validation("Field work details require the Field Work category!"));
    }
    // the store drops details when the stored category is not field work
    let field_work_details = match request.field_work_details {
        Some(details) if !details.is_null() => Some(
            serde_json::to_string(&details)
                .map_err(|err| AppError::internal(format!("failed to serialize field work details: {err}")))?,
        ),
        _ => None,
    };
    let changes = ExpenseChanges {
        expense_type: optional_text(request.expense_type.as_deref(), "Expense type")?,
        amount: request.amount.map(validate_amount).transpose()?,
        description: optional_text(request.description.as_deref(), "Description")?,
        category,
        field_work_details,
    };
    if changes.is_empty() {
        return Err(AppError::validation("No fields to update!"));
    }

    if !store.update_expense(id, scope, &changes).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }

    tracing::info!(expense_id = id, actor_id = user.employee_id, "expense updated");
    Ok(())
}

/// Removes the expense. Returns the name of a receipt file nothing points
/// at any more, for the caller to delete.
pub async fn delete(store: &dyn Store, user: &AuthUser, id: i64) -> AppResult<Option<String>> {
    authorize(user.role, Action::DeleteExpense)?;
    let scope = Action::DeleteExpense.scope(user.role, user.employee_id);

    let receipt = store
        .find_expense(id, scope)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?
        .receipt;
    if !store.delete_expense(id, scope).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }

    tracing::info!(expense_id = id, actor_id = user.employee_id, "expense deleted");
    orphaned_receipt(store, receipt.as_deref()).await
}

async fn orphaned_receipt(store: &dyn Store, receipt: Option<&str>) -> AppResult<Option<String>> {
    let Some(file_name) = receipt.and_then(receipt_file_name) else {
        return Ok(None);
    };
    if store.receipt_in_use(file_name).await? {
        return Ok(None);
    }
    Ok(Some(file_name.to_string()))
}

pub async fn get(store: &dyn Store, user: &AuthUser, id: i64) -> AppResult<Expense> {
    authorize(user.role, Action::ViewExpense)?;
    let scope = Action::ViewExpense.scope(user.role, user.employee_id);

    store
        .find_expense(id, scope)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

fn list_filter(user: &AuthUser, query: &ExpenseListQuery) -> AppResult<ExpenseFilter> {
    let approval_status = match non_blank(query.approval_status.as_deref()) {
        None => None,
        Some(raw) => Some(
            ApprovalStatus::parse(&raw)
                .ok_or_else(|| AppError::validation(format!("Invalid approval status: {raw}")))?,
        ),
    };

    Ok(ExpenseFilter {
        owner: Action::ViewExpense.scope(user.role, user.employee_id).owner(),
        approval_status,
        category: non_blank(query.expense_category.as_deref()),
    })
}

/// Finance and managers see every claim; everyone else sees their own.
pub async fn list(store: &dyn Store, user: &AuthUser, query: &ExpenseListQuery) -> AppResult<Vec<Expense>> {
    let filter = list_filter(user, query)?;
    store.list_expenses(&filter).await
}

pub async fn approval_statuses(store: &dyn Store, user: &AuthUser) -> AppResult<Vec<ApprovalStatusEntry>> {
    let filter = list_filter(user, &ExpenseListQuery { approval_status: None, expense_category: None })?;

    Ok(store
        .list_expenses(&filter)
        .await?
        .into_iter()
        .map(|expense| ApprovalStatusEntry {
            id: expense.id,
            approval_status: expense.approval_status,
        })
        .collect())
}

pub async fn pending_field_work(store: &dyn Store, user: &AuthUser) -> AppResult<Vec<Expense>> {
    authorize(user.role, Action::ReviewFieldWork)?;

    store
        .list_expenses(&ExpenseFilter {
            owner: None,
            approval_status: Some(ApprovalStatus::Pending),
            category: Some(FIELD_WORK_CATEGORY.to_string()),
        })
        .await
}

/// Points the expense at an uploaded receipt file. Scoped like an edit.
/// Returns the replaced receipt's file name once nothing points at it.
pub async fn attach_receipt(store: &dyn Store, user: &AuthUser, id: i64, receipt: &str) -> AppResult<Option<String>> {
    authorize(user.role, Action::EditExpense)?;
    let scope = Action::EditExpense.scope(user.role, user.employee_id);

    let previous = store
        .find_expense(id, scope)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?
        .receipt;
    if !store.attach_receipt(id, scope, receipt).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }

    tracing::info!(expense_id = id, actor_id = user.employee_id, receipt, "receipt attached");
    orphaned_receipt(store, previous.as_deref()).await
}

/// Stored receipt name for an expense the caller may view.
pub async fn receipt(store: &dyn Store, user: &AuthUser, id: i64) -> AppResult<String> {
    get(store, user, id)
        .await?
        .receipt
        .filter(|receipt| !receipt.trim().is_empty())
        .ok_or_else(|| AppError::not_found("Receipt not found"))
}
