use std::path::Path as FsPath;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::expense::{
    Expense, ExpenseCreateRequest, ExpenseCreatedResponse, ExpenseListQuery, ExpenseUpdateRequest,
    ReceiptUploadForm, ReceiptUploadResponse,
};
use crate::models::MessageResponse;
use crate::utils::receipt_file_name;
use crate::workflow::expense as workflow;
use crate::workflow::states::ExpenseTransition;

#[utoipa::path(
    get,
    path = "/api/expenses",
    tag = "Expenses",
    params(ExpenseListQuery),
    responses(
        (status = 200, description = "Own claims, or every claim for Finance and Managers", body = [Expense]),
        (status = 400, description = "Unknown approval status filter")
    )
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ExpenseListQuery>,
) -> AppResult<Json<Vec<Expense>>> {
    let expenses = workflow::list(state.store.as_ref(), &auth, &query).await?;
    Ok(Json(expenses))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    tag = "Expenses",
    request_body = ExpenseCreateRequest,
    responses(
        (status = 200, description = "Expense submitted", body = ExpenseCreatedResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Only employees can submit expenses")
    )
)]
pub async fn submit_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<ExpenseCreateRequest>, JsonRejection>,
) -> AppResult<Json<ExpenseCreatedResponse>> {
    let Json(payload) = payload?;
    let expense_id = workflow::submit(state.store.as_ref(), &auth, payload).await?;

    Ok(Json(ExpenseCreatedResponse {
        message: "Expense submitted successfully!".to_string(),
        expense_id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{id}",
    tag = "Expenses",
    params(("id" = i64, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense detail", body = Expense),
        (status = 404, description = "Not found or not visible to the caller")
    )
)]
pub async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Expense>> {
    let Path(id) = id?;
    let expense = workflow::get(state.store.as_ref(), &auth, id).await?;
    Ok(Json(expense))
}

#[utoipa::path(
    put,
    path = "/api/expenses/{id}",
    tag = "Expenses",
    params(("id" = i64, Path, description = "Expense id")),
    request_body = ExpenseUpdateRequest,
    responses(
        (status = 200, description = "Expense updated", body = MessageResponse),
        (status = 400, description = "Invalid fields"),
        (status = 404, description = "Not found or not editable by the caller")
    )
)]
pub async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ExpenseUpdateRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    workflow::edit(state.store.as_ref(), &auth, id, payload).await?;
    Ok(Json(MessageResponse::new("Expense updated successfully!")))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{id}",
    tag = "Expenses",
    params(("id" = i64, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense deleted", body = MessageResponse),
        (status = 404, description = "Not found or not deletable by the caller")
    )
)]
pub async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Path(id) = id?;
    if let Some(orphaned) = workflow::delete(state.store.as_ref(), &auth, id).await? {
        remove_receipt_file(&state.upload_dir, &orphaned).await;
    }
    Ok(Json(MessageResponse::new("Expense deleted successfully!")))
}

async fn apply_transition(
    state: &AppState,
    auth: &AuthUser,
    id: Result<Path<i64>, PathRejection>,
    transition: ExpenseTransition,
) -> AppResult<Json<MessageResponse>> {
    let Path(id) = id?;
    let message = workflow::transition(state.store.as_ref(), auth, id, transition).await?;
    Ok(Json(MessageResponse::new(message)))
}

#[utoipa::path(
    put,
    path = "/api/expenses/approve/{id}",
    tag = "Expenses",
    params(("id" = i64, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense approved", body = MessageResponse),
        (status = 403, description = "Caller is not Finance"),
        (status = 404, description = "Expense not found or already processed")
    )
)]
pub async fn approve_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    apply_transition(&state, &auth, id, ExpenseTransition::Approve).await
}

#[utoipa::path(
    put,
    path = "/api/expenses/reject/{id}",
    tag = "Expenses",
    params(("id" = i64, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense rejected", body = MessageResponse),
        (status = 403, description = "Caller is not Finance"),
        (status = 404, description = "Expense not found or already processed")
    )
)]
pub async fn reject_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    apply_transition(&state, &auth, id, ExpenseTransition::Reject).await
}

#[utoipa::path(
    put,
    path = "/api/expenses/reimburse/{id}",
    tag = "Expenses",
    params(("id" = i64, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense marked as reimbursed", body = MessageResponse),
        (status = 403, description = "Caller is not Finance"),
        (status = 404, description = "Expense not found, not approved, or already reimbursed")
    )
)]
pub async fn reimburse_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    apply_transition(&state, &auth, id, ExpenseTransition::Reimburse).await
}

/// Random name that keeps a short alphanumeric extension from the upload.
fn new_receipt_name(original: Option<&str>) -> String {
    let extension = original
        .and_then(|name| FsPath::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);

    match extension {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    }
}

fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name).first_or_octet_stream().to_string()
}

/// Best effort; a leftover file is only logged.
async fn remove_receipt_file(upload_dir: &FsPath, file_name: &str) {
    let path = upload_dir.join(file_name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "receipt file removed"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(error = %err, path = %path.display(), "failed to remove receipt file"),
    }
}

#[utoipa::path(
    post,
    path = "/api/expenses/upload-receipt",
    tag = "Expenses",
    request_body(content = ReceiptUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Receipt stored and attached", body = ReceiptUploadResponse),
        (status = 400, description = "No file or expense id"),
        (status = 404, description = "Expense not found or not editable by the caller")
    )
)]
pub async fn upload_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ReceiptUploadResponse>> {
    let mut multipart = multipart.map_err(|err| AppError::validation(err.body_text()))?;

    let mut expense_id = None;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("expenseId") => expense_id = Some(field.text().await?),
            Some("receipt") => {
                let original = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                upload = Some((original, data));
            }
            _ => {}
        }
    }

    let Some((original, data)) = upload.filter(|(_, data)| !data.is_empty()) else {
        return Err(AppError::validation("No file uploaded"));
    };
    let expense_id = expense_id
        .as_deref()
        .map(str::trim)
        .and_then(|raw| raw.parse::<i64>().ok())
        .ok_or_else(|| AppError::validation("Expense ID is required!"))?;

    let file_name = new_receipt_name(original.as_deref());
    let path = state.upload_dir.join(&file_name);
    tokio::fs::write(&path, &data)
        .await
        .map_err(|err| AppError::internal(format!("failed to store receipt {}: {err}", path.display())))?;
    let stored = path.to_string_lossy().replace('\\', "/");

    match workflow::attach_receipt(state.store.as_ref(), &auth, expense_id, &stored).await {
        Ok(Some(replaced)) => remove_receipt_file(&state.upload_dir, &replaced).await,
        Ok(None) => {}
        Err(err) => {
            remove_receipt_file(&state.upload_dir, &file_name).await;
            return Err(err);
        }
    }

    Ok(Json(ReceiptUploadResponse {
        success: true,
        message: "Receipt uploaded successfully".to_string(),
        path: stored,
    }))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{id}/receipt",
    tag = "Expenses",
    params(("id" = i64, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Receipt file, content type taken from its extension"),
        (status = 404, description = "Receipt not found")
    )
)]
pub async fn download_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Response> {
    let Path(id) = id?;
    let stored = workflow::receipt(state.store.as_ref(), &auth, id).await?;

    // only the final component is trusted, whatever was stored
    let file_name = receipt_file_name(&stored).ok_or_else(|| AppError::not_found("Receipt not found"))?;

    let bytes = match tokio::fs::read(state.upload_dir.join(&file_name)).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::not_found("Receipt not found"));
        }
        Err(err) => return Err(AppError::internal(format!("failed to read receipt {file_name}: {err}"))),
    };

    Ok(([(header::CONTENT_TYPE, content_type_for(&file_name))], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_names_keep_safe_extensions_only() {
        assert!(new_receipt_name(Some("scan.PNG")).ends_with(".png"));
        assert!(!new_receipt_name(Some("../../etc/passwd")).contains('.'));
        assert!(!new_receipt_name(Some("bill.p/hp")).contains('/'));
        assert_eq!(new_receipt_name(None).len(), 36);
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a.pdf"), "application/pdf");
        assert_eq!(content_type_for("a"), "application/octet-stream");
        assert_eq!(content_type_for("scan.webp"), "image/webp");
    }
}
