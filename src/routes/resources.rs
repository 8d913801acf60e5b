use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::resource::{
    Resource, ResourceCreateRequest, ResourceCreatedResponse, ResourceListQuery, ResourceUpdateRequest,
};
use crate::models::MessageResponse;
use crate::workflow::resource as workflow;
use crate::workflow::states::ResourceTransition;

#[utoipa::path(
    get,
    path = "/api/resources",
    tag = "Resources",
    params(ResourceListQuery),
    responses(
        (status = 200, description = "Own requests, or every request for Managers", body = [Resource]),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_resources(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ResourceListQuery>,
) -> AppResult<Json<Vec<Resource>>> {
    let resources = workflow::list(state.store.as_ref(), &auth, &query).await?;
    Ok(Json(resources))
}

#[utoipa::path(
    post,
    path = "/api/resources",
    tag = "Resources",
    request_body = ResourceCreateRequest,
    responses(
        (status = 200, description = "Resource request submitted", body = ResourceCreatedResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Only employees can request resources")
    )
)]
pub async fn submit_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<ResourceCreateRequest>, JsonRejection>,
) -> AppResult<Json<ResourceCreatedResponse>> {
    let Json(payload) = payload?;
    let resource_id = workflow::submit(state.store.as_ref(), &auth, payload).await?;

    Ok(Json(ResourceCreatedResponse {
        message: "Resource request submitted successfully!".to_string(),
        resource_id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/resources/{id}",
    tag = "Resources",
    params(("id" = i64, Path, description = "Resource request id")),
    responses(
        (status = 200, description = "Resource request detail", body = Resource),
        (status = 404, description = "Not found or not visible to the caller")
    )
)]
pub async fn get_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Resource>> {
    let Path(id) = id?;
    let resource = workflow::get(state.store.as_ref(), &auth, id).await?;
    Ok(Json(resource))
}

#[utoipa::path(
    put,
    path = "/api/resources/{id}",
    tag = "Resources",
    params(("id" = i64, Path, description = "Resource request id")),
    request_body = ResourceUpdateRequest,
    responses(
        (status = 200, description = "Resource request updated", body = MessageResponse),
        (status = 400, description = "Invalid fields"),
        (status = 404, description = "Not found or not owned by the caller")
    )
)]
pub async fn update_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ResourceUpdateRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    workflow::edit(state.store.as_ref(), &auth, id, payload).await?;
    Ok(Json(MessageResponse::new("Resource request updated successfully!")))
}

#[utoipa::path(
    delete,
    path = "/api/resources/{id}",
    tag = "Resources",
    params(("id" = i64, Path, description = "Resource request id")),
    responses(
        (status = 200, description = "Resource request deleted", body = MessageResponse),
        (status = 404, description = "Not found or not owned by the caller")
    )
)]
pub async fn delete_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Path(id) = id?;
    workflow::delete(state.store.as_ref(), &auth, id).await?;
    Ok(Json(MessageResponse::new("Resource request deleted successfully!")))
}

#[utoipa::path(
    put,
    path = "/api/resources/approve/{id}",
    tag = "Resources",
    params(("id" = i64, Path, description = "Resource request id")),
    responses(
        (status = 200, description = "Resource request approved", body = MessageResponse),
        (status = 403, description = "Caller is not a Manager"),
        (status = 404, description = "Resource request not found or already processed")
    )
)]
pub async fn approve_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Path(id) = id?;
    let message = workflow::transition(state.store.as_ref(), &auth, id, ResourceTransition::Approve).await?;
    Ok(Json(MessageResponse::new(message)))
}

#[utoipa::path(
    put,
    path = "/api/resources/reject/{id}",
    tag = "Resources",
    params(("id" = i64, Path, description = "Resource request id")),
    responses(
        (status = 200, description = "Resource request rejected", body = MessageResponse),
        (status = 403, description = "Caller is not a Manager"),
        (status = 404, description = "Resource request not found or already processed")
    )
)]
pub async fn reject_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Path(id) = id?;
    let message = workflow::transition(state.store.as_ref(), &auth, id, ResourceTransition::Reject).await?;
    Ok(Json(MessageResponse::new(message)))
}
