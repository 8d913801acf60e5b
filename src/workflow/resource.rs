use super::optional_text;
use crate::authz::{authorize, Action};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::resource::{
    NewResource, Resource, ResourceChanges, ResourceCreateRequest, ResourceFilter, ResourceListQuery,
    ResourceUpdateRequest,
};
use crate::store::Store;
use crate::utils::{non_blank, utc_now};
use crate::workflow::states::{ResourceStatus, ResourceTransition};

const NOT_FOUND: &str = "Resource request not found!";

fn validate_quantity(quantity: i64) -> AppResult<i64> {
    if quantity > 0 {
        Ok(quantity)
    } else {
        Err(AppError::validation("Quantity must be a positive integer!"))
    }
}

pub async fn submit(store: &dyn Store, user: &AuthUser, request: ResourceCreateRequest) -> AppResult<i64> {
    authorize(user.role, Action::SubmitResource)?;

    let (Some(resource_name), Some(quantity), Some(reason)) = (
        non_blank(request.resource_name.as_deref()),
        request.quantity,
        non_blank(request.reason.as_deref()),
    ) else {
        return Err(AppError::validation("Resource name, quantity and reason are required!"));
    };

    let id = store
        .insert_resource(NewResource {
            employee_id: user.employee_id,
            resource_name,
            quantity: validate_quantity(quantity)?,
            reason,
            requested_at: utc_now(),
        })
        .await?;

    tracing::info!(resource_id = id, actor_id = user.employee_id, quantity, "resource requested");
    Ok(id)
}

pub async fn transition(store: &dyn Store, user: &AuthUser, id: i64, transition: ResourceTransition) -> AppResult<String> {
    authorize(user.role, transition.action())?;

    if !store.transition_resource(id, transition).await? {
        tracing::info!(resource_id = id, actor_id = user.employee_id, ?transition, "resource transition refused");
        return Err(AppError::not_found("Resource request not found or already processed!"));
    }

    tracing::info!(resource_id = id, actor_id = user.employee_id, ?transition, "resource transitioned");
    Ok(format!("Resource request {} successfully!", transition.verb()))
}

pub async fn edit(store: &dyn Store, user: &AuthUser, id: i64, request: ResourceUpdateRequest) -> AppResult<()> {
    authorize(user.role, Action::EditResource)?;
    let scope = Action::EditResource.scope(user.role, user.employee_id);

    let changes = ResourceChanges {
        resource_name: optional_text(request.resource_name.as_deref(), "Resource name")?,
        quantity: request.quantity.map(validate_quantity).transpose()?,
        reason: optional_text(request.reason.as_deref(), "Reason")?,
    };
    if changes.is_empty() {
        return Err(AppError::validation("No fields to update!"));
    }

    if !store.update_resource(id, scope, &changes).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }

    tracing::info!(resource_id = id, actor_id = user.employee_id, "resource request updated");
    Ok(())
}

pub async fn delete(store: &dyn Store, user: &AuthUser, id: i64) -> AppResult<()> {
    authorize(user.role, Action::DeleteResource)?;
    let scope = Action::DeleteResource.scope(user.role, user.employee_id);

    if !store.delete_resource(id, scope).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }

    tracing::info!(resource_id = id, actor_id = user.employee_id, "resource request deleted");
    Ok(())
}

pub async fn get(store: &dyn Store, user: &AuthUser, id: i64) -> AppResult<Resource> {
    authorize(user.role, Action::ViewResource)?;
    let scope = Action::ViewResource.scope(user.role, user.employee_id);

    store
        .find_resource(id, scope)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

/// Managers see every request; everyone else sees their own.
pub async fn list(store: &dyn Store, user: &AuthUser, query: &ResourceListQuery) -> AppResult<Vec<Resource>> {
    let status = match non_blank(query.status.as_deref()) {
        None => None,
        Some(raw) => Some(ResourceStatus::parse(&raw).ok_or_else(|| AppError::validation(format!("Invalid status: {raw}")))?),
    };

    store
        .list_resources(&ResourceFilter {
            owner: Action::ViewResource.scope(user.role, user.employee_id).owner(),
            status,
        })
        .await
}
