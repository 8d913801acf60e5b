use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::errors::AppError;
use crate::workflow::states::ResourceStatus;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Resource {
    #[serde(rename = "Resource_ID")]
    pub id: i64,
    #[serde(rename = "Employee_ID")]
    pub employee_id: i64,
    #[serde(rename = "Employee_Name", skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(rename = "Resource_Name")]
    pub resource_name: String,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "Request_Date")]
    pub requested_at: DateTime<Utc>,
    #[serde(rename = "Status")]
    pub status: ResourceStatus,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbResource {
    pub id: i64,
    pub employee_id: i64,
    pub employee_name: Option<String>,
    pub resource_name: String,
    pub quantity: i64,
    pub reason: String,
    pub requested_at: DateTime<Utc>,
    pub status: String,
}

impl TryFrom<DbResource> for Resource {
    type Error = AppError;

    fn try_from(value: DbResource) -> Result<Self, Self::Error> {
        let status = ResourceStatus::parse(&value.status)
            .ok_or_else(|| AppError::internal(format!("invalid status {:?} on resource {}", value.status, value.id)))?;

        Ok(Resource {
            id: value.id,
            employee_id: value.employee_id,
            employee_name: value.employee_name,
            resource_name: value.resource_name,
            quantity: value.quantity,
            reason: value.reason,
            requested_at: value.requested_at,
            status,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewResource {
    pub employee_id: i64,
    pub resource_name: String,
    pub quantity: i64,
    pub reason: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceChanges {
    pub resource_name: Option<String>,
    pub quantity: Option<i64>,
    pub reason: Option<String>,
}

impl ResourceChanges {
    pub fn is_empty(&self) -> bool {
        self.resource_name.is_none() && self.quantity.is_none() && self.reason.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub owner: Option<i64>,
    pub status: Option<ResourceStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResourceCreateRequest {
    #[schema(example = "Safety helmet")]
    pub resource_name: Option<String>,
    #[schema(example = 2)]
    pub quantity: Option<i64>,
    #[schema(example = "Site visit next week")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResourceUpdateRequest {
    pub resource_name: Option<String>,
    #[schema(example = 3)]
    pub quantity: Option<i64>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResourceListQuery {
    /// Pending, Approved or Rejected
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResourceCreatedResponse {
    pub message: String,
    #[serde(rename = "resourceId")]
    pub resource_id: i64,
}
