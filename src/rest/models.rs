use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    models::{Entitlement, Organization},
    validation::FieldIssue,
};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub detail: Vec<FieldIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementResponse {
    pub id: Uuid,
    pub sponsor_name: String,
    pub sponsor_external_id: String,
    pub sponsor_container_id: String,
    pub activated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Entitlement> for EntitlementResponse {
    fn from(entitlement: Entitlement) -> Self {
        Self {
            id: entitlement.id,
            sponsor_name: entitlement.sponsor_name,
            sponsor_external_id: entitlement.sponsor_external_id,
            sponsor_container_id: entitlement.sponsor_container_id,
            activated_at: entitlement.activated_at,
            created_at: entitlement.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationResponse {
    pub id: Uuid,
    pub name: String,
    pub external_id: String,
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Organization> for OrganizationResponse {
    fn from(organization: Organization) -> Self {
        Self {
            id: organization.id,
            name: organization.name,
            external_id: organization.external_id,
            currency: organization.currency,
            created_at: organization.created_at,
        }
    }
}
