use std::time::SystemTime;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    collection::Collection,
    models::{EntitlementCreate, EntitlementPatch, OrganizationCreate, OrganizationPatch},
    repository::{EntitlementRepository, OrganizationRepository, Page},
    storage::{Session, SqliteStorage},
};

use super::{
    extract::{EntityId, PageQuery, ValidJson},
    models::{EntitlementResponse, ErrorResponse, HealthResponse, OrganizationResponse},
    ApiError,
};

#[derive(Clone)]
pub struct AppState {
    pub storage: SqliteStorage,
    pub started_at: SystemTime,
}

/// Runs `f` on the blocking pool with a session of its own.
async fn with_session<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Session) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let storage = state.storage.clone();
    tokio::task::spawn_blocking(move || {
        let session = storage.session().map_err(ApiError::internal)?;
        f(&session)
    })
    .await
    .map_err(ApiError::internal)?
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            uptime_secs,
        }),
    )
}

pub async fn list_entitlements(
    State(state): State<AppState>,
    PageQuery(pagination): PageQuery,
) -> Result<Json<Page<EntitlementResponse>>, ApiError> {
    let page = with_session(&state, move |session| {
        Collection::new(EntitlementRepository::new(session)).fetch_page(pagination)
    })
    .await?;
    Ok(Json(page.map(EntitlementResponse::from)))
}

pub async fn get_entitlement(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Json<EntitlementResponse>, ApiError> {
    let entitlement = with_session(&state, move |session| {
        Collection::new(EntitlementRepository::new(session)).get(id)
    })
    .await?;
    Ok(Json(entitlement.into()))
}

pub async fn create_entitlement(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<EntitlementCreate>,
) -> Result<(StatusCode, Json<EntitlementResponse>), ApiError> {
    let entitlement = with_session(&state, move |session| {
        Collection::new(EntitlementRepository::new(session)).create(payload)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(entitlement.into())))
}

pub async fn update_entitlement(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(patch): ValidJson<EntitlementPatch>,
) -> Result<Json<EntitlementResponse>, ApiError> {
    let entitlement = with_session(&state, move |session| {
        Collection::new(EntitlementRepository::new(session)).update(id, patch)
    })
    .await?;
    Ok(Json(entitlement.into()))
}

pub async fn list_organizations(
    State(state): State<AppState>,
    PageQuery(pagination): PageQuery,
) -> Result<Json<Page<OrganizationResponse>>, ApiError> {
    let page = with_session(&state, move |session| {
        Collection::new(OrganizationRepository::new(session)).fetch_page(pagination)
    })
    .await?;
    Ok(Json(page.map(OrganizationResponse::from)))
}

pub async fn get_organization(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Json<OrganizationResponse>, ApiError> {
    let organization = with_session(&state, move |session| {
        Collection::new(OrganizationRepository::new(session)).get(id)
    })
    .await?;
    Ok(Json(organization.into()))
}

pub async fn create_organization(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<OrganizationCreate>,
) -> Result<(StatusCode, Json<OrganizationResponse>), ApiError> {
    let organization = with_session(&state, move |session| {
        Collection::new(OrganizationRepository::new(session)).create(payload)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(organization.into())))
}

pub async fn update_organization(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(patch): ValidJson<OrganizationPatch>,
) -> Result<Json<OrganizationResponse>, ApiError> {
    let organization = with_session(&state, move |session| {
        Collection::new(OrganizationRepository::new(session)).update(id, patch)
    })
    .await?;
    Ok(Json(organization.into()))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            detail: "Not Found".to_string(),
        }),
    )
}
