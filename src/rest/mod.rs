use std::{net::SocketAddr, time::SystemTime};

use axum::{routing::get, Router};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::storage::SqliteStorage;

mod error;
mod extract;
mod handlers;
mod models;

pub use error::ApiError;
pub use handlers::AppState;

use handlers::{
    create_entitlement, create_organization, get_entitlement, get_organization, health,
    list_entitlements, list_organizations, not_found, update_entitlement, update_organization,
};

/// Build the API router with every route mounted under `prefix`.
pub fn router(state: AppState, prefix: &str) -> Router {
    let entitlements = format!("{prefix}/entitlements");
    let organizations = format!("{prefix}/organizations");

    Router::new()
        .route(&format!("{prefix}/health"), get(health))
        .route(
            &entitlements,
            get(list_entitlements).post(create_entitlement),
        )
        .route(
            &format!("{entitlements}/"),
            get(list_entitlements).post(create_entitlement),
        )
        .route(
            &format!("{entitlements}/:id"),
            get(get_entitlement).patch(update_entitlement),
        )
        .route(
            &organizations,
            get(list_organizations).post(create_organization),
        )
        .route(
            &format!("{organizations}/"),
            get(list_organizations).post(create_organization),
        )
        .route(
            &format!("{organizations}/:id"),
            get(get_organization).patch(update_organization),
        )
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(::tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(::tracing::Level::INFO)),
        )
        .with_state(state)
}

pub async fn serve(
    addr: SocketAddr,
    storage: SqliteStorage,
    prefix: String,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    log::info!("🌐 REST service on http://{}{}", addr, prefix);

    let state = AppState {
        storage,
        started_at: SystemTime::now(),
    };
    let app = router(state, &prefix);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
