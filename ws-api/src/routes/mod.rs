pub mod health;
pub mod workspaces;

use crate::{api_docs::ApiDoc, auth::auth_middleware, state::AppState};
use axum::{middleware, routing::get, Json, Router};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use ws_orchestrator::Settings;

pub async fn create_app(pool: SqlitePool, settings: Settings) -> anyhow::Result<Router> {
    Ok(router(AppState::new(pool, settings)))
}

/// Router over prepared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .merge(health::routes())
        .route("/api-docs/openapi.json", get(openapi_spec))
        .merge(
            workspaces::routes()
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
