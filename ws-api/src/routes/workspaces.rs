use crate::{
    auth::{check_workspace_owner, AuthenticatedUser},
    error::{ApiError, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use ws_orchestrator::create::{Reason, ResponseStatus, VariableParams};
use ws_orchestrator::{Context, CreateParams, Workspace, WorkspaceState};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWorkspaceRequest {
    pub agent_id: i64,
    pub project_id: i64,
    pub editor: String,
    pub max_hours_before_termination: i64,
    pub desired_state: WorkspaceState,
    pub devfile_ref: String,
    pub devfile_path: String,
    #[serde(default)]
    pub variables: Vec<VariableParams>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/workspaces", post(create_workspace))
        .route("/api/v1/workspaces/{id}", get(get_workspace))
}

#[utoipa::path(
    post,
    path = "/api/v1/workspaces",
    tag = "ws-api",
    request_body = CreateWorkspaceRequest,
    responses(
        (status = 201, description = "Workspace created", body = Workspace),
        (status = 400, description = "Creation failed"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Unknown agent or project"),
    )
)]
pub async fn create_workspace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CreateWorkspaceRequest>,
) -> ApiResult<(StatusCode, Json<Workspace>)> {
    let agent = state.inventory.find_agent(req.agent_id).await?;
    let project = state.inventory.find_project(req.project_id).await?;

    let context = Context::new(
        CreateParams {
            agent,
            project,
            editor: req.editor,
            desired_state: req.desired_state,
            max_hours_before_termination: req.max_hours_before_termination,
            devfile_ref: req.devfile_ref,
            devfile_path: req.devfile_path,
            variables: req.variables,
        },
        user.0,
        state.settings.clone(),
    );

    let response = state.create_workspace.main(context).await?;

    match (response.status, response.payload, response.message) {
        (ResponseStatus::Success, Some(payload), _) => {
            info!(workspace = %payload.workspace.name, "Workspace created");
            Ok((StatusCode::CREATED, Json(payload.workspace)))
        }
        (ResponseStatus::Error, _, Some(message)) => match response.reason {
            Some(Reason::Unauthorized) => Err(ApiError::Forbidden(message)),
            _ => Err(ApiError::BadRequest(message)),
        },
        _ => Err(ApiError::Internal(
            "Workspace creation returned an incomplete response".to_string(),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/workspaces/{id}",
    tag = "ws-api",
    params(("id" = i64, Path, description = "Workspace id")),
    responses(
        (status = 200, description = "Workspace", body = Workspace),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "Workspace not found"),
    )
)]
pub async fn get_workspace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Workspace>> {
    let workspace = state.workspaces.get_workspace(id).await?;
    check_workspace_owner(&workspace, &user)?;

    Ok(Json(workspace))
}
