use crate::routes::workspaces::CreateWorkspaceRequest;
use utoipa::OpenApi;
use ws_orchestrator::create::VariableParams;
use ws_orchestrator::workspace::VariableType;
use ws_orchestrator::{Workspace, WorkspaceState};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::health::readiness_check,
        crate::routes::workspaces::create_workspace,
        crate::routes::workspaces::get_workspace,
    ),
    components(
        schemas(
            Workspace,
            WorkspaceState,
            CreateWorkspaceRequest,
            VariableParams,
            VariableType
        )
    ),
    tags(
        (name = "ws-api", description = "Workspace creation API")
    )
)]
pub struct ApiDoc;
