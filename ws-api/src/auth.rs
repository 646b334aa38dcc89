use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};
use ws_orchestrator::{User, Workspace};

/// Headers carrying the authenticated username, most specific first.
pub const USER_HEADERS: [&str; 3] = ["x-ws-user", "x-forwarded-user", "x-user"];

#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub User);

pub fn username_from_headers(headers: &HeaderMap) -> Option<String> {
    USER_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Resolves the user named by the auth proxy headers against the users table.
///
/// A missing header or an unknown username is a 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let username = username_from_headers(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let user = state
        .inventory
        .find_user_by_username(&username)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to look up user");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or_else(|| {
            debug!(%username, "Rejecting unknown user");
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(req).await)
}

pub fn check_workspace_owner(workspace: &Workspace, user: &AuthenticatedUser) -> Result<(), ApiError> {
    if workspace.user_id != user.0.id {
        return Err(ApiError::Forbidden(format!(
            "Access denied: workspace {} belongs to another user",
            workspace.id
        )));
    }

    Ok(())
}
