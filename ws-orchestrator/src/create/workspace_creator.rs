use super::creator::CreatorContext;
use super::messages::Message;
use super::tools_component_injector::WORKSPACE_EDITOR_PORT;
use crate::error::OrchestratorError;
use crate::workspace::{insert_workspace, workspace_conflict, NewWorkspace};
use async_trait::async_trait;
use url::form_urlencoded;
use ws_core::FallibleStep;
use ws_devfile::to_yaml;

pub const SUPPORTED_EDITORS: [&str; 1] = ["webide"];

fn failed(details: impl std::fmt::Display) -> Message {
    Message::WorkspaceCreateFailed(format!("Workspace: {}", details))
}

/// Map unique index collisions to the attribute that collided.
fn persistence_error(e: OrchestratorError) -> Message {
    match e.unique_violation() {
        Some(detail) if detail.contains("workspaces.namespace") => {
            failed("Namespace has already been taken")
        }
        Some(detail) if detail.contains("workspaces.name") => failed("Name has already been taken"),
        _ => failed(e),
    }
}

pub(crate) fn workspace_url(name: &str, dns_zone: &str, project_path: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("folder", &format!("/projects/{}", project_path))
        .finish();
    format!("https://{}-{}.{}?{}", WORKSPACE_EDITOR_PORT, name, dns_zone, query)
}

/// Validates the request and inserts the workspace record.
pub struct WorkspaceCreator;

#[async_trait]
impl FallibleStep<CreatorContext, Message> for WorkspaceCreator {
    fn name(&self) -> &'static str {
        "workspace_creator"
    }

    async fn run(&self, mut creator: CreatorContext) -> Result<CreatorContext, Message> {
        let context = &mut creator.context;
        let params = &context.params;

        if !SUPPORTED_EDITORS.contains(&params.editor.as_str()) {
            return Err(failed(format!(
                "Editor '{}' is not supported, it must be one of {:?}",
                params.editor, SUPPORTED_EDITORS
            )));
        }

        let config = params
            .agent
            .config
            .as_ref()
            .ok_or_else(|| failed(format!("Agent '{}' has no remote development config", params.agent.name)))?;

        let limit = config.max_hours_before_termination_limit;
        if !(1..=limit).contains(&params.max_hours_before_termination) {
            return Err(failed(format!(
                "Max hours before termination must be between 1 and {}",
                limit
            )));
        }

        if !params.desired_state.is_valid_desired_on_create() {
            return Err(failed(format!(
                "Desired state '{}' is not allowed when creating a workspace",
                params.desired_state
            )));
        }

        let (Some(name), Some(namespace), Some(token), Some(devfile_yaml), Some(processed)) = (
            context.workspace_name.clone(),
            context.workspace_namespace.clone(),
            context.personal_access_token.as_ref(),
            context.devfile_yaml.clone(),
            context.processed_devfile.as_ref(),
        ) else {
            return Err(failed("Creation context is incomplete"));
        };

        if let Some(attribute) = workspace_conflict(&mut creator.tx, &name, &namespace)
            .await
            .map_err(failed)?
        {
            return Err(failed(format!("{} has already been taken", attribute)));
        }

        let processed_devfile = to_yaml(processed).map_err(failed)?;
        let url = workspace_url(&name, &config.dns_zone, &params.project.path);

        let workspace = insert_workspace(
            &mut creator.tx,
            &NewWorkspace {
                name,
                namespace,
                user_id: context.current_user.id,
                project_id: params.project.id,
                agent_id: params.agent.id,
                personal_access_token_id: token.id,
                desired_state: params.desired_state,
                editor: params.editor.clone(),
                max_hours_before_termination: params.max_hours_before_termination,
                devfile_ref: params.devfile_ref.clone(),
                devfile_path: params.devfile_path.clone(),
                devfile: devfile_yaml,
                processed_devfile,
                url,
            },
        )
        .await
        .map_err(persistence_error)?;

        context.workspace = Some(workspace);
        Ok(creator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_url() {
        assert_eq!(
            workspace_url("workspace-1-2-abc123", "workspaces.localdev.me", "storefront"),
            "https://60001-workspace-1-2-abc123.workspaces.localdev.me?folder=%2Fprojects%2Fstorefront"
        );
    }
}
