use super::context::Context;
use super::messages::Message;
use crate::repository::RepositoryReader;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use ws_core::FallibleStep;
use ws_devfile::parse_devfile_yaml;

/// Checks the agent can host the workspace, then loads and parses the devfile.
pub struct DevfileFetcher {
    reader: Arc<dyn RepositoryReader>,
}

impl DevfileFetcher {
    pub fn new(reader: Arc<dyn RepositoryReader>) -> Self {
        Self { reader }
    }

    fn validate_params(context: &Context) -> Result<(), Message> {
        let agent = &context.params.agent;
        let project = &context.params.project;

        let Some(config) = &agent.config else {
            return Err(Message::WorkspaceCreateParamsValidationFailed(format!(
                "No RemoteDevelopmentAgentConfig found for agent '{}'",
                agent.name
            )));
        };

        if !config.enabled {
            return Err(Message::WorkspaceCreateParamsValidationFailed(format!(
                "Remote development is not enabled for agent '{}'",
                agent.name
            )));
        }

        if project.root_namespace != agent.root_namespace {
            return Err(Message::WorkspaceCreateParamsValidationFailed(
                "Workspace's project and agent's project must both be under the same common root group/namespace"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl FallibleStep<Context, Message> for DevfileFetcher {
    fn name(&self) -> &'static str {
        "devfile_fetcher"
    }

    async fn run(&self, mut context: Context) -> Result<Context, Message> {
        Self::validate_params(&context)?;

        let reader = Arc::clone(&self.reader);
        let project = context.params.project.clone();
        let devfile_ref = context.params.devfile_ref.clone();
        let devfile_path = context.params.devfile_path.clone();

        debug!(project = %project.path_with_namespace, %devfile_ref, %devfile_path, "Fetching devfile");
        let blob = tokio::task::spawn_blocking(move || {
            reader.blob_at(&project, &devfile_ref, &devfile_path)
        })
        .await
        .map_err(|e| Message::WorkspaceCreateDevfileLoadFailed(e.to_string()))?
        .map_err(|e| Message::WorkspaceCreateDevfileLoadFailed(e.to_string()))?;

        let Some(blob) = blob else {
            return Err(Message::WorkspaceCreateDevfileLoadFailed(format!(
                "Devfile path '{}' at ref '{}' does not exist in project repository",
                context.params.devfile_path, context.params.devfile_ref
            )));
        };

        let yaml = String::from_utf8(blob).map_err(|e| {
            Message::WorkspaceCreateDevfileYamlParseFailed(format!(
                "Devfile YAML could not be parsed: {}",
                e
            ))
        })?;

        let devfile = parse_devfile_yaml(&yaml)
            .map_err(|e| Message::WorkspaceCreateDevfileYamlParseFailed(e.to_string()))?;

        context.devfile_yaml = Some(yaml);
        context.devfile = Some(devfile);
        Ok(context)
    }
}
