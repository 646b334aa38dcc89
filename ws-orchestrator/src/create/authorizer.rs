use super::context::Context;
use super::messages::Message;
use crate::policy::{Ability, AccessPolicy, Subject};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use ws_core::FallibleStep;

/// Requires `create_workspace` on both the workspace project and the agent.
pub struct Authorizer {
    policy: Arc<dyn AccessPolicy>,
}

impl Authorizer {
    pub fn new(policy: Arc<dyn AccessPolicy>) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl FallibleStep<Context, Message> for Authorizer {
    fn name(&self) -> &'static str {
        "authorizer"
    }

    async fn run(&self, context: Context) -> Result<Context, Message> {
        let user = &context.current_user;
        let params = &context.params;

        let on_project = self
            .policy
            .allowed(user, Subject::Project(&params.project), Ability::CreateWorkspace)
            .await;
        let on_agent = self
            .policy
            .allowed(user, Subject::Agent(&params.agent), Ability::CreateWorkspace)
            .await;

        if on_project && on_agent {
            return Ok(context);
        }

        info!(
            user = %user.username,
            project = %params.project.path_with_namespace,
            agent = %params.agent.name,
            "Workspace creation denied"
        );
        Err(Message::Unauthorized(
            "Insufficient permissions to create a workspace".to_string(),
        ))
    }
}
