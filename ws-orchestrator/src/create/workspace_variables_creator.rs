use super::creator::CreatorContext;
use super::messages::Message;
use super::workspace_variables::StandardVariables;
use crate::workspace::insert_workspace_variable;
use async_trait::async_trait;
use regex::Regex;
use ws_core::FallibleStep;

const VARIABLE_KEY_PATTERN: &str = r"^[a-zA-Z_][a-zA-Z0-9_.-]*$";

fn failed(key: &str, details: impl std::fmt::Display) -> Message {
    Message::WorkspaceCreateFailed(format!("Workspace variable '{}': {}", key, details))
}

/// Persists the standard workspace variables followed by the user's own.
pub struct WorkspaceVariablesCreator;

#[async_trait]
impl FallibleStep<CreatorContext, Message> for WorkspaceVariablesCreator {
    fn name(&self) -> &'static str {
        "workspace_variables_creator"
    }

    async fn run(&self, mut creator: CreatorContext) -> Result<CreatorContext, Message> {
        let context = &creator.context;

        let (Some(workspace), Some(token)) = (
            context.workspace.as_ref(),
            context
                .personal_access_token
                .as_ref()
                .and_then(|token| token.token.as_deref()),
        ) else {
            return Err(Message::WorkspaceCreateFailed(
                "Workspace variable: workspace or token has not been created".to_string(),
            ));
        };

        let dns_zone = context
            .params
            .agent
            .config
            .as_ref()
            .map(|config| config.dns_zone.as_str())
            .unwrap_or_default();

        let mut variables = StandardVariables {
            workspace_name: &workspace.name,
            dns_zone,
            personal_access_token: token,
            user_name: &context.current_user.name,
            user_email: &context.current_user.email,
            settings: &context.settings,
        }
        .build();

        let key_regex = Regex::new(VARIABLE_KEY_PATTERN)
            .map_err(|e| Message::WorkspaceCreateFailed(format!("Invalid regex pattern: {}", e)))?;
        for variable in &context.params.variables {
            if !key_regex.is_match(&variable.key) {
                return Err(failed(
                    &variable.key,
                    format!("Key must match {}", VARIABLE_KEY_PATTERN),
                ));
            }
        }
        variables.extend(context.params.variables.iter().cloned());

        let workspace_id = workspace.id;
        for variable in &variables {
            insert_workspace_variable(
                &mut creator.tx,
                workspace_id,
                &variable.key,
                &variable.value,
                variable.variable_type,
            )
            .await
            .map_err(|e| match e.unique_violation() {
                Some(_) => failed(&variable.key, "Key has already been taken"),
                None => failed(&variable.key, e),
            })?;
        }

        Ok(creator)
    }
}
