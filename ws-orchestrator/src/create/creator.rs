use super::context::Context;
use super::messages::Message;
use super::personal_access_token_creator::PersonalAccessTokenCreator;
use super::workspace_creator::WorkspaceCreator;
use super::workspace_variables_creator::WorkspaceVariablesCreator;
use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tracing::{info, warn};
use ws_core::secrets::generate_name_suffix;
use ws_core::{FallibleStep, Railway, Step};

pub const NAME_SUFFIX_LENGTH: usize = 6;

/// Source of the random part of workspace names.
pub trait NameSuffixGenerator: Send + Sync {
    fn generate(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNameSuffix;

impl NameSuffixGenerator for RandomNameSuffix {
    fn generate(&self) -> String {
        generate_name_suffix(NAME_SUFFIX_LENGTH)
    }
}

/// Context of the persistence steps: the creation context plus the
/// transaction all of them write through.
pub struct CreatorContext {
    pub context: Context,
    pub tx: Transaction<'static, Sqlite>,
}

/// Persists the access token, the workspace and its variables as one unit.
///
/// A failing step drops the transaction with its context, which rolls it back.
pub struct Creator {
    pool: SqlitePool,
    suffix: Arc<dyn NameSuffixGenerator>,
    steps: Railway<CreatorContext, Message>,
}

impl Creator {
    pub fn new(pool: SqlitePool, suffix: Arc<dyn NameSuffixGenerator>) -> Self {
        Self {
            pool,
            suffix,
            steps: Railway::new(vec![
                Step::and_then(PersonalAccessTokenCreator),
                Step::and_then(WorkspaceCreator),
                Step::and_then(WorkspaceVariablesCreator),
            ]),
        }
    }
}

#[async_trait]
impl FallibleStep<Context, Message> for Creator {
    fn name(&self) -> &'static str {
        "creator"
    }

    async fn run(&self, mut context: Context) -> Result<Context, Message> {
        let suffix = self.suffix.generate();
        let agent_id = context.params.agent.id;
        let user_id = context.current_user.id;
        let workspace_name = format!("workspace-{}-{}-{}", agent_id, user_id, suffix);

        context.workspace_namespace = Some(format!("ws-ns-{}-{}-{}", agent_id, user_id, suffix));
        context.workspace_name = Some(workspace_name.clone());

        let tx = self.pool.begin().await.map_err(|e| {
            Message::WorkspaceCreateFailed(format!("Could not start transaction: {}", e))
        })?;

        let CreatorContext { context, tx } = match self.steps.run(CreatorContext { context, tx }).await {
            Ok(created) => created,
            Err(message) => {
                warn!(workspace = %workspace_name, error = %message, "Workspace creation rolled back");
                return Err(message);
            }
        };

        tx.commit().await.map_err(|e| {
            Message::WorkspaceCreateFailed(format!("Could not commit transaction: {}", e))
        })?;

        info!(workspace = %workspace_name, "Workspace created");
        Ok(context)
    }
}
