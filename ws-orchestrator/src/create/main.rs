use super::authorizer::Authorizer;
use super::context::Context;
use super::creator::{Creator, NameSuffixGenerator, RandomNameSuffix};
use super::devfile_fetcher::DevfileFetcher;
use super::devfile_flattener::DevfileFlattener;
use super::messages::{Message, Reason, Response, UnmatchedResultError};
use super::post_flatten_devfile_validator::PostFlattenDevfileValidator;
use super::pre_flatten_devfile_validator::PreFlattenDevfileValidator;
use super::project_cloner_component_injector::ProjectClonerComponentInjector;
use super::tools_component_injector::ToolsComponentInjector;
use super::volume_component_injector::VolumeComponentInjector;
use super::volume_definer::VolumeDefiner;
use crate::policy::AccessPolicy;
use crate::repository::RepositoryReader;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use ws_core::{Railway, Step, StepMode};

/// The workspace creation pipeline.
///
/// Runs authorization, devfile loading, flattening, validation, component
/// injection and persistence in that order, then maps the outcome to a
/// [`Response`].
pub struct CreateWorkspace {
    railway: Railway<Context, Message>,
}

impl CreateWorkspace {
    pub fn new(
        pool: SqlitePool,
        policy: Arc<dyn AccessPolicy>,
        reader: Arc<dyn RepositoryReader>,
    ) -> Self {
        Self::with_name_suffix(pool, policy, reader, Arc::new(RandomNameSuffix))
    }

    pub fn with_name_suffix(
        pool: SqlitePool,
        policy: Arc<dyn AccessPolicy>,
        reader: Arc<dyn RepositoryReader>,
        suffix: Arc<dyn NameSuffixGenerator>,
    ) -> Self {
        Self::from_steps(vec![
            Step::and_then(Authorizer::new(policy)),
            Step::and_then(DevfileFetcher::new(Arc::clone(&reader))),
            Step::and_then(PreFlattenDevfileValidator),
            Step::and_then(DevfileFlattener::new(reader)),
            Step::and_then(PostFlattenDevfileValidator),
            Step::map(VolumeDefiner),
            Step::map(ToolsComponentInjector),
            Step::map(ProjectClonerComponentInjector),
            Step::map(VolumeComponentInjector),
            Step::and_then(Creator::new(pool, suffix)),
        ])
    }

    /// Pipeline over an arbitrary step list.
    pub fn from_steps(steps: Vec<Step<Context, Message>>) -> Self {
        Self {
            railway: Railway::new(steps),
        }
    }

    pub fn describe(&self) -> Vec<(&'static str, StepMode)> {
        self.railway.describe()
    }

    #[instrument(skip_all, fields(user = %context.current_user.username, project = %context.params.project.path_with_namespace))]
    pub async fn main(&self, context: Context) -> Result<Response, UnmatchedResultError> {
        match self.railway.run(context).await {
            Ok(Context {
                workspace: Some(workspace),
                ..
            }) => {
                info!(workspace = %workspace.name, "Workspace create successful");
                Ok(Response::success(workspace))
            }
            Ok(_) => Err(UnmatchedResultError(
                "Ok(Context) without a created workspace".to_string(),
            )),
            Err(message @ Message::Unauthorized(_)) => {
                info!(error = %message, "Workspace create unauthorized");
                Ok(Response::error(message.to_string(), Reason::Unauthorized))
            }
            Err(Message::WorkspaceCreateSuccessful(_)) => Err(UnmatchedResultError(
                "Err(WorkspaceCreateSuccessful)".to_string(),
            )),
            Err(message) => {
                warn!(kind = message.kind(), error = %message, "Workspace create failed");
                Ok(Response::error(message.to_string(), Reason::BadRequest))
            }
        }
    }
}
