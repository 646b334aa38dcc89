use crate::inventory::{Agent, Project, User};
use crate::settings::Settings;
use crate::workspace::{PersonalAccessToken, VariableType, Workspace, WorkspaceState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use ws_devfile::Devfile;

/// A user-supplied workspace variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VariableParams {
    pub key: String,
    pub value: String,
    #[serde(rename = "type", default = "default_variable_type")]
    pub variable_type: VariableType,
}

fn default_variable_type() -> VariableType {
    VariableType::Environment
}

/// What the caller asked for.
#[derive(Debug, Clone)]
pub struct CreateParams {
    pub agent: Agent,
    pub project: Project,
    pub editor: String,
    pub desired_state: WorkspaceState,
    pub max_hours_before_termination: i64,
    pub devfile_ref: String,
    pub devfile_path: String,
    pub variables: Vec<VariableParams>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMounts {
    pub data_volume: VolumeMount,
}

/// State threaded through the creation stages. Each stage fills in the
/// fields it is responsible for and hands the context on.
#[derive(Debug, Clone)]
pub struct Context {
    pub params: CreateParams,
    pub current_user: User,
    pub settings: Settings,

    pub devfile_yaml: Option<String>,
    /// Parsed devfile as read from the repository, imports unresolved.
    pub devfile: Option<Value>,
    pub processed_devfile: Option<Devfile>,
    pub volume_mounts: Option<VolumeMounts>,

    pub workspace_name: Option<String>,
    pub workspace_namespace: Option<String>,
    pub personal_access_token: Option<PersonalAccessToken>,
    pub workspace: Option<Workspace>,
}

impl Context {
    pub fn new(params: CreateParams, current_user: User, settings: Settings) -> Self {
        Self {
            params,
            current_user,
            settings,
            devfile_yaml: None,
            devfile: None,
            processed_devfile: None,
            volume_mounts: None,
            workspace_name: None,
            workspace_namespace: None,
            personal_access_token: None,
            workspace: None,
        }
    }
}
