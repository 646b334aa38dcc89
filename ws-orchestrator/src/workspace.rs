use crate::error::{OrchestratorError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
pub enum WorkspaceState {
    CreationRequested,
    Starting,
    Running,
    Stopping,
    Stopped,
    Terminating,
    Terminated,
    Failed,
    Error,
    Unknown,
    RestartRequested,
}

impl WorkspaceState {
    /// States a user may ask for when creating a workspace.
    pub const DESIRED_ON_CREATE: [WorkspaceState; 4] = [
        WorkspaceState::Running,
        WorkspaceState::Stopped,
        WorkspaceState::Terminated,
        WorkspaceState::RestartRequested,
    ];

    pub fn is_valid_desired_on_create(self) -> bool {
        Self::DESIRED_ON_CREATE.contains(&self)
    }
}

impl fmt::Display for WorkspaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    pub namespace: String,
    pub user_id: i64,
    pub project_id: i64,
    pub agent_id: i64,
    pub personal_access_token_id: i64,
    pub desired_state: WorkspaceState,
    pub desired_state_updated_at: DateTime<Utc>,
    pub actual_state: WorkspaceState,
    pub actual_state_updated_at: DateTime<Utc>,
    pub editor: String,
    pub max_hours_before_termination: i64,
    pub devfile_ref: String,
    pub devfile_path: String,
    pub devfile: String,
    pub processed_devfile: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a workspace about to be inserted.
#[derive(Debug, Clone)]
pub struct NewWorkspace {
    pub name: String,
    pub namespace: String,
    pub user_id: i64,
    pub project_id: i64,
    pub agent_id: i64,
    pub personal_access_token_id: i64,
    pub desired_state: WorkspaceState,
    pub editor: String,
    pub max_hours_before_termination: i64,
    pub devfile_ref: String,
    pub devfile_path: String,
    pub devfile: String,
    pub processed_devfile: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalAccessToken {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub token_digest: String,
    pub scopes: Vec<String>,
    pub expires_at: NaiveDate,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,

    /// Plain token value, only known right after issuing.
    #[serde(skip)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum VariableType {
    Environment = 0,
    File = 1,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceVariable {
    pub id: i64,
    pub workspace_id: i64,
    pub key: String,
    pub value: String,
    pub variable_type: VariableType,
    pub created_at: DateTime<Utc>,
}

pub(crate) async fn insert_personal_access_token(
    conn: &mut SqliteConnection,
    user_id: i64,
    name: &str,
    token: &str,
    scopes: &[&str],
    expires_at: NaiveDate,
) -> Result<PersonalAccessToken> {
    let now = Utc::now();
    let digest = ws_core::secrets::digest_token(token);
    let expires_ts = expires_at.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();

    let id = sqlx::query(
        r#"
        INSERT INTO personal_access_tokens (user_id, name, token_digest, scopes, expires_at, revoked, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(&digest)
    .bind(scopes.join(","))
    .bind(expires_ts)
    .bind(now.timestamp())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    let row = sqlx::query_as::<_, TokenRow>("SELECT * FROM personal_access_tokens WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    let mut issued = PersonalAccessToken::from(row);
    issued.token = Some(token.to_string());
    Ok(issued)
}

pub(crate) async fn insert_workspace(
    conn: &mut SqliteConnection,
    workspace: &NewWorkspace,
) -> Result<Workspace> {
    let now = Utc::now().timestamp();

    let id = sqlx::query(
        r#"
        INSERT INTO workspaces (
            name, namespace, user_id, project_id, agent_id, personal_access_token_id,
            desired_state, desired_state_updated_at, actual_state, actual_state_updated_at,
            editor, max_hours_before_termination, devfile_ref, devfile_path, devfile,
            processed_devfile, url, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&workspace.name)
    .bind(&workspace.namespace)
    .bind(workspace.user_id)
    .bind(workspace.project_id)
    .bind(workspace.agent_id)
    .bind(workspace.personal_access_token_id)
    .bind(workspace.desired_state)
    .bind(now)
    .bind(WorkspaceState::CreationRequested)
    .bind(now)
    .bind(&workspace.editor)
    .bind(workspace.max_hours_before_termination)
    .bind(&workspace.devfile_ref)
    .bind(&workspace.devfile_path)
    .bind(&workspace.devfile)
    .bind(&workspace.processed_devfile)
    .bind(&workspace.url)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    let row = sqlx::query_as::<_, WorkspaceRow>("SELECT * FROM workspaces WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(row.into())
}

/// Name and namespace uniqueness, checked the way a validation would before insert.
pub(crate) async fn workspace_conflict(
    conn: &mut SqliteConnection,
    name: &str,
    namespace: &str,
) -> Result<Option<&'static str>> {
    let (name_taken, namespace_taken): (bool, bool) = sqlx::query_as(
        r#"
        SELECT
            EXISTS(SELECT 1 FROM workspaces WHERE name = ?),
            EXISTS(SELECT 1 FROM workspaces WHERE namespace = ?)
        "#,
    )
    .bind(name)
    .bind(namespace)
    .fetch_one(&mut *conn)
    .await?;

    Ok(if name_taken {
        Some("Name")
    } else if namespace_taken {
        Some("Namespace")
    } else {
        None
    })
}

pub(crate) async fn insert_workspace_variable(
    conn: &mut SqliteConnection,
    workspace_id: i64,
    key: &str,
    value: &str,
    variable_type: VariableType,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO workspace_variables (workspace_id, key, value, variable_type, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(workspace_id)
    .bind(key)
    .bind(value)
    .bind(variable_type)
    .bind(Utc::now().timestamp())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Read access to persisted workspaces and the records created with them.
#[derive(Clone)]
pub struct WorkspaceStore {
    pool: SqlitePool,
}

impl WorkspaceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_workspace(&self, id: i64) -> Result<Workspace> {
        let row = sqlx::query_as::<_, WorkspaceRow>("SELECT * FROM workspaces WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("workspace {}", id)))?;

        Ok(row.into())
    }

    pub async fn get_personal_access_token(&self, id: i64) -> Result<PersonalAccessToken> {
        let row = sqlx::query_as::<_, TokenRow>("SELECT * FROM personal_access_tokens WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("personal access token {}", id)))?;

        Ok(row.into())
    }

    pub async fn list_variables(&self, workspace_id: i64) -> Result<Vec<WorkspaceVariable>> {
        let rows = sqlx::query_as::<_, VariableRow>(
            "SELECT * FROM workspace_variables WHERE workspace_id = ? ORDER BY id",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.into()).collect())
    }
}

fn timestamp(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

// Internal row types for sqlx
#[derive(sqlx::FromRow)]
struct WorkspaceRow {
    id: i64,
    name: String,
    namespace: String,
    user_id: i64,
    project_id: i64,
    agent_id: i64,
    personal_access_token_id: i64,
    desired_state: WorkspaceState,
    desired_state_updated_at: i64,
    actual_state: WorkspaceState,
    actual_state_updated_at: i64,
    editor: String,
    max_hours_before_termination: i64,
    devfile_ref: String,
    devfile_path: String,
    devfile: String,
    processed_devfile: String,
    url: String,
    created_at: i64,
    updated_at: i64,
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i64,
    user_id: i64,
    name: String,
    token_digest: String,
    scopes: String,
    expires_at: i64,
    revoked: bool,
    created_at: i64,
}

#[derive(sqlx::FromRow)]
struct VariableRow {
    id: i64,
    workspace_id: i64,
    key: String,
    value: String,
    variable_type: VariableType,
    created_at: i64,
}

impl From<WorkspaceRow> for Workspace {
    fn from(row: WorkspaceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            namespace: row.namespace,
            user_id: row.user_id,
            project_id: row.project_id,
            agent_id: row.agent_id,
            personal_access_token_id: row.personal_access_token_id,
            desired_state: row.desired_state,
            desired_state_updated_at: timestamp(row.desired_state_updated_at),
            actual_state: row.actual_state,
            actual_state_updated_at: timestamp(row.actual_state_updated_at),
            editor: row.editor,
            max_hours_before_termination: row.max_hours_before_termination,
            devfile_ref: row.devfile_ref,
            devfile_path: row.devfile_path,
            devfile: row.devfile,
            processed_devfile: row.processed_devfile,
            url: row.url,
            created_at: timestamp(row.created_at),
            updated_at: timestamp(row.updated_at),
        }
    }
}

impl From<TokenRow> for PersonalAccessToken {
    fn from(row: TokenRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            token_digest: row.token_digest,
            scopes: row
                .scopes
                .split(',')
                .filter(|scope| !scope.is_empty())
                .map(str::to_string)
                .collect(),
            expires_at: timestamp(row.expires_at).date_naive(),
            revoked: row.revoked,
            created_at: timestamp(row.created_at),
            token: None,
        }
    }
}

impl From<VariableRow> for WorkspaceVariable {
    fn from(row: VariableRow) -> Self {
        Self {
            id: row.id,
            workspace_id: row.workspace_id,
            key: row.key,
            value: row.value,
            variable_type: row.variable_type,
            created_at: timestamp(row.created_at),
        }
    }
}
