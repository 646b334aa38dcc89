//! Users, projects, memberships and agents.
//!
//! Workspace creation only reads these records; the insert helpers exist for
//! seeding and administration.

use crate::error::{OrchestratorError, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Default ceiling on `max_hours_before_termination` for an agent.
pub const DEFAULT_MAX_HOURS_BEFORE_TERMINATION_LIMIT: i64 = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub path_with_namespace: String,
    pub root_namespace: String,
    pub http_url_to_repo: String,
    /// Location of the bare or working git repository on disk.
    pub repository_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub enabled: bool,
    pub dns_zone: String,
    pub max_hours_before_termination_limit: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub name: String,
    pub project_id: i64,
    /// Root namespace of the project the agent is registered in.
    pub root_namespace: String,
    pub config: Option<AgentConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Guest = 10,
    Reporter = 20,
    Developer = 30,
    Maintainer = 40,
    Owner = 50,
}

impl AccessLevel {
    pub fn from_i64(level: i64) -> Option<Self> {
        match level {
            10 => Some(AccessLevel::Guest),
            20 => Some(AccessLevel::Reporter),
            30 => Some(AccessLevel::Developer),
            40 => Some(AccessLevel::Maintainer),
            50 => Some(AccessLevel::Owner),
            _ => None,
        }
    }
}

/// Fields for a new project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub path: String,
    pub path_with_namespace: String,
    pub root_namespace: String,
    pub http_url_to_repo: String,
    pub repository_path: String,
}

#[derive(Clone)]
pub struct Inventory {
    pool: SqlitePool,
}

impl Inventory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_user(&self, id: i64) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("user {}", id)))
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_project(&self, id: i64) -> Result<Project> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("project {}", id)))
    }

    /// Load an agent together with its remote development config, if any.
    pub async fn find_agent(&self, id: i64) -> Result<Agent> {
        let row = sqlx::query_as::<_, AgentRow>(
            r#"
            SELECT a.id, a.name, a.project_id, p.root_namespace,
                   c.enabled, c.dns_zone, c.max_hours_before_termination_limit
            FROM agents a
            JOIN projects p ON p.id = a.project_id
            LEFT JOIN agent_configs c ON c.agent_id = a.id
            WHERE a.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| OrchestratorError::NotFound(format!("agent {}", id)))?;

        Ok(row.into())
    }

    pub async fn access_level(&self, user_id: i64, project_id: i64) -> Result<Option<AccessLevel>> {
        let level: Option<(i64,)> = sqlx::query_as(
            "SELECT access_level FROM project_members WHERE user_id = ? AND project_id = ?",
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(level.and_then(|(level,)| AccessLevel::from_i64(level)))
    }

    pub async fn create_user(&self, username: &str, name: &str, email: &str) -> Result<User> {
        let id = sqlx::query("INSERT INTO users (username, name, email) VALUES (?, ?, ?)")
            .bind(username)
            .bind(name)
            .bind(email)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        self.find_user(id).await
    }

    pub async fn create_project(&self, project: NewProject) -> Result<Project> {
        let id = sqlx::query(
            r#"
            INSERT INTO projects (name, path, path_with_namespace, root_namespace, http_url_to_repo, repository_path)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.name)
        .bind(&project.path)
        .bind(&project.path_with_namespace)
        .bind(&project.root_namespace)
        .bind(&project.http_url_to_repo)
        .bind(&project.repository_path)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.find_project(id).await
    }

    pub async fn add_member(&self, project_id: i64, user_id: i64, level: AccessLevel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, access_level) VALUES (?, ?, ?)
            ON CONFLICT (project_id, user_id) DO UPDATE SET access_level = excluded.access_level
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(level as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn create_agent(&self, name: &str, project_id: i64) -> Result<Agent> {
        let id = sqlx::query("INSERT INTO agents (name, project_id) VALUES (?, ?)")
            .bind(name)
            .bind(project_id)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        self.find_agent(id).await
    }

    pub async fn set_agent_config(&self, agent_id: i64, config: &AgentConfig) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO agent_configs (agent_id, enabled, dns_zone, max_hours_before_termination_limit)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (agent_id) DO UPDATE SET
                enabled = excluded.enabled,
                dns_zone = excluded.dns_zone,
                max_hours_before_termination_limit = excluded.max_hours_before_termination_limit
            "#,
        )
        .bind(agent_id)
        .bind(config.enabled)
        .bind(&config.dns_zone)
        .bind(config.max_hours_before_termination_limit)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    id: i64,
    name: String,
    project_id: i64,
    root_namespace: String,
    enabled: Option<bool>,
    dns_zone: Option<String>,
    max_hours_before_termination_limit: Option<i64>,
}

impl From<AgentRow> for Agent {
    fn from(row: AgentRow) -> Self {
        let config = row.dns_zone.map(|dns_zone| AgentConfig {
            enabled: row.enabled.unwrap_or(true),
            dns_zone,
            max_hours_before_termination_limit: row
                .max_hours_before_termination_limit
                .unwrap_or(DEFAULT_MAX_HOURS_BEFORE_TERMINATION_LIMIT),
        });

        Self {
            id: row.id,
            name: row.name,
            project_id: row.project_id,
            root_namespace: row.root_namespace,
            config,
        }
    }
}
