use crate::inventory::{AccessLevel, Agent, AgentConfig, Inventory, NewProject, Project, User};
use sqlx::SqlitePool;
use std::path::Path;

/// Helper to create an in-memory test database with migrations applied
pub async fn create_test_db() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub const TEST_DNS_ZONE: &str = "workspaces.localdev.me";

/// Records most pipeline tests start from.
#[derive(Debug, Clone)]
pub struct Fixtures {
    /// Developer on both projects.
    pub user: User,
    /// Project the workspace is created for.
    pub project: Project,
    /// Project the agent is registered in, under the same root namespace.
    pub agent_project: Project,
    /// Agent with an enabled config in [`TEST_DNS_ZONE`].
    pub agent: Agent,
}

/// Seed fixtures whose workspace project points at a repository that does not exist.
pub async fn seed_fixtures(pool: &SqlitePool) -> Fixtures {
    seed_fixtures_at(pool, "/nonexistent/acme/storefront.git").await
}

/// Seed fixtures whose workspace project reads from `repository_path`.
pub async fn seed_fixtures_at(pool: &SqlitePool, repository_path: &str) -> Fixtures {
    let inventory = Inventory::new(pool.clone());

    let user = inventory
        .create_user("ada", "Ada Lovelace", "ada@example.com")
        .await
        .expect("Failed to create user");

    let project = inventory
        .create_project(NewProject {
            name: "Storefront".to_string(),
            path: "storefront".to_string(),
            path_with_namespace: "acme/shop/storefront".to_string(),
            root_namespace: "acme".to_string(),
            http_url_to_repo: "https://git.example.com/acme/shop/storefront.git".to_string(),
            repository_path: repository_path.to_string(),
        })
        .await
        .expect("Failed to create project");

    let agent_project = inventory
        .create_project(NewProject {
            name: "Cluster Agents".to_string(),
            path: "cluster-agents".to_string(),
            path_with_namespace: "acme/cluster-agents".to_string(),
            root_namespace: "acme".to_string(),
            http_url_to_repo: "https://git.example.com/acme/cluster-agents.git".to_string(),
            repository_path: "/nonexistent/acme/cluster-agents.git".to_string(),
        })
        .await
        .expect("Failed to create agent project");

    for project_id in [project.id, agent_project.id] {
        inventory
            .add_member(project_id, user.id, AccessLevel::Developer)
            .await
            .expect("Failed to add member");
    }

    let agent = inventory
        .create_agent("007", agent_project.id)
        .await
        .expect("Failed to create agent");
    inventory
        .set_agent_config(
            agent.id,
            &AgentConfig {
                enabled: true,
                dns_zone: TEST_DNS_ZONE.to_string(),
                max_hours_before_termination_limit: 120,
            },
        )
        .await
        .expect("Failed to configure agent");
    let agent = inventory
        .find_agent(agent.id)
        .await
        .expect("Failed to reload agent");

    Fixtures {
        user,
        project,
        agent_project,
        agent,
    }
}

/// Create a git repository at `path` with one commit on `main` holding `files`.
pub fn create_git_repository(path: &Path, files: &[(&str, &str)]) {
    let repo = git2::Repository::init(path).expect("Failed to init repository");

    let mut index = repo.index().expect("Failed to open index");
    for (relative, content) in files {
        let file = path.join(relative);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directory");
        }
        std::fs::write(&file, content).expect("Failed to write file");
        index
            .add_path(Path::new(relative))
            .expect("Failed to stage file");
    }
    index.write().expect("Failed to write index");

    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");
    let signature =
        git2::Signature::now("Test", "test@example.com").expect("Failed to create signature");
    repo.commit(
        Some("refs/heads/main"),
        &signature,
        &signature,
        "Initial commit",
        &tree,
        &[],
    )
    .expect("Failed to commit");
}
