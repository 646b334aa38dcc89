use crate::inventory::{AccessLevel, Agent, Inventory, Project, User};
use async_trait::async_trait;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    CreateWorkspace,
}

impl Ability {
    /// Lowest project access level granting the ability.
    pub fn minimum_access_level(self) -> AccessLevel {
        match self {
            Ability::CreateWorkspace => AccessLevel::Developer,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Project(&'a Project),
    /// Permissions on an agent are those on the project it is registered in.
    Agent(&'a Agent),
}

/// Answers whether a user may perform an ability on a subject.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    async fn allowed(&self, user: &User, subject: Subject<'_>, ability: Ability) -> bool;
}

/// Policy backed by the project membership table.
#[derive(Clone)]
pub struct MembershipPolicy {
    inventory: Inventory,
}

impl MembershipPolicy {
    pub fn new(inventory: Inventory) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl AccessPolicy for MembershipPolicy {
    async fn allowed(&self, user: &User, subject: Subject<'_>, ability: Ability) -> bool {
        let project_id = match subject {
            Subject::Project(project) => project.id,
            Subject::Agent(agent) => agent.project_id,
        };

        match self.inventory.access_level(user.id, project_id).await {
            Ok(level) => level.is_some_and(|level| level >= ability.minimum_access_level()),
            Err(e) => {
                warn!(user = %user.username, project_id, error = %e, "Access level lookup failed, denying");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_db, seed_fixtures};

    #[tokio::test]
    async fn test_developer_may_create_workspace() {
        let pool = create_test_db().await;
        let fixtures = seed_fixtures(&pool).await;
        let policy = MembershipPolicy::new(Inventory::new(pool));

        assert!(
            policy
                .allowed(&fixtures.user, Subject::Project(&fixtures.project), Ability::CreateWorkspace)
                .await
        );
        assert!(
            policy
                .allowed(&fixtures.user, Subject::Agent(&fixtures.agent), Ability::CreateWorkspace)
                .await
        );
    }

    #[tokio::test]
    async fn test_reporter_may_not_create_workspace() {
        let pool = create_test_db().await;
        let fixtures = seed_fixtures(&pool).await;
        let inventory = Inventory::new(pool);
        inventory
            .add_member(fixtures.project.id, fixtures.user.id, AccessLevel::Reporter)
            .await
            .unwrap();

        let policy = MembershipPolicy::new(inventory);
        assert!(
            !policy
                .allowed(&fixtures.user, Subject::Project(&fixtures.project), Ability::CreateWorkspace)
                .await
        );
    }

    #[tokio::test]
    async fn test_non_member_is_denied() {
        let pool = create_test_db().await;
        let fixtures = seed_fixtures(&pool).await;
        let inventory = Inventory::new(pool);
        let stranger = inventory
            .create_user("mallory", "Mallory", "mallory@example.com")
            .await
            .unwrap();

        let policy = MembershipPolicy::new(inventory);
        assert!(
            !policy
                .allowed(&stranger, Subject::Agent(&fixtures.agent), Ability::CreateWorkspace)
                .await
        );
    }
}
