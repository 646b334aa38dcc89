use sqlx::SqlitePool;
use std::sync::Arc;
use ws_orchestrator::{
    CreateWorkspace, GitRepositoryReader, Inventory, MembershipPolicy, Settings, WorkspaceStore,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub inventory: Inventory,
    pub workspaces: WorkspaceStore,
    pub create_workspace: Arc<CreateWorkspace>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(pool: SqlitePool, settings: Settings) -> Self {
        let create_workspace = CreateWorkspace::new(
            pool.clone(),
            Arc::new(MembershipPolicy::new(Inventory::new(pool.clone()))),
            Arc::new(GitRepositoryReader::new()),
        );
        Self::with_pipeline(pool, settings, create_workspace)
    }

    /// State around a caller-built pipeline.
    pub fn with_pipeline(
        pool: SqlitePool,
        settings: Settings,
        create_workspace: CreateWorkspace,
    ) -> Self {
        Self {
            inventory: Inventory::new(pool.clone()),
            workspaces: WorkspaceStore::new(pool.clone()),
            create_workspace: Arc::new(create_workspace),
            settings,
            pool,
        }
    }
}
