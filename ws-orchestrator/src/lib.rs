//! Workspace creation business logic
//!
//! This crate holds the creation pipeline and the records it reads and
//! writes. It is consumed by the ws-api HTTP service but has no HTTP
//! knowledge of its own.

pub mod create;
pub mod db;
pub mod error;
pub mod inventory;
pub mod policy;
pub mod repository;
pub mod settings;
pub mod workspace;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use create::{Context, CreateParams, CreateWorkspace, Message, Response};
pub use error::{OrchestratorError, Result};
pub use inventory::{Agent, AgentConfig, Inventory, Project, User};
pub use policy::{AccessPolicy, MembershipPolicy};
pub use repository::{GitRepositoryReader, RepositoryReader};
pub use settings::Settings;
pub use workspace::{Workspace, WorkspaceState, WorkspaceStore};
