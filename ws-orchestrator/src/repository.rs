use crate::inventory::Project;
use git2::{ErrorCode, ObjectType, Repository};
use std::path::Path;
use tracing::debug;
use ws_core::{Result, WsError};

/// Reads files from a project's source repository.
pub trait RepositoryReader: Send + Sync {
    /// Contents of `path` at `git_ref`, or `None` when the ref or path does not exist.
    fn blob_at(&self, project: &Project, git_ref: &str, path: &str) -> Result<Option<Vec<u8>>>;
}

/// Reader over the on-disk git repository at `project.repository_path`.
#[derive(Debug, Clone, Default)]
pub struct GitRepositoryReader;

impl GitRepositoryReader {
    pub fn new() -> Self {
        Self
    }
}

fn repository_error(e: git2::Error) -> WsError {
    WsError::Repository(e.message().to_string())
}

impl RepositoryReader for GitRepositoryReader {
    fn blob_at(&self, project: &Project, git_ref: &str, path: &str) -> Result<Option<Vec<u8>>> {
        debug!(
            repository = %project.repository_path,
            git_ref,
            path,
            "Reading blob from repository"
        );

        let repo = Repository::open(&project.repository_path).map_err(repository_error)?;

        let commit = match repo.revparse_single(git_ref) {
            Ok(object) => object.peel_to_commit().map_err(repository_error)?,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(repository_error(e)),
        };

        let tree = commit.tree().map_err(repository_error)?;
        let entry = match tree.get_path(Path::new(path.trim_start_matches('/'))) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(repository_error(e)),
        };

        if entry.kind() != Some(ObjectType::Blob) {
            return Ok(None);
        }

        let blob = repo.find_blob(entry.id()).map_err(repository_error)?;
        Ok(Some(blob.content().to_vec()))
    }
}
