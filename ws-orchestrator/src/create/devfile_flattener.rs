use super::context::Context;
use super::messages::Message;
use crate::inventory::Project;
use crate::repository::RepositoryReader;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use ws_core::FallibleStep;
use ws_devfile::{flatten, parse_devfile_yaml, ImportReference, ImportResolver, ResolvedImport};

/// Resolves imports against the project repository at the devfile's ref.
///
/// Relative URIs are taken relative to the directory of the importing
/// devfile; remote URIs and registry ids are not supported. Locations are
/// normalized repository paths.
pub struct RepositoryImportResolver {
    reader: Arc<dyn RepositoryReader>,
    project: Project,
    git_ref: String,
    devfile_path: String,
}

fn normalize(path: &Path, uri: &str) -> Result<String, String> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(format!("'{}' points outside the repository", uri));
                }
            }
            Component::RootDir | Component::Prefix(_) => {}
        }
    }

    Ok(normalized.to_string_lossy().into_owned())
}

impl RepositoryImportResolver {
    pub fn new(
        reader: Arc<dyn RepositoryReader>,
        project: Project,
        git_ref: String,
        devfile_path: &str,
    ) -> Self {
        let devfile_path =
            normalize(Path::new(devfile_path), devfile_path).unwrap_or_else(|_| devfile_path.to_string());

        Self {
            reader,
            project,
            git_ref,
            devfile_path,
        }
    }

    fn repository_path(&self, importer: Option<&str>, uri: &str) -> Result<String, String> {
        let importer = importer.unwrap_or(&self.devfile_path);
        let joined = match uri.strip_prefix('/') {
            Some(absolute) => PathBuf::from(absolute),
            None => Path::new(importer)
                .parent()
                .map(|dir| dir.join(uri))
                .unwrap_or_else(|| PathBuf::from(uri)),
        };

        normalize(&joined, uri)
    }
}

impl ImportResolver for RepositoryImportResolver {
    fn resolve(
        &self,
        importer: Option<&str>,
        reference: &ImportReference,
    ) -> Result<ResolvedImport, String> {
        if reference.is_remote() {
            return Err("remote devfile imports are not supported".to_string());
        }
        let ImportReference::Uri(uri) = reference else {
            return Err("registry devfile imports are not supported".to_string());
        };

        let path = self.repository_path(importer, uri)?;
        let blob = self
            .reader
            .blob_at(&self.project, &self.git_ref, &path)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| {
                format!(
                    "'{}' does not exist at ref '{}' in project repository",
                    path, self.git_ref
                )
            })?;

        let yaml = String::from_utf8(blob).map_err(|e| e.to_string())?;
        let document = parse_devfile_yaml(&yaml).map_err(|e| e.to_string())?;

        Ok(ResolvedImport {
            location: path,
            document,
        })
    }

    fn root_location(&self) -> Option<String> {
        Some(self.devfile_path.clone())
    }
}

/// Resolves parents and plugins into the processed devfile.
pub struct DevfileFlattener {
    reader: Arc<dyn RepositoryReader>,
}

impl DevfileFlattener {
    pub fn new(reader: Arc<dyn RepositoryReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl FallibleStep<Context, Message> for DevfileFlattener {
    fn name(&self) -> &'static str {
        "devfile_flattener"
    }

    async fn run(&self, mut context: Context) -> Result<Context, Message> {
        let Some(devfile) = context.devfile.clone() else {
            return Err(Message::WorkspaceCreateDevfileFlattenFailed(
                "No devfile loaded".to_string(),
            ));
        };

        let resolver = RepositoryImportResolver::new(
            Arc::clone(&self.reader),
            context.params.project.clone(),
            context.params.devfile_ref.clone(),
            &context.params.devfile_path,
        );

        let processed = tokio::task::spawn_blocking(move || flatten(&devfile, &resolver))
            .await
            .map_err(|e| Message::WorkspaceCreateDevfileFlattenFailed(e.to_string()))?
            .map_err(|e| Message::WorkspaceCreateDevfileFlattenFailed(e.to_string()))?;

        debug!(components = processed.components.len(), "Flattened devfile");
        context.processed_devfile = Some(processed);
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::GitRepositoryReader;
    use crate::test_utils::create_git_repository;

    fn resolver_for(dir: &Path, devfile_path: &str) -> RepositoryImportResolver {
        let project = Project {
            id: 1,
            name: "Storefront".to_string(),
            path: "storefront".to_string(),
            path_with_namespace: "acme/storefront".to_string(),
            root_namespace: "acme".to_string(),
            http_url_to_repo: "https://git.example.com/acme/storefront.git".to_string(),
            repository_path: dir.display().to_string(),
        };
        RepositoryImportResolver::new(
            Arc::new(GitRepositoryReader::new()),
            project,
            "main".to_string(),
            devfile_path,
        )
    }

    #[test]
    fn test_relative_uri_resolves_next_to_devfile() {
        let dir = tempfile::tempdir().unwrap();
        create_git_repository(
            dir.path(),
            &[
                (".devfile/devfile.yaml", "schemaVersion: 2.2.0\n"),
                (".devfile/base.yaml", "schemaVersion: 2.2.0\ncomponents: []\n"),
            ],
        );

        let resolver = resolver_for(dir.path(), ".devfile/devfile.yaml");
        let resolved = resolver
            .resolve(None, &ImportReference::Uri("./base.yaml".to_string()))
            .unwrap();
        assert_eq!(resolved.location, ".devfile/base.yaml");
        assert_eq!(resolved.document["schemaVersion"], "2.2.0");
    }

    #[test]
    fn test_remote_and_escaping_imports_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        create_git_repository(dir.path(), &[(".devfile.yaml", "schemaVersion: 2.2.0\n")]);
        let resolver = resolver_for(dir.path(), ".devfile.yaml");

        assert_eq!(
            resolver
                .resolve(None, &ImportReference::Uri("https://example.com/devfile.yaml".to_string()))
                .unwrap_err(),
            "remote devfile imports are not supported"
        );
        assert_eq!(
            resolver
                .resolve(None, &ImportReference::Uri("../outside.yaml".to_string()))
                .unwrap_err(),
            "'../outside.yaml' points outside the repository"
        );
    }

    #[test]
    fn test_nested_uri_resolves_next_to_importer() {
        let dir = tempfile::tempdir().unwrap();
        create_git_repository(
            dir.path(),
            &[
                (".devfile/devfile.yaml", "schemaVersion: 2.2.0\n"),
                (".devfile/parents/grand.yaml", "schemaVersion: 2.2.0\n"),
            ],
        );

        let resolver = resolver_for(dir.path(), ".devfile/devfile.yaml");
        let resolved = resolver
            .resolve(
                Some(".devfile/parents/base.yaml"),
                &ImportReference::Uri("grand.yaml".to_string()),
            )
            .unwrap();
        assert_eq!(resolved.location, ".devfile/parents/grand.yaml");
        assert_eq!(resolver.root_location().as_deref(), Some(".devfile/devfile.yaml"));
    }
}
