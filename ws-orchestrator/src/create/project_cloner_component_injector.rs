use super::context::Context;
use tracing::warn;
use ws_core::InfallibleStep;
use ws_devfile::model::{Command, Component, Container, VolumeMount};

pub const PROJECT_CLONER_COMPONENT_NAME: &str = "ws-project-cloner";
pub const PROJECT_CLONER_COMMAND_ID: &str = "ws-project-cloner-command";
pub const CLONING_SUCCESSFUL_MARKER: &str = ".ws_project_cloning_successful";

/// Quote a value for a POSIX shell.
pub(crate) fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Adds a component that clones the project into the data volume before
/// the workspace starts.
pub struct ProjectClonerComponentInjector;

impl ProjectClonerComponentInjector {
    /// Clone once; the marker file keeps restarts from cloning again.
    fn clone_script(repo_url: &str, git_ref: &str, clone_dir: &str, marker: &str) -> String {
        format!(
            r#"if [ ! -f {marker} ];
then
  git clone --branch {git_ref} {repo_url} {clone_dir};
  clone_exit_code=$?
  if [ "${{clone_exit_code}}" -eq 0 ];
  then
    touch {marker};
  fi
fi"#,
            marker = shell_quote(marker),
            git_ref = shell_quote(git_ref),
            repo_url = shell_quote(repo_url),
            clone_dir = shell_quote(clone_dir),
        )
    }
}

impl InfallibleStep<Context> for ProjectClonerComponentInjector {
    fn name(&self) -> &'static str {
        "project_cloner_component_injector"
    }

    fn apply(&self, mut context: Context) -> Context {
        let (Some(devfile), Some(volume_mounts)) =
            (context.processed_devfile.as_mut(), context.volume_mounts.as_ref())
        else {
            warn!("Skipping project cloner injection, devfile or volume not defined yet");
            return context;
        };

        let volume_path = &volume_mounts.data_volume.path;
        let project = &context.params.project;
        let script = Self::clone_script(
            &project.http_url_to_repo,
            &context.params.devfile_ref,
            &format!("{}/{}", volume_path, project.path),
            &format!("{}/{}", volume_path, CLONING_SUCCESSFUL_MARKER),
        );

        devfile.components.push(Component {
            name: PROJECT_CLONER_COMPONENT_NAME.to_string(),
            container: Some(Container {
                image: context.settings.project_cloner_image.clone(),
                command: Some(vec!["/bin/sh".to_string(), "-c".to_string()]),
                args: Some(vec![script]),
                volume_mounts: Some(vec![VolumeMount {
                    name: volume_mounts.data_volume.name.clone(),
                    path: Some(volume_path.clone()),
                }]),
                memory_limit: Some("256Mi".to_string()),
                memory_request: Some("128Mi".to_string()),
                cpu_limit: Some("500m".to_string()),
                cpu_request: Some("100m".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        devfile.commands_mut().push(Command::apply(
            PROJECT_CLONER_COMMAND_ID,
            PROJECT_CLONER_COMPONENT_NAME,
        ));
        devfile
            .pre_start_events_mut()
            .push(PROJECT_CLONER_COMMAND_ID.to_string());

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create::test_support::processed_context;
    use crate::create::volume_definer::VolumeDefiner;

    const DEVFILE: &str = r#"
schemaVersion: 2.2.0
components:
  - name: tooling
    container:
      image: udi:1
events:
  preStart:
    - warmup
commands:
  - id: warmup
    exec:
      commandLine: make warm
      component: tooling
"#;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("main"), "'main'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("$(rm -rf /)"), "'$(rm -rf /)'");
    }

    #[test]
    fn test_injects_cloner_after_existing_entries() {
        let mut context = VolumeDefiner.apply(processed_context(DEVFILE));
        context.params.devfile_ref = "feature/x'y".to_string();

        let devfile = ProjectClonerComponentInjector
            .apply(context)
            .processed_devfile
            .unwrap();

        let cloner = devfile.components.last().unwrap();
        assert_eq!(cloner.name, PROJECT_CLONER_COMPONENT_NAME);
        let container = cloner.container.as_ref().unwrap();
        assert_eq!(container.image, "alpine/git:2.45.2");

        let script = &container.args.as_ref().unwrap()[0];
        assert!(script.contains(
            r"git clone --branch 'feature/x'\''y' 'https://git.example.com/acme/shop/storefront.git' '/projects/storefront';"
        ));
        assert!(script.contains("touch '/projects/.ws_project_cloning_successful';"));

        assert_eq!(
            devfile.events.unwrap().pre_start,
            Some(vec!["warmup".to_string(), PROJECT_CLONER_COMMAND_ID.to_string()])
        );
        let ids: Vec<&str> = devfile.commands.as_ref().unwrap().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["warmup", PROJECT_CLONER_COMMAND_ID]);
    }
}
