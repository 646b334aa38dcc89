use super::context::Context;
use ws_core::InfallibleStep;
use ws_devfile::model::{Command, Component, Container, Endpoint, EnvVar, VolumeMount};
use tracing::warn;

pub const TOOLS_INJECTOR_COMPONENT_NAME: &str = "ws-tools-injector";
pub const TOOLS_INJECTOR_COMMAND_ID: &str = "ws-tools-injector-command";
pub const WORKSPACE_EDITOR_PORT: u32 = 60001;
pub const WORKSPACE_SSH_PORT: u32 = 60022;

const MAIN_CONTAINER_ARGS: &str = r#"sshd_path=$(which sshd)
if [ -x "$sshd_path" ]; then
  echo "Starting sshd on port ${WS_SSH_PORT}"
  $sshd_path -D -p $WS_SSH_PORT &
else
  echo "'sshd' not found in path. Not starting SSH server."
fi
"${WS_TOOLS_DIR}/init_tools.sh""#;

/// Adds the editor tools component and turns the main container into the
/// editor host.
pub struct ToolsComponentInjector;

impl ToolsComponentInjector {
    fn tools_component(image: &str, volume: &VolumeMount, tools_dir: &str) -> Component {
        Component {
            name: TOOLS_INJECTOR_COMPONENT_NAME.to_string(),
            container: Some(Container {
                image: image.to_string(),
                volume_mounts: Some(vec![volume.clone()]),
                env: Some(vec![EnvVar::new("WS_TOOLS_DIR", tools_dir)]),
                memory_limit: Some("256Mi".to_string()),
                memory_request: Some("128Mi".to_string()),
                cpu_limit: Some("500m".to_string()),
                cpu_request: Some("100m".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn override_main_container(container: &mut Container, tools_dir: &str, enable_marketplace: bool) {
        container.command = Some(vec!["/bin/sh".to_string(), "-c".to_string()]);
        container.args = Some(vec![MAIN_CONTAINER_ARGS.to_string()]);

        container.env.get_or_insert_with(Vec::new).extend([
            EnvVar::new("WS_TOOLS_DIR", tools_dir),
            EnvVar::new("WS_EDITOR_LOG_LEVEL", "info"),
            EnvVar::new("WS_EDITOR_PORT", WORKSPACE_EDITOR_PORT.to_string()),
            EnvVar::new("WS_SSH_PORT", WORKSPACE_SSH_PORT.to_string()),
            EnvVar::new("WS_EDITOR_ENABLE_MARKETPLACE", enable_marketplace.to_string()),
        ]);

        container.endpoints.get_or_insert_with(Vec::new).extend([
            Endpoint {
                name: "editor-server".to_string(),
                target_port: WORKSPACE_EDITOR_PORT,
                exposure: Some("public".to_string()),
                protocol: Some("https".to_string()),
                secure: Some(true),
                ..Default::default()
            },
            Endpoint {
                name: "ssh-server".to_string(),
                target_port: WORKSPACE_SSH_PORT,
                exposure: Some("internal".to_string()),
                secure: Some(true),
                ..Default::default()
            },
        ]);
    }
}

impl InfallibleStep<Context> for ToolsComponentInjector {
    fn name(&self) -> &'static str {
        "tools_component_injector"
    }

    fn apply(&self, mut context: Context) -> Context {
        let (Some(devfile), Some(volume_mounts)) =
            (context.processed_devfile.as_mut(), context.volume_mounts.as_ref())
        else {
            warn!("Skipping tools injection, devfile or volume not defined yet");
            return context;
        };

        let volume = VolumeMount {
            name: volume_mounts.data_volume.name.clone(),
            path: Some(volume_mounts.data_volume.path.clone()),
        };
        let tools_dir = format!("{}/.ws-tools", volume_mounts.data_volume.path);
        let enable_marketplace = context.settings.allow_extensions_marketplace;

        if let Some(container) = devfile
            .main_component_index()
            .and_then(|index| devfile.components[index].container.as_mut())
        {
            Self::override_main_container(container, &tools_dir, enable_marketplace);
        }

        devfile.components.push(Self::tools_component(
            context.settings.tools_injector_image(),
            &volume,
            &tools_dir,
        ));
        devfile.commands_mut().push(Command::apply(
            TOOLS_INJECTOR_COMMAND_ID,
            TOOLS_INJECTOR_COMPONENT_NAME,
        ));
        devfile
            .pre_start_events_mut()
            .push(TOOLS_INJECTOR_COMMAND_ID.to_string());

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
  - name: database
    container:
      image: postgres:16
  - name: tooling
    attributes:
      ws/inject-editor: true
    container:
      image: quay.io/devfile/universal-developer-image:latest
      env:
        - name: LANG
          value: C.UTF-8
"#;

    #[test]
    fn test_injects_tools_component_command_and_event() {
        let context = ToolsComponentInjector.apply(VolumeDefiner.apply(processed_context(DEVFILE)));
        let devfile = context.processed_devfile.unwrap();

        let tools = devfile.components.last().unwrap();
        assert_eq!(tools.name, TOOLS_INJECTOR_COMPONENT_NAME);
        let container = tools.container.as_ref().unwrap();
        assert_eq!(container.image, context.settings.tools_injector_image);
        assert_eq!(container.memory_limit.as_deref(), Some("256Mi"));
        assert_eq!(
            container.env.as_ref().unwrap()[0],
            EnvVar::new("WS_TOOLS_DIR", "/projects/.ws-tools")
        );

        let commands = devfile.commands.as_ref().unwrap();
        assert_eq!(commands[0].component(), Some(TOOLS_INJECTOR_COMPONENT_NAME));
        assert_eq!(
            devfile.events.unwrap().pre_start,
            Some(vec![TOOLS_INJECTOR_COMMAND_ID.to_string()])
        );
    }

    #[test]
    fn test_overrides_main_container_only() {
        let context = ToolsComponentInjector.apply(VolumeDefiner.apply(processed_context(DEVFILE)));
        let devfile = context.processed_devfile.unwrap();

        assert!(devfile.components[0].container.as_ref().unwrap().command.is_none());

        let main = devfile.components[1].container.as_ref().unwrap();
        assert_eq!(
            main.command,
            Some(vec!["/bin/sh".to_string(), "-c".to_string()])
        );
        let env = main.env.as_ref().unwrap();
        assert_eq!(env[0].name, "LANG");
        assert!(env.contains(&EnvVar::new("WS_EDITOR_PORT", "60001")));
        assert!(env.contains(&EnvVar::new("WS_EDITOR_ENABLE_MARKETPLACE", "true")));

        let endpoints = main.endpoints.as_ref().unwrap();
        assert_eq!(endpoints[0].name, "editor-server");
        assert_eq!(endpoints[0].target_port, 60001);
        assert_eq!(endpoints[1].name, "ssh-server");
        assert_eq!(endpoints[1].exposure.as_deref(), Some("internal"));
    }

    #[test]
    fn test_override_image_when_marketplace_disabled() {
        let mut context = VolumeDefiner.apply(processed_context(DEVFILE));
        context.settings.allow_extensions_marketplace = false;
        context.settings.tools_injector_image_override =
            Some("registry.example.com/injector:patched".to_string());

        let devfile = ToolsComponentInjector.apply(context).processed_devfile.unwrap();
        let tools = devfile.components.last().unwrap().container.as_ref().unwrap();
        assert_eq!(tools.image, "registry.example.com/injector:patched");
    }

    #[test]
    fn test_missing_volume_leaves_context_unchanged() {
        let context = processed_context(DEVFILE);
        let before = context.processed_devfile.clone();
        let after = ToolsComponentInjector.apply(context);
        assert_eq!(after.processed_devfile, before);
    }
}
