use super::context::Context;
use tracing::warn;
use ws_core::InfallibleStep;
use ws_devfile::model::{Component, Volume, VolumeMount};

pub const WORKSPACE_DATA_VOLUME_SIZE: &str = "50Gi";

/// Declares the data volume and mounts it in every container.
pub struct VolumeComponentInjector;

impl InfallibleStep<Context> for VolumeComponentInjector {
    fn name(&self) -> &'static str {
        "volume_component_injector"
    }

    fn apply(&self, mut context: Context) -> Context {
        let (Some(devfile), Some(volume_mounts)) =
            (context.processed_devfile.as_mut(), context.volume_mounts.as_ref())
        else {
            warn!("Skipping volume injection, devfile or volume not defined yet");
            return context;
        };

        let data_volume = &volume_mounts.data_volume;

        for container in devfile
            .components
            .iter_mut()
            .filter_map(|component| component.container.as_mut())
        {
            let mounts = container.volume_mounts.get_or_insert_with(Vec::new);
            if !mounts.iter().any(|mount| mount.name == data_volume.name) {
                mounts.push(VolumeMount {
                    name: data_volume.name.clone(),
                    path: Some(data_volume.path.clone()),
                });
            }
        }

        devfile.components.push(Component {
            name: data_volume.name.clone(),
            volume: Some(Volume {
                size: Some(WORKSPACE_DATA_VOLUME_SIZE.to_string()),
                ephemeral: None,
            }),
            ..Default::default()
        });

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create::test_support::processed_context;
    use crate::create::tools_component_injector::ToolsComponentInjector;
    use crate::create::volume_definer::{VolumeDefiner, WORKSPACE_DATA_VOLUME_NAME};

    #[test]
    fn test_mounts_volume_once_in_every_container() {
        let devfile = r#"
schemaVersion: 2.2.0
components:
  - name: tooling
    container:
      image: udi:1
      volumeMounts:
        - name: cache
          path: /cache
  - name: cache
    volume:
      size: 1Gi
"#;
        let context = VolumeDefiner.apply(processed_context(devfile));
        let context = ToolsComponentInjector.apply(context);
        let devfile = VolumeComponentInjector.apply(context).processed_devfile.unwrap();

        for component in devfile.components.iter().filter(|c| c.container.is_some()) {
            let mounts = component.container.as_ref().unwrap().volume_mounts.as_ref().unwrap();
            let data_mounts = mounts
                .iter()
                .filter(|mount| mount.name == WORKSPACE_DATA_VOLUME_NAME)
                .count();
            assert_eq!(data_mounts, 1, "component {}", component.name);
        }

        let tooling_mounts = devfile.components[0].container.as_ref().unwrap().volume_mounts.as_ref().unwrap();
        assert_eq!(tooling_mounts[0].name, "cache");

        let volume = devfile.components.last().unwrap();
        assert_eq!(volume.name, WORKSPACE_DATA_VOLUME_NAME);
        assert_eq!(volume.volume.as_ref().unwrap().size.as_deref(), Some("50Gi"));
    }
}
