use super::context::{Context, VolumeMount, VolumeMounts};
use ws_core::InfallibleStep;

pub const WORKSPACE_DATA_VOLUME_NAME: &str = "ws-workspace-data";
pub const WORKSPACE_DATA_VOLUME_PATH: &str = "/projects";

/// Names the volume holding the cloned project and editor state.
pub struct VolumeDefiner;

impl InfallibleStep<Context> for VolumeDefiner {
    fn name(&self) -> &'static str {
        "volume_definer"
    }

    fn apply(&self, mut context: Context) -> Context {
        context.volume_mounts = Some(VolumeMounts {
            data_volume: VolumeMount {
                name: WORKSPACE_DATA_VOLUME_NAME.to_string(),
                path: WORKSPACE_DATA_VOLUME_PATH.to_string(),
            },
        });
        context
    }
}
