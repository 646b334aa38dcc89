//! Typed devfile model.
//!
//! Every struct denies unknown fields, so deserializing a merged document into
//! [`Devfile`] doubles as the schema-compliance check after flattening.
//! Field names follow the devfile 2.2 schema (camelCase on the wire).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute marking the component the editor is injected into.
pub const INJECT_EDITOR_ATTRIBUTE: &str = "ws/inject-editor";

/// A flattened devfile.
///
/// `components` is always serialized, even when empty, so consumers never
/// have to tell a missing list from an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Devfile {
    pub schema_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<IndexMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<IndexMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_projects: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_projects: Option<Vec<Value>>,

    #[serde(default)]
    pub components: Vec<Component>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<Command>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Events>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Component {
    /// Empty when the document omitted it; rejected by post-flatten validation.
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<IndexMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Volume>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
}

impl Component {
    /// True when the attribute is present and neither `null` nor `false`.
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes
            .as_ref()
            .and_then(|attributes| attributes.get(key))
            .is_some_and(|value| !matches!(value, Value::Null | Value::Bool(false)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Container {
    pub image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<Endpoint>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<Vec<VolumeMount>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_request: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_request: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_sources: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_mapping: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedicated_pod: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Endpoint {
    pub name: String,

    pub target_port: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<IndexMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeMount {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Volume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Command {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<IndexMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecCommand>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply: Option<ApplyCommand>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<Value>,
}

impl Command {
    /// An `apply` command bound to a component.
    pub fn apply(id: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            apply: Some(ApplyCommand {
                component: component.into(),
                label: None,
                group: None,
            }),
            ..Default::default()
        }
    }

    /// Component referenced by an `exec` or `apply` command.
    pub fn component(&self) -> Option<&str> {
        self.exec
            .as_ref()
            .map(|exec| exec.component.as_str())
            .or_else(|| self.apply.as_ref().map(|apply| apply.component.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecCommand {
    pub command_line: String,

    pub component: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_reload_capable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApplyCommand {
    pub component: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Events {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_start: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_start: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_stop: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_stop: Option<Vec<String>>,
}

impl Events {
    /// Declared event lists keyed by their wire name.
    pub fn declared(&self) -> Vec<(&'static str, &[String])> {
        [
            ("preStart", &self.pre_start),
            ("postStart", &self.post_start),
            ("preStop", &self.pre_stop),
            ("postStop", &self.post_stop),
        ]
        .into_iter()
        .filter_map(|(name, events)| events.as_deref().map(|events| (name, events)))
        .collect()
    }
}

impl Devfile {
    /// Index of the component the editor runs in.
    ///
    /// The component carrying [`INJECT_EDITOR_ATTRIBUTE`] wins; otherwise the
    /// first container component is used.
    pub fn main_component_index(&self) -> Option<usize> {
        self.components
            .iter()
            .position(|component| component.has_attribute(INJECT_EDITOR_ATTRIBUTE))
            .or_else(|| {
                self.components
                    .iter()
                    .position(|component| component.container.is_some())
            })
    }

    pub fn commands_mut(&mut self) -> &mut Vec<Command> {
        self.commands.get_or_insert_with(Vec::new)
    }

    pub fn pre_start_events_mut(&mut self) -> &mut Vec<String> {
        self.events
            .get_or_insert_with(Events::default)
            .pre_start
            .get_or_insert_with(Vec::new)
    }
}
