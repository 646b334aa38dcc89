use crate::error::{DevfileError, Result};
use crate::model::{Devfile, INJECT_EDITOR_ATTRIBUTE};
use regex::Regex;
use serde_json::Value;

/// The only devfile schema version workspaces are created from.
pub const REQUIRED_DEVFILE_SCHEMA_VERSION: &str = "2.2.0";

/// Prefix reserved for names injected by workspace creation.
pub const RESTRICTED_PREFIX: &str = "ws-";

const UNSUPPORTED_EVENT_TYPES: [&str; 3] = ["postStart", "preStop", "postStop"];

fn invalid(message: impl Into<String>) -> DevfileError {
    DevfileError::Validation(message.into())
}

fn is_restricted(name: &str, prefix: &str) -> bool {
    name.to_lowercase().starts_with(prefix)
}

/// Structural checks on a parsed document before imports are resolved.
pub struct PreFlattenValidator<'a> {
    document: &'a Value,
}

impl<'a> PreFlattenValidator<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self { document }
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_mapping()?;
        self.validate_schema_version()?;
        self.validate_parent()?;
        Ok(())
    }

    fn validate_mapping(&self) -> Result<()> {
        if !self.document.is_object() {
            return Err(invalid("Devfile must be a YAML mapping"));
        }
        Ok(())
    }

    fn validate_schema_version(&self) -> Result<()> {
        let version = match self.document.get("schemaVersion") {
            None | Some(Value::Null) => {
                return Err(invalid("Invalid devfile schema. Missing 'schemaVersion'"))
            }
            Some(Value::String(version)) => version.clone(),
            Some(other) => other.to_string(),
        };

        let version_regex = Regex::new(r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)$")
            .map_err(|e| invalid(format!("Invalid regex pattern: {}", e)))?;
        if !version_regex.is_match(&version) {
            return Err(invalid(format!(
                "Invalid 'schemaVersion' '{}'",
                version
            )));
        }

        if version != REQUIRED_DEVFILE_SCHEMA_VERSION {
            return Err(invalid(format!(
                "'schemaVersion' '{}' is not supported, it must be '{}'",
                version, REQUIRED_DEVFILE_SCHEMA_VERSION
            )));
        }

        Ok(())
    }

    fn validate_parent(&self) -> Result<()> {
        let Some(parent) = self.document.get("parent") else {
            return Ok(());
        };

        let parent = parent
            .as_object()
            .ok_or_else(|| invalid("'parent' must be a mapping"))?;

        match (parent.contains_key("uri"), parent.contains_key("id")) {
            (true, false) | (false, true) => Ok(()),
            _ => Err(invalid("'parent' must declare exactly one of 'uri' or 'id'")),
        }
    }
}

/// Workspace-specific rules for a flattened devfile.
///
/// Rules are checked in a fixed order and the first violation is returned.
pub struct PostFlattenValidator<'a> {
    devfile: &'a Devfile,
}

impl<'a> PostFlattenValidator<'a> {
    pub fn new(devfile: &'a Devfile) -> Self {
        Self { devfile }
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_projects()?;
        self.validate_components()?;
        self.validate_containers()?;
        self.validate_endpoints()?;
        self.validate_commands()?;
        self.validate_events()?;
        self.validate_variables()?;
        Ok(())
    }

    fn validate_projects(&self) -> Result<()> {
        if self.devfile.starter_projects.is_some() {
            return Err(invalid("'starterProjects' is not yet supported"));
        }
        if self.devfile.projects.is_some() {
            return Err(invalid("'projects' is not yet supported"));
        }
        Ok(())
    }

    fn validate_components(&self) -> Result<()> {
        let components = &self.devfile.components;

        if components.is_empty() {
            return Err(invalid("No components present in devfile"));
        }

        let injected: Vec<&str> = components
            .iter()
            .filter(|component| component.has_attribute(INJECT_EDITOR_ATTRIBUTE))
            .map(|component| component.name.as_str())
            .collect();
        if injected.len() > 1 {
            return Err(invalid(format!(
                "Multiple components '{:?}' have '{}' attribute",
                injected, INJECT_EDITOR_ATTRIBUTE
            )));
        }
        if let Some(component) = components.iter().find(|component| {
            component.has_attribute(INJECT_EDITOR_ATTRIBUTE) && component.container.is_none()
        }) {
            return Err(invalid(format!(
                "Component '{}' with '{}' attribute must be a container",
                component.name, INJECT_EDITOR_ATTRIBUTE
            )));
        }

        if components.iter().any(|component| component.name.is_empty()) {
            return Err(invalid("Components must have a 'name'"));
        }

        for component in components {
            if is_restricted(&component.name, RESTRICTED_PREFIX) {
                return Err(invalid(format!(
                    "Component name '{}' must not start with '{}'",
                    component.name, RESTRICTED_PREFIX
                )));
            }

            let unsupported = [
                ("kubernetes", component.kubernetes.is_some()),
                ("openshift", component.openshift.is_some()),
                ("image", component.image.is_some()),
            ];
            if let Some((kind, _)) = unsupported.iter().find(|(_, present)| *present) {
                return Err(invalid(format!(
                    "Component type '{}' is not yet supported",
                    kind
                )));
            }
        }

        if self.devfile.main_component_index().is_none() {
            return Err(invalid("No container component present in devfile"));
        }

        Ok(())
    }

    fn validate_containers(&self) -> Result<()> {
        for component in &self.devfile.components {
            let Some(container) = &component.container else {
                continue;
            };
            if container.dedicated_pod == Some(true) {
                return Err(invalid(format!(
                    "Property 'dedicatedPod' of component '{}' is not yet supported",
                    component.name
                )));
            }
        }
        Ok(())
    }

    fn validate_endpoints(&self) -> Result<()> {
        for component in &self.devfile.components {
            let endpoints = component
                .container
                .as_ref()
                .and_then(|container| container.endpoints.as_deref())
                .unwrap_or_default();

            if let Some(endpoint) = endpoints
                .iter()
                .find(|endpoint| is_restricted(&endpoint.name, RESTRICTED_PREFIX))
            {
                return Err(invalid(format!(
                    "Endpoint name '{}' of component '{}' must not start with '{}'",
                    endpoint.name, component.name, RESTRICTED_PREFIX
                )));
            }
        }
        Ok(())
    }

    fn validate_commands(&self) -> Result<()> {
        let Some(commands) = &self.devfile.commands else {
            return Ok(());
        };

        for command in commands {
            if is_restricted(&command.id, RESTRICTED_PREFIX) {
                return Err(invalid(format!(
                    "Command id '{}' must not start with '{}'",
                    command.id, RESTRICTED_PREFIX
                )));
            }

            if let Some(component) = command.component() {
                if is_restricted(component, RESTRICTED_PREFIX) {
                    return Err(invalid(format!(
                        "Component name '{}' for command id '{}' must not start with '{}'",
                        component, command.id, RESTRICTED_PREFIX
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_events(&self) -> Result<()> {
        let Some(events) = &self.devfile.events else {
            return Ok(());
        };

        for (event_type, names) in events.declared() {
            if UNSUPPORTED_EVENT_TYPES.contains(&event_type) {
                return Err(invalid(format!(
                    "Event type '{}' is not yet supported",
                    event_type
                )));
            }

            if let Some(name) = names
                .iter()
                .find(|name| is_restricted(name, RESTRICTED_PREFIX))
            {
                return Err(invalid(format!(
                    "Event '{}' of type '{}' must not start with '{}'",
                    name, event_type, RESTRICTED_PREFIX
                )));
            }
        }
        Ok(())
    }

    fn validate_variables(&self) -> Result<()> {
        let Some(variables) = &self.devfile.variables else {
            return Ok(());
        };

        let underscore_prefix = RESTRICTED_PREFIX.replace('-', "_");
        for name in variables.keys() {
            for prefix in [RESTRICTED_PREFIX, underscore_prefix.as_str()] {
                if is_restricted(name, prefix) {
                    return Err(invalid(format!(
                        "Variable name '{}' must not start with '{}'",
                        name, prefix
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::import::StaticImportResolver;
    use crate::parse::parse_devfile_yaml;

    fn pre(yaml: &str) -> Result<()> {
        PreFlattenValidator::new(&parse_devfile_yaml(yaml).unwrap()).validate()
    }

    fn post(yaml: &str) -> Result<()> {
        let devfile = flatten(
            &parse_devfile_yaml(yaml).unwrap(),
            &StaticImportResolver::new(),
        )
        .unwrap();
        PostFlattenValidator::new(&devfile).validate()
    }

    fn message(result: Result<()>) -> String {
        match result.unwrap_err() {
            DevfileError::Validation(msg) => msg,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    const VALID: &str = r#"
schemaVersion: 2.2.0
components:
  - name: tooling
    attributes:
      ws/inject-editor: true
    container:
      image: quay.io/devfile/universal-developer-image:latest
"#;

    #[test]
    fn test_pre_flatten_accepts_valid_document() {
        assert!(pre(VALID).is_ok());
    }

    #[test]
    fn test_pre_flatten_requires_mapping() {
        assert_eq!(message(pre("- a\n- b\n")), "Devfile must be a YAML mapping");
    }

    #[test]
    fn test_pre_flatten_schema_version_checks() {
        assert_eq!(
            message(pre("components: []\n")),
            "Invalid devfile schema. Missing 'schemaVersion'"
        );
        assert_eq!(
            message(pre("schemaVersion: two\n")),
            "Invalid 'schemaVersion' 'two'"
        );
        assert_eq!(
            message(pre("schemaVersion: 2.1.0\n")),
            "'schemaVersion' '2.1.0' is not supported, it must be '2.2.0'"
        );
    }

    #[test]
    fn test_pre_flatten_parent_needs_one_source() {
        assert!(pre("schemaVersion: 2.2.0\nparent:\n  uri: base.yaml\n").is_ok());
        assert_eq!(
            message(pre("schemaVersion: 2.2.0\nparent:\n  uri: a\n  id: b\n")),
            "'parent' must declare exactly one of 'uri' or 'id'"
        );
    }

    #[test]
    fn test_post_flatten_accepts_valid_devfile() {
        assert!(post(VALID).is_ok());
    }

    #[test]
    fn test_post_flatten_rejects_empty_components() {
        assert_eq!(
            message(post("schemaVersion: 2.2.0\n")),
            "No components present in devfile"
        );
    }

    #[test]
    fn test_post_flatten_rejects_projects() {
        let yaml = format!("{}projects:\n  - name: app\n", VALID);
        assert_eq!(message(post(&yaml)), "'projects' is not yet supported");
    }

    #[test]
    fn test_post_flatten_requires_container_component() {
        let yaml = "schemaVersion: 2.2.0\ncomponents:\n  - name: data\n    volume:\n      size: 1Gi\n";
        assert_eq!(
            message(post(yaml)),
            "No container component present in devfile"
        );
    }

    #[test]
    fn test_post_flatten_rejects_restricted_names() {
        let yaml = r#"
schemaVersion: 2.2.0
components:
  - name: ws-tooling
    container:
      image: udi:1
"#;
        assert_eq!(
            message(post(yaml)),
            "Component name 'ws-tooling' must not start with 'ws-'"
        );

        let yaml = r#"
schemaVersion: 2.2.0
components:
  - name: tooling
    container:
      image: udi:1
      endpoints:
        - name: WS-http
          targetPort: 8080
"#;
        assert_eq!(
            message(post(yaml)),
            "Endpoint name 'WS-http' of component 'tooling' must not start with 'ws-'"
        );
    }

    #[test]
    fn test_post_flatten_rejects_unsupported_component_type() {
        let yaml = r#"
schemaVersion: 2.2.0
components:
  - name: tooling
    container:
      image: udi:1
  - name: manifests
    kubernetes:
      uri: deploy.yaml
"#;
        assert_eq!(
            message(post(yaml)),
            "Component type 'kubernetes' is not yet supported"
        );
    }

    #[test]
    fn test_post_flatten_rejects_dedicated_pod() {
        let yaml = r#"
schemaVersion: 2.2.0
components:
  - name: tooling
    container:
      image: udi:1
      dedicatedPod: true
"#;
        assert_eq!(
            message(post(yaml)),
            "Property 'dedicatedPod' of component 'tooling' is not yet supported"
        );
    }

    #[test]
    fn test_post_flatten_command_and_event_rules() {
        let yaml = format!(
            "{}commands:\n  - id: build\n    exec:\n      commandLine: make\n      component: ws-tools\n",
            VALID
        );
        assert_eq!(
            message(post(&yaml)),
            "Component name 'ws-tools' for command id 'build' must not start with 'ws-'"
        );

        let yaml = format!("{}events:\n  postStart:\n    - build\n", VALID);
        assert_eq!(
            message(post(&yaml)),
            "Event type 'postStart' is not yet supported"
        );

        let yaml = format!("{}events:\n  preStart:\n    - ws-init\n", VALID);
        assert_eq!(
            message(post(&yaml)),
            "Event 'ws-init' of type 'preStart' must not start with 'ws-'"
        );
    }

    #[test]
    fn test_post_flatten_rejects_restricted_variables() {
        let yaml = format!("{}variables:\n  ws_token: x\n", VALID);
        assert_eq!(
            message(post(&yaml)),
            "Variable name 'ws_token' must not start with 'ws_'"
        );
    }

    #[test]
    fn test_post_flatten_rejects_multiple_inject_attributes() {
        let yaml = r#"
schemaVersion: 2.2.0
components:
  - name: one
    attributes:
      ws/inject-editor: true
    container:
      image: udi:1
  - name: two
    attributes:
      ws/inject-editor: true
    container:
      image: udi:1
"#;
        assert!(message(post(yaml)).starts_with("Multiple components"));
    }

    #[test]
    fn test_post_flatten_rejects_inject_attribute_on_non_container() {
        let yaml = r#"
schemaVersion: 2.2.0
components:
  - name: data
    attributes:
      ws/inject-editor: true
    volume:
      size: 1Gi
  - name: tooling
    container:
      image: udi:1
"#;
        assert_eq!(
            message(post(yaml)),
            "Component 'data' with 'ws/inject-editor' attribute must be a container"
        );
    }
}
