//! Devfile flattening.
//!
//! Resolves `parent` and `plugin` imports into one self-contained document
//! and checks the result against the typed [`Devfile`] model.
//!
//! Merge rules:
//! - keyed lists (`components`, `projects`, `starterProjects`,
//!   `dependentProjects` by `name`; `commands` by `id`) put the child's
//!   elements first, each deep-merged over its inherited namesake, then append
//!   the inherited elements the child does not mention
//! - `variables` and `attributes` deep-merge with the child winning
//! - `events` are unioned per event type, inherited entries first
//! - any other key is taken from the child when present

use crate::error::{DevfileError, Result};
use crate::import::{ImportReference, ImportResolver};
use crate::merge::{apply_overrides, deep_merge, merge_keyed};
use crate::model::Devfile;
use serde_json::{Map, Value};
use tracing::debug;

/// Maximum number of nested imports followed from the root devfile.
pub const MAX_IMPORT_DEPTH: usize = 10;

const NAME_KEYED_LISTS: [&str; 4] = ["components", "projects", "starterProjects", "dependentProjects"];

/// Flatten a parsed devfile, resolving imports through `resolver`.
///
/// A document without components comes back with an empty `components` list.
pub fn flatten(devfile: &Value, resolver: &dyn ImportResolver) -> Result<Devfile> {
    let mut chain = ImportChain {
        root: resolver.root_location(),
        imports: Vec::new(),
    };
    let flattened = flatten_document(devfile.clone(), resolver, &mut chain)?;

    serde_json::from_value::<Devfile>(Value::Object(flattened)).map_err(|e| {
        DevfileError::Flatten(format!(
            "Flattened devfile is not compliant with the devfile schema: {}",
            e
        ))
    })
}

/// Locations of the documents currently being flattened, outermost first.
struct ImportChain {
    root: Option<String>,
    imports: Vec<String>,
}

impl ImportChain {
    fn importer(&self) -> Option<&str> {
        self.imports.last().or(self.root.as_ref()).map(String::as_str)
    }

    fn contains(&self, location: &str) -> bool {
        self.root.as_deref() == Some(location) || self.imports.iter().any(|l| l == location)
    }
}

fn flatten_document(
    document: Value,
    resolver: &dyn ImportResolver,
    chain: &mut ImportChain,
) -> Result<Map<String, Value>> {
    let Value::Object(mut document) = document else {
        return Err(DevfileError::Flatten(
            "Devfile must be a YAML mapping".to_string(),
        ));
    };

    let components = take_list(&mut document, "components")?;
    let (components, plugin_commands) = inline_plugins(components, resolver, chain)?;
    document.insert("components".to_string(), Value::Array(components));

    if !plugin_commands.is_empty() {
        let commands = take_list(&mut document, "commands")?;
        document.insert(
            "commands".to_string(),
            Value::Array(merge_keyed(plugin_commands, commands, "id")),
        );
    }

    if let Some(parent) = document.remove("parent") {
        let Value::Object(parent) = parent else {
            return Err(DevfileError::Flatten(
                "'parent' must be a mapping".to_string(),
            ));
        };

        let reference = ImportReference::from_block(&parent)?;
        let mut inherited = import(&reference, resolver, chain)?;
        apply_parent_overrides(&mut inherited, parent)?;
        document = merge_documents(inherited, document)?;
    }

    Ok(document)
}

fn import(
    reference: &ImportReference,
    resolver: &dyn ImportResolver,
    chain: &mut ImportChain,
) -> Result<Map<String, Value>> {
    let key = reference.to_string();

    if chain.imports.len() >= MAX_IMPORT_DEPTH {
        return Err(DevfileError::Flatten(format!(
            "Import chain exceeds the maximum depth of {}",
            MAX_IMPORT_DEPTH
        )));
    }

    debug!(reference = %key, importer = ?chain.importer(), "Resolving devfile import");
    let resolved = resolver.resolve(chain.importer(), reference).map_err(|e| {
        DevfileError::Flatten(format!("Failed to resolve import '{}': {}", key, e))
    })?;

    if chain.contains(&resolved.location) {
        return Err(DevfileError::Flatten(format!(
            "Import cycle detected at '{}'",
            resolved.location
        )));
    }

    chain.imports.push(resolved.location);
    let flattened = flatten_document(resolved.document, resolver, chain);
    chain.imports.pop();

    flattened
}

/// Replace plugin components with the components of the devfile they import.
///
/// Returns the expanded components and the commands contributed by plugins.
fn inline_plugins(
    components: Vec<Value>,
    resolver: &dyn ImportResolver,
    chain: &mut ImportChain,
) -> Result<(Vec<Value>, Vec<Value>)> {
    let mut expanded = Vec::with_capacity(components.len());
    let mut commands = Vec::new();

    for component in components {
        let Some(plugin) = component.get("plugin") else {
            expanded.push(component);
            continue;
        };

        let name = component
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let plugin = plugin.as_object().ok_or_else(|| {
            DevfileError::Flatten(format!("Plugin of component '{}' must be a mapping", name))
        })?;

        let reference = ImportReference::from_block(plugin)?;
        let mut imported = import(&reference, resolver, chain)?;

        let mut plugin_components = take_list(&mut imported, "components")?;
        if let Some(overrides) = plugin.get("components") {
            apply_overrides(
                &mut plugin_components,
                into_list(overrides.clone(), "components")?,
                "name",
                "component",
            )?;
        }

        let mut plugin_commands = take_list(&mut imported, "commands")?;
        if let Some(overrides) = plugin.get("commands") {
            apply_overrides(
                &mut plugin_commands,
                into_list(overrides.clone(), "commands")?,
                "id",
                "command",
            )?;
        }

        expanded.extend(plugin_components);
        commands.extend(plugin_commands);
    }

    Ok((expanded, commands))
}

fn apply_parent_overrides(
    inherited: &mut Map<String, Value>,
    parent: Map<String, Value>,
) -> Result<()> {
    for (key, overrides) in parent {
        match key.as_str() {
            "components" | "projects" | "starterProjects" | "dependentProjects" | "commands" => {
                let (element_key, kind) = if key == "commands" {
                    ("id", "command")
                } else {
                    ("name", singular(&key))
                };
                let mut base = take_list(inherited, &key)?;
                apply_overrides(&mut base, into_list(overrides, &key)?, element_key, kind)?;
                inherited.insert(key, Value::Array(base));
            }
            "variables" | "attributes" => {
                deep_merge(
                    inherited
                        .entry(key)
                        .or_insert_with(|| Value::Object(Map::new())),
                    overrides,
                );
            }
            // uri, id, registryUrl, version and friends locate the import
            _ => {}
        }
    }

    Ok(())
}

fn merge_documents(
    parent: Map<String, Value>,
    child: Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut merged = parent;

    for (key, value) in child {
        if NAME_KEYED_LISTS.contains(&key.as_str()) || key == "commands" {
            let element_key = if key == "commands" { "id" } else { "name" };
            let inherited = take_list(&mut merged, &key)?;
            let local = into_list(value, &key)?;
            merged.insert(
                key,
                Value::Array(merge_keyed(inherited, local, element_key)),
            );
        } else if key == "variables" || key == "attributes" {
            match merged.get_mut(&key) {
                Some(base) => deep_merge(base, value),
                None => {
                    merged.insert(key, value);
                }
            }
        } else if key == "events" {
            let inherited = merged.remove(&key).unwrap_or(Value::Null);
            merged.insert(key, merge_events(inherited, value)?);
        } else {
            merged.insert(key, value);
        }
    }

    Ok(merged)
}

fn merge_events(inherited: Value, local: Value) -> Result<Value> {
    let mut merged = match inherited {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => {
            return Err(DevfileError::Flatten(
                "'events' must be a mapping".to_string(),
            ))
        }
    };

    let local = match local {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => {
            return Err(DevfileError::Flatten(
                "'events' must be a mapping".to_string(),
            ))
        }
    };

    for (event_type, names) in local {
        let mut combined = into_list(merged.remove(&event_type).unwrap_or(Value::Null), &event_type)?;
        for name in into_list(names, &event_type)? {
            if !combined.contains(&name) {
                combined.push(name);
            }
        }
        merged.insert(event_type, Value::Array(combined));
    }

    Ok(Value::Object(merged))
}

fn take_list(document: &mut Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    into_list(document.remove(key).unwrap_or(Value::Null), key)
}

fn into_list(value: Value, key: &str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        _ => Err(DevfileError::Flatten(format!("'{}' must be a list", key))),
    }
}

fn singular(key: &str) -> &'static str {
    match key {
        "components" => "component",
        "projects" => "project",
        "starterProjects" => "starter project",
        _ => "dependent project",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::StaticImportResolver;
    use crate::parse::parse_devfile_yaml;

    fn doc(yaml: &str) -> Value {
        parse_devfile_yaml(yaml).unwrap()
    }

    #[test]
    fn test_no_components_normalizes_to_empty_list() {
        let devfile = flatten(&doc("schemaVersion: 2.2.0\n"), &StaticImportResolver::new()).unwrap();
        assert!(devfile.components.is_empty());

        let value = serde_json::to_value(&devfile).unwrap();
        assert_eq!(value["components"], serde_json::json!([]));
    }

    #[test]
    fn test_null_components_normalizes_to_empty_list() {
        let devfile = flatten(
            &doc("schemaVersion: 2.2.0\ncomponents:\n"),
            &StaticImportResolver::new(),
        )
        .unwrap();
        assert!(devfile.components.is_empty());
    }

    #[test]
    fn test_document_without_imports_is_unchanged() {
        let devfile = flatten(
            &doc(
                r#"
schemaVersion: 2.2.0
components:
  - name: tooling
    container:
      image: udi:1
"#,
            ),
            &StaticImportResolver::new(),
        )
        .unwrap();

        assert_eq!(devfile.components.len(), 1);
        assert_eq!(devfile.components[0].name, "tooling");
    }

    #[test]
    fn test_unknown_property_fails_compliance() {
        let err = flatten(
            &doc("schemaVersion: 2.2.0\ncomponents: []\nrandom: 1\n"),
            &StaticImportResolver::new(),
        )
        .unwrap_err();

        match err {
            DevfileError::Flatten(msg) => {
                assert!(msg.starts_with("Flattened devfile is not compliant"));
                assert!(msg.contains("random"));
            }
            other => panic!("Expected flatten error, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolvable_parent_fails() {
        let err = flatten(
            &doc("schemaVersion: 2.2.0\nparent:\n  uri: missing.yaml\n"),
            &StaticImportResolver::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DevfileError::Flatten(
                "Failed to resolve import 'missing.yaml': document not found".to_string()
            )
        );
    }

    #[test]
    fn test_import_cycle_is_detected() {
        let resolver = StaticImportResolver::new()
            .with_yaml("a.yaml", "schemaVersion: 2.2.0\nparent:\n  uri: b.yaml\n")
            .unwrap()
            .with_yaml("b.yaml", "schemaVersion: 2.2.0\nparent:\n  uri: a.yaml\n")
            .unwrap();

        let err = flatten(&doc("schemaVersion: 2.2.0\nparent:\n  uri: a.yaml\n"), &resolver)
            .unwrap_err();
        assert_eq!(
            err,
            DevfileError::Flatten("Import cycle detected at 'a.yaml'".to_string())
        );
    }

    #[test]
    fn test_events_are_unioned() {
        let merged = merge_events(
            serde_json::json!({"preStart": ["init", "seed"]}),
            serde_json::json!({"preStart": ["seed", "warm"], "postStart": ["hello"]}),
        )
        .unwrap();
        assert_eq!(merged["preStart"], serde_json::json!(["init", "seed", "warm"]));
        assert_eq!(merged["postStart"], serde_json::json!(["hello"]));
    }

    /// Resolves `dir/name.yaml` style locations relative to the importer's
    /// directory and records who asked.
    struct DirectoryResolver {
        documents: std::collections::HashMap<&'static str, &'static str>,
        importers: std::sync::Mutex<Vec<Option<String>>>,
    }

    impl ImportResolver for DirectoryResolver {
        fn resolve(
            &self,
            importer: Option<&str>,
            reference: &ImportReference,
        ) -> std::result::Result<crate::import::ResolvedImport, String> {
            self.importers
                .lock()
                .unwrap()
                .push(importer.map(str::to_string));

            let dir = importer
                .and_then(|path| path.rsplit_once('/'))
                .map(|(dir, _)| format!("{}/", dir))
                .unwrap_or_else(|| "root/".to_string());
            let location = format!("{}{}", dir, reference);
            let yaml = self
                .documents
                .get(location.as_str())
                .ok_or_else(|| format!("'{}' not found", location))?;

            Ok(crate::import::ResolvedImport {
                location,
                document: parse_devfile_yaml(yaml).map_err(|e| e.to_string())?,
            })
        }

        fn root_location(&self) -> Option<String> {
            Some("root/devfile.yaml".to_string())
        }
    }

    #[test]
    fn test_nested_imports_resolve_against_their_importer() {
        let resolver = DirectoryResolver {
            documents: [
                (
                    "root/parents/base.yaml",
                    "schemaVersion: 2.2.0\nparent:\n  uri: grand.yaml\n",
                ),
                (
                    "root/parents/grand.yaml",
                    "schemaVersion: 2.2.0\ncomponents:\n  - name: tooling\n    container:\n      image: udi:1\n",
                ),
            ]
            .into_iter()
            .collect(),
            importers: Default::default(),
        };

        let devfile = flatten(
            &doc("schemaVersion: 2.2.0\nparent:\n  uri: parents/base.yaml\n"),
            &resolver,
        )
        .unwrap();

        assert_eq!(devfile.components[0].name, "tooling");
        assert_eq!(
            *resolver.importers.lock().unwrap(),
            vec![
                Some("root/devfile.yaml".to_string()),
                Some("root/parents/base.yaml".to_string()),
            ]
        );
    }

    #[test]
    fn test_import_of_the_root_devfile_is_a_cycle() {
        let resolver = DirectoryResolver {
            documents: [(
                "root/devfile.yaml",
                "schemaVersion: 2.2.0\nparent:\n  uri: devfile.yaml\n",
            )]
            .into_iter()
            .collect(),
            importers: Default::default(),
        };

        let err = flatten(
            &doc("schemaVersion: 2.2.0\nparent:\n  uri: devfile.yaml\n"),
            &resolver,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DevfileError::Flatten("Import cycle detected at 'root/devfile.yaml'".to_string())
        );
    }
}
