use crate::error::{DevfileError, Result};
use serde_json::Value;

/// Deep merge JSON values recursively, with overlay taking precedence.
///
/// Objects merge key by key; arrays and scalars in the overlay replace the
/// base value.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => {
                        // Special handling for arrays - replace don't merge
                        if matches!(overlay_value, Value::Array(_)) {
                            base_map.insert(key, overlay_value);
                        } else {
                            deep_merge(base_value, overlay_value);
                        }
                    }
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (base_val, overlay_val) => {
            *base_val = overlay_val;
        }
    }
}

fn key_of<'a>(element: &'a Value, key: &str) -> Option<&'a str> {
    element.get(key).and_then(Value::as_str)
}

/// Merge a local list over an inherited one, matching elements by `key`.
///
/// Local elements come first, each deep-merged over the inherited element of
/// the same key. Inherited elements the local list does not mention are
/// appended in their original order.
pub fn merge_keyed(inherited: Vec<Value>, local: Vec<Value>, key: &str) -> Vec<Value> {
    let mut remaining: Vec<Option<Value>> = inherited.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(remaining.len() + local.len());

    for element in local {
        let inherited_match = key_of(&element, key).and_then(|name| {
            remaining
                .iter_mut()
                .find(|slot| {
                    slot.as_ref()
                        .and_then(|candidate| key_of(candidate, key))
                        == Some(name)
                })
                .and_then(Option::take)
        });

        match inherited_match {
            Some(mut base) => {
                deep_merge(&mut base, element);
                merged.push(base);
            }
            None => merged.push(element),
        }
    }

    merged.extend(remaining.into_iter().flatten());
    merged
}

/// Patch elements of `base` in place with the overrides of an import block.
///
/// Every override must name an element that exists in `base`.
pub fn apply_overrides(
    base: &mut [Value],
    overrides: Vec<Value>,
    key: &str,
    kind: &str,
) -> Result<()> {
    for patch in overrides {
        let name = key_of(&patch, key)
            .ok_or_else(|| {
                DevfileError::Flatten(format!("Override of a {} is missing '{}'", kind, key))
            })?
            .to_string();

        let target = base
            .iter_mut()
            .find(|element| key_of(element, key) == Some(name.as_str()))
            .ok_or_else(|| {
                DevfileError::Flatten(format!(
                    "Override of {} '{}' does not match any {} of the imported devfile",
                    kind, name, kind
                ))
            })?;

        deep_merge(target, patch);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge() {
        let mut base = json!({
            "container": {
                "image": "base:1",
                "memoryLimit": "1Gi"
            },
            "attributes": {
                "team": "platform"
            }
        });

        let overlay = json!({
            "container": {
                "image": "overlay:2"
            },
            "attributes": {
                "owner": "alice"
            }
        });

        deep_merge(&mut base, overlay);

        assert_eq!(base["container"]["image"], "overlay:2");
        assert_eq!(base["container"]["memoryLimit"], "1Gi");
        assert_eq!(base["attributes"]["team"], "platform");
        assert_eq!(base["attributes"]["owner"], "alice");
    }

    #[test]
    fn test_array_replacement_behavior() {
        let mut base = json!({
            "container": {
                "env": [{"name": "A", "value": "1"}, {"name": "B", "value": "2"}],
                "args": ["--verbose"]
            }
        });

        let overlay = json!({
            "container": {
                "env": [{"name": "C", "value": "3"}]
            }
        });

        deep_merge(&mut base, overlay);

        assert_eq!(base["container"]["env"], json!([{"name": "C", "value": "3"}]));
        assert_eq!(base["container"]["args"], json!(["--verbose"]));
    }

    #[test]
    fn test_merge_keyed_local_first_then_inherited() {
        let inherited = vec![
            json!({"name": "db", "container": {"image": "postgres:15"}}),
            json!({"name": "tooling", "container": {"image": "udi:1", "memoryLimit": "2Gi"}}),
        ];
        let local = vec![
            json!({"name": "tooling", "container": {"image": "udi:2"}}),
            json!({"name": "cache", "volume": {}}),
        ];

        let merged = merge_keyed(inherited, local, "name");

        let names: Vec<&str> = merged.iter().map(|c| c["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["tooling", "cache", "db"]);
        assert_eq!(merged[0]["container"]["image"], "udi:2");
        assert_eq!(merged[0]["container"]["memoryLimit"], "2Gi");
    }

    #[test]
    fn test_merge_keyed_without_key_is_kept() {
        let merged = merge_keyed(vec![json!({"name": "a"})], vec![json!({"image": {}})], "name");
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_apply_overrides_patches_by_key() {
        let mut base = vec![json!({"id": "build", "exec": {"commandLine": "make", "component": "tooling"}})];
        apply_overrides(
            &mut base,
            vec![json!({"id": "build", "exec": {"commandLine": "make all"}})],
            "id",
            "command",
        )
        .unwrap();
        assert_eq!(base[0]["exec"]["commandLine"], "make all");
        assert_eq!(base[0]["exec"]["component"], "tooling");
    }

    #[test]
    fn test_apply_overrides_rejects_unknown_target() {
        let mut base = vec![json!({"name": "tooling"})];
        let err = apply_overrides(&mut base, vec![json!({"name": "ghost"})], "name", "component")
            .unwrap_err();
        assert_eq!(
            err,
            DevfileError::Flatten(
                "Override of component 'ghost' does not match any component of the imported devfile"
                    .to_string()
            )
        );
    }
}
