//! Field-by-field merging of configuration layers.

use serde_json::{Map, Value};

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// Objects merge key by key. Every other value in `overlay` replaces the one
/// in `base`, except `null`, which means "not specified" and keeps `base`.
///
/// # Example
/// ```
/// use serde_json::json;
/// use todo_service::config::deep_merge;
///
/// let base = json!({ "server": { "host": "localhost:8080", "storage_results_limit": 200 } });
/// let overlay = json!({ "server": { "storage_results_limit": 50 } });
/// let merged = deep_merge(base, overlay);
/// assert_eq!(merged["server"]["host"], "localhost:8080");
/// assert_eq!(merged["server"]["storage_results_limit"], 50);
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge layers in order, later layers winning.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

/// Build a config layer from environment variables.
///
/// Only variables starting with `prefix` are used. The rest of the name is
/// lowercased and split on `__` into nested keys, so with prefix `TODO_`,
/// `TODO_SERVER__HOST` sets `server.host`. Values are read as YAML scalars,
/// which turns `50` into a number and `true` into a boolean.
pub fn env_overlay<I>(prefix: &str, vars: I) -> Value
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut root = Map::new();

    for (name, raw) in vars {
        let Some(rest) = name.strip_prefix(prefix) else {
            continue;
        };
        let path: Vec<String> = rest
            .split("__")
            .map(|segment| segment.to_lowercase())
            .collect();
        if path.iter().any(|segment| segment.is_empty()) {
            continue;
        }

        let value = serde_yaml::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
        insert_path(&mut root, &path, value);
    }

    Value::Object(root)
}

fn insert_path(map: &mut Map<String, Value>, path: &[String], value: Value) {
    match path {
        [] => {}
        [last] => {
            map.insert(last.clone(), value);
        }
        [first, rest @ ..] => {
            let entry = map
                .entry(first.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                insert_path(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn nested_objects_merge_key_by_key() {
        let base = json!({"server": {"host": "localhost", "limit": 200}, "log_level": "info"});
        let overlay = json!({"server": {"limit": 50}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"server": {"host": "localhost", "limit": 50}, "log_level": "info"})
        );
    }

    #[test]
    fn null_preserves_base() {
        let base = json!({"a": 1});
        assert_eq!(deep_merge(base, json!({"a": null})), json!({"a": 1}));
    }

    #[test]
    fn later_layers_win() {
        let merged = deep_merge_all(vec![json!({"a": 1}), json!({"b": 2}), json!({"a": 3})]);
        assert_eq!(merged, json!({"a": 3, "b": 2}));
    }

    #[test]
    fn env_overlay_builds_nested_typed_values() {
        let overlay = env_overlay(
            "TODO_",
            vars(&[
                ("TODO_SERVER__HOST", "0.0.0.0:9000"),
                ("TODO_SERVER__STORAGE_RESULTS_LIMIT", "50"),
                ("TODO_DEVELOPMENT__PRETTY_LOGGING", "true"),
                ("TODO_LOG_LEVEL", "debug"),
                ("HOME", "/root"),
            ]),
        );
        assert_eq!(
            overlay,
            json!({
                "server": {"host": "0.0.0.0:9000", "storage_results_limit": 50},
                "development": {"pretty_logging": true},
                "log_level": "debug"
            })
        );
    }

    #[test]
    fn env_overlay_skips_malformed_names() {
        let overlay = env_overlay("TODO_", vars(&[("TODO_", "x"), ("TODO_SERVER____HOST", "y")]));
        assert_eq!(overlay, json!({}));
    }
}
