//! Deep merge for tiered YAML configuration.
//!
//! Higher tiers override lower tiers key by key. Arrays are replaced whole.

use serde_json::Value;

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans are replaced entirely
/// - A null overlay keeps the base value (null means "not specified")
///
/// # Example
/// ```
/// use serde_json::json;
/// use project_rollup::config::deep_merge;
///
/// let base = json!({ "analysis_prefix": "AN-", "verbose": false });
/// let overlay = json!({ "verbose": true });
/// let merged = deep_merge(base, overlay);
/// assert_eq!(merged, json!({ "analysis_prefix": "AN-", "verbose": true }));
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

/// Merge tiers in order, later tiers winning.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_key_wins() {
        let result = deep_merge(
            json!({"ignore_marker": "ignore", "verbose": false}),
            json!({"verbose": true}),
        );
        assert_eq!(result, json!({"ignore_marker": "ignore", "verbose": true}));
    }

    #[test]
    fn null_keeps_base() {
        let result = deep_merge(json!({"analysis_prefix": "AN-"}), json!({"analysis_prefix": null}));
        assert_eq!(result, json!({"analysis_prefix": "AN-"}));
    }

    #[test]
    fn arrays_replaced() {
        let result = deep_merge(json!({"tiers": [1, 2]}), json!({"tiers": [3]}));
        assert_eq!(result, json!({"tiers": [3]}));
    }

    #[test]
    fn merge_all_folds_in_order() {
        let result = deep_merge_all(vec![
            json!({"date_format": "%Y/%m/%d", "verbose": false}),
            json!({"verbose": true}),
            json!({"date_format": "%d.%m.%Y"}),
        ]);
        assert_eq!(result, json!({"date_format": "%d.%m.%Y", "verbose": true}));
    }
}
