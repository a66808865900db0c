use serde_json::{Map, Value};

/// Display attributes handed to the chart renderer (e.g. `color`, `mode`,
/// `line`). Keys keep their insertion order.
pub type Style = Map<String, Value>;

/// Overlay `overrides` on top of `base`. Keys present in both take the value
/// from `overrides`; the merge is shallow.
pub fn merge_style(base: &Style, overrides: &Style) -> Style {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn style(value: Value) -> Style {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_override_wins_on_conflict() {
        let base = style(json!({"mode": "lines", "color": "black"}));
        let overrides = style(json!({"color": "green"}));
        let merged = merge_style(&base, &overrides);
        assert_eq!(merged, style(json!({"mode": "lines", "color": "green"})));
    }

    #[test]
    fn test_nested_values_are_replaced_not_merged() {
        let base = style(json!({"line": {"color": "red", "width": 2}}));
        let overrides = style(json!({"line": {"color": "blue"}}));
        let merged = merge_style(&base, &overrides);
        assert_eq!(merged["line"], json!({"color": "blue"}));
    }
}
