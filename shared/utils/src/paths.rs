//! Dot-path access into JSON trees
//!
//! The generic set-value-at-path traversal is confined to the mapping
//! boundary: deterministic field mapping materializes OCR tokens into a
//! nested tree here, and everything downstream works on typed schemas.

use serde_json::{Map, Value};

/// Set `value` at a dot-separated path, materializing intermediate
/// objects. A leaf or array found where a branch is needed is
/// overwritten with a branch.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    if path.is_empty() {
        *root = value;
        return;
    }

    if !root.is_object() {
        *root = Value::Object(Map::new());
    }

    let mut current = root;
    let segments: Vec<&str> = path.split('.').collect();

    for (i, segment) in segments.iter().enumerate() {
        let map = current.as_object_mut().expect("current is always an object here");
        if i == segments.len() - 1 {
            map.insert((*segment).to_string(), value);
            return;
        }

        let entry = map
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = entry;
    }
}

/// Read the value at a dot-separated path, if present.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Read a numeric leaf at a path. Accepts JSON numbers and numeric
/// strings (the mapping boundary may not have coerced yet).
pub fn get_number(root: &Value, path: &str) -> Option<f64> {
    match get_path(root, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => crate::currency::parse_money(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_path_materializes_branches() {
        let mut root = json!({});
        set_path(&mut root, "wages.wages_tips_other_comp", json!(85000.0));
        set_path(&mut root, "wages.medicare_wages", json!(86000.0));
        set_path(&mut root, "employer.name", json!("Acme Corp"));

        assert_eq!(root["wages"]["wages_tips_other_comp"], json!(85000.0));
        assert_eq!(root["wages"]["medicare_wages"], json!(86000.0));
        assert_eq!(root["employer"]["name"], json!("Acme Corp"));
    }

    #[test]
    fn test_set_path_overwrites_leaf_with_branch() {
        let mut root = json!({"wages": 100.0});
        set_path(&mut root, "wages.wages_tips_other_comp", json!(85000.0));
        assert_eq!(root["wages"]["wages_tips_other_comp"], json!(85000.0));
    }

    #[test]
    fn test_get_path() {
        let root = json!({"income": {"wages": 85000.0}});
        assert_eq!(get_path(&root, "income.wages"), Some(&json!(85000.0)));
        assert_eq!(get_path(&root, "income.missing"), None);
        assert_eq!(get_path(&root, "income.wages.deeper"), None);
    }

    #[test]
    fn test_get_number_coerces_strings() {
        let root = json!({"income": {"wages": "85,000.00", "agi": 91000.0, "name": "x"}});
        assert_eq!(get_number(&root, "income.wages"), Some(85000.0));
        assert_eq!(get_number(&root, "income.agi"), Some(91000.0));
        assert_eq!(get_number(&root, "income.name"), None);
    }
}
