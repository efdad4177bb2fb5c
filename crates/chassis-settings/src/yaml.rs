//! YAML source loading and saving. Nested maps flatten to dot-keys only — a
//! nested map is never itself stored as a value.

use std::collections::BTreeMap;

use serde_yaml::Value as YamlValue;

#[derive(Debug, thiserror::Error)]
pub enum YamlError {
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to read YAML file: {0}")]
    Io(#[from] std::io::Error),
}

/// Flattens a YAML document into dot-separated keys mapped to their scalar
/// string representation. Sequences are indexed (`list.0`, `list.1`, …);
/// nested maps recurse and are never stored as a map value themselves.
pub fn flatten(raw: &str) -> Result<Vec<(String, String)>, YamlError> {
    let doc: YamlValue = serde_yaml::from_str(raw)?;
    let mut out = Vec::new();
    flatten_into(&doc, String::new(), &mut out);
    Ok(out)
}

fn flatten_into(value: &YamlValue, prefix: String, out: &mut Vec<(String, String)>) {
    match value {
        YamlValue::Mapping(map) => {
            for (k, v) in map {
                let key_str = k.as_str().map(str::to_string).unwrap_or_else(|| format!("{k:?}"));
                let next_prefix = if prefix.is_empty() { key_str } else { format!("{prefix}.{key_str}") };
                flatten_into(v, next_prefix, out);
            }
        }
        YamlValue::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                let next_prefix = format!("{prefix}.{i}");
                flatten_into(v, next_prefix, out);
            }
        }
        YamlValue::Null => {}
        YamlValue::Bool(b) => out.push((prefix, b.to_string())),
        YamlValue::Number(n) => out.push((prefix, n.to_string())),
        YamlValue::String(s) => out.push((prefix, s.clone())),
        YamlValue::Tagged(tagged) => flatten_into(&tagged.value, prefix, out),
    }
}

/// Rebuilds a nested YAML mapping from flat dot-keys, the inverse of
/// [`flatten`], used by `save_to_yaml`.
pub fn unflatten(pairs: &BTreeMap<String, String>) -> YamlValue {
    let mut root = serde_yaml::Mapping::new();

    for (key, value) in pairs {
        let parts: Vec<&str> = key.split('.').collect();
        insert_path(&mut root, &parts, value);
    }

    YamlValue::Mapping(root)
}

fn insert_path(map: &mut serde_yaml::Mapping, parts: &[&str], value: &str) {
    let (head, rest) = (parts[0], &parts[1..]);
    let key = YamlValue::String(head.to_string());

    if rest.is_empty() {
        map.insert(key, YamlValue::String(value.to_string()));
        return;
    }

    let entry = map.entry(key).or_insert_with(|| YamlValue::Mapping(serde_yaml::Mapping::new()));
    if !matches!(entry, YamlValue::Mapping(_)) {
        *entry = YamlValue::Mapping(serde_yaml::Mapping::new());
    }
    if let YamlValue::Mapping(nested) = entry {
        insert_path(nested, rest, value);
    }
}

pub fn to_string(pairs: &BTreeMap<String, String>) -> Result<String, YamlError> {
    Ok(serde_yaml::to_string(&unflatten(pairs))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_maps_to_dot_keys() {
        let yaml = "database:\n  host: localhost\n  port: 5432\n";
        let pairs = flatten(yaml).unwrap();
        assert!(pairs.contains(&("database.host".to_string(), "localhost".to_string())));
        assert!(pairs.contains(&("database.port".to_string(), "5432".to_string())));
    }

    #[test]
    fn flattens_sequences_by_index() {
        let yaml = "hosts:\n  - a\n  - b\n";
        let pairs = flatten(yaml).unwrap();
        assert!(pairs.contains(&("hosts.0".to_string(), "a".to_string())));
        assert!(pairs.contains(&("hosts.1".to_string(), "b".to_string())));
    }

    #[test]
    fn unflatten_round_trips_through_flatten() {
        let mut pairs = BTreeMap::new();
        pairs.insert("database.host".to_string(), "localhost".to_string());
        pairs.insert("database.port".to_string(), "5432".to_string());

        let yaml = to_string(&pairs).unwrap();
        let flattened: BTreeMap<String, String> = flatten(&yaml).unwrap().into_iter().collect();
        assert_eq!(flattened, pairs);
    }
}
