//! Flat, hierarchical key/value map produced by merging sources.

use std::collections::{BTreeMap, HashMap};

/// Separator between key segments (`section:subsection:field`).
pub const KEY_DELIMITER: &str = ":";

/// Merged configuration as flat string pairs.
///
/// Keys are hierarchical (`appsettings:database:connectionstring`) and compared
/// case-insensitively; they are stored lowercased. Lists use indexed children
/// (`security:allowedorigins:0`, `security:allowedorigins:1`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConfigMap {
    entries: BTreeMap<String, String>,
}

impl RawConfigMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a key to its stored form.
    pub fn normalize_key(key: &str) -> String {
        key.trim().to_lowercase()
    }

    /// Join path segments with [`KEY_DELIMITER`].
    pub fn join(prefix: &str, segment: &str) -> String {
        if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{prefix}{KEY_DELIMITER}{segment}")
        }
    }

    /// Insert a value, returning the value it replaced.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.entries
            .insert(Self::normalize_key(key.as_ref()), value.into())
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&Self::normalize_key(key))
            .map(String::as_str)
    }

    /// Whether any value is present under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&Self::normalize_key(key))
    }

    /// Apply `other` on top of this map; its values win for identical keys.
    pub fn merge(&mut self, other: RawConfigMap) {
        self.entries.extend(other.entries);
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no keys are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Values of the indexed children of `key`, ordered by index.
    ///
    /// Non-numeric children are ignored, as are gaps in the index sequence.
    pub fn list(&self, key: &str) -> Vec<String> {
        let prefix = format!("{}{KEY_DELIMITER}", Self::normalize_key(key));
        let mut indexed: Vec<(usize, &String)> = self
            .entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, v)| {
                let rest = &k[prefix.len()..];
                rest.parse::<usize>().ok().map(|index| (index, v))
            })
            .collect();
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, v)| v.clone()).collect()
    }

    /// Flatten values collected by the `config` crate.
    ///
    /// Tables become nested key segments and arrays become indexed segments.
    /// Null values are dropped.
    pub fn from_config_values(values: HashMap<String, config::Value>) -> Self {
        let mut map = Self::new();
        for (key, value) in values {
            map.flatten_value(&key, value);
        }
        map
    }

    fn flatten_value(&mut self, key: &str, value: config::Value) {
        if let Ok(table) = value.clone().into_table() {
            for (child, child_value) in table {
                self.flatten_value(&Self::join(key, &child), child_value);
            }
        } else if let Ok(array) = value.clone().into_array() {
            for (index, item) in array.into_iter().enumerate() {
                self.flatten_value(&Self::join(key, &index.to_string()), item);
            }
        } else if let Ok(text) = value.into_string() {
            self.insert(key, text);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for RawConfigMap
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_case_insensitive() {
        let mut map = RawConfigMap::new();
        map.insert("AppSettings:Environment", "Staging");

        assert_eq!(map.get("appsettings:environment"), Some("Staging"));
        assert_eq!(map.get("APPSETTINGS:ENVIRONMENT"), Some("Staging"));
        assert!(map.contains_key("AppSettings:environment"));
    }

    #[test]
    fn test_merge_last_writer_wins() {
        let mut base: RawConfigMap = [("a:b", "1"), ("a:c", "2")].into_iter().collect();
        let overlay: RawConfigMap = [("A:B", "3")].into_iter().collect();

        base.merge(overlay);

        assert_eq!(base.get("a:b"), Some("3"));
        assert_eq!(base.get("a:c"), Some("2"));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_list_orders_numerically() {
        let map: RawConfigMap = [
            ("origins:10", "k"),
            ("origins:2", "c"),
            ("origins:0", "a"),
            ("origins:1", "b"),
            ("origins:name", "ignored"),
            ("originsx:0", "other"),
        ]
        .into_iter()
        .collect();

        assert_eq!(map.list("Origins"), vec!["a", "b", "c", "k"]);
        assert!(map.list("missing").is_empty());
    }

    #[test]
    fn test_flatten_nested_values() {
        let mut inner = HashMap::new();
        inner.insert(
            "Port".to_string(),
            config::Value::new(None, config::ValueKind::I64(8080)),
        );
        inner.insert(
            "Hosts".to_string(),
            config::Value::new(
                None,
                config::ValueKind::Array(vec![
                    config::Value::new(None, config::ValueKind::String("a".into())),
                    config::Value::new(None, config::ValueKind::String("b".into())),
                ]),
            ),
        );
        inner.insert(
            "Empty".to_string(),
            config::Value::new(None, config::ValueKind::Nil),
        );

        let mut root = HashMap::new();
        root.insert(
            "Server".to_string(),
            config::Value::new(None, config::ValueKind::Table(inner)),
        );
        root.insert(
            "Debug".to_string(),
            config::Value::new(None, config::ValueKind::Boolean(true)),
        );

        let map = RawConfigMap::from_config_values(root);

        assert_eq!(map.get("server:port"), Some("8080"));
        assert_eq!(map.get("debug"), Some("true"));
        assert_eq!(map.list("server:hosts"), vec!["a", "b"]);
        assert!(!map.contains_key("server:empty"));
    }
}
