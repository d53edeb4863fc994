//! Checkpoint persistence format.
//!
//! An incremental source plugin records its extraction watermark as a flat
//! mapping of parameter name to string value. Richer types are the plugin's
//! own business to encode and decode; the host only stores strings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Flat `name -> value` checkpoint mapping.
///
/// Serializes as a plain JSON object (`{"last_id": "9"}`). Ordering is
/// deterministic so persisted checkpoints compare and diff cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InitialValues(BTreeMap<String, String>);

impl InitialValues {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a single value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Insert or overwrite a single value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a single value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Borrow the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Consume into the underlying map.
    #[must_use]
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl fmt::Display for InitialValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v:?}")?;
        }
        f.write_str("}")
    }
}

impl From<BTreeMap<String, String>> for InitialValues {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K, V> FromIterator<(K, V)> for InitialValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for InitialValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_flat_object() {
        let values = InitialValues::from([("last_id", "9"), ("cursor", "abc")]);
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json, serde_json::json!({"cursor": "abc", "last_id": "9"}));
    }

    #[test]
    fn rejects_nested_values() {
        let result: Result<InitialValues, _> =
            serde_json::from_str(r#"{"last_id": {"nested": "1"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_string_values() {
        let result: Result<InitialValues, _> = serde_json::from_str(r#"{"last_id": 9}"#);
        assert!(result.is_err());
    }

    #[test]
    fn insert_overwrites() {
        let mut values = InitialValues::new();
        assert!(values.insert("last_id", "5").is_none());
        assert_eq!(values.insert("last_id", "9").as_deref(), Some("5"));
        assert_eq!(values.get("last_id"), Some("9"));
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn display_is_sorted() {
        let values = InitialValues::from([("b", "2"), ("a", "1")]);
        assert_eq!(values.to_string(), r#"{a="1", b="2"}"#);
    }

    #[test]
    fn default_is_empty() {
        assert!(InitialValues::default().is_empty());
    }
}
