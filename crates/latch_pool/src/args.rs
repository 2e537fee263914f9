//! Argument maps applied to pooled objects when they are configured.
//!
//! Arguments are a flat map of JSON values. Configurations carry "hard"
//! arguments, call sites may pass overrides, and the two are merged
//! shallowly: top-level keys from the override win, nested values are
//! replaced wholesale.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArgsError {
    #[error("argument '{key}' is required")]
    Missing { key: String },
    #[error("argument '{key}' has an unexpected shape")]
    Invalid {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value bag handed to [`Pooled::configure`](crate::Pooled::configure).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(BTreeMap<String, Value>);

impl Args {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Shallow merge of `overrides` on top of `hard`.
    pub fn merged(hard: Option<&Args>, overrides: Option<&Args>) -> Args {
        let mut merged = hard.cloned().unwrap_or_default();
        if let Some(overrides) = overrides {
            merged
                .0
                .extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// Typed lookup. Absent keys yield `Ok(None)`.
    pub fn value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ArgsError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|source| ArgsError::Invalid {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// Typed lookup for keys a configuration must provide.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, ArgsError> {
        self.value(key)?.ok_or_else(|| ArgsError::Missing {
            key: key.to_string(),
        })
    }
}

impl FromIterator<(String, Value)> for Args {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_override_wins_per_key() {
        let hard = crate::args! { "a" => 0, "b" => 2 };
        let overrides = crate::args! { "a" => 1 };

        let merged = Args::merged(Some(&hard), Some(&overrides));

        assert_eq!(merged.value::<i64>("a").unwrap(), Some(1));
        assert_eq!(merged.value::<i64>("b").unwrap(), Some(2));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_nested_values_are_replaced_not_merged() {
        let hard = crate::args! { "pos" => json!({ "x": 1, "y": 2 }) };
        let overrides = crate::args! { "pos" => json!({ "x": 5 }) };

        let merged = Args::merged(Some(&hard), Some(&overrides));

        assert_eq!(merged.get("pos"), Some(&json!({ "x": 5 })));
    }

    #[test]
    fn test_merge_with_missing_sides() {
        let hard = crate::args! { "a" => 0 };

        assert_eq!(Args::merged(Some(&hard), None), hard);
        assert_eq!(Args::merged(None, Some(&hard)), hard);
        assert!(Args::merged(None, None).is_empty());
    }

    #[test]
    fn test_typed_access_reports_shape_errors() {
        let args = Args::new().with("speed", "fast").with("name", "ship");

        assert!(matches!(
            args.value::<f64>("speed"),
            Err(ArgsError::Invalid { ref key, .. }) if key == "speed"
        ));
        assert_eq!(args.require::<String>("name").unwrap(), "ship");
        assert!(matches!(
            args.require::<u32>("hp"),
            Err(ArgsError::Missing { ref key }) if key == "hp"
        ));
    }
}
