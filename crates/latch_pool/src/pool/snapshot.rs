use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSnapshot {
    pub pooled: usize,
    pub active: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<usize>,
}

/// Point-in-time counts of a pool, for debugging only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub name: &'static str,
    pub collections: IndexMap<String, CollectionSnapshot>,
    pub total: usize,
}

impl PoolSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
