//! Per-alias churn counters for pooled objects

use std::collections::HashMap;

use crate::{Churn, ChurnEvent};

pub struct ChurnCounter {
    counters: HashMap<String, Churn>,
}

impl ChurnCounter {
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
        }
    }

    pub fn record(&mut self, alias: &str, event: ChurnEvent) {
        let churn = self.counters.entry(alias.to_string()).or_default();
        match event {
            ChurnEvent::Created => churn.created += 1,
            ChurnEvent::Acquired => churn.acquired += 1,
            ChurnEvent::Released => churn.released += 1,
            ChurnEvent::Destroyed => churn.destroyed += 1,
        }
    }

    pub fn get(&self, alias: &str) -> Churn {
        self.counters.get(alias).copied().unwrap_or_default()
    }

    /// Sum over every alias seen so far.
    pub fn total(&self) -> Churn {
        self.counters.values().fold(Churn::default(), |acc, c| Churn {
            created: acc.created + c.created,
            acquired: acc.acquired + c.acquired,
            released: acc.released + c.released,
            destroyed: acc.destroyed + c.destroyed,
        })
    }

    pub fn reset(&mut self, alias: &str) {
        self.counters.remove(alias);
    }

    pub fn reset_all(&mut self) {
        self.counters.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Churn)> {
        self.counters.iter()
    }
}

impl Default for ChurnCounter {
    fn default() -> Self {
        Self::new()
    }
}
