//! Declarative pool setup

use crate::pool::{EntityConfiguration, PoolError, UnitConfiguration};
use crate::{Entity, PoolRegistry, Unit};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Collections and configurations for one scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub entity_collections: Vec<CollectionSettings>,
    pub unit_collections: Vec<CollectionSettings>,
    pub entity_configurations: IndexMap<String, EntityConfiguration>,
    pub unit_configurations: IndexMap<String, UnitConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSettings {
    pub alias: String,
    /// Name of the constructor in the [`RecipeBook`].
    pub recipe: String,
    #[serde(default)]
    pub initial_amount: usize,
}

type EntityRecipe = Rc<dyn Fn() -> Box<dyn Entity>>;
type UnitRecipe = Rc<dyn Fn() -> Box<dyn Unit>>;

/// Named constructors that settings refer to.
#[derive(Default, Clone)]
pub struct RecipeBook {
    entities: HashMap<String, EntityRecipe>,
    units: HashMap<String, UnitRecipe>,
}

impl RecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity<F>(mut self, name: impl Into<String>, recipe: F) -> Self
    where
        F: Fn() -> Box<dyn Entity> + 'static,
    {
        self.entities.insert(name.into(), Rc::new(recipe));
        self
    }

    pub fn with_unit<F>(mut self, name: impl Into<String>, recipe: F) -> Self
    where
        F: Fn() -> Box<dyn Unit> + 'static,
    {
        self.units.insert(name.into(), Rc::new(recipe));
        self
    }

    fn entity(&self, name: &str) -> Result<EntityRecipe, PoolError> {
        self.entities
            .get(name)
            .cloned()
            .ok_or_else(|| PoolError::RecipeNotFound { name: name.to_string() })
    }

    fn unit(&self, name: &str) -> Result<UnitRecipe, PoolError> {
        self.units
            .get(name)
            .cloned()
            .ok_or_else(|| PoolError::RecipeNotFound { name: name.to_string() })
    }
}

impl PoolSettings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Register every collection and configuration with `registry`.
    pub fn apply(&self, registry: &mut PoolRegistry, recipes: &RecipeBook) -> Result<(), PoolError> {
        for collection in &self.entity_collections {
            let recipe = recipes.entity(&collection.recipe)?;
            registry.entities.create_collection(
                collection.alias.clone(),
                move || recipe(),
                collection.initial_amount,
            )?;
        }
        for collection in &self.unit_collections {
            let recipe = recipes.unit(&collection.recipe)?;
            registry.units.create_collection(
                collection.alias.clone(),
                move || recipe(),
                collection.initial_amount,
            )?;
        }
        for (alias, configuration) in &self.entity_configurations {
            registry
                .entities
                .insert_configuration(alias.clone(), configuration.clone());
        }
        for (alias, configuration) in &self.unit_configurations {
            registry
                .units
                .insert_configuration(alias.clone(), configuration.clone());
        }

        debug!(
            entity_collections = self.entity_collections.len(),
            unit_collections = self.unit_collections.len(),
            configurations = self.entity_configurations.len() + self.unit_configurations.len(),
            "applied pool settings"
        );
        Ok(())
    }

    /// Build a fresh registry from these settings.
    pub fn build(&self, recipes: &RecipeBook) -> Result<PoolRegistry, PoolError> {
        let mut registry = PoolRegistry::new();
        self.apply(&mut registry, recipes)?;
        Ok(registry)
    }
}
