//! Unit pool: behavior units attached to entities.
//!
//! Units never carry a maximum amount. They can not exist outside of an
//! entity, so the cap on entities is what bounds them.

use super::{Pool, PoolError, PoolKind};
use crate::{Args, EntityId, Handle, Unit};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

pub struct UnitKind;

impl PoolKind for UnitKind {
    type Object = dyn Unit;
    type Links = UnitLinks;
    type Configuration = UnitConfiguration;

    const NAME: &'static str = "unit pool";

    fn max_amount_for(_initial_amount: usize) -> Option<usize> {
        None
    }
}

pub type UnitId = Handle<UnitKind>;

#[derive(Debug, Default)]
pub struct UnitLinks {
    pub(crate) owner: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConfiguration {
    #[serde(rename = "type")]
    type_alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    args: Option<Args>,
}

impl UnitConfiguration {
    pub fn new(type_alias: impl Into<String>) -> Self {
        Self {
            type_alias: type_alias.into(),
            args: None,
        }
    }

    pub fn with_args(&mut self, args: Args) -> &mut Self {
        self.args = Some(args);
        self
    }

    pub fn type_alias(&self) -> &str {
        &self.type_alias
    }

    pub fn args(&self) -> Option<&Args> {
        self.args.as_ref()
    }
}

#[derive(Default)]
pub struct UnitPool {
    pool: Pool<UnitKind>,
}

impl UnitPool {
    pub fn new() -> Self {
        Self { pool: Pool::new() }
    }

    /// Register a unit collection, prewarming `initial_amount` instances.
    /// The collection stays uncapped regardless.
    pub fn create_collection<F>(
        &mut self,
        alias: impl Into<String>,
        recipe: F,
        initial_amount: usize,
    ) -> Result<(), PoolError>
    where
        F: Fn() -> Box<dyn Unit> + 'static,
    {
        self.pool.create_collection(alias, recipe, initial_amount)
    }

    pub fn create_configuration(
        &mut self,
        alias: impl Into<String>,
        type_alias: impl Into<String>,
    ) -> &mut UnitConfiguration {
        self.insert_configuration(alias, UnitConfiguration::new(type_alias))
    }

    pub fn insert_configuration(
        &mut self,
        alias: impl Into<String>,
        configuration: UnitConfiguration,
    ) -> &mut UnitConfiguration {
        self.pool.store_configuration(alias.into(), configuration)
    }

    /// Look up a configuration, constructing an instance if none is idle.
    pub fn resolve_configuration(&mut self, alias: &str) -> Result<&UnitConfiguration, PoolError> {
        let type_alias = self.pool.configuration(alias)?.type_alias().to_string();
        if self.pool.idle_count(&type_alias)? == 0 {
            self.pool.create_pooled_instance(&type_alias)?;
        }
        self.pool.configuration(alias)
    }
}

impl Deref for UnitPool {
    type Target = Pool<UnitKind>;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl DerefMut for UnitPool {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pool
    }
}
