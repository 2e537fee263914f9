//! Entity pool: collections of scene-tree nodes and their configurations.
//!
//! Only entities that are requested directly need a maximum amount; types
//! that only ever appear as children may be created without one and grow as
//! needed.

use super::{Growth, Pool, PoolError, PoolKind, Request};
use crate::{Args, Entity, Handle, UnitId};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

pub struct EntityKind;

impl PoolKind for EntityKind {
    type Object = dyn Entity;
    type Links = EntityLinks;
    type Configuration = EntityConfiguration;

    const NAME: &'static str = "entity pool";

    fn max_amount_for(initial_amount: usize) -> Option<usize> {
        (initial_amount > 0).then_some(initial_amount)
    }
}

pub type EntityId = Handle<EntityKind>;

#[derive(Debug, Default)]
pub struct EntityLinks {
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) units: Vec<UnitId>,
    pub(crate) renderer: Option<UnitId>,
}

/// A `(configuration alias, args)` pair naming something to attach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,
}

/// Declarative recipe for an entity tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfiguration {
    #[serde(rename = "type")]
    type_alias: String,
    #[serde(default, rename = "args", skip_serializing_if = "Option::is_none")]
    hard_args: Option<Args>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    units: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    renderer: Option<Attachment>,
}

impl EntityConfiguration {
    pub fn new(type_alias: impl Into<String>) -> Self {
        Self {
            type_alias: type_alias.into(),
            hard_args: None,
            children: Vec::new(),
            units: Vec::new(),
            renderer: None,
        }
    }

    /// Replace the configuration's hard arguments.
    pub fn with_args(&mut self, args: Args) -> &mut Self {
        self.hard_args = Some(args);
        self
    }

    pub fn with_child(&mut self, alias: impl Into<String>, args: Option<Args>) -> &mut Self {
        self.children.push(Attachment {
            alias: alias.into(),
            args,
        });
        self
    }

    pub fn with_unit(&mut self, alias: impl Into<String>, args: Option<Args>) -> &mut Self {
        self.units.push(Attachment {
            alias: alias.into(),
            args,
        });
        self
    }

    pub fn with_renderer(&mut self, alias: impl Into<String>, args: Option<Args>) -> &mut Self {
        self.renderer = Some(Attachment {
            alias: alias.into(),
            args,
        });
        self
    }

    /// Collection alias instances are taken from.
    pub fn type_alias(&self) -> &str {
        &self.type_alias
    }

    pub fn hard_args(&self) -> Option<&Args> {
        self.hard_args.as_ref()
    }

    pub fn children(&self) -> &[Attachment] {
        &self.children
    }

    pub fn units(&self) -> &[Attachment] {
        &self.units
    }

    pub fn renderer(&self) -> Option<&Attachment> {
        self.renderer.as_ref()
    }
}

#[derive(Default)]
pub struct EntityPool {
    pool: Pool<EntityKind>,
}

impl EntityPool {
    pub fn new() -> Self {
        Self { pool: Pool::new() }
    }

    /// Register an entity collection. A non-zero `initial_amount` is also
    /// the number of instances that may ever be requested directly.
    pub fn create_collection<F>(
        &mut self,
        alias: impl Into<String>,
        recipe: F,
        initial_amount: usize,
    ) -> Result<(), PoolError>
    where
        F: Fn() -> Box<dyn Entity> + 'static,
    {
        self.pool.create_collection(alias, recipe, initial_amount)
    }

    /// Start authoring a configuration for instances of `type_alias`.
    pub fn create_configuration(
        &mut self,
        alias: impl Into<String>,
        type_alias: impl Into<String>,
    ) -> &mut EntityConfiguration {
        self.insert_configuration(alias, EntityConfiguration::new(type_alias))
    }

    pub fn insert_configuration(
        &mut self,
        alias: impl Into<String>,
        configuration: EntityConfiguration,
    ) -> &mut EntityConfiguration {
        self.pool.store_configuration(alias.into(), configuration)
    }

    /// Look up a configuration and make sure an instance can be acquired
    /// for it.
    ///
    /// Direct requests for an uncapped type are rejected: those types are
    /// only reachable as children. When no instance is idle, uncapped types
    /// construct one; capped types only do so under [`Growth::Unbounded`].
    pub fn resolve_configuration(
        &mut self,
        alias: &str,
        request: Request,
        growth: Growth,
    ) -> Result<&EntityConfiguration, PoolError> {
        let type_alias = self.pool.configuration(alias)?.type_alias().to_string();
        let max_amount = self.pool.max_amount(&type_alias)?;

        if request == Request::Direct && max_amount.is_none() {
            return Err(PoolError::UncappedExplicitRequest { alias: type_alias });
        }

        if self.pool.idle_count(&type_alias)? == 0 {
            match (max_amount, growth) {
                (None, _) => {
                    self.pool.create_pooled_instance(&type_alias)?;
                }
                (Some(_), Growth::Unbounded) => {
                    self.pool.grow(&type_alias)?;
                }
                (Some(max_amount), Growth::Capped) => {
                    return Err(PoolError::PoolExhausted {
                        pool: EntityKind::NAME,
                        alias: type_alias,
                        max_amount,
                    });
                }
            }
        }

        self.pool.configuration(alias)
    }
}

impl Deref for EntityPool {
    type Target = Pool<EntityKind>;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl DerefMut for EntityPool {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{entity_recipe, Body};

    fn pool() -> EntityPool {
        let mut pool = EntityPool::new();
        pool.create_collection("Ship", entity_recipe(Body::container), 2)
            .unwrap();
        pool.create_collection("Turret", entity_recipe(Body::leaf), 0)
            .unwrap();
        pool.create_configuration("scout", "Ship");
        pool.create_configuration("gun", "Turret");
        pool
    }

    #[test]
    fn test_builder_records_specs_in_order() {
        let mut pool = pool();
        pool.create_configuration("cruiser", "Ship")
            .with_args(Args::new().with("hp", 10))
            .with_unit("engine", None)
            .with_unit("shield", Some(Args::new().with("strength", 3)))
            .with_child("gun", None)
            .with_child("gun", Some(Args::new().with("side", "left")))
            .with_renderer("sprite", None);

        let configuration = pool.configuration("cruiser").unwrap();
        assert_eq!(configuration.type_alias(), "Ship");
        assert_eq!(configuration.hard_args(), Some(&Args::new().with("hp", 10)));
        let units: Vec<&str> = configuration.units().iter().map(|u| u.alias.as_str()).collect();
        assert_eq!(units, ["engine", "shield"]);
        assert_eq!(configuration.children().len(), 2);
        assert_eq!(
            configuration.children()[1].args,
            Some(Args::new().with("side", "left"))
        );
        assert_eq!(configuration.renderer().map(|r| r.alias.as_str()), Some("sprite"));
    }

    #[test]
    fn test_unknown_configuration() {
        let mut pool = pool();
        assert!(matches!(
            pool.resolve_configuration("frigate", Request::Direct, Growth::Capped),
            Err(PoolError::ConfigurationNotFound { ref alias, .. }) if alias == "frigate"
        ));
    }

    #[test]
    fn test_direct_request_for_uncapped_type_is_rejected() {
        let mut pool = pool();
        assert!(matches!(
            pool.resolve_configuration("gun", Request::Direct, Growth::Capped),
            Err(PoolError::UncappedExplicitRequest { ref alias }) if alias == "Turret"
        ));
        assert_eq!(pool.total("Turret").unwrap(), 0);
    }

    #[test]
    fn test_nested_request_creates_uncapped_instance() {
        let mut pool = pool();
        let configuration = pool
            .resolve_configuration("gun", Request::Nested, Growth::Capped)
            .unwrap();
        assert_eq!(configuration.type_alias(), "Turret");
        assert_eq!(pool.idle_count("Turret").unwrap(), 1);
    }

    #[test]
    fn test_capped_type_exhausts() {
        let mut pool = pool();
        pool.acquire("Ship").unwrap();
        pool.acquire("Ship").unwrap();

        assert!(matches!(
            pool.resolve_configuration("scout", Request::Direct, Growth::Capped),
            Err(PoolError::PoolExhausted { max_amount: 2, .. })
        ));
        assert_eq!(pool.total("Ship").unwrap(), 2);
    }

    #[test]
    fn test_unbounded_growth_bypasses_cap() {
        let mut pool = pool();
        pool.acquire("Ship").unwrap();
        pool.acquire("Ship").unwrap();

        pool.resolve_configuration("scout", Request::Direct, Growth::Unbounded)
            .unwrap();
        assert_eq!(pool.idle_count("Ship").unwrap(), 1);
        assert_eq!(pool.max_amount("Ship").unwrap(), Some(3));
    }

    #[test]
    fn test_configuration_targets_unknown_collection() {
        let mut pool = pool();
        pool.create_configuration("ghost", "Phantom");
        assert!(matches!(
            pool.resolve_configuration("ghost", Request::Nested, Growth::Capped),
            Err(PoolError::CollectionNotFound { .. })
        ));
    }

    #[test]
    fn test_configuration_deserializes() {
        let configuration: EntityConfiguration = serde_json::from_str(
            r#"{
                "type": "Ship",
                "args": { "hp": 3 },
                "units": [{ "alias": "engine" }],
                "children": [{ "alias": "gun", "args": { "side": "left" } }],
                "renderer": { "alias": "sprite" }
            }"#,
        )
        .unwrap();

        assert_eq!(configuration.type_alias(), "Ship");
        assert_eq!(configuration.units()[0].alias, "engine");
        assert_eq!(configuration.children()[0].args, Some(Args::new().with("side", "left")));
        assert!(configuration.renderer().is_some());
    }
}
