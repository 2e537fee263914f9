//! Selective and bulk return of assembled entities to their pools.
//!
//! Claiming an entity detaches it from its parent and recycles the whole
//! subtree. The recycle listeners registered during assembly do the actual
//! release, so a claimed entity and everything under it ends up idle.

use crate::pool::PoolError;
use crate::{EntityId, PoolRegistry};
use std::str::FromStr;
use tracing::debug;

/// Which identifier a bulk claim matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimMode {
    /// Match the collection alias (`pool_id`).
    Type,
    /// Match the configuration alias (`type_id`).
    Configuration,
}

impl FromStr for ClaimMode {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "type" => Ok(ClaimMode::Type),
            "configuration" => Ok(ClaimMode::Configuration),
            _ => Err(PoolError::UnknownClaimMode { mode: s.to_string() }),
        }
    }
}

pub struct Reclaimer<'r> {
    registry: &'r mut PoolRegistry,
}

impl<'r> Reclaimer<'r> {
    pub fn new(registry: &'r mut PoolRegistry) -> Self {
        Self { registry }
    }

    /// Claim `id` if its configuration or collection alias equals `match_id`.
    ///
    /// Returns whether the entity was claimed. Entities that are already idle
    /// are skipped.
    pub fn claim(&mut self, id: EntityId, match_id: &str) -> Result<bool, PoolError> {
        if match_id.is_empty() {
            return Err(PoolError::MissingIdentifier);
        }
        let entities = &self.registry.entities;
        if !entities.is_active(id) {
            return Ok(false);
        }
        let matches =
            entities.type_id(id) == Some(match_id) || entities.pool_id(id)? == match_id;
        if !matches {
            return Ok(false);
        }

        self.registry.detach(id)?;
        self.registry.recycle(id)?;
        debug!(%id, match_id, "claimed entity");
        Ok(true)
    }

    /// Claim every active instance of collection `alias`, newest first.
    pub fn claim_type(&mut self, alias: &str) -> Result<usize, PoolError> {
        self.claim_active(alias, alias)
    }

    /// Claim every active entity assembled from configuration `alias`.
    pub fn claim_configuration(&mut self, alias: &str) -> Result<usize, PoolError> {
        let type_alias = self
            .registry
            .entities
            .configuration(alias)?
            .type_alias()
            .to_string();
        self.claim_active(&type_alias, alias)
    }

    fn claim_active(&mut self, type_alias: &str, match_id: &str) -> Result<usize, PoolError> {
        let active = self.registry.entities.active(type_alias).to_vec();
        let mut claimed = 0;
        for id in active.into_iter().rev() {
            if self.claim(id, match_id)? {
                claimed += 1;
            }
        }
        Ok(claimed)
    }

    pub fn claim_all(&mut self) -> Result<usize, PoolError> {
        let aliases: Vec<String> = self
            .registry
            .entities
            .active_index()
            .map(|(alias, _)| alias.to_string())
            .collect();
        let mut claimed = 0;
        for alias in aliases {
            claimed += self.claim_type(&alias)?;
        }
        Ok(claimed)
    }

    /// Claim every active entity except those whose identifier under `mode`
    /// is listed in `except`.
    ///
    /// In [`ClaimMode::Configuration`] an entity without a configuration
    /// alias is keyed by its collection alias.
    pub fn claim_all_but<S: AsRef<str>>(
        &mut self,
        mode: ClaimMode,
        except: &[S],
    ) -> Result<usize, PoolError> {
        let index: Vec<EntityId> = self
            .registry
            .entities
            .active_index()
            .flat_map(|(_, active)| active.iter().rev().copied())
            .collect();

        let mut claimed = 0;
        for id in index {
            let entities = &self.registry.entities;
            // Claiming a parent may already have released its children.
            if !entities.is_active(id) {
                continue;
            }
            let pool_id = entities.pool_id(id)?;
            let key = match mode {
                ClaimMode::Type => pool_id,
                ClaimMode::Configuration => entities.type_id(id).unwrap_or(pool_id),
            };
            if except.iter().any(|e| e.as_ref() == key) {
                continue;
            }
            let key = key.to_string();
            if self.claim(id, &key)? {
                claimed += 1;
            }
        }
        Ok(claimed)
    }

    /// Claim every active entity whose identifier under `mode` is listed.
    pub fn claim_only<S: AsRef<str>>(
        &mut self,
        mode: ClaimMode,
        only: &[S],
    ) -> Result<usize, PoolError> {
        let mut claimed = 0;
        for id in only {
            claimed += match mode {
                ClaimMode::Type => self.claim_type(id.as_ref())?,
                ClaimMode::Configuration => self.claim_configuration(id.as_ref())?,
            };
        }
        Ok(claimed)
    }

    /// Claim everything, then destroy both pools.
    pub fn clear_all_pools(&mut self) -> Result<(), PoolError> {
        let claimed = self.claim_all()?;
        self.registry.clear();
        debug!(claimed, "cleared all pools");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::scene;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn nothing_active(registry: &PoolRegistry) -> bool {
        registry.entities().active_index().all(|(_, a)| a.is_empty())
            && registry.units().active_index().all(|(_, a)| a.is_empty())
    }

    #[test]
    fn test_claim_cascades_to_units_and_children() {
        init_tracing();
        let mut registry = scene();
        let ship = registry.assembler().get("fighter", None).unwrap();
        let units = registry.units_of(ship).to_vec();
        let child = registry.children(ship)[0];
        let renderer = registry.renderer_of(ship).unwrap();

        assert!(registry.reclaimer().claim(ship, "fighter").unwrap());

        assert!(!registry.entities().is_active(ship));
        assert!(!registry.entities().is_active(child));
        assert!(units.iter().all(|u| !registry.units().is_active(*u)));
        assert!(!registry.units().is_active(renderer));
        assert!(nothing_active(&registry));
    }

    #[test]
    fn test_claim_by_collection_alias() {
        let mut registry = scene();
        let ship = registry.assembler().get("fighter", None).unwrap();

        assert!(registry.reclaimer().claim(ship, "Ship").unwrap());
        assert!(nothing_active(&registry));
    }

    #[test]
    fn test_claim_requires_identifier() {
        let mut registry = scene();
        let ship = registry.assembler().get("fighter", None).unwrap();

        assert!(matches!(
            registry.reclaimer().claim(ship, ""),
            Err(PoolError::MissingIdentifier)
        ));
        assert!(registry.entities().is_active(ship));
    }

    #[test]
    fn test_claim_ignores_mismatch_and_idle() {
        let mut registry = scene();
        let ship = registry.assembler().get("fighter", None).unwrap();

        assert!(!registry.reclaimer().claim(ship, "rock").unwrap());
        assert!(registry.entities().is_active(ship));

        assert!(registry.reclaimer().claim(ship, "fighter").unwrap());
        assert!(!registry.reclaimer().claim(ship, "fighter").unwrap());
    }

    #[test]
    fn test_handle_from_earlier_life_cannot_claim() {
        let mut registry = scene();
        let old = registry.assembler().get("rock", None).unwrap();
        assert!(registry.reclaimer().claim(old, "rock").unwrap());

        let new = registry.assembler().get("rock", None).unwrap();

        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(!registry.reclaimer().claim(old, "rock").unwrap());
        assert!(registry.entities().is_active(new));
        assert!(registry.entity::<crate::test_util::Body>(old).is_none());
    }

    #[test]
    fn test_claiming_a_child_detaches_it() {
        let mut registry = scene();
        let ship = registry.assembler().get("fighter", None).unwrap();
        let turret = registry.children(ship)[0];

        assert!(registry.reclaimer().claim(turret, "turret").unwrap());

        assert!(registry.children(ship).is_empty());
        assert!(registry.entities().is_active(ship));
        assert!(!registry.entities().is_active(turret));
    }

    #[test]
    fn test_claim_type_and_configuration() {
        let mut registry = scene();
        registry.assembler().get("rock", None).unwrap();
        registry.assembler().get("rock", None).unwrap();
        registry.assembler().get("fighter", None).unwrap();

        assert_eq!(registry.reclaimer().claim_configuration("rock").unwrap(), 2);
        assert!(registry.entities().active("Rock").is_empty());

        assert_eq!(registry.reclaimer().claim_type("Ship").unwrap(), 1);
        assert!(nothing_active(&registry));
    }

    #[test]
    fn test_claim_unknown_configuration() {
        let mut registry = scene();
        assert!(matches!(
            registry.reclaimer().claim_configuration("cruiser"),
            Err(PoolError::ConfigurationNotFound { .. })
        ));
    }

    #[test]
    fn test_claim_all_but_configuration_keeps_listed() {
        init_tracing();
        let mut registry = scene();
        registry
            .entities_mut()
            .create_configuration("boulder", "Rock")
            .with_args(crate::args! { "size" => 3 });
        let a = registry.assembler().get("rock", None).unwrap();
        let b = registry.assembler().get("boulder", None).unwrap();
        let ship = registry.assembler().get("fighter", None).unwrap();

        registry
            .reclaimer()
            .claim_all_but(ClaimMode::Configuration, &["boulder"])
            .unwrap();

        assert!(!registry.entities().is_active(a));
        assert!(registry.entities().is_active(b));
        assert!(!registry.entities().is_active(ship));
        assert_eq!(registry.entities().active("Rock"), &[b]);
        assert!(registry.entities().active("Turret").is_empty());
    }

    #[test]
    fn test_claim_all_but_type() {
        let mut registry = scene();
        let rock = registry.assembler().get("rock", None).unwrap();
        let ship = registry.assembler().get("fighter", None).unwrap();

        let claimed = registry
            .reclaimer()
            .claim_all_but(ClaimMode::Type, &["Rock".to_string()])
            .unwrap();

        assert_eq!(claimed, 1);
        assert!(registry.entities().is_active(rock));
        assert!(!registry.entities().is_active(ship));
        assert!(registry.units().active("Engine").is_empty());
    }

    #[test]
    fn test_claim_all_but_keeps_excluded_children() {
        let mut registry = scene();
        let ship = registry.assembler().get("fighter", None).unwrap();
        let turret = registry.children(ship)[0];

        registry
            .reclaimer()
            .claim_all_but(ClaimMode::Configuration, &["fighter"])
            .unwrap();

        // The turret is listed under its own alias, so it goes.
        assert!(registry.entities().is_active(ship));
        assert!(!registry.entities().is_active(turret));
        assert!(registry.children(ship).is_empty());
    }

    #[test]
    fn test_claim_only() {
        let mut registry = scene();
        let rock = registry.assembler().get("rock", None).unwrap();
        let ship = registry.assembler().get("fighter", None).unwrap();

        let claimed = registry
            .reclaimer()
            .claim_only(ClaimMode::Configuration, &["fighter"])
            .unwrap();

        assert_eq!(claimed, 1);
        assert!(!registry.entities().is_active(ship));
        assert!(registry.entities().is_active(rock));

        registry.reclaimer().claim_only(ClaimMode::Type, &["Rock"]).unwrap();
        assert!(nothing_active(&registry));
    }

    #[test]
    fn test_claim_all_and_clear() {
        let mut registry = scene();
        registry.assembler().get("rock", None).unwrap();
        let ship = registry.assembler().get("fighter", None).unwrap();

        let mut reclaimer = registry.reclaimer();
        assert_eq!(reclaimer.claim_all().unwrap(), 2);
        reclaimer.clear_all_pools().unwrap();

        assert!(!registry.entities().contains_collection("Ship"));
        assert!(!registry.units().contains_collection("Engine"));
        assert!(matches!(
            registry.reclaimer().claim(ship, "fighter"),
            Ok(false)
        ));
    }

    #[test]
    fn test_parse_claim_mode() {
        assert_eq!("type".parse::<ClaimMode>().unwrap(), ClaimMode::Type);
        assert_eq!(
            "Configuration".parse::<ClaimMode>().unwrap(),
            ClaimMode::Configuration
        );
        assert!(matches!(
            "tag".parse::<ClaimMode>(),
            Err(PoolError::UnknownClaimMode { ref mode }) if mode == "tag"
        ));
    }
}
