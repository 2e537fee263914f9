//! Builds entity trees from registered configurations.
//!
//! Assembly is depth first: the entity is acquired and configured, its units
//! are attached in order, then every child is assembled as a nested request,
//! then the renderer. Each object assembled here subscribes a one-shot
//! listener that hands it back to its pool once it is recycled.

use crate::pool::{EntityConfiguration, Growth, PoolError, Request};
use crate::{Args, EntityId, PoolRegistry, UnitId};
use tracing::{debug, warn};

pub struct Assembler<'r> {
    registry: &'r mut PoolRegistry,
}

impl<'r> Assembler<'r> {
    pub fn new(registry: &'r mut PoolRegistry) -> Self {
        Self { registry }
    }

    /// Assemble from idle instances; uncapped child types may construct.
    pub fn get(&mut self, alias: &str, args: Option<&Args>) -> Result<EntityId, PoolError> {
        self.assemble(alias, args, Request::Direct, Growth::Capped)
    }

    /// Like [`get`](Self::get), but capped collections may grow for this call.
    pub fn create(&mut self, alias: &str, args: Option<&Args>) -> Result<EntityId, PoolError> {
        self.assemble(alias, args, Request::Direct, Growth::Unbounded)
    }

    /// Assemble the entity tree described by configuration `alias`.
    ///
    /// `args` are merged over the configuration's hard arguments, top-level
    /// keys only. On failure every object acquired by this call is returned
    /// to its pool before the error is reported.
    pub fn assemble(
        &mut self,
        alias: &str,
        args: Option<&Args>,
        request: Request,
        growth: Growth,
    ) -> Result<EntityId, PoolError> {
        let configuration = self
            .registry
            .entities
            .resolve_configuration(alias, request, growth)?
            .clone();
        let id = self.registry.entities.acquire(configuration.type_alias())?;
        let uid = self.registry.entities.prepare(id, alias)?;
        debug!(alias, %id, %uid, ?request, ?growth, "assembling entity");

        if let Err(err) = self.furnish(id, &configuration, args, growth) {
            if let Err(rollback) = self.registry.abandon(id) {
                warn!(alias, %id, error = %rollback, "failed to roll back partial assembly");
            }
            return Err(err);
        }

        self.registry
            .entities
            .on_recycle(id, |registry: &mut PoolRegistry, id| registry.entities.release(id))?;
        Ok(id)
    }

    fn furnish(
        &mut self,
        id: EntityId,
        configuration: &EntityConfiguration,
        args: Option<&Args>,
        growth: Growth,
    ) -> Result<(), PoolError> {
        if !configuration.children().is_empty() && !self.registry.entities.object(id)?.is_container() {
            return Err(PoolError::NotAContainer {
                alias: configuration.type_alias().to_string(),
            });
        }

        let merged = Args::merged(configuration.hard_args(), args);
        self.registry
            .entities
            .object_mut(id)?
            .configure(&merged)
            .map_err(|source| PoolError::Configure {
                type_id: configuration.type_alias().to_string(),
                source,
            })?;

        for entry in configuration.units() {
            let unit = self.get_unit(&entry.alias, entry.args.as_ref())?;
            if let Err(err) = self.registry.attach_unit(id, unit) {
                self.discard_unit(&entry.alias, unit);
                return Err(err);
            }
        }

        for entry in configuration.children() {
            let child = self.assemble(&entry.alias, entry.args.as_ref(), Request::Nested, growth)?;
            if let Err(err) = self.registry.add_child(id, child) {
                if let Err(rollback) = self.registry.abandon(child) {
                    warn!(
                        alias = %entry.alias,
                        id = %child,
                        error = %rollback,
                        "failed to roll back unattached child"
                    );
                }
                return Err(err);
            }
        }

        if let Some(entry) = configuration.renderer() {
            let renderer = self.get_unit(&entry.alias, entry.args.as_ref())?;
            if let Err(err) = self.registry.set_renderer(id, renderer) {
                self.discard_unit(&entry.alias, renderer);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Hand back a unit that never made it onto its entity.
    fn discard_unit(&mut self, alias: &str, id: UnitId) {
        if let Err(rollback) = self.registry.recycle_unit(id) {
            warn!(alias, %id, error = %rollback, "failed to roll back unattached unit");
        }
    }

    /// Acquire and configure a unit from configuration `alias`.
    ///
    /// The unit is not attached to anything yet; the caller decides where it
    /// goes.
    pub fn get_unit(&mut self, alias: &str, args: Option<&Args>) -> Result<UnitId, PoolError> {
        let units = &mut self.registry.units;
        let configuration = units.resolve_configuration(alias)?.clone();
        let id = units.acquire(configuration.type_alias())?;
        let uid = units.prepare(id, alias)?;

        let merged = Args::merged(configuration.args(), args);
        if let Err(source) = units.object_mut(id)?.configure(&merged) {
            if let Err(rollback) = units.release(id) {
                warn!(alias, %id, error = %rollback, "failed to release misconfigured unit");
            }
            return Err(PoolError::Configure {
                type_id: configuration.type_alias().to_string(),
                source,
            });
        }

        units.on_recycle(id, |registry: &mut PoolRegistry, id| registry.units.release(id))?;
        debug!(alias, %id, %uid, "assembled unit");
        Ok(id)
    }
}
