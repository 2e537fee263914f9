//! Scene-level owner of the entity and unit pools.
//!
//! One registry is created when a scene loads and cleared when it is torn
//! down. The [`Assembler`] and [`Reclaimer`] borrow it for the duration of a
//! call; recycle listeners receive it when a notification is emitted, which
//! keeps assembly and reclamation from holding references to each other.

use crate::pool::{EntityPool, PoolError, UnitPool};
use crate::{Assembler, Entity, EntityId, Reclaimer, Unit, UnitId};
use tracing::debug;

#[derive(Default)]
pub struct PoolRegistry {
    pub(crate) entities: EntityPool,
    pub(crate) units: UnitPool,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self {
            entities: EntityPool::new(),
            units: UnitPool::new(),
        }
    }

    pub fn entities(&self) -> &EntityPool {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityPool {
        &mut self.entities
    }

    pub fn units(&self) -> &UnitPool {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut UnitPool {
        &mut self.units
    }

    pub fn assembler(&mut self) -> Assembler<'_> {
        Assembler::new(self)
    }

    pub fn reclaimer(&mut self) -> Reclaimer<'_> {
        Reclaimer::new(self)
    }

    // ------------------------------------------------------------------
    // Typed access
    // ------------------------------------------------------------------

    pub fn entity<T: Entity>(&self, id: EntityId) -> Option<&T> {
        self.entities.object(id).ok()?.as_any().downcast_ref::<T>()
    }

    pub fn entity_mut<T: Entity>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities
            .object_mut(id)
            .ok()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    pub fn unit<T: Unit>(&self, id: UnitId) -> Option<&T> {
        self.units.object(id).ok()?.as_any().downcast_ref::<T>()
    }

    pub fn unit_mut<T: Unit>(&mut self, id: UnitId) -> Option<&mut T> {
        self.units.object_mut(id).ok()?.as_any_mut().downcast_mut::<T>()
    }

    // ------------------------------------------------------------------
    // Tree relations
    // ------------------------------------------------------------------

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.entities.slot(id).ok()?.links.parent
    }

    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.entities
            .slot(id)
            .map(|slot| slot.links.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn units_of(&self, id: EntityId) -> &[UnitId] {
        self.entities
            .slot(id)
            .map(|slot| slot.links.units.as_slice())
            .unwrap_or(&[])
    }

    pub fn renderer_of(&self, id: EntityId) -> Option<UnitId> {
        self.entities.slot(id).ok()?.links.renderer
    }

    pub fn owner_of(&self, unit: UnitId) -> Option<EntityId> {
        self.units.slot(unit).ok()?.links.owner
    }

    /// Attach `child` under `parent`, detaching it from any previous parent.
    ///
    /// Fails with [`PoolError::CyclicAttachment`] when `child` is `parent`
    /// itself or one of its ancestors.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<(), PoolError> {
        if !self.entities.object(parent)?.is_container() {
            return Err(PoolError::NotAContainer {
                alias: self.entities.pool_id(parent)?.to_string(),
            });
        }
        let mut ancestor = Some(parent);
        while let Some(node) = ancestor {
            if node == child {
                return Err(PoolError::CyclicAttachment {
                    parent: parent.to_string(),
                    child: child.to_string(),
                });
            }
            ancestor = self.parent(node);
        }
        self.detach(child)?;
        self.entities.slot_mut(child)?.links.parent = Some(parent);
        self.entities.slot_mut(parent)?.links.children.push(child);
        Ok(())
    }

    /// Returns `false` when `child` was not attached to `parent`.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> Result<bool, PoolError> {
        if self.parent(child) != Some(parent) {
            return Ok(false);
        }
        self.detach(child)?;
        Ok(true)
    }

    /// Detach an entity from its parent, returning the former parent.
    pub fn detach(&mut self, child: EntityId) -> Result<Option<EntityId>, PoolError> {
        let Some(parent) = self.entities.slot_mut(child)?.links.parent.take() else {
            return Ok(None);
        };
        if let Ok(slot) = self.entities.slot_mut(parent) {
            slot.links.children.retain(|c| *c != child);
        }
        Ok(Some(parent))
    }

    /// Attach `unit` to `entity`, taking it away from any previous owner.
    pub fn attach_unit(&mut self, entity: EntityId, unit: UnitId) -> Result<(), PoolError> {
        self.entities.slot(entity)?;
        self.unbind_unit(unit)?;
        self.entities.slot_mut(entity)?.links.units.push(unit);
        self.bind_unit(entity, unit)
    }

    /// Install `unit` as the entity's renderer, taking it away from any
    /// previous owner. A different previous renderer is recycled.
    pub fn set_renderer(&mut self, entity: EntityId, unit: UnitId) -> Result<(), PoolError> {
        self.entities.slot(entity)?;
        self.unbind_unit(unit)?;
        let previous = self.entities.slot_mut(entity)?.links.renderer.replace(unit);
        if let Some(previous) = previous {
            self.recycle_unit(previous)?;
        }
        self.bind_unit(entity, unit)
    }

    fn bind_unit(&mut self, entity: EntityId, unit: UnitId) -> Result<(), PoolError> {
        let slot = self.units.slot_mut(unit)?;
        slot.links.owner = Some(entity);
        slot.object.attached(entity);
        Ok(())
    }

    /// Remove `unit` from its owner's unit list or renderer slot.
    fn unbind_unit(&mut self, unit: UnitId) -> Result<(), PoolError> {
        let slot = self.units.slot_mut(unit)?;
        let Some(owner) = slot.links.owner.take() else {
            return Ok(());
        };
        slot.object.detached();
        if let Ok(owner) = self.entities.slot_mut(owner) {
            owner.links.units.retain(|u| *u != unit);
            if owner.links.renderer == Some(unit) {
                owner.links.renderer = None;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Recycling
    // ------------------------------------------------------------------

    /// Recycle an entity and everything hanging from it.
    ///
    /// Children are recycled last-attached first, then units in attachment
    /// order, then the renderer, then the entity itself. Each object emits its
    /// recycle notification; the listeners wired at assembly time return it
    /// to its pool.
    pub fn recycle(&mut self, id: EntityId) -> Result<(), PoolError> {
        self.detach(id)?;
        let links = std::mem::take(&mut self.entities.slot_mut(id)?.links);

        for child in links.children.into_iter().rev() {
            self.entities.slot_mut(child)?.links.parent = None;
            self.recycle(child)?;
        }
        for unit in links.units.into_iter().chain(links.renderer) {
            self.recycle_unit(unit)?;
        }

        self.entities.object_mut(id)?.recycle();
        self.emit_entity_recycle(id)
    }

    pub fn recycle_unit(&mut self, id: UnitId) -> Result<(), PoolError> {
        self.unbind_unit(id)?;
        self.units.object_mut(id)?.recycle();
        self.emit_unit_recycle(id)
    }

    /// Run and drop the entity's one-shot recycle listeners.
    pub fn emit_entity_recycle(&mut self, id: EntityId) -> Result<(), PoolError> {
        for listener in self.entities.take_recycle_listeners(id)? {
            listener(self, id)?;
        }
        Ok(())
    }

    /// Run and drop the unit's one-shot recycle listeners.
    pub fn emit_unit_recycle(&mut self, id: UnitId) -> Result<(), PoolError> {
        for listener in self.units.take_recycle_listeners(id)? {
            listener(self, id)?;
        }
        Ok(())
    }

    /// Undo a partially assembled entity: recycle whatever is already
    /// attached and hand the entity straight back to its pool.
    pub(crate) fn abandon(&mut self, id: EntityId) -> Result<(), PoolError> {
        self.recycle(id)?;
        if self.entities.is_active(id) {
            self.entities.release(id)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle fan-out
    // ------------------------------------------------------------------

    /// Start an assembled entity, its units, renderer and children.
    pub fn start(&mut self, id: EntityId) -> Result<(), PoolError> {
        self.entities.object_mut(id)?.start();
        let links = &self.entities.slot(id)?.links;
        for unit in links.units.iter().chain(links.renderer.iter()) {
            self.units.object_mut(*unit)?.start();
        }
        for child in links.children.clone() {
            self.start(child)?;
        }
        Ok(())
    }

    pub fn update(&mut self, id: EntityId, dt: f32) -> Result<(), PoolError> {
        self.entities.object_mut(id)?.update(dt);
        let links = &self.entities.slot(id)?.links;
        for unit in links.units.iter().chain(links.renderer.iter()) {
            self.units.object_mut(*unit)?.update(dt);
        }
        for child in links.children.clone() {
            self.update(child, dt)?;
        }
        Ok(())
    }

    pub fn draw(&self, id: EntityId) -> Result<(), PoolError> {
        self.entities.object(id)?.draw();
        let links = &self.entities.slot(id)?.links;
        if let Some(renderer) = links.renderer {
            self.units.object(renderer)?.draw();
        }
        for child in &links.children {
            self.draw(*child)?;
        }
        Ok(())
    }

    /// Tear down both pools. Every outstanding handle becomes stale.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.units.clear();
        debug!("cleared pool registry");
    }
}
