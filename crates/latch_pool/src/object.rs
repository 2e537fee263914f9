//! Behavior traits implemented by pooled game objects.
//!
//! Entities are the nodes of a scene tree; units are behavior pieces attached
//! to exactly one entity (a renderer is a unit in a dedicated slot). Both are
//! constructed once by their pool and reused across many lives: every life
//! starts with `reset` + `configure` and ends when the object is recycled.

use crate::{Args, ArgsError, EntityId};
use std::any::Any;

/// Downcasting support for trait objects stored in pools.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Lifecycle shared by everything a pool hands out.
pub trait Pooled: AsAny {
    /// Clear transient state left over from the previous life.
    fn reset(&mut self) {}

    /// Apply the merged argument bag for this life.
    fn configure(&mut self, _args: &Args) -> Result<(), ArgsError> {
        Ok(())
    }

    /// Called right before the recycle notification is emitted.
    fn recycle(&mut self) {}

    /// Release external resources. Only called when the pool is cleared.
    fn destroy(&mut self) {}
}

/// A scene-tree node.
pub trait Entity: Pooled {
    /// Whether child entities can be attached to this one.
    fn is_container(&self) -> bool {
        false
    }

    fn start(&mut self) {}

    fn update(&mut self, _dt: f32) {}

    fn draw(&self) {}
}

/// A behavior unit attached to an entity.
pub trait Unit: Pooled {
    fn attached(&mut self, _owner: EntityId) {}

    fn detached(&mut self) {}

    fn start(&mut self) {}

    fn update(&mut self, _dt: f32) {}

    /// Only invoked for the unit installed as an entity's renderer.
    fn draw(&self) {}
}
