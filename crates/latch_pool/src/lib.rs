//! Latch Pool
//!
//! Object lifecycle core for scene trees:
//! - Reusable object pools with per-collection capacity
//! - Entity and unit pools with named configurations
//! - An assembler that builds entity trees from configurations
//! - A reclaimer that returns whole subtrees to their pools
//!
//! Everything is single-threaded. A [`PoolRegistry`] owns both pools for
//! the lifetime of a scene; [`Assembler`] and [`Reclaimer`] borrow it.

pub mod args;
mod assembler;
mod handle;
mod macros;
mod object;
pub mod pool;
mod reclaimer;
mod registry;
pub mod settings;

#[cfg(test)]
mod test_util;

pub use args::{Args, ArgsError};
pub use assembler::Assembler;
pub use handle::{Handle, Uid};
pub use object::{AsAny, Entity, Pooled, Unit};
pub use pool::{
    Attachment, EntityConfiguration, EntityId, EntityPool, Growth, PoolError, PoolSnapshot,
    Request, UnitConfiguration, UnitId, UnitPool,
};
pub use reclaimer::{ClaimMode, Reclaimer};
pub use registry::PoolRegistry;
pub use settings::{CollectionSettings, PoolSettings, RecipeBook};

pub use serde_json;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
