//! Generic object pool shared by the entity and unit pools.
//!
//! A pool owns a set of named collections. Each collection has a recipe that
//! constructs new instances, an idle list, an active list and an optional
//! maximum instance count. Objects live in the pool's slot table for as long
//! as the pool is not cleared; callers only ever hold [`Handle`]s.
//!
//! Every slot carries a generation that is bumped when its object is
//! released, so a handle only ever refers to one life of an object.

mod entity_pool;
mod error;
mod snapshot;
mod unit_pool;

pub use entity_pool::{Attachment, EntityConfiguration, EntityId, EntityKind, EntityPool};
pub use error::PoolError;
pub use snapshot::{CollectionSnapshot, PoolSnapshot};
pub use unit_pool::{UnitConfiguration, UnitId, UnitKind, UnitPool};

use crate::{Handle, PoolRegistry, Pooled, Uid};
use indexmap::map::Entry;
use indexmap::IndexMap;
use latch_metrics::{ChurnCounter, ChurnEvent};
use tracing::{debug, info, trace, warn};

/// Specialization hooks supplied by the entity and unit pools.
pub trait PoolKind: 'static {
    /// Behavior trait object stored in the pool.
    type Object: Pooled + ?Sized;
    /// Tree bookkeeping kept next to each object.
    type Links: Default;
    /// Shape of a named configuration.
    type Configuration;

    /// Human-readable pool name for errors and logs.
    const NAME: &'static str;

    /// Capacity fixed when a collection is created with `initial_amount`
    /// instances. `None` means unbounded-dynamic.
    fn max_amount_for(initial_amount: usize) -> Option<usize>;
}

/// Whether an entity is requested by a caller or as a child of another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Direct,
    Nested,
}

/// Whether capped collections may construct past their maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    Capped,
    Unbounded,
}

/// One-shot callback run when an object emits its recycle notification.
pub type RecycleListener<K> =
    Box<dyn FnOnce(&mut PoolRegistry, Handle<K>) -> Result<(), PoolError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Active,
}

pub(crate) struct Slot<K: PoolKind> {
    pub(crate) object: Box<K::Object>,
    generation: u32,
    pub(crate) pool_id: String,
    pub(crate) type_id: Option<String>,
    pub(crate) uid: Option<Uid>,
    pub(crate) state: SlotState,
    pub(crate) links: K::Links,
    listeners: Vec<RecycleListener<K>>,
}

struct Collection<K: PoolKind> {
    recipe: Box<dyn Fn() -> Box<K::Object>>,
    idle: Vec<Handle<K>>,
    active: Vec<Handle<K>>,
    max_amount: Option<usize>,
}

impl<K: PoolKind> Collection<K> {
    fn total(&self) -> usize {
        self.idle.len() + self.active.len()
    }
}

fn collection_not_found<K: PoolKind>(alias: &str) -> PoolError {
    PoolError::CollectionNotFound {
        pool: K::NAME,
        alias: alias.to_string(),
    }
}

/// Registry of reusable object collections plus named configurations.
pub struct Pool<K: PoolKind> {
    collections: IndexMap<String, Collection<K>>,
    configurations: IndexMap<String, K::Configuration>,
    slots: Vec<Slot<K>>,
    /// Starting generation for slots constructed after the last clear.
    generation: u32,
    churn: ChurnCounter,
}

impl<K: PoolKind> Pool<K> {
    pub fn new() -> Self {
        Self {
            collections: IndexMap::new(),
            configurations: IndexMap::new(),
            slots: Vec::new(),
            generation: 0,
            churn: ChurnCounter::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        K::NAME
    }

    /// Register a collection and eagerly construct `initial_amount` instances.
    ///
    /// The kind's capacity policy decides whether `initial_amount` also
    /// becomes the collection's maximum.
    pub fn create_collection<F>(
        &mut self,
        alias: impl Into<String>,
        recipe: F,
        initial_amount: usize,
    ) -> Result<(), PoolError>
    where
        F: Fn() -> Box<K::Object> + 'static,
    {
        let alias = alias.into();
        let max_amount = K::max_amount_for(initial_amount);
        match self.collections.entry(alias.clone()) {
            Entry::Occupied(_) => {
                return Err(PoolError::DuplicateCollection {
                    pool: K::NAME,
                    alias,
                })
            }
            Entry::Vacant(v) => {
                v.insert(Collection {
                    recipe: Box::new(recipe),
                    idle: Vec::with_capacity(initial_amount),
                    active: Vec::with_capacity(initial_amount),
                    max_amount,
                });
            }
        }

        for _ in 0..initial_amount {
            self.create_pooled_instance(&alias)?;
        }

        debug!(
            pool = K::NAME,
            alias = %alias,
            initial_amount,
            max_amount = ?max_amount,
            "created collection"
        );
        Ok(())
    }

    /// Construct one instance from the collection's recipe and park it idle.
    pub fn create_pooled_instance(&mut self, alias: &str) -> Result<Handle<K>, PoolError> {
        let collection = self
            .collections
            .get_mut(alias)
            .ok_or_else(|| collection_not_found::<K>(alias))?;

        let handle = Handle::new(self.slots.len() as u32, self.generation);
        let object = (collection.recipe)();
        collection.idle.push(handle);
        self.slots.push(Slot {
            object,
            generation: self.generation,
            pool_id: alias.to_string(),
            type_id: None,
            uid: None,
            state: SlotState::Idle,
            links: K::Links::default(),
            listeners: Vec::new(),
        });
        self.churn.record(alias, ChurnEvent::Created);
        trace!(pool = K::NAME, alias, %handle, "constructed pooled instance");
        Ok(handle)
    }

    /// Construct past a capped collection's maximum, raising the cap to match.
    pub(crate) fn grow(&mut self, alias: &str) -> Result<Handle<K>, PoolError> {
        let handle = self.create_pooled_instance(alias)?;
        let collection = self
            .collections
            .get_mut(alias)
            .ok_or_else(|| collection_not_found::<K>(alias))?;
        if let Some(max_amount) = collection.max_amount.as_mut() {
            *max_amount = collection.idle.len() + collection.active.len();
            warn!(
                pool = K::NAME,
                alias,
                max_amount = *max_amount,
                "capped collection grew past its initial amount"
            );
        }
        Ok(handle)
    }

    /// Move one idle instance to the active list.
    ///
    /// Uncapped collections construct an instance when none is idle; capped
    /// ones fail with [`PoolError::PoolExhausted`].
    pub fn acquire(&mut self, alias: &str) -> Result<Handle<K>, PoolError> {
        let collection = self
            .collections
            .get(alias)
            .ok_or_else(|| collection_not_found::<K>(alias))?;
        if collection.idle.is_empty() {
            if let Some(max_amount) = collection.max_amount {
                return Err(PoolError::PoolExhausted {
                    pool: K::NAME,
                    alias: alias.to_string(),
                    max_amount,
                });
            }
            self.create_pooled_instance(alias)?;
        }

        let collection = self
            .collections
            .get_mut(alias)
            .ok_or_else(|| collection_not_found::<K>(alias))?;
        let handle = match collection.idle.pop() {
            Some(handle) => handle,
            None => return Err(collection_not_found::<K>(alias)),
        };
        collection.active.push(handle);
        self.slots[handle.index() as usize].state = SlotState::Active;

        self.churn.record(alias, ChurnEvent::Acquired);
        trace!(pool = K::NAME, alias, %handle, "acquired");
        Ok(handle)
    }

    /// Return an active instance to its collection's idle list.
    ///
    /// `handle` goes stale: the slot's generation is bumped and the idle
    /// list receives a fresh handle for the next life. Releasing an instance
    /// that is already idle is a logic error and is reported as
    /// [`PoolError::AlreadyIdle`] instead of corrupting the lists.
    pub fn release(&mut self, handle: Handle<K>) -> Result<(), PoolError> {
        let slot = self.slot_mut(handle)?;
        if slot.state == SlotState::Idle {
            return Err(PoolError::AlreadyIdle {
                pool: K::NAME,
                handle: handle.to_string(),
            });
        }
        slot.state = SlotState::Idle;
        slot.listeners.clear();
        slot.links = K::Links::default();
        slot.generation = slot.generation.wrapping_add(1);
        let next = Handle::new(handle.index(), slot.generation);
        let alias = slot.pool_id.clone();

        let collection = self
            .collections
            .get_mut(&alias)
            .ok_or_else(|| collection_not_found::<K>(&alias))?;
        if let Some(position) = collection.active.iter().position(|h| *h == handle) {
            collection.active.remove(position);
        }
        collection.idle.push(next);

        self.churn.record(&alias, ChurnEvent::Released);
        trace!(pool = K::NAME, alias = %alias, %handle, "released");
        Ok(())
    }

    /// Tear down every idle and active instance and forget all collections
    /// and configurations. Outstanding handles become stale.
    pub fn clear(&mut self) {
        latch_metrics::metrics! {
            let churn = self.churn.total();
            debug!(
                pool = K::NAME,
                created = churn.created,
                acquired = churn.acquired,
                released = churn.released,
                "churn before clear"
            );
        }

        for slot in &mut self.slots {
            slot.object.destroy();
            self.churn.record(&slot.pool_id, ChurnEvent::Destroyed);
        }
        let destroyed = self.slots.len();
        // Past every generation handed out so far.
        let newest = self
            .slots
            .iter()
            .map(|slot| slot.generation)
            .fold(self.generation, u32::max);

        self.slots.clear();
        self.collections.clear();
        self.configurations.clear();
        self.generation = newest.wrapping_add(1);

        info!(pool = K::NAME, destroyed, generation = self.generation, "cleared pool");
    }

    /// Subscribe a one-shot listener to the object's recycle notification.
    pub fn on_recycle<F>(&mut self, handle: Handle<K>, listener: F) -> Result<(), PoolError>
    where
        F: FnOnce(&mut PoolRegistry, Handle<K>) -> Result<(), PoolError> + 'static,
    {
        self.slot_mut(handle)?.listeners.push(Box::new(listener));
        Ok(())
    }

    pub(crate) fn take_recycle_listeners(
        &mut self,
        handle: Handle<K>,
    ) -> Result<Vec<RecycleListener<K>>, PoolError> {
        Ok(std::mem::take(&mut self.slot_mut(handle)?.listeners))
    }

    /// Start a new life: reset the object, stamp a fresh uid and the
    /// configuration alias it is assembled from.
    pub(crate) fn prepare(&mut self, handle: Handle<K>, type_id: &str) -> Result<Uid, PoolError> {
        let slot = self.slot_mut(handle)?;
        let uid = Uid::next();
        slot.object.reset();
        slot.uid = Some(uid);
        slot.type_id = Some(type_id.to_string());
        slot.links = K::Links::default();
        slot.listeners.clear();
        Ok(uid)
    }

    pub fn configuration(&self, alias: &str) -> Result<&K::Configuration, PoolError> {
        self.configurations
            .get(alias)
            .ok_or_else(|| PoolError::ConfigurationNotFound {
                pool: K::NAME,
                alias: alias.to_string(),
            })
    }

    pub fn configurations(&self) -> impl Iterator<Item = (&str, &K::Configuration)> {
        self.configurations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Register (or replace) a configuration under `alias`.
    pub(crate) fn store_configuration(
        &mut self,
        alias: String,
        configuration: K::Configuration,
    ) -> &mut K::Configuration {
        debug!(pool = K::NAME, alias = %alias, "registered configuration");
        match self.configurations.entry(alias) {
            Entry::Occupied(mut o) => {
                o.insert(configuration);
                o.into_mut()
            }
            Entry::Vacant(v) => v.insert(configuration),
        }
    }

    pub fn contains_collection(&self, alias: &str) -> bool {
        self.collections.contains_key(alias)
    }

    pub fn max_amount(&self, alias: &str) -> Result<Option<usize>, PoolError> {
        self.collections
            .get(alias)
            .map(|c| c.max_amount)
            .ok_or_else(|| collection_not_found::<K>(alias))
    }

    pub fn idle_count(&self, alias: &str) -> Result<usize, PoolError> {
        self.collections
            .get(alias)
            .map(|c| c.idle.len())
            .ok_or_else(|| collection_not_found::<K>(alias))
    }

    /// Number of instances ever constructed for `alias` since the last clear.
    pub fn total(&self, alias: &str) -> Result<usize, PoolError> {
        self.collections
            .get(alias)
            .map(|c| c.total())
            .ok_or_else(|| collection_not_found::<K>(alias))
    }

    /// Active instances of `alias`, oldest first. Unknown aliases are empty.
    pub fn active(&self, alias: &str) -> &[Handle<K>] {
        self.collections
            .get(alias)
            .map(|c| c.active.as_slice())
            .unwrap_or(&[])
    }

    /// The active-object index: every alias with its active instances.
    pub fn active_index(&self) -> impl Iterator<Item = (&str, &[Handle<K>])> {
        self.collections
            .iter()
            .map(|(alias, c)| (alias.as_str(), c.active.as_slice()))
    }

    pub fn is_active(&self, handle: Handle<K>) -> bool {
        self.slot(handle)
            .map(|slot| slot.state == SlotState::Active)
            .unwrap_or(false)
    }

    pub fn state(&self, handle: Handle<K>) -> Result<SlotState, PoolError> {
        Ok(self.slot(handle)?.state)
    }

    /// Collection alias the object returns to.
    pub fn pool_id(&self, handle: Handle<K>) -> Result<&str, PoolError> {
        Ok(self.slot(handle)?.pool_id.as_str())
    }

    /// Configuration alias of the object's current life.
    pub fn type_id(&self, handle: Handle<K>) -> Option<&str> {
        self.slot(handle).ok()?.type_id.as_deref()
    }

    pub fn uid(&self, handle: Handle<K>) -> Option<Uid> {
        self.slot(handle).ok()?.uid
    }

    pub fn object(&self, handle: Handle<K>) -> Result<&K::Object, PoolError> {
        Ok(&*self.slot(handle)?.object)
    }

    pub fn object_mut(&mut self, handle: Handle<K>) -> Result<&mut K::Object, PoolError> {
        Ok(&mut *self.slot_mut(handle)?.object)
    }

    pub(crate) fn slot(&self, handle: Handle<K>) -> Result<&Slot<K>, PoolError> {
        match self.slots.get(handle.index() as usize) {
            Some(slot) if slot.generation == handle.generation() => Ok(slot),
            _ => Err(self.stale(handle)),
        }
    }

    pub(crate) fn slot_mut(&mut self, handle: Handle<K>) -> Result<&mut Slot<K>, PoolError> {
        let index = handle.index() as usize;
        let live = self
            .slots
            .get(index)
            .is_some_and(|slot| slot.generation == handle.generation());
        if !live {
            return Err(self.stale(handle));
        }
        Ok(&mut self.slots[index])
    }

    fn stale(&self, handle: Handle<K>) -> PoolError {
        PoolError::StaleHandle {
            pool: K::NAME,
            handle: handle.to_string(),
        }
    }

    /// Per-alias idle/active/total counts, for debugging.
    pub fn snapshot(&self) -> PoolSnapshot {
        let collections: IndexMap<String, CollectionSnapshot> = self
            .collections
            .iter()
            .map(|(alias, c)| {
                (
                    alias.clone(),
                    CollectionSnapshot {
                        pooled: c.idle.len(),
                        active: c.active.len(),
                        total: c.total(),
                        max_amount: c.max_amount,
                    },
                )
            })
            .collect();
        let total = collections.values().map(|c| c.total).sum();

        PoolSnapshot {
            name: K::NAME,
            collections,
            total,
        }
    }

    /// Lifecycle counters (all zero without the `metrics` feature).
    pub fn churn(&self) -> &ChurnCounter {
        &self.churn
    }
}

impl<K: PoolKind> Default for Pool<K> {
    fn default() -> Self {
        Self::new()
    }
}
