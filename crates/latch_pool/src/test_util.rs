//! Behaviors and fixtures shared by the unit tests.

use crate::{Args, ArgsError, Entity, EntityId, PoolRegistry, Pooled, Unit};
use std::cell::Cell;
use std::rc::Rc;

/// Counts `destroy` calls across every instance sharing it.
#[derive(Clone, Default)]
pub(crate) struct DestroyLog(Rc<Cell<u32>>);

impl DestroyLog {
    pub(crate) fn count(&self) -> u32 {
        self.0.get()
    }
}

#[derive(Default)]
pub(crate) struct Body {
    pub(crate) container: bool,
    pub(crate) args: Args,
    pub(crate) resets: u32,
    pub(crate) recycles: u32,
    pub(crate) started: bool,
    pub(crate) updates: u32,
    pub(crate) draws: Cell<u32>,
    destroy_log: Option<DestroyLog>,
}

impl Body {
    pub(crate) fn leaf() -> Self {
        Self::default()
    }

    pub(crate) fn container() -> Self {
        Self {
            container: true,
            ..Self::default()
        }
    }

    pub(crate) fn with_destroy_log(mut self, log: &DestroyLog) -> Self {
        self.destroy_log = Some(log.clone());
        self
    }
}

impl Pooled for Body {
    fn reset(&mut self) {
        self.resets += 1;
        self.args = Args::new();
        self.started = false;
        self.updates = 0;
    }

    fn configure(&mut self, args: &Args) -> Result<(), ArgsError> {
        self.args = args.clone();
        args.value::<f64>("speed")?;
        Ok(())
    }

    fn recycle(&mut self) {
        self.recycles += 1;
    }

    fn destroy(&mut self) {
        if let Some(log) = &self.destroy_log {
            log.0.set(log.0.get() + 1);
        }
    }
}

impl Entity for Body {
    fn is_container(&self) -> bool {
        self.container
    }

    fn start(&mut self) {
        self.started = true;
    }

    fn update(&mut self, _dt: f32) {
        self.updates += 1;
    }

    fn draw(&self) {
        self.draws.set(self.draws.get() + 1);
    }
}

/// An entity type nothing is ever built from.
pub(crate) struct Dummy;

impl Pooled for Dummy {}

impl Entity for Dummy {}

#[derive(Default)]
pub(crate) struct Part {
    pub(crate) args: Args,
    pub(crate) owner: Option<EntityId>,
    pub(crate) started: bool,
    pub(crate) updates: u32,
    pub(crate) draws: Cell<u32>,
}

impl Pooled for Part {
    fn reset(&mut self) {
        self.args = Args::new();
        self.started = false;
        self.updates = 0;
    }

    fn configure(&mut self, args: &Args) -> Result<(), ArgsError> {
        self.args = args.clone();
        args.value::<f64>("speed")?;
        Ok(())
    }
}

impl Unit for Part {
    fn attached(&mut self, owner: EntityId) {
        self.owner = Some(owner);
    }

    fn detached(&mut self) {
        self.owner = None;
    }

    fn start(&mut self) {
        self.started = true;
    }

    fn update(&mut self, _dt: f32) {
        self.updates += 1;
    }

    fn draw(&self) {
        self.draws.set(self.draws.get() + 1);
    }
}

pub(crate) fn entity_recipe<T: Entity>(make: fn() -> T) -> impl Fn() -> Box<dyn Entity> {
    move || Box::new(make()) as Box<dyn Entity>
}

pub(crate) fn unit_recipe<T: Unit>(make: fn() -> T) -> impl Fn() -> Box<dyn Unit> {
    move || Box::new(make()) as Box<dyn Unit>
}

/// A small scene:
///
/// - `Ship`: container, capped at 2
/// - `Rock`: leaf, capped at 2
/// - `Turret`: leaf, child-only
/// - `fighter`: a `Ship` with `engine` + `shield` units, a `turret` child and
///   a `sprite` renderer
pub(crate) fn scene() -> PoolRegistry {
    let mut registry = PoolRegistry::new();

    let entities = registry.entities_mut();
    entities
        .create_collection("Ship", entity_recipe(Body::container), 2)
        .unwrap();
    entities
        .create_collection("Rock", entity_recipe(Body::leaf), 2)
        .unwrap();
    entities
        .create_collection("Turret", entity_recipe(Body::leaf), 0)
        .unwrap();
    entities
        .create_configuration("fighter", "Ship")
        .with_unit("engine", None)
        .with_unit("shield", Some(crate::args! { "strength" => 5 }))
        .with_child("turret", None)
        .with_renderer("sprite", None);
    entities.create_configuration("turret", "Turret");
    entities.create_configuration("rock", "Rock");

    let units = registry.units_mut();
    units
        .create_collection("Engine", unit_recipe(Part::default), 0)
        .unwrap();
    units
        .create_collection("Sprite", unit_recipe(Part::default), 1)
        .unwrap();
    units.create_configuration("engine", "Engine");
    units
        .create_configuration("shield", "Engine")
        .with_args(crate::args! { "strength" => 1, "color" => "blue" });
    units.create_configuration("sprite", "Sprite");

    registry
}
