//! # Component: One Strongly Typed Table per Kind
//!
//! In an ECS, components are plain data: a `Position`, a `Sprite`, a
//! `TileGrid`. The store must hold *any* component type without a fixed
//! schema. Each Rust type is a component kind, and each kind gets its own
//! [`Table<T>`], a `HashMap<Entity, T>`.
//!
//! The world keeps the tables behind the object-safe [`ComponentTable`]
//! trait, keyed by [`TypeId`]. Typed access downcasts the trait object back to
//! `Table<T>` via `Any`; the operations that don't care about the value type
//! (membership tests, removing an entity's row on destroy) work directly on
//! the trait object.
//!
//! ```text
//! World.tables: HashMap<TypeId, Box<dyn ComponentTable>>
//!   TypeId(Position) → Table<Position> { #0: (1,2), #3: (5,5) }
//!   TypeId(Sprite)   → Table<Sprite>   { #0: ..., #1: ... }
//!   TypeId(TileGrid) → Table<TileGrid> { #2: ... }
//! ```
//!
//! ## Comparison
//!
//! - **hecs / bevy_ecs**: archetype tables of `BlobVec`s, fast iteration,
//!   lots of unsafe.
//! - **tessel**: one hash map per kind. Zero unsafe, O(1) add/remove without
//!   moving an entity's other components around.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use super::entity::Entity;

/// Runtime token for a component kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentKind {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
}

impl ComponentKind {
    /// The kind token for component type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Short type name, without the module path.
    pub fn name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.name())
    }
}

/// Type-erased view of a [`Table<T>`].
///
/// Users never see this; they go through [`World`](super::world::World).
pub trait ComponentTable: Any + Send + Sync {
    fn kind(&self) -> ComponentKind;
    fn contains(&self, entity: Entity) -> bool;
    /// Drop the entity's row. Returns whether there was one.
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn entities(&self) -> Box<dyn Iterator<Item = Entity> + '_>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Storage for every component of one kind.
pub struct Table<T> {
    rows: HashMap<Entity, T>,
}

impl<T: 'static + Send + Sync> Table<T> {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    /// Insert or overwrite, returning the previous value.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        self.rows.insert(entity, value)
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.rows.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.rows.get_mut(&entity)
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.rows.remove(&entity)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.rows.iter().map(|(&e, v)| (e, v))
    }
}

impl<T: 'static + Send + Sync> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static + Send + Sync> ComponentTable for Table<T> {
    fn kind(&self) -> ComponentKind {
        ComponentKind::of::<T>()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.rows.contains_key(&entity)
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.rows.remove(&entity).is_some()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn entities(&self) -> Box<dyn Iterator<Item = Entity> + '_> {
        Box::new(self.rows.keys().copied())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Downcast a type-erased table to its concrete `Table<T>`.
pub(crate) fn downcast_ref<T: 'static + Send + Sync>(table: &dyn ComponentTable) -> Option<&Table<T>> {
    table.as_any().downcast_ref::<Table<T>>()
}

/// Mutable counterpart of [`downcast_ref`].
pub(crate) fn downcast_mut<T: 'static + Send + Sync>(
    table: &mut dyn ComponentTable,
) -> Option<&mut Table<T>> {
    table.as_any_mut().downcast_mut::<Table<T>>()
}

/// Strip the module path from a fully-qualified type name, keeping only the
/// short name (e.g. `tessel::math::Position` → `Position`). Generic
/// arguments are left untouched.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}
