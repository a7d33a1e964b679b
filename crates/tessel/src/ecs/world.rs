//! # World: The Central Container
//!
//! The [`World`] owns all entities, components, and resources. It's the single
//! source of truth for the game state, and it is passed explicitly (`&mut`)
//! into every system.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ World                                               │
//! │                                                     │
//! │  EntityAllocator: monotonic ids + alive set         │
//! │                                                     │
//! │  tables: HashMap<TypeId, Box<dyn ComponentTable>>   │
//! │    one Table<T> (entity → value) per component kind │
//! │                                                     │
//! │  resources: HashMap<TypeId, Box<dyn Any>>           │
//! │    singleton data not tied to an entity             │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! A table is created the first time any entity receives a component of its
//! kind, and it stays around (possibly empty) afterwards.
//!
//! ## Errors vs. Absence
//!
//! Addressing an entity that was never created, or was destroyed, through
//! [`World::set`] or [`World::destroy`] fails with
//! [`Error::InvalidEntity`]. Asking for a component that isn't there is not a
//! failure: [`World::get`] returns `None`, [`World::all`] is empty.
//!
//! ## Resources
//!
//! Resources are "global" data like [`Time`](crate::time::Time), the input
//! state, or the camera. They're stored as type-erased `Box<dyn Any>`, which
//! is simpler than making them entities with special components.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};

use super::component::{ComponentKind, ComponentTable, Table, downcast_mut, downcast_ref};
use super::entity::{Entity, EntityAllocator};
use super::query::{ComponentKinds, Extracted, QueryParam, check_unique, intersect};
use crate::error::{Error, Result};

/// The ECS world: entities, their components, and global resources.
pub struct World {
    allocator: EntityAllocator,
    tables: HashMap<TypeId, Box<dyn ComponentTable>>,
    resources: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            tables: HashMap::new(),
            resources: HashMap::new(),
        }
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Insert a resource (singleton value). Replaces any existing resource of
    /// the same type.
    pub fn insert_resource<T: 'static + Send + Sync>(&mut self, value: T) {
        self.resources.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a shared reference to a resource.
    ///
    /// # Panics
    ///
    /// Panics if the resource hasn't been inserted.
    pub fn resource<T: 'static + Send + Sync>(&self) -> &T {
        self.get_resource::<T>().unwrap_or_else(|| {
            panic!(
                "Resource `{}` not found. Did you forget to insert it?",
                std::any::type_name::<T>()
            )
        })
    }

    /// Get a mutable reference to a resource.
    ///
    /// # Panics
    ///
    /// Panics if the resource hasn't been inserted.
    pub fn resource_mut<T: 'static + Send + Sync>(&mut self) -> &mut T {
        self.get_resource_mut::<T>().unwrap_or_else(|| {
            panic!(
                "Resource `{}` not found. Did you forget to insert it?",
                std::any::type_name::<T>()
            )
        })
    }

    /// Try to get a shared reference to a resource. Returns `None` if not found.
    pub fn get_resource<T: 'static + Send + Sync>(&self) -> Option<&T> {
        self.resources
            .get(&TypeId::of::<T>())
            .and_then(|r| r.downcast_ref::<T>())
    }

    /// Try to get a mutable reference to a resource. Returns `None` if not found.
    pub fn get_resource_mut<T: 'static + Send + Sync>(&mut self) -> Option<&mut T> {
        self.resources
            .get_mut(&TypeId::of::<T>())
            .and_then(|r| r.downcast_mut::<T>())
    }

    pub fn has_resource<T: 'static + Send + Sync>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<T>())
    }

    /// Remove a resource, taking ownership. Returns `None` if not present.
    ///
    /// Use this for the extract/reinsert pattern when you need to borrow a
    /// resource while also borrowing the world mutably.
    pub fn resource_remove<T: 'static + Send + Sync>(&mut self) -> Option<T> {
        self.resources
            .remove(&TypeId::of::<T>())
            .and_then(|r| r.downcast::<T>().ok())
            .map(|b| *b)
    }

    // ── Entity Management ────────────────────────────────────────────

    /// Create an entity with no components. The id has never been issued
    /// before and never will be again.
    pub fn create(&mut self) -> Entity {
        self.allocator.allocate()
    }

    /// Destroy an entity, removing its row from every component table.
    ///
    /// Subsequent queries no longer return it and [`get`](Self::get) returns
    /// `None`. GPU buffers held by its components are not released here; the
    /// next frame reclaims them (see
    /// [`reclaim_orphaned_meshes`](crate::render2d::tilemap::reclaim_orphaned_meshes)),
    /// or use [`retire_layer`](crate::render2d::tilemap::retire_layer) to free
    /// them immediately.
    pub fn destroy(&mut self, entity: Entity) -> Result<()> {
        if !self.allocator.deallocate(entity) {
            return Err(Error::InvalidEntity(entity));
        }
        for table in self.tables.values_mut() {
            table.remove_entity(entity);
        }
        log::trace!("destroyed {entity:?}");
        Ok(())
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    // ── Per-Entity Component Access ──────────────────────────────────

    /// Attach `value` to `entity`, overwriting any existing component of the
    /// same kind. Returns the overwritten value.
    pub fn set<T: 'static + Send + Sync>(&mut self, entity: Entity, value: T) -> Result<Option<T>> {
        if !self.is_alive(entity) {
            return Err(Error::InvalidEntity(entity));
        }
        Ok(self.table_or_insert::<T>().insert(entity, value))
    }

    /// Get a shared reference to a component. `None` if the entity is dead or
    /// lacks it.
    pub fn get<T: 'static + Send + Sync>(&self, entity: Entity) -> Option<&T> {
        self.table::<T>()?.get(entity)
    }

    /// Get a mutable reference to a component.
    pub fn get_mut<T: 'static + Send + Sync>(&mut self, entity: Entity) -> Option<&mut T> {
        self.table_mut::<T>()?.get_mut(entity)
    }

    /// Like [`get`](Self::get), but reports absence as
    /// [`Error::MissingComponent`]. Use it where a query has already
    /// guaranteed the component should be there.
    pub fn component<T: 'static + Send + Sync>(&self, entity: Entity) -> Result<&T> {
        self.get::<T>(entity).ok_or_else(|| missing::<T>(entity))
    }

    /// Mutable counterpart of [`component`](Self::component).
    pub fn component_mut<T: 'static + Send + Sync>(&mut self, entity: Entity) -> Result<&mut T> {
        self.get_mut::<T>(entity).ok_or_else(|| missing::<T>(entity))
    }

    /// Detach and return a component. No-op (returns `None`) if it isn't
    /// there, including for dead entities.
    pub fn remove<T: 'static + Send + Sync>(&mut self, entity: Entity) -> Option<T> {
        self.table_mut::<T>()?.remove(entity)
    }

    pub fn has<T: 'static + Send + Sync>(&self, entity: Entity) -> bool {
        self.table::<T>().is_some_and(|t| t.contains(entity))
    }

    /// Every value of kind `T`. Lazy, finite, and restartable by calling
    /// again; order is unspecified.
    pub fn all<T: 'static + Send + Sync>(&self) -> impl Iterator<Item = &T> {
        self.table::<T>().into_iter().flat_map(|t| t.values())
    }

    /// Every `(entity, value)` pair of kind `T`.
    pub fn iter<T: 'static + Send + Sync>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.table::<T>().into_iter().flat_map(|t| t.iter())
    }

    /// Number of entities holding a `T`.
    pub fn count<T: 'static + Send + Sync>(&self) -> usize {
        self.table::<T>().map_or(0, |t| t.len())
    }

    fn table<T: 'static + Send + Sync>(&self) -> Option<&Table<T>> {
        self.tables
            .get(&TypeId::of::<T>())
            .and_then(|t| downcast_ref::<T>(t.as_ref()))
    }

    fn table_mut<T: 'static + Send + Sync>(&mut self) -> Option<&mut Table<T>> {
        self.tables
            .get_mut(&TypeId::of::<T>())
            .and_then(|t| downcast_mut::<T>(t.as_mut()))
    }

    fn table_or_insert<T: 'static + Send + Sync>(&mut self) -> &mut Table<T> {
        let table = self
            .tables
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Table::<T>::new()));
        downcast_mut::<T>(table.as_mut()).unwrap_or_else(|| {
            panic!(
                "table for `{}` holds a different type",
                std::any::type_name::<T>()
            )
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Entities holding every one of `kinds`. Empty when `kinds` is empty or
    /// any kind has no (or an empty) table. Order is unspecified.
    pub fn query_entities(&self, kinds: &[ComponentKind]) -> HashSet<Entity> {
        intersect(&self.tables, kinds).into_iter().collect()
    }

    /// Typed form of [`query_entities`](Self::query_entities):
    /// `world.query_entities_of::<(Position, Sprite)>()`.
    pub fn query_entities_of<K: ComponentKinds>(&self) -> HashSet<Entity> {
        self.query_entities(&K::kinds())
    }

    /// Query entities matching the given component types.
    ///
    /// The closure receives `(Entity, Q::Item)` for each matching entity, in
    /// ascending entity order.
    ///
    /// # Example
    ///
    /// ```ignore
    /// world.query::<(&PlayerInput, &mut Position)>(|_, (input, pos)| {
    ///     pos.0.x += input.move_speed * dt;
    /// });
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the same component kind appears twice in `Q`. The world's
    /// tables are restored even if `f` panics.
    pub fn query<Q: QueryParam>(&mut self, mut f: impl FnMut(Entity, Q::Item<'_>)) {
        let kinds = Q::kinds();
        check_unique(&kinds);
        let mut matches = intersect(&self.tables, &kinds);
        if matches.is_empty() {
            return;
        }
        matches.sort_unstable();

        let mut cols = Extracted::<Q>::new(&mut self.tables);
        for &entity in &matches {
            if let Some(item) = cols.fetch(entity) {
                f(entity, item);
            }
        }
    }
}

fn missing<T>(entity: Entity) -> Error {
    Error::MissingComponent {
        entity,
        component: super::component::short_type_name(std::any::type_name::<T>()),
    }
}
