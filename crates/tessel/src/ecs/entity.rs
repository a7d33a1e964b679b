//! # Entity: Lightweight Identifiers for Game Objects
//!
//! An [`Entity`] is just a number. It doesn't "contain" anything; the
//! [`World`](super::world::World) maps entities to their components.
//!
//! ## Design: Never Recycle
//!
//! Recycling ids after destruction makes a saved handle silently point at a
//! different entity:
//!
//! ```text
//! 1. Create entity #5
//! 2. Store a reference: saved = Entity(5)
//! 3. Destroy entity #5
//! 4. Create a new entity, gets recycled #5
//! 5. Use `saved`, now refers to the wrong entity
//! ```
//!
//! Generational indices are one fix. Ours is simpler: ids come from a
//! strictly increasing 64-bit counter and are never handed out twice. A
//! destroyed id stays dead forever, so every lookup through a stale handle
//! fails cleanly. At one entity per nanosecond the counter lasts ~584 years.
//!
//! ## Comparison
//!
//! - **hecs / bevy_ecs**: generational index + free list (recycles slots).
//! - **tessel**: monotonic counter + alive set (never recycles).

use std::collections::HashSet;
use std::fmt;

/// A lightweight handle to an entity in the [`World`](super::world::World).
///
/// Entities are created with [`World::create`](super::world::World::create)
/// and destroyed with [`World::destroy`](super::world::World::destroy).
/// Ordering follows creation order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    pub(crate) id: u64,
}

impl Entity {
    /// Build a handle from a raw id. The handle is only meaningful if the
    /// world actually issued that id; anything else is rejected with
    /// [`Error::InvalidEntity`](crate::Error::InvalidEntity).
    pub fn from_raw(id: u64) -> Self {
        Self { id }
    }

    /// Returns the raw id.
    pub fn id(self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.id)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

/// Issues entity ids and tracks which ones are alive.
///
/// ```text
/// next:  5               ← next id to hand out
/// alive: {0, 2, 4}       ← 1 and 3 were destroyed, never reissued
/// ```
pub(crate) struct EntityAllocator {
    next: u64,
    alive: HashSet<Entity>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            next: 0,
            alive: HashSet::new(),
        }
    }

    /// Allocate a fresh [`Entity`].
    pub fn allocate(&mut self) -> Entity {
        let entity = Entity { id: self.next };
        self.next += 1;
        self.alive.insert(entity);
        entity
    }

    /// Mark an entity dead.
    ///
    /// Returns `false` if it was never allocated or already dead.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        self.alive.remove(&entity)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.contains(&entity)
    }

    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }
}
