//! # Table-per-Kind ECS
//!
//! A deliberately small Entity Component System: entities are ids, each
//! component kind (a Rust type) owns one `entity → value` table, and queries
//! intersect those tables.
//!
//! ## Module Overview
//!
//! - [`entity`]: monotonic, never-recycled entity ids
//! - [`component`]: strongly typed tables behind a type-erased trait
//! - [`world`]: central container (entities + components + resources)
//! - [`query`]: set intersection and closure-based typed queries
//! - [`system`]: system trait and schedule runner

pub mod component;
pub mod entity;
pub mod query;
pub mod system;
pub mod world;

pub use component::{ComponentKind, ComponentTable, Table};
pub use entity::Entity;
pub use query::{ComponentKinds, QueryParam};
pub use system::{Schedule, System};
pub use world::World;
