//! # Query: Finding Entities by Component Signature
//!
//! A query names a set of component kinds and yields every entity holding
//! *all* of them. There are two layers:
//!
//! - [`World::query_entities`](super::world::World::query_entities): the raw
//!   intersection, a `HashSet<Entity>`.
//! - [`World::query`](super::world::World::query): the typed, closure-based
//!   query built on top of it, handing out `&T` / `&mut T` per entity.
//!
//! ## Intersection
//!
//! ```text
//! query_entities([Position, Sprite])
//!
//! Table<Position>: {#0, #1, #3, #4}     4 rows
//! Table<Sprite>:   {#1, #4}             2 rows  ← smallest, walk this one
//!
//! #1 in Position? yes → keep
//! #4 in Position? yes → keep
//! result: {#1, #4}
//! ```
//!
//! Walking the smallest table and probing the others keeps the cost at
//! O(|smallest| × kinds) and makes argument order irrelevant. If any kind has
//! no table, or an empty one, the answer is empty without looking further.
//!
//! ## Closure-Based Typed Access
//!
//! Rust's `Iterator` can't express "yielded items borrow from the iterator".
//! Instead of unsafe pointer casts, the typed query temporarily *extracts*
//! the needed tables from the world's table map, giving owned access that
//! satisfies the borrow checker, runs the closure per matching entity, then
//! restores the tables.
//!
//! ## Comparison
//!
//! - **hecs**: `Query` trait on tuples, iterates archetypes.
//! - **tessel**: `QueryParam` trait on tuples, intersects per-kind tables.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::{ComponentKind, ComponentTable, downcast_mut, downcast_ref};
use super::entity::Entity;

type Tables = HashMap<TypeId, Box<dyn ComponentTable>>;

/// Trait for types that can be fetched from a component table.
///
/// Implemented for `&T` (shared read) and `&mut T` (exclusive write). Tuple
/// impls allow combining them: `(&A, &mut B, &C)`.
///
/// The `Column` associated type enables the extract/restore pattern: tables
/// are taken out of the world's map so the borrow checker can see that
/// independent tables don't alias.
pub trait QueryParam {
    /// The item yielded per entity.
    type Item<'w>;

    /// Owned table(s) extracted from the world.
    type Column;

    /// The component kinds this parameter needs.
    fn kinds() -> Vec<ComponentKind>;

    /// Extract the needed table(s) from the world's table map.
    ///
    /// # Panics
    ///
    /// Panics if a table is missing, which also happens when the same kind is
    /// named twice in one query.
    fn extract(tables: &mut Tables) -> Self::Column;

    /// Put the table(s) back.
    fn restore(col: Self::Column, tables: &mut Tables);

    /// Fetch the item for one entity. The entity must be present in every
    /// extracted table.
    fn fetch(col: &mut Self::Column, entity: Entity) -> Self::Item<'_>;
}

fn take_table<T: 'static>(tables: &mut Tables) -> (TypeId, Box<dyn ComponentTable>) {
    let tid = TypeId::of::<T>();
    let table = tables.remove(&tid).unwrap_or_else(|| {
        panic!(
            "Query extract: table for `{}` not found (is it named twice?)",
            std::any::type_name::<T>()
        )
    });
    (tid, table)
}

fn fetch_panic<T>(entity: Entity) -> ! {
    panic!(
        "Query fetch: {entity:?} has no `{}` row",
        std::any::type_name::<T>()
    )
}

/// Shared read access to a component.
impl<T: 'static + Send + Sync> QueryParam for &T {
    type Item<'w> = &'w T;
    type Column = (TypeId, Box<dyn ComponentTable>);

    fn kinds() -> Vec<ComponentKind> {
        vec![ComponentKind::of::<T>()]
    }

    fn extract(tables: &mut Tables) -> Self::Column {
        take_table::<T>(tables)
    }

    fn restore(col: Self::Column, tables: &mut Tables) {
        tables.insert(col.0, col.1);
    }

    fn fetch(col: &mut Self::Column, entity: Entity) -> Self::Item<'_> {
        downcast_ref::<T>(col.1.as_ref())
            .and_then(|t| t.get(entity))
            .unwrap_or_else(|| fetch_panic::<T>(entity))
    }
}

/// Exclusive write access to a component.
impl<T: 'static + Send + Sync> QueryParam for &mut T {
    type Item<'w> = &'w mut T;
    type Column = (TypeId, Box<dyn ComponentTable>);

    fn kinds() -> Vec<ComponentKind> {
        vec![ComponentKind::of::<T>()]
    }

    fn extract(tables: &mut Tables) -> Self::Column {
        take_table::<T>(tables)
    }

    fn restore(col: Self::Column, tables: &mut Tables) {
        tables.insert(col.0, col.1);
    }

    fn fetch(col: &mut Self::Column, entity: Entity) -> Self::Item<'_> {
        downcast_mut::<T>(col.1.as_mut())
            .and_then(|t| t.get_mut(entity))
            .unwrap_or_else(|| fetch_panic::<T>(entity))
    }
}

/// Implement `QueryParam` for tuples of params.
///
/// This lets you write `world.query::<(&A, &mut B)>(|e, (a, b)| { ... })`.
macro_rules! impl_query_param_tuple {
    ($($P:ident),+) => {
        impl<$($P: QueryParam),+> QueryParam for ($($P,)+) {
            type Item<'w> = ($($P::Item<'w>,)+);
            type Column = ($($P::Column,)+);

            fn kinds() -> Vec<ComponentKind> {
                let mut kinds = Vec::new();
                $(kinds.extend($P::kinds());)+
                kinds
            }

            #[allow(non_snake_case)]
            fn extract(tables: &mut Tables) -> Self::Column {
                ($($P::extract(tables),)+)
            }

            #[allow(non_snake_case)]
            fn restore(col: Self::Column, tables: &mut Tables) {
                let ($($P,)+) = col;
                $($P::restore($P, tables);)+
            }

            #[allow(non_snake_case)]
            fn fetch(col: &mut Self::Column, entity: Entity) -> Self::Item<'_> {
                let ($($P,)+) = col;
                ($($P::fetch($P, entity),)+)
            }
        }
    };
}

impl_query_param_tuple!(A);
impl_query_param_tuple!(A, B);
impl_query_param_tuple!(A, B, C);
impl_query_param_tuple!(A, B, C, D);
impl_query_param_tuple!(A, B, C, D, E);
impl_query_param_tuple!(A, B, C, D, E, F);
impl_query_param_tuple!(A, B, C, D, E, F, G);
impl_query_param_tuple!(A, B, C, D, E, F, G, H);

/// Tables extracted for one typed query. They go back into the world's map
/// when this is dropped, including while unwinding from a panicking closure.
pub(crate) struct Extracted<'t, Q: QueryParam> {
    cols: Option<Q::Column>,
    tables: &'t mut Tables,
}

impl<'t, Q: QueryParam> Extracted<'t, Q> {
    /// Take `Q`'s tables out of `tables`. Every kind must be present exactly
    /// once; see [`check_unique`].
    pub(crate) fn new(tables: &'t mut Tables) -> Self {
        let cols = Q::extract(tables);
        Self {
            cols: Some(cols),
            tables,
        }
    }

    pub(crate) fn fetch(&mut self, entity: Entity) -> Option<Q::Item<'_>> {
        self.cols.as_mut().map(|cols| Q::fetch(cols, entity))
    }
}

impl<Q: QueryParam> Drop for Extracted<'_, Q> {
    fn drop(&mut self) {
        if let Some(cols) = self.cols.take() {
            Q::restore(cols, self.tables);
        }
    }
}

/// Panic if a kind appears twice, before anything is extracted.
pub(crate) fn check_unique(kinds: &[ComponentKind]) {
    for (i, kind) in kinds.iter().enumerate() {
        if kinds[..i].contains(kind) {
            panic!("Query: component `{}` is named twice", kind.name());
        }
    }
}

/// A tuple of component types, used to name a signature without values:
/// `world.query_entities_of::<(Position, Sprite)>()`.
pub trait ComponentKinds {
    fn kinds() -> Vec<ComponentKind>;
}

impl ComponentKinds for () {
    fn kinds() -> Vec<ComponentKind> {
        Vec::new()
    }
}

macro_rules! impl_component_kinds_tuple {
    ($($T:ident),+) => {
        impl<$($T: 'static),+> ComponentKinds for ($($T,)+) {
            fn kinds() -> Vec<ComponentKind> {
                vec![$(ComponentKind::of::<$T>()),+]
            }
        }
    };
}

impl_component_kinds_tuple!(A);
impl_component_kinds_tuple!(A, B);
impl_component_kinds_tuple!(A, B, C);
impl_component_kinds_tuple!(A, B, C, D);
impl_component_kinds_tuple!(A, B, C, D, E);
impl_component_kinds_tuple!(A, B, C, D, E, F);
impl_component_kinds_tuple!(A, B, C, D, E, F, G);
impl_component_kinds_tuple!(A, B, C, D, E, F, G, H);

/// Intersect the entity sets of `kinds`, walking the smallest table.
pub(crate) fn intersect(tables: &Tables, kinds: &[ComponentKind]) -> Vec<Entity> {
    let mut selected: Vec<&dyn ComponentTable> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        match tables.get(&kind.id) {
            Some(table) if !table.is_empty() => selected.push(table.as_ref()),
            _ => return Vec::new(),
        }
    }

    selected.sort_by_key(|t| t.len());
    let Some((smallest, rest)) = selected.split_first() else {
        return Vec::new();
    };

    smallest
        .entities()
        .filter(|&e| rest.iter().all(|t| t.contains(e)))
        .collect()
}
