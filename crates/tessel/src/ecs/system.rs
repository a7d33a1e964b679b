//! # System: Functions That Operate on the World
//!
//! A system is a function that takes `&mut World` and does something with
//! it: query entities, modify components, read resources.
//!
//! - A system is `FnMut(&mut World)`.
//! - Systems run in the order they're added.
//! - No parallelism. The frame loop is single-threaded.
//!
//! The external frame loop owns the [`Schedule`] and calls
//! [`run`](Schedule::run) once per frame, between clearing the screen and
//! presenting it.

use super::world::World;

/// A system that can be executed on a [`World`].
///
/// Any `FnMut(&mut World)` implements this trait, so you can use closures or
/// function pointers directly.
pub trait System {
    fn run(&mut self, world: &mut World);
}

impl<F: FnMut(&mut World)> System for F {
    fn run(&mut self, world: &mut World) {
        (self)(world);
    }
}

struct NamedSystem {
    name: String,
    system: Box<dyn System>,
}

/// An ordered list of systems to run.
pub struct Schedule {
    systems: Vec<NamedSystem>,
}

impl Schedule {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// Add a system to the end of the schedule.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        let name = short_system_name(std::any::type_name::<S>());
        log::debug!("scheduled system `{name}`");
        self.systems.push(NamedSystem {
            name,
            system: Box::new(system),
        });
    }

    /// Run all systems in order on the given world.
    pub fn run(&mut self, world: &mut World) {
        for ns in &mut self.systems {
            log::trace!("running system `{}`", ns.name);
            ns.system.run(world);
        }
    }

    /// Names of the scheduled systems, in run order.
    pub fn system_names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|ns| ns.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the module path from a fully-qualified type name, keeping only the
/// last meaningful segment (e.g. `tessel::movement::player_movement` →
/// `player_movement`, `{{closure}}` → `<closure>`).
fn short_system_name(full: &str) -> String {
    let name = full.rsplit("::").next().unwrap_or(full);
    if name.contains("closure") {
        "<closure>".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_system(_world: &mut World) {}

    #[test]
    fn schedule_captures_system_name() {
        let mut schedule = Schedule::new();
        schedule.add_system(dummy_system);
        schedule.add_system(|_world: &mut World| {});
        let names: Vec<&str> = schedule.system_names().collect();
        assert_eq!(names, vec!["dummy_system", "<closure>"]);
    }

    #[test]
    fn systems_run_in_insertion_order() {
        let mut world = World::new();
        world.insert_resource(Vec::<u32>::new());
        let mut schedule = Schedule::new();
        schedule.add_system(|w: &mut World| w.resource_mut::<Vec<u32>>().push(1));
        schedule.add_system(|w: &mut World| w.resource_mut::<Vec<u32>>().push(2));
        schedule.run(&mut world);
        schedule.run(&mut world);
        assert_eq!(world.resource::<Vec<u32>>(), &vec![1, 2, 1, 2]);
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn stateful_closure_keeps_state() {
        let mut world = World::new();
        world.insert_resource(0u32);
        let mut calls = 0u32;
        let mut schedule = Schedule::new();
        schedule.add_system(move |w: &mut World| {
            calls += 1;
            *w.resource_mut::<u32>() = calls;
        });
        for _ in 0..3 {
            schedule.run(&mut world);
        }
        assert_eq!(*world.resource::<u32>(), 3);
    }

    #[test]
    fn empty_schedule() {
        let mut schedule = Schedule::default();
        assert!(schedule.is_empty());
        schedule.run(&mut World::new());
    }
}
