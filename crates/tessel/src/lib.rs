//! # Tessel: Tile and Sprite Runtime on a Small ECS
//!
//! A minimal 2D runtime: a table-per-kind entity-component store with
//! intersection queries, and a renderer that bakes tile layers into cached
//! vertex buffers and only rebuilds them when their grid changes.
//!
//! Start with `use tessel::prelude::*`. A frame looks like:
//!
//! ```ignore
//! time.advance(dt);                       // external loop supplies dt
//! schedule.run(&mut world);               // movement and game systems
//! let plan = renderer.prepare_frame(&mut world)?;
//! draw(plan);                             // external draw loop
//! ```
//!
//! Windowing, input polling, shaders, and texture upload live outside this
//! crate and meet it at [`input::Input`], [`render::GpuBackend`],
//! [`render2d::atlas::TileUvLookup`], and [`render::FramePlan`].

pub mod camera;
pub mod config;
pub mod ecs;
pub mod error;
pub mod input;
pub mod math;
pub mod movement;
pub mod prelude;
pub mod render;
pub mod render2d;
pub mod time;

pub use error::{Error, Result};
