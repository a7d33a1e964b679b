//! Keyboard-driven movement.
//!
//! [`player_movement`] moves every entity carrying a [`PlayerInput`] and a
//! [`Position`] with WASD. Y grows downward, so W moves up the screen by
//! decreasing y.

use serde::{Deserialize, Serialize};

use crate::ecs::World;
use crate::input::{Input, KeyCode};
use crate::math::{Position, Vec2};
use crate::time::Time;

/// Marks an entity as player-controlled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// World units per second.
    pub move_speed: f32,
}

impl PlayerInput {
    pub fn new(move_speed: f32) -> Self {
        Self { move_speed }
    }
}

impl Default for PlayerInput {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Unit step for the currently held WASD keys. Opposite keys cancel.
pub fn wasd_direction(input: &Input<KeyCode>) -> Vec2 {
    let mut dir = Vec2::ZERO;
    if input.pressed(KeyCode::KeyW) {
        dir.y -= 1.0;
    }
    if input.pressed(KeyCode::KeyS) {
        dir.y += 1.0;
    }
    if input.pressed(KeyCode::KeyA) {
        dir.x -= 1.0;
    }
    if input.pressed(KeyCode::KeyD) {
        dir.x += 1.0;
    }
    dir
}

/// System: move `(PlayerInput, Position)` entities by
/// `move_speed * delta` along each held WASD axis.
///
/// Does nothing until both the `Input<KeyCode>` and [`Time`] resources exist.
pub fn player_movement(world: &mut World) {
    let Some(dt) = world.get_resource::<Time>().map(Time::delta_secs) else {
        return;
    };
    let Some(dir) = world.get_resource::<Input<KeyCode>>().map(wasd_direction) else {
        return;
    };
    if dir == Vec2::ZERO {
        return;
    }

    world.query::<(&PlayerInput, &mut Position)>(|_, (player, pos)| {
        pos.0 += dir * player.move_speed * dt;
    });
}
