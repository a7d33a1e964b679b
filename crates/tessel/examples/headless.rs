//! Headless demo: a tile map and a player sprite, stepped for a few frames
//! without a window. Run with `RUST_LOG=tessel=debug` to watch the cache.

use std::time::Duration;

use tessel::prelude::*;

fn main() -> Result<()> {
    let config = EngineConfig::default();
    config.init_logging();

    let mut world = World::new();
    world.insert_resource(config.camera);
    world.insert_resource(Time::new());
    world.insert_resource(Input::<KeyCode>::new());

    // 4×3 ground layer with a gap in the middle
    let map = world.create();
    world.set(
        map,
        TileGrid::from_rows(
            vec![vec![1, 1, 1, 1], vec![1, 0, 0, 1], vec![2, 2, 2, 2]],
            Vec2::splat(config.atlas.tile_size as f32),
        )?,
    )?;

    let player = world.create();
    world.set(player, config.atlas.sprite(0, 4, 1, 2).with_layer(1))?;
    world.set(player, Position::new(24.0, 8.0))?;
    world.set(player, PlayerInput::new(config.player_move_speed))?;

    let mut schedule = Schedule::new();
    schedule.add_system(player_movement);

    let mut renderer = Renderer2d::new(HeadlessBackend::new(), config.atlas);

    for frame in 0..5 {
        world.resource_mut::<Time>().advance(Duration::from_millis(16));
        {
            let input = world.resource_mut::<Input<KeyCode>>();
            input.clear_just();
            if frame == 1 {
                input.press(KeyCode::KeyD);
            }
            if frame == 3 {
                input.release(KeyCode::KeyD);
            }
        }
        if frame == 2 {
            // punch a hole; the layer goes stale and re-bakes next prepare
            if let Some(grid) = world.get_mut::<TileGrid>(map) {
                grid.set_tile(0, 0, EMPTY_TILE);
            }
        }

        schedule.run(&mut world);
        let plan = renderer.prepare_frame(&mut world)?;

        let pos = world.component::<Position>(player)?;
        println!(
            "frame {frame}: {} draws, {} rebuilt, {} reused, player at ({:.1}, {:.1})",
            plan.commands.len(),
            plan.rebuilt,
            plan.reused,
            pos.0.x,
            pos.0.y
        );
    }

    renderer.retire_layer(&mut world, map)?;
    println!(
        "retired map: {} live buffers, {} uploads, {} releases",
        renderer.backend().live_buffers(),
        renderer.backend().upload_count(),
        renderer.backend().release_count()
    );
    Ok(())
}
