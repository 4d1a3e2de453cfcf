//! Movement resolver: explicit Euler integration, one step per tick.
//!
//! The only place positions change outside explicit teleports (respawn,
//! level load). Gravity and friction are gated on the owning entity's state;
//! the player's horizontal position is clamped to the level bounds with the
//! velocity component zeroed on clamp — the contract any bounded actor must
//! honor.

use glam::Vec2;

use crate::sim::ball::BallState;
use crate::sim::player::PlayerState;
use crate::sim::state::World;
use crate::sim::tile::TileKind;

pub(crate) fn update(world: &mut World, dt: f32) {
    let World {
        tuning,
        bounds,
        registry,
        grid,
        ..
    } = world;
    let bounds = *bounds;

    // --- Player ---
    let player = &mut registry.player;
    if player.state != PlayerState::Death {
        let gravity_suspended = matches!(
            player.state,
            PlayerState::Aiming | PlayerState::Launching
        ) || player.elevator_lock;
        if !gravity_suspended {
            player.vel.y -= tuning.gravity * dt;
        }
        if player.state == PlayerState::Launching {
            // No horizontal control during the cooldown; friction bleeds the
            // residual velocity off.
            player.vel.x *= (-tuning.ground_friction * dt).exp();
        }

        player.pos += player.vel * dt;

        // Horizontal bounds clamp zeroes the matching velocity component.
        let min_x = bounds.min.x + player.half.x;
        let max_x = bounds.max.x - player.half.x;
        if player.pos.x < min_x {
            player.pos.x = min_x;
            player.vel.x = 0.0;
        } else if player.pos.x > max_x {
            player.pos.x = max_x;
            player.vel.x = 0.0;
        }

        grid.update(player.id, player.pos, player.half);
    }

    // --- Flying balls ---
    // Constant velocity, no gravity: ricochets stay readable.
    for ball in registry.balls_mut() {
        if ball.state == BallState::Flying {
            ball.pos += ball.vel * dt;
            grid.update(ball.id, ball.pos, Vec2::splat(ball.radius));
        }
    }

    // --- Elevators ---
    // The one tile kind with a velocity. Oscillates around its anchor,
    // reversing at the travel bound.
    for tile in registry.tiles_mut() {
        if tile.kind != TileKind::Elevator || tile.travel <= 0.0 {
            continue;
        }
        tile.pos.y += tile.vel.y * dt;
        let offset = tile.pos.y - tile.anchor_y;
        if offset.abs() > tile.travel {
            tile.pos.y = tile.anchor_y + tile.travel * offset.signum();
            tile.vel.y = -tile.vel.y;
        }
        grid.update(tile.id, tile.pos, tile.half);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{Bounds, LevelDesc, TilePlacement};
    use crate::tuning::Tuning;

    fn empty_world() -> World {
        let level = LevelDesc {
            bounds: Bounds::new(0.0, 0.0, 640.0, 360.0),
            spawn: Vec2::new(320.0, 180.0),
            tiles: Vec::new(),
        };
        World::new(Tuning::default(), &level).unwrap()
    }

    #[test]
    fn test_gravity_applies_while_falling() {
        let mut world = empty_world();
        world.registry.player.state = PlayerState::Falling;
        update(&mut world, 1.0 / 120.0);
        assert!(world.registry.player.vel.y < 0.0);
    }

    #[test]
    fn test_gravity_suspended_while_aiming() {
        let mut world = empty_world();
        world.registry.player.state = PlayerState::Aiming;
        update(&mut world, 1.0 / 120.0);
        assert_eq!(world.registry.player.vel.y, 0.0);
    }

    #[test]
    fn test_horizontal_clamp_zeroes_velocity() {
        let mut world = empty_world();
        let player = &mut world.registry.player;
        player.state = PlayerState::Moving;
        player.pos.x = 1.0;
        player.vel.x = -500.0;
        update(&mut world, 1.0 / 120.0);

        let player = &world.registry.player;
        assert_eq!(player.pos.x, world.bounds.min.x + player.half.x);
        assert_eq!(player.vel.x, 0.0);
    }

    #[test]
    fn test_elevator_reverses_at_travel_bound() {
        let level = LevelDesc {
            bounds: Bounds::new(0.0, 0.0, 640.0, 360.0),
            spawn: Vec2::new(320.0, 180.0),
            tiles: vec![TilePlacement {
                kind: TileKind::Elevator,
                pos: Vec2::new(100.0, 100.0),
                durability: None,
                travel: 30.0,
            }],
        };
        let mut world = World::new(Tuning::default(), &level).unwrap();
        let speed = world.tuning.elevator_speed;

        // Ride up to the bound and make sure it turns around.
        let dt = 1.0 / 120.0;
        let mut reversed = false;
        for _ in 0..(5.0 / dt) as usize {
            update(&mut world, dt);
            let tile = &world.registry.tiles()[0];
            assert!((tile.pos.y - tile.anchor_y).abs() <= tile.travel + 0.001);
            if tile.vel.y < 0.0 {
                reversed = true;
            }
        }
        assert!(reversed);
        assert_eq!(world.registry.tiles()[0].vel.y.abs(), speed);
    }
}
