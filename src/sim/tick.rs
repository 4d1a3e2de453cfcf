//! Fixed-priority simulation tick.
//!
//! One entry point, one ordered pass: player FSM -> movement -> collision ->
//! tiles -> ball FSM -> pool reclamation. `tick` always returns; the host
//! loop has no recovery action beyond logging, so nothing here propagates
//! failure outward.

use glam::Vec2;

use crate::consts::MAX_TICK_DT;
use crate::sim::ball::{self, BallState};
use crate::sim::movement;
use crate::sim::player;
use crate::sim::registry::EntityId;
use crate::sim::resolver;
use crate::sim::state::World;
use crate::sim::tile;

/// Input commands for a single tick, pre-translated by the host's input
/// collaborator. Edges, not key states: the core knows nothing about devices.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Horizontal movement axis in [-1, 1].
    pub move_axis: f32,
    /// Jump was pressed this tick.
    pub jump_pressed: bool,
    /// Aim point in world space.
    pub aim_pos: Vec2,
    /// Aim was pressed this tick.
    pub aim_pressed: bool,
    /// Aim was released this tick.
    pub aim_released: bool,
}

/// Advance the world by one tick.
///
/// `dt` is whatever the host scheduler measured; it is clamped to
/// [`MAX_TICK_DT`] so a stalled frame cannot tunnel fast bodies through thin
/// tiles.
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    let dt = if dt > MAX_TICK_DT {
        log::debug!("tick dt {} clamped to {}", dt, MAX_TICK_DT);
        MAX_TICK_DT
    } else {
        dt
    };
    if dt <= 0.0 {
        return;
    }

    world.tick_count += 1;
    world.faulted_this_tick = false;

    // Input-driven state first.
    player::update(world, input, dt);
    movement::update(world, dt);

    // Contact flags are rebuilt by the resolver every tick; the FSM reads
    // them one tick late, which is what the coyote window absorbs.
    {
        let p = &mut world.registry.player;
        p.on_ground = false;
        p.elevator_lock = false;
    }
    resolver::update(world);

    tile::update(world, dt);
    ball::update(world, dt);
    reclaim(world);
}

/// Return every Dead ball to the pool, dropping it from registry and grid.
fn reclaim(world: &mut World) {
    let dead: Vec<EntityId> = world
        .registry
        .balls()
        .iter()
        .filter(|b| b.state == BallState::Dead)
        .map(|b| b.id)
        .collect();
    for id in dead {
        if let Some(ball) = world.registry.remove_ball(id) {
            world.grid.remove(id);
            world.pool.release(ball);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PLAYER_HALF_HEIGHT;
    use crate::events::GameEvent;
    use crate::level::{Bounds, LevelDesc, TilePlacement};
    use crate::sim::player::PlayerState;
    use crate::sim::tile::{TileKind, TileState};
    use crate::tuning::Tuning;

    const DT: f32 = 1.0 / 120.0;

    /// A flat bedrock floor across the bottom (tile tops at y = 32) plus any
    /// extra placements, spawn standing on the floor at x = 100.
    fn floor_level(extra: Vec<TilePlacement>) -> LevelDesc {
        let mut tiles: Vec<TilePlacement> = (0..32)
            .map(|i| {
                TilePlacement::new(TileKind::Bedrock, Vec2::new(16.0 + i as f32 * 32.0, 16.0))
            })
            .collect();
        tiles.extend(extra);
        LevelDesc {
            bounds: Bounds::new(0.0, 0.0, 1024.0, 512.0),
            spawn: Vec2::new(100.0, 32.0 + PLAYER_HALF_HEIGHT),
            tiles,
        }
    }

    fn world(extra: Vec<TilePlacement>) -> World {
        World::new(Tuning::default(), &floor_level(extra)).unwrap()
    }

    /// Run idle ticks so spawn contact settles.
    fn settle(world: &mut World, ticks: usize) {
        for _ in 0..ticks {
            tick(world, &TickInput::default(), DT);
        }
    }

    fn aim_and_launch(world: &mut World, dir: Vec2) {
        let aim_pos = world.player().pos + dir * 100.0;
        tick(
            world,
            &TickInput {
                aim_pos,
                aim_pressed: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(world.player().state, PlayerState::Aiming);
        tick(
            world,
            &TickInput {
                aim_pos,
                aim_released: true,
                ..Default::default()
            },
            DT,
        );
    }

    #[test]
    fn test_idle_moving_by_axis() {
        let mut w = world(Vec::new());
        settle(&mut w, 10);
        assert_eq!(w.player().state, PlayerState::Idle);

        tick(
            &mut w,
            &TickInput {
                move_axis: 1.0,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(w.player().state, PlayerState::Moving);
        assert!(w.player().vel.x > 0.0);

        tick(&mut w, &TickInput::default(), DT);
        assert_eq!(w.player().state, PlayerState::Idle);
    }

    #[test]
    fn test_launch_velocity_and_flat_flight() {
        let mut w = world(Vec::new());
        settle(&mut w, 10);
        let speed = w.tuning().launch_speed;

        aim_and_launch(&mut w, Vec2::X);
        assert_eq!(w.player().state, PlayerState::Launching);
        assert_eq!(w.balls().len(), 1);

        let ball = &w.balls()[0];
        assert!((ball.vel.x - speed).abs() < 0.001);
        assert!(ball.vel.y.abs() < 0.001);
        assert!(
            w.drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::BallLaunched { .. }))
        );

        // One tick of flight: dx = s*dt, no gravity on the ball.
        let before = w.balls()[0].pos;
        tick(&mut w, &TickInput::default(), DT);
        let after = w.balls()[0].pos;
        assert!((after.x - before.x - speed * DT).abs() < 0.001);
        assert!((after.y - before.y).abs() < 0.001);
    }

    #[test]
    fn test_launch_cooldown_freezes_horizontal_control() {
        let mut w = world(Vec::new());
        settle(&mut w, 10);
        aim_and_launch(&mut w, Vec2::X);
        assert_eq!(w.player().state, PlayerState::Launching);

        // Pushing the stick during the cooldown does nothing.
        tick(
            &mut w,
            &TickInput {
                move_axis: 1.0,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(w.player().state, PlayerState::Launching);
        assert!(w.player().vel.x.abs() < 1.0);

        // After the cooldown control returns.
        let cooldown_ticks = (w.tuning().launch_cooldown / DT).ceil() as usize + 2;
        for _ in 0..cooldown_ticks {
            tick(
                &mut w,
                &TickInput {
                    move_axis: 1.0,
                    ..Default::default()
                },
                DT,
            );
        }
        assert_eq!(w.player().state, PlayerState::Moving);
        assert!(w.player().vel.x > 0.0);
    }

    #[test]
    fn test_coyote_jump_granted_same_tick() {
        let mut w = world(Vec::new());
        settle(&mut w, 10);
        // Airborne with coyote time remaining.
        {
            let p = &mut w.registry.player;
            p.state = PlayerState::CoyoteTime;
            p.coyote_timer = 0.05;
            p.on_ground = false;
            p.pos.y += 40.0;
        }

        tick(
            &mut w,
            &TickInput {
                jump_pressed: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(w.player().state, PlayerState::Jumping);
        assert!(w.player().vel.y > 0.0);
        // The grant consumed both forgiveness timers.
        assert_eq!(w.player().coyote_timer, 0.0);
        assert_eq!(w.player().jump_buffer_timer, 0.0);
    }

    #[test]
    fn test_expired_coyote_falls_instead() {
        let mut w = world(Vec::new());
        settle(&mut w, 10);
        {
            let p = &mut w.registry.player;
            p.state = PlayerState::CoyoteTime;
            p.coyote_timer = 0.0;
            p.on_ground = false;
            p.pos.y += 80.0;
        }
        tick(&mut w, &TickInput::default(), DT);
        assert_eq!(w.player().state, PlayerState::Falling);
    }

    #[test]
    fn test_buffered_jump_fires_on_landing() {
        let mut w = world(Vec::new());
        settle(&mut w, 10);
        // Drop the player a whisker above the floor, falling.
        {
            let p = &mut w.registry.player;
            p.state = PlayerState::Falling;
            p.on_ground = false;
            p.pos.y += 3.0;
            p.vel.y = -60.0;
        }

        // Press jump while airborne: queued, not granted.
        tick(
            &mut w,
            &TickInput {
                jump_pressed: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(w.player().state, PlayerState::JumpQueued);

        // Ground resumes inside the buffer window: the jump executes.
        let mut jumped = false;
        for _ in 0..10 {
            tick(&mut w, &TickInput::default(), DT);
            if w.player().state == PlayerState::Jumping {
                jumped = true;
                break;
            }
        }
        assert!(jumped, "buffered jump should fire when ground resumes");
        assert!(w.player().vel.y > 0.0);
    }

    #[test]
    fn test_buffered_jump_dropped_when_window_expires() {
        let mut w = world(Vec::new());
        settle(&mut w, 10);
        // High enough that the fall outlasts the buffer window.
        {
            let p = &mut w.registry.player;
            p.state = PlayerState::Falling;
            p.on_ground = false;
            p.pos.y += 60.0;
            p.vel.y = 0.0;
        }
        w.drain_events();

        tick(
            &mut w,
            &TickInput {
                jump_pressed: true,
                ..Default::default()
            },
            DT,
        );
        // Fall all the way down and settle.
        settle(&mut w, 120);
        assert_eq!(w.player().state, PlayerState::Idle);
        let jumped = w.drain_events().iter().any(|e| {
            matches!(
                e,
                GameEvent::PlayerStateChanged {
                    to: PlayerState::Jumping,
                    ..
                }
            )
        });
        assert!(!jumped, "stale buffered jump must be dropped");
    }

    #[test]
    fn test_ball_destroys_single_hit_tile_within_a_second() {
        // A one-hit tile at launch height, down range.
        let target_y = 32.0 + PLAYER_HALF_HEIGHT;
        let mut w = world(vec![TilePlacement {
            kind: TileKind::Soil,
            pos: Vec2::new(400.0, target_y),
            durability: Some(1.0),
            travel: 0.0,
        }]);
        let target_id = w
            .tiles()
            .iter()
            .find(|t| t.kind == TileKind::Soil)
            .unwrap()
            .id;
        settle(&mut w, 10);

        aim_and_launch(&mut w, Vec2::X);
        for _ in 0..120 {
            tick(&mut w, &TickInput::default(), DT);
        }

        assert!(w.tile(target_id).is_none(), "tile should be gone");
        let events = w.drain_events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::TileDestroyed { tile, .. } if *tile == target_id))
        );
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::BallBounced { .. }))
        );
    }

    #[test]
    fn test_tile_destroyed_underfoot_gives_coyote_then_falling() {
        // Player standing on a single destructible tile, no floor below.
        let level = LevelDesc {
            bounds: Bounds::new(0.0, 0.0, 1024.0, 512.0),
            spawn: Vec2::new(100.0, 300.0 + 16.0 + PLAYER_HALF_HEIGHT),
            tiles: vec![TilePlacement {
                kind: TileKind::Soil,
                pos: Vec2::new(100.0, 300.0),
                durability: Some(1.0),
                travel: 0.0,
            }],
        };
        let mut w = World::new(Tuning::default(), &level).unwrap();
        settle(&mut w, 10);
        assert_eq!(w.player().state, PlayerState::Idle);
        let tile_id = w.tiles()[0].id;

        // Destroy the tile out from under them.
        w.pending_damage.push((tile_id, 1.0));
        let destroy_ticks = (w.tuning().destroy_duration / DT).ceil() as usize + 2;
        settle(&mut w, destroy_ticks);
        assert!(w.tile(tile_id).is_none());

        // Support is gone: coyote grace first, falling after it expires.
        let mut saw_coyote = false;
        let mut saw_falling = false;
        for _ in 0..40 {
            tick(&mut w, &TickInput::default(), DT);
            match w.player().state {
                PlayerState::CoyoteTime => saw_coyote = true,
                PlayerState::Falling if saw_coyote => {
                    saw_falling = true;
                    break;
                }
                _ => {}
            }
        }
        assert!(saw_coyote, "lost support must pass through coyote time");
        assert!(saw_falling, "unused coyote window must expire into falling");
    }

    #[test]
    fn test_unlaunched_release_leaves_no_residue() {
        let mut w = world(Vec::new());
        settle(&mut w, 10);

        // Aim far, wiggle, then release inside the deadzone: despawn.
        let far = w.player().pos + Vec2::new(100.0, 30.0);
        tick(
            &mut w,
            &TickInput {
                aim_pos: far,
                aim_pressed: true,
                ..Default::default()
            },
            DT,
        );
        assert!(w.player().held.is_some());
        let player_pos = w.player().pos;
        tick(
            &mut w,
            &TickInput {
                aim_pos: player_pos,
                aim_released: true,
                ..Default::default()
            },
            DT,
        );
        assert!(w.player().held.is_none());
        assert!(w.balls().is_empty());
        assert_eq!(w.pool.free_count(), 1);

        // Next acquisition reports nothing from the aborted aim.
        let ball = w.pool.acquire(&mut w.registry);
        assert_eq!(ball.vel, Vec2::ZERO);
        assert_eq!(ball.aim_dir, Vec2::ZERO);
        assert_eq!(ball.state, BallState::Idle);
        assert_eq!(ball.bounces, 0);
    }

    #[test]
    fn test_ball_expires_by_lifetime() {
        let tuning = Tuning {
            ball_lifetime: 0.2,
            ..Default::default()
        };
        let mut w = World::new(tuning, &floor_level(Vec::new())).unwrap();
        settle(&mut w, 10);
        // Launch upward into open space.
        aim_and_launch(&mut w, Vec2::new(0.3, 1.0).normalize());
        assert_eq!(w.balls().len(), 1);

        settle(&mut w, 40);
        assert!(w.balls().is_empty(), "expired ball must be reclaimed");
        assert_eq!(w.pool.free_count(), 1);
    }

    #[test]
    fn test_death_and_timed_respawn() {
        let mut w = world(Vec::new());
        settle(&mut w, 10);
        let spawn = w.spawn_point();
        {
            let p = &mut w.registry.player;
            p.pos.x += 200.0;
        }

        w.kill_player();
        assert_eq!(w.player().state, PlayerState::Death);

        // Input is ignored while dead.
        tick(
            &mut w,
            &TickInput {
                move_axis: 1.0,
                jump_pressed: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(w.player().state, PlayerState::Death);
        assert_eq!(w.player().vel, Vec2::ZERO);

        let respawn_ticks = (w.tuning().respawn_delay / DT).ceil() as usize + 2;
        settle(&mut w, respawn_ticks);
        assert_ne!(w.player().state, PlayerState::Death);
        assert!((w.player().pos.x - spawn.x).abs() < 0.001);
        assert!(
            w.drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::PlayerRespawned { .. }))
        );
    }

    #[test]
    fn test_falling_out_of_bounds_kills() {
        // No floor at all.
        let level = LevelDesc {
            bounds: Bounds::new(0.0, 0.0, 1024.0, 512.0),
            spawn: Vec2::new(100.0, 400.0),
            tiles: Vec::new(),
        };
        let mut w = World::new(Tuning::default(), &level).unwrap();
        let mut died = false;
        for _ in 0..300 {
            tick(&mut w, &TickInput::default(), DT);
            if w.player().state == PlayerState::Death {
                died = true;
                break;
            }
        }
        assert!(died);
        assert!(
            w.drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::PlayerDied { .. }))
        );
    }

    #[test]
    fn test_stalled_frame_dt_is_clamped() {
        let mut w = world(Vec::new());
        {
            let p = &mut w.registry.player;
            p.state = PlayerState::Falling;
            p.pos.y = 400.0;
        }
        tick(&mut w, &TickInput::default(), 10.0);
        // One clamped step of gravity, not ten seconds' worth.
        let expected = -w.tuning().gravity * MAX_TICK_DT;
        assert!((w.player().vel.y - expected).abs() < 0.001);
    }

    #[test]
    fn test_event_stream_round_trips_through_json() {
        let mut w = world(Vec::new());
        settle(&mut w, 10);
        aim_and_launch(&mut w, Vec2::X);
        let events = w.drain_events();
        assert!(!events.is_empty());

        let json = serde_json::to_string(&events).unwrap();
        let back: Vec<GameEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(events, back);
    }

    #[test]
    fn test_destroying_tile_walks_states_in_order() {
        let mut w = world(vec![TilePlacement {
            kind: TileKind::Brick,
            pos: Vec2::new(400.0, 200.0),
            durability: Some(3.0),
            travel: 0.0,
        }]);
        let id = w
            .tiles()
            .iter()
            .find(|t| t.kind == TileKind::Brick)
            .unwrap()
            .id;

        for _ in 0..3 {
            w.pending_damage.push((id, 1.0));
            tick(&mut w, &TickInput::default(), DT);
        }
        assert_eq!(w.tile(id).unwrap().state, TileState::Destroying);

        let destroy_ticks = (w.tuning().destroy_duration / DT).ceil() as usize + 2;
        settle(&mut w, destroy_ticks);
        assert!(w.tile(id).is_none());

        // Exactly one destroyed event.
        let destroyed = w
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::TileDestroyed { tile, .. } if *tile == id))
            .count();
        assert_eq!(destroyed, 1);
    }
}
