//! Collision resolver: candidate pairing, per-tick budget, typed dispatch.
//!
//! Candidates come from the spatial grid for each moving collidable (player,
//! flying balls). Pairs are normalized to (low id, high id), deduplicated,
//! and processed up to the tuning budget; the tail defers to the next tick —
//! detection latency degrades under spikes, frame time does not. Routing is
//! one `match` over the closed tag pair, and every handler's side effects go
//! through the world; the resolver itself keeps no state beyond the deferred
//! queue.

use std::collections::HashSet;

use glam::Vec2;

use crate::error::{SimError, SimResult};
use crate::events::GameEvent;
use crate::sim::ball::BallState;
use crate::sim::collision::{self, CollisionTag, Contact};
use crate::sim::registry::EntityId;
use crate::sim::state::World;

fn ordered(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a < b { (a, b) } else { (b, a) }
}

/// Resolver pass. Runs after movement, before the tile system.
pub(crate) fn update(world: &mut World) {
    // Pairs starved out last tick run first.
    let mut queue = std::mem::take(&mut world.deferred_pairs);
    let carried: HashSet<(EntityId, EntityId)> = queue.iter().copied().collect();

    // Fresh candidates from the movers. Tiles never initiate a pair: their
    // eligibility set is empty and tile-tile contacts mean nothing here.
    let player_id = world.registry.player.id;
    let mut fresh: Vec<(EntityId, EntityId)> = Vec::new();
    for other in world.grid.query_candidates(player_id) {
        fresh.push(ordered(player_id, other));
    }
    for ball in world.registry.balls() {
        if ball.state == BallState::Flying {
            for other in world.grid.query_candidates(ball.id) {
                fresh.push(ordered(ball.id, other));
            }
        }
    }
    fresh.sort_unstable();
    fresh.dedup();
    queue.extend(fresh.into_iter().filter(|pair| !carried.contains(pair)));

    let budget = world.tuning.collision_budget;
    let mut deferred: Vec<(EntityId, EntityId)> = Vec::new();
    for (i, &(a, b)) in queue.iter().enumerate() {
        if i >= budget {
            deferred.extend_from_slice(&queue[i..]);
            log::warn!(
                "collision budget ({}) exhausted; deferring {} pairs to next tick",
                budget,
                deferred.len()
            );
            break;
        }

        // Stale ids (entity destroyed since the pair was queued) skip clean.
        let (Some(ca), Some(cb)) = (world.registry.collider(a), world.registry.collider(b))
        else {
            continue;
        };
        // One-sided opt-in suffices.
        if !(ca.hits.contains(cb.tag) || cb.hits.contains(ca.tag)) {
            continue;
        }
        let Some(contact) = collision::overlap(ca.pos, &ca.shape, cb.pos, &cb.shape) else {
            continue;
        };

        // Both ordered directions, each exactly once per tick. A faulting
        // handler is logged and never aborts the remaining pairs.
        if let Err(err) = dispatch(world, a, ca.tag, cb.tag, b, contact) {
            fault(world, err);
        }
        if let Err(err) = dispatch(world, b, cb.tag, ca.tag, a, contact.flipped()) {
            fault(world, err);
        }
    }
    world.deferred_pairs = deferred;
}

fn fault(world: &mut World, err: SimError) {
    log::error!("collision callback fault: {}", err);
    if !world.faulted_this_tick {
        world.faulted_this_tick = true;
        world.events.push(GameEvent::Fault {
            context: format!("collision callback: {}", err),
        });
    }
}

/// Closed routing table over collision tag pairs. `contact.normal` points
/// toward the first entity of the pair as passed here.
fn dispatch(
    world: &mut World,
    id: EntityId,
    tag: CollisionTag,
    other_tag: CollisionTag,
    other_id: EntityId,
    contact: Contact,
) -> SimResult<()> {
    use CollisionTag::*;
    match (tag, other_tag) {
        (Ball, Tile | Wall | Spring | Elevator) => ball_bounce(world, id, contact),
        (Tile, Ball) => tile_struck(world, id, other_id),
        (Player, Tile | Wall) => player_touch_surface(world, contact),
        (Player, Spring) => player_touch_spring(world, contact),
        (Player, Elevator) => player_ride_elevator(world, other_id, contact),
        // Everything else has no handler on this side.
        _ => Ok(()),
    }
}

/// Flying ball reflects off any surface. Constant speed, no damping.
fn ball_bounce(world: &mut World, ball_id: EntityId, contact: Contact) -> SimResult<()> {
    let ball = world
        .registry
        .ball_mut(ball_id)
        .ok_or(SimError::EntityNotFound {
            context: "ball bounce",
        })?;
    if ball.state != BallState::Flying {
        return Ok(());
    }
    // Only reflect when actually moving into the surface; a second contact in
    // the same tick must not undo the first reflection.
    if ball.vel.dot(contact.normal) >= 0.0 {
        return Ok(());
    }

    ball.pos += contact.normal * contact.penetration;
    ball.bounce(contact.normal);
    let event = GameEvent::BallBounced {
        ball: ball.id,
        position: contact.point,
        normal: contact.normal,
        bounces: ball.bounces,
    };
    let (pos, radius) = (ball.pos, ball.radius);
    world.grid.update(ball_id, pos, Vec2::splat(radius));
    world.events.push(event);
    Ok(())
}

/// Destructible tile side of a ball impact: queue damage for the tile
/// system pass. Damage routing stays out of the resolver.
fn tile_struck(world: &mut World, tile_id: EntityId, ball_id: EntityId) -> SimResult<()> {
    let ball = world.registry.ball(ball_id).ok_or(SimError::EntityNotFound {
        context: "tile struck",
    })?;
    if ball.state != BallState::Flying {
        return Ok(());
    }
    let amount = world.tuning.ball_damage;
    world.pending_damage.push((tile_id, amount));
    Ok(())
}

/// Player vs solid surface: minimal-axis pushout plus contact flags.
fn player_touch_surface(world: &mut World, contact: Contact) -> SimResult<()> {
    let player = &mut world.registry.player;
    player.pos += contact.normal * contact.penetration;

    if contact.normal.y > 0.7 {
        // Support contact.
        player.on_ground = true;
        if player.vel.y < 0.0 {
            player.vel.y = 0.0;
        }
    } else if contact.normal.y < -0.7 {
        // Ceiling.
        if player.vel.y > 0.0 {
            player.vel.y = 0.0;
        }
    } else if player.vel.x * contact.normal.x < 0.0 {
        // Side wall.
        player.vel.x = 0.0;
    }

    let (id, pos, half) = (player.id, player.pos, player.half);
    world.grid.update(id, pos, half);
    Ok(())
}

/// Spring support contact replaces grounding with an upward impulse.
fn player_touch_spring(world: &mut World, contact: Contact) -> SimResult<()> {
    if contact.normal.y <= 0.7 {
        return player_touch_surface(world, contact);
    }
    let spring_impulse = world.tuning.spring_impulse;
    let player = &mut world.registry.player;
    player.pos += contact.normal * contact.penetration;
    player.vel.y = spring_impulse;

    let (id, pos, half) = (player.id, player.pos, player.half);
    world.grid.update(id, pos, half);
    Ok(())
}

/// Riding an elevator: grounded, gravity-locked, carried by the platform.
fn player_ride_elevator(
    world: &mut World,
    elevator_id: EntityId,
    contact: Contact,
) -> SimResult<()> {
    if contact.normal.y <= 0.7 {
        return player_touch_surface(world, contact);
    }
    let tile = world
        .registry
        .tile(elevator_id)
        .ok_or(SimError::EntityNotFound {
            context: "elevator ride",
        })?;
    let (top, platform_vel) = (tile.pos.y + tile.half.y, tile.vel.y);

    let player = &mut world.registry.player;
    player.pos.y = top + player.half.y;
    player.vel.y = platform_vel;
    player.on_ground = true;
    player.elevator_lock = true;

    let (id, pos, half) = (player.id, player.pos, player.half);
    world.grid.update(id, pos, half);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{Bounds, LevelDesc, TilePlacement};
    use crate::sim::tile::TileKind;
    use crate::tuning::Tuning;

    fn world_with_tiles(tiles: Vec<TilePlacement>, tuning: Tuning) -> World {
        let level = LevelDesc {
            bounds: Bounds::new(0.0, 0.0, 1000.0, 1000.0),
            spawn: Vec2::new(500.0, 500.0),
            tiles,
        };
        World::new(tuning, &level).unwrap()
    }

    fn spawn_flying_ball(world: &mut World, pos: Vec2, vel: Vec2) -> EntityId {
        let mut ball = world.pool.acquire(&mut world.registry);
        ball.state = BallState::Flying;
        ball.pos = pos;
        ball.vel = vel;
        let id = ball.id;
        world.grid.insert(id, pos, Vec2::splat(ball.radius));
        world.registry.add_ball(ball);
        id
    }

    #[test]
    fn test_ball_reflects_and_queues_damage() {
        let mut world = world_with_tiles(
            vec![TilePlacement::new(TileKind::Soil, Vec2::new(100.0, 100.0))],
            Tuning::default(),
        );
        // Overlapping the tile's right edge, moving left into it.
        let id = spawn_flying_ball(&mut world, Vec2::new(120.0, 100.0), Vec2::new(-300.0, 0.0));

        update(&mut world);

        let ball = world.registry.ball(id).unwrap();
        assert!(ball.vel.x > 0.0, "velocity should reflect off the tile");
        assert_eq!(ball.bounces, 1);
        assert_eq!(world.pending_damage.len(), 1);
        assert!(
            world
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::BallBounced { bounces: 1, .. }))
        );
    }

    #[test]
    fn test_wall_bounces_without_damage() {
        let mut world = world_with_tiles(
            vec![TilePlacement::new(TileKind::Bedrock, Vec2::new(100.0, 100.0))],
            Tuning::default(),
        );
        spawn_flying_ball(&mut world, Vec2::new(120.0, 100.0), Vec2::new(-300.0, 0.0));

        update(&mut world);

        assert!(world.pending_damage.is_empty());
        assert!(
            world
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::BallBounced { .. }))
        );
    }

    #[test]
    fn test_player_grounds_on_tile_top() {
        let mut world = world_with_tiles(
            vec![TilePlacement::new(TileKind::Soil, Vec2::new(500.0, 100.0))],
            Tuning::default(),
        );
        // Sunk slightly into the tile from above, falling.
        let player = &mut world.registry.player;
        player.pos = Vec2::new(500.0, 100.0 + 16.0 + player.half.y - 2.0);
        player.vel = Vec2::new(0.0, -100.0);
        let (id, pos, half) = (player.id, player.pos, player.half);
        world.grid.update(id, pos, half);

        update(&mut world);

        let player = &world.registry.player;
        assert!(player.on_ground);
        assert_eq!(player.vel.y, 0.0);
        assert!(player.pos.y >= 100.0 + 16.0 + player.half.y - 0.001);
    }

    #[test]
    fn test_spring_launches_player() {
        let mut world = world_with_tiles(
            vec![TilePlacement::new(TileKind::Spring, Vec2::new(500.0, 100.0))],
            Tuning::default(),
        );
        let player = &mut world.registry.player;
        player.pos = Vec2::new(500.0, 100.0 + 16.0 + player.half.y - 2.0);
        player.vel = Vec2::new(0.0, -50.0);
        let (id, pos, half) = (player.id, player.pos, player.half);
        world.grid.update(id, pos, half);

        update(&mut world);

        let player = &world.registry.player;
        assert_eq!(player.vel.y, world.tuning.spring_impulse);
        assert!(!player.on_ground);
    }

    #[test]
    fn test_elevator_locks_and_carries_player() {
        let mut world = world_with_tiles(
            vec![TilePlacement {
                kind: TileKind::Elevator,
                pos: Vec2::new(500.0, 100.0),
                durability: None,
                travel: 40.0,
            }],
            Tuning::default(),
        );
        let player = &mut world.registry.player;
        player.pos = Vec2::new(500.0, 100.0 + 16.0 + player.half.y - 2.0);
        player.vel = Vec2::new(0.0, -50.0);
        let (id, pos, half) = (player.id, player.pos, player.half);
        world.grid.update(id, pos, half);

        update(&mut world);

        let player = &world.registry.player;
        assert!(player.elevator_lock);
        assert!(player.on_ground);
        assert_eq!(player.vel.y, world.tuning.elevator_speed);
    }

    #[test]
    fn test_budget_defers_excess_pairs_one_tick() {
        let tuning = Tuning {
            collision_budget: 1,
            ..Default::default()
        };
        // Two separate ball-tile overlaps this tick.
        let mut world = world_with_tiles(
            vec![
                TilePlacement::new(TileKind::Soil, Vec2::new(100.0, 100.0)),
                TilePlacement::new(TileKind::Soil, Vec2::new(300.0, 100.0)),
            ],
            tuning,
        );
        let a = spawn_flying_ball(&mut world, Vec2::new(118.0, 100.0), Vec2::new(-10.0, 0.0));
        let b = spawn_flying_ball(&mut world, Vec2::new(318.0, 100.0), Vec2::new(-10.0, 0.0));

        update(&mut world);
        let first_bounces =
            world.registry.ball(a).unwrap().bounces + world.registry.ball(b).unwrap().bounces;
        assert_eq!(first_bounces, 1, "budget of one pair per tick");
        assert!(!world.deferred_pairs.is_empty());

        // Deferred pair lands next tick.
        update(&mut world);
        let second_bounces =
            world.registry.ball(a).unwrap().bounces + world.registry.ball(b).unwrap().bounces;
        assert_eq!(second_bounces, 2);
    }

    #[test]
    fn test_stale_deferred_pair_skips_cleanly() {
        let mut world = world_with_tiles(
            vec![TilePlacement::new(TileKind::Soil, Vec2::new(100.0, 100.0))],
            Tuning::default(),
        );
        let tile_id = world.registry.tiles()[0].id;
        let ball_id = spawn_flying_ball(&mut world, Vec2::new(118.0, 100.0), Vec2::new(-10.0, 0.0));
        // Simulate a pair deferred from last tick whose tile has since died.
        world.deferred_pairs.push(ordered(tile_id, ball_id));
        world.registry.remove_tile(tile_id);
        world.grid.remove(tile_id);

        update(&mut world);
        assert!(world.events.iter().all(|e| !matches!(e, GameEvent::Fault { .. })));
    }
}
