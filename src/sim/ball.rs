//! Ball entity and its aim/track/fly/despawn lifecycle.
//!
//! Balls are pooled: the pool hands one to the player on aim-start (Tracking,
//! held by value), ownership moves into the registry on launch (Flying), and
//! the reclamation pass at the end of a tick returns Dead balls to the free
//! list. Every mutable field is wiped on release so nothing leaks between
//! acquisitions.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::BALL_RADIUS;
use crate::sim::collision::{Hitbox, TagSet};
use crate::sim::registry::EntityId;
use crate::sim::state::World;

/// Lifecycle state of a ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    /// On the pool free list.
    Idle,
    /// Held by the aiming player: follows them, mirrors the aim direction,
    /// feels no gravity.
    Tracking,
    /// Constant-speed projectile. No gravity, reflects on collision.
    Flying,
    /// Waiting for the reclamation pass.
    Dead,
}

/// A bouncing projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub state: BallState,
    /// Unit aim direction while tracking; launch direction once flying.
    pub aim_dir: Vec2,
    /// Surfaces reflected off since launch.
    pub bounces: u32,
    /// Seconds spent flying.
    pub age: f32,
}

impl Ball {
    /// Surfaces a ball collides with. One-sided opt-in: tiles don't list the
    /// ball back.
    pub const HITS: TagSet = TagSet::SURFACES;

    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
            state: BallState::Idle,
            aim_dir: Vec2::ZERO,
            bounces: 0,
            age: 0.0,
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::Circle {
            radius: self.radius,
        }
    }

    /// Shadow the aiming player at the hold distance along the aim direction.
    pub fn track(&mut self, player_pos: Vec2, aim_dir: Vec2, hold_distance: f32) {
        self.aim_dir = aim_dir;
        self.pos = player_pos + aim_dir * hold_distance;
    }

    /// Transition Tracking -> Flying at the fixed launch speed.
    pub fn launch(&mut self, dir: Vec2, speed: f32) {
        self.aim_dir = dir;
        self.vel = dir * speed;
        self.state = BallState::Flying;
    }

    /// Reflect off a surface normal and count the bounce. Speed is preserved.
    pub fn bounce(&mut self, normal: Vec2) {
        self.vel = super::collision::reflect(self.vel, normal);
        self.bounces += 1;
    }

    /// Mark for reclamation. Idempotent from any state.
    pub fn kill(&mut self) {
        self.state = BallState::Dead;
    }

    /// Wipe every mutable field back to the freshly-constructed value. The
    /// id stays; the pool assigns a new one when the instance is re-issued.
    pub fn reset(&mut self) {
        self.pos = Vec2::ZERO;
        self.vel = Vec2::ZERO;
        self.radius = BALL_RADIUS;
        self.state = BallState::Idle;
        self.aim_dir = Vec2::ZERO;
        self.bounces = 0;
        self.age = 0.0;
    }
}

/// Ball state machine pass: age flying balls and kill the expired ones.
/// Runs after the tile system; reclamation picks the corpses up afterwards.
pub(crate) fn update(world: &mut World, dt: f32) {
    let lifetime = world.tuning.ball_lifetime;
    let max_bounces = world.tuning.max_bounces;
    let bounds = world.bounds;

    for ball in world.registry.balls_mut() {
        if ball.state != BallState::Flying {
            continue;
        }
        ball.age += dt;
        let expired = ball.age > lifetime
            || ball.bounces > max_bounces
            || bounds.is_outside(ball.pos, Vec2::splat(ball.radius));
        if expired {
            ball.kill();
        }
    }
}
