//! Player entity and state machine.
//!
//! Nine states cover ground movement, the jump-forgiveness windows and the
//! aim/launch lifecycle. Input-driven transitions are evaluated before
//! physics-driven ones each tick, and the jump grant is one atomic helper
//! that consumes both forgiveness timers so a single press can never yield
//! two jumps.
//!
//! The state machine owns velocity *intent*; integration, gravity and bounds
//! clamping belong to [`super::movement`]. Ground contact is reported by the
//! collision pass, so the FSM always reads flags that are one tick old —
//! which is exactly what the coyote window is for.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{PLAYER_HALF_HEIGHT, PLAYER_HALF_WIDTH};
use crate::events::GameEvent;
use crate::sim::ball::{Ball, BallState};
use crate::sim::collision::{Hitbox, TagSet};
use crate::sim::registry::EntityId;
use crate::sim::state::World;
use crate::sim::tick::TickInput;
use crate::tuning::Tuning;

/// Below this the movement axis counts as centered.
const AXIS_DEADZONE: f32 = 0.01;

/// Player finite-state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    Idle,
    Moving,
    Jumping,
    Falling,
    /// Walked off a ledge; a jump is still granted for a grace window.
    CoyoteTime,
    /// Airborne with a buffered jump press waiting for the ground.
    JumpQueued,
    /// Holding a tracking ball. Gravity suspended.
    Aiming,
    /// Post-launch cooldown. Horizontal control frozen.
    Launching,
    /// Waiting out the respawn timer. Ignores input.
    Death,
}

/// The player actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    /// Hitbox center.
    pub pos: Vec2,
    pub vel: Vec2,
    pub half: Vec2,
    pub state: PlayerState,
    /// Seconds in the current state.
    pub state_time: f32,
    /// Set by the collision pass when standing on a surface.
    pub on_ground: bool,
    /// Remaining coyote grace, counts down while airborne.
    pub coyote_timer: f32,
    /// Remaining jump-buffer grace after a press.
    pub jump_buffer_timer: f32,
    /// Horizontal control stays frozen until this reaches zero.
    pub launch_cooldown: f32,
    /// Unit aim direction, kept fresh while aiming.
    pub aim_dir: Vec2,
    /// Riding an elevator: gravity suspended, carried by the platform.
    pub elevator_lock: bool,
    /// Where death returns the player to.
    pub respawn_point: Vec2,
    /// The aimed ball, exclusively owned until launch hands it to the
    /// registry or release-without-intent hands it back to the pool.
    pub held: Option<Ball>,
}

impl Player {
    pub const HITS: TagSet = TagSet::SURFACES;

    pub fn new(id: EntityId, spawn: Vec2) -> Self {
        Self {
            id,
            pos: spawn,
            vel: Vec2::ZERO,
            half: Vec2::new(PLAYER_HALF_WIDTH, PLAYER_HALF_HEIGHT),
            state: PlayerState::Idle,
            state_time: 0.0,
            on_ground: false,
            coyote_timer: 0.0,
            jump_buffer_timer: 0.0,
            launch_cooldown: 0.0,
            aim_dir: Vec2::X,
            elevator_lock: false,
            respawn_point: spawn,
            held: None,
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::Rect { half: self.half }
    }
}

/// Take a transition, emitting the state-change event. Same-state is a no-op.
fn transition(player: &mut Player, to: PlayerState, events: &mut Vec<GameEvent>) {
    if player.state == to {
        return;
    }
    events.push(GameEvent::PlayerStateChanged {
        from: player.state,
        to,
    });
    player.state = to;
    player.state_time = 0.0;
}

/// The one place a jump impulse is granted. Consumes both forgiveness timers
/// atomically so one press edge can never produce two jumps.
fn do_jump(player: &mut Player, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    player.vel.y = tuning.jump_impulse;
    player.coyote_timer = 0.0;
    player.jump_buffer_timer = 0.0;
    player.on_ground = false;
    transition(player, PlayerState::Jumping, events);
}

/// Grounded landing: Idle or Moving depending on the held axis.
fn land(player: &mut Player, move_axis: f32, events: &mut Vec<GameEvent>) {
    let to = if move_axis.abs() > AXIS_DEADZONE {
        PlayerState::Moving
    } else {
        PlayerState::Idle
    };
    transition(player, to, events);
}

/// External or fall-out kill. Any state -> Death; the held ball goes back to
/// the pool unlaunched.
pub(crate) fn kill(world: &mut World) {
    let World {
        registry,
        pool,
        events,
        ..
    } = world;
    let player = &mut registry.player;
    if player.state == PlayerState::Death {
        return;
    }
    if let Some(mut ball) = player.held.take() {
        ball.kill();
        pool.release(ball);
    }
    player.vel = Vec2::ZERO;
    let position = player.pos;
    transition(player, PlayerState::Death, events);
    events.push(GameEvent::PlayerDied { position });
    log::debug!("player died at ({}, {})", position.x, position.y);
}

/// Player FSM pass. Runs first in the tick, before movement and collision.
pub(crate) fn update(world: &mut World, input: &TickInput, dt: f32) {
    // Fell out of the level: same path as the external kill signal.
    let fell_out = {
        let p = &world.registry.player;
        p.state != PlayerState::Death && p.pos.y + p.half.y < world.bounds.min.y
    };
    if fell_out {
        kill(world);
    }

    let World {
        tuning,
        registry,
        grid,
        pool,
        events,
        ..
    } = world;
    let player = &mut registry.player;

    player.state_time += dt;
    player.coyote_timer = (player.coyote_timer - dt).max(0.0);
    player.jump_buffer_timer = (player.jump_buffer_timer - dt).max(0.0);
    player.launch_cooldown = (player.launch_cooldown - dt).max(0.0);

    // Death ignores input entirely; a timer walks it back to Idle.
    if player.state == PlayerState::Death {
        if player.state_time >= tuning.respawn_delay {
            let spawn = player.respawn_point;
            player.pos = spawn;
            player.vel = Vec2::ZERO;
            player.on_ground = false;
            player.elevator_lock = false;
            player.coyote_timer = 0.0;
            player.jump_buffer_timer = 0.0;
            player.launch_cooldown = 0.0;
            transition(player, PlayerState::Idle, events);
            events.push(GameEvent::PlayerRespawned { position: spawn });
            grid.update(player.id, spawn, player.half);
            log::debug!("player respawned at ({}, {})", spawn.x, spawn.y);
        }
        return;
    }

    // Buffer every jump press; grants consume the buffer.
    if input.jump_pressed {
        player.jump_buffer_timer = tuning.jump_buffer;
    }

    // --- Input-driven transitions ---

    // Aim start. Not mid launch-cooldown, not mid-air past the grace states.
    let can_start_aim = matches!(
        player.state,
        PlayerState::Idle | PlayerState::Moving | PlayerState::CoyoteTime | PlayerState::JumpQueued
    );
    if input.aim_pressed && can_start_aim && player.launch_cooldown <= 0.0 {
        let mut ball = pool.acquire(registry);
        let player = &mut registry.player;
        let offset = input.aim_pos - player.pos;
        player.aim_dir = if offset.length_squared() > f32::EPSILON {
            offset.normalize()
        } else {
            Vec2::X
        };
        player.vel = Vec2::ZERO;
        ball.state = BallState::Tracking;
        ball.track(player.pos, player.aim_dir, tuning.aim_hold_distance);
        player.held = Some(ball);
        transition(player, PlayerState::Aiming, events);
    }

    let player = &mut registry.player;
    if player.state == PlayerState::Aiming {
        // Keep the aim fresh and the held ball shadowing the player.
        let offset = input.aim_pos - player.pos;
        if offset.length_squared() > f32::EPSILON {
            player.aim_dir = offset.normalize();
        }
        let (pos, aim) = (player.pos, player.aim_dir);
        if let Some(ball) = player.held.as_mut() {
            ball.track(pos, aim, tuning.aim_hold_distance);
        }

        if input.aim_released {
            let has_intent = offset.length() >= tuning.aim_deadzone;
            if has_intent {
                // Launch: ownership moves from the player into the registry.
                if let Some(mut ball) = player.held.take() {
                    let dir = player.aim_dir;
                    ball.launch(dir, tuning.launch_speed);
                    events.push(GameEvent::BallLaunched {
                        ball: ball.id,
                        direction: dir,
                        speed: tuning.launch_speed,
                    });
                    grid.insert(ball.id, ball.pos, Vec2::splat(ball.radius));
                    registry.add_ball(ball);
                }
                let player = &mut registry.player;
                player.launch_cooldown = tuning.launch_cooldown;
                transition(player, PlayerState::Launching, events);
            } else {
                // No intent: the held ball despawns unlaunched.
                if let Some(mut ball) = player.held.take() {
                    ball.kill();
                    pool.release(ball);
                }
                let to = if player.on_ground {
                    PlayerState::Idle
                } else {
                    PlayerState::Falling
                };
                transition(player, to, events);
            }
        }
    }

    // --- Horizontal intent ---
    let player = &mut registry.player;
    let axis = input.move_axis.clamp(-1.0, 1.0);
    match player.state {
        PlayerState::Idle | PlayerState::Moving => {
            player.vel.x = axis * tuning.move_speed;
        }
        PlayerState::Jumping
        | PlayerState::Falling
        | PlayerState::CoyoteTime
        | PlayerState::JumpQueued => {
            player.vel.x = axis * tuning.move_speed * tuning.air_control;
        }
        PlayerState::Aiming => {
            player.vel.x = 0.0;
        }
        // Launching keeps its residual velocity (friction damps it);
        // Death froze it already.
        PlayerState::Launching | PlayerState::Death => {}
    }

    // --- Physics-driven transitions ---
    match player.state {
        PlayerState::Idle | PlayerState::Moving => {
            if player.on_ground && player.jump_buffer_timer > 0.0 {
                do_jump(player, tuning, events);
            } else if !player.on_ground {
                // Ground contact lost: grace window, not a straight fall.
                player.coyote_timer = tuning.coyote_time;
                transition(player, PlayerState::CoyoteTime, events);
            } else {
                land(player, axis, events);
            }
        }
        PlayerState::CoyoteTime => {
            if player.jump_buffer_timer > 0.0 && (player.on_ground || player.coyote_timer > 0.0) {
                do_jump(player, tuning, events);
            } else if player.on_ground {
                land(player, axis, events);
            } else if player.coyote_timer <= 0.0 {
                transition(player, PlayerState::Falling, events);
            }
        }
        PlayerState::Jumping => {
            if input.jump_pressed {
                transition(player, PlayerState::JumpQueued, events);
            } else if player.vel.y <= 0.0 {
                transition(player, PlayerState::Falling, events);
            }
        }
        PlayerState::Falling => {
            if player.on_ground && player.jump_buffer_timer > 0.0 {
                do_jump(player, tuning, events);
            } else if input.jump_pressed {
                transition(player, PlayerState::JumpQueued, events);
            } else if player.on_ground {
                land(player, axis, events);
            }
        }
        PlayerState::JumpQueued => {
            if player.on_ground {
                // Buffered jump executes the instant ground resumes.
                do_jump(player, tuning, events);
            } else if player.jump_buffer_timer <= 0.0 {
                transition(player, PlayerState::Falling, events);
            }
        }
        PlayerState::Launching => {
            if player.launch_cooldown <= 0.0 {
                if player.on_ground {
                    land(player, axis, events);
                } else {
                    transition(player, PlayerState::Falling, events);
                }
            }
        }
        PlayerState::Aiming | PlayerState::Death => {}
    }
}
