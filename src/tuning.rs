//! Data-driven gameplay balance.
//!
//! Every knob a designer might turn lives here, serde round-trippable so the
//! host can load it from whatever format its asset pipeline speaks. Fixed
//! engine constants (tick clamp, grid cell size) stay in [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// Gameplay balance constants, validated before a world is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    // === Player movement ===
    /// Downward acceleration, units/s².
    pub gravity: f32,
    /// Grounded horizontal speed, units/s.
    pub move_speed: f32,
    /// Airborne horizontal control as a fraction of `move_speed`.
    pub air_control: f32,
    /// Upward velocity granted by a jump, units/s.
    pub jump_impulse: f32,
    /// Exponential horizontal damping per second while the player has no
    /// horizontal control (launch cooldown).
    pub ground_friction: f32,

    // === Jump forgiveness ===
    /// Grace window after walking off a ledge during which a jump still lands.
    pub coyote_time: f32,
    /// Grace window before landing during which an early jump press is kept.
    pub jump_buffer: f32,

    // === Aim / launch ===
    /// Speed of a launched ball, units/s.
    pub launch_speed: f32,
    /// Horizontal control freeze after a launch, seconds.
    pub launch_cooldown: f32,
    /// Aim points closer to the player than this launch nothing on release.
    pub aim_deadzone: f32,
    /// Distance at which the tracking ball shadows the player.
    pub aim_hold_distance: f32,

    // === Ball ===
    /// Flying lifetime before a ball expires, seconds.
    pub ball_lifetime: f32,
    /// Bounces after which a ball expires.
    pub max_bounces: u32,
    /// Damage a flying ball deals per tile impact.
    pub ball_damage: f32,
    /// Hard cap on live + pooled balls.
    pub ball_capacity: usize,

    // === Tiles ===
    /// Destroying -> destroyed animation duration, seconds.
    pub destroy_duration: f32,
    /// Upward velocity a spring tile imparts, units/s.
    pub spring_impulse: f32,
    /// Elevator platform travel speed, units/s.
    pub elevator_speed: f32,

    // === Player lifecycle ===
    /// Death -> respawn delay, seconds.
    pub respawn_delay: f32,

    // === Backpressure ===
    /// Candidate collision pairs processed per tick; the rest defer one tick.
    pub collision_budget: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 1500.0,
            move_speed: 160.0,
            air_control: 0.65,
            jump_impulse: 520.0,
            ground_friction: 10.0,

            coyote_time: 0.1,
            jump_buffer: 0.1,

            launch_speed: 420.0,
            launch_cooldown: 0.25,
            aim_deadzone: 12.0,
            aim_hold_distance: 20.0,

            ball_lifetime: 5.0,
            max_bounces: 8,
            ball_damage: 1.0,
            ball_capacity: 16,

            destroy_duration: 0.3,
            spring_impulse: 700.0,
            elevator_speed: 48.0,

            respawn_delay: 1.5,

            collision_budget: 256,
        }
    }
}

impl Tuning {
    /// Reject values that would make the simulation degenerate (zero-capacity
    /// pools, non-positive budgets, negative timers).
    pub fn validate(&self) -> Result<(), TuningError> {
        fn positive(name: &'static str, value: f32) -> Result<(), TuningError> {
            if value > 0.0 {
                Ok(())
            } else {
                Err(TuningError {
                    name,
                    value,
                    valid_range: "(0.0, inf)",
                })
            }
        }
        fn non_negative(name: &'static str, value: f32) -> Result<(), TuningError> {
            if value >= 0.0 {
                Ok(())
            } else {
                Err(TuningError {
                    name,
                    value,
                    valid_range: "[0.0, inf)",
                })
            }
        }

        positive("gravity", self.gravity)?;
        positive("move_speed", self.move_speed)?;
        non_negative("air_control", self.air_control)?;
        positive("jump_impulse", self.jump_impulse)?;
        non_negative("ground_friction", self.ground_friction)?;
        non_negative("coyote_time", self.coyote_time)?;
        non_negative("jump_buffer", self.jump_buffer)?;
        positive("launch_speed", self.launch_speed)?;
        non_negative("launch_cooldown", self.launch_cooldown)?;
        non_negative("aim_deadzone", self.aim_deadzone)?;
        positive("aim_hold_distance", self.aim_hold_distance)?;
        positive("ball_lifetime", self.ball_lifetime)?;
        positive("ball_damage", self.ball_damage)?;
        positive("destroy_duration", self.destroy_duration)?;
        positive("spring_impulse", self.spring_impulse)?;
        positive("elevator_speed", self.elevator_speed)?;
        positive("respawn_delay", self.respawn_delay)?;

        if self.ball_capacity == 0 {
            return Err(TuningError {
                name: "ball_capacity",
                value: 0.0,
                valid_range: "[1, inf)",
            });
        }
        if self.collision_budget == 0 {
            return Err(TuningError {
                name: "collision_budget",
                value: 0.0,
                valid_range: "[1, inf)",
            });
        }
        Ok(())
    }
}
