//! Typed events emitted by the simulation.
//!
//! The core never talks to audio, particles, cameras or UI directly. Every
//! externally interesting state change lands in the world's event queue and
//! the host drains it after each tick with
//! [`crate::sim::World::drain_events`]. Events are plain serde-able data so a
//! replay recorder can persist them in whatever format it likes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::player::PlayerState;
use crate::sim::registry::EntityId;
use crate::sim::tile::TileState;

/// One externally visible simulation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A destructible tile absorbed damage.
    TileDamaged {
        tile: EntityId,
        amount: f32,
        /// Durability remaining after the hit.
        durability: f32,
    },
    /// A tile moved between durability states.
    TileStateChanged {
        tile: EntityId,
        from: TileState,
        to: TileState,
    },
    /// A tile hit zero durability and started its destruction animation.
    /// Particle collaborators key their burst off the tile center.
    TileCrumbling { tile: EntityId, position: Vec2 },
    /// A tile finished destroying and left the world this tick.
    TileDestroyed { tile: EntityId, position: Vec2 },

    /// The player launched an aimed ball.
    BallLaunched {
        ball: EntityId,
        direction: Vec2,
        speed: f32,
    },
    /// A flying ball reflected off a surface.
    BallBounced {
        ball: EntityId,
        position: Vec2,
        normal: Vec2,
        bounces: u32,
    },

    /// The player state machine took a transition.
    PlayerStateChanged { from: PlayerState, to: PlayerState },
    /// The player died (kill signal or fell out of the level).
    PlayerDied { position: Vec2 },
    /// The respawn timer elapsed and the player teleported to the spawn point.
    PlayerRespawned { position: Vec2 },

    /// A collision callback faulted or the tick hit an inconsistency. Emitted
    /// at most once per tick; the host can only log it and carry on, which is
    /// exactly what the core already did.
    Fault { context: String },
}
