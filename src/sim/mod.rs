//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One ordered pass per tick, no parallel systems
//! - Stable iteration order (by entity ID)
//! - No rendering, platform or I/O dependencies
//!
//! Tick order: player FSM -> movement -> collision -> tiles -> ball FSM ->
//! pool reclamation. Systems never retain entity references across ticks;
//! everything travels by [`registry::EntityId`].

pub mod ball;
pub mod collision;
pub mod movement;
pub mod player;
pub mod pool;
pub mod registry;
pub mod resolver;
pub mod spatial;
pub mod state;
pub mod tick;
pub mod tile;

pub use ball::{Ball, BallState};
pub use collision::{CollisionTag, Contact, Hitbox, TagSet, reflect};
pub use player::{Player, PlayerState};
pub use pool::BallPool;
pub use registry::{EntityId, Registry};
pub use spatial::SpatialGrid;
pub use state::World;
pub use tick::{TickInput, tick};
pub use tile::{Tile, TileKind, TileState};
