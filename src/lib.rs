//! Tilewreck - simulation core for a side-scrolling destruction game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player, ball, destructible tiles, collisions)
//! - `level`: Level description consumed from an external loader
//! - `tuning`: Data-driven game balance
//! - `events`: Typed event stream for host collaborators
//!
//! The crate owns no rendering, audio, input devices or file formats. The host
//! loop feeds [`sim::TickInput`] and a delta time into [`sim::tick`] once per
//! frame step and drains [`events::GameEvent`]s afterwards.

pub mod error;
pub mod events;
pub mod level;
pub mod sim;
pub mod tuning;

pub use error::{LevelError, SimError, SimResult, TuningError, WorldError};
pub use events::GameEvent;
pub use level::{Bounds, LevelDesc, TilePlacement};
pub use sim::{TickInput, World, tick};
pub use tuning::Tuning;

/// Engine constants that are not gameplay balance
pub mod consts {
    /// Largest delta time the simulation will integrate in one tick.
    ///
    /// A stalled host frame hands us a huge dt; integrating it whole would let
    /// a fast ball tunnel through a thin tile. Anything above this is clamped.
    pub const MAX_TICK_DT: f32 = 1.0 / 30.0;

    /// Spatial grid cell edge. Must exceed the largest hitbox extent so an
    /// entity never spans more than a 2x2 block of cells.
    pub const GRID_CELL_SIZE: f32 = 64.0;

    /// Tile edge length (tiles are square, anchored at their center)
    pub const TILE_SIZE: f32 = 32.0;

    /// Player hitbox half extents
    pub const PLAYER_HALF_WIDTH: f32 = 11.0;
    pub const PLAYER_HALF_HEIGHT: f32 = 15.0;

    /// Ball hitbox radius
    pub const BALL_RADIUS: f32 = 6.0;

    /// Durability sentinel for tiles that never take damage
    pub const INDESTRUCTIBLE: f32 = -1.0;
}
