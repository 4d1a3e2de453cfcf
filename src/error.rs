//! Simulation error types.
//!
//! Construction problems (bad level data, bad tuning) are rejected with these
//! types before a [`crate::sim::World`] exists. Once the world is ticking,
//! nothing here crosses the API boundary: runtime faults are logged and
//! surfaced as a [`crate::events::GameEvent::Fault`] so the host loop never
//! has to unwind mid-frame.

use std::fmt;

/// A tile placement or level description the core refuses to build.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelError {
    /// Loader handed us a tile kind name the palette doesn't know.
    UnknownKind { name: String },

    /// A destructible tile was given a non-positive durability. The
    /// indestructible sentinel is internal and never valid in level data.
    InvalidDurability { kind: &'static str, value: f32 },

    /// An elevator placement with a negative travel range.
    InvalidTravel { value: f32 },

    /// Level bounds with zero or negative area.
    DegenerateBounds,

    /// Spawn point outside the level bounds.
    SpawnOutOfBounds,
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::UnknownKind { name } => {
                write!(f, "unknown tile kind '{}'", name)
            }
            LevelError::InvalidDurability { kind, value } => write!(
                f,
                "tile kind '{}' requires positive durability, got {}",
                kind, value
            ),
            LevelError::InvalidTravel { value } => {
                write!(f, "elevator travel range must be non-negative, got {}", value)
            }
            LevelError::DegenerateBounds => write!(f, "level bounds have no area"),
            LevelError::SpawnOutOfBounds => write!(f, "spawn point lies outside level bounds"),
        }
    }
}

impl std::error::Error for LevelError {}

/// A tuning constant outside its safe operating range.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningError {
    /// Field name (for logging).
    pub name: &'static str,
    /// The value that was rejected.
    pub value: f32,
    /// Human-readable description of the valid range.
    pub valid_range: &'static str,
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tuning field '{}' = {} is outside valid range {}",
            self.name, self.value, self.valid_range
        )
    }
}

impl std::error::Error for TuningError {}

/// Anything that can stop [`crate::sim::World::new`] from constructing.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldError {
    Tuning(TuningError),
    Level(LevelError),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::Tuning(e) => write!(f, "invalid tuning: {}", e),
            WorldError::Level(e) => write!(f, "invalid level: {}", e),
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorldError::Tuning(e) => Some(e),
            WorldError::Level(e) => Some(e),
        }
    }
}

impl From<TuningError> for WorldError {
    fn from(e: TuningError) -> Self {
        WorldError::Tuning(e)
    }
}

impl From<LevelError> for WorldError {
    fn from(e: LevelError) -> Self {
        WorldError::Level(e)
    }
}

/// Runtime fault inside a tick. Never escapes `tick()`; the collision
/// resolver logs these and keeps going.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// An entity id was referenced but is no longer live. Usually a pair
    /// deferred across a tick whose participant got destroyed in between.
    EntityNotFound { context: &'static str },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::EntityNotFound { context } => {
                write!(f, "entity not found during '{}'", context)
            }
        }
    }
}

impl std::error::Error for SimError {}

/// Convenience alias used by collision handlers.
pub type SimResult<T> = Result<T, SimError>;
