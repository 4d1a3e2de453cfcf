//! Level description consumed from an external loader.
//!
//! The core parses no file format. Whatever reads levels off disk (or
//! generates them) hands over a flat [`LevelDesc`]: bounds, a spawn point and
//! a tile placement list. Everything is serde-derived so the loader can use
//! any format; validation happens when the world is built, not here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::LevelError;
use crate::sim::tile::TileKind;

/// Axis-aligned level bounds. +y is up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// True when an AABB lies entirely outside the bounds.
    pub fn is_outside(&self, center: Vec2, half: Vec2) -> bool {
        center.x + half.x < self.min.x
            || center.x - half.x > self.max.x
            || center.y + half.y < self.min.y
            || center.y - half.y > self.max.y
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// One tile in the placement list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePlacement {
    pub kind: TileKind,
    /// Tile center in world units.
    pub pos: Vec2,
    /// Starting durability for destructible kinds. `None` takes the kind's
    /// default; ignored for indestructible kinds.
    #[serde(default)]
    pub durability: Option<f32>,
    /// Elevator travel half-range from the placement point, world units.
    /// Zero (the default) for every other kind.
    #[serde(default)]
    pub travel: f32,
}

impl TilePlacement {
    pub fn new(kind: TileKind, pos: Vec2) -> Self {
        Self {
            kind,
            pos,
            durability: None,
            travel: 0.0,
        }
    }
}

/// A complete level as the core consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDesc {
    pub bounds: Bounds,
    /// Player spawn (and respawn) point.
    pub spawn: Vec2,
    pub tiles: Vec<TilePlacement>,
}

impl LevelDesc {
    /// Structural checks that don't need per-tile context: bounds with area,
    /// spawn inside them. Per-tile validation happens in tile construction.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.bounds.width() <= 0.0 || self.bounds.height() <= 0.0 {
            return Err(LevelError::DegenerateBounds);
        }
        if !self.bounds.contains(self.spawn) {
            return Err(LevelError::SpawnOutOfBounds);
        }
        Ok(())
    }
}
