//! Destructible terrain: tile kinds, durability and the destruction system.
//!
//! Damage flows in one direction: collision handlers enqueue damage events,
//! this system applies them, durability maps onto a visual state, and a tile
//! that reaches zero runs a fixed destroying timer before it is removed from
//! the registry and the spatial index in the same tick it finishes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{INDESTRUCTIBLE, TILE_SIZE};
use crate::error::LevelError;
use crate::events::GameEvent;
use crate::level::TilePlacement;
use crate::sim::collision::{CollisionTag, Hitbox};
use crate::sim::registry::EntityId;
use crate::sim::state::World;

/// The level palette. Immutable per tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// One hit.
    Soil,
    /// Takes a few hits.
    Brick,
    /// Armored.
    Plate,
    /// Level boundary material, indestructible.
    Bedrock,
    /// Bounces the player upward. Indestructible.
    Spring,
    /// Oscillating vertical platform. Indestructible.
    Elevator,
}

impl TileKind {
    pub fn name(self) -> &'static str {
        match self {
            TileKind::Soil => "soil",
            TileKind::Brick => "brick",
            TileKind::Plate => "plate",
            TileKind::Bedrock => "bedrock",
            TileKind::Spring => "spring",
            TileKind::Elevator => "elevator",
        }
    }

    /// Loader-facing lookup. Unknown names are a construction error upstream.
    pub fn from_name(name: &str) -> Option<TileKind> {
        match name {
            "soil" => Some(TileKind::Soil),
            "brick" => Some(TileKind::Brick),
            "plate" => Some(TileKind::Plate),
            "bedrock" => Some(TileKind::Bedrock),
            "spring" => Some(TileKind::Spring),
            "elevator" => Some(TileKind::Elevator),
            _ => None,
        }
    }

    pub fn destructible(self) -> bool {
        matches!(self, TileKind::Soil | TileKind::Brick | TileKind::Plate)
    }

    /// Default durability for destructible kinds.
    pub fn default_durability(self) -> f32 {
        match self {
            TileKind::Soil => 1.0,
            TileKind::Brick => 3.0,
            TileKind::Plate => 6.0,
            TileKind::Bedrock | TileKind::Spring | TileKind::Elevator => INDESTRUCTIBLE,
        }
    }

    pub fn tag(self) -> CollisionTag {
        match self {
            TileKind::Soil | TileKind::Brick | TileKind::Plate => CollisionTag::Tile,
            TileKind::Bedrock => CollisionTag::Wall,
            TileKind::Spring => CollisionTag::Spring,
            TileKind::Elevator => CollisionTag::Elevator,
        }
    }
}

/// Visual/durability state. A pure function of the durability ratio, except
/// Destroying -> Destroyed which is time-gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileState {
    Intact,
    Damaged,
    HeavilyDamaged,
    Destroying,
    Destroyed,
}

/// State for a durability ratio in [0, 1].
fn state_for_ratio(ratio: f32) -> TileState {
    if ratio > 2.0 / 3.0 {
        TileState::Intact
    } else if ratio > 1.0 / 3.0 {
        TileState::Damaged
    } else if ratio > 0.0 {
        TileState::HeavilyDamaged
    } else {
        TileState::Destroying
    }
}

/// One terrain tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: EntityId,
    /// Center position.
    pub pos: Vec2,
    pub half: Vec2,
    pub kind: TileKind,
    /// Remaining hit points, or [`INDESTRUCTIBLE`].
    pub durability: f32,
    pub max_durability: f32,
    pub state: TileState,
    /// Seconds left in the destroying animation.
    pub destroy_timer: f32,
    /// Platform velocity. Zero for everything but elevators.
    pub vel: Vec2,
    /// Oscillation center for elevators.
    pub anchor_y: f32,
    /// Elevator travel half-range. Zero = stationary tile.
    pub travel: f32,
}

impl Tile {
    /// Build a tile from a loader placement. Rejects bad durability and
    /// travel values instead of coercing them.
    pub fn from_placement(
        id: EntityId,
        placement: &TilePlacement,
        elevator_speed: f32,
    ) -> Result<Tile, LevelError> {
        let kind = placement.kind;
        let durability = if kind.destructible() {
            let value = placement.durability.unwrap_or_else(|| kind.default_durability());
            if value <= 0.0 {
                return Err(LevelError::InvalidDurability {
                    kind: kind.name(),
                    value,
                });
            }
            value
        } else {
            INDESTRUCTIBLE
        };

        if placement.travel < 0.0 {
            return Err(LevelError::InvalidTravel {
                value: placement.travel,
            });
        }
        let (vel, travel) = if kind == TileKind::Elevator {
            (Vec2::new(0.0, elevator_speed), placement.travel)
        } else {
            (Vec2::ZERO, 0.0)
        };

        Ok(Tile {
            id,
            pos: placement.pos,
            half: Vec2::splat(TILE_SIZE / 2.0),
            kind,
            durability,
            max_durability: durability,
            state: TileState::Intact,
            destroy_timer: 0.0,
            vel,
            anchor_y: placement.pos.y,
            travel,
        })
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::Rect { half: self.half }
    }

    pub fn destructible(&self) -> bool {
        self.kind.destructible()
    }

    /// Durability ratio in [0, 1]; indestructible tiles report 1.
    pub fn ratio(&self) -> f32 {
        if self.destructible() && self.max_durability > 0.0 {
            self.durability / self.max_durability
        } else {
            1.0
        }
    }

    /// Apply one damage event. Indestructible tiles and tiles already past
    /// the point of no return accept the event and ignore it.
    pub fn apply_damage(
        &mut self,
        amount: f32,
        destroy_duration: f32,
        events: &mut Vec<GameEvent>,
    ) {
        if !self.destructible() || self.state >= TileState::Destroying {
            return;
        }

        self.durability = (self.durability - amount).clamp(0.0, self.max_durability);
        events.push(GameEvent::TileDamaged {
            tile: self.id,
            amount,
            durability: self.durability,
        });

        let new_state = state_for_ratio(self.ratio());
        if new_state != self.state {
            events.push(GameEvent::TileStateChanged {
                tile: self.id,
                from: self.state,
                to: new_state,
            });
            self.state = new_state;
            if new_state == TileState::Destroying {
                self.destroy_timer = destroy_duration;
                events.push(GameEvent::TileCrumbling {
                    tile: self.id,
                    position: self.pos,
                });
            }
        }
    }
}

/// Tile system pass: route queued damage, advance destroying timers, remove
/// finished tiles from the registry and the spatial index.
pub(crate) fn update(world: &mut World, dt: f32) {
    let destroy_duration = world.tuning.destroy_duration;

    // Damage queued by this tick's collision pass. Stale ids (tile already
    // gone) are inert by design.
    let pending = std::mem::take(&mut world.pending_damage);
    for (id, amount) in pending {
        if let Some(tile) = world.registry.tile_mut(id) {
            tile.apply_damage(amount, destroy_duration, &mut world.events);
        }
    }

    // Time-gated Destroying -> Destroyed.
    let mut finished: Vec<EntityId> = Vec::new();
    for tile in world.registry.tiles_mut() {
        if tile.state == TileState::Destroying {
            tile.destroy_timer -= dt;
            if tile.destroy_timer <= 0.0 {
                tile.state = TileState::Destroyed;
                finished.push(tile.id);
            }
        }
    }

    for id in finished {
        if let Some(tile) = world.registry.remove_tile(id) {
            world.grid.remove(id);
            world.events.push(GameEvent::TileDestroyed {
                tile: id,
                position: tile.pos,
            });
        }
    }
}
