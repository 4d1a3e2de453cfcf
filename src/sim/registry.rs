//! Entity id allocation and sole-owner entity storage.
//!
//! The registry owns every live entity; systems pass ids around and borrow
//! for the duration of a tick at most. Tiles and balls sit in id-sorted
//! vectors — ids are allocated monotonically and never reused, so pushes
//! keep the order and binary search gives O(log n) lookup with fully
//! deterministic iteration.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::collision::{CollisionTag, Hitbox, TagSet};
use super::player::Player;
use super::tile::Tile;

/// Unique identifier for an entity. Never reused within a world; a pooled
/// ball gets a fresh id on every acquisition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

/// Everything the collision resolver needs to know about one entity.
#[derive(Debug, Clone, Copy)]
pub struct ColliderRef {
    pub pos: Vec2,
    pub shape: Hitbox,
    pub tag: CollisionTag,
    pub hits: TagSet,
}

/// Sole owner of all live entities.
#[derive(Debug)]
pub struct Registry {
    pub player: Player,
    tiles: Vec<Tile>,
    balls: Vec<Ball>,
    next_id: u32,
}

impl Registry {
    /// Build a registry holding only the player, spawned at `spawn`.
    pub fn new(spawn: Vec2) -> Self {
        let mut registry = Self {
            player: Player::new(EntityId(0), spawn),
            tiles: Vec::new(),
            balls: Vec::new(),
            next_id: 0,
        };
        let player_id = registry.alloc_id();
        registry.player.id = player_id;
        registry
    }

    /// Allocate the next entity id.
    pub fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    // === Tiles ===

    pub fn add_tile(&mut self, tile: Tile) {
        debug_assert!(
            self.tiles.last().is_none_or(|last| last.id < tile.id),
            "tile ids must be inserted in allocation order"
        );
        self.tiles.push(tile);
    }

    pub fn tile(&self, id: EntityId) -> Option<&Tile> {
        self.tiles
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, id: EntityId) -> Option<&mut Tile> {
        self.tiles
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|i| &mut self.tiles[i])
    }

    pub fn remove_tile(&mut self, id: EntityId) -> Option<Tile> {
        self.tiles
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|i| self.tiles.remove(i))
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// Drop all tiles (level reload).
    pub fn clear_tiles(&mut self) {
        self.tiles.clear();
    }

    // === Balls ===

    pub fn add_ball(&mut self, ball: Ball) {
        debug_assert!(
            self.balls.last().is_none_or(|last| last.id < ball.id),
            "ball ids must be inserted in allocation order"
        );
        self.balls.push(ball);
    }

    pub fn ball(&self, id: EntityId) -> Option<&Ball> {
        self.balls
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &self.balls[i])
    }

    pub fn ball_mut(&mut self, id: EntityId) -> Option<&mut Ball> {
        self.balls
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &mut self.balls[i])
    }

    pub fn remove_ball(&mut self, id: EntityId) -> Option<Ball> {
        self.balls
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| self.balls.remove(i))
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn balls_mut(&mut self) -> &mut [Ball] {
        &mut self.balls
    }

    /// Oldest live ball — the forced-recycle victim when the pool is dry.
    /// Ids are monotonic, so the front of the vector is the oldest.
    pub fn oldest_ball(&self) -> Option<EntityId> {
        self.balls.first().map(|b| b.id)
    }

    /// Remove and return every live ball (level reload hands them back to
    /// the pool).
    pub fn take_balls(&mut self) -> Vec<Ball> {
        std::mem::take(&mut self.balls)
    }

    // === Collision view ===

    /// Collision-relevant view of any live entity. Stale ids return `None`.
    pub fn collider(&self, id: EntityId) -> Option<ColliderRef> {
        if id == self.player.id {
            return Some(ColliderRef {
                pos: self.player.pos,
                shape: self.player.hitbox(),
                tag: CollisionTag::Player,
                hits: Player::HITS,
            });
        }
        if let Some(tile) = self.tile(id) {
            return Some(ColliderRef {
                pos: tile.pos,
                shape: tile.hitbox(),
                tag: tile.kind.tag(),
                hits: TagSet::EMPTY,
            });
        }
        self.ball(id).map(|ball| ColliderRef {
            pos: ball.pos,
            shape: ball.hitbox(),
            tag: CollisionTag::Ball,
            hits: Ball::HITS,
        })
    }
}
