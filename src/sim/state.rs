//! World state: the orchestrator-owned bundle every system works against.
//!
//! All shared mutable state — registry, spatial index, pool, event queue —
//! lives here and is touched only inside [`super::tick::tick`]'s ordered
//! pass. There are no globals; tests build as many isolated worlds as they
//! like.

use glam::Vec2;

use crate::error::{LevelError, WorldError};
use crate::events::GameEvent;
use crate::level::{Bounds, LevelDesc};
use crate::sim::ball::Ball;
use crate::sim::player::{self, Player};
use crate::sim::pool::BallPool;
use crate::sim::registry::{EntityId, Registry};
use crate::sim::spatial::SpatialGrid;
use crate::sim::tile::Tile;
use crate::tuning::Tuning;

/// The complete simulation state.
#[derive(Debug)]
pub struct World {
    pub(crate) tuning: Tuning,
    pub(crate) bounds: Bounds,
    pub(crate) registry: Registry,
    pub(crate) grid: SpatialGrid,
    pub(crate) pool: BallPool,
    pub(crate) events: Vec<GameEvent>,
    /// Damage queued by collision handlers, applied by the tile system pass.
    pub(crate) pending_damage: Vec<(EntityId, f32)>,
    /// Candidate pairs the budget pushed into the next tick.
    pub(crate) deferred_pairs: Vec<(EntityId, EntityId)>,
    pub(crate) tick_count: u64,
    /// Caps Fault events at one per tick.
    pub(crate) faulted_this_tick: bool,
}

impl World {
    /// Validate tuning and level data, then build the world. Construction is
    /// the only place bad data is rejected; past this point the simulation
    /// never fails outward.
    pub fn new(tuning: Tuning, level: &LevelDesc) -> Result<Self, WorldError> {
        tuning.validate()?;
        level.validate()?;

        let mut registry = Registry::new(level.spawn);
        let mut grid = SpatialGrid::new();
        grid.insert(
            registry.player.id,
            registry.player.pos,
            registry.player.half,
        );

        for placement in &level.tiles {
            let id = registry.alloc_id();
            let tile = Tile::from_placement(id, placement, tuning.elevator_speed)
                .map_err(WorldError::Level)?;
            grid.insert(id, tile.pos, tile.half);
            registry.add_tile(tile);
        }

        let pool = BallPool::new(tuning.ball_capacity);
        log::info!(
            "world built: {} tiles, bounds {}x{}",
            level.tiles.len(),
            level.bounds.width(),
            level.bounds.height()
        );

        Ok(Self {
            tuning,
            bounds: level.bounds,
            registry,
            grid,
            pool,
            events: Vec::new(),
            pending_damage: Vec::new(),
            deferred_pairs: Vec::new(),
            tick_count: 0,
            faulted_this_tick: false,
        })
    }

    /// Swap in new level geometry and teleport the player to its spawn.
    /// Fails without touching the world if the description is invalid.
    pub fn load_level(&mut self, level: &LevelDesc) -> Result<(), LevelError> {
        level.validate()?;

        // Build everything fallible before mutating.
        let mut tiles = Vec::with_capacity(level.tiles.len());
        for placement in &level.tiles {
            let id = self.registry.alloc_id();
            tiles.push(Tile::from_placement(id, placement, self.tuning.elevator_speed)?);
        }

        self.grid.clear();
        self.registry.clear_tiles();
        for ball in self.registry.take_balls() {
            self.pool.release(ball);
        }
        self.pending_damage.clear();
        self.deferred_pairs.clear();

        let player = &mut self.registry.player;
        if let Some(held) = player.held.take() {
            self.pool.release(held);
        }
        *player = Player::new(player.id, level.spawn);
        self.grid.insert(player.id, player.pos, player.half);

        for tile in tiles {
            self.grid.insert(tile.id, tile.pos, tile.half);
            self.registry.add_tile(tile);
        }
        self.bounds = level.bounds;
        log::info!("level loaded: {} tiles", level.tiles.len());
        Ok(())
    }

    /// External kill signal. Any state goes to Death; idempotent.
    pub fn kill_player(&mut self) {
        player::kill(self);
    }

    /// Hand the accumulated events to the host, emptying the queue.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Read-only access ===

    pub fn player(&self) -> &Player {
        &self.registry.player
    }

    pub fn tiles(&self) -> &[Tile] {
        self.registry.tiles()
    }

    pub fn balls(&self) -> &[Ball] {
        self.registry.balls()
    }

    /// Stale ids return `None`, never a dangling reference.
    pub fn tile(&self, id: EntityId) -> Option<&Tile> {
        self.registry.tile(id)
    }

    pub fn ball(&self, id: EntityId) -> Option<&Ball> {
        self.registry.ball(id)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Player spawn/respawn point.
    pub fn spawn_point(&self) -> Vec2 {
        self.registry.player.respawn_point
    }
}
