use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tileworld_common::{
    ChunkPosition, GlobalTilePosition, LookupError, TileOffset, WorldPosition,
};

use crate::chunk::Chunk;
use crate::tile::{Solidity, Tile};

/// A record produced by every mutation to the world.
///
/// Consumers holding derived data (a computed path, a streamed view) watch
/// the log or [`World::revision`] to decide when to recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// A chunk was registered at the given slot.
    ChunkInserted { position: ChunkPosition },
    /// A chunk was evicted from the given slot.
    ChunkRemoved { position: ChunkPosition },
    /// A tile's solidity changed.
    SolidityChanged {
        position: GlobalTilePosition,
        old: Solidity,
        new: Solidity,
    },
}

/// The authoritative tile world.
///
/// Chunks are kept in a store keyed by [`ChunkPosition`]. Every query works in
/// global coordinates and resolves the owning chunk itself, so callers never
/// see chunk boundaries.
///
/// [`World::new`] (and `Default`) start with the origin chunk registered;
/// [`World::empty`] starts with none, for callers that stream every chunk in.
///
/// Only chunks in the representable range
/// ([`ChunkPosition::is_representable`]) can be registered, so every loaded
/// tile has an exact world position.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone)]
pub struct World {
    chunks: BTreeMap<ChunkPosition, Chunk>,
    /// Incremented on every mutation.
    revision: u64,
    /// Append-only event log of all mutations.
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Create a world with one open chunk at the origin slot.
    pub fn new() -> Self {
        let mut world = Self::empty();
        world.store_chunk(Chunk::new(ChunkPosition::ORIGIN));
        world
    }

    /// Create a world with no chunks loaded.
    pub fn empty() -> Self {
        Self {
            chunks: BTreeMap::new(),
            revision: 0,
            event_log: Vec::new(),
        }
    }

    /// Mutation counter; changes whenever terrain or the chunk set changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Positions of all loaded chunks in ascending order.
    pub fn chunk_positions(&self) -> impl Iterator<Item = ChunkPosition> + '_ {
        self.chunks.keys().copied()
    }

    pub fn contains_chunk(&self, position: ChunkPosition) -> bool {
        self.chunks.contains_key(&position)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Register a chunk in its slot. Returns the chunk it replaced, if any.
    ///
    /// Fails with `ChunkOutOfRange` when the slot is outside the
    /// representable range.
    pub fn insert_chunk(&mut self, chunk: Chunk) -> Result<Option<Chunk>, LookupError> {
        let position = chunk.position();
        if !position.is_representable() {
            return Err(LookupError::ChunkOutOfRange(position));
        }
        Ok(self.store_chunk(chunk))
    }

    fn store_chunk(&mut self, chunk: Chunk) -> Option<Chunk> {
        let position = chunk.position();
        let replaced = self.chunks.insert(position, chunk);
        tracing::trace!(%position, replaced = replaced.is_some(), "chunk inserted");
        self.record(WorldEvent::ChunkInserted { position });
        replaced
    }

    /// Evict the chunk in a slot. Returns it if it was loaded.
    pub fn remove_chunk(&mut self, position: ChunkPosition) -> Option<Chunk> {
        let removed = self.chunks.remove(&position);
        if removed.is_some() {
            tracing::trace!(%position, "chunk removed");
            self.record(WorldEvent::ChunkRemoved { position });
        }
        removed
    }

    /// The chunk registered at `position`.
    pub fn chunk_at(&self, position: ChunkPosition) -> Result<&Chunk, LookupError> {
        self.chunks
            .get(&position)
            .ok_or(LookupError::ChunkNotLoaded(position))
    }

    /// Tile at a global position, resolving the owning chunk.
    pub fn tile_at(&self, global: GlobalTilePosition) -> Result<&Tile, LookupError> {
        let (chunk, local) = global.split();
        self.chunk_at(chunk)?.tile(local)
    }

    /// Tile containing a render-space point.
    pub fn tile_at_world(&self, world: WorldPosition) -> Result<&Tile, LookupError> {
        self.tile_at(world.to_global())
    }

    pub fn is_solid(&self, global: GlobalTilePosition) -> Result<bool, LookupError> {
        self.tile_at(global).map(Tile::is_solid)
    }

    pub fn global_position_of(&self, tile: &Tile) -> GlobalTilePosition {
        tile.global()
    }

    /// Render-space center of a tile.
    ///
    /// Fails when the tile's owning chunk is not registered in this world.
    pub fn world_position_of(&self, tile: &Tile) -> Result<WorldPosition, LookupError> {
        self.chunk_at(tile.chunk())?;
        Ok(tile.global().to_world())
    }

    /// Tile at `tile + offset`, crossing chunk boundaries as needed.
    pub fn neighbor_of(&self, tile: &Tile, offset: TileOffset) -> Result<&Tile, LookupError> {
        let global = tile
            .global()
            .offset(offset)
            .ok_or(LookupError::OffsetOverflow { offset })?;
        self.tile_at(global)
    }

    /// Change a tile's solidity, returning the previous state.
    ///
    /// Setting the state a tile already has is not recorded.
    pub fn set_solidity(
        &mut self,
        global: GlobalTilePosition,
        solidity: Solidity,
    ) -> Result<Solidity, LookupError> {
        let (chunk, local) = global.split();
        let chunk = self
            .chunks
            .get_mut(&chunk)
            .ok_or(LookupError::ChunkNotLoaded(chunk))?;
        let old = chunk.set_solidity(local, solidity)?;
        if old != solidity {
            tracing::trace!(%global, ?old, new = ?solidity, "solidity changed");
            self.record(WorldEvent::SolidityChanged {
                position: global,
                old,
                new: solidity,
            });
        }
        Ok(old)
    }

    fn record(&mut self, event: WorldEvent) {
        self.revision += 1;
        self.event_log.push(event);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
