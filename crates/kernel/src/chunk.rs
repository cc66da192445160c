use tileworld_common::{
    CHUNK_AREA, CHUNK_HEIGHT, CHUNK_WIDTH, ChunkPosition, LocalTilePosition, LookupError,
    TileOffset,
};

use crate::tile::{Solidity, Tile};

/// A fixed 16x16 block of tiles; the unit of spatial partitioning.
///
/// The chunk owns its tiles exclusively. Its size never changes after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    position: ChunkPosition,
    tiles: Vec<Tile>,
}

impl Chunk {
    /// Create a chunk filled with non-solid tiles.
    pub fn new(position: ChunkPosition) -> Self {
        Self::from_fn(position, |_| Solidity::NonSolid)
    }

    /// Create a chunk whose tile solidity is chosen per local position.
    pub fn from_fn(
        position: ChunkPosition,
        mut solidity: impl FnMut(LocalTilePosition) -> Solidity,
    ) -> Self {
        let mut tiles = Vec::with_capacity(CHUNK_AREA);
        for y in 0..CHUNK_HEIGHT {
            for x in 0..CHUNK_WIDTH {
                let local = LocalTilePosition::new(x, y);
                tiles.push(Tile::new(position, local, solidity(local)));
            }
        }
        Self { position, tiles }
    }

    pub fn position(&self) -> ChunkPosition {
        self.position
    }

    /// Look up a tile, failing when either axis is outside the chunk.
    pub fn tile(&self, local: LocalTilePosition) -> Result<&Tile, LookupError> {
        let index = index_of(local)?;
        Ok(&self.tiles[index])
    }

    pub fn is_solid(&self, local: LocalTilePosition) -> Result<bool, LookupError> {
        self.tile(local).map(Tile::is_solid)
    }

    /// Tile at `tile.local + offset`, within this chunk only.
    ///
    /// Offsets that leave the chunk fail with `OutOfBounds` instead of
    /// crossing into the adjacent chunk; cross-chunk neighbors are resolved
    /// by [`World::neighbor_of`](crate::World::neighbor_of).
    pub fn neighbor(&self, tile: &Tile, offset: TileOffset) -> Result<&Tile, LookupError> {
        let local = tile
            .local()
            .offset(offset)
            .ok_or(LookupError::OffsetOverflow { offset })?;
        self.tile(local)
    }

    /// Change a tile's solidity, returning the previous state.
    pub fn set_solidity(
        &mut self,
        local: LocalTilePosition,
        solidity: Solidity,
    ) -> Result<Solidity, LookupError> {
        let index = index_of(local)?;
        let tile = &mut self.tiles[index];
        let previous = tile.solidity();
        tile.set_solidity(solidity);
        Ok(previous)
    }

    /// All tiles, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn solid_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_solid()).count()
    }
}

fn index_of(local: LocalTilePosition) -> Result<usize, LookupError> {
    if !local.in_bounds() {
        return Err(LookupError::OutOfBounds { position: local });
    }
    Ok((local.y * CHUNK_WIDTH + local.x) as usize)
}
