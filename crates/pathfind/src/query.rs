use tileworld_common::{GlobalTilePosition, LookupError, TileOffset, WorldPosition};
use tileworld_kernel::{Tile, World};

/// The read-only view of a tile world that the search runs against.
pub trait TileQuery {
    /// Tile at `tile + offset`, or why there is none.
    fn neighbor_of(&self, tile: &Tile, offset: TileOffset) -> Result<Tile, LookupError>;

    /// Current solidity of a tile. Tiles the world cannot resolve count as solid.
    fn is_solid(&self, tile: &Tile) -> bool;

    fn world_position_of(&self, tile: &Tile) -> Result<WorldPosition, LookupError>;

    fn global_position_of(&self, tile: &Tile) -> GlobalTilePosition;
}

impl TileQuery for World {
    fn neighbor_of(&self, tile: &Tile, offset: TileOffset) -> Result<Tile, LookupError> {
        World::neighbor_of(self, tile, offset).copied()
    }

    fn is_solid(&self, tile: &Tile) -> bool {
        World::is_solid(self, tile.global()).unwrap_or(true)
    }

    fn world_position_of(&self, tile: &Tile) -> Result<WorldPosition, LookupError> {
        World::world_position_of(self, tile)
    }

    fn global_position_of(&self, tile: &Tile) -> GlobalTilePosition {
        World::global_position_of(self, tile)
    }
}
