use serde::{Deserialize, Serialize};
use tileworld_common::{ChunkPosition, GlobalTilePosition, LocalTilePosition};

/// Whether a tile blocks movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Solidity {
    Solid,
    #[default]
    NonSolid,
}

/// A single grid cell.
///
/// Tiles are small values; a copy handed out by a lookup identifies the cell
/// by its owning chunk and local position. Its solidity reflects the chunk at
/// lookup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    chunk: ChunkPosition,
    local: LocalTilePosition,
    solidity: Solidity,
}

impl Tile {
    pub(crate) fn new(chunk: ChunkPosition, local: LocalTilePosition, solidity: Solidity) -> Self {
        Self {
            chunk,
            local,
            solidity,
        }
    }

    /// Position of the owning chunk.
    pub fn chunk(&self) -> ChunkPosition {
        self.chunk
    }

    /// Position inside the owning chunk.
    pub fn local(&self) -> LocalTilePosition {
        self.local
    }

    /// Position in the unbounded grid.
    pub fn global(&self) -> GlobalTilePosition {
        GlobalTilePosition::from_chunk_local(self.chunk, self.local)
    }

    pub fn solidity(&self) -> Solidity {
        self.solidity
    }

    pub fn is_solid(&self) -> bool {
        self.solidity == Solidity::Solid
    }

    pub(crate) fn set_solidity(&mut self, solidity: Solidity) {
        self.solidity = solidity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_solidity_is_open() {
        assert_eq!(Solidity::default(), Solidity::NonSolid);
    }

    #[test]
    fn global_composes_chunk_and_local() {
        let t = Tile::new(
            ChunkPosition::new(-1, 2),
            LocalTilePosition::new(3, 4),
            Solidity::Solid,
        );
        assert_eq!(t.global(), GlobalTilePosition::new(-13, 36));
        assert!(t.is_solid());
    }
}
