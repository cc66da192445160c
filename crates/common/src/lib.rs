//! Common: the four coordinate spaces of the tile world and the errors shared
//! by every layer above them.
//!
//! # Invariants
//! - `global = chunk * CHUNK_SIZE + local`, with `local` always in range.
//! - `world = global - CHUNK_SIZE / 2 + 0.5` per axis.
//! - Chunk indices stay within `CHUNK_COORD_LIMIT`, so world positions are
//!   exact in `f32` and map back to the tile they came from.
//! - Each coordinate space is its own type; there is exactly one conversion
//!   per pair of spaces.

mod error;
mod types;

pub use error::{LookupError, ParsePositionError, invariant_violation};
pub use types::{
    CHUNK_AREA, CHUNK_COORD_LIMIT, CHUNK_HEIGHT, CHUNK_WIDTH, ChunkPosition, GlobalTilePosition, LocalTilePosition,
    NEIGHBOR_OFFSETS, TileOffset, WorldPosition,
};
