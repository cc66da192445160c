use tileworld_common::ChunkPosition;
use tileworld_kernel::Chunk;

/// Produces the terrain of a chunk slot when it is streamed in.
///
/// The returned chunk must sit at `position`; the streamer drops any that
/// does not.
pub trait ChunkSource {
    fn load(&self, position: ChunkPosition) -> Chunk;
}

impl<F: Fn(ChunkPosition) -> Chunk> ChunkSource for F {
    fn load(&self, position: ChunkPosition) -> Chunk {
        self(position)
    }
}

/// Open terrain everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatChunkSource;

impl ChunkSource for FlatChunkSource {
    fn load(&self, position: ChunkPosition) -> Chunk {
        Chunk::new(position)
    }
}
