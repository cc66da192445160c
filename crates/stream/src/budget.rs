use std::time::{Duration, Instant};

use tileworld_common::ChunkPosition;
use tileworld_kernel::World;

use crate::source::ChunkSource;

/// Streaming configuration: load radius plus per-update budgets.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Square radius (in chunks) around the viewer that is kept loaded.
    pub load_radius: u32,
    /// Maximum number of chunks to load per update.
    pub load_budget: usize,
    /// Maximum number of chunks to unload per update.
    pub unload_budget: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            load_radius: 1,
            load_budget: 9,
            unload_budget: 9,
        }
    }
}

/// Chunks that changed during one update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamUpdate {
    pub loaded: Vec<ChunkPosition>,
    pub unloaded: Vec<ChunkPosition>,
}

impl StreamUpdate {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.unloaded.is_empty()
    }
}

/// Per-update streaming statistics for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub chunks_loaded_this_update: usize,
    pub chunks_unloaded_this_update: usize,
    pub total_loaded_chunks: usize,
    pub update_time: Duration,
}

/// Keeps the world's chunk set centered on a viewer.
///
/// The world is the source of truth for what is loaded; any chunk outside the
/// radius is eligible for eviction, whoever inserted it.
pub struct StreamState {
    pub config: StreamConfig,
    stats: StreamStats,
}

impl StreamState {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            stats: StreamStats::default(),
        }
    }

    /// Load missing chunks near `viewer` and evict chunks outside the radius.
    ///
    /// Loads nearest-first and evicts farthest-first, each within its budget.
    /// Slots outside the representable chunk range are never loaded, and a
    /// chunk the world rejects is left out of `loaded`.
    pub fn update(
        &mut self,
        world: &mut World,
        viewer: ChunkPosition,
        source: &impl ChunkSource,
    ) -> StreamUpdate {
        let _span = tracing::info_span!("stream_update", %viewer).entered();
        let update_start = Instant::now();
        let radius = self.config.load_radius;

        let wanted: Vec<ChunkPosition> = chunks_in_radius(viewer, radius)
            .into_iter()
            .filter(|c| !world.contains_chunk(*c))
            .take(self.config.load_budget)
            .collect();

        let mut outside: Vec<ChunkPosition> = world
            .chunk_positions()
            .filter(|c| c.chebyshev_distance(viewer) > radius)
            .collect();
        outside.sort_by_key(|c| std::cmp::Reverse(c.chebyshev_distance(viewer)));
        outside.truncate(self.config.unload_budget);
        let to_unload = outside;

        let mut to_load = Vec::with_capacity(wanted.len());
        for c in wanted {
            tracing::debug!(%c, "loading chunk");
            let chunk = source.load(c);
            if chunk.position() != c {
                tracing::warn!(%c, got = %chunk.position(), "chunk source returned the wrong slot");
                continue;
            }
            match world.insert_chunk(chunk) {
                Ok(_) => to_load.push(c),
                Err(error) => tracing::warn!(%c, %error, "chunk rejected"),
            }
        }
        for c in &to_unload {
            tracing::debug!(%c, "unloading chunk");
            world.remove_chunk(*c);
        }

        self.stats = StreamStats {
            chunks_loaded_this_update: to_load.len(),
            chunks_unloaded_this_update: to_unload.len(),
            total_loaded_chunks: world.chunk_count(),
            update_time: update_start.elapsed(),
        };

        tracing::trace!(
            loaded = to_load.len(),
            unloaded = to_unload.len(),
            total = world.chunk_count(),
            "stream update complete"
        );

        StreamUpdate {
            loaded: to_load,
            unloaded: to_unload,
        }
    }

    /// Whether the world holds exactly the chunks within the radius of `viewer`.
    pub fn is_settled(&self, world: &World, viewer: ChunkPosition) -> bool {
        let radius = self.config.load_radius;
        chunks_in_radius(viewer, radius)
            .iter()
            .all(|c| world.contains_chunk(*c))
            && world
                .chunk_positions()
                .all(|c| c.chebyshev_distance(viewer) <= radius)
    }

    /// Get statistics from the last update.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }
}

/// Representable chunk slots within a square radius, nearest ring first.
fn chunks_in_radius(center: ChunkPosition, radius: u32) -> Vec<ChunkPosition> {
    // Clamp the square to the representable range before enumerating it.
    let axis = |c: i32, min: i32, max: i32| {
        let lo = (i64::from(c) - i64::from(radius)).max(i64::from(min));
        let hi = (i64::from(c) + i64::from(radius)).min(i64::from(max));
        (lo, hi)
    };
    let (x_lo, x_hi) = axis(center.x, ChunkPosition::MIN.x, ChunkPosition::MAX.x);
    let (y_lo, y_hi) = axis(center.y, ChunkPosition::MIN.y, ChunkPosition::MAX.y);

    let mut result = Vec::new();
    // Both ranges sit inside the representable range, so they fit in i32.
    for x in x_lo..=x_hi {
        for y in y_lo..=y_hi {
            result.push(ChunkPosition::new(x as i32, y as i32));
        }
    }
    result.sort_by_key(|c| (c.chebyshev_distance(center), *c));
    result
}
