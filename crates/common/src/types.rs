use std::fmt;
use std::str::FromStr;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ParsePositionError;

/// Width of a chunk in tiles.
pub const CHUNK_WIDTH: i32 = 16;
/// Height of a chunk in tiles.
pub const CHUNK_HEIGHT: i32 = 16;
/// Number of tiles stored by one chunk.
pub const CHUNK_AREA: usize = (CHUNK_WIDTH * CHUNK_HEIGHT) as usize;

/// Chunk indices on each axis lie in `[-CHUNK_COORD_LIMIT, CHUNK_COORD_LIMIT)`.
///
/// This keeps every tile's global coordinate within `[-2^21, 2^21)`, where a
/// tile center (`global - 8 + 0.5`) is exact in `f32` and converts back to the
/// same tile.
pub const CHUNK_COORD_LIMIT: i32 = 1 << 17;

/// The eight 8-connected neighbor offsets, top row first, self excluded.
pub const NEIGHBOR_OFFSETS: [TileOffset; 8] = [
    TileOffset::new(-1, -1),
    TileOffset::new(0, -1),
    TileOffset::new(1, -1),
    TileOffset::new(-1, 0),
    TileOffset::new(1, 0),
    TileOffset::new(-1, 1),
    TileOffset::new(0, 1),
    TileOffset::new(1, 1),
];

/// A step between two tile positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileOffset {
    pub dx: i32,
    pub dy: i32,
}

impl TileOffset {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// Tile coordinates within a single chunk.
///
/// Values are not range-checked on construction: a position outside
/// `[0, CHUNK_WIDTH) x [0, CHUNK_HEIGHT)` is representable so that lookups can
/// report it as out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalTilePosition {
    pub x: i32,
    pub y: i32,
}

impl LocalTilePosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether both axes fall inside the chunk.
    pub fn in_bounds(self) -> bool {
        (0..CHUNK_WIDTH).contains(&self.x) && (0..CHUNK_HEIGHT).contains(&self.y)
    }

    /// `None` when either axis overflows `i32`.
    pub fn offset(self, offset: TileOffset) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(offset.dx)?,
            self.y.checked_add(offset.dy)?,
        ))
    }
}

/// Coordinates in the tile grid. Loaded tiles stay within the range set by
/// [`CHUNK_COORD_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalTilePosition {
    pub x: i32,
    pub y: i32,
}

impl GlobalTilePosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Compose a chunk index and an in-chunk position.
    ///
    /// `global = chunk * size + local` on each axis. Exact for representable
    /// chunks and in-range locals; other inputs wrap instead of panicking.
    pub fn from_chunk_local(chunk: ChunkPosition, local: LocalTilePosition) -> Self {
        Self::new(
            chunk.x.wrapping_mul(CHUNK_WIDTH).wrapping_add(local.x),
            chunk.y.wrapping_mul(CHUNK_HEIGHT).wrapping_add(local.y),
        )
    }

    /// Split into the owning chunk and the position inside it.
    ///
    /// Uses Euclidean division so negative coordinates resolve to the chunk
    /// below them with an in-range local position.
    pub fn split(self) -> (ChunkPosition, LocalTilePosition) {
        (
            ChunkPosition::new(
                self.x.div_euclid(CHUNK_WIDTH),
                self.y.div_euclid(CHUNK_HEIGHT),
            ),
            LocalTilePosition::new(
                self.x.rem_euclid(CHUNK_WIDTH),
                self.y.rem_euclid(CHUNK_HEIGHT),
            ),
        )
    }

    /// Owning chunk of this tile.
    pub fn chunk(self) -> ChunkPosition {
        self.split().0
    }

    /// Render-space center of this tile. Chunk (0, 0) is centered on the origin.
    ///
    /// Exact inside representable chunks (see [`CHUNK_COORD_LIMIT`]).
    pub fn to_world(self) -> WorldPosition {
        WorldPosition::new(
            (i64::from(self.x) - i64::from(CHUNK_WIDTH / 2)) as f32 + 0.5,
            (i64::from(self.y) - i64::from(CHUNK_HEIGHT / 2)) as f32 + 0.5,
        )
    }

    /// `None` when either axis overflows `i32`.
    pub fn offset(self, offset: TileOffset) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(offset.dx)?,
            self.y.checked_add(offset.dy)?,
        ))
    }

    /// Whether `other` is one of the eight neighbors of this position.
    pub fn is_adjacent(self, other: Self) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx <= 1 && dy <= 1 && (dx, dy) != (0, 0)
    }
}

impl FromStr for GlobalTilePosition {
    type Err = ParsePositionError;

    /// Parses `"x,y"`, surrounding whitespace allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| ParsePositionError::MissingSeparator(s.to_string()))?;
        let axis = |v: &str| {
            v.trim()
                .parse::<i32>()
                .map_err(|source| ParsePositionError::InvalidAxis {
                    value: v.trim().to_string(),
                    source,
                })
        };
        Ok(Self::new(axis(x)?, axis(y)?))
    }
}

/// Index of a chunk slot: `floor(global / size)` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPosition {
    pub x: i32,
    pub y: i32,
}

impl ChunkPosition {
    pub const ORIGIN: Self = Self::new(0, 0);
    pub const MIN: Self = Self::new(-CHUNK_COORD_LIMIT, -CHUNK_COORD_LIMIT);
    pub const MAX: Self = Self::new(CHUNK_COORD_LIMIT - 1, CHUNK_COORD_LIMIT - 1);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether tiles in this slot have exact world positions. Only such
    /// chunks can be registered in a world.
    pub fn is_representable(self) -> bool {
        let range = -CHUNK_COORD_LIMIT..CHUNK_COORD_LIMIT;
        range.contains(&self.x) && range.contains(&self.y)
    }

    /// Chebyshev distance in chunks, used for square streaming radii.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Continuous render-space position on the tile plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPosition(pub Vec2);

impl WorldPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    pub fn x(self) -> f32 {
        self.0.x
    }

    pub fn y(self) -> f32 {
        self.0.y
    }

    /// Global tile containing this point: `floor(world + size / 2)`.
    pub fn to_global(self) -> GlobalTilePosition {
        GlobalTilePosition::new(
            (self.0.x + (CHUNK_WIDTH / 2) as f32).floor() as i32,
            (self.0.y + (CHUNK_HEIGHT / 2) as f32).floor() as i32,
        )
    }

    /// Euclidean distance in render units.
    pub fn distance(self, other: Self) -> f32 {
        self.0.distance(other.0)
    }

    /// Lift onto the render plane (z = 0).
    pub fn to_vec3(self) -> Vec3 {
        self.0.extend(0.0)
    }
}

impl fmt::Display for LocalTilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local({}, {})", self.x, self.y)
    }
}

impl fmt::Display for GlobalTilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for ChunkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk({}, {})", self.x, self.y)
    }
}

impl fmt::Display for WorldPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}]", self.0.x, self.0.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_bounds_checked_per_axis() {
        assert!(LocalTilePosition::new(0, 0).in_bounds());
        assert!(LocalTilePosition::new(15, 15).in_bounds());
        assert!(!LocalTilePosition::new(16, 0).in_bounds());
        assert!(!LocalTilePosition::new(0, 16).in_bounds());
        assert!(!LocalTilePosition::new(-1, 3).in_bounds());
        assert!(!LocalTilePosition::new(3, -1).in_bounds());
    }

    #[test]
    fn split_handles_negative_globals() {
        let (chunk, local) = GlobalTilePosition::new(-1, -17).split();
        assert_eq!(chunk, ChunkPosition::new(-1, -2));
        assert_eq!(local, LocalTilePosition::new(15, 15));
    }

    #[test]
    fn compose_then_split_is_identity() {
        let chunk = ChunkPosition::new(3, -2);
        let local = LocalTilePosition::new(7, 12);
        let global = GlobalTilePosition::from_chunk_local(chunk, local);
        assert_eq!(global, GlobalTilePosition::new(55, -20));
        assert_eq!(global.split(), (chunk, local));
    }

    #[test]
    fn origin_chunk_is_centered() {
        assert_eq!(
            GlobalTilePosition::new(0, 0).to_world(),
            WorldPosition::new(-7.5, -7.5)
        );
        assert_eq!(
            GlobalTilePosition::new(15, 15).to_world(),
            WorldPosition::new(7.5, 7.5)
        );
    }

    #[test]
    fn world_to_global_floors() {
        assert_eq!(
            WorldPosition::new(0.0, 0.0).to_global(),
            GlobalTilePosition::new(8, 8)
        );
        assert_eq!(
            WorldPosition::new(-0.01, -7.99).to_global(),
            GlobalTilePosition::new(7, 0)
        );
        assert_eq!(
            WorldPosition::new(-8.5, 9.0).to_global(),
            GlobalTilePosition::new(-1, 17)
        );
    }

    #[test]
    fn neighbor_offsets_exclude_self() {
        assert_eq!(NEIGHBOR_OFFSETS.len(), 8);
        assert!(!NEIGHBOR_OFFSETS.contains(&TileOffset::new(0, 0)));
        let origin = GlobalTilePosition::new(0, 0);
        for offset in NEIGHBOR_OFFSETS {
            assert!(origin.is_adjacent(origin.offset(offset).unwrap()));
        }
    }

    #[test]
    fn offset_past_i32_is_none() {
        let edge = GlobalTilePosition::new(i32::MAX, 0);
        assert_eq!(edge.offset(TileOffset::new(1, 0)), None);
        assert_eq!(
            edge.offset(TileOffset::new(-1, 1)),
            Some(GlobalTilePosition::new(i32::MAX - 1, 1))
        );
        assert_eq!(LocalTilePosition::new(0, i32::MIN).offset(TileOffset::new(0, -1)), None);
    }

    #[test]
    fn representable_chunk_range() {
        assert!(ChunkPosition::MIN.is_representable());
        assert!(ChunkPosition::MAX.is_representable());
        assert!(!ChunkPosition::new(CHUNK_COORD_LIMIT, 0).is_representable());
        assert!(!ChunkPosition::new(0, -CHUNK_COORD_LIMIT - 1).is_representable());
        assert!(!ChunkPosition::new(i32::MAX / 16, 0).is_representable());
    }

    #[test]
    fn extreme_globals_do_not_panic() {
        let far = GlobalTilePosition::new(i32::MIN, i32::MAX);
        let _ = far.to_world();
        assert!(!far.is_adjacent(GlobalTilePosition::new(i32::MAX, i32::MIN)));
    }

    #[test]
    fn parse_global_position() {
        let p: GlobalTilePosition = " 3, -4 ".parse().unwrap();
        assert_eq!(p, GlobalTilePosition::new(3, -4));
        assert!("3;4".parse::<GlobalTilePosition>().is_err());
        assert!("x,4".parse::<GlobalTilePosition>().is_err());
    }

    #[test]
    fn world_position_lifts_to_plane() {
        let v = WorldPosition::new(1.0, 2.0).to_vec3();
        assert_eq!(v, Vec3::new(1.0, 2.0, 0.0));
    }
}
