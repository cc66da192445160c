use std::num::ParseIntError;

use crate::types::{ChunkPosition, LocalTilePosition, TileOffset};

/// A tile lookup that found nothing.
///
/// This is an expected outcome and is returned, never raised. Broken
/// construction invariants go through [`invariant_violation`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("{position} is outside the chunk bounds")]
    OutOfBounds { position: LocalTilePosition },
    #[error("no chunk loaded at {0}")]
    ChunkNotLoaded(ChunkPosition),
    #[error("{0} is outside the representable chunk range")]
    ChunkOutOfRange(ChunkPosition),
    #[error("offset ({}, {}) leaves the coordinate range", .offset.dx, .offset.dy)]
    OffsetOverflow { offset: TileOffset },
}

/// Errors from parsing an `"x,y"` tile position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParsePositionError {
    #[error("expected `x,y`, got `{0}`")]
    MissingSeparator(String),
    #[error("invalid coordinate `{value}`: {source}")]
    InvalidAxis {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Abort on a broken construction invariant.
///
/// Normal absence is a [`LookupError`]; this channel is reserved for states
/// that correct assembly of the world can never produce.
#[track_caller]
pub fn invariant_violation(message: impl AsRef<str>) -> ! {
    let message = message.as_ref();
    tracing::error!(%message, "world invariant violated");
    panic!("world invariant violated: {message}");
}
