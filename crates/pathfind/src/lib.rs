//! Pathfinding: A* over the tile world's adjacency and solidity queries.
//!
//! # Invariants
//! - Search state is local to one call; the world is only read.
//! - `Unreachable` is an ordinary outcome, not an error.
//! - Paths are ordered goal-first; consumers drain them from the back.
//! - Equal-cost frontier entries are ordered by heuristic, then insertion, so
//!   a given world always yields the same path.

mod astar;
mod follow;
mod path;
mod query;
mod service;

pub use astar::{CancelToken, Cancelled, PathFinder};
pub use follow::{FollowConfig, PathFollower};
pub use path::{Path, PathOutcome, Waypoint};
pub use query::TileQuery;
pub use service::{PathResponse, PathService, RequestId, ServiceError};
