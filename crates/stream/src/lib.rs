//! Streaming: chunk loading and eviction around a viewer.
//!
//! # Invariants
//! - Only chunks inside the load radius are requested from the source.
//! - Each update loads and unloads at most its configured budget.
//! - Loading and evicting goes through [`World`](tileworld_kernel::World)
//!   operations, so the world's event log sees every change.

mod budget;
mod source;

pub use budget::{StreamConfig, StreamState, StreamStats, StreamUpdate};
pub use source::{ChunkSource, FlatChunkSource};
