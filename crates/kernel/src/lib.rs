//! World Kernel: authoritative tile state, chunk ownership, coordinate resolution.
//!
//! # Invariants
//! - Every tile is owned by exactly one chunk and records that chunk's position.
//! - Lookups report absence as [`LookupError`](tileworld_common::LookupError), never by panicking.
//! - All terrain mutations flow through [`World`] operations and are logged.

pub mod chunk;
pub mod tile;
pub mod world;

pub use chunk::Chunk;
pub use tile::{Solidity, Tile};
pub use world::{World, WorldEvent};
