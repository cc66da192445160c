use serde::{Deserialize, Serialize};
use tileworld_common::WorldPosition;
use tileworld_kernel::Tile;

/// A tile on a path together with its render-space center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub tile: Tile,
    pub world_position: WorldPosition,
}

/// An ordered route, stored goal-first and start-last.
///
/// Movement consumes it with [`Path::pop_next`], which removes the last
/// element, so an actor walks from the start toward the goal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    waypoints: Vec<Waypoint>,
}

impl Path {
    /// Build a path from waypoints already ordered goal-first.
    pub fn from_goal_first(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoints in stored order (goal first).
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Waypoints in walking order (start first).
    pub fn iter_from_start(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter().rev()
    }

    pub fn goal(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn start(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    /// Remove and return the next waypoint to walk to.
    pub fn pop_next(&mut self) -> Option<Waypoint> {
        self.waypoints.pop()
    }

    /// Sum of the Euclidean distances between consecutive waypoints.
    pub fn total_length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|w| w[0].world_position.distance(w[1].world_position))
            .sum()
    }
}

/// Result of a completed search.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    Found(Path),
    /// The goal cannot be reached from the start. Callers treat this as a
    /// normal branch, e.g. by standing still.
    Unreachable,
}

impl PathOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Found(path) => Some(path),
            Self::Unreachable => None,
        }
    }

    pub fn into_path(self) -> Option<Path> {
        match self {
            Self::Found(path) => Some(path),
            Self::Unreachable => None,
        }
    }
}
