use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use tileworld_common::{GlobalTilePosition, NEIGHBOR_OFFSETS, WorldPosition, invariant_violation};
use tileworld_kernel::Tile;

use crate::path::{Path, PathOutcome, Waypoint};
use crate::query::TileQuery;

/// Shared flag a caller sets to abandon a search in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

/// A search abandoned through its [`CancelToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("path search cancelled")]
pub struct Cancelled;

/// Frontier entry.
///
/// `BinaryHeap` is a max-heap, so the ordering is reversed: the entry with the
/// lowest `f` pops first, then the lowest `h`, then the earliest `seq`.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f32,
    h: f32,
    seq: u64,
    position: GlobalTilePosition,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

/// Best known route to a discovered tile.
#[derive(Debug, Clone, Copy)]
struct Node {
    tile: Tile,
    world_position: WorldPosition,
    g: f32,
    came_from: Option<GlobalTilePosition>,
}

/// A* search on the 8-connected tile grid.
///
/// Step cost and heuristic are both the Euclidean distance between tile
/// centers, so the heuristic is admissible and consistent and the returned
/// path is a shortest one.
pub struct PathFinder<'w, Q: TileQuery + ?Sized> {
    world: &'w Q,
}

impl<'w, Q: TileQuery + ?Sized> PathFinder<'w, Q> {
    pub fn new(world: &'w Q) -> Self {
        Self { world }
    }

    /// Find a shortest path from `start` to `goal`.
    ///
    /// A solid goal is unreachable unless it is also the start.
    pub fn find_path(&self, start: &Tile, goal: &Tile) -> PathOutcome {
        match self.search(start, goal, None) {
            Ok(outcome) => outcome,
            Err(Cancelled) => invariant_violation("search without a cancel token was cancelled"),
        }
    }

    /// Like [`find_path`](Self::find_path), but gives up once `cancel` is set.
    pub fn find_path_cancellable(
        &self,
        start: &Tile,
        goal: &Tile,
        cancel: &CancelToken,
    ) -> Result<PathOutcome, Cancelled> {
        self.search(start, goal, Some(cancel))
    }

    fn search(
        &self,
        start: &Tile,
        goal: &Tile,
        cancel: Option<&CancelToken>,
    ) -> Result<PathOutcome, Cancelled> {
        let start_pos = self.world.global_position_of(start);
        let goal_pos = self.world.global_position_of(goal);
        let _span =
            tracing::debug_span!("find_path", start = %start_pos, goal = %goal_pos).entered();

        let mut nodes: HashMap<GlobalTilePosition, Node> = HashMap::new();
        nodes.insert(
            start_pos,
            Node {
                tile: *start,
                world_position: self.world_position(start),
                g: 0.0,
                came_from: None,
            },
        );

        if start_pos == goal_pos {
            return Ok(PathOutcome::Found(reconstruct(&nodes, goal_pos)));
        }
        if self.world.is_solid(goal) {
            tracing::debug!("goal is solid");
            return Ok(PathOutcome::Unreachable);
        }

        let goal_world = self.world_position(goal);
        let mut open = BinaryHeap::new();
        let mut closed: HashSet<GlobalTilePosition> = HashSet::new();
        let mut seq = 0u64;
        let start_h = nodes[&start_pos].world_position.distance(goal_world);
        open.push(OpenEntry {
            f: start_h,
            h: start_h,
            seq,
            position: start_pos,
        });

        while let Some(entry) = open.pop() {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                tracing::debug!(expanded = closed.len(), "search cancelled");
                return Err(Cancelled);
            }
            // Superseded entries for an already expanded tile.
            if !closed.insert(entry.position) {
                continue;
            }
            if entry.position == goal_pos {
                let path = reconstruct(&nodes, goal_pos);
                tracing::debug!(
                    expanded = closed.len(),
                    waypoints = path.len(),
                    length = path.total_length(),
                    "path found"
                );
                return Ok(PathOutcome::Found(path));
            }

            let current = nodes[&entry.position];
            for offset in NEIGHBOR_OFFSETS {
                let Ok(neighbor) = self.world.neighbor_of(&current.tile, offset) else {
                    continue;
                };
                if self.world.is_solid(&neighbor) {
                    continue;
                }
                let neighbor_pos = self.world.global_position_of(&neighbor);
                if closed.contains(&neighbor_pos) {
                    continue;
                }

                let neighbor_world = self.world_position(&neighbor);
                let tentative_g = current.g + current.world_position.distance(neighbor_world);
                let known_g = nodes.get(&neighbor_pos).map_or(f32::INFINITY, |n| n.g);
                if tentative_g >= known_g {
                    continue;
                }

                nodes.insert(
                    neighbor_pos,
                    Node {
                        tile: neighbor,
                        world_position: neighbor_world,
                        g: tentative_g,
                        came_from: Some(entry.position),
                    },
                );
                let h = neighbor_world.distance(goal_world);
                seq += 1;
                open.push(OpenEntry {
                    f: tentative_g + h,
                    h,
                    seq,
                    position: neighbor_pos,
                });
            }
        }

        tracing::debug!(expanded = closed.len(), "goal unreachable");
        Ok(PathOutcome::Unreachable)
    }

    fn world_position(&self, tile: &Tile) -> WorldPosition {
        match self.world.world_position_of(tile) {
            Ok(position) => position,
            Err(e) => invariant_violation(format!(
                "reachable tile {} has no world position: {e}",
                self.world.global_position_of(tile)
            )),
        }
    }
}

/// Walk predecessors back from the goal, producing a goal-first path.
fn reconstruct(nodes: &HashMap<GlobalTilePosition, Node>, goal: GlobalTilePosition) -> Path {
    let mut waypoints = Vec::new();
    let mut cursor = Some(goal);
    while let Some(position) = cursor {
        let Some(node) = nodes.get(&position) else {
            invariant_violation(format!("predecessor {position} was never discovered"));
        };
        waypoints.push(Waypoint {
            tile: node.tile,
            world_position: node.world_position,
        });
        cursor = node.came_from;
    }
    Path::from_goal_first(waypoints)
}
