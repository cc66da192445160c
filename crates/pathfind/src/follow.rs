use std::time::Duration;

use crate::path::{Path, Waypoint};

/// Cadence at which a follower advances along its path.
#[derive(Debug, Clone)]
pub struct FollowConfig {
    /// Waypoints consumed per second.
    pub tick_rate_hz: f32,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self { tick_rate_hz: 10.0 }
    }
}

impl FollowConfig {
    pub fn tick_interval(&self) -> Duration {
        let hz = f64::from(self.tick_rate_hz.max(f32::EPSILON));
        Duration::from_nanos((1e9 / hz).round() as u64)
    }
}

/// Moves an actor along a path one waypoint per fixed tick.
///
/// Frame time is accumulated and converted into whole ticks, so the cadence
/// is independent of the caller's frame rate. An empty path is a no-op.
#[derive(Debug)]
pub struct PathFollower {
    path: Path,
    interval: Duration,
    accumulator: Duration,
    current: Option<Waypoint>,
}

impl PathFollower {
    pub fn new(config: &FollowConfig) -> Self {
        Self {
            path: Path::default(),
            interval: config.tick_interval(),
            accumulator: Duration::ZERO,
            current: None,
        }
    }

    /// Replace the remaining route. The tick phase restarts.
    pub fn set_path(&mut self, path: Path) {
        tracing::trace!(waypoints = path.len(), "follower path replaced");
        self.path = path;
        self.accumulator = Duration::ZERO;
    }

    /// Stop, keeping the last reached waypoint.
    pub fn clear(&mut self) {
        self.path = Path::default();
        self.accumulator = Duration::ZERO;
    }

    pub fn is_idle(&self) -> bool {
        self.path.is_empty()
    }

    /// Waypoints not yet reached.
    pub fn remaining(&self) -> usize {
        self.path.len()
    }

    /// The most recently reached waypoint.
    pub fn current(&self) -> Option<&Waypoint> {
        self.current.as_ref()
    }

    /// Advance exactly one tick.
    pub fn tick(&mut self) -> Option<Waypoint> {
        let next = self.path.pop_next()?;
        self.current = Some(next);
        Some(next)
    }

    /// Advance by elapsed frame time, returning the last waypoint reached
    /// during this update.
    pub fn update(&mut self, dt: Duration) -> Option<Waypoint> {
        if self.path.is_empty() {
            self.accumulator = Duration::ZERO;
            return None;
        }
        self.accumulator += dt;
        let mut reached = None;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            match self.tick() {
                Some(waypoint) => reached = Some(waypoint),
                None => {
                    self.accumulator = Duration::ZERO;
                    break;
                }
            }
        }
        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathFinder;
    use tileworld_common::GlobalTilePosition;
    use tileworld_kernel::World;

    fn straight_path(len: i32) -> Path {
        let world = World::new();
        let start = *world.tile_at(GlobalTilePosition::new(0, 0)).unwrap();
        let goal = *world.tile_at(GlobalTilePosition::new(len - 1, 0)).unwrap();
        PathFinder::new(&world)
            .find_path(&start, &goal)
            .into_path()
            .unwrap()
    }

    #[test]
    fn default_cadence_is_ten_hz() {
        assert_eq!(
            FollowConfig::default().tick_interval(),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn empty_path_is_noop() {
        let mut f = PathFollower::new(&FollowConfig::default());
        assert!(f.is_idle());
        assert_eq!(f.update(Duration::from_secs(1)), None);
        assert_eq!(f.tick(), None);
        assert!(f.current().is_none());
    }

    #[test]
    fn one_waypoint_per_tick_from_start() {
        let mut f = PathFollower::new(&FollowConfig::default());
        f.set_path(straight_path(4));

        assert_eq!(f.update(Duration::from_millis(60)), None);
        let first = f.update(Duration::from_millis(40)).unwrap();
        assert_eq!(first.tile.global(), GlobalTilePosition::new(0, 0));
        assert_eq!(f.remaining(), 3);

        let second = f.update(Duration::from_millis(100)).unwrap();
        assert_eq!(second.tile.global(), GlobalTilePosition::new(1, 0));
    }

    #[test]
    fn long_frame_consumes_several_ticks() {
        let mut f = PathFollower::new(&FollowConfig::default());
        f.set_path(straight_path(5));
        let reached = f.update(Duration::from_millis(350)).unwrap();
        assert_eq!(reached.tile.global(), GlobalTilePosition::new(2, 0));
        assert_eq!(f.remaining(), 2);

        // Overshooting the end stops at the goal.
        let last = f.update(Duration::from_secs(10)).unwrap();
        assert_eq!(last.tile.global(), GlobalTilePosition::new(4, 0));
        assert!(f.is_idle());
        assert_eq!(f.current().map(|w| w.tile.global()), Some(last.tile.global()));
    }

    #[test]
    fn new_path_replaces_old() {
        let mut f = PathFollower::new(&FollowConfig::default());
        f.set_path(straight_path(8));
        f.tick();
        f.set_path(straight_path(2));
        assert_eq!(f.remaining(), 2);
        f.clear();
        assert!(f.is_idle());
        assert!(f.current().is_some());
    }
}
