use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tileworld_common::{GlobalTilePosition, LookupError};
use tileworld_kernel::Tile;

use crate::astar::{CancelToken, Cancelled, PathFinder};
use crate::path::PathOutcome;
use crate::query::TileQuery;

/// Identifies one request made through a [`PathService`].
pub type RequestId = u64;

/// Errors from the background path worker.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to spawn path worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("path worker disconnected")]
    Disconnected,
    /// An endpoint does not resolve in the service's current world, usually
    /// because its chunk was evicted after the tile was read.
    #[error("endpoint {position} is not in the current world: {source}")]
    StaleEndpoint {
        position: GlobalTilePosition,
        #[source]
        source: LookupError,
    },
}

/// A finished search, delivered back to the requesting loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResponse {
    pub id: RequestId,
    pub start: Tile,
    pub goal: Tile,
    pub outcome: PathOutcome,
}

struct Job<Q> {
    id: RequestId,
    start: Tile,
    goal: Tile,
    world: Arc<Q>,
    cancel: CancelToken,
}

/// Runs searches on a dedicated worker thread so they never stall the caller's
/// update loop.
///
/// Only the most recent request matters: issuing a new one cancels the search
/// in flight, and responses to superseded requests are discarded. The world is
/// shared as an immutable snapshot; swap it with [`set_world`](Self::set_world)
/// after terrain changes.
///
/// Both endpoints are checked against the current snapshot when a request is
/// made, and a tile whose chunk is gone is refused with
/// [`ServiceError::StaleEndpoint`]. The worker treats a tile it cannot place
/// as a broken invariant: it panics, and every later call reports
/// [`ServiceError::Disconnected`].
pub struct PathService<Q> {
    jobs: Option<Sender<Job<Q>>>,
    responses: Receiver<PathResponse>,
    world: Arc<Q>,
    pending: Option<(RequestId, CancelToken)>,
    next_id: RequestId,
    worker: Option<JoinHandle<()>>,
}

impl<Q: TileQuery + Send + Sync + 'static> PathService<Q> {
    pub fn spawn(world: Arc<Q>) -> Result<Self, ServiceError> {
        let (job_tx, job_rx) = mpsc::channel::<Job<Q>>();
        let (response_tx, response_rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("path-worker".into())
            .spawn(move || worker_loop(job_rx, response_tx))?;
        tracing::debug!("path worker started");

        Ok(Self {
            jobs: Some(job_tx),
            responses: response_rx,
            world,
            pending: None,
            next_id: 0,
            worker: Some(worker),
        })
    }

    /// Use a new world snapshot for subsequent requests.
    pub fn set_world(&mut self, world: Arc<Q>) {
        self.world = world;
    }

    pub fn world(&self) -> &Arc<Q> {
        &self.world
    }

    /// Queue a search, superseding any request still in flight.
    ///
    /// A request refused as stale leaves the one in flight untouched.
    pub fn request(&mut self, start: Tile, goal: Tile) -> Result<RequestId, ServiceError> {
        for tile in [&start, &goal] {
            self.world
                .world_position_of(tile)
                .map_err(|source| ServiceError::StaleEndpoint {
                    position: tile.global(),
                    source,
                })?;
        }
        self.cancel();
        let id = self.next_id;
        self.next_id += 1;
        let cancel = CancelToken::new();
        let job = Job {
            id,
            start,
            goal,
            world: Arc::clone(&self.world),
            cancel: cancel.clone(),
        };
        self.jobs
            .as_ref()
            .ok_or(ServiceError::Disconnected)?
            .send(job)
            .map_err(|_| ServiceError::Disconnected)?;
        tracing::trace!(id, "path requested");
        self.pending = Some((id, cancel));
        Ok(id)
    }

    /// Abandon the request in flight, if any. No response will be delivered for it.
    pub fn cancel(&mut self) {
        if let Some((id, cancel)) = self.pending.take() {
            tracing::trace!(id, "path request superseded");
            cancel.cancel();
        }
    }

    /// Whether a request is waiting for its response.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Non-blocking check for the current request's response.
    pub fn poll(&mut self) -> Result<Option<PathResponse>, ServiceError> {
        loop {
            match self.responses.try_recv() {
                Ok(response) => {
                    if let Some(response) = self.accept(response) {
                        return Ok(Some(response));
                    }
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(ServiceError::Disconnected),
            }
        }
    }

    /// Block up to `timeout` for the current request's response.
    pub fn wait(&mut self, timeout: Duration) -> Result<Option<PathResponse>, ServiceError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.responses.recv_timeout(remaining) {
                Ok(response) => {
                    if let Some(response) = self.accept(response) {
                        return Ok(Some(response));
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => return Err(ServiceError::Disconnected),
            }
        }
    }

    fn accept(&mut self, response: PathResponse) -> Option<PathResponse> {
        match self.pending {
            Some((id, _)) if id == response.id => {
                self.pending = None;
                Some(response)
            }
            _ => {
                tracing::trace!(id = response.id, "dropping stale path response");
                None
            }
        }
    }
}

impl<Q> Drop for PathService<Q> {
    fn drop(&mut self) {
        if let Some((_, cancel)) = self.pending.take() {
            cancel.cancel();
        }
        // Closing the job channel ends the worker loop.
        self.jobs = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("path worker panicked");
            }
        }
    }
}

fn worker_loop<Q: TileQuery>(jobs: Receiver<Job<Q>>, responses: Sender<PathResponse>) {
    for job in jobs {
        if job.cancel.is_cancelled() {
            continue;
        }
        let finder = PathFinder::new(job.world.as_ref());
        match finder.find_path_cancellable(&job.start, &job.goal, &job.cancel) {
            Ok(outcome) => {
                let response = PathResponse {
                    id: job.id,
                    start: job.start,
                    goal: job.goal,
                    outcome,
                };
                if responses.send(response).is_err() {
                    break;
                }
            }
            Err(Cancelled) => tracing::debug!(id = job.id, "path search cancelled"),
        }
    }
    tracing::debug!("path worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_common::ChunkPosition;
    use tileworld_kernel::{Chunk, Solidity, World};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn tile(world: &World, x: i32, y: i32) -> Tile {
        *world.tile_at(GlobalTilePosition::new(x, y)).unwrap()
    }

    #[test]
    fn delivers_path_from_worker() {
        let world = Arc::new(World::new());
        let mut service = PathService::spawn(Arc::clone(&world)).unwrap();
        let id = service
            .request(tile(&world, 0, 0), tile(&world, 15, 15))
            .unwrap();
        assert!(service.is_pending());

        let response = service.wait(TIMEOUT).unwrap().unwrap();
        assert_eq!(response.id, id);
        assert_eq!(response.outcome.path().map(|p| p.len()), Some(16));
        assert!(!service.is_pending());
    }

    #[test]
    fn newer_request_supersedes_older() {
        let world = Arc::new(World::new());
        let mut service = PathService::spawn(Arc::clone(&world)).unwrap();
        service
            .request(tile(&world, 0, 0), tile(&world, 15, 15))
            .unwrap();
        let latest = service
            .request(tile(&world, 0, 0), tile(&world, 3, 0))
            .unwrap();

        let response = service.wait(TIMEOUT).unwrap().unwrap();
        assert_eq!(response.id, latest);
        assert_eq!(response.outcome.path().map(|p| p.len()), Some(4));
        assert_eq!(service.poll().unwrap(), None);
    }

    #[test]
    fn unreachable_is_delivered_as_outcome() {
        let mut world = World::new();
        world
            .set_solidity(GlobalTilePosition::new(5, 5), Solidity::Solid)
            .unwrap();
        let world = Arc::new(world);
        let mut service = PathService::spawn(Arc::clone(&world)).unwrap();
        service
            .request(tile(&world, 0, 0), tile(&world, 5, 5))
            .unwrap();
        let response = service.wait(TIMEOUT).unwrap().unwrap();
        assert_eq!(response.outcome, PathOutcome::Unreachable);
    }

    #[test]
    fn cancelled_request_yields_nothing() {
        let world = Arc::new(World::new());
        let mut service = PathService::spawn(Arc::clone(&world)).unwrap();
        service
            .request(tile(&world, 0, 0), tile(&world, 15, 15))
            .unwrap();
        service.cancel();
        assert!(!service.is_pending());
        assert_eq!(service.wait(Duration::from_millis(50)).unwrap(), None);
    }

    #[test]
    fn evicted_endpoint_is_refused_and_worker_survives() {
        let mut world = World::new();
        world
            .insert_chunk(Chunk::new(ChunkPosition::new(1, 0)))
            .unwrap();
        let stale = tile(&world, 20, 4);
        world.remove_chunk(ChunkPosition::new(1, 0));
        let world = Arc::new(world);
        let mut service = PathService::spawn(Arc::clone(&world)).unwrap();

        let err = service.request(tile(&world, 0, 0), stale).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::StaleEndpoint {
                position,
                source: LookupError::ChunkNotLoaded(chunk),
            } if position == GlobalTilePosition::new(20, 4) && chunk == ChunkPosition::new(1, 0)
        ));
        assert!(!service.is_pending());

        let id = service
            .request(tile(&world, 0, 0), tile(&world, 3, 0))
            .unwrap();
        let response = service.wait(TIMEOUT).unwrap().unwrap();
        assert_eq!(response.id, id);
        assert_eq!(response.outcome.path().map(|p| p.len()), Some(4));
    }

    #[test]
    fn stale_request_keeps_the_one_in_flight() {
        let mut world = World::new();
        world
            .insert_chunk(Chunk::new(ChunkPosition::new(-1, 0)))
            .unwrap();
        let stale = tile(&world, -5, 0);
        world.remove_chunk(ChunkPosition::new(-1, 0));
        let world = Arc::new(world);
        let mut service = PathService::spawn(Arc::clone(&world)).unwrap();

        let id = service
            .request(tile(&world, 0, 0), tile(&world, 15, 15))
            .unwrap();
        assert!(service.request(stale, tile(&world, 1, 1)).is_err());
        assert!(service.is_pending());
        assert_eq!(service.wait(TIMEOUT).unwrap().unwrap().id, id);
    }

    #[test]
    fn set_world_applies_to_later_requests() {
        let open = Arc::new(World::new());
        let mut service = PathService::spawn(Arc::clone(&open)).unwrap();

        let mut blocked = World::new();
        blocked
            .set_solidity(GlobalTilePosition::new(9, 9), Solidity::Solid)
            .unwrap();
        service.set_world(Arc::new(blocked));
        assert_eq!(service.world().revision(), 2);

        service
            .request(tile(&open, 0, 0), tile(&open, 9, 9))
            .unwrap();
        let response = service.wait(TIMEOUT).unwrap().unwrap();
        assert_eq!(response.outcome, PathOutcome::Unreachable);
    }
}
