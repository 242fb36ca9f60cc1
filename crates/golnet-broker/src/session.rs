//! The broker's session snapshot.
//!
//! The run loop is the only writer. After each completed turn it publishes
//! a fresh immutable [`SessionSnapshot`]; report and save readers clone the
//! `Arc` and never see a half-written world.
//!
//! Every publication is tagged with the epoch returned by
//! [`SessionStore::begin`]. Quit bumps the epoch, so a turn that was
//! already in flight when the session was cleared is discarded instead of
//! bringing the old run back.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use golnet_types::World;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Identifier of one `Broker.Run`, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    /// A new time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// State of the session as of the last completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Run that produced this snapshot; `None` for a cleared session.
    pub run_id: Option<RunId>,
    /// Turns completed.
    pub turns: u64,
    /// Alive cells in `world`.
    pub alive_cells_count: u64,
    /// The world reached.
    pub world: World,
    /// When the snapshot was taken.
    pub updated_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// The cleared session: no run, turn 0, empty world.
    pub fn empty() -> Self {
        Self {
            run_id: None,
            turns: 0,
            alive_cells_count: 0,
            world: World::default(),
            updated_at: Utc::now(),
        }
    }

    /// Snapshot of `world` after `turns` turns of `run_id`.
    pub fn new(run_id: RunId, turns: u64, world: World) -> Self {
        let alive_cells_count = u64::try_from(world.alive_count()).unwrap_or(u64::MAX);
        Self {
            run_id: Some(run_id),
            turns,
            alive_cells_count,
            world,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
struct Published {
    epoch: u64,
    snapshot: Arc<SessionSnapshot>,
}

/// Single-writer, multi-reader holder of the current [`SessionSnapshot`].
#[derive(Debug)]
pub struct SessionStore {
    inner: RwLock<Published>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// An empty session.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Published {
                epoch: 0,
                snapshot: Arc::new(SessionSnapshot::empty()),
            }),
        }
    }

    /// Start a new session at turn 0 with `world`. Returns the epoch the
    /// run must publish under.
    pub async fn begin(&self, run_id: RunId, world: World) -> u64 {
        let mut inner = self.inner.write().await;
        inner.epoch = inner.epoch.wrapping_add(1);
        inner.snapshot = Arc::new(SessionSnapshot::new(run_id, 0, world));
        inner.epoch
    }

    /// Replace the snapshot if `epoch` is still current. Returns whether
    /// the snapshot was accepted.
    pub async fn publish(&self, epoch: u64, snapshot: SessionSnapshot) -> bool {
        let mut inner = self.inner.write().await;
        if inner.epoch != epoch {
            return false;
        }
        inner.snapshot = Arc::new(snapshot);
        true
    }

    /// The latest published snapshot.
    pub async fn current(&self) -> Arc<SessionSnapshot> {
        Arc::clone(&self.inner.read().await.snapshot)
    }

    /// Clear the session and invalidate the running epoch.
    pub async fn reset(&self) {
        let mut inner = self.inner.write().await;
        inner.epoch = inner.epoch.wrapping_add(1);
        inner.snapshot = Arc::new(SessionSnapshot::empty());
    }
}
