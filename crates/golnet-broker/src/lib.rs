//! Broker for the golnet distributed Game of Life engine.
//!
//! The broker owns the authoritative world while a run is in progress. Each
//! turn it partitions the world into one region per worker, dispatches the
//! regions concurrently, and reassembles the next generation. Clients steer
//! the run through pause, quit, report, save and shutdown calls that are
//! served while the run is in flight.
//!
//! # Modules
//!
//! - [`broker`] -- [`Broker`]: the run loop and the control methods.
//! - [`orchestrator`] -- [`WorkerPool`] and the one-turn [`advance`].
//! - [`control`] -- Pause/quit signalling and [`RunState`].
//! - [`session`] -- The published [`SessionSnapshot`].
//! - [`config`] -- [`BrokerConfig`] from YAML plus environment overrides.
//! - [`startup`] -- [`spawn_broker`].
//! - [`error`] -- [`BrokerError`].

pub mod broker;
pub mod config;
pub mod control;
pub mod error;
pub mod orchestrator;
pub mod session;
pub mod startup;

pub use broker::Broker;
pub use config::{BrokerConfig, ConfigError, ListenConfig};
pub use control::{RunControl, RunState};
pub use error::BrokerError;
pub use orchestrator::{LocalWorkerPool, RpcWorkerPool, WorkerPool, advance};
pub use session::{RunId, SessionSnapshot, SessionStore};
pub use startup::{RunningBroker, spawn_broker};
