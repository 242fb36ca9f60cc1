//! Worker node for the golnet distributed engine.
//!
//! A worker holds no state between calls. The broker sends it one
//! [`Region`](golnet_types::Region) per turn; the worker applies one
//! generation to the band and returns the band rows without the halo.
//!
//! # Modules
//!
//! - [`service`] -- [`WorkerService`] and its RPC dispatch.
//! - [`startup`] -- [`spawn_worker`], which binds and serves on a
//!   background task.
//! - [`config`] -- [`WorkerConfig`] loaded from the environment.
//! - [`error`] -- [`WorkerError`].

pub mod config;
pub mod error;
pub mod service;
pub mod startup;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use service::WorkerService;
pub use startup::{RunningWorker, spawn_worker};
