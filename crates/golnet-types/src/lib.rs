//! Shared grid model for the golnet distributed Game of Life engine.
//!
//! Every other crate in the workspace (worker, broker, client) speaks in
//! the types defined here. The crate also owns the two pure algorithms the
//! distributed engine is built on, so that the broker and the worker can
//! never disagree about them.
//!
//! # Modules
//!
//! - [`grid`] -- [`Cell`] and the toroidal [`Grid`] matrix.
//! - [`world`] -- [`World`] (grid plus worker count) and [`Region`] (a
//!   row band bracketed by halo rows).
//! - [`partition`] -- Row-band partitioning, halo construction, and
//!   reassembly of computed bands.
//! - [`rules`] -- Per-region rule application.
//! - [`wire`] -- Compact row encoding used on the wire.
//! - [`error`] -- [`GridError`] for shape and partitioning failures.

pub mod error;
pub mod grid;
pub mod partition;
pub mod rules;
pub mod wire;
pub mod world;

pub use error::GridError;
pub use grid::{Cell, Grid};
pub use partition::{Band, reassemble, region_for, regions};
pub use rules::{next_state, step_grid, step_region};
pub use world::{Region, World};
