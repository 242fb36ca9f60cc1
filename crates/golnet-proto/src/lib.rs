//! Control-plane protocol for the golnet distributed engine.
//!
//! Broker, workers, and client talk synchronous request/response over
//! plain TCP. Each frame is a single JSON document terminated by a
//! newline; requests name the method they invoke by a string identifier
//! such as `Broker.Run` or `Worker.ComputeRegion`.
//!
//! # Modules
//!
//! - [`methods`] -- The method table: one marker type per callable method,
//!   tying its identifier to its request and response records.
//! - [`frame`] -- Request/response frames and newline-delimited framing.
//! - [`client`] -- [`RpcClient`], one connection per call.
//! - [`server`] -- [`RpcServer`] accept loop and the [`Service`] dispatch
//!   trait implemented by the broker and the worker.
//! - [`error`] -- [`RpcError`].

pub mod client;
pub mod error;
pub mod frame;
pub mod methods;
pub mod server;

pub use client::RpcClient;
pub use error::RpcError;
pub use methods::Method;
pub use server::{RpcServer, Service, decode_params, encode_result};
