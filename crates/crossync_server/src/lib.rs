//! # crossync Server
//!
//! Network service through which remote servers read and update records.
//!
//! This crate provides:
//! - [`RequestHandler`], dispatching protocol messages to a coordinator
//! - [`SyncServer`], owning the coordinator and its cache for the
//!   service's lifetime, with a tokio TCP listener
//! - [`SyncClient`], a blocking client
//!
//! # Architecture
//!
//! ```text
//! remote server --frame--> listener --spawn_blocking--> SyncServer::handle_frame
//!                                                          |
//!                                                    RequestHandler
//!                                                          |
//!                                                   SyncCoordinator --> RecordStore
//! ```
//!
//! # Errors on the wire
//!
//! A stale update is a normal `SubmitUpdateResponse` with `accepted: false`.
//! A store outage sets the response's `error` field and may be retried.
//! Malformed requests are answered with an `Error` message.
//!
//! # Example
//!
//! ```rust,no_run
//! use crossync_core::InMemoryStore;
//! use crossync_server::{ServerConfig, SyncServer};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), crossync_server::ServerError> {
//! let server = Arc::new(SyncServer::new(
//!     ServerConfig::default(),
//!     Arc::new(InMemoryStore::new()),
//! ));
//! server.run().await
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod client;
mod config;
mod error;
mod handler;
mod listener;
mod server;

pub use client::SyncClient;
pub use config::{ServerConfig, DEFAULT_PORT};
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use server::SyncServer;
