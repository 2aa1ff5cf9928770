//! A minimal HTTP server built around an explicit, sealable router.
//!
//! Routes are registered during single-threaded startup, the table is sealed
//! into an immutable [`router::Router`], and the transport in [`server`]
//! dispatches parsed requests against it from a worker pool.

pub mod error;
pub mod handler;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod threadpool;
