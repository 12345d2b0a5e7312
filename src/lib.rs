//! Roomba session library.
//!
//! Keeps a live session with one networked iRobot cleaning robot, turns its
//! telemetry stream into a normalized state and sends commands back.  The
//! transport itself is injected through
//! [`TransportPort`](app::ports::TransportPort).

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod attributes;
pub mod config;
pub mod connection;
pub mod device;
pub mod dispatcher;
pub mod interpreter;
pub mod rooms;
pub mod statistics;
pub mod telemetry;
pub mod teardown;

mod error;

pub use error::{Error, Result, TransportError};
