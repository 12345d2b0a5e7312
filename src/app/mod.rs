//! Application core: session orchestration with no direct I/O.
//!
//! This module ties the robot session together: inbound [`commands`],
//! outbound [`events`] and the [`service`] facade.  All interaction with
//! the network happens through **port traits** defined in [`ports`],
//! keeping this layer testable without a real robot.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
