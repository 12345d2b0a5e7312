//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements     | Connects to                 |
//! |-----------------|----------------|-----------------------------|
//! | `log_sink`      | EventSink      | `log` facade                |
//! | `sim_transport` | TransportPort  | In-process robot model      |
//! | `time`          | ClockPort      | System wall clock           |
//!
//! The production robot transport (MQTT over TLS) lives outside this crate
//! and implements [`TransportPort`](crate::app::ports::TransportPort) the
//! same way `sim_transport` does.

pub mod log_sink;
pub mod sim_transport;
pub mod time;
