//! Unified error types for the Roomba session layer.
//!
//! A single [`Error`] enum that every component converts into, so the
//! caller of [`RoombaService`](crate::app::service::RoombaService) handles
//! one type.  Transport adapters report through [`TransportError`], which
//! the connection manager wraps before it leaves the crate.
//!
//! Unknown telemetry (phases, not-ready codes, dock states) is never an
//! error here; the interpreter degrades it to placeholder values instead.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The robot never reported its identity within the connect timeout.
    ConnectTimeout,
    /// The transport refused the connection outright.
    ConnectFailure(TransportError),
    /// Disconnect did not finish within its bound.  Only ever logged.
    DisconnectTimeout,
    /// A command was rejected before it reached the transport.
    InvalidCommandParameters(&'static str),
    /// The robot rejected a map/region selection.
    RegionValidationFailure(String),
    /// A command was issued while no session is connected.
    NotConnected,
    /// Another connect or disconnect is already running for this session.
    Busy(&'static str),
    /// The session was torn down while the operation was waiting.
    Cancelled,
    /// A transport-level failure while sending.
    Transport(TransportError),
    /// The caller-supplied session configuration is unusable.
    Config(&'static str),
}

impl Error {
    /// Whether the caller should retry the whole setup later.
    ///
    /// Connect failures surface as a "not ready" condition; this layer
    /// never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectTimeout | Self::ConnectFailure(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectTimeout => write!(f, "timed out waiting for the robot to report its identity"),
            Self::ConnectFailure(e) => write!(f, "connection refused: {e}"),
            Self::DisconnectTimeout => write!(f, "disconnect timed out"),
            Self::InvalidCommandParameters(msg) => write!(f, "invalid command parameters: {msg}"),
            Self::RegionValidationFailure(msg) => write!(f, "region selection rejected: {msg}"),
            Self::NotConnected => write!(f, "not connected"),
            Self::Busy(op) => write!(f, "{op} already in progress"),
            Self::Cancelled => write!(f, "session torn down"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConnectFailure(e) | Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Errors reported by a [`TransportPort`](crate::app::ports::TransportPort).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The robot (or broker) refused the connection, e.g. bad credentials.
    Refused(String),
    /// The transport is not connected.
    NotConnected,
    /// The robot answered a command with a rejection.
    Rejected(String),
    /// Socket / protocol level failure.
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refused(msg) => write!(f, "refused: {msg}"),
            Self::NotConnected => write!(f, "not connected"),
            Self::Rejected(msg) => write!(f, "rejected: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
