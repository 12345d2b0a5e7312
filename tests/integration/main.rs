//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the recording mock transport.  All tests run on the host with
//! no robot required.

mod connection_tests;
mod dispatcher_tests;
mod mock_transport;
mod rooms_tests;
