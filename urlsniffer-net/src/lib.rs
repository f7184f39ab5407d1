//! urlsniffer network layer
//!
//! Liveness checks for extracted URLs:
//! - Host/port resolution from a URL string
//! - Bounded-timeout TCP connect probes

pub mod probe;

pub use probe::*;
