//! urlsniffer runtime
//!
//! Wires the pieces into the honeypot output plugin:
//! - **ObservationHandler**: event → candidate URLs → upsert → liveness probe
//! - **PeriodicVerifier**: re-probes every known URL on a fixed interval
//! - **UrlSniffer**: start/write/stop lifecycle owning both
//! - **pump**: feeds JSON-lines events from a reader into a sniffer

pub mod config;
pub mod handler;
pub mod verifier;
pub mod sniffer;
pub mod feed;

pub use config::*;
pub use handler::*;
pub use verifier::*;
pub use sniffer::*;
pub use feed::*;

#[cfg(test)]
pub(crate) mod testing;
