//! urlsniffer core - text deobfuscation, URL extraction and the event model
//!
//! This crate provides the pure building blocks:
//! - Deobfuscation of attacker shell input (base64, escapes, defanging)
//! - URL extraction over the deobfuscated text
//! - Inbound honeypot events and persisted URL records

pub mod deobfuscate;
pub mod extract;
pub mod event;
pub mod record;

pub use deobfuscate::*;
pub use extract::*;
pub use event::*;
pub use record::*;

/// Minimum length of a base64 run worth decoding
pub const MIN_BASE64_RUN: usize = 16;

/// Default re-verification interval in seconds
pub const DEFAULT_VERIFY_INTERVAL_SECS: u64 = 300;

/// Default TCP connect timeout for liveness probes, in seconds
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Default number of probes in flight during a sweep
pub const DEFAULT_SWEEP_CONCURRENCY: usize = 16;

/// Default MySQL port
pub const DEFAULT_MYSQL_PORT: u16 = 3306;
