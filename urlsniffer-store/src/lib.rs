//! urlsniffer storage
//!
//! Keeps one record per URL with first/last view timestamps:
//! - [`UrlRepository`]: the persistence contract, with memory, SQLite and
//!   MySQL backends
//! - [`UrlStore`]: upsert/touch semantics over a repository, guarded by the
//!   in-process known-URL cache

pub mod traits;
pub mod config;
pub mod memory;
pub mod sqlite;
pub mod mysql;
pub mod store;

pub use traits::*;
pub use config::*;
pub use memory::*;
pub use sqlite::*;
pub use mysql::*;
pub use store::*;
