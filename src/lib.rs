//! Pawlog sync server library.
//!
//! The reference remote store for Pawlog clients: authenticated upsert,
//! delete and owner-scoped query per named collection over HTTP.

pub mod server;
