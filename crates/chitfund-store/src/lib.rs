// crates/chitfund-store/src/lib.rs
//
// chitfund-store: Storage layer for the chit fund service.
//
// Provides a RocksDB-backed store for members, funds, and operator accounts
// (with secondary indexes for mobile numbers and usernames), and an
// in-memory store with identical semantics for tests and ephemeral runs.

pub mod memory;
pub mod rocks;

// Re-export key types for ergonomic access from downstream crates.
pub use memory::InMemoryStore;
pub use rocks::RocksStore;
