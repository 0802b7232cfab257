// crates/chitfund-rpc/src/handlers/mod.rs
//
// Handler modules for all RPC endpoints.
// Each module defines request/response types and handler functions
// for a specific API group.

pub mod admin;
pub mod auth;
pub mod draw;
pub mod funds;
pub mod members;
pub mod search;
pub mod users;
