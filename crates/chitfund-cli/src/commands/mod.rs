// crates/chitfund-cli/src/commands/mod.rs
//
// Command module declarations for the chitfund CLI.

pub mod admin;
pub mod auth;
pub mod draw;
pub mod funds;
pub mod ledger;
pub mod members;
pub mod search;
pub mod users;
