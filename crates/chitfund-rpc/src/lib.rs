// crates/chitfund-rpc/src/lib.rs
//
// chitfund-rpc: JSON-RPC server, session table, and handlers for the
// chit fund service.
//
// Requests travel as a JSON envelope over tonic's HTTP transport rather
// than protobuf codegen. Every method has an access rule; the dispatcher
// resolves the caller's session before invoking the handler.

pub mod handlers;
pub mod middleware;
pub mod server;
pub mod session;

// Re-export the main server type for ergonomic access.
pub use server::{FundRpcServer, JsonRpcRequest, JsonRpcResponse, RpcConfig};
pub use session::SessionManager;
