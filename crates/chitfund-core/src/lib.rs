// crates/chitfund-core/src/lib.rs
//
// chitfund-core: Core types, traits, and crypto helpers for the chit fund service.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the member/fund/user records, the error taxonomy, role and
// capability checks, the member identifier generator, and the store traits.

pub mod auth;
pub mod crypto;
pub mod error;
pub mod fund;
pub mod member;
pub mod member_id;
pub mod traits;
pub mod user;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use chitfund_core::Fund;`

pub use auth::{Capability, Role, Session};
pub use error::ChitError;
pub use fund::{Fund, FundConfig, WinnerRecord};
pub use member::{Member, MemberDetails};
pub use member_id::generate_member_id;
pub use traits::{FundStore, MemberStore, UserStore};
pub use user::{UserAccount, UserSummary};
