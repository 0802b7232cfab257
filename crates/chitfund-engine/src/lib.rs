// crates/chitfund-engine/src/lib.rs
//
// chitfund-engine: Draw engine, distribution schedule, and the registry
// services built on top of the stores.
//
// All monetary values are whole currency units held in `u64`. Payout
// rounding is half-up integer arithmetic; three payouts never exceed the
// round's total collection.

pub mod distribution;
pub mod draw;
pub mod import;
pub mod registry;
pub mod reporting;

// Re-export key types for ergonomic access from downstream crates.
pub use distribution::{three_winner_payout, DistributionSchedule, RoundStatus, ScheduleRow};
pub use draw::{draw_single_winner, draw_three_winners, DrawOutcome};
pub use import::{import_members, parse_members, ImportReport};
pub use registry::{
    AddMembersReport, DrawMode, FundDetail, FundRef, FundRegistry, RemovalMode, RemovalReport,
};
pub use reporting::{
    counts, ledger, search_member, DataCounts, LedgerEntry, MemberQuery,
    MemberSearchResult, PurgeReport, PurgeScope, WinningEntry,
};
