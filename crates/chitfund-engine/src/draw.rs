// crates/chitfund-engine/src/draw.rs
//
// Winner selection for a single fund.
//
// Two distinct draw modes:
//   - Single winner: one eligible member (never a previous winner of this
//     fund) receives the monthly amount.
//   - Three winners: three distinct active members each receive a quarter
//     of the round's total collection. Previous winners are not excluded.
//
// Both functions are pure over the fund, a directory of resolved member
// records, and an injected random source. The fund is only mutated once a
// draw has fully succeeded.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use chitfund_core::error::ChitError;
use chitfund_core::fund::{Fund, WinnerRecord};
use chitfund_core::member::Member;

use crate::distribution::three_winner_payout;

/// Result of a successful draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOutcome {
    /// Winner records appended to the fund's history, in selection order.
    pub winners: Vec<WinnerRecord>,
    /// Active roster size after the winners were removed.
    pub remaining_members: usize,
}

/// Active roster entries that resolve to a member record.
fn resolve_candidates<'a>(
    fund: &'a Fund,
    directory: &'a HashMap<String, Member>,
) -> Vec<&'a Member> {
    fund.active_members
        .iter()
        .filter_map(|id| match directory.get(id) {
            Some(member) => Some(member),
            None => {
                warn!(fund = %fund.id, member_id = %id, "Active member does not resolve; skipping");
                None
            }
        })
        .collect()
}

fn apply_winners(fund: &mut Fund, winners: &[WinnerRecord]) -> usize {
    for w in winners {
        fund.remove_member(&w.member_id);
    }
    fund.winner_history.extend_from_slice(winners);
    fund.active_members.len()
}

/// Draw one winner who has not won in this fund before.
///
/// Fails with `InsufficientMembers` when the roster is empty and with
/// `NoEligibleMembers` when every resolvable active member has already won.
pub fn draw_single_winner<R: Rng + ?Sized>(
    fund: &mut Fund,
    directory: &HashMap<String, Member>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<DrawOutcome, ChitError> {
    if fund.active_members.is_empty() {
        return Err(ChitError::InsufficientMembers {
            required: 1,
            available: 0,
        });
    }

    let eligible: Vec<&Member> = resolve_candidates(fund, directory)
        .into_iter()
        .filter(|m| !fund.has_won(&m.member_id))
        .collect();

    let winner = eligible.choose(rng).ok_or(ChitError::NoEligibleMembers)?;
    let record = WinnerRecord {
        member_id: winner.member_id.clone(),
        member_name: winner.name.clone(),
        date_won: now,
        amount: fund.monthly_amount,
    };

    let winners = vec![record];
    let remaining_members = apply_winners(fund, &winners);
    info!(
        fund = %fund.id,
        winner = %winners[0].member_id,
        amount = winners[0].amount,
        remaining_members,
        "Single-winner draw completed"
    );

    Ok(DrawOutcome {
        winners,
        remaining_members,
    })
}

/// Draw three distinct winners, each paid `round(total_collection / 4)`.
///
/// Fails with `InsufficientMembers` when fewer than three active members
/// resolve to member records.
pub fn draw_three_winners<R: Rng + ?Sized>(
    fund: &mut Fund,
    directory: &HashMap<String, Member>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<DrawOutcome, ChitError> {
    const REQUIRED: usize = 3;

    if fund.active_members.len() < REQUIRED {
        return Err(ChitError::InsufficientMembers {
            required: REQUIRED,
            available: fund.active_members.len(),
        });
    }

    let candidates = resolve_candidates(fund, directory);
    if candidates.len() < REQUIRED {
        return Err(ChitError::InsufficientMembers {
            required: REQUIRED,
            available: candidates.len(),
        });
    }

    let amount = three_winner_payout(fund.total_collection());
    let winners: Vec<WinnerRecord> = candidates
        .choose_multiple(rng, REQUIRED)
        .map(|m| WinnerRecord {
            member_id: m.member_id.clone(),
            member_name: m.name.clone(),
            date_won: now,
            amount,
        })
        .collect();

    let remaining_members = apply_winners(fund, &winners);
    info!(
        fund = %fund.id,
        amount_each = amount,
        remaining_members,
        "Three-winner draw completed"
    );

    Ok(DrawOutcome {
        winners,
        remaining_members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chitfund_core::fund::FundConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn member(i: usize) -> Member {
        Member {
            member_id: format!("AGR{:04}A", i),
            name: format!("Member {}", i),
            mobile: format!("90000{:05}", i),
            email: format!("m{}@example.com", i),
            location: "Thrissur".to_string(),
            national_id: format!("{:012}", i),
            created_at: Utc::now(),
        }
    }

    fn fund_with(n_active: usize, total_members: u32, monthly_amount: u64) -> (Fund, HashMap<String, Member>) {
        let members: Vec<Member> = (0..n_active).map(member).collect();
        let fund = Fund::new(
            FundConfig {
                name: "Test Fund".to_string(),
                total_members,
                draw_day: 10,
                monthly_amount,
            },
            members.iter().map(|m| m.member_id.clone()).collect(),
            Utc::now(),
        )
        .unwrap();
        let directory = members.into_iter().map(|m| (m.member_id.clone(), m)).collect();
        (fund, directory)
    }

    #[test]
    fn test_single_winner_never_repeats() {
        let (mut fund, dir) = fund_with(10, 10, 1_000);
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();

        for round in 0..10 {
            let before = fund.active_members.len();
            let outcome = draw_single_winner(&mut fund, &dir, Utc::now(), &mut rng).unwrap();
            assert_eq!(outcome.winners.len(), 1);
            assert_eq!(outcome.remaining_members, before - 1);
            assert_eq!(outcome.winners[0].amount, 1_000);
            assert!(seen.insert(outcome.winners[0].member_id.clone()), "round {}", round);
        }
        assert!(fund.active_members.is_empty());
        assert_eq!(fund.winner_history.len(), 10);
    }

    #[test]
    fn test_single_winner_skips_previous_winner_readded() {
        let (mut fund, dir) = fund_with(2, 2, 500);
        let mut rng = StdRng::seed_from_u64(1);
        let first = draw_single_winner(&mut fund, &dir, Utc::now(), &mut rng).unwrap();
        let winner_id = first.winners[0].member_id.clone();

        // Re-adding the winner does not make them eligible again.
        fund.add_members(vec![winner_id.clone()]);
        let second = draw_single_winner(&mut fund, &dir, Utc::now(), &mut rng).unwrap();
        assert_ne!(second.winners[0].member_id, winner_id);

        // Only the previous winner is left.
        let err = draw_single_winner(&mut fund, &dir, Utc::now(), &mut rng).unwrap_err();
        assert!(matches!(err, ChitError::NoEligibleMembers));
        assert_eq!(fund.active_members, vec![winner_id]);
    }

    #[test]
    fn test_single_winner_empty_roster() {
        let (mut fund, dir) = fund_with(0, 5, 500);
        let err = draw_single_winner(&mut fund, &dir, Utc::now(), &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(
            err,
            ChitError::InsufficientMembers { required: 1, available: 0 }
        ));
    }

    #[test]
    fn test_three_winners_scenario() {
        let (mut fund, dir) = fund_with(200, 200, 50_000);
        let mut rng = StdRng::seed_from_u64(42);
        let outcome = draw_three_winners(&mut fund, &dir, Utc::now(), &mut rng).unwrap();

        assert_eq!(outcome.winners.len(), 3);
        let ids: HashSet<_> = outcome.winners.iter().map(|w| &w.member_id).collect();
        assert_eq!(ids.len(), 3);
        for w in &outcome.winners {
            assert_eq!(w.amount, 2_500_000);
            assert!(!fund.is_active(&w.member_id));
        }
        let total: u64 = outcome.winners.iter().map(|w| w.amount).sum();
        assert_eq!(total, 7_500_000);
        assert!(total <= fund.total_collection());
        assert_eq!(outcome.remaining_members, 197);
        assert_eq!(fund.active_members.len(), 197);
        assert_eq!(fund.winner_history.len(), 3);
    }

    #[test]
    fn test_roster_of_two() {
        let (mut fund, dir) = fund_with(2, 10, 1_000);
        let mut rng = StdRng::seed_from_u64(3);

        let err = draw_three_winners(&mut fund, &dir, Utc::now(), &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ChitError::InsufficientMembers { required: 3, available: 2 }
        ));
        // Failed draw leaves the fund untouched.
        assert_eq!(fund.active_members.len(), 2);
        assert!(fund.winner_history.is_empty());

        let outcome = draw_single_winner(&mut fund, &dir, Utc::now(), &mut rng).unwrap();
        assert_eq!(outcome.remaining_members, 1);
    }

    #[test]
    fn test_three_winners_unresolved_members_excluded() {
        let (mut fund, mut dir) = fund_with(4, 4, 1_000);
        let orphan = fund.active_members[0].clone();
        let orphan2 = fund.active_members[1].clone();
        dir.remove(&orphan);
        dir.remove(&orphan2);

        let err = draw_three_winners(&mut fund, &dir, Utc::now(), &mut StdRng::seed_from_u64(5)).unwrap_err();
        assert!(matches!(
            err,
            ChitError::InsufficientMembers { required: 3, available: 2 }
        ));
    }

    #[test]
    fn test_three_winners_ignores_history() {
        let (mut fund, dir) = fund_with(3, 3, 1_000);
        let mut rng = StdRng::seed_from_u64(9);
        let first = draw_three_winners(&mut fund, &dir, Utc::now(), &mut rng).unwrap();
        fund.add_members(first.winners.iter().map(|w| w.member_id.clone()));

        let second = draw_three_winners(&mut fund, &dir, Utc::now(), &mut rng).unwrap();
        assert_eq!(second.winners.len(), 3);
        assert_eq!(fund.winner_history.len(), 6);
    }

    #[test]
    fn test_seeded_draw_is_deterministic() {
        let (fund, dir) = fund_with(50, 50, 1_000);
        let now = Utc::now();
        let mut a = fund.clone();
        let mut b = fund;
        let ra = draw_three_winners(&mut a, &dir, now, &mut StdRng::seed_from_u64(11)).unwrap();
        let rb = draw_three_winners(&mut b, &dir, now, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(ra, rb);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_three_winners_distinct_and_bounded(
                n_active in 3usize..=60,
                monthly in 1u64..=100_000,
                seed in any::<u64>(),
            ) {
                let (mut fund, dir) = fund_with(n_active, n_active as u32, monthly);
                let outcome = draw_three_winners(&mut fund, &dir, Utc::now(), &mut StdRng::seed_from_u64(seed)).unwrap();

                let ids: HashSet<_> = outcome.winners.iter().map(|w| w.member_id.clone()).collect();
                prop_assert_eq!(ids.len(), 3);
                let paid: u64 = outcome.winners.iter().map(|w| w.amount).sum();
                prop_assert!(paid <= fund.total_collection());
                prop_assert_eq!(fund.active_members.len(), n_active - 3);
            }
        }

        proptest! {
            #[test]
            fn prop_single_winner_drains_roster_without_repeats(
                n_active in 1usize..=25,
                seed in any::<u64>(),
            ) {
                let (mut fund, dir) = fund_with(n_active, n_active as u32, 500);
                let mut rng = StdRng::seed_from_u64(seed);
                let mut seen = HashSet::new();
                for _ in 0..n_active {
                    let outcome = draw_single_winner(&mut fund, &dir, Utc::now(), &mut rng).unwrap();
                    prop_assert!(seen.insert(outcome.winners[0].member_id.clone()));
                }
                prop_assert!(fund.active_members.is_empty());
            }
        }
    }
}
