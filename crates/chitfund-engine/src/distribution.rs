// crates/chitfund-engine/src/distribution.rs
//
// Distribution schedule projection for three-winner funds.
//
// Every round collects `N * M`. Three winners each take a quarter of the
// collection (rounded), and the remaining quarter is shared among the
// members still waiting. Rounds continue until two members remain:
//
//   rounds = floor((N - 2) / 3) + 1
//
// The final round is always projected with exactly 2 participants, even when
// `N - 2` is not a multiple of 3.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Participants projected for the final round.
pub const FINAL_ROUND_PARTICIPANTS: u32 = 2;

/// Winners paid in each three-winner round.
pub const WINNERS_PER_ROUND: u64 = 3;

/// Amount paid to each winner of a three-winner round.
///
/// `round(total / 4)` with halves rounded up, then clamped to `total / 3` so
/// three payouts never exceed the collection. The clamp only bites on a
/// collection of exactly 2 units: plain half-up rounding would pay 1 to each
/// of three winners (3 > 2), so this returns 0 instead.
pub fn three_winner_payout(total_collection: u64) -> u64 {
    let quarter = total_collection / 4 + u64::from(total_collection % 4 >= 2);
    quarter.min(total_collection / WINNERS_PER_ROUND)
}

/// Integer division rounded half up.
fn div_round(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    let q = numerator / denominator;
    let r = numerator % denominator;
    if r.saturating_mul(2) >= denominator {
        q + 1
    } else {
        q
    }
}

/// Progress of a projected round relative to the fund's winner history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Completed,
    Current,
    Upcoming,
}

/// One projected round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// 1-based round number.
    pub round: u32,
    pub total_collection: u64,
    /// Sum paid to the three winners.
    pub winners_amount: u64,
    /// Collection left after the winners are paid.
    pub remaining_amount: u64,
    pub remaining_participants: u32,
    /// `round(remaining_amount / remaining_participants)`.
    pub per_participant_share: u64,
    pub is_last_round: bool,
    pub status: RoundStatus,
}

/// Full projection for a fund's capacity and monthly amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSchedule {
    pub total_members: u32,
    pub monthly_amount: u64,
    pub total_collection: u64,
    pub payout_per_winner: u64,
    /// Number of rounds already drawn (the fund's winner history length).
    pub completed_rounds: usize,
    pub rows: Vec<ScheduleRow>,
}

impl DistributionSchedule {
    /// Project the schedule for `total_members` members paying `monthly_amount`.
    ///
    /// Produces an empty schedule when fewer than 2 members are configured.
    pub fn compute(total_members: u32, monthly_amount: u64) -> Self {
        let total_collection = u64::from(total_members).saturating_mul(monthly_amount);
        let payout_per_winner = three_winner_payout(total_collection);
        let winners_amount = payout_per_winner * WINNERS_PER_ROUND;
        let remaining_amount = total_collection.saturating_sub(winners_amount);

        let round_count = if total_members < FINAL_ROUND_PARTICIPANTS {
            0
        } else {
            (total_members - FINAL_ROUND_PARTICIPANTS) / 3 + 1
        };

        let rows = (1..=round_count)
            .map(|round| {
                let is_last_round = round == round_count;
                let remaining_participants = if is_last_round {
                    FINAL_ROUND_PARTICIPANTS
                } else {
                    total_members - round * 3
                };
                ScheduleRow {
                    round,
                    total_collection,
                    winners_amount,
                    remaining_amount,
                    remaining_participants,
                    per_participant_share: div_round(
                        remaining_amount,
                        u64::from(remaining_participants),
                    ),
                    is_last_round,
                    status: RoundStatus::Upcoming,
                }
            })
            .collect();

        let schedule = Self {
            total_members,
            monthly_amount,
            total_collection,
            payout_per_winner,
            completed_rounds: 0,
            rows,
        };

        if schedule.final_round_is_nominal() {
            warn!(
                total_members,
                rounds = round_count,
                "Final round fixed at {} participants; capacity does not divide evenly",
                FINAL_ROUND_PARTICIPANTS
            );
        }

        schedule.with_progress(0)
    }

    /// Mark rows as completed/current/upcoming given `completed` past draws.
    pub fn with_progress(mut self, completed: usize) -> Self {
        self.completed_rounds = completed;
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.status = match index.cmp(&completed) {
                std::cmp::Ordering::Less => RoundStatus::Completed,
                std::cmp::Ordering::Equal => RoundStatus::Current,
                std::cmp::Ordering::Greater => RoundStatus::Upcoming,
            };
        }
        self
    }

    pub fn round_count(&self) -> usize {
        self.rows.len()
    }

    /// The next round to be drawn, if any remain.
    pub fn next_round(&self) -> Option<&ScheduleRow> {
        self.rows.get(self.completed_rounds)
    }

    /// Whether the final round's participant count is a fixed assumption
    /// rather than what is left after the preceding rounds.
    pub fn final_round_is_nominal(&self) -> bool {
        match self.rows.len() {
            0 => false,
            n => {
                let natural = i64::from(self.total_members) - 3 * (n as i64 - 1);
                natural != i64::from(FINAL_ROUND_PARTICIPANTS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_hundred_members_gives_67_rounds() {
        let s = DistributionSchedule::compute(200, 50_000);
        assert_eq!(s.round_count(), 67);
        assert_eq!(s.total_collection, 10_000_000);
        assert_eq!(s.payout_per_winner, 2_500_000);

        let first = &s.rows[0];
        assert_eq!(first.round, 1);
        assert_eq!(first.winners_amount, 7_500_000);
        assert_eq!(first.remaining_amount, 2_500_000);
        assert_eq!(first.remaining_participants, 197);
        assert_eq!(first.per_participant_share, 12_690); // 2.5M / 197 = 12690.36
        assert!(!first.is_last_round);

        let last = s.rows.last().unwrap();
        assert_eq!(last.round, 67);
        assert_eq!(last.remaining_participants, 2);
        assert_eq!(last.per_participant_share, 1_250_000);
        assert!(last.is_last_round);

        // 200 - 3*66 = 2, so the last round is exact.
        assert!(!s.final_round_is_nominal());
    }

    #[test]
    fn test_round_count_formula() {
        for n in 2..=60u32 {
            let s = DistributionSchedule::compute(n, 1_000);
            assert_eq!(s.round_count() as u32, (n - 2) / 3 + 1, "n = {}", n);
            assert_eq!(s.rows.last().unwrap().remaining_participants, 2);
            for row in &s.rows[..s.rows.len() - 1] {
                assert_eq!(row.remaining_participants, n - row.round * 3);
                assert!(row.remaining_participants >= 2);
            }
        }
    }

    #[test]
    fn test_nominal_final_round() {
        // 10 members: rounds = 3, but 4 remain after round 2.
        let s = DistributionSchedule::compute(10, 1_000);
        assert_eq!(s.round_count(), 3);
        assert!(s.final_round_is_nominal());
    }

    #[test]
    fn test_small_capacity_is_empty() {
        assert_eq!(DistributionSchedule::compute(0, 1_000).round_count(), 0);
        assert_eq!(DistributionSchedule::compute(1, 1_000).round_count(), 0);
        assert_eq!(DistributionSchedule::compute(2, 1_000).round_count(), 1);
    }

    #[test]
    fn test_progress_status() {
        let s = DistributionSchedule::compute(20, 1_000).with_progress(2);
        assert_eq!(s.rows[0].status, RoundStatus::Completed);
        assert_eq!(s.rows[1].status, RoundStatus::Completed);
        assert_eq!(s.rows[2].status, RoundStatus::Current);
        assert_eq!(s.rows[3].status, RoundStatus::Upcoming);
        assert_eq!(s.next_round().unwrap().round, 3);

        let done = DistributionSchedule::compute(5, 1_000).with_progress(10);
        assert!(done.next_round().is_none());
        assert!(done.rows.iter().all(|r| r.status == RoundStatus::Completed));
    }

    #[test]
    fn test_three_winner_payout_rounding() {
        assert_eq!(three_winner_payout(10_000_000), 2_500_000);
        assert_eq!(three_winner_payout(10), 3); // 2.5 rounds up
        assert_eq!(three_winner_payout(9), 2); // 2.25 rounds down
        assert_eq!(three_winner_payout(5), 1); // 1.25 -> 1
        assert_eq!(three_winner_payout(4), 1);
        assert_eq!(three_winner_payout(2), 0); // clamped: 0.5 rounds to 1 but 3 > 2
        assert_eq!(three_winner_payout(0), 0);
    }

    #[test]
    fn test_share_rounds_half_up() {
        assert_eq!(div_round(5, 2), 3);
        assert_eq!(div_round(4, 3), 1);
        assert_eq!(div_round(7, 0), 0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_round_payouts_within_collection(
                n in 0u32..=2_000,
                m in 1u64..=1_000_000,
            ) {
                let s = DistributionSchedule::compute(n, m);
                prop_assert!(s.payout_per_winner * WINNERS_PER_ROUND <= s.total_collection);
                for row in &s.rows {
                    prop_assert_eq!(row.winners_amount + row.remaining_amount, row.total_collection);
                    prop_assert!(row.remaining_participants >= FINAL_ROUND_PARTICIPANTS);
                }
            }
        }

        proptest! {
            #[test]
            fn prop_round_count(n in 2u32..=5_000) {
                let s = DistributionSchedule::compute(n, 100);
                prop_assert_eq!(s.round_count() as u32, (n - 2) / 3 + 1);
                prop_assert!(s.rows.last().map(|r| r.is_last_round).unwrap_or(false));
                prop_assert_eq!(s.rows.iter().filter(|r| r.is_last_round).count(), 1);
            }
        }
    }
}
