use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::{ContestId, ProblemResult, Standing, UserId};

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub contest_id: ContestId,
    pub user_id: UserId,
    pub score: u32,
    pub penalty: i64,
    /// 1-based; 0 until ranks are assigned.
    pub rank: u32,
    pub problems_solved: Vec<ProblemResult>,
    pub last_submission_time: Option<DateTime<Utc>>,
}

impl LeaderboardEntry {
    pub fn from_standing(
        contest_id: ContestId,
        user_id: UserId,
        standing: Standing,
        last_submission_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            contest_id,
            user_id,
            score: standing.score,
            penalty: standing.penalty,
            rank: 0,
            problems_solved: standing.problems_solved,
            last_submission_time,
        }
    }

    fn shares_rank_with(&self, other: &Self) -> bool {
        self.score == other.score && self.penalty == other.penalty
    }
}

/// Point-in-time copy of the standings, served while the board is frozen.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardSnapshot {
    pub contest_id: ContestId,
    pub taken_at: DateTime<Utc>,
    pub entries: Vec<LeaderboardEntry>,
}

/// Display order of the standings: score descending, penalty ascending, then the
/// earlier last submission. Entries without a submission time go last; the user
/// id settles anything still equal.
pub fn standings_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(a.penalty.cmp(&b.penalty))
        .then_with(|| match (a.last_submission_time, b.last_submission_time) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Sorts entries into standings order and assigns competition ranks (1, 1, 3).
///
/// Equal `(score, penalty)` share a rank; the submission time only fixes the
/// display order among them.
pub fn assign_ranks(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(standings_order);

    for index in 0..entries.len() {
        let rank = if index > 0 && entries[index].shares_rank_with(&entries[index - 1]) {
            entries[index - 1].rank
        } else {
            index as u32 + 1
        };
        entries[index].rank = rank;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn entry(score: u32, penalty: i64, minutes: Option<i64>) -> LeaderboardEntry {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        LeaderboardEntry {
            contest_id: ContestId::new(),
            user_id: UserId::new(),
            score,
            penalty,
            rank: 0,
            problems_solved: Vec::new(),
            last_submission_time: minutes.map(|m| base + Duration::minutes(m)),
        }
    }

    fn ranks(entries: &[LeaderboardEntry]) -> Vec<(u32, u32, i64)> {
        entries
            .iter()
            .map(|entry| (entry.rank, entry.score, entry.penalty))
            .collect()
    }

    #[test]
    fn ties_share_rank_and_skip_the_next() {
        let mut entries = vec![
            entry(4, 50, Some(1)),
            entry(5, 100, Some(2)),
            entry(5, 100, Some(3)),
        ];

        assign_ranks(&mut entries);

        assert_eq!(ranks(&entries), vec![(1, 5, 100), (1, 5, 100), (3, 4, 50)]);
    }

    #[test]
    fn lower_penalty_ranks_higher_on_equal_score() {
        let mut entries = vec![entry(3, 90, Some(1)), entry(3, 40, Some(2))];

        assign_ranks(&mut entries);

        assert_eq!(ranks(&entries), vec![(1, 3, 40), (2, 3, 90)]);
    }

    #[test]
    fn submission_time_orders_tied_entries_without_splitting_rank() {
        let mut entries = vec![
            entry(2, 10, None),
            entry(2, 10, Some(30)),
            entry(2, 10, Some(5)),
        ];
        let earliest = entries[2].user_id;
        let never = entries[0].user_id;

        assign_ranks(&mut entries);

        assert_eq!(entries[0].user_id, earliest);
        assert_eq!(entries[2].user_id, never);
        assert!(entries.iter().all(|entry| entry.rank == 1));
    }

    #[test]
    fn reranking_is_idempotent() {
        let mut entries = vec![
            entry(1, 20, Some(4)),
            entry(3, 80, Some(9)),
            entry(3, 80, Some(7)),
            entry(0, 0, None),
        ];

        assign_ranks(&mut entries);
        let first = entries.clone();
        assign_ranks(&mut entries);

        assert_eq!(entries, first);
        assert_eq!(
            entries.iter().map(|entry| entry.rank).collect::<Vec<_>>(),
            vec![1, 1, 3, 4]
        );
    }

    #[test]
    fn identical_entries_fall_back_to_user_id() {
        let mut entries: Vec<LeaderboardEntry> = (0..6).map(|_| entry(1, 10, Some(3))).collect();
        let mut expected: Vec<UserId> = entries.iter().map(|entry| entry.user_id).collect();
        expected.sort();

        entries.reverse();
        entries.sort_by(standings_order);

        let order: Vec<UserId> = entries.iter().map(|entry| entry.user_id).collect();
        assert_eq!(order, expected);
    }
}
