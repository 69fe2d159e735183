use std::collections::HashMap;

use anyhow::{Result, anyhow};
use arena_core::domain::{
    Contest, ContestId, LeaderboardEntry, LeaderboardSnapshot, NewSubmission, ProblemId,
    Submission, SubmissionId, UserId, standings_order,
};
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ContestStore, LeaderboardStore, ProblemCatalog, ProblemSpec, SubmissionStore};

/// 进程内存储，实现全部存储接口。
#[derive(Default)]
pub struct InMemoryStore {
    problems: RwLock<HashMap<ProblemId, ProblemSpec>>,
    submissions: RwLock<HashMap<SubmissionId, Submission>>,
    contests: RwLock<HashMap<ContestId, Contest>>,
    entries: RwLock<HashMap<(ContestId, UserId), LeaderboardEntry>>,
    snapshots: RwLock<HashMap<ContestId, LeaderboardSnapshot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_problem(&self, problem: ProblemSpec) {
        self.problems.write().await.insert(problem.id, problem);
    }

    pub async fn add_contest(&self, contest: Contest) {
        self.contests.write().await.insert(contest.id, contest);
    }

    pub async fn submission_count(&self) -> usize {
        self.submissions.read().await.len()
    }
}

fn chronological(mut submissions: Vec<Submission>) -> Vec<Submission> {
    submissions.sort_by_key(|submission| submission.created_at);
    submissions
}

#[async_trait]
impl ProblemCatalog for InMemoryStore {
    async fn find_problem(&self, problem_id: ProblemId) -> Result<Option<ProblemSpec>> {
        Ok(self.problems.read().await.get(&problem_id).cloned())
    }
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn insert(&self, submission: &Submission) -> Result<()> {
        let mut submissions = self.submissions.write().await;
        if submissions.contains_key(&submission.id) {
            return Err(anyhow!("submission {} already exists", submission.id));
        }
        submissions.insert(submission.id, submission.clone());
        Ok(())
    }

    async fn save(&self, submission: &Submission) -> Result<()> {
        let mut submissions = self.submissions.write().await;
        let stored = submissions
            .get_mut(&submission.id)
            .ok_or_else(|| anyhow!("submission {} does not exist", submission.id))?;
        *stored = submission.clone();
        Ok(())
    }

    async fn find_submission(&self, submission_id: SubmissionId) -> Result<Option<Submission>> {
        Ok(self.submissions.read().await.get(&submission_id).cloned())
    }

    async fn find_identical(&self, new_submission: &NewSubmission) -> Result<Option<SubmissionId>> {
        let submissions = self.submissions.read().await;
        Ok(submissions
            .values()
            .find(|submission| {
                !submission.rejudged
                    && submission.problem_id == new_submission.problem_id
                    && submission.user_id == new_submission.user_id
                    && submission.language == new_submission.language
                    && submission.source_code == new_submission.source_code
            })
            .map(|submission| submission.id))
    }

    async fn list_pending(&self) -> Result<Vec<Submission>> {
        let submissions = self.submissions.read().await;
        Ok(chronological(
            submissions
                .values()
                .filter(|submission| submission.is_pending())
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_contest(&self, contest_id: ContestId) -> Result<Vec<Submission>> {
        let submissions = self.submissions.read().await;
        Ok(chronological(
            submissions
                .values()
                .filter(|submission| submission.contest_id == Some(contest_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_contest_user(
        &self,
        contest_id: ContestId,
        user_id: UserId,
    ) -> Result<Vec<Submission>> {
        let submissions = self.submissions.read().await;
        Ok(chronological(
            submissions
                .values()
                .filter(|submission| {
                    submission.contest_id == Some(contest_id) && submission.user_id == user_id
                })
                .cloned()
                .collect(),
        ))
    }
}

#[async_trait]
impl ContestStore for InMemoryStore {
    async fn find_contest(&self, contest_id: ContestId) -> Result<Option<Contest>> {
        Ok(self.contests.read().await.get(&contest_id).cloned())
    }

    async fn mark_results_published(&self, contest_id: ContestId) -> Result<()> {
        let mut contests = self.contests.write().await;
        let contest = contests
            .get_mut(&contest_id)
            .ok_or_else(|| anyhow!("contest {contest_id} does not exist"))?;
        contest.results_published = true;
        Ok(())
    }
}

#[async_trait]
impl LeaderboardStore for InMemoryStore {
    async fn upsert(&self, entry: &LeaderboardEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        let key = (entry.contest_id, entry.user_id);
        let rank = entries.get(&key).map_or(0, |existing| existing.rank);
        entries.insert(
            key,
            LeaderboardEntry {
                rank,
                ..entry.clone()
            },
        );
        Ok(())
    }

    async fn list(&self, contest_id: ContestId) -> Result<Vec<LeaderboardEntry>> {
        let entries = self.entries.read().await;
        let mut listed: Vec<LeaderboardEntry> = entries
            .values()
            .filter(|entry| entry.contest_id == contest_id)
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| standings_order(a, b)));
        Ok(listed)
    }

    async fn save_ranks(&self, contest_id: ContestId, ranked: &[LeaderboardEntry]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for entry in ranked {
            if let Some(stored) = entries.get_mut(&(contest_id, entry.user_id)) {
                stored.rank = entry.rank;
            }
        }
        Ok(())
    }

    async fn snapshot(&self, contest_id: ContestId) -> Result<Option<LeaderboardSnapshot>> {
        Ok(self.snapshots.read().await.get(&contest_id).cloned())
    }

    async fn store_snapshot(&self, snapshot: &LeaderboardSnapshot) -> Result<()> {
        self.snapshots
            .write()
            .await
            .insert(snapshot.contest_id, snapshot.clone());
        Ok(())
    }

    async fn clear_snapshot(&self, contest_id: ContestId) -> Result<()> {
        self.snapshots.write().await.remove(&contest_id);
        Ok(())
    }
}
