use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arena_core::domain::{
    Contest, ContestId, ContestStatus, LeaderboardEntry, LeaderboardSnapshot, Submission, UserId,
    assign_ranks, standings_order,
};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::store::{ContestStore, LeaderboardStore, SubmissionStore};
use crate::{EventBroadcaster, JudgeError, JudgeEvent, Result};

/// 对外展示的排行榜。
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardView {
    pub contest_id: ContestId,
    pub status: ContestStatus,
    pub is_frozen: bool,
    pub results_published: bool,
    /// 冻结期间返回快照时，快照的生成时间。
    pub snapshot_taken_at: Option<DateTime<Utc>>,
    pub entries: Vec<LeaderboardEntry>,
}

/// 比赛排行榜维护服务。
///
/// 同一比赛的所有写操作串行执行，不同比赛互不阻塞。
pub struct LeaderboardService {
    contests: Arc<dyn ContestStore>,
    submissions: Arc<dyn SubmissionStore>,
    entries: Arc<dyn LeaderboardStore>,
    event_broadcaster: Arc<EventBroadcaster>,
    locks: Mutex<HashMap<ContestId, Arc<Mutex<()>>>>,
}

impl LeaderboardService {
    pub fn new(
        contests: Arc<dyn ContestStore>,
        submissions: Arc<dyn SubmissionStore>,
        entries: Arc<dyn LeaderboardStore>,
        event_broadcaster: Arc<EventBroadcaster>,
    ) -> Self {
        Self {
            contests,
            submissions,
            entries,
            event_broadcaster,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 提交得出最终结论后刷新该选手的成绩并重新排名。
    ///
    /// 不属于任何比赛的提交直接忽略。
    #[tracing::instrument(skip(self, submission), fields(submission_id = %submission.id))]
    pub async fn record_verdict(&self, submission: &Submission, now: DateTime<Utc>) -> Result<()> {
        let Some(contest_id) = submission.contest_id else {
            return Ok(());
        };

        let lock = self.contest_lock(contest_id).await;
        let _guard = lock.lock().await;

        let contest = self.load_contest(contest_id).await?;
        self.snapshot_if_frozen(&contest, now).await?;
        self.refresh_entry(&contest, submission.user_id).await?;
        self.rerank(contest_id).await?;

        self.event_broadcaster
            .emit(JudgeEvent::LeaderboardUpdated { contest_id });
        Ok(())
    }

    /// 按当前成绩重新排名。
    pub async fn recalculate_ranks(&self, contest_id: ContestId) -> Result<Vec<LeaderboardEntry>> {
        let lock = self.contest_lock(contest_id).await;
        let _guard = lock.lock().await;
        self.rerank(contest_id).await
    }

    /// 从全部提交重新计算整个比赛的排行榜。
    #[tracing::instrument(skip(self))]
    pub async fn recompute_contest(
        &self,
        contest_id: ContestId,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let lock = self.contest_lock(contest_id).await;
        let _guard = lock.lock().await;

        let contest = self.load_contest(contest_id).await?;
        self.snapshot_if_frozen(&contest, now).await?;
        let ranked = self.rebuild(&contest).await?;

        self.event_broadcaster
            .emit(JudgeEvent::LeaderboardUpdated { contest_id });
        Ok(ranked)
    }

    /// 逐个重算比赛排行榜，单个比赛失败只记录日志，返回成功的数量。
    pub async fn recompute_all(&self, contest_ids: &[ContestId], now: DateTime<Utc>) -> usize {
        let mut recomputed = 0;
        for &contest_id in contest_ids {
            match self.recompute_contest(contest_id, now).await {
                Ok(_) => recomputed += 1,
                Err(err) => {
                    error!(contest_id = %contest_id, error = %err, "failed to recompute leaderboard");
                }
            }
        }
        recomputed
    }

    /// 公布比赛结果：最终重算一次并解除冻结。仅在比赛结束后允许。
    #[tracing::instrument(skip(self))]
    pub async fn publish_results(
        &self,
        contest_id: ContestId,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let lock = self.contest_lock(contest_id).await;
        let _guard = lock.lock().await;

        let contest = self.load_contest(contest_id).await?;
        let status = contest.status(now);
        if status != ContestStatus::Ended {
            return Err(JudgeError::Validation(format!(
                "比赛 {contest_id} 尚未结束（当前状态 {status}），不能公布结果"
            )));
        }

        let ranked = self.rebuild(&contest).await?;
        self.entries.clear_snapshot(contest_id).await?;
        self.contests.mark_results_published(contest_id).await?;

        info!(contest_id = %contest_id, entries = ranked.len(), "contest results published");
        self.event_broadcaster
            .emit(JudgeEvent::LeaderboardUpdated { contest_id });
        Ok(ranked)
    }

    /// 查询排行榜。冻结期间返回冻结时的快照（没有快照时返回实时数据）。
    pub async fn standings(&self, contest_id: ContestId, now: DateTime<Utc>) -> Result<LeaderboardView> {
        let contest = self.load_contest(contest_id).await?;
        let is_frozen = contest.is_frozen(now) && !contest.results_published;

        let snapshot = if is_frozen {
            self.entries.snapshot(contest_id).await?
        } else {
            None
        };
        let (snapshot_taken_at, mut entries) = match snapshot {
            Some(snapshot) => (Some(snapshot.taken_at), snapshot.entries),
            None => (None, self.entries.list(contest_id).await?),
        };
        sort_by_rank(&mut entries);

        Ok(LeaderboardView {
            contest_id,
            status: contest.status(now),
            is_frozen,
            results_published: contest.results_published,
            snapshot_taken_at,
            entries,
        })
    }

    async fn contest_lock(&self, contest_id: ContestId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(contest_id).or_default().clone()
    }

    async fn load_contest(&self, contest_id: ContestId) -> Result<Contest> {
        self.contests
            .find_contest(contest_id)
            .await?
            .ok_or_else(|| JudgeError::NotFound(format!("比赛 {contest_id}")))
    }

    async fn snapshot_if_frozen(&self, contest: &Contest, now: DateTime<Utc>) -> Result<()> {
        if !contest.is_frozen(now) || contest.results_published {
            return Ok(());
        }
        if self.entries.snapshot(contest.id).await?.is_some() {
            return Ok(());
        }

        let mut entries = self.entries.list(contest.id).await?;
        sort_by_rank(&mut entries);
        info!(contest_id = %contest.id, entries = entries.len(), "leaderboard frozen");
        self.entries
            .store_snapshot(&LeaderboardSnapshot {
                contest_id: contest.id,
                taken_at: now,
                entries,
            })
            .await?;
        Ok(())
    }

    async fn refresh_entry(&self, contest: &Contest, user_id: UserId) -> Result<()> {
        let submissions = self
            .submissions
            .list_for_contest_user(contest.id, user_id)
            .await?;
        self.upsert_standing(contest, user_id, &submissions).await
    }

    async fn upsert_standing(
        &self,
        contest: &Contest,
        user_id: UserId,
        submissions: &[Submission],
    ) -> Result<()> {
        let standing = contest
            .scoring_rule
            .standing(submissions, contest.start_time);
        let last_submission_time = submissions
            .iter()
            .filter(|submission| submission.is_scored())
            .map(|submission| submission.created_at)
            .max();
        let entry = LeaderboardEntry::from_standing(
            contest.id,
            user_id,
            standing,
            last_submission_time,
        );
        self.entries.upsert(&entry).await?;
        Ok(())
    }

    async fn rebuild(&self, contest: &Contest) -> Result<Vec<LeaderboardEntry>> {
        let submissions = self.submissions.list_for_contest(contest.id).await?;

        let mut seen = HashSet::new();
        let users: Vec<UserId> = submissions
            .iter()
            .map(|submission| submission.user_id)
            .filter(|user_id| seen.insert(*user_id))
            .collect();

        for user_id in users {
            let own: Vec<Submission> = submissions
                .iter()
                .filter(|submission| submission.user_id == user_id)
                .cloned()
                .collect();
            self.upsert_standing(contest, user_id, &own).await?;
        }

        self.rerank(contest.id).await
    }

    async fn rerank(&self, contest_id: ContestId) -> Result<Vec<LeaderboardEntry>> {
        let mut entries = self.entries.list(contest_id).await?;
        assign_ranks(&mut entries);
        self.entries.save_ranks(contest_id, &entries).await?;
        Ok(entries)
    }
}

fn sort_by_rank(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| standings_order(a, b)));
}

#[cfg(test)]
mod tests {
    use arena_core::domain::{
        FreezeWindow, Language, NewSubmission, ProblemId, RunToken, ScoringRule, StoredJudgement,
        SubmissionId, TestcaseResult, Verdict,
    };
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::store::InMemoryStore;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
    }

    fn contest(freeze: Option<FreezeWindow>) -> Contest {
        Contest {
            id: ContestId::new(),
            title: "spring round".to_string(),
            registration_start: start() - Duration::days(1),
            start_time: start(),
            end_time: start() + Duration::hours(5),
            scoring_rule: ScoringRule::Icpc,
            freeze,
            results_published: false,
        }
    }

    fn judged(
        contest_id: ContestId,
        user_id: UserId,
        problem_id: ProblemId,
        verdict: Verdict,
        minute: i64,
    ) -> Submission {
        let created_at = start() + Duration::minutes(minute);
        Submission::restore(
            SubmissionId::new(),
            NewSubmission {
                problem_id,
                contest_id: Some(contest_id),
                user_id,
                language: Language::Cpp,
                source_code: format!("// {minute}"),
            },
            StoredJudgement {
                final_verdict: verdict,
                testcase_results: vec![TestcaseResult {
                    token: RunToken::new(format!("tok-{minute}")),
                    verdict,
                    execution_time: Some(0.1),
                    memory_used: Some(1024),
                }],
                execution_time: None,
                memory_used: None,
            },
            true,
            false,
            created_at,
            created_at,
        )
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: LeaderboardService,
        events: Arc<EventBroadcaster>,
    }

    async fn fixture(contest: &Contest) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        store.add_contest(contest.clone()).await;
        let events = Arc::new(EventBroadcaster::new(16));
        let service =
            LeaderboardService::new(store.clone(), store.clone(), store.clone(), events.clone());
        Fixture {
            store,
            service,
            events,
        }
    }

    async fn record(fixture: &Fixture, submission: &Submission, now: DateTime<Utc>) {
        fixture
            .store
            .insert(submission)
            .await
            .expect("submission should be stored");
        fixture
            .service
            .record_verdict(submission, now)
            .await
            .expect("verdict should be recorded");
    }

    #[tokio::test]
    async fn test_record_verdict_ranks_by_score_then_penalty() {
        let contest = contest(None);
        let fixture = fixture(&contest).await;
        let mut events = fixture.events.subscribe();
        let (alice, bob) = (UserId::new(), UserId::new());
        let problem = ProblemId::new();
        let now = start() + Duration::hours(1);

        record(&fixture, &judged(contest.id, alice, problem, Verdict::Accepted, 40), now).await;
        record(&fixture, &judged(contest.id, bob, problem, Verdict::WrongAnswer, 5), now).await;
        record(&fixture, &judged(contest.id, bob, problem, Verdict::Accepted, 10), now).await;

        let view = fixture
            .service
            .standings(contest.id, now)
            .await
            .expect("standings should load");
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].user_id, bob);
        assert_eq!(view.entries[0].penalty, 30);
        assert_eq!(view.entries[0].rank, 1);
        assert_eq!(view.entries[1].user_id, alice);
        assert_eq!(view.entries[1].rank, 2);

        let event = events.recv().await.expect("event should be broadcast");
        assert_eq!(event, JudgeEvent::LeaderboardUpdated { contest_id: contest.id });
    }

    #[tokio::test]
    async fn test_tied_entries_follow_last_submission_time() {
        let contest = contest(None);
        let fixture = fixture(&contest).await;
        let (solved, unsolved) = (ProblemId::new(), ProblemId::new());
        let now = start() + Duration::hours(1);

        let users: Vec<UserId> = (0..8).map(|_| UserId::new()).collect();
        for &index in &[7usize, 4, 3, 1, 2, 5, 0, 6] {
            let user = users[index];
            record(&fixture, &judged(contest.id, user, solved, Verdict::Accepted, 10), now).await;
            let late = 20 + index as i64;
            record(&fixture, &judged(contest.id, user, unsolved, Verdict::WrongAnswer, late), now)
                .await;
        }

        let view = fixture
            .service
            .standings(contest.id, now)
            .await
            .expect("standings should load");
        assert!(view.entries.iter().all(|entry| entry.rank == 1));
        assert!(view.entries.iter().all(|entry| (entry.score, entry.penalty) == (1, 10)));
        let order: Vec<UserId> = view.entries.iter().map(|entry| entry.user_id).collect();
        assert_eq!(order, users);
    }

    #[tokio::test]
    async fn test_submission_outside_contest_is_ignored() {
        let contest = contest(None);
        let fixture = fixture(&contest).await;
        let mut submission = judged(
            contest.id,
            UserId::new(),
            ProblemId::new(),
            Verdict::Accepted,
            1,
        );
        submission.contest_id = None;

        fixture
            .service
            .record_verdict(&submission, start())
            .await
            .expect("practice submission should be ignored");
        let view = fixture
            .service
            .standings(contest.id, start())
            .await
            .expect("standings should load");
        assert!(view.entries.is_empty());
    }

    #[tokio::test]
    async fn test_frozen_standings_serve_snapshot() {
        let freeze = FreezeWindow::new(start() + Duration::hours(4), start() + Duration::hours(5))
            .expect("freeze window should be valid");
        let contest = contest(Some(freeze));
        let fixture = fixture(&contest).await;
        let (alice, bob) = (UserId::new(), UserId::new());
        let problem = ProblemId::new();

        let before = start() + Duration::hours(1);
        record(&fixture, &judged(contest.id, alice, problem, Verdict::Accepted, 30), before).await;

        let during = start() + Duration::hours(4) + Duration::minutes(10);
        record(&fixture, &judged(contest.id, bob, problem, Verdict::Accepted, 250), during).await;

        let frozen = fixture
            .service
            .standings(contest.id, during)
            .await
            .expect("standings should load");
        assert!(frozen.is_frozen);
        assert_eq!(frozen.snapshot_taken_at, Some(during));
        assert_eq!(frozen.entries.len(), 1);
        assert_eq!(frozen.entries[0].user_id, alice);

        let after = start() + Duration::hours(6);
        let live = fixture
            .service
            .standings(contest.id, after)
            .await
            .expect("standings should load");
        assert!(!live.is_frozen);
        assert_eq!(live.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_publish_results_requires_ended_contest() {
        let contest = contest(None);
        let fixture = fixture(&contest).await;

        let err = fixture
            .service
            .publish_results(contest.id, start() + Duration::hours(1))
            .await
            .expect_err("ongoing contest cannot publish");
        match err {
            JudgeError::Validation(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish_results_lifts_freeze() {
        let freeze = FreezeWindow::new(start() + Duration::hours(4), start() + Duration::hours(8))
            .expect("freeze window should be valid");
        let contest = contest(Some(freeze));
        let fixture = fixture(&contest).await;
        let user = UserId::new();
        let problem = ProblemId::new();

        let during = start() + Duration::hours(4) + Duration::minutes(30);
        record(&fixture, &judged(contest.id, user, problem, Verdict::Accepted, 270), during).await;

        let after = start() + Duration::hours(6);
        let frozen = fixture
            .service
            .standings(contest.id, after)
            .await
            .expect("standings should load");
        assert!(frozen.is_frozen);
        assert!(frozen.entries.is_empty());

        let ranked = fixture
            .service
            .publish_results(contest.id, after)
            .await
            .expect("results should publish");
        assert_eq!(ranked.len(), 1);

        let view = fixture
            .service
            .standings(contest.id, after)
            .await
            .expect("standings should load");
        assert!(view.results_published);
        assert!(!view.is_frozen);
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].score, 1);
    }

    #[tokio::test]
    async fn test_recompute_all_skips_missing_contest() {
        let contest = contest(None);
        let fixture = fixture(&contest).await;
        let user = UserId::new();
        fixture
            .store
            .insert(&judged(contest.id, user, ProblemId::new(), Verdict::Accepted, 3))
            .await
            .expect("submission should be stored");

        let recomputed = fixture
            .service
            .recompute_all(&[ContestId::new(), contest.id], start() + Duration::hours(1))
            .await;
        assert_eq!(recomputed, 1);

        let ranked = fixture
            .service
            .recalculate_ranks(contest.id)
            .await
            .expect("ranks should recalculate");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].penalty, 3);
    }
}
