//! 存储协作方接口。
//!
//! 编排器只依赖这些 trait；服务端用 sea-orm 实现，测试使用内存实现。

use anyhow::Result;
use arena_core::domain::{
    Contest, ContestId, LeaderboardEntry, LeaderboardSnapshot, NewSubmission, ProblemId,
    Submission, SubmissionId, TestcaseId, UserId,
};
use async_trait::async_trait;

pub mod memory;

pub use memory::InMemoryStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestcaseSpec {
    pub id: TestcaseId,
    /// 原样转发给评测服务的输入。
    pub input: String,
    pub expected_output: String,
}

/// 评测所需的题目信息，测试点按声明顺序排列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemSpec {
    pub id: ProblemId,
    pub time_limit_ms: u64,
    pub memory_limit_kb: u64,
    pub testcases: Vec<TestcaseSpec>,
}

#[async_trait]
pub trait ProblemCatalog: Send + Sync {
    async fn find_problem(&self, problem_id: ProblemId) -> Result<Option<ProblemSpec>>;
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn insert(&self, submission: &Submission) -> Result<()>;
    async fn save(&self, submission: &Submission) -> Result<()>;
    async fn find_submission(&self, submission_id: SubmissionId) -> Result<Option<Submission>>;
    /// 查找内容完全相同且未被重测替代的提交。
    async fn find_identical(&self, new_submission: &NewSubmission) -> Result<Option<SubmissionId>>;
    async fn list_pending(&self) -> Result<Vec<Submission>>;
    async fn list_for_contest(&self, contest_id: ContestId) -> Result<Vec<Submission>>;
    async fn list_for_contest_user(
        &self,
        contest_id: ContestId,
        user_id: UserId,
    ) -> Result<Vec<Submission>>;
}

#[async_trait]
pub trait ContestStore: Send + Sync {
    async fn find_contest(&self, contest_id: ContestId) -> Result<Option<Contest>>;
    async fn mark_results_published(&self, contest_id: ContestId) -> Result<()>;
}

#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// 按 (contest, user) 插入或整体替换排行榜条目。
    async fn upsert(&self, entry: &LeaderboardEntry) -> Result<()>;
    async fn list(&self, contest_id: ContestId) -> Result<Vec<LeaderboardEntry>>;
    async fn save_ranks(&self, contest_id: ContestId, entries: &[LeaderboardEntry]) -> Result<()>;
    async fn snapshot(&self, contest_id: ContestId) -> Result<Option<LeaderboardSnapshot>>;
    async fn store_snapshot(&self, snapshot: &LeaderboardSnapshot) -> Result<()>;
    async fn clear_snapshot(&self, contest_id: ContestId) -> Result<()>;
}
