use std::collections::HashMap;
use std::sync::Arc;

use arena_core::domain::{
    JudgeClient, Language, NewSubmission, ProblemId, RunRequest, Submission, UserId,
};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::LimitsConfig;
use crate::store::{ProblemCatalog, ProblemSpec, SubmissionStore};
use crate::{JudgeError, Result};

/// 判定重复提交所依据的内容。
type IdentityKey = (ProblemId, UserId, Language, String);

/// 将提交拆分为每个测试点一次运行，批量交给评测服务。
///
/// 内容相同的提交在查重到写入之间串行执行。
pub struct SubmissionDispatcher {
    client: Arc<dyn JudgeClient>,
    problems: Arc<dyn ProblemCatalog>,
    submissions: Arc<dyn SubmissionStore>,
    limits: LimitsConfig,
    identity_locks: Mutex<HashMap<IdentityKey, Arc<Mutex<()>>>>,
}

impl SubmissionDispatcher {
    pub fn new(
        client: Arc<dyn JudgeClient>,
        problems: Arc<dyn ProblemCatalog>,
        submissions: Arc<dyn SubmissionStore>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            client,
            problems,
            submissions,
            limits,
            identity_locks: Mutex::new(HashMap::new()),
        }
    }

    /// 创建新提交，拒绝与已有提交完全相同的内容。
    #[tracing::instrument(skip(self, new_submission), fields(problem_id = %new_submission.problem_id, user_id = %new_submission.user_id))]
    pub async fn dispatch(&self, new_submission: NewSubmission) -> Result<Submission> {
        let problem = self.load_problem(&new_submission).await?;

        let key: IdentityKey = (
            new_submission.problem_id,
            new_submission.user_id,
            new_submission.language,
            new_submission.source_code.clone(),
        );
        let lock = self.identity_lock(&key).await;
        let result = {
            let _guard = lock.lock().await;
            self.create_unique(&problem, new_submission).await
        };
        self.release_identity_lock(&key, lock).await;
        result
    }

    /// 重测时使用：跳过重复提交检查，沿用原提交的创建时间。
    pub async fn redispatch(
        &self,
        new_submission: NewSubmission,
        created_at: DateTime<Utc>,
    ) -> Result<Submission> {
        let problem = self.load_problem(&new_submission).await?;
        self.create(&problem, new_submission, created_at).await
    }

    /// 每个测试点生成一个运行请求，时间与内存限制按配置截断。
    pub fn build_batch(&self, problem: &ProblemSpec, new_submission: &NewSubmission) -> Vec<RunRequest> {
        let cpu_time_limit = self.limits.cpu_time_limit(problem.time_limit_ms);
        let memory_limit = self.limits.memory_limit(problem.memory_limit_kb);

        problem
            .testcases
            .iter()
            .map(|testcase| RunRequest {
                language: new_submission.language,
                source_code: new_submission.source_code.clone(),
                cpu_time_limit,
                memory_limit,
                stdin: testcase.input.clone(),
                expected_output: testcase.expected_output.clone(),
            })
            .collect()
    }

    async fn create_unique(
        &self,
        problem: &ProblemSpec,
        new_submission: NewSubmission,
    ) -> Result<Submission> {
        if let Some(existing) = self.submissions.find_identical(&new_submission).await? {
            return Err(JudgeError::Conflict(format!(
                "与提交 {existing} 的代码完全相同"
            )));
        }
        self.create(problem, new_submission, Utc::now()).await
    }

    async fn identity_lock(&self, key: &IdentityKey) -> Arc<Mutex<()>> {
        let mut locks = self.identity_locks.lock().await;
        locks.entry(key.clone()).or_default().clone()
    }

    async fn release_identity_lock(&self, key: &IdentityKey, lock: Arc<Mutex<()>>) {
        let mut locks = self.identity_locks.lock().await;
        // 只剩表中和当前这两份引用时，没有其他请求在等待。
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    async fn load_problem(&self, new_submission: &NewSubmission) -> Result<ProblemSpec> {
        let problem = self
            .problems
            .find_problem(new_submission.problem_id)
            .await?
            .ok_or_else(|| JudgeError::NotFound(format!("题目 {}", new_submission.problem_id)))?;

        if problem.testcases.is_empty() {
            return Err(JudgeError::Validation(format!(
                "题目 {} 没有测试点",
                problem.id
            )));
        }
        Ok(problem)
    }

    async fn create(
        &self,
        problem: &ProblemSpec,
        new_submission: NewSubmission,
        created_at: DateTime<Utc>,
    ) -> Result<Submission> {
        let requests = self.build_batch(problem, &new_submission);
        let expected = requests.len();
        let tokens = self.client.create_batch(requests).await?;
        if tokens.len() != expected {
            return Err(JudgeError::ExternalService(format!(
                "评测服务返回了 {} 个 token，期望 {expected} 个",
                tokens.len()
            )));
        }

        let mut submission = Submission::new(new_submission, tokens, Utc::now());
        submission.created_at = created_at;
        self.submissions.insert(&submission).await?;

        info!(
            submission_id = %submission.id,
            testcases = expected,
            language = %submission.language,
            "submission dispatched"
        );
        Ok(submission)
    }
}
