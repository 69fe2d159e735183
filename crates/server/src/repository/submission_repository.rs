use crate::entity::submission;
use anyhow::{Result, anyhow};
use arena_core::domain::{
    ContestId, Language, NewSubmission, ProblemId, RunToken, StoredJudgement, Submission,
    SubmissionId, TestcaseResult, UserId, Verdict,
};
use async_trait::async_trait;
use judge_orchestrator::SubmissionStore;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Per-testcase result as stored in `submission.testcase_results`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTestcaseResult {
    token: String,
    verdict: i16,
    execution_time: Option<f64>,
    memory_used: Option<u64>,
}

#[derive(Clone)]
pub struct SeaOrmSubmissionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSubmissionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn encode_results(results: &[TestcaseResult]) -> Result<String> {
        let stored: Vec<StoredTestcaseResult> = results
            .iter()
            .map(|result| StoredTestcaseResult {
                token: result.token.as_str().to_string(),
                verdict: result.verdict.code(),
                execution_time: result.execution_time,
                memory_used: result.memory_used,
            })
            .collect();
        Ok(serde_json::to_string(&stored)?)
    }

    fn decode_results(raw: &str) -> Result<Vec<TestcaseResult>> {
        let stored: Vec<StoredTestcaseResult> = serde_json::from_str(raw)
            .map_err(|e| anyhow!("invalid submission.testcase_results from database: {e}"))?;
        stored
            .into_iter()
            .map(|result| {
                Ok(TestcaseResult {
                    token: RunToken::new(result.token),
                    verdict: Verdict::from_code(result.verdict)?,
                    execution_time: result.execution_time,
                    memory_used: result.memory_used,
                })
            })
            .collect()
    }

    fn map_memory(memory_used: Option<i64>) -> Result<Option<u64>> {
        memory_used
            .map(|value| {
                u64::try_from(value).map_err(|_| {
                    anyhow!("invalid submission.memory_used from database: {value} (must be non-negative)")
                })
            })
            .transpose()
    }

    fn map_model(model: submission::Model) -> Result<Submission> {
        let id = SubmissionId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid submission.id '{}' from database: {e}", model.id))?;
        let problem_id = ProblemId::from_str(&model.problem_id).map_err(|e| {
            anyhow!(
                "invalid submission.problem_id '{}' from database: {e}",
                model.problem_id
            )
        })?;
        let contest_id = model
            .contest_id
            .as_deref()
            .map(ContestId::from_str)
            .transpose()
            .map_err(|e| anyhow!("invalid submission.contest_id from database: {e}"))?;
        let user_id = UserId::from_str(&model.user_id).map_err(|e| {
            anyhow!(
                "invalid submission.user_id '{}' from database: {e}",
                model.user_id
            )
        })?;

        Ok(Submission::restore(
            id,
            NewSubmission {
                problem_id,
                contest_id,
                user_id,
                language: Language::from_judge_id(model.language)?,
                source_code: model.source_code,
            },
            StoredJudgement {
                final_verdict: Verdict::from_code(model.final_verdict)?,
                testcase_results: Self::decode_results(&model.testcase_results)?,
                execution_time: model.execution_time,
                memory_used: Self::map_memory(model.memory_used)?,
            },
            model.is_public,
            model.rejudged,
            model.created_at.and_utc(),
            model.updated_at.and_utc(),
        ))
    }

    fn active_model(submission: &Submission) -> Result<submission::ActiveModel> {
        let memory_used = submission
            .memory_used()
            .map(i64::try_from)
            .transpose()?;

        Ok(submission::ActiveModel {
            id: Set(submission.id.to_string()),
            problem_id: Set(submission.problem_id.to_string()),
            contest_id: Set(submission.contest_id.map(|id| id.to_string())),
            user_id: Set(submission.user_id.to_string()),
            language: Set(submission.language.judge_id()),
            source_code: Set(submission.source_code.clone()),
            final_verdict: Set(submission.final_verdict().code()),
            testcase_results: Set(Self::encode_results(submission.testcase_results())?),
            execution_time: Set(submission.execution_time()),
            memory_used: Set(memory_used),
            is_public: Set(submission.is_public),
            rejudged: Set(submission.rejudged),
            created_at: Set(submission.created_at.naive_utc()),
            updated_at: Set(submission.updated_at.naive_utc()),
        })
    }

    async fn list(&self, query: Select<submission::Entity>) -> Result<Vec<Submission>> {
        let models = query
            .order_by_asc(submission::Column::CreatedAt)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_model).collect()
    }
}

#[async_trait]
impl SubmissionStore for SeaOrmSubmissionRepository {
    async fn insert(&self, submission: &Submission) -> Result<()> {
        Self::active_model(submission)?.insert(&self.db).await?;
        Ok(())
    }

    async fn save(&self, submission: &Submission) -> Result<()> {
        Self::active_model(submission)?.update(&self.db).await?;
        Ok(())
    }

    async fn find_submission(&self, submission_id: SubmissionId) -> Result<Option<Submission>> {
        let model = submission::Entity::find_by_id(submission_id.to_string())
            .one(&self.db)
            .await?;

        model.map(Self::map_model).transpose()
    }

    async fn find_identical(&self, new_submission: &NewSubmission) -> Result<Option<SubmissionId>> {
        let model = submission::Entity::find()
            .filter(submission::Column::ProblemId.eq(new_submission.problem_id.to_string()))
            .filter(submission::Column::UserId.eq(new_submission.user_id.to_string()))
            .filter(submission::Column::Language.eq(new_submission.language.judge_id()))
            .filter(submission::Column::SourceCode.eq(new_submission.source_code.clone()))
            .filter(submission::Column::Rejudged.eq(false))
            .one(&self.db)
            .await?;

        model
            .map(|model| {
                SubmissionId::from_str(&model.id)
                    .map_err(|e| anyhow!("invalid submission.id '{}' from database: {e}", model.id))
            })
            .transpose()
    }

    async fn list_pending(&self) -> Result<Vec<Submission>> {
        self.list(
            submission::Entity::find()
                .filter(submission::Column::FinalVerdict.eq(Verdict::Pending.code())),
        )
        .await
    }

    async fn list_for_contest(&self, contest_id: ContestId) -> Result<Vec<Submission>> {
        self.list(
            submission::Entity::find()
                .filter(submission::Column::ContestId.eq(contest_id.to_string())),
        )
        .await
    }

    async fn list_for_contest_user(
        &self,
        contest_id: ContestId,
        user_id: UserId,
    ) -> Result<Vec<Submission>> {
        self.list(
            submission::Entity::find()
                .filter(submission::Column::ContestId.eq(contest_id.to_string()))
                .filter(submission::Column::UserId.eq(user_id.to_string())),
        )
        .await
    }
}
