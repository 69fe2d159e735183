use crate::entity::{problem, testcase};
use anyhow::{Result, anyhow};
use arena_core::domain::{ProblemId, TestcaseId};
use async_trait::async_trait;
use judge_orchestrator::{ProblemCatalog, ProblemSpec, TestcaseSpec};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::str::FromStr;

#[derive(Clone)]
pub struct SeaOrmProblemRepository {
    db: DatabaseConnection,
}

impl SeaOrmProblemRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn map_model(model: problem::Model, testcases: Vec<testcase::Model>) -> Result<ProblemSpec> {
        let id = ProblemId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid problem.id '{}' from database: {e}", model.id))?;
        let time_limit_ms = u64::try_from(model.time_limit_ms).map_err(|_| {
            anyhow!(
                "invalid problem.time_limit_ms from database: {} (must be non-negative)",
                model.time_limit_ms
            )
        })?;
        let memory_limit_kb = u64::try_from(model.memory_limit_kb).map_err(|_| {
            anyhow!(
                "invalid problem.memory_limit_kb from database: {} (must be non-negative)",
                model.memory_limit_kb
            )
        })?;

        Ok(ProblemSpec {
            id,
            time_limit_ms,
            memory_limit_kb,
            testcases: testcases
                .into_iter()
                .map(Self::map_testcase)
                .collect::<Result<_>>()?,
        })
    }

    fn map_testcase(model: testcase::Model) -> Result<TestcaseSpec> {
        let id = TestcaseId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid testcase.id '{}' from database: {e}", model.id))?;
        Ok(TestcaseSpec {
            id,
            input: model.input,
            expected_output: model.expected_output,
        })
    }
}

#[async_trait]
impl ProblemCatalog for SeaOrmProblemRepository {
    async fn find_problem(&self, problem_id: ProblemId) -> Result<Option<ProblemSpec>> {
        let Some(model) = problem::Entity::find_by_id(problem_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let testcases = testcase::Entity::find()
            .filter(testcase::Column::ProblemId.eq(model.id.clone()))
            .order_by_asc(testcase::Column::Position)
            .all(&self.db)
            .await?;

        Self::map_model(model, testcases).map(Some)
    }
}
