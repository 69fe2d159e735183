use crate::entity::{contest_leaderboard, leaderboard_snapshot};
use anyhow::{Result, anyhow};
use arena_core::domain::{
    ContestId, LeaderboardEntry, LeaderboardSnapshot, ProblemId, ProblemResult, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use judge_orchestrator::LeaderboardStore;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProblemResult {
    problem_id: String,
    score: u32,
    attempts: u32,
    solved_at: Option<DateTime<Utc>>,
    penalty_time: f64,
}

/// Snapshot rows keep whole entries so a frozen board can be served as-is.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    user_id: String,
    score: u32,
    penalty: i64,
    rank: u32,
    problems_solved: Vec<StoredProblemResult>,
    last_submission_time: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct SeaOrmLeaderboardRepository {
    db: DatabaseConnection,
}

impl SeaOrmLeaderboardRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn store_problems(problems: &[ProblemResult]) -> Vec<StoredProblemResult> {
        problems
            .iter()
            .map(|problem| StoredProblemResult {
                problem_id: problem.problem_id.to_string(),
                score: problem.score,
                attempts: problem.attempts,
                solved_at: problem.solved_at,
                penalty_time: problem.penalty_time,
            })
            .collect()
    }

    fn restore_problems(stored: Vec<StoredProblemResult>) -> Result<Vec<ProblemResult>> {
        stored
            .into_iter()
            .map(|problem| {
                Ok(ProblemResult {
                    problem_id: ProblemId::from_str(&problem.problem_id).map_err(|e| {
                        anyhow!("invalid problem id '{}' in leaderboard: {e}", problem.problem_id)
                    })?,
                    score: problem.score,
                    attempts: problem.attempts,
                    solved_at: problem.solved_at,
                    penalty_time: problem.penalty_time,
                })
            })
            .collect()
    }

    fn map_model(model: contest_leaderboard::Model) -> Result<LeaderboardEntry> {
        let contest_id = ContestId::from_str(&model.contest_id).map_err(|e| {
            anyhow!(
                "invalid contest_leaderboard.contest_id '{}' from database: {e}",
                model.contest_id
            )
        })?;
        let user_id = UserId::from_str(&model.user_id).map_err(|e| {
            anyhow!(
                "invalid contest_leaderboard.user_id '{}' from database: {e}",
                model.user_id
            )
        })?;
        let problems: Vec<StoredProblemResult> = serde_json::from_str(&model.problems_solved)
            .map_err(|e| anyhow!("invalid contest_leaderboard.problems_solved from database: {e}"))?;

        Ok(LeaderboardEntry {
            contest_id,
            user_id,
            score: u32::try_from(model.score)?,
            penalty: model.penalty,
            rank: u32::try_from(model.rank)?,
            problems_solved: Self::restore_problems(problems)?,
            last_submission_time: model.last_submission_time.map(|time| time.and_utc()),
        })
    }

    fn encode_entries(entries: &[LeaderboardEntry]) -> Result<String> {
        let stored: Vec<StoredEntry> = entries
            .iter()
            .map(|entry| StoredEntry {
                user_id: entry.user_id.to_string(),
                score: entry.score,
                penalty: entry.penalty,
                rank: entry.rank,
                problems_solved: Self::store_problems(&entry.problems_solved),
                last_submission_time: entry.last_submission_time,
            })
            .collect();
        Ok(serde_json::to_string(&stored)?)
    }

    fn decode_entries(contest_id: ContestId, raw: &str) -> Result<Vec<LeaderboardEntry>> {
        let stored: Vec<StoredEntry> = serde_json::from_str(raw)
            .map_err(|e| anyhow!("invalid leaderboard_snapshot.entries from database: {e}"))?;
        stored
            .into_iter()
            .map(|entry| {
                Ok(LeaderboardEntry {
                    contest_id,
                    user_id: UserId::from_str(&entry.user_id).map_err(|e| {
                        anyhow!("invalid user id '{}' in snapshot: {e}", entry.user_id)
                    })?,
                    score: entry.score,
                    penalty: entry.penalty,
                    rank: entry.rank,
                    problems_solved: Self::restore_problems(entry.problems_solved)?,
                    last_submission_time: entry.last_submission_time,
                })
            })
            .collect()
    }
}

#[async_trait]
impl LeaderboardStore for SeaOrmLeaderboardRepository {
    async fn upsert(&self, entry: &LeaderboardEntry) -> Result<()> {
        let problems_solved =
            serde_json::to_string(&Self::store_problems(&entry.problems_solved))?;
        let score = i32::try_from(entry.score)?;
        let last_submission_time = entry.last_submission_time.map(|time| time.naive_utc());
        let now = Utc::now().naive_utc();

        let existing = contest_leaderboard::Entity::find()
            .filter(contest_leaderboard::Column::ContestId.eq(entry.contest_id.to_string()))
            .filter(contest_leaderboard::Column::UserId.eq(entry.user_id.to_string()))
            .one(&self.db)
            .await?;

        match existing {
            Some(model) => {
                let mut active_model: contest_leaderboard::ActiveModel = model.into();
                active_model.score = Set(score);
                active_model.penalty = Set(entry.penalty);
                active_model.problems_solved = Set(problems_solved);
                active_model.last_submission_time = Set(last_submission_time);
                active_model.updated_at = Set(now);
                active_model.update(&self.db).await?;
            }
            None => {
                contest_leaderboard::ActiveModel {
                    id: Set(Uuid::new_v4().to_string()),
                    contest_id: Set(entry.contest_id.to_string()),
                    user_id: Set(entry.user_id.to_string()),
                    score: Set(score),
                    penalty: Set(entry.penalty),
                    rank: Set(0),
                    problems_solved: Set(problems_solved),
                    last_submission_time: Set(last_submission_time),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await?;
            }
        }
        Ok(())
    }

    async fn list(&self, contest_id: ContestId) -> Result<Vec<LeaderboardEntry>> {
        let models = contest_leaderboard::Entity::find()
            .filter(contest_leaderboard::Column::ContestId.eq(contest_id.to_string()))
            .order_by_asc(contest_leaderboard::Column::Rank)
            .order_by_asc(contest_leaderboard::Column::LastSubmissionTime)
            .order_by_asc(contest_leaderboard::Column::UserId)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_model).collect()
    }

    async fn save_ranks(&self, contest_id: ContestId, entries: &[LeaderboardEntry]) -> Result<()> {
        let txn = self.db.begin().await?;
        for entry in entries {
            contest_leaderboard::Entity::update_many()
                .col_expr(
                    contest_leaderboard::Column::Rank,
                    Expr::value(i32::try_from(entry.rank)?),
                )
                .filter(contest_leaderboard::Column::ContestId.eq(contest_id.to_string()))
                .filter(contest_leaderboard::Column::UserId.eq(entry.user_id.to_string()))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn snapshot(&self, contest_id: ContestId) -> Result<Option<LeaderboardSnapshot>> {
        let Some(model) = leaderboard_snapshot::Entity::find_by_id(contest_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(LeaderboardSnapshot {
            contest_id,
            taken_at: model.taken_at.and_utc(),
            entries: Self::decode_entries(contest_id, &model.entries)?,
        }))
    }

    async fn store_snapshot(&self, snapshot: &LeaderboardSnapshot) -> Result<()> {
        let active_model = leaderboard_snapshot::ActiveModel {
            contest_id: Set(snapshot.contest_id.to_string()),
            taken_at: Set(snapshot.taken_at.naive_utc()),
            entries: Set(Self::encode_entries(&snapshot.entries)?),
        };

        leaderboard_snapshot::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(leaderboard_snapshot::Column::ContestId)
                    .update_columns([
                        leaderboard_snapshot::Column::TakenAt,
                        leaderboard_snapshot::Column::Entries,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn clear_snapshot(&self, contest_id: ContestId) -> Result<()> {
        leaderboard_snapshot::Entity::delete_by_id(contest_id.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn snapshot_entries_survive_storage() {
        let contest_id = ContestId::new();
        let solved_at = Utc.with_ymd_and_hms(2026, 6, 1, 13, 0, 0).unwrap();
        let entries = vec![LeaderboardEntry {
            contest_id,
            user_id: UserId::new(),
            score: 1,
            penalty: 60,
            rank: 1,
            problems_solved: vec![ProblemResult {
                problem_id: ProblemId::new(),
                score: 1,
                attempts: 1,
                solved_at: Some(solved_at),
                penalty_time: 60.0,
            }],
            last_submission_time: Some(solved_at),
        }];

        let raw = SeaOrmLeaderboardRepository::encode_entries(&entries)
            .expect("entries should encode");
        let decoded = SeaOrmLeaderboardRepository::decode_entries(contest_id, &raw)
            .expect("entries should decode");
        assert_eq!(decoded, entries);
    }

    #[test]
    fn corrupt_snapshot_is_reported() {
        let err = SeaOrmLeaderboardRepository::decode_entries(ContestId::new(), "{not json")
            .expect_err("corrupt snapshot should fail");
        assert!(err.to_string().contains("leaderboard_snapshot.entries"));
    }
}
