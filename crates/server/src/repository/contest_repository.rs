use crate::entity::contest;
use anyhow::{Result, anyhow};
use arena_core::domain::{Contest, ContestId, FreezeWindow, ScoringRule};
use async_trait::async_trait;
use judge_orchestrator::ContestStore;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use std::str::FromStr;

#[derive(Clone)]
pub struct SeaOrmContestRepository {
    db: DatabaseConnection,
}

impl SeaOrmContestRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn map_model(model: contest::Model) -> Result<Contest> {
        let id = ContestId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid contest.id '{}' from database: {e}", model.id))?;

        let freeze = match (model.freeze_start, model.freeze_end) {
            (Some(start), Some(end)) => Some(FreezeWindow::new(start.and_utc(), end.and_utc())?),
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "contest {} has only one end of its freeze window",
                    model.id
                ));
            }
        };

        Ok(Contest {
            id,
            title: model.title,
            registration_start: model.registration_start.and_utc(),
            start_time: model.start_time.and_utc(),
            end_time: model.end_time.and_utc(),
            scoring_rule: ScoringRule::from_code(model.scoring_rule)?,
            freeze,
            results_published: model.results_published,
        })
    }
}

#[async_trait]
impl ContestStore for SeaOrmContestRepository {
    async fn find_contest(&self, contest_id: ContestId) -> Result<Option<Contest>> {
        let model = contest::Entity::find_by_id(contest_id.to_string())
            .one(&self.db)
            .await?;

        model.map(Self::map_model).transpose()
    }

    async fn mark_results_published(&self, contest_id: ContestId) -> Result<()> {
        let model = contest::Entity::find_by_id(contest_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow!("contest {contest_id} does not exist"))?;

        let mut active_model: contest::ActiveModel = model.into();
        active_model.results_published = Set(true);
        active_model.update(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn model() -> contest::Model {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap().naive_utc();
        contest::Model {
            id: ContestId::new().to_string(),
            title: "final".to_string(),
            registration_start: start - Duration::days(7),
            start_time: start,
            end_time: start + Duration::hours(5),
            scoring_rule: 1,
            freeze_start: Some(start + Duration::hours(4)),
            freeze_end: Some(start + Duration::hours(5)),
            results_published: false,
        }
    }

    #[test]
    fn map_model_builds_freeze_window() {
        let contest = SeaOrmContestRepository::map_model(model()).expect("contest should map");
        assert_eq!(contest.scoring_rule, ScoringRule::Ioi);
        assert!(contest.freeze.is_some());
    }

    #[test]
    fn map_model_rejects_half_open_freeze() {
        let mut half = model();
        half.freeze_end = None;
        assert!(SeaOrmContestRepository::map_model(half).is_err());

        let mut inverted = model();
        inverted.freeze_start = Some(inverted.end_time + Duration::hours(1));
        assert!(SeaOrmContestRepository::map_model(inverted).is_err());
    }
}
