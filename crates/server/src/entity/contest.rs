use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contest")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub registration_start: DateTime,
    pub start_time: DateTime,
    pub end_time: DateTime,
    pub scoring_rule: i16,
    pub freeze_start: Option<DateTime>,
    pub freeze_end: Option<DateTime>,
    pub results_published: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::submission::Entity")]
    Submission,
    #[sea_orm(has_many = "super::contest_leaderboard::Entity")]
    ContestLeaderboard,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl Related<super::contest_leaderboard::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContestLeaderboard.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
