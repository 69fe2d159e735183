pub mod contest_repository;
pub mod leaderboard_repository;
pub mod problem_repository;
pub mod submission_repository;

use std::sync::Arc;

use judge_orchestrator::Stores;
use sea_orm::DatabaseConnection;

pub use contest_repository::SeaOrmContestRepository;
pub use leaderboard_repository::SeaOrmLeaderboardRepository;
pub use problem_repository::SeaOrmProblemRepository;
pub use submission_repository::SeaOrmSubmissionRepository;

/// Database-backed stores for the judge service.
pub fn stores(db: DatabaseConnection) -> Stores {
    Stores {
        problems: Arc::new(SeaOrmProblemRepository::new(db.clone())),
        submissions: Arc::new(SeaOrmSubmissionRepository::new(db.clone())),
        contests: Arc::new(SeaOrmContestRepository::new(db.clone())),
        leaderboard: Arc::new(SeaOrmLeaderboardRepository::new(db)),
    }
}
