pub mod contest;
pub mod contest_leaderboard;
pub mod leaderboard_snapshot;
pub mod problem;
pub mod submission;
pub mod testcase;
