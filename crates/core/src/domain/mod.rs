mod aggregate;
mod contest;
mod error;
mod ids;
mod judge_client;
mod language;
mod leaderboard;
mod scoring;
mod submission;
mod verdict;

pub use aggregate::{Judgement, RunReport, TestcaseOutcome, aggregate, compile_outputs_agree};
pub use contest::{Contest, ContestStatus, FreezeWindow, ScoringRule};
pub use error::DomainError;
pub use ids::{ContestId, ProblemId, RunToken, SubmissionId, TestcaseId, UserId};
pub use judge_client::{JudgeClient, JudgeClientError, RunRequest, RunStatus};
pub use language::Language;
pub use leaderboard::{LeaderboardEntry, LeaderboardSnapshot, assign_ranks, standings_order};
pub use scoring::{
    ProblemResult, Standing, WRONG_ATTEMPT_PENALTY_MINUTES, icpc_standing, ioi_standing,
};
pub use submission::{NewSubmission, StoredJudgement, Submission, TestcaseResult};
pub use verdict::{JudgeStatus, Verdict};
