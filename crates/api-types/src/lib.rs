//! Shared request/response types used by API-facing crates.
//!
//! Timestamps travel as RFC 3339 strings and identifiers as UUID strings, so
//! this crate stays free of domain dependencies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
}

impl HealthCheckResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub problem_id: String,
    #[serde(default)]
    pub contest_id: Option<String>,
    pub user_id: String,
    /// Judge language id (C=103, C++=105, Java=91, Python=100).
    pub language_id: i32,
    pub source_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileCheckRequest {
    pub language_id: i32,
    pub source_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestcaseResultResponse {
    pub token: String,
    pub verdict: String,
    /// Seconds.
    pub execution_time: Option<f64>,
    /// Kilobytes.
    pub memory_used: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: String,
    pub problem_id: String,
    pub contest_id: Option<String>,
    pub user_id: String,
    pub language_id: i32,
    pub language: String,
    pub final_verdict: String,
    pub testcase_results: Vec<TestcaseResultResponse>,
    pub execution_time: Option<f64>,
    pub memory_used: Option<u64>,
    pub is_public: bool,
    pub rejudged: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResultResponse {
    pub problem_id: String,
    pub score: u32,
    pub attempts: u32,
    pub solved_at: Option<String>,
    pub penalty_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryResponse {
    pub rank: u32,
    pub user_id: String,
    pub score: u32,
    pub penalty: i64,
    pub problems_solved: Vec<ProblemResultResponse>,
    pub last_submission_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub contest_id: String,
    pub status: String,
    pub is_frozen: bool,
    pub results_published: bool,
    pub snapshot_taken_at: Option<String>,
    pub entries: Vec<LeaderboardEntryResponse>,
}
