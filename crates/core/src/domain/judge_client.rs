use async_trait::async_trait;
use thiserror::Error;

use super::{JudgeStatus, Language, RunReport, RunToken};

/// One run queued on the external judge.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub language: Language,
    pub source_code: String,
    /// Seconds.
    pub cpu_time_limit: f64,
    /// Kilobytes.
    pub memory_limit: u64,
    pub stdin: String,
    pub expected_output: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunStatus {
    pub token: RunToken,
    pub status: JudgeStatus,
    pub execution_time: Option<f64>,
    pub memory_used: Option<u64>,
    pub stdout: Option<String>,
    pub compile_output: Option<String>,
}

impl RunStatus {
    pub fn report(&self) -> RunReport {
        RunReport {
            status: self.status,
            execution_time: self.execution_time,
            memory_used: self.memory_used,
            compile_output: self.compile_output.clone(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JudgeClientError {
    #[error("judge unavailable: {0}")]
    Unavailable(String),
    #[error("malformed judge response: {0}")]
    MalformedResponse(String),
    #[error("judge request timed out")]
    Timeout,
}

#[async_trait]
pub trait JudgeClient: Send + Sync {
    /// Queues every request and returns one token per request, in request order.
    async fn create_batch(&self, requests: Vec<RunRequest>) -> Result<Vec<RunToken>, JudgeClientError>;

    /// Fetches the current status of every token, in token order.
    async fn get_batch(&self, tokens: &[RunToken]) -> Result<Vec<RunStatus>, JudgeClientError>;

    async fn create_single(&self, request: RunRequest) -> Result<RunToken, JudgeClientError>;

    async fn get_single(&self, token: &RunToken) -> Result<RunStatus, JudgeClientError>;
}
