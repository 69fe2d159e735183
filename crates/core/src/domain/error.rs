use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unsupported language id: {0}")]
    UnsupportedLanguage(i32),
    #[error("unknown verdict code: {0}")]
    UnknownVerdict(i16),
    #[error("unknown scoring rule code: {0}")]
    UnknownScoringRule(i16),
    #[error("freeze window starts after it ends")]
    InvalidFreezeWindow,
    #[error("expected {expected} testcase results, got {actual}")]
    TestcaseCountMismatch { expected: usize, actual: usize },
    #[error("final verdict cannot return to PENDING once decided")]
    VerdictRegression,
}
