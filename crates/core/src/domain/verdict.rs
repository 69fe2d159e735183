use std::fmt;

use super::DomainError;

/// Outcome of one testcase or of a whole submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pending,
    Accepted,
    WrongAnswer,
    TimeLimitExceed,
    MemoryLimitExceed,
    RuntimeError,
    CompilationError,
    Skipped,
}

impl Verdict {
    pub fn is_pending(self) -> bool {
        self == Verdict::Pending
    }

    pub fn is_terminal(self) -> bool {
        !self.is_pending()
    }

    pub fn is_accepted(self) -> bool {
        self == Verdict::Accepted
    }

    /// Verdicts that cost an ICPC penalty when they precede an accepted run.
    pub fn counts_as_wrong_attempt(self) -> bool {
        matches!(
            self,
            Verdict::WrongAnswer
                | Verdict::TimeLimitExceed
                | Verdict::MemoryLimitExceed
                | Verdict::RuntimeError
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pending => "PENDING",
            Verdict::Accepted => "ACCEPTED",
            Verdict::WrongAnswer => "WRONG_ANSWER",
            Verdict::TimeLimitExceed => "TIME_LIMIT_EXCEED",
            Verdict::MemoryLimitExceed => "MEMORY_LIMIT_EXCEED",
            Verdict::RuntimeError => "RUNTIME_ERROR",
            Verdict::CompilationError => "COMPILATION_ERROR",
            Verdict::Skipped => "SKIPPED",
        }
    }

    /// Compact storage code.
    pub fn code(self) -> i16 {
        match self {
            Verdict::Pending => 0,
            Verdict::Accepted => 1,
            Verdict::WrongAnswer => 2,
            Verdict::TimeLimitExceed => 3,
            Verdict::MemoryLimitExceed => 4,
            Verdict::RuntimeError => 5,
            Verdict::CompilationError => 6,
            Verdict::Skipped => 7,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, DomainError> {
        match code {
            0 => Ok(Verdict::Pending),
            1 => Ok(Verdict::Accepted),
            2 => Ok(Verdict::WrongAnswer),
            3 => Ok(Verdict::TimeLimitExceed),
            4 => Ok(Verdict::MemoryLimitExceed),
            5 => Ok(Verdict::RuntimeError),
            6 => Ok(Verdict::CompilationError),
            7 => Ok(Verdict::Skipped),
            _ => Err(DomainError::UnknownVerdict(code)),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status reported by the external judge for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JudgeStatus {
    InQueue,
    Processing,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    CompilationError,
    Other(u16),
}

impl JudgeStatus {
    pub fn from_id(id: u16) -> Self {
        match id {
            1 => JudgeStatus::InQueue,
            2 => JudgeStatus::Processing,
            3 => JudgeStatus::Accepted,
            4 => JudgeStatus::WrongAnswer,
            5 => JudgeStatus::TimeLimitExceeded,
            6 => JudgeStatus::CompilationError,
            other => JudgeStatus::Other(other),
        }
    }

    pub fn id(self) -> u16 {
        match self {
            JudgeStatus::InQueue => 1,
            JudgeStatus::Processing => 2,
            JudgeStatus::Accepted => 3,
            JudgeStatus::WrongAnswer => 4,
            JudgeStatus::TimeLimitExceeded => 5,
            JudgeStatus::CompilationError => 6,
            JudgeStatus::Other(id) => id,
        }
    }

    pub fn is_in_progress(self) -> bool {
        matches!(self, JudgeStatus::InQueue | JudgeStatus::Processing)
    }

    /// Verdict for a finished run, `None` while the judge is still working on it.
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            JudgeStatus::InQueue | JudgeStatus::Processing => None,
            JudgeStatus::Accepted => Some(Verdict::Accepted),
            JudgeStatus::WrongAnswer => Some(Verdict::WrongAnswer),
            JudgeStatus::TimeLimitExceeded => Some(Verdict::TimeLimitExceed),
            JudgeStatus::CompilationError => Some(Verdict::CompilationError),
            JudgeStatus::Other(_) => Some(Verdict::RuntimeError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_codes_roundtrip() {
        for code in 0..=7 {
            let verdict = Verdict::from_code(code).expect("code should be known");
            assert_eq!(verdict.code(), code);
        }
        assert_eq!(Verdict::from_code(8), Err(DomainError::UnknownVerdict(8)));
    }

    #[test]
    fn only_pending_is_not_terminal() {
        assert!(!Verdict::Pending.is_terminal());
        assert!(Verdict::Skipped.is_terminal());
        assert!(Verdict::CompilationError.is_terminal());
    }

    #[test]
    fn compile_errors_and_skips_are_not_wrong_attempts() {
        assert!(Verdict::WrongAnswer.counts_as_wrong_attempt());
        assert!(Verdict::MemoryLimitExceed.counts_as_wrong_attempt());
        assert!(!Verdict::CompilationError.counts_as_wrong_attempt());
        assert!(!Verdict::Skipped.counts_as_wrong_attempt());
        assert!(!Verdict::Accepted.counts_as_wrong_attempt());
    }

    #[test]
    fn judge_status_ids_map_to_verdicts() {
        assert_eq!(JudgeStatus::from_id(1).verdict(), None);
        assert_eq!(JudgeStatus::from_id(2).verdict(), None);
        assert_eq!(JudgeStatus::from_id(3).verdict(), Some(Verdict::Accepted));
        assert_eq!(JudgeStatus::from_id(4).verdict(), Some(Verdict::WrongAnswer));
        assert_eq!(JudgeStatus::from_id(5).verdict(), Some(Verdict::TimeLimitExceed));
        assert_eq!(JudgeStatus::from_id(6).verdict(), Some(Verdict::CompilationError));
        assert_eq!(JudgeStatus::from_id(11).verdict(), Some(Verdict::RuntimeError));
        assert_eq!(JudgeStatus::from_id(11).id(), 11);
    }
}
