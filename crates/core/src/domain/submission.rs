use chrono::{DateTime, Utc};

use super::{
    ContestId, DomainError, Judgement, Language, ProblemId, RunToken, SubmissionId, UserId,
    Verdict,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TestcaseResult {
    pub token: RunToken,
    pub verdict: Verdict,
    /// Seconds of CPU time reported by the judge.
    pub execution_time: Option<f64>,
    /// Kilobytes reported by the judge.
    pub memory_used: Option<u64>,
}

impl TestcaseResult {
    pub fn pending(token: RunToken) -> Self {
        Self {
            token,
            verdict: Verdict::Pending,
            execution_time: None,
            memory_used: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub problem_id: ProblemId,
    pub contest_id: Option<ContestId>,
    pub user_id: UserId,
    pub language: Language,
    pub source_code: String,
}

/// Judging state loaded back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredJudgement {
    pub final_verdict: Verdict,
    pub testcase_results: Vec<TestcaseResult>,
    pub execution_time: Option<f64>,
    pub memory_used: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: SubmissionId,
    pub problem_id: ProblemId,
    pub contest_id: Option<ContestId>,
    pub user_id: UserId,
    pub language: Language,
    pub source_code: String,
    pub is_public: bool,
    pub rejudged: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    final_verdict: Verdict,
    testcase_results: Vec<TestcaseResult>,
    execution_time: Option<f64>,
    memory_used: Option<u64>,
}

impl Submission {
    /// Creates a PENDING submission with one pending result per judge token.
    pub fn new(new_submission: NewSubmission, tokens: Vec<RunToken>, now: DateTime<Utc>) -> Self {
        Self {
            id: SubmissionId::new(),
            problem_id: new_submission.problem_id,
            contest_id: new_submission.contest_id,
            user_id: new_submission.user_id,
            language: new_submission.language,
            source_code: new_submission.source_code,
            is_public: true,
            rejudged: false,
            created_at: now,
            updated_at: now,
            final_verdict: Verdict::Pending,
            testcase_results: tokens.into_iter().map(TestcaseResult::pending).collect(),
            execution_time: None,
            memory_used: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: SubmissionId,
        new_submission: NewSubmission,
        judgement: StoredJudgement,
        is_public: bool,
        rejudged: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            problem_id: new_submission.problem_id,
            contest_id: new_submission.contest_id,
            user_id: new_submission.user_id,
            language: new_submission.language,
            source_code: new_submission.source_code,
            is_public,
            rejudged,
            created_at,
            updated_at,
            final_verdict: judgement.final_verdict,
            testcase_results: judgement.testcase_results,
            execution_time: judgement.execution_time,
            memory_used: judgement.memory_used,
        }
    }

    pub fn final_verdict(&self) -> Verdict {
        self.final_verdict
    }

    pub fn testcase_results(&self) -> &[TestcaseResult] {
        &self.testcase_results
    }

    pub fn execution_time(&self) -> Option<f64> {
        self.execution_time
    }

    pub fn memory_used(&self) -> Option<u64> {
        self.memory_used
    }

    pub fn is_pending(&self) -> bool {
        self.final_verdict.is_pending()
    }

    /// Judged submissions that still count towards contest scoring.
    pub fn is_scored(&self) -> bool {
        !self.rejudged && self.final_verdict.is_terminal()
    }

    pub fn new_submission(&self) -> NewSubmission {
        NewSubmission {
            problem_id: self.problem_id,
            contest_id: self.contest_id,
            user_id: self.user_id,
            language: self.language,
            source_code: self.source_code.clone(),
        }
    }

    /// Indices of testcases the judge has not decided yet.
    pub fn pending_indices(&self) -> Vec<usize> {
        self.testcase_results
            .iter()
            .enumerate()
            .filter(|(_, result)| result.verdict.is_pending())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn accepted_testcases(&self) -> usize {
        self.testcase_results
            .iter()
            .filter(|result| result.verdict.is_accepted())
            .count()
    }

    /// Percentage of passed testcases, or 100 for an accepted run without a breakdown.
    pub fn passed_percentage(&self) -> f64 {
        if self.testcase_results.is_empty() {
            return if self.final_verdict.is_accepted() { 100.0 } else { 0.0 };
        }
        self.accepted_testcases() as f64 / self.testcase_results.len() as f64 * 100.0
    }

    /// Applies one aggregation sweep and returns the indices that were newly decided.
    pub fn apply_judgement(&mut self, judgement: &Judgement) -> Result<Vec<usize>, DomainError> {
        if judgement.outcomes.len() != self.testcase_results.len() {
            return Err(DomainError::TestcaseCountMismatch {
                expected: self.testcase_results.len(),
                actual: judgement.outcomes.len(),
            });
        }
        if self.final_verdict.is_terminal() && judgement.final_verdict.is_pending() {
            return Err(DomainError::VerdictRegression);
        }

        let mut decided = Vec::new();
        for (index, (result, outcome)) in self
            .testcase_results
            .iter_mut()
            .zip(&judgement.outcomes)
            .enumerate()
        {
            if result.verdict.is_terminal() || outcome.verdict.is_pending() {
                continue;
            }
            result.verdict = outcome.verdict;
            result.execution_time = outcome.execution_time;
            result.memory_used = outcome.memory_used;
            decided.push(index);
        }

        if self.final_verdict.is_pending() && judgement.final_verdict.is_terminal() {
            self.final_verdict = judgement.final_verdict;
            if let Some(index) = judgement.decisive {
                self.execution_time = self.testcase_results[index].execution_time;
                self.memory_used = self.testcase_results[index].memory_used;
            }
        }

        if !decided.is_empty() {
            self.updated_at = Utc::now();
        }
        Ok(decided)
    }

    /// Deadline expiry: the first pending testcase is charged the time limit and
    /// everything else still pending is skipped. No-op once a verdict exists.
    pub fn force_deadline(&mut self) -> bool {
        if self.final_verdict.is_terminal() {
            return false;
        }

        let mut charged = false;
        for result in self
            .testcase_results
            .iter_mut()
            .filter(|result| result.verdict.is_pending())
        {
            result.verdict = if charged {
                Verdict::Skipped
            } else {
                charged = true;
                Verdict::TimeLimitExceed
            };
        }

        self.final_verdict = Verdict::TimeLimitExceed;
        self.execution_time = None;
        self.memory_used = None;
        self.updated_at = Utc::now();
        true
    }

    /// Marks the record as replaced by a rejudge. A still-pending record is
    /// closed out as SKIPPED so it never returns to PENDING.
    pub fn supersede(&mut self) {
        self.rejudged = true;
        if self.final_verdict.is_pending() {
            for result in self
                .testcase_results
                .iter_mut()
                .filter(|result| result.verdict.is_pending())
            {
                result.verdict = Verdict::Skipped;
            }
            self.final_verdict = Verdict::Skipped;
        }
        self.updated_at = Utc::now();
    }

    pub fn set_public(&mut self, is_public: bool) {
        self.is_public = is_public;
        self.updated_at = Utc::now();
    }
}
