//! Folding per-testcase judge reports into a submission verdict.
//!
//! The first non-accepted testcase in declared order decides the submission and
//! every testcase after it is skipped. A compile output on the first testcase
//! short-circuits the whole sweep.

use super::{JudgeStatus, TestcaseResult, Verdict};

/// What the judge said about one run during the current poll.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub status: JudgeStatus,
    pub execution_time: Option<f64>,
    pub memory_used: Option<u64>,
    pub compile_output: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestcaseOutcome {
    pub verdict: Verdict,
    pub execution_time: Option<f64>,
    pub memory_used: Option<u64>,
}

impl TestcaseOutcome {
    fn skipped() -> Self {
        Self {
            verdict: Verdict::Skipped,
            execution_time: None,
            memory_used: None,
        }
    }
}

impl From<&TestcaseResult> for TestcaseOutcome {
    fn from(result: &TestcaseResult) -> Self {
        Self {
            verdict: result.verdict,
            execution_time: result.execution_time,
            memory_used: result.memory_used,
        }
    }
}

/// Result of one sweep: the submission verdict plus a verdict for every testcase.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgement {
    pub final_verdict: Verdict,
    pub outcomes: Vec<TestcaseOutcome>,
    /// Index of the testcase that determined a failing verdict.
    pub decisive: Option<usize>,
}

impl Judgement {
    pub fn is_terminal(&self) -> bool {
        self.final_verdict.is_terminal()
    }
}

#[derive(Debug)]
struct Sweep {
    outcomes: Vec<TestcaseOutcome>,
    failure: Option<(usize, Verdict)>,
    waiting: bool,
}

impl Sweep {
    fn with_capacity(len: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(len),
            failure: None,
            waiting: false,
        }
    }

    fn step(mut self, index: usize, prior: &TestcaseResult, report: Option<&RunReport>) -> Self {
        if self.failure.is_some() {
            self.outcomes.push(TestcaseOutcome::skipped());
            return self;
        }
        if self.waiting {
            self.outcomes.push(prior.into());
            return self;
        }
        if prior.verdict.is_terminal() {
            if !prior.verdict.is_accepted() {
                self.failure = Some((index, prior.verdict));
            }
            self.outcomes.push(prior.into());
            return self;
        }

        match report.and_then(|report| report.status.verdict().map(|verdict| (report, verdict))) {
            None => {
                self.waiting = true;
                self.outcomes.push(prior.into());
            }
            Some((report, verdict)) => {
                if !verdict.is_accepted() {
                    self.failure = Some((index, verdict));
                }
                self.outcomes.push(TestcaseOutcome {
                    verdict,
                    execution_time: report.execution_time,
                    memory_used: report.memory_used,
                });
            }
        }
        self
    }

    fn finish(self) -> Judgement {
        let (final_verdict, decisive) = match self.failure {
            Some((index, verdict)) => (verdict, Some(index)),
            None if self.waiting => (Verdict::Pending, None),
            None => (Verdict::Accepted, None),
        };
        Judgement {
            final_verdict,
            outcomes: self.outcomes,
            decisive,
        }
    }
}

/// Folds the current reports over the already recorded results.
///
/// `reports[i]` is `None` for testcases that were not polled this round.
/// Both slices must have the same length.
pub fn aggregate(previous: &[TestcaseResult], reports: &[Option<RunReport>]) -> Judgement {
    debug_assert_eq!(previous.len(), reports.len());

    if let Some(Some(first)) = reports.first()
        && first.compile_output.is_some()
    {
        return compile_failure(previous.len(), first);
    }

    previous
        .iter()
        .zip(reports)
        .enumerate()
        .fold(Sweep::with_capacity(previous.len()), |sweep, (index, (prior, report))| {
            sweep.step(index, prior, report.as_ref())
        })
        .finish()
}

fn compile_failure(len: usize, first: &RunReport) -> Judgement {
    let mut outcomes = Vec::with_capacity(len);
    outcomes.push(TestcaseOutcome {
        verdict: Verdict::CompilationError,
        execution_time: first.execution_time,
        memory_used: first.memory_used,
    });
    outcomes.extend((1..len).map(|_| TestcaseOutcome::skipped()));
    Judgement {
        final_verdict: Verdict::CompilationError,
        outcomes,
        decisive: Some(0),
    }
}

/// All testcases of a submission share one compile step, so every report that
/// carries a compile output must carry the same one.
pub fn compile_outputs_agree(reports: &[Option<RunReport>]) -> bool {
    let mut outputs = reports
        .iter()
        .flatten()
        .filter_map(|report| report.compile_output.as_deref());
    match outputs.next() {
        Some(first) => outputs.all(|output| output == first),
        None => true,
    }
}
