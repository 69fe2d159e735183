//! ICPC and IOI scoring over one contestant's submissions.

use chrono::{DateTime, Utc};

use super::{ProblemId, ScoringRule, Submission};

/// Penalty minutes charged per rejected attempt before an accepted run.
pub const WRONG_ATTEMPT_PENALTY_MINUTES: f64 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ProblemResult {
    pub problem_id: ProblemId,
    pub score: u32,
    pub attempts: u32,
    pub solved_at: Option<DateTime<Utc>>,
    pub penalty_time: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Standing {
    pub score: u32,
    pub penalty: i64,
    pub problems_solved: Vec<ProblemResult>,
}

impl ScoringRule {
    pub fn standing(self, submissions: &[Submission], contest_start: DateTime<Utc>) -> Standing {
        match self {
            ScoringRule::Icpc | ScoringRule::Custom => icpc_standing(submissions, contest_start),
            ScoringRule::Ioi => ioi_standing(submissions),
        }
    }
}

/// Groups scored submissions per problem in chronological order. Problems are
/// listed in the order the contestant first submitted to them.
fn by_problem(submissions: &[Submission]) -> Vec<(ProblemId, Vec<&Submission>)> {
    let mut scored: Vec<&Submission> = submissions.iter().filter(|s| s.is_scored()).collect();
    scored.sort_by_key(|submission| submission.created_at);

    let mut groups: Vec<(ProblemId, Vec<&Submission>)> = Vec::new();
    for submission in scored {
        match groups
            .iter_mut()
            .find(|(problem_id, _)| *problem_id == submission.problem_id)
        {
            Some((_, group)) => group.push(submission),
            None => groups.push((submission.problem_id, vec![submission])),
        }
    }
    groups
}

pub fn icpc_standing(submissions: &[Submission], contest_start: DateTime<Utc>) -> Standing {
    let mut standing = Standing::default();
    let mut total_penalty = 0.0;

    for (problem_id, attempts) in by_problem(submissions) {
        let mut tried: u32 = 0;
        let mut wrong: u32 = 0;
        let mut accepted = None;

        for submission in attempts {
            tried += 1;
            let verdict = submission.final_verdict();
            if verdict.is_accepted() {
                accepted = Some(submission.created_at);
                break;
            }
            if verdict.counts_as_wrong_attempt() {
                wrong += 1;
            }
        }

        let Some(solved_at) = accepted else {
            continue;
        };

        let minutes = (solved_at - contest_start).num_milliseconds() as f64 / 60_000.0;
        let penalty = minutes + f64::from(wrong) * WRONG_ATTEMPT_PENALTY_MINUTES;
        total_penalty += penalty;
        standing.score += 1;
        standing.problems_solved.push(ProblemResult {
            problem_id,
            score: 1,
            attempts: tried,
            solved_at: Some(solved_at),
            penalty_time: penalty,
        });
    }

    standing.penalty = total_penalty.round() as i64;
    standing
}

pub fn ioi_standing(submissions: &[Submission]) -> Standing {
    let mut standing = Standing::default();
    let mut total = 0.0;

    for (problem_id, attempts) in by_problem(submissions) {
        let mut best = 0.0;
        let mut best_at = None;
        for submission in &attempts {
            let score = submission.passed_percentage();
            if score > best {
                best = score;
                best_at = Some(submission.created_at);
            }
        }

        if best > 0.0 {
            total += best;
            standing.problems_solved.push(ProblemResult {
                problem_id,
                score: best.round() as u32,
                attempts: attempts.len() as u32,
                solved_at: best_at,
                penalty_time: 0.0,
            });
        }
    }

    standing.score = total.round() as u32;
    standing
}
