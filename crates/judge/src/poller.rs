//! 单个提交的评测结果轮询。
//!
//! 每个提交一个任务：按固定间隔批量查询尚未出结果的测试点，聚合出最终结论，
//! 超过截止时间仍未完成时强制判为超时。

use std::sync::Arc;

use arena_core::domain::{
    JudgeClient, RunReport, RunStatus, RunToken, Submission, Verdict, aggregate,
    compile_outputs_agree,
};
use chrono::Utc;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PollingConfig;
use crate::leaderboard::LeaderboardService;
use crate::store::SubmissionStore;
use crate::{EventBroadcaster, JudgeEvent};

/// 轮询器共享的依赖。
pub struct PollContext {
    pub client: Arc<dyn JudgeClient>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub leaderboard: Arc<LeaderboardService>,
    pub event_broadcaster: Arc<EventBroadcaster>,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Judged(Verdict),
    DeadlineExceeded,
    Cancelled,
}

pub struct JudgePoller {
    context: Arc<PollContext>,
    submission: Submission,
    cancel: CancellationToken,
}

impl JudgePoller {
    pub fn new(context: Arc<PollContext>, submission: Submission, cancel: CancellationToken) -> Self {
        Self {
            context,
            submission,
            cancel,
        }
    }

    /// 运行到得出结论、超时或被取消为止。
    #[tracing::instrument(skip(self), fields(submission_id = %self.submission.id))]
    pub async fn run(mut self) -> (Submission, PollOutcome) {
        let deadline = sleep_until(Instant::now() + self.context.polling.deadline());
        tokio::pin!(deadline);
        let cancel = self.cancel.clone();
        let interval = self.context.polling.interval();

        let outcome = loop {
            let pending = self.submission.pending_indices();
            let tokens: Vec<RunToken> = pending
                .iter()
                .map(|&index| self.submission.testcase_results()[index].token.clone())
                .collect();
            let client = self.context.client.clone();
            let fetch = async move {
                sleep(interval).await;
                if tokens.is_empty() {
                    return Ok(Vec::new());
                }
                client.get_batch(&tokens).await
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("poller cancelled");
                    self.context
                        .event_broadcaster
                        .emit(JudgeEvent::PollerCancelled { submission_id: self.submission.id });
                    break PollOutcome::Cancelled;
                }
                _ = &mut deadline => {
                    self.expire().await;
                    break PollOutcome::DeadlineExceeded;
                }
                fetched = fetch => match fetched {
                    Ok(statuses) => {
                        if let Some(verdict) = self.apply(&pending, statuses).await {
                            self.finish(verdict).await;
                            break PollOutcome::Judged(verdict);
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "poll failed, retrying on next tick");
                        self.context.event_broadcaster.emit(JudgeEvent::PollFailed {
                            submission_id: self.submission.id,
                            error: err.to_string(),
                        });
                    }
                },
            }
        };

        (self.submission, outcome)
    }

    /// 聚合本次查询结果，得出最终结论时返回该结论。
    async fn apply(&mut self, pending: &[usize], statuses: Vec<RunStatus>) -> Option<Verdict> {
        if statuses.len() != pending.len() {
            warn!(
                expected = pending.len(),
                actual = statuses.len(),
                "judge returned an unexpected number of statuses"
            );
            return None;
        }

        let mut reports: Vec<Option<RunReport>> =
            vec![None; self.submission.testcase_results().len()];
        for (&index, status) in pending.iter().zip(&statuses) {
            reports[index] = Some(status.report());
        }
        if !compile_outputs_agree(&reports) {
            warn!("testcases disagree on compile output");
        }

        let judgement = aggregate(self.submission.testcase_results(), &reports);
        let decided = match self.submission.apply_judgement(&judgement) {
            Ok(decided) => decided,
            Err(err) => {
                error!(error = %err, "rejected judgement");
                return None;
            }
        };

        if !decided.is_empty() || judgement.is_terminal() {
            self.persist().await;
        }
        for index in decided {
            debug!(index, verdict = %self.submission.testcase_results()[index].verdict, "testcase judged");
            self.context.event_broadcaster.emit(JudgeEvent::TestcaseJudged {
                submission_id: self.submission.id,
                index,
                verdict: self.submission.testcase_results()[index].verdict,
            });
        }

        judgement
            .is_terminal()
            .then(|| self.submission.final_verdict())
    }

    async fn expire(&mut self) {
        if !self.submission.force_deadline() {
            return;
        }

        warn!(
            deadline_ms = self.context.polling.deadline().as_millis() as u64,
            "judging deadline exceeded"
        );
        self.persist().await;
        self.context
            .event_broadcaster
            .emit(JudgeEvent::DeadlineExceeded {
                submission_id: self.submission.id,
            });
        self.finish(self.submission.final_verdict()).await;
    }

    async fn finish(&self, verdict: Verdict) {
        info!(verdict = %verdict, "submission judged");
        self.context
            .event_broadcaster
            .emit(JudgeEvent::SubmissionJudged {
                submission_id: self.submission.id,
                verdict,
            });

        if let Err(err) = self
            .context
            .leaderboard
            .record_verdict(&self.submission, Utc::now())
            .await
        {
            error!(error = %err, "failed to update leaderboard");
        }
    }

    async fn persist(&self) {
        if let Err(err) = self.context.submissions.save(&self.submission).await {
            error!(error = %err, "failed to persist submission");
        }
    }
}
