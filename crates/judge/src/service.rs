use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use arena_core::domain::{
    ContestId, JudgeClient, JudgeStatus, Language, NewSubmission, ProblemId, RunRequest,
    RunStatus, RunToken, Submission, SubmissionId, UserId,
};
use chrono::Utc;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::dispatcher::SubmissionDispatcher;
use crate::leaderboard::{LeaderboardService, LeaderboardView};
use crate::poller::{JudgePoller, PollContext};
use crate::registry::PollerRegistry;
use crate::store::{ContestStore, InMemoryStore, LeaderboardStore, ProblemCatalog, SubmissionStore};
use crate::{EventBroadcaster, EventStream, JudgeConfig, JudgeError, JudgeEvent, Result};

/// 编排器依赖的存储集合。
#[derive(Clone)]
pub struct Stores {
    pub problems: Arc<dyn ProblemCatalog>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub contests: Arc<dyn ContestStore>,
    pub leaderboard: Arc<dyn LeaderboardStore>,
}

impl Stores {
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            problems: store.clone(),
            submissions: store.clone(),
            contests: store.clone(),
            leaderboard: store,
        }
    }
}

/// 外部传入的提交请求，语言使用评测服务的语言编号。
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub problem_id: ProblemId,
    pub contest_id: Option<ContestId>,
    pub user_id: UserId,
    pub language_id: i32,
    pub source_code: String,
}

/// 评测编排器入口。
pub struct JudgeService {
    config: Arc<JudgeConfig>,
    client: Arc<dyn JudgeClient>,
    submissions: Arc<dyn SubmissionStore>,
    dispatcher: SubmissionDispatcher,
    registry: PollerRegistry,
    leaderboard: Arc<LeaderboardService>,
    event_broadcaster: Arc<EventBroadcaster>,
    poll_context: Arc<PollContext>,
    rejudging: StdMutex<HashSet<SubmissionId>>,
}

/// 正在重测的提交占位，离开作用域时释放。
struct RejudgeClaim<'a> {
    claims: &'a StdMutex<HashSet<SubmissionId>>,
    submission_id: SubmissionId,
}

impl<'a> RejudgeClaim<'a> {
    fn acquire(claims: &'a StdMutex<HashSet<SubmissionId>>, submission_id: SubmissionId) -> Option<Self> {
        let inserted = claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(submission_id);
        inserted.then_some(Self {
            claims,
            submission_id,
        })
    }
}

impl Drop for RejudgeClaim<'_> {
    fn drop(&mut self) {
        self.claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.submission_id);
    }
}

impl JudgeService {
    pub fn new(config: JudgeConfig, client: Arc<dyn JudgeClient>, stores: Stores) -> Self {
        info!(
            event_buffer_size = config.event_buffer_size,
            poll_interval_ms = config.polling.interval_ms,
            max_ticks = config.polling.max_ticks,
            "initializing judge service"
        );

        let event_broadcaster = Arc::new(EventBroadcaster::new(config.event_buffer_size));
        let leaderboard = Arc::new(LeaderboardService::new(
            stores.contests.clone(),
            stores.submissions.clone(),
            stores.leaderboard.clone(),
            event_broadcaster.clone(),
        ));
        let dispatcher = SubmissionDispatcher::new(
            client.clone(),
            stores.problems.clone(),
            stores.submissions.clone(),
            config.limits.clone(),
        );
        let poll_context = Arc::new(PollContext {
            client: client.clone(),
            submissions: stores.submissions.clone(),
            leaderboard: leaderboard.clone(),
            event_broadcaster: event_broadcaster.clone(),
            polling: config.polling.clone(),
        });

        Self {
            config: Arc::new(config),
            client,
            submissions: stores.submissions,
            dispatcher,
            registry: PollerRegistry::new(),
            leaderboard,
            event_broadcaster,
            poll_context,
            rejudging: StdMutex::new(HashSet::new()),
        }
    }

    /// 校验并创建提交，随后启动后台轮询。
    pub async fn submit(&self, request: SubmitRequest) -> Result<Submission> {
        let new_submission = validate(request)?;
        let submission = self.dispatcher.dispatch(new_submission).await?;
        self.launch(submission.clone()).await?;
        Ok(submission)
    }

    /// 重测提交：停止旧轮询器，旧记录标记为已重测，并以相同内容创建新提交。
    ///
    /// 同一提交同时只允许一次重测，新提交沿用原提交时间。
    #[tracing::instrument(skip(self))]
    pub async fn rejudge(&self, submission_id: SubmissionId) -> Result<Submission> {
        let Some(_claim) = RejudgeClaim::acquire(&self.rejudging, submission_id) else {
            return Err(JudgeError::Conflict(format!(
                "提交 {submission_id} 正在重测"
            )));
        };

        let mut previous = self.submission(submission_id).await?;
        if previous.rejudged {
            return Err(JudgeError::Conflict(format!(
                "提交 {submission_id} 已被重测"
            )));
        }

        let was_polling = self.registry.cancel(submission_id).await;
        if was_polling {
            previous = self.submission(submission_id).await?;
        }

        let redispatched = self
            .dispatcher
            .redispatch(previous.new_submission(), previous.created_at)
            .await;
        let submission = match redispatched {
            Ok(submission) => submission,
            Err(err) => {
                if was_polling && previous.is_pending() {
                    self.launch(previous).await?;
                }
                return Err(err);
            }
        };

        previous.supersede();
        self.submissions.save(&previous).await?;
        info!(
            previous_id = %submission_id,
            submission_id = %submission.id,
            "submission rejudged"
        );

        self.launch(submission.clone()).await?;
        if let Err(err) = self
            .leaderboard
            .record_verdict(&previous, Utc::now())
            .await
        {
            error!(error = %err, "failed to update leaderboard after rejudge");
        }
        Ok(submission)
    }

    pub async fn submission(&self, submission_id: SubmissionId) -> Result<Submission> {
        self.submissions
            .find_submission(submission_id)
            .await?
            .ok_or_else(|| JudgeError::NotFound(format!("提交 {submission_id}")))
    }

    pub async fn set_visibility(&self, submission_id: SubmissionId, is_public: bool) -> Result<Submission> {
        let mut submission = self.submission(submission_id).await?;
        submission.set_public(is_public);
        self.submissions.save(&submission).await?;
        Ok(submission)
    }

    /// 单独运行一次源代码，只检查能否通过编译。
    #[tracing::instrument(skip(self, source_code))]
    pub async fn check_compilation(&self, language_id: i32, source_code: &str) -> Result<()> {
        let language = Language::from_judge_id(language_id)?;
        let limits = &self.config.limits;
        let token = self
            .client
            .create_single(RunRequest {
                language,
                source_code: source_code.to_string(),
                cpu_time_limit: limits.max_time_limit_secs,
                memory_limit: limits.min_memory_limit_kb,
                stdin: String::new(),
                expected_output: String::new(),
            })
            .await?;

        let status = timeout(
            self.config.polling.compile_check_timeout(),
            self.wait_for_run(&token),
        )
        .await
        .map_err(|_| JudgeError::Timeout(format!("编译检查 {token} 未在限定时间内完成")))??;

        let compile_output = status.compile_output.filter(|output| !output.is_empty());
        if compile_output.is_some() || matches!(status.status, JudgeStatus::CompilationError) {
            let output = compile_output.unwrap_or_default();
            return Err(JudgeError::Validation(format!("编译失败: {output}")));
        }
        Ok(())
    }

    async fn wait_for_run(&self, token: &RunToken) -> Result<RunStatus> {
        let interval = self.config.polling.compile_check_interval();
        loop {
            sleep(interval).await;
            let status = self.client.get_single(token).await?;
            if !status.status.is_in_progress() {
                return Ok(status);
            }
        }
    }

    pub async fn standings(&self, contest_id: ContestId) -> Result<LeaderboardView> {
        self.leaderboard.standings(contest_id, Utc::now()).await
    }

    pub async fn publish_results(&self, contest_id: ContestId) -> Result<LeaderboardView> {
        let now = Utc::now();
        self.leaderboard.publish_results(contest_id, now).await?;
        self.leaderboard.standings(contest_id, now).await
    }

    pub fn leaderboard(&self) -> &LeaderboardService {
        &self.leaderboard
    }

    /// 为启动前遗留的待评测提交重新启动轮询，返回恢复的数量。
    pub async fn resume_pending(&self) -> Result<usize> {
        let pending = self.submissions.list_pending().await?;
        let mut resumed = 0;
        for submission in pending {
            let submission_id = submission.id;
            match self.launch(submission).await {
                Ok(()) => resumed += 1,
                Err(err) => warn!(submission_id = %submission_id, error = %err, "failed to resume poller"),
            }
        }
        if resumed > 0 {
            info!(resumed, "resumed pending submissions");
        }
        Ok(resumed)
    }

    pub fn subscribe_events(&self) -> EventStream {
        self.event_broadcaster.subscribe()
    }

    pub async fn active_pollers(&self) -> usize {
        self.registry.active_count().await
    }

    pub async fn is_polling(&self, submission_id: SubmissionId) -> bool {
        self.registry.is_active(submission_id).await
    }

    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }

    async fn launch(&self, submission: Submission) -> Result<()> {
        let submission_id = submission.id;
        let testcases = submission.testcase_results().len();
        let context = self.poll_context.clone();
        self.registry
            .start(submission_id, move |cancel| async move {
                JudgePoller::new(context, submission, cancel).run().await;
            })
            .await?;

        self.event_broadcaster.emit(JudgeEvent::SubmissionCreated {
            submission_id,
            testcases,
        });
        Ok(())
    }
}

fn validate(request: SubmitRequest) -> Result<NewSubmission> {
    let language = Language::from_judge_id(request.language_id)?;
    if request.source_code.trim().is_empty() {
        return Err(JudgeError::Validation("源代码不能为空".to_string()));
    }

    Ok(NewSubmission {
        problem_id: request.problem_id,
        contest_id: request.contest_id,
        user_id: request.user_id,
        language,
        source_code: request.source_code,
    })
}
