use anyhow::Result;
use arena_core::domain::{ContestId, SubmissionId, Verdict};
use tokio::sync::broadcast;

/// 评测编排器对外广播的事件类型。
#[derive(Debug, Clone, PartialEq)]
pub enum JudgeEvent {
    /// 提交已创建并交给轮询器。
    SubmissionCreated {
        submission_id: SubmissionId,
        testcases: usize,
    },
    /// 某个测试点得出结论。
    TestcaseJudged {
        submission_id: SubmissionId,
        index: usize,
        verdict: Verdict,
    },
    /// 提交得出最终结论。
    SubmissionJudged {
        submission_id: SubmissionId,
        verdict: Verdict,
    },
    /// 单次轮询失败，等待下一次轮询。
    PollFailed {
        submission_id: SubmissionId,
        error: String,
    },
    /// 超过评测截止时间，强制判为超时。
    DeadlineExceeded { submission_id: SubmissionId },
    /// 轮询器被取消（重测）。
    PollerCancelled { submission_id: SubmissionId },
    /// 比赛排行榜已重新计算。
    LeaderboardUpdated { contest_id: ContestId },
}

impl JudgeEvent {
    pub fn submission_id(&self) -> Option<SubmissionId> {
        match self {
            JudgeEvent::SubmissionCreated { submission_id, .. }
            | JudgeEvent::TestcaseJudged { submission_id, .. }
            | JudgeEvent::SubmissionJudged { submission_id, .. }
            | JudgeEvent::PollFailed { submission_id, .. }
            | JudgeEvent::DeadlineExceeded { submission_id }
            | JudgeEvent::PollerCancelled { submission_id } => Some(*submission_id),
            JudgeEvent::LeaderboardUpdated { .. } => None,
        }
    }
}

/// 基于 `tokio::broadcast` 的事件广播器。
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<JudgeEvent>,
}

impl EventBroadcaster {
    /// 创建事件广播器。
    ///
    /// `capacity` 表示内部广播队列容量。
    /// `capacity` 为 0 时按 1 处理。
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 广播一个事件，没有订阅者时直接丢弃。
    pub fn emit(&self, event: JudgeEvent) {
        let _ = self.sender.send(event);
    }

    /// 订阅事件流。
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
        }
    }
}

/// 事件接收流包装器。
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<JudgeEvent>,
}

impl EventStream {
    /// 异步接收下一条事件。
    pub async fn recv(&mut self) -> Result<JudgeEvent> {
        Ok(self.receiver.recv().await?)
    }

    /// 非阻塞尝试接收一条事件。
    pub fn try_recv(&mut self) -> Result<JudgeEvent> {
        Ok(self.receiver.try_recv()?)
    }
}
