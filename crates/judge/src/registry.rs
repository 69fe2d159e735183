use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use arena_core::domain::SubmissionId;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{JudgeError, Result};

struct ActivePoller {
    run_id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// 轮询任务注册表，保证每个提交同一时刻最多只有一个轮询器。
#[derive(Default)]
pub struct PollerRegistry {
    pollers: Arc<Mutex<HashMap<SubmissionId, ActivePoller>>>,
}

impl PollerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为提交启动轮询任务。
    ///
    /// 任务结束后自动从注册表移除；已有活跃轮询器时返回冲突错误。
    pub async fn start<F, Fut>(&self, submission_id: SubmissionId, task: F) -> Result<()>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pollers = self.pollers.lock().await;
        if pollers.contains_key(&submission_id) {
            return Err(JudgeError::Conflict(format!(
                "提交 {submission_id} 已有活跃的轮询器"
            )));
        }

        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let work = task(cancel.clone());
        let registry = self.pollers.clone();
        let handle = tokio::spawn(async move {
            work.await;
            let mut pollers = registry.lock().await;
            if pollers
                .get(&submission_id)
                .is_some_and(|active| active.run_id == run_id)
            {
                pollers.remove(&submission_id);
            }
        });

        debug!(submission_id = %submission_id, run_id = %run_id, "poller started");
        pollers.insert(
            submission_id,
            ActivePoller {
                run_id,
                cancel,
                handle,
            },
        );
        Ok(())
    }

    /// 取消轮询器并等待其退出，返回是否存在活跃轮询器。
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, submission_id: SubmissionId) -> bool {
        let active = self.pollers.lock().await.remove(&submission_id);
        let Some(active) = active else {
            return false;
        };

        active.cancel.cancel();
        if let Err(err) = active.handle.await {
            warn!(submission_id = %submission_id, error = %err, "poller task failed");
        }
        info!(submission_id = %submission_id, "poller cancelled");
        true
    }

    pub async fn is_active(&self, submission_id: SubmissionId) -> bool {
        self.pollers.lock().await.contains_key(&submission_id)
    }

    pub async fn active_count(&self) -> usize {
        self.pollers.lock().await.len()
    }

    /// 取消全部轮询器并等待退出。
    pub async fn shutdown(&self) {
        let drained: Vec<(SubmissionId, ActivePoller)> =
            self.pollers.lock().await.drain().collect();
        if drained.is_empty() {
            return;
        }

        info!(count = drained.len(), "shutting down pollers");
        for (_, active) in &drained {
            active.cancel.cancel();
        }
        for (submission_id, active) in drained {
            if let Err(err) = active.handle.await {
                warn!(submission_id = %submission_id, error = %err, "poller task failed");
            }
        }
    }
}
