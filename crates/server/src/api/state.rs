//! 统一的应用状态。

use std::sync::Arc;

use judge_orchestrator::JudgeService;

/// 统一的应用状态，包含所有服务共享的数据。
#[derive(Clone)]
pub struct AppState {
    /// 评测编排服务。
    pub service: Arc<JudgeService>,
}

impl AppState {
    /// 创建新的应用状态。
    pub fn new(service: Arc<JudgeService>) -> Self {
        Self { service }
    }
}
