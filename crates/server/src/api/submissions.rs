//! 提交相关 API 路由。

use std::sync::Arc;

use arena_api_types::{
    CompileCheckRequest, SubmissionResponse, SubmitRequest, TestcaseResultResponse,
    VisibilityRequest,
};
use arena_core::domain::{Submission, SubmissionId};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use judge_orchestrator::SubmitRequest as JudgeSubmitRequest;

use super::error::{ApiError, parse_id};
use super::state::AppState;

/// 创建提交 API 路由。
pub fn create_submission_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/submissions", post(submit))
        .route("/api/submissions/{id}", get(get_submission))
        .route("/api/submissions/{id}/rejudge", post(rejudge))
        .route("/api/submissions/{id}/visibility", put(set_visibility))
        // 参考解编译检查
        .route("/api/compile-check", post(check_compilation))
}

pub(crate) fn submission_response(submission: &Submission) -> SubmissionResponse {
    SubmissionResponse {
        id: submission.id.to_string(),
        problem_id: submission.problem_id.to_string(),
        contest_id: submission.contest_id.map(|id| id.to_string()),
        user_id: submission.user_id.to_string(),
        language_id: submission.language.judge_id(),
        language: submission.language.name().to_string(),
        final_verdict: submission.final_verdict().as_str().to_string(),
        testcase_results: submission
            .testcase_results()
            .iter()
            .map(|result| TestcaseResultResponse {
                token: result.token.to_string(),
                verdict: result.verdict.as_str().to_string(),
                execution_time: result.execution_time,
                memory_used: result.memory_used,
            })
            .collect(),
        execution_time: submission.execution_time(),
        memory_used: submission.memory_used(),
        is_public: submission.is_public,
        rejudged: submission.rejudged,
        created_at: submission.created_at.to_rfc3339(),
        updated_at: submission.updated_at.to_rfc3339(),
    }
}

/// 创建提交并开始评测。
async fn submit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    let request = JudgeSubmitRequest {
        problem_id: parse_id(&request.problem_id, "题目")?,
        contest_id: request
            .contest_id
            .as_deref()
            .map(|raw| parse_id(raw, "比赛"))
            .transpose()?,
        user_id: parse_id(&request.user_id, "用户")?,
        language_id: request.language_id,
        source_code: request.source_code,
    };

    let submission = state.service.submit(request).await?;
    Ok((StatusCode::CREATED, Json(submission_response(&submission))))
}

/// 查询提交详情。
async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission_id: SubmissionId = parse_id(&id, "提交")?;
    let submission = state.service.submission(submission_id).await?;
    Ok(Json(submission_response(&submission)))
}

/// 重测提交，返回新创建的提交。
async fn rejudge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    let submission_id: SubmissionId = parse_id(&id, "提交")?;
    let submission = state.service.rejudge(submission_id).await?;
    Ok((StatusCode::CREATED, Json(submission_response(&submission))))
}

/// 修改提交公开状态。
async fn set_visibility(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission_id: SubmissionId = parse_id(&id, "提交")?;
    let submission = state
        .service
        .set_visibility(submission_id, request.is_public)
        .await?;
    Ok(Json(submission_response(&submission)))
}

async fn check_compilation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompileCheckRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .check_compilation(request.language_id, &request.source_code)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
