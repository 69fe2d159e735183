//! 比赛排行榜 API 路由。

use std::sync::Arc;

use arena_api_types::{LeaderboardEntryResponse, LeaderboardResponse, ProblemResultResponse};
use arena_core::domain::{ContestId, LeaderboardEntry};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::Utc;
use judge_orchestrator::LeaderboardView;

use super::error::{ApiError, parse_id};
use super::state::AppState;

/// 创建比赛 API 路由。
pub fn create_contest_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/contests/{id}/leaderboard", get(get_leaderboard))
        .route("/api/contests/{id}/leaderboard/recompute", post(recompute))
        .route("/api/contests/{id}/publish-results", post(publish_results))
}

fn entry_response(entry: &LeaderboardEntry) -> LeaderboardEntryResponse {
    LeaderboardEntryResponse {
        rank: entry.rank,
        user_id: entry.user_id.to_string(),
        score: entry.score,
        penalty: entry.penalty,
        problems_solved: entry
            .problems_solved
            .iter()
            .map(|problem| ProblemResultResponse {
                problem_id: problem.problem_id.to_string(),
                score: problem.score,
                attempts: problem.attempts,
                solved_at: problem.solved_at.map(|time| time.to_rfc3339()),
                penalty_time: problem.penalty_time,
            })
            .collect(),
        last_submission_time: entry.last_submission_time.map(|time| time.to_rfc3339()),
    }
}

pub(crate) fn leaderboard_response(view: &LeaderboardView) -> LeaderboardResponse {
    LeaderboardResponse {
        contest_id: view.contest_id.to_string(),
        status: view.status.as_str().to_string(),
        is_frozen: view.is_frozen,
        results_published: view.results_published,
        snapshot_taken_at: view.snapshot_taken_at.map(|time| time.to_rfc3339()),
        entries: view.entries.iter().map(entry_response).collect(),
    }
}

/// 查询排行榜，冻结期间返回冻结快照。
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let contest_id: ContestId = parse_id(&id, "比赛")?;
    let view = state.service.standings(contest_id).await?;
    Ok(Json(leaderboard_response(&view)))
}

/// 从全部提交重新计算排行榜。
async fn recompute(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let contest_id: ContestId = parse_id(&id, "比赛")?;
    state
        .service
        .leaderboard()
        .recompute_contest(contest_id, Utc::now())
        .await?;
    let view = state.service.standings(contest_id).await?;
    Ok(Json(leaderboard_response(&view)))
}

/// 公布比赛结果，仅比赛结束后可用。
async fn publish_results(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let contest_id: ContestId = parse_id(&id, "比赛")?;
    let view = state.service.publish_results(contest_id).await?;
    Ok(Json(leaderboard_response(&view)))
}
