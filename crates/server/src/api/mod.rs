//! API 路由模块。
//!
//! 提供提交评测与比赛排行榜的 HTTP 接口。

pub mod contests;
pub mod error;
pub mod state;
pub mod submissions;

use std::sync::Arc;

use arena_api_types::HealthCheckResponse;
use axum::{Json, Router, routing::get};
use tower_http::cors::CorsLayer;

pub use contests::create_contest_router;
pub use state::AppState;
pub use submissions::create_submission_router;

/// 组装全部路由。
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(create_submission_router())
        .merge(create_contest_router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse::ok())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arena_api_types::{ErrorResponse, SubmissionResponse};
    use arena_core::domain::{
        JudgeClient, JudgeClientError, JudgeStatus, ProblemId, RunRequest, RunStatus, RunToken,
        TestcaseId,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use judge_orchestrator::{
        InMemoryStore, JudgeConfig, JudgeService, ProblemSpec, Stores, TestcaseSpec,
    };
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    use super::*;

    /// Accepts every run on the first poll.
    struct AcceptingJudge;

    #[async_trait]
    impl JudgeClient for AcceptingJudge {
        async fn create_batch(
            &self,
            requests: Vec<RunRequest>,
        ) -> Result<Vec<RunToken>, JudgeClientError> {
            Ok((0..requests.len())
                .map(|index| RunToken::new(format!("run-{index}")))
                .collect())
        }

        async fn get_batch(&self, tokens: &[RunToken]) -> Result<Vec<RunStatus>, JudgeClientError> {
            Ok(tokens.iter().map(accepted).collect())
        }

        async fn create_single(&self, _request: RunRequest) -> Result<RunToken, JudgeClientError> {
            Ok(RunToken::new("single"))
        }

        async fn get_single(&self, token: &RunToken) -> Result<RunStatus, JudgeClientError> {
            Ok(accepted(token))
        }
    }

    fn accepted(token: &RunToken) -> RunStatus {
        RunStatus {
            token: token.clone(),
            status: JudgeStatus::Accepted,
            execution_time: Some(0.01),
            memory_used: Some(1024),
            stdout: None,
            compile_output: None,
        }
    }

    async fn app() -> (Router, ProblemId) {
        let store = Arc::new(InMemoryStore::new());
        let problem_id = ProblemId::new();
        store
            .add_problem(ProblemSpec {
                id: problem_id,
                time_limit_ms: 1000,
                memory_limit_kb: 65536,
                testcases: vec![TestcaseSpec {
                    id: TestcaseId::new(),
                    input: "1 2\n".to_string(),
                    expected_output: "3\n".to_string(),
                }],
            })
            .await;
        let service = JudgeService::new(
            JudgeConfig::default(),
            Arc::new(AcceptingJudge),
            Stores::in_memory(store),
        );
        let router = create_router(Arc::new(AppState::new(Arc::new(service))));
        (router, problem_id)
    }

    async fn read_json<T: DeserializeOwned>(res: axum::http::Response<Body>) -> T {
        let bytes = axum::body::to_bytes(res.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json")
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build")
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app().await;
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(res.status(), StatusCode::OK);
        let body: HealthCheckResponse = read_json(res).await;
        assert_eq!(body, HealthCheckResponse::ok());
    }

    #[tokio::test]
    async fn test_submit_returns_pending_submission() {
        let (app, problem_id) = app().await;
        let res = app
            .oneshot(post_json(
                "/api/submissions",
                serde_json::json!({
                    "problemId": problem_id.to_string(),
                    "userId": uuid::Uuid::new_v4().to_string(),
                    "languageId": 105,
                    "sourceCode": "int main() { return 0; }",
                }),
            ))
            .await
            .expect("request should succeed");

        assert_eq!(res.status(), StatusCode::CREATED);
        let body: SubmissionResponse = read_json(res).await;
        assert_eq!(body.final_verdict, "PENDING");
        assert_eq!(body.language, "cpp");
        assert_eq!(body.testcase_results.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_language_is_bad_request() {
        let (app, problem_id) = app().await;
        let res = app
            .oneshot(post_json(
                "/api/submissions",
                serde_json::json!({
                    "problemId": problem_id.to_string(),
                    "userId": uuid::Uuid::new_v4().to_string(),
                    "languageId": 1,
                    "sourceCode": "x",
                }),
            ))
            .await
            .expect("request should succeed");

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = read_json(res).await;
        assert_eq!(body.code, "validation_error");
    }

    #[tokio::test]
    async fn test_unknown_submission_is_not_found() {
        let (app, _) = app().await;
        let res = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/submissions/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = read_json(res).await;
        assert_eq!(body.code, "not_found");
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let (app, _) = app().await;
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/contests/not-a-uuid/leaderboard")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
