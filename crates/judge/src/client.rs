//! 基于 HTTP 的外部评测服务客户端。
//!
//! 对接 Judge0 风格的接口：批量创建运行、按 token 批量查询状态，
//! 以及用于参考解编译检查的单次运行接口。

use std::collections::HashMap;

use arena_core::domain::{
    JudgeClient, JudgeClientError, JudgeStatus, RunRequest, RunStatus, RunToken,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::JudgeEndpointConfig;

/// 查询状态时请求的字段。
const STATUS_FIELDS: &str = "token,time,status,memory,stdout,compile_output";

/// HTTP 评测客户端。
#[derive(Debug, Clone)]
pub struct HttpJudgeClient {
    client: Client,
    config: JudgeEndpointConfig,
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    submissions: Vec<RunPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct RunPayload<'a> {
    language_id: i32,
    source_code: &'a str,
    cpu_time_limit: f64,
    memory_limit: u64,
    stdin: &'a str,
    expected_output: &'a str,
}

impl<'a> From<&'a RunRequest> for RunPayload<'a> {
    fn from(request: &'a RunRequest) -> Self {
        Self {
            language_id: request.language.judge_id(),
            source_code: &request.source_code,
            cpu_time_limit: request.cpu_time_limit,
            memory_limit: request.memory_limit,
            stdin: &request.stdin,
            expected_output: &request.expected_output,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct BatchStatusResponse {
    submissions: Vec<StatusPayload>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    status: Option<StatusField>,
    /// 秒，可能是字符串也可能是数字。
    #[serde(default)]
    time: Option<Value>,
    #[serde(default)]
    memory: Option<u64>,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    compile_output: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusField {
    id: u16,
}

impl StatusPayload {
    fn into_run_status(self, token: RunToken) -> Result<RunStatus, JudgeClientError> {
        let status = self.status.ok_or_else(|| {
            JudgeClientError::MalformedResponse(format!("missing status for token {token}"))
        })?;

        Ok(RunStatus {
            token,
            status: JudgeStatus::from_id(status.id),
            execution_time: self.time.as_ref().and_then(parse_seconds),
            memory_used: self.memory,
            stdout: self.stdout,
            compile_output: self.compile_output,
        })
    }
}

fn parse_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// 按请求的 token 顺序重新排列批量查询结果。
fn order_by_tokens(
    tokens: &[RunToken],
    payloads: Vec<StatusPayload>,
) -> Result<Vec<RunStatus>, JudgeClientError> {
    let mut by_token: HashMap<String, StatusPayload> = HashMap::with_capacity(payloads.len());
    for payload in payloads {
        let token = payload.token.clone().ok_or_else(|| {
            JudgeClientError::MalformedResponse("batch status entry without token".to_string())
        })?;
        by_token.insert(token, payload);
    }

    tokens
        .iter()
        .map(|token| {
            by_token
                .remove(token.as_str())
                .ok_or_else(|| {
                    JudgeClientError::MalformedResponse(format!("no status returned for token {token}"))
                })?
                .into_run_status(token.clone())
        })
        .collect()
}

fn transport_error(err: reqwest::Error) -> JudgeClientError {
    if err.is_timeout() {
        JudgeClientError::Timeout
    } else {
        JudgeClientError::Unavailable(err.to_string())
    }
}

impl HttpJudgeClient {
    /// 创建 HTTP 评测客户端。
    pub fn new(config: JudgeEndpointConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn base64_flag(&self) -> &'static str {
        if self.config.base64_encoded { "true" } else { "false" }
    }

    fn with_headers(&self, mut builder: RequestBuilder) -> RequestBuilder {
        if let Some(host) = &self.config.api_host {
            builder = builder.header("x-rapidapi-host", host);
        }
        if let Some(key) = &self.config.api_key {
            builder = builder.header("x-rapidapi-key", key);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, JudgeClientError> {
        let response = self
            .with_headers(builder)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(JudgeClientError::Unavailable(format!(
                "judge responded with {status}"
            )));
        }

        response.json::<T>().await.map_err(|err| {
            if err.is_timeout() {
                JudgeClientError::Timeout
            } else {
                JudgeClientError::MalformedResponse(err.to_string())
            }
        })
    }
}

#[async_trait]
impl JudgeClient for HttpJudgeClient {
    async fn create_batch(&self, requests: Vec<RunRequest>) -> Result<Vec<RunToken>, JudgeClientError> {
        let body = BatchRequest {
            submissions: requests.iter().map(RunPayload::from).collect(),
        };
        debug!(runs = requests.len(), "creating judge batch");

        let builder = self
            .client
            .post(self.url("/submissions/batch"))
            .query(&[("base64_encoded", self.base64_flag())])
            .json(&body);
        let tokens: Vec<TokenResponse> = self.send(builder).await?;

        if tokens.len() != requests.len() {
            return Err(JudgeClientError::MalformedResponse(format!(
                "expected {} tokens, got {}",
                requests.len(),
                tokens.len()
            )));
        }
        Ok(tokens.into_iter().map(|t| RunToken::new(t.token)).collect())
    }

    async fn get_batch(&self, tokens: &[RunToken]) -> Result<Vec<RunStatus>, JudgeClientError> {
        let joined = tokens
            .iter()
            .map(RunToken::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let builder = self.client.get(self.url("/submissions/batch")).query(&[
            ("tokens", joined.as_str()),
            ("base64_encoded", self.base64_flag()),
            ("fields", STATUS_FIELDS),
        ]);
        let response: BatchStatusResponse = self.send(builder).await?;

        order_by_tokens(tokens, response.submissions)
    }

    async fn create_single(&self, request: RunRequest) -> Result<RunToken, JudgeClientError> {
        let builder = self
            .client
            .post(self.url("/submissions"))
            .query(&[("base64_encoded", self.base64_flag()), ("wait", "false")])
            .json(&RunPayload::from(&request));
        let response: TokenResponse = self.send(builder).await?;
        Ok(RunToken::new(response.token))
    }

    async fn get_single(&self, token: &RunToken) -> Result<RunStatus, JudgeClientError> {
        let builder = self
            .client
            .get(self.url(&format!("/submissions/{token}")))
            .query(&[("base64_encoded", self.base64_flag()), ("fields", STATUS_FIELDS)]);
        let payload: StatusPayload = self.send(builder).await?;
        payload.into_run_status(token.clone())
    }
}
