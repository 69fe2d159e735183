use arena_core::domain::{DomainError, JudgeClientError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("重复提交: {0}")]
    Conflict(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("评测服务错误: {0}")]
    ExternalService(String),

    #[error("评测超时: {0}")]
    Timeout(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("领域规则错误: {0}")]
    Domain(#[from] DomainError),

    #[error("存储错误: {0}")]
    Storage(#[from] anyhow::Error),
}

/// 对外暴露的错误分类，供 HTTP 层映射状态码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    ExternalService,
    Timeout,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ExternalService => "external_service_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl JudgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JudgeError::Validation(_) => ErrorKind::Validation,
            JudgeError::Domain(DomainError::UnsupportedLanguage(_))
            | JudgeError::Domain(DomainError::InvalidFreezeWindow) => ErrorKind::Validation,
            JudgeError::Conflict(_) => ErrorKind::Conflict,
            JudgeError::NotFound(_) => ErrorKind::NotFound,
            JudgeError::ExternalService(_) => ErrorKind::ExternalService,
            JudgeError::Timeout(_) => ErrorKind::Timeout,
            JudgeError::Config(_) | JudgeError::Domain(_) | JudgeError::Storage(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<JudgeClientError> for JudgeError {
    fn from(err: JudgeClientError) -> Self {
        match err {
            JudgeClientError::Timeout => JudgeError::Timeout(err.to_string()),
            JudgeClientError::Unavailable(_) | JudgeClientError::MalformedResponse(_) => {
                JudgeError::ExternalService(err.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, JudgeError>;
