//! 错误类型：两层分类
//!
//! - `ActionError`：校验 / 执行失败，可恢复，由循环折叠进 tool 观察消息，交给模型自行纠正；
//! - `AgentError`：推理后端不可达、会话已停用等硬错误，直接返回给调用方。

use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;

/// 直达调用方的硬错误（不会被折叠成观察）
#[derive(Error, Debug)]
pub enum AgentError {
    /// 推理后端通信失败：终止本次调用，区别于「达到步数上限」
    #[error("Reasoning backend communication failed: {0}")]
    AdapterCommunication(#[from] LlmError),

    #[error("Session is inactive; reset it to start a new conversation")]
    SessionInactive,

    #[error("Transcript invariant violated: {0}")]
    InvalidTranscript(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),
}

/// 可恢复错误的稳定编码（写入观察 payload 的 `error.kind`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownAction,
    MissingField,
    InvalidArgument,
    ConstraintViolation,
    HandlerExecution,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownAction => "unknown_action",
            ErrorKind::MissingField => "missing_field",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::ConstraintViolation => "constraint_violation",
            ErrorKind::HandlerExecution => "handler_execution",
        }
    }
}

/// Action 校验与执行阶段的失败（全部可恢复）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Missing required field '{field}' for action {kind}")]
    MissingField { kind: String, field: String },

    #[error("Invalid argument '{field}' for action {kind}: {reason}")]
    InvalidArgument {
        kind: String,
        field: String,
        reason: String,
    },

    #[error("Constraint violated for action {kind}: {reason}")]
    ConstraintViolation { kind: String, reason: String },

    #[error("Action {kind} failed: {reason}")]
    HandlerExecution { kind: String, reason: String },
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::UnknownAction(_) => ErrorKind::UnknownAction,
            ActionError::MissingField { .. } => ErrorKind::MissingField,
            ActionError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            ActionError::ConstraintViolation { .. } => ErrorKind::ConstraintViolation,
            ActionError::HandlerExecution { .. } => ErrorKind::HandlerExecution,
        }
    }

    pub fn missing(kind: &str, field: &str) -> Self {
        ActionError::MissingField {
            kind: kind.to_string(),
            field: field.to_string(),
        }
    }

    pub fn invalid(kind: &str, field: &str, reason: impl Into<String>) -> Self {
        ActionError::InvalidArgument {
            kind: kind.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn constraint(kind: &str, reason: impl Into<String>) -> Self {
        ActionError::ConstraintViolation {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }

    pub fn handler(kind: &str, reason: impl Into<String>) -> Self {
        ActionError::HandlerExecution {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        assert_eq!(
            ActionError::UnknownAction("x".into()).kind().as_str(),
            "unknown_action"
        );
        assert_eq!(
            ActionError::missing("count_intent", "intent_class").kind(),
            ErrorKind::MissingField
        );
        assert_eq!(
            ActionError::constraint("division_float", "denominator must not be zero").kind(),
            ErrorKind::ConstraintViolation
        );
    }

    #[test]
    fn test_error_messages_name_field() {
        let err = ActionError::invalid("show_examples", "number_rows", "must be at most 7");
        let msg = err.to_string();
        assert!(msg.contains("number_rows"));
        assert!(msg.contains("show_examples"));
    }

    #[test]
    fn test_adapter_error_is_distinct() {
        let err: AgentError = LlmError::Timeout(60).into();
        assert!(matches!(err, AgentError::AdapterCommunication(_)));
        assert!(err.to_string().contains("Reasoning backend"));
    }
}
