//! Action 分发器
//!
//! 持有 HandlerRegistry 与单次调用超时；`dispatch` 总是返回恰好一个 ActionResult：
//! Handler 返回 Err、超时或 panic 都在这里被截获并转为 HandlerExecution 失败，不会向上传播。
//! 每次调用输出结构化审计日志（JSON）。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use futures_util::FutureExt;
use serde_json::{json, Value};
use tokio::time::timeout;

use crate::core::ActionError;
use crate::tools::{ActionKind, ActionRequest, HandlerRegistry};

/// 单个 Action 的结果：成功 payload 或失败描述
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    Success { kind: ActionKind, payload: Value },
    Failure { kind: String, error: ActionError },
}

impl ActionResult {
    pub fn failure(kind: impl Into<String>, error: ActionError) -> Self {
        ActionResult::Failure {
            kind: kind.into(),
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success { .. })
    }

    pub fn kind_name(&self) -> &str {
        match self {
            ActionResult::Success { kind, .. } => kind.as_str(),
            ActionResult::Failure { kind, .. } => kind,
        }
    }

    pub fn error(&self) -> Option<&ActionError> {
        match self {
            ActionResult::Success { .. } => None,
            ActionResult::Failure { error, .. } => Some(error),
        }
    }

    /// 写入 tool 消息的观察内容：成功为 payload JSON，失败为 `{"error": {"kind", "message"}}`
    pub fn to_observation(&self) -> String {
        let value = match self {
            ActionResult::Success { payload, .. } => payload.clone(),
            ActionResult::Failure { error, .. } => json!({
                "error": {
                    "kind": error.kind(),
                    "message": error.to_string(),
                }
            }),
        };
        value.to_string()
    }
}

/// 分发器：无状态，映射在构建时固定
pub struct ActionDispatcher {
    registry: HandlerRegistry,
    timeout: Duration,
}

impl ActionDispatcher {
    pub fn new(registry: HandlerRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// 执行一个已校验的请求；所有失败都转为 Failure 结果
    pub async fn dispatch(&self, request: &ActionRequest) -> ActionResult {
        let kind = request.kind();
        let Some(handler) = self.registry.get(kind) else {
            return ActionResult::failure(
                kind.as_str(),
                ActionError::handler(kind.as_str(), "no handler registered"),
            );
        };

        let start = Instant::now();
        let guarded = AssertUnwindSafe(handler.execute(request)).catch_unwind();
        let result = timeout(self.timeout, guarded).await;

        let (outcome, action_result) = match result {
            Ok(Ok(Ok(payload))) => ("ok", ActionResult::Success { kind, payload }),
            Ok(Ok(Err(reason))) => (
                "error",
                ActionResult::failure(kind.as_str(), ActionError::handler(kind.as_str(), reason)),
            ),
            Ok(Err(panic)) => (
                "panic",
                ActionResult::failure(
                    kind.as_str(),
                    ActionError::handler(
                        kind.as_str(),
                        format!("handler panicked: {}", panic_message(panic.as_ref())),
                    ),
                ),
            ),
            Err(_) => (
                "timeout",
                ActionResult::failure(
                    kind.as_str(),
                    ActionError::handler(
                        kind.as_str(),
                        format!("timed out after {}ms", self.timeout.as_millis()),
                    ),
                ),
            ),
        };

        let audit = json!({
            "event": "action_audit",
            "kind": kind.as_str(),
            "ok": action_result.is_success(),
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview(request),
        });
        tracing::info!(audit = %audit.to_string(), "action");

        action_result
    }

    /// 并发执行多个请求；结果顺序与输入顺序一致
    pub async fn dispatch_all(&self, requests: &[ActionRequest]) -> Vec<ActionResult> {
        join_all(requests.iter().map(|r| self.dispatch(r))).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn args_preview(request: &ActionRequest) -> String {
    let s = format!("{request:?}");
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
