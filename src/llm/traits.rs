//! 推理后端抽象
//!
//! 循环只关心 `next_step` 的两种形态：最终回答，或一个/多个 Action 请求。
//! `complete` 为纯文本补全，供语义选择、摘要等 Handler 的嵌套调用使用。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::{Message, RequestedAction};
use crate::tools::ActionSchema;

/// 后端调用错误（网络、超时、响应格式等）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to build request: {0}")]
    RequestBuild(String),
}

/// 后端对一次 `next_step` 的回答
#[derive(Debug, Clone, PartialEq)]
pub enum BackendStep {
    FinalAnswer(String),
    /// 按顺序的请求，每个带关联 ID
    ActionsRequested(Vec<RequestedAction>),
}

impl BackendStep {
    /// 转成写入 transcript 的 assistant 消息（Action 回合为 content = None + requested_actions）
    pub fn to_message(&self) -> Message {
        match self {
            BackendStep::FinalAnswer(text) => Message::assistant(text.clone()),
            BackendStep::ActionsRequested(actions) => Message::action_request(actions.clone()),
        }
    }
}

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 给定完整 transcript 与可用 Action，返回下一步
    async fn next_step(
        &self,
        transcript: &[Message],
        actions: &[ActionSchema],
    ) -> Result<BackendStep, LlmError>;

    /// 纯文本补全（不带工具）
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
