//! 脚本化 LLM 客户端（用于测试与离线运行，无需 API）
//!
//! `next_step` 依次返回预置的步骤；脚本耗尽后返回 `InvalidResponse`，
//! 或在 `repeating` 模式下一直重复同一步。`complete` 依次返回预置文本。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{BackendStep, LlmClient, LlmError};
use crate::memory::{Message, RequestedAction};
use crate::tools::ActionSchema;

#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    steps: Mutex<VecDeque<Result<BackendStep, LlmError>>>,
    repeat: Option<BackendStep>,
    completions: Mutex<VecDeque<Result<String, LlmError>>>,
    step_calls: AtomicUsize,
    complete_calls: AtomicUsize,
    /// 记录每次 complete 收到的最后一条消息内容
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次 next_step 都返回同一步（用于验证步数上限）
    pub fn repeating(step: BackendStep) -> Self {
        Self {
            repeat: Some(step),
            ..Self::default()
        }
    }

    pub fn then_step(self, step: BackendStep) -> Self {
        self.push_step(Ok(step));
        self
    }

    /// 便捷：一个请求单个 Action 的回合
    pub fn then_action(self, id: &str, kind: &str, arguments: &str) -> Self {
        self.then_step(BackendStep::ActionsRequested(vec![RequestedAction::new(
            id, kind, arguments,
        )]))
    }

    pub fn then_answer(self, text: &str) -> Self {
        self.then_step(BackendStep::FinalAnswer(text.to_string()))
    }

    pub fn then_error(self, err: LlmError) -> Self {
        self.push_step(Err(err));
        self
    }

    pub fn then_completion(self, text: &str) -> Self {
        self.push_completion(Ok(text.to_string()));
        self
    }

    pub fn then_completion_error(self, err: LlmError) -> Self {
        self.push_completion(Err(err));
        self
    }

    pub fn step_calls(&self) -> usize {
        self.step_calls.load(Ordering::SeqCst)
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn push_step(&self, step: Result<BackendStep, LlmError>) {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push_back(step);
        }
    }

    fn push_completion(&self, completion: Result<String, LlmError>) {
        if let Ok(mut completions) = self.completions.lock() {
            completions.push_back(completion);
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn next_step(
        &self,
        _transcript: &[Message],
        _actions: &[ActionSchema],
    ) -> Result<BackendStep, LlmError> {
        self.step_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(step) = &self.repeat {
            return Ok(step.clone());
        }
        self.steps
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".to_string())))
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(last) = messages.last() {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(last.content_str().to_string());
            }
        }
        self.completions
            .lock()
            .ok()
            .and_then(|mut c| c.pop_front())
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("no scripted completion".to_string())))
    }
}
