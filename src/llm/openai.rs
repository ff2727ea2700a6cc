//! OpenAI 兼容推理后端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）。`next_step` 把注册表中的
//! Action Schema 作为 function tools 公布给模型（tool_choice = auto），响应中的 `tool_calls`
//! 转为 `BackendStep::ActionsRequested`，否则为最终回答。
//! 没有自动重试；超时只作用于单次 HTTP 调用，由 `[llm.timeouts] request` 配置。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionMessageToolCalls, ChatCompletionRequestMessage, ChatCompletionTool,
    ChatCompletionToolChoiceOption, ChatCompletionTools, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, CreateChatCompletionResponse, FunctionObject,
    ToolChoiceOptions,
};
use async_openai::Client;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::timeout;

use crate::config::LlmSection;
use crate::llm::{BackendStep, LlmClient, LlmError};
use crate::memory::{Message, RequestedAction, Role};
use crate::tools::ActionSchema;

/// Token 使用统计（累计值）
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Arc<AtomicU64>,
    pub completion_tokens: Arc<AtomicU64>,
    pub total_tokens: Arc<AtomicU64>,
}

impl TokenUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.total_tokens.fetch_add(prompt + completion, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.total_tokens.load(Ordering::Relaxed),
        )
    }
}

/// OpenAI 兼容客户端
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    /// next_step 使用的温度（默认 0，尽量确定）
    temperature: f32,
    /// complete（摘要、语义选择）使用的温度
    text_temperature: f32,
    request_timeout: Duration,
    /// 累计 token 使用统计
    pub usage: TokenUsage,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            temperature: 0.0,
            text_temperature: 0.5,
            request_timeout: Duration::from_secs(60),
            usage: TokenUsage::new(),
        }
    }

    /// 按 [llm] 配置段创建
    pub fn from_config(section: &LlmSection) -> Self {
        Self::new(section.base_url.as_deref(), &section.model, None)
            .with_temperature(section.temperature)
            .with_text_temperature(section.summary_temperature)
            .with_request_timeout(Duration::from_secs(section.timeouts.request))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_text_temperature(mut self, temperature: f32) -> Self {
        self.text_temperature = temperature;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<CreateChatCompletionResponse, LlmError> {
        let response = timeout(self.request_timeout, self.client.chat().create(request))
            .await
            .map_err(|_| LlmError::Timeout(self.request_timeout.as_secs()))?
            .map_err(|e| LlmError::Api(e.to_string()))?;

        if let Some(usage) = &response.usage {
            self.usage
                .add(usage.prompt_tokens as u64, usage.completion_tokens as u64);
        }
        Ok(response)
    }
}

/// transcript 消息的 OpenAI 线格式
pub(crate) fn wire_message(m: &Message) -> Value {
    match m.role {
        Role::Assistant if m.is_action_request() => {
            let calls: Vec<Value> = m
                .requested_actions
                .iter()
                .map(|a| {
                    json!({
                        "id": a.id,
                        "type": "function",
                        "function": { "name": a.kind, "arguments": a.arguments },
                    })
                })
                .collect();
            json!({ "role": "assistant", "content": null, "tool_calls": calls })
        }
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": m.in_reply_to.clone().unwrap_or_default(),
            "content": m.content_str(),
        }),
        role => json!({ "role": role.as_str(), "content": m.content_str() }),
    }
}

fn to_request_messages(messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
    messages
        .iter()
        .map(|m| {
            serde_json::from_value(wire_message(m))
                .map_err(|e| LlmError::RequestBuild(format!("{} message: {}", m.role.as_str(), e)))
        })
        .collect()
}

fn to_tools(actions: &[ActionSchema]) -> Vec<ChatCompletionTools> {
    actions
        .iter()
        .map(|a| {
            ChatCompletionTools::Function(ChatCompletionTool {
                function: FunctionObject {
                    name: a.name().to_string(),
                    description: Some(a.description.to_string()),
                    parameters: Some(a.parameters.clone()),
                    ..Default::default()
                },
            })
        })
        .collect()
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    async fn next_step(
        &self,
        transcript: &[Message],
        actions: &[ActionSchema],
    ) -> Result<BackendStep, LlmError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(to_request_messages(transcript)?);
        args.temperature(self.temperature);
        if !actions.is_empty() {
            args.tools(to_tools(actions));
            args.tool_choice(ChatCompletionToolChoiceOption::Mode(ToolChoiceOptions::Auto));
        }
        let request = args
            .build()
            .map_err(|e| LlmError::RequestBuild(e.to_string()))?;

        tracing::debug!(
            model = %self.model,
            message_count = transcript.len(),
            tools_count = actions.len(),
            "chat completion (next_step)"
        );

        let response = self.send(request).await?;
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| LlmError::InvalidResponse("no choices returned".to_string()))?;

        let requested: Vec<RequestedAction> = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tc| match tc {
                ChatCompletionMessageToolCalls::Function(f) => {
                    let id = if f.id.is_empty() {
                        format!("call_{}", uuid::Uuid::new_v4().simple())
                    } else {
                        f.id
                    };
                    Some(RequestedAction::new(id, f.function.name, f.function.arguments))
                }
                _ => None,
            })
            .collect();

        if requested.is_empty() {
            Ok(BackendStep::FinalAnswer(message.content.unwrap_or_default()))
        } else {
            Ok(BackendStep::ActionsRequested(requested))
        }
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(to_request_messages(messages)?)
            .temperature(self.text_temperature)
            .build()
            .map_err(|e| LlmError::RequestBuild(e.to_string()))?;

        tracing::debug!(model = %self.model, message_count = messages.len(), "chat completion (text)");

        let response = self.send(request).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ActionSchemaRegistry;

    #[test]
    fn test_wire_message_action_turn() {
        let msg = Message::action_request(vec![RequestedAction::new(
            "call_1",
            "count_intent",
            r#"{"intent_class":"review"}"#,
        )]);
        let wire = wire_message(&msg);
        assert_eq!(wire["role"], "assistant");
        assert!(wire["content"].is_null());
        assert_eq!(wire["tool_calls"][0]["id"], "call_1");
        assert_eq!(wire["tool_calls"][0]["function"]["name"], "count_intent");
    }

    #[test]
    fn test_wire_message_observation() {
        let wire = wire_message(&Message::observation("call_1", "{\"count\":3}"));
        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "call_1");
        assert_eq!(wire["content"], "{\"count\":3}");
    }

    #[test]
    fn test_to_request_messages() {
        let messages = vec![
            Message::system("sys"),
            Message::user("hi"),
            Message::action_request(vec![RequestedAction::new("c1", "finish", "{}")]),
            Message::observation("c1", "done"),
            Message::assistant("bye"),
        ];
        let converted = to_request_messages(&messages).unwrap();
        assert_eq!(converted.len(), 5);
        assert!(matches!(converted[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(converted[3], ChatCompletionRequestMessage::Tool(_)));
    }

    #[test]
    fn test_to_tools() {
        let registry = ActionSchemaRegistry::default();
        let tools = to_tools(registry.list_action_kinds());
        assert_eq!(tools.len(), 11);
    }
}
