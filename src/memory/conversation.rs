//! 对话状态：完整 transcript
//!
//! 循环唯一的持久记忆。assistant 发起 Action 的回合为 `content = None` + `requested_actions`，
//! 每条 tool 消息通过 `in_reply_to` 对应紧邻前一个 Action 回合中的一个请求。
//! 与短期记忆不同，这里不做剪枝，否则请求与观察的对应关系会被切断。

use serde::{Deserialize, Serialize};

use crate::core::AgentError;

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// 模型请求的一个 Action（尚未校验：kind 与原始参数文本都来自模型）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestedAction {
    /// 关联 ID，对应 tool 消息的 `in_reply_to`
    pub id: String,
    pub kind: String,
    /// 模型给出的原始 JSON 参数文本
    pub arguments: String,
}

impl RequestedAction {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            arguments: arguments.into(),
        }
    }
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requested_actions: Vec<RequestedAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
}

impl Message {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            requested_actions: Vec::new(),
            in_reply_to: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// assistant 的「意图行动」回合：content 为空，只携带请求
    pub fn action_request(actions: Vec<RequestedAction>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            requested_actions: actions,
            in_reply_to: None,
        }
    }

    pub fn observation(in_reply_to: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            requested_actions: Vec::new(),
            in_reply_to: Some(in_reply_to.into()),
        }
    }

    pub fn is_action_request(&self) -> bool {
        self.role == Role::Assistant && !self.requested_actions.is_empty()
    }

    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// 有序对话记录；追加观察时校验与请求的对应关系
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    /// 追加一条 tool 观察：必须回应最近一个 Action 回合中尚未回应的请求
    pub fn push_observation(
        &mut self,
        in_reply_to: &str,
        content: impl Into<String>,
    ) -> Result<(), AgentError> {
        let turn = self
            .messages
            .iter()
            .rposition(|m| m.role != Role::Tool)
            .ok_or_else(|| AgentError::InvalidTranscript("observation without a preceding turn".into()))?;

        let request_turn = &self.messages[turn];
        if !request_turn.is_action_request() {
            return Err(AgentError::InvalidTranscript(format!(
                "observation '{in_reply_to}' does not follow an action request turn"
            )));
        }
        if !request_turn.requested_actions.iter().any(|a| a.id == in_reply_to) {
            return Err(AgentError::InvalidTranscript(format!(
                "no pending action with id '{in_reply_to}'"
            )));
        }
        let answered = self.messages[turn + 1..]
            .iter()
            .any(|m| m.in_reply_to.as_deref() == Some(in_reply_to));
        if answered {
            return Err(AgentError::InvalidTranscript(format!(
                "action '{in_reply_to}' already has an observation"
            )));
        }

        self.messages.push(Message::observation(in_reply_to, content));
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// 编号历史视图：`N. Role: content`（Action 回合显示请求的 kind 列表）
    pub fn render_history(&self) -> String {
        self.messages
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let body = if m.is_action_request() {
                    let kinds: Vec<&str> = m.requested_actions.iter().map(|a| a.kind.as_str()).collect();
                    format!("[requests: {}]", kinds.join(", "))
                } else {
                    m.content_str().to_string()
                };
                format!("{}. {}: {}", i + 1, capitalize(m.role.as_str()), body)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
