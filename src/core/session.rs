//! 会话：对话状态、交互计数与 active 标志
//!
//! Session 由调用方独占持有，每次 `submit` 把用户输入交给 ReactAgent 并写回更新后的 transcript。
//! 交互次数达到 max_exchanges 后会话失效，需 `reset` 才能继续。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::AgentError;
use crate::memory::{Message, Transcript};
use crate::react::{LoopState, ReactAgent};

/// 默认单会话最大交互次数
pub const DEFAULT_MAX_EXCHANGES: usize = 10;

/// 达到交互上限时附带的提示
pub fn exchange_limit_notice(max_exchanges: usize) -> String {
    format!(
        "Reached the maximum of {} interaction steps. Please restart the session.",
        max_exchanges
    )
}

/// 一次 submit 的结果
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReply {
    pub answer: String,
    pub state: LoopState,
    /// 本次调用推理后端的次数
    pub steps: usize,
    /// 会话在本次交互后失效时的提示
    pub notice: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    system_prompt: String,
    transcript: Transcript,
    step: usize,
    max_exchanges: usize,
    active: bool,
}

impl Session {
    pub fn new(system_prompt: impl Into<String>, max_exchanges: usize) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            transcript: Transcript::with_system(system_prompt.clone()),
            system_prompt,
            step: 0,
            max_exchanges,
            active: true,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// 已完成的交互次数
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn max_exchanges(&self) -> usize {
        self.max_exchanges
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 清空对话（仅保留 system prompt），计数归零，重新激活
    pub fn reset(&mut self) {
        self.transcript = Transcript::with_system(self.system_prompt.clone());
        self.step = 0;
        self.active = true;
        tracing::info!(session = %self.id, "session reset");
    }

    /// 提交一条用户输入并运行循环
    ///
    /// 推理后端失败时返回 AdapterCommunication，会话 transcript 与计数保持不变，可直接重试。
    pub async fn submit(
        &mut self,
        agent: &ReactAgent,
        user_input: &str,
    ) -> Result<SessionReply, AgentError> {
        if !self.active {
            return Err(AgentError::SessionInactive);
        }

        let mut transcript = self.transcript.clone();
        transcript.push(Message::user(user_input));
        let result = agent.process_query(transcript).await?;

        self.transcript = result.messages;
        self.step += 1;
        tracing::info!(
            session = %self.id,
            exchange = self.step,
            max_exchanges = self.max_exchanges,
            state = ?result.state,
            steps = result.steps,
            "exchange completed"
        );

        let notice = if self.step >= self.max_exchanges {
            self.active = false;
            Some(exchange_limit_notice(self.max_exchanges))
        } else {
            None
        };

        Ok(SessionReply {
            answer: result.response,
            state: result.state,
            steps: result.steps,
            notice,
            active: self.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::dataset::test_support::sample_dataset;
    use crate::llm::{LlmError, ScriptedLlmClient};
    use crate::memory::Role;
    use crate::tools::{ActionDispatcher, ActionSchemaRegistry, HandlerRegistry};

    fn agent(llm: Arc<ScriptedLlmClient>) -> ReactAgent {
        let registry = HandlerRegistry::standard(Arc::new(sample_dataset(5)), llm.clone());
        ReactAgent::new(
            llm,
            ActionSchemaRegistry::default(),
            ActionDispatcher::new(registry, 5),
        )
    }

    #[tokio::test]
    async fn test_submit_appends_exchange() {
        let llm = Arc::new(
            ScriptedLlmClient::new()
                .then_action("c1", "count_category", r#"{"category_class":"CANCEL"}"#)
                .then_answer("There are 5 CANCEL rows."),
        );
        let agent = agent(llm);
        let mut session = Session::new("system", 3);

        let reply = session.submit(&agent, "How many cancels?").await.unwrap();
        assert_eq!(reply.answer, "There are 5 CANCEL rows.");
        assert_eq!(reply.state, LoopState::Answered);
        assert!(reply.notice.is_none());
        assert_eq!(session.step(), 1);

        let roles: Vec<Role> = session.transcript().messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
    }

    #[tokio::test]
    async fn test_exchange_ceiling_deactivates() {
        let llm = Arc::new(
            ScriptedLlmClient::new()
                .then_answer("one")
                .then_answer("two"),
        );
        let agent = agent(llm);
        let mut session = Session::new("system", 2);

        let first = session.submit(&agent, "q1").await.unwrap();
        assert!(first.active);
        let second = session.submit(&agent, "q2").await.unwrap();
        assert!(!second.active);
        assert_eq!(second.notice.as_deref(), Some(exchange_limit_notice(2).as_str()));
        assert!(!session.is_active());

        let err = session.submit(&agent, "q3").await.unwrap_err();
        assert!(matches!(err, AgentError::SessionInactive));
    }

    #[tokio::test]
    async fn test_reset_restores_session() {
        let llm = Arc::new(ScriptedLlmClient::new().then_answer("a").then_answer("b"));
        let agent = agent(llm);
        let mut session = Session::new("system", 1);
        session.submit(&agent, "q").await.unwrap();
        assert!(!session.is_active());

        session.reset();
        assert!(session.is_active());
        assert_eq!(session.step(), 0);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript().messages()[0].content_str(), "system");

        let reply = session.submit(&agent, "again").await.unwrap();
        assert_eq!(reply.answer, "b");
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_session_untouched() {
        let llm = Arc::new(
            ScriptedLlmClient::new().then_error(LlmError::Api("connection refused".into())),
        );
        let agent = agent(llm);
        let mut session = Session::new("system", 5);

        let err = session.submit(&agent, "q").await.unwrap_err();
        assert!(matches!(err, AgentError::AdapterCommunication(_)));
        assert_eq!(session.step(), 0);
        assert_eq!(session.transcript().len(), 1);
        assert!(session.is_active());
    }

    #[test]
    fn test_session_serializes() {
        let session = Session::new("system", 4);
        let json = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id(), session.id());
        assert_eq!(restored.transcript(), session.transcript());
    }
}
