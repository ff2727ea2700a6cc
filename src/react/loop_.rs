//! ReAct 主循环（工具调用编排）
//!
//! Thinking -> Acting -> Observing -> Thinking ...，直到 Answered（模型不再请求 Action）
//! 或 Exhausted（达到步数上限）。校验 / 执行失败不会中止循环：它们作为 tool 观察写回
//! transcript，由下一轮模型自行纠正。只有推理后端通信失败会作为硬错误返回。
//! 可选 event_tx：向前端推送 StepUpdate / ActionRequested / Observation 等事件。

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::AgentError;
use crate::llm::{BackendStep, LlmClient};
use crate::memory::{Message, RequestedAction, Transcript};
use crate::react::ReactEvent;
use crate::tools::{ActionDispatcher, ActionResult, ActionSchemaRegistry};

/// 达到步数上限时返回的固定文本
pub const ITERATION_LIMIT_MESSAGE: &str = "Too many steps. Reached iteration limit.";
/// 单次调用内默认最大思考轮数，防止死循环
pub const DEFAULT_MAX_STEPS: usize = 20;
/// Observation 预览最大字符数
const OBSERVATION_PREVIEW_CHARS: usize = 200;

/// 循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Thinking,
    Acting,
    Observing,
    /// 终止：模型给出纯文本回答
    Answered,
    /// 终止：步数上限
    Exhausted,
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Answered | LoopState::Exhausted)
    }
}

#[derive(Debug, Clone)]
pub struct ReactConfig {
    /// 单次 process_query 内的最大思考轮数
    pub max_steps: usize,
    /// 同一回合的多个 Action 是否并发执行（观察顺序始终与请求顺序一致）
    pub parallel_dispatch: bool,
}

impl Default for ReactConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            parallel_dispatch: true,
        }
    }
}

/// 一次循环的终态
#[derive(Debug, Clone, PartialEq)]
pub struct ReactOutcome {
    pub state: LoopState,
    pub answer: String,
    /// 实际调用推理后端的次数
    pub steps: usize,
}

/// process_query 的结果：最终回复与更新后的对话
#[derive(Debug)]
pub struct ReactResult {
    pub state: LoopState,
    pub response: String,
    pub messages: Transcript,
    pub steps: usize,
}

/// 编排器：持有推理后端、Schema 注册表与分发器；不持有会话
pub struct ReactAgent {
    llm: Arc<dyn LlmClient>,
    schemas: ActionSchemaRegistry,
    dispatcher: ActionDispatcher,
    config: ReactConfig,
    event_tx: Option<UnboundedSender<ReactEvent>>,
}

impl ReactAgent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        schemas: ActionSchemaRegistry,
        dispatcher: ActionDispatcher,
    ) -> Self {
        Self {
            llm,
            schemas,
            dispatcher,
            config: ReactConfig::default(),
            event_tx: None,
        }
    }

    pub fn with_config(mut self, config: ReactConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置事件推送通道
    pub fn with_event_tx(mut self, tx: UnboundedSender<ReactEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &ReactConfig {
        &self.config
    }

    pub fn schemas(&self) -> &ActionSchemaRegistry {
        &self.schemas
    }

    fn send_event(&self, ev: ReactEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(ev);
        }
    }

    /// 接收 transcript，返回最终回复与更新后的 transcript
    pub async fn process_query(&self, mut transcript: Transcript) -> Result<ReactResult, AgentError> {
        let outcome = self.run(&mut transcript).await?;
        Ok(ReactResult {
            state: outcome.state,
            response: outcome.answer,
            messages: transcript,
            steps: outcome.steps,
        })
    }

    /// 在给定 transcript 上运行循环直到终态；后端错误时 transcript 保留已追加的内容
    pub async fn run(&self, transcript: &mut Transcript) -> Result<ReactOutcome, AgentError> {
        let capabilities = self.schemas.list_action_kinds();
        let max_steps = self.config.max_steps;
        let mut state = LoopState::Thinking;
        let mut step = 0;
        let mut pending: Vec<RequestedAction> = Vec::new();
        let mut answer = String::new();

        loop {
            match state {
                LoopState::Thinking => {
                    if step >= max_steps {
                        state = LoopState::Exhausted;
                        continue;
                    }
                    step += 1;
                    self.send_event(ReactEvent::StepUpdate { step, max_steps });
                    self.send_event(ReactEvent::Thinking);
                    tracing::debug!(step, max_steps, messages = transcript.len(), "thinking");

                    let next = match self.llm.next_step(transcript.messages(), capabilities).await {
                        Ok(next) => next,
                        Err(e) => {
                            tracing::error!(step, error = %e, "reasoning backend failed");
                            self.send_event(ReactEvent::Error { text: e.to_string() });
                            return Err(AgentError::AdapterCommunication(e));
                        }
                    };

                    match next {
                        BackendStep::ActionsRequested(actions) if !actions.is_empty() => {
                            pending = with_unique_ids(actions);
                            transcript.push(Message::action_request(pending.clone()));
                            state = LoopState::Acting;
                        }
                        BackendStep::ActionsRequested(_) => {
                            transcript.push(Message::assistant(String::new()));
                            state = LoopState::Answered;
                        }
                        BackendStep::FinalAnswer(text) => {
                            transcript.push(Message::assistant(text.clone()));
                            answer = text;
                            state = LoopState::Answered;
                        }
                    }
                }
                LoopState::Acting => {
                    for action in &pending {
                        self.send_event(ReactEvent::ActionRequested {
                            id: action.id.clone(),
                            kind: action.kind.clone(),
                            arguments: action.arguments.clone(),
                        });
                    }

                    let results = if self.config.parallel_dispatch {
                        join_all(pending.iter().map(|a| self.act(a))).await
                    } else {
                        let mut out = Vec::with_capacity(pending.len());
                        for action in &pending {
                            out.push(self.act(action).await);
                        }
                        out
                    };

                    for (action, result) in pending.iter().zip(results) {
                        let observation = result.to_observation();
                        self.send_event(ReactEvent::Observation {
                            id: action.id.clone(),
                            kind: action.kind.clone(),
                            ok: result.is_success(),
                            preview: preview(&observation),
                        });
                        transcript.push_observation(&action.id, observation)?;
                    }
                    pending.clear();
                    state = LoopState::Observing;
                }
                LoopState::Observing => {
                    state = LoopState::Thinking;
                }
                LoopState::Answered => {
                    tracing::info!(steps = step, "answered");
                    self.send_event(ReactEvent::Answered {
                        text: answer.clone(),
                    });
                    return Ok(ReactOutcome {
                        state,
                        answer,
                        steps: step,
                    });
                }
                LoopState::Exhausted => {
                    tracing::info!(steps = step, "iteration limit reached");
                    self.send_event(ReactEvent::Exhausted { steps: step });
                    return Ok(ReactOutcome {
                        state,
                        answer: ITERATION_LIMIT_MESSAGE.to_string(),
                        steps: step,
                    });
                }
            }
        }
    }

    /// 校验 + 分发一个请求；任何失败都变成 Failure 结果
    async fn act(&self, action: &RequestedAction) -> ActionResult {
        match self.schemas.validate_raw(&action.kind, &action.arguments) {
            Ok(request) => self.dispatcher.dispatch(&request).await,
            Err(e) => {
                tracing::warn!(id = %action.id, kind = %action.kind, error = %e, "action rejected");
                ActionResult::failure(action.kind.clone(), e)
            }
        }
    }
}

/// 空或重复的关联 ID 替换为新 ID，保证每个观察都能唯一对应
fn with_unique_ids(actions: Vec<RequestedAction>) -> Vec<RequestedAction> {
    let mut seen = HashSet::new();
    actions
        .into_iter()
        .map(|mut a| {
            if a.id.is_empty() || !seen.insert(a.id.clone()) {
                a.id = format!("call_{}", uuid::Uuid::new_v4().simple());
                seen.insert(a.id.clone());
            }
            a
        })
        .collect()
}

fn preview(s: &str) -> String {
    if s.chars().count() > OBSERVATION_PREVIEW_CHARS {
        format!(
            "{}...",
            s.chars().take(OBSERVATION_PREVIEW_CHARS).collect::<String>()
        )
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::sample_dataset;
    use crate::llm::{LlmError, ScriptedLlmClient};
    use crate::memory::Role;
    use crate::tools::HandlerRegistry;

    fn agent(llm: Arc<ScriptedLlmClient>, max_steps: usize) -> ReactAgent {
        let registry = HandlerRegistry::standard(Arc::new(sample_dataset(150)), llm.clone());
        ReactAgent::new(
            llm,
            ActionSchemaRegistry::default(),
            ActionDispatcher::new(registry, 5),
        )
        .with_config(ReactConfig {
            max_steps,
            parallel_dispatch: true,
        })
    }

    fn start() -> Transcript {
        let mut t = Transcript::with_system("sys");
        t.push(Message::user("question"));
        t
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let llm = Arc::new(ScriptedLlmClient::new().then_answer("42"));
        let result = agent(llm, 20).process_query(start()).await.unwrap();
        assert_eq!(result.state, LoopState::Answered);
        assert_eq!(result.response, "42");
        assert_eq!(result.steps, 1);
        let last = result.messages.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_action_then_answer() {
        let llm = Arc::new(
            ScriptedLlmClient::new()
                .then_action("c1", "count_category", r#"{"category_class":"CANCEL"}"#)
                .then_answer("There are 150 cancellations."),
        );
        let result = agent(llm, 20).process_query(start()).await.unwrap();
        assert_eq!(result.state, LoopState::Answered);
        assert_eq!(result.steps, 2);
        let msgs = result.messages.messages();
        assert_eq!(msgs.len(), 5);
        assert!(msgs[2].is_action_request());
        assert_eq!(msgs[3].in_reply_to.as_deref(), Some("c1"));
        let obs: serde_json::Value = serde_json::from_str(msgs[3].content_str()).unwrap();
        assert_eq!(obs["count"], 150);
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let llm = Arc::new(
            ScriptedLlmClient::new()
                .then_action("c1", "finish", "{}")
                .then_error(LlmError::Api("connection refused".into())),
        );
        let mut transcript = start();
        let err = agent(llm, 20).run(&mut transcript).await.unwrap_err();
        assert!(matches!(err, AgentError::AdapterCommunication(_)));
        // 失败前的 Action 回合与观察仍保留
        assert_eq!(transcript.len(), 4);
    }

    #[tokio::test]
    async fn test_zero_ceiling_exhausts_immediately() {
        let llm = Arc::new(ScriptedLlmClient::new().then_answer("never"));
        let result = agent(llm.clone(), 0).process_query(start()).await.unwrap();
        assert_eq!(result.state, LoopState::Exhausted);
        assert_eq!(result.response, ITERATION_LIMIT_MESSAGE);
        assert_eq!(llm.step_calls(), 0);
    }

    #[tokio::test]
    async fn test_events_emitted() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let llm = Arc::new(
            ScriptedLlmClient::new()
                .then_action("c1", "finish", "{}")
                .then_answer("done"),
        );
        agent(llm, 20)
            .with_event_tx(tx)
            .process_query(start())
            .await
            .unwrap();
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(serde_json::to_value(&ev).unwrap()["type"].as_str().unwrap().to_string());
        }
        assert!(kinds.contains(&"action_requested".to_string()));
        assert!(kinds.contains(&"observation".to_string()));
        assert_eq!(kinds.last().map(String::as_str), Some("answered"));
    }

    #[test]
    fn test_with_unique_ids() {
        let fixed = with_unique_ids(vec![
            RequestedAction::new("a", "finish", "{}"),
            RequestedAction::new("a", "finish", "{}"),
            RequestedAction::new("", "finish", "{}"),
        ]);
        assert_eq!(fixed[0].id, "a");
        assert_ne!(fixed[1].id, "a");
        assert!(!fixed[2].id.is_empty());
        assert_ne!(fixed[1].id, fixed[2].id);
    }

    #[test]
    fn test_terminal_states() {
        assert!(LoopState::Answered.is_terminal());
        assert!(LoopState::Exhausted.is_terminal());
        assert!(!LoopState::Observing.is_terminal());
    }
}
