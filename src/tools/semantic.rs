//! select_semantic_intent / select_semantic_category
//!
//! 对同一推理后端发起一次嵌套文本调用，把自由描述映射为封闭取值域中的一个标签。
//! 回答不在取值域内时直接返回失败（不重试、不追问），由外层模型决定下一步。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::dataset::{CategoryClass, IntentClass, StructuredField};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::tools::registry::unexpected;
use crate::tools::{ActionHandler, ActionKind, ActionRequest};

pub struct SemanticSelectHandler {
    llm: Arc<dyn LlmClient>,
    field: StructuredField,
}

impl SemanticSelectHandler {
    pub fn intent(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            field: StructuredField::Intent,
        }
    }

    pub fn category(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            field: StructuredField::Category,
        }
    }

    fn prompt(&self, query: &str) -> String {
        format!(
            "Select the single most appropriate {field} for the description below.\n\
             Allowed {field} values: {values}\n\n\
             Description: {query}\n\n\
             Answer with exactly one value from the list and nothing else.",
            field = self.field,
            values = self.field.domain().join(", "),
        )
    }

    fn resolve(&self, answer: &str) -> Option<&'static str> {
        let label = answer
            .trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '.'))
            .trim();
        match self.field {
            StructuredField::Category => CategoryClass::parse_loose(label).map(|c| c.as_str()),
            StructuredField::Intent => IntentClass::parse_loose(label).map(|i| i.as_str()),
        }
    }
}

#[async_trait]
impl ActionHandler for SemanticSelectHandler {
    fn kind(&self) -> ActionKind {
        match self.field {
            StructuredField::Category => ActionKind::SelectSemanticCategory,
            StructuredField::Intent => ActionKind::SelectSemanticIntent,
        }
    }

    async fn execute(&self, request: &ActionRequest) -> Result<Value, String> {
        let query = match (self.field, request) {
            (StructuredField::Intent, ActionRequest::SelectSemanticIntent { query })
            | (StructuredField::Category, ActionRequest::SelectSemanticCategory { query }) => query,
            _ => return Err(unexpected(self.kind(), request)),
        };

        let answer = self
            .llm
            .complete(&[Message::user(self.prompt(query))])
            .await
            .map_err(|e| format!("classification call failed: {e}"))?;

        let selected = self.resolve(&answer).ok_or_else(|| {
            format!(
                "backend answer '{}' is not a valid {}",
                answer.trim(),
                self.field
            )
        })?;

        tracing::debug!(field = %self.field, selected, "semantic selection");
        Ok(json!({
            "field": self.field.as_str(),
            "query": query,
            "selected": selected,
        }))
    }
}
