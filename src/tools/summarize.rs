//! summarize_text：按条件抽样 N 条文本，请推理后端概括其主要主题

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::dataset::{Dataset, TextField};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::tools::registry::unexpected;
use crate::tools::{ActionHandler, ActionKind, ActionRequest};

pub struct SummarizeTextHandler {
    dataset: Arc<Dataset>,
    llm: Arc<dyn LlmClient>,
}

impl SummarizeTextHandler {
    pub fn new(dataset: Arc<Dataset>, llm: Arc<dyn LlmClient>) -> Self {
        Self { dataset, llm }
    }
}

fn summary_prompt(lines: &[&str]) -> String {
    let text = lines
        .iter()
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Here is a list of messages:\n{text}\n\nProvide a brief summary of the main themes they raise:"
    )
}

#[async_trait]
impl ActionHandler for SummarizeTextHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::SummarizeText
    }

    async fn execute(&self, request: &ActionRequest) -> Result<Value, String> {
        let ActionRequest::SummarizeText(spec) = request else {
            return Err(unexpected(self.kind(), request));
        };
        let field = spec.target_field.unwrap_or(TextField::Instruction);
        let rows = self
            .dataset
            .sample(spec.condition.as_ref(), spec.number_rows);
        if rows.is_empty() {
            return Err(format!("no rows match {}", spec.describe_condition()));
        }

        let lines: Vec<&str> = rows.iter().map(|r| r.text(field)).collect();
        let summary = self
            .llm
            .complete(&[Message::user(summary_prompt(&lines))])
            .await
            .map_err(|e| format!("summary call failed: {e}"))?;

        Ok(json!({
            "condition": spec.describe_condition(),
            "text_field": field.as_str(),
            "sample_size": rows.len(),
            "summary": summary,
        }))
    }
}
