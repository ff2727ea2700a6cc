//! show_examples：按条件随机展示 N 条记录（或其中一个文本字段）

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::dataset::Dataset;
use crate::tools::registry::unexpected;
use crate::tools::{ActionHandler, ActionKind, ActionRequest};

pub struct ShowExamplesHandler {
    dataset: Arc<Dataset>,
}

impl ShowExamplesHandler {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }
}

#[async_trait]
impl ActionHandler for ShowExamplesHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::ShowExamples
    }

    async fn execute(&self, request: &ActionRequest) -> Result<Value, String> {
        let ActionRequest::ShowExamples(spec) = request else {
            return Err(unexpected(self.kind(), request));
        };
        let rows = self
            .dataset
            .sample(spec.condition.as_ref(), spec.number_rows);
        let examples = rows
            .iter()
            .map(|r| match spec.target_field {
                Some(field) => Ok(Value::String(r.text(field).to_string())),
                None => serde_json::to_value(r),
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;

        Ok(json!({
            "condition": spec.describe_condition(),
            "target_field": spec.target_field.map(|f| f.as_str()),
            "examples": examples,
        }))
    }
}
