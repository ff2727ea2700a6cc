//! finish：模型声明任务完成，返回固定确认

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::registry::unexpected;
use crate::tools::{ActionHandler, ActionKind, ActionRequest};

pub struct FinishHandler;

#[async_trait]
impl ActionHandler for FinishHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Finish
    }

    async fn execute(&self, request: &ActionRequest) -> Result<Value, String> {
        if !matches!(request, ActionRequest::Finish) {
            return Err(unexpected(self.kind(), request));
        }
        Ok(json!({
            "status": "finished",
            "message": "Task marked as complete. Provide the final answer to the user.",
        }))
    }
}
