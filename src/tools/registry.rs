//! Handler 注册表
//!
//! 每个 Action 种类恰好对应一个 Handler（实现 ActionHandler），启动时构建一次，之后只读。
//! 新增 Action 只需新增一个注册项，不需要扩展条件分支。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::dataset::Dataset;
use crate::llm::LlmClient;
use crate::tools::arithmetic::{DivisionHandler, MultiplicationHandler, SumValuesHandler};
use crate::tools::count::CountHandler;
use crate::tools::examples::ShowExamplesHandler;
use crate::tools::finish::FinishHandler;
use crate::tools::overview::DatasetOverviewHandler;
use crate::tools::semantic::SemanticSelectHandler;
use crate::tools::summarize::SummarizeTextHandler;
use crate::tools::{ActionKind, ActionRequest};

/// Handler trait：声明负责的种类，并对校验后的请求执行（结果为结构化 JSON）
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn kind(&self) -> ActionKind;

    /// 执行；失败返回人类可读的原因
    async fn execute(&self, request: &ActionRequest) -> Result<Value, String>;
}

/// 请求种类与 Handler 不符时的统一错误
pub(crate) fn unexpected(handler: ActionKind, request: &ActionRequest) -> String {
    format!(
        "handler for {} received a {} request",
        handler,
        request.kind()
    )
}

/// 种类 -> Handler 的固定映射
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ActionKind, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 Handler；同一种类重复注册时后者覆盖前者
    pub fn register(&mut self, handler: impl ActionHandler + 'static) {
        self.handlers.insert(handler.kind(), Arc::new(handler));
    }

    /// 标准 11 个 Handler：数据集与 LLM 通过参数注入
    pub fn standard(dataset: Arc<Dataset>, llm: Arc<dyn LlmClient>) -> Self {
        let mut registry = Self::new();
        registry.register(DatasetOverviewHandler::new(dataset.clone()));
        registry.register(SemanticSelectHandler::intent(llm.clone()));
        registry.register(SemanticSelectHandler::category(llm.clone()));
        registry.register(CountHandler::intent(dataset.clone()));
        registry.register(CountHandler::category(dataset.clone()));
        registry.register(SumValuesHandler);
        registry.register(MultiplicationHandler);
        registry.register(DivisionHandler);
        registry.register(ShowExamplesHandler::new(dataset.clone()));
        registry.register(SummarizeTextHandler::new(dataset, llm));
        registry.register(FinishHandler);
        registry
    }

    pub fn get(&self, kind: ActionKind) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        ActionKind::ALL
            .iter()
            .copied()
            .filter(|k| self.handlers.contains_key(k))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::sample_dataset;
    use crate::llm::ScriptedLlmClient;

    #[test]
    fn test_standard_covers_every_kind() {
        let registry = HandlerRegistry::standard(
            Arc::new(sample_dataset(1)),
            Arc::new(ScriptedLlmClient::new()),
        );
        assert_eq!(registry.len(), 11);
        assert_eq!(registry.kinds(), ActionKind::ALL.to_vec());
        for kind in ActionKind::ALL {
            assert_eq!(registry.get(kind).map(|h| h.kind()), Some(kind));
        }
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = HandlerRegistry::new();
        registry.register(FinishHandler);
        registry.register(FinishHandler);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(ActionKind::SumValues).is_none());
    }
}
