//! count_intent / count_category：统计匹配所选取值的记录数

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::dataset::{Condition, Dataset};
use crate::tools::registry::unexpected;
use crate::tools::{ActionHandler, ActionKind, ActionRequest};

/// 同一实现服务两个种类，由构造函数决定
pub struct CountHandler {
    dataset: Arc<Dataset>,
    kind: ActionKind,
}

impl CountHandler {
    pub fn intent(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            kind: ActionKind::CountIntent,
        }
    }

    pub fn category(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            kind: ActionKind::CountCategory,
        }
    }
}

#[async_trait]
impl ActionHandler for CountHandler {
    fn kind(&self) -> ActionKind {
        self.kind
    }

    async fn execute(&self, request: &ActionRequest) -> Result<Value, String> {
        let condition = match (self.kind, request) {
            (ActionKind::CountIntent, ActionRequest::CountIntent { intent_class }) => {
                Condition::Intent(*intent_class)
            }
            (ActionKind::CountCategory, ActionRequest::CountCategory { category_class }) => {
                Condition::Category(*category_class)
            }
            _ => return Err(unexpected(self.kind, request)),
        };
        Ok(json!({
            "selected": condition.value(),
            "count": self.dataset.count(Some(&condition)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::sample_dataset;
    use crate::dataset::{CategoryClass, IntentClass};

    #[tokio::test]
    async fn test_count_category() {
        let handler = CountHandler::category(Arc::new(sample_dataset(150)));
        let out = handler
            .execute(&ActionRequest::CountCategory {
                category_class: CategoryClass::Cancel,
            })
            .await
            .unwrap();
        assert_eq!(out, json!({ "selected": "CANCEL", "count": 150 }));
    }

    #[tokio::test]
    async fn test_count_intent_zero() {
        let handler = CountHandler::intent(Arc::new(sample_dataset(10)));
        let out = handler
            .execute(&ActionRequest::CountIntent {
                intent_class: IntentClass::TrackOrder,
            })
            .await
            .unwrap();
        assert_eq!(out["count"], 0);
        assert_eq!(out["selected"], "track_order");
    }

    #[tokio::test]
    async fn test_kind_mismatch() {
        let handler = CountHandler::intent(Arc::new(sample_dataset(1)));
        let err = handler
            .execute(&ActionRequest::CountCategory {
                category_class: CategoryClass::Cancel,
            })
            .await
            .unwrap_err();
        assert!(err.contains("count_intent"));
    }
}
