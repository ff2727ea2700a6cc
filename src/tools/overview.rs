//! get_dataset_overview：数据集名称、行数、字段说明与各结构化字段的唯一值个数

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::dataset::Dataset;
use crate::tools::registry::unexpected;
use crate::tools::{ActionHandler, ActionKind, ActionRequest};

pub struct DatasetOverviewHandler {
    dataset: Arc<Dataset>,
}

impl DatasetOverviewHandler {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }
}

#[async_trait]
impl ActionHandler for DatasetOverviewHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::GetDatasetOverview
    }

    async fn execute(&self, request: &ActionRequest) -> Result<Value, String> {
        if !matches!(request, ActionRequest::GetDatasetOverview) {
            return Err(unexpected(self.kind(), request));
        }
        serde_json::to_value(self.dataset.overview()).map_err(|e| e.to_string())
    }
}
