//! 数据访问层：只读客服数据集
//!
//! 进程启动时加载一次，之后以 `Arc<Dataset>` 注入各 Handler；所有查询均为只读，可并发调用。

pub mod fields;
pub mod loader;

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use fields::{CategoryClass, Condition, IntentClass, StructuredField, TextField};
pub use loader::load_dataset;

/// 单条记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// 客服领域的用户请求
    pub instruction: String,
    pub category: String,
    pub intent: String,
    /// 虚拟助手的示例回复
    pub response: String,
}

impl Record {
    pub fn new(
        instruction: impl Into<String>,
        category: impl Into<String>,
        intent: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            category: category.into(),
            intent: intent.into(),
            response: response.into(),
        }
    }

    pub fn structured(&self, field: StructuredField) -> &str {
        match field {
            StructuredField::Category => &self.category,
            StructuredField::Intent => &self.intent,
        }
    }

    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::Instruction => &self.instruction,
            TextField::Response => &self.response,
        }
    }
}

/// 数据集概览（get_dataset_overview 的结果）
#[derive(Debug, Clone, Serialize)]
pub struct DatasetOverview {
    pub name: String,
    pub row_count: usize,
    pub fields: BTreeMap<&'static str, &'static str>,
    pub unique_values: BTreeMap<&'static str, usize>,
}

/// 不可变数据集
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn matching(&self, condition: Option<&Condition>) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| condition.map_or(true, |c| c.matches(r)))
            .collect()
    }

    pub fn count(&self, condition: Option<&Condition>) -> usize {
        match condition {
            Some(c) => self.records.iter().filter(|r| c.matches(r)).count(),
            None => self.records.len(),
        }
    }

    /// 不放回随机抽样；匹配行数不足 n 时返回全部匹配行
    pub fn sample(&self, condition: Option<&Condition>, n: usize) -> Vec<Record> {
        self.sample_with(condition, n, &mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng + ?Sized>(
        &self,
        condition: Option<&Condition>,
        n: usize,
        rng: &mut R,
    ) -> Vec<Record> {
        self.matching(condition)
            .choose_multiple(rng, n)
            .map(|r| (*r).clone())
            .collect()
    }

    pub fn unique_values(&self, field: StructuredField) -> usize {
        self.records
            .iter()
            .map(|r| r.structured(field))
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn overview(&self) -> DatasetOverview {
        let fields = BTreeMap::from([
            ("instruction", "a user request from the Customer Service domain"),
            ("category", "the high-level semantic category for the intent"),
            ("intent", "the intent corresponding to the user instruction"),
            ("response", "an example expected response from the virtual assistant"),
        ]);
        let unique_values = StructuredField::ALL
            .iter()
            .map(|f| (f.as_str(), self.unique_values(*f)))
            .collect();
        DatasetOverview {
            name: self.name.clone(),
            row_count: self.records.len(),
            fields,
            unique_values,
        }
    }
}
