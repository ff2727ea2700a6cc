//! Analyst - 面向客服数据集的数据分析智能体
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、会话（交互计数与 active 标志）
//! - **dataset**: 记录、封闭取值域、条件过滤与抽样、加载
//! - **llm**: 推理后端抽象与实现（OpenAI 兼容 / 脚本化 Mock）
//! - **memory**: 消息与 transcript
//! - **observability**: tracing 初始化
//! - **react**: ReAct 工具调用循环与事件
//! - **tools**: Action Schema 校验、Handler 注册表、分发器与 11 个 Handler

pub mod config;
pub mod core;
pub mod dataset;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
pub mod tools;
