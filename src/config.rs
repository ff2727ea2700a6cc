//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `ANALYST__*` 覆盖（双下划线表示嵌套，如 `ANALYST__AGENT__MAX_STEPS=30`）。
//! API Key 不进配置文件，由 `OPENAI_API_KEY` 提供。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::AgentError;
use crate::react::ReactConfig;
use crate::tools::ActionLimits;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub actions: ActionsSection,
}

/// [app] 段：应用名、数据集路径
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// `.json`（数组）或 JSON Lines
    pub dataset_path: PathBuf,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            dataset_path: PathBuf::from("data/customer_support.jsonl"),
        }
    }
}

/// [llm] 段：模型、端点、温度与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub base_url: Option<String>,
    /// next_step 温度
    pub temperature: f32,
    /// 摘要 / 语义选择等文本补全的温度
    pub summary_temperature: f32,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            temperature: 0.0,
            summary_temperature: 0.5,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒）
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [agent] 段：两个相互独立的上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// 单次提问内的最大思考轮数
    pub max_steps: usize,
    /// 单个会话内的最大用户交互次数
    pub max_exchanges: usize,
    pub parallel_dispatch: bool,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_steps: 20,
            max_exchanges: 10,
            parallel_dispatch: true,
        }
    }
}

impl AgentSection {
    pub fn react_config(&self) -> ReactConfig {
        ReactConfig {
            max_steps: self.max_steps,
            parallel_dispatch: self.parallel_dispatch,
        }
    }
}

/// [actions] 段：行数默认值 / 上限、Handler 超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActionsSection {
    pub show_examples_default_rows: usize,
    pub show_examples_max_rows: usize,
    pub summarize_default_rows: usize,
    pub summarize_max_rows: usize,
    /// 单次 Handler 调用超时（秒）
    pub handler_timeout_secs: u64,
}

impl Default for ActionsSection {
    fn default() -> Self {
        let limits = ActionLimits::default();
        Self {
            show_examples_default_rows: limits.show_examples_default_rows,
            show_examples_max_rows: limits.show_examples_max_rows,
            summarize_default_rows: limits.summarize_default_rows,
            summarize_max_rows: limits.summarize_max_rows,
            handler_timeout_secs: 30,
        }
    }
}

impl ActionsSection {
    pub fn limits(&self) -> ActionLimits {
        ActionLimits {
            show_examples_default_rows: self.show_examples_default_rows,
            show_examples_max_rows: self.show_examples_max_rows,
            summarize_default_rows: self.summarize_default_rows,
            summarize_max_rows: self.summarize_max_rows,
        }
    }
}

impl AppConfig {
    /// 检查相互依赖的取值
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.agent.max_steps == 0 {
            return Err(AgentError::Config("agent.max_steps must be at least 1".into()));
        }
        if self.agent.max_exchanges == 0 {
            return Err(AgentError::Config("agent.max_exchanges must be at least 1".into()));
        }
        let a = &self.actions;
        if a.show_examples_default_rows == 0 || a.show_examples_default_rows > a.show_examples_max_rows {
            return Err(AgentError::Config(format!(
                "actions.show_examples_default_rows must be within 1..={}",
                a.show_examples_max_rows
            )));
        }
        if a.summarize_default_rows == 0 || a.summarize_default_rows > a.summarize_max_rows {
            return Err(AgentError::Config(format!(
                "actions.summarize_default_rows must be within 1..={}",
                a.summarize_max_rows
            )));
        }
        Ok(())
    }
}

/// 加载并校验配置
///
/// 源的优先级由低到高：默认 TOML（config/default.toml 等候选位置，取第一个存在的）、
/// 命令行指定的文件、`ANALYST__*` 环境变量。缺省的键取各段的 Default。
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, AgentError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!(path = %path.display(), "config file not found, skipping");
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("ANALYST")
            .separator("__")
            .try_parsing(true),
    );

    let cfg: AppConfig = builder
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| AgentError::Config(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}
