//! ReAct 过程事件：供前端（REPL / Web）展示思考、Action 请求、观察与结果

use serde::Serialize;

/// 单步过程事件（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReactEvent {
    /// 步数更新（当前第几步）
    StepUpdate { step: usize, max_steps: usize },
    /// 正在调用推理后端
    Thinking,
    /// 模型请求了一个 Action
    ActionRequested {
        id: String,
        kind: String,
        arguments: String,
    },
    /// Action 观察（预览，避免过长）
    Observation {
        id: String,
        kind: String,
        ok: bool,
        preview: String,
    },
    /// 终止：得到最终回答
    Answered { text: String },
    /// 终止：达到步数上限
    Exhausted { steps: usize },
    /// 硬错误（推理后端不可达等）
    Error { text: String },
}
