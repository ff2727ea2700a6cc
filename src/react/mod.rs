//! 编排层：ReAct 工具调用循环、过程事件、默认 system prompt

pub mod events;
pub mod loop_;
pub mod prompt;

pub use events::ReactEvent;
pub use loop_::{
    LoopState, ReactAgent, ReactConfig, ReactOutcome, ReactResult, DEFAULT_MAX_STEPS,
    ITERATION_LIMIT_MESSAGE,
};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
