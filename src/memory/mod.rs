//! 对话状态：消息与 transcript

pub mod conversation;

pub use conversation::{Message, RequestedAction, Role, Transcript};
