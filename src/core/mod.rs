//! 核心层：错误分类与会话

pub mod error;
pub mod session;

pub use error::{ActionError, AgentError, ErrorKind};
pub use session::{exchange_limit_notice, Session, SessionReply, DEFAULT_MAX_EXCHANGES};
