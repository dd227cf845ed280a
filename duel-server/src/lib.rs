//! 对战棋服务端
//!
//! 包含:
//! - 对局状态机
//! - 消息分发
//! - 连接管理
//! - 网络事件循环
//! - 配置

pub mod config;
pub mod net;
pub mod peer;
pub mod server;
pub mod session;

pub use config::{ConfigError, ServerConfig};
pub use net::{Server, ServerEvent};
pub use peer::{Outbox, Peer, PeerManager};
pub use server::{MessageHandler, ServerState};
pub use session::{GameSession, SessionPhase};
