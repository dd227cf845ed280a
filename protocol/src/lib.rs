//! 对战棋共享协议库
//!
//! 包含:
//! - 棋子、棋盘、位置等核心数据结构
//! - 走法验证与吃子结算（规则引擎）
//! - 消息类型定义 (ClientMessage, ServerMessage)
//! - 传输层抽象 (Connector, Connection, Listener traits)
//! - 帧编解码（JSON 消息体）

mod board;
mod constants;
mod error;
mod message;
mod moves;
mod piece;
mod transport;

pub use board::Board;
pub use constants::*;
pub use error::{GameError, ProtocolError, Result};
pub use message::{ClientMessage, PeerId, Phase, Rosters, ServerMessage, SessionSnapshot};
pub use moves::{resolve_delta, ResolvedMove, RuleEngine};
pub use piece::{MoveToken, PieceId, PieceKind, PlacedPiece, Player, Position};
pub use transport::{
    Connection, Connector, Listener,
    TcpConnection, TcpConnector, TcpListener,
    NetworkConfig,
    FrameReader, FrameWriter,
};
