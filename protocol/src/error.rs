//! 错误类型定义

use thiserror::Error;

use crate::piece::{MoveToken, PieceKind, Player};

/// 对局规则错误
///
/// 所有错误都只影响发起方，不会改变对局状态。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// 棋盘上找不到该棋子（已被吃掉或从未存在）
    #[error("Piece {piece} of player {player} is not on the board")]
    PieceNotFound { player: Player, piece: String },

    /// 该棋子类型不允许此方向
    #[error("Piece kind {kind} cannot move {token}")]
    IllegalMoveToken { kind: PieceKind, token: MoveToken },

    /// 目标位置越界
    #[error("Move leaves the board: ({row}, {col})")]
    OutOfBounds { row: i8, col: i8 },

    /// 目标位置有己方棋子
    #[error("Destination ({row}, {col}) is occupied by your own piece")]
    FriendlyFire { row: u8, col: u8 },

    /// 不是你的回合
    #[error("Not your turn!")]
    NotYourTurn,

    /// 对局已经开始
    #[error("Game has already started")]
    AlreadyStarted,

    /// 对局尚未开始
    #[error("Game has not started yet")]
    NotStarted,

    /// 布阵无效
    #[error("Invalid setup: {reason}")]
    InvalidSetup { reason: String },

    /// 游戏已结束
    #[error("Game is already over")]
    GameOver,
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 协议版本不匹配
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
