//! 消息类型定义
//!
//! 所有消息以 JSON 编码，`type` 字段区分消息类型。

use serde::{Deserialize, Serialize};

use crate::piece::{MoveToken, PlacedPiece, Player};

/// 连接 ID（由传输层分配）
pub type PeerId = u64;

/// 对局阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// 等待 start
    NotStarted,
    /// 对局进行中
    InProgress,
    /// 对局结束
    Finished,
}

/// 双方的布阵名单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rosters {
    #[serde(rename = "A")]
    pub a: Vec<String>,
    #[serde(rename = "B")]
    pub b: Vec<String>,
}

/// 完整的对局快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// N×N，空格为 null，棋子为 `"A-P1"`
    pub board: Vec<Vec<Option<PlacedPiece>>>,
    pub players: Rosters,
    pub current_player: Player,
    pub phase: Phase,
    pub winner: Option<Player>,
}

/// 客户端发送给服务端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// 开局布阵
    #[serde(rename_all = "camelCase")]
    Start {
        setup_a: Vec<String>,
        setup_b: Vec<String>,
    },
    /// 走棋
    Move {
        player: Player,
        piece: String,
        #[serde(rename = "move")]
        token: MoveToken,
    },
    /// 无法识别的消息类型，服务端忽略
    #[serde(other)]
    Unknown,
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// 新连接的初始快照
    Init { state: SessionSnapshot },
    /// 状态更新（广播）
    Update { state: SessionSnapshot },
    /// 错误（仅发给发起方）
    Error { message: String },
    /// 游戏结束（广播）
    GameOver { winner: Player },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
