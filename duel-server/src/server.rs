//! 服务器主逻辑
//!
//! 把客户端消息翻译成对局调用，再把结果发回去。本身不包含任何规则。

use tracing::{debug, info, warn};

use protocol::{ClientMessage, GameError, MoveToken, PeerId, Player, ServerMessage};

use crate::peer::{Outbox, PeerManager};
use crate::session::{GameSession, SessionPhase};

/// 服务器状态：唯一的对局 + 消息出口
pub struct ServerState<O: Outbox = PeerManager> {
    pub session: GameSession,
    pub outbox: O,
}

impl<O: Outbox> ServerState<O> {
    pub fn new(outbox: O) -> Self {
        Self {
            session: GameSession::new(),
            outbox,
        }
    }
}

impl ServerState<PeerManager> {
    /// 移除连接；最后一个连接离开时丢弃当前对局
    pub fn drop_peer(&mut self, peer: PeerId) {
        if let Some(removed) = self.outbox.remove(peer) {
            info!(peer, addr = ?removed.addr, remaining = self.outbox.count(), "连接断开");
        }
        if self.outbox.is_empty() && self.session.phase() != SessionPhase::NotStarted {
            info!("所有连接已断开，重置对局");
            self.session = GameSession::new();
        }
    }
}

impl Default for ServerState<PeerManager> {
    fn default() -> Self {
        Self::new(PeerManager::new())
    }
}

/// 消息处理器
pub struct MessageHandler;

impl MessageHandler {
    /// 新连接：只给它发送当前快照
    pub fn handle_connect<O: Outbox>(state: &mut ServerState<O>, peer: PeerId) {
        let snapshot = state.session.snapshot();
        state.outbox.send_to(peer, ServerMessage::Init { state: snapshot });
    }

    /// 处理一帧原始消息体，无法解析时回复错误而不是中断连接
    pub fn handle_payload<O: Outbox>(state: &mut ServerState<O>, peer: PeerId, payload: &[u8]) {
        match serde_json::from_slice::<ClientMessage>(payload) {
            Ok(msg) => Self::handle(state, peer, msg),
            Err(e) => {
                warn!(peer, error = %e, "无法解析的消息");
                state
                    .outbox
                    .send_to(peer, ServerMessage::error(format!("Malformed message: {e}")));
            }
        }
    }

    /// 处理客户端消息
    pub fn handle<O: Outbox>(state: &mut ServerState<O>, peer: PeerId, msg: ClientMessage) {
        let result = match msg {
            ClientMessage::Start { setup_a, setup_b } => {
                Self::handle_start(state, setup_a, setup_b)
            }
            ClientMessage::Move {
                player,
                piece,
                token,
            } => Self::handle_move(state, player, &piece, token),
            ClientMessage::Unknown => {
                debug!(peer, "忽略未知类型的消息");
                Ok(())
            }
        };

        if let Err(e) = result {
            debug!(peer, error = %e, "操作被拒绝");
            state.outbox.send_to(peer, ServerMessage::error(e.to_string()));
        }
    }

    /// 处理开局
    fn handle_start<O: Outbox>(
        state: &mut ServerState<O>,
        setup_a: Vec<String>,
        setup_b: Vec<String>,
    ) -> Result<(), GameError> {
        state.session.start(setup_a, setup_b)?;
        let snapshot = state.session.snapshot();
        state.outbox.broadcast(ServerMessage::Update { state: snapshot });
        Ok(())
    }

    /// 处理走棋
    ///
    /// 协议信任消息中的 `player` 字段，任何连接都可以代表任意一方走棋。
    fn handle_move<O: Outbox>(
        state: &mut ServerState<O>,
        player: Player,
        piece: &str,
        token: MoveToken,
    ) -> Result<(), GameError> {
        state.session.apply_move(player, piece, token)?;

        let snapshot = state.session.snapshot();
        state.outbox.broadcast(ServerMessage::Update { state: snapshot });

        if let Some(winner) = state.session.winner() {
            state.outbox.broadcast(ServerMessage::GameOver { winner });
        }
        Ok(())
    }
}
