//! 连接管理
//!
//! 每个连接对应一个有界发送队列，由独立的写任务负责落到网络上。

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tracing::warn;

use protocol::{PeerId, ServerMessage};

/// 消息出口：发给单个连接或广播给全部连接
///
/// 所有发送都是尽力而为，不等待确认、不重试。
pub trait Outbox {
    /// 发送给指定连接
    fn send_to(&mut self, peer: PeerId, msg: ServerMessage);

    /// 广播给所有连接
    fn broadcast(&mut self, msg: ServerMessage);
}

/// 单个连接
#[derive(Debug)]
pub struct Peer {
    pub id: PeerId,
    pub addr: Option<String>,
    tx: mpsc::Sender<ServerMessage>,
}

/// 连接管理器
pub struct PeerManager {
    /// 连接 ID -> 连接（有序，保证广播顺序稳定）
    peers: BTreeMap<PeerId, Peer>,
}

impl PeerManager {
    pub fn new() -> Self {
        Self {
            peers: BTreeMap::new(),
        }
    }

    /// 注册连接
    pub fn register(&mut self, id: PeerId, addr: Option<String>, tx: mpsc::Sender<ServerMessage>) {
        self.peers.insert(id, Peer { id, addr, tx });
    }

    /// 移除连接
    pub fn remove(&mut self, id: PeerId) -> Option<Peer> {
        self.peers.remove(&id)
    }

    /// 当前连接数
    pub fn count(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    fn deliver(peer: &Peer, msg: ServerMessage) {
        if let Err(e) = peer.tx.try_send(msg) {
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!(peer = peer.id, "发送队列已满，丢弃消息");
                }
                mpsc::error::TrySendError::Closed(_) => {
                    warn!(peer = peer.id, "连接已关闭，丢弃消息");
                }
            }
        }
    }
}

impl Default for PeerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Outbox for PeerManager {
    fn send_to(&mut self, peer: PeerId, msg: ServerMessage) {
        if let Some(peer) = self.peers.get(&peer) {
            Self::deliver(peer, msg);
        }
    }

    fn broadcast(&mut self, msg: ServerMessage) {
        for peer in self.peers.values() {
            Self::deliver(peer, msg.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Player;

    #[tokio::test]
    async fn test_send_and_broadcast() {
        let mut manager = PeerManager::new();
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        manager.register(1, None, tx1);
        manager.register(2, Some("127.0.0.1:5000".to_string()), tx2);
        assert_eq!(manager.count(), 2);

        manager.send_to(1, ServerMessage::error("only you"));
        manager.broadcast(ServerMessage::GameOver { winner: Player::A });

        assert_eq!(rx1.recv().await, Some(ServerMessage::error("only you")));
        assert_eq!(rx1.recv().await, Some(ServerMessage::GameOver { winner: Player::A }));
        assert_eq!(rx2.recv().await, Some(ServerMessage::GameOver { winner: Player::A }));
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn test_full_or_closed_queue_is_dropped() {
        let mut manager = PeerManager::new();
        let (tx1, mut rx1) = mpsc::channel(1);
        let (tx2, rx2) = mpsc::channel(1);
        manager.register(1, None, tx1);
        manager.register(2, None, tx2);
        drop(rx2);

        manager.broadcast(ServerMessage::error("first"));
        manager.broadcast(ServerMessage::error("second"));

        assert_eq!(rx1.try_recv().ok(), Some(ServerMessage::error("first")));
        assert!(rx1.try_recv().is_err());
    }

    #[test]
    fn test_remove() {
        let mut manager = PeerManager::new();
        let (tx, _rx) = mpsc::channel(1);
        manager.register(7, None, tx);
        assert_eq!(manager.count(), 1);
        assert!(manager.remove(7).is_some());
        assert!(manager.remove(7).is_none());
        assert!(manager.is_empty());
        // 向已移除的连接发送是空操作
        manager.send_to(7, ServerMessage::error("gone"));
    }
}
