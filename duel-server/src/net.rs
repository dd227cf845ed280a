//! 网络层
//!
//! 同时监听 WebSocket 和分帧 TCP 两种传输。每个连接一个读任务和一个写任务；
//! 所有读到的消息汇入同一个事件通道，由唯一的事件循环按顺序处理，
//! 因此对局状态不需要加锁。

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};

use protocol::{
    Connection, FrameReader, FrameWriter, Listener, PeerId, ProtocolError, ServerMessage,
    TcpConnection, TcpListener,
};

use crate::config::ServerConfig;
use crate::server::{MessageHandler, ServerState};

/// 事件通道容量
const EVENT_QUEUE_CAPACITY: usize = 256;

type WsStream = WebSocketStream<TcpStream>;

/// 读任务发往事件循环的事件
#[derive(Debug)]
pub enum ServerEvent {
    /// 新连接
    Connected {
        peer: PeerId,
        addr: Option<String>,
        tx: mpsc::Sender<ServerMessage>,
    },
    /// 收到一条消息体
    Message { peer: PeerId, payload: Vec<u8> },
    /// 连接断开
    Disconnected { peer: PeerId },
}

/// 连接使用的传输方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// 一条 WebSocket 文本消息对应一条 JSON 协议消息
    WebSocket,
    /// 版本 + 长度前缀的 JSON 帧
    Framed,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::WebSocket => write!(f, "websocket"),
            Transport::Framed => write!(f, "framed"),
        }
    }
}

/// 对战服务器
pub struct Server {
    websocket: TcpListener,
    framed: TcpListener,
    config: ServerConfig,
}

impl Server {
    /// 绑定两个监听地址
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        let websocket = bind_listener(&config.websocket.addr()).await?;
        let framed = bind_listener(&config.framed.addr()).await?;
        Ok(Self {
            websocket,
            framed,
            config,
        })
    }

    /// WebSocket 实际监听地址（端口为 0 时由系统分配）
    pub fn websocket_addr(&self) -> Option<String> {
        self.websocket.local_addr()
    }

    /// 分帧 TCP 实际监听地址
    pub fn framed_addr(&self) -> Option<String> {
        self.framed.local_addr()
    }

    /// 运行服务器，直到监听失败
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(
            websocket = ?self.websocket_addr(),
            framed = ?self.framed_addr(),
            "服务器已启动"
        );

        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        tokio::spawn(event_loop(ServerState::default(), events_rx));

        let active = Arc::new(AtomicUsize::new(0));
        let mut next_id: PeerId = 1;

        loop {
            let (accepted, transport) = tokio::select! {
                res = self.websocket.accept_stream() => (res, Transport::WebSocket),
                res = self.framed.accept_stream() => (res, Transport::Framed),
            };
            let stream = match accepted {
                Ok(stream) => stream,
                Err(ProtocolError::Io(e)) => {
                    warn!(%transport, error = %e, "接受连接失败");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if active.load(Ordering::SeqCst) >= self.config.max_connections {
                warn!(max = self.config.max_connections, "连接数已达上限，拒绝连接");
                drop(stream);
                continue;
            }

            let peer = next_id;
            next_id += 1;
            active.fetch_add(1, Ordering::SeqCst);

            let events = events_tx.clone();
            let active = Arc::clone(&active);
            let queue = self.config.outbound_queue;
            tokio::spawn(async move {
                let result = match transport {
                    Transport::WebSocket => serve_websocket(peer, stream, events, queue).await,
                    Transport::Framed => serve_framed(peer, stream, events, queue).await,
                };
                if let Err(e) = result {
                    warn!(peer, %transport, error = %e, "连接异常结束");
                }
                active.fetch_sub(1, Ordering::SeqCst);
            });
        }
    }
}

async fn bind_listener(addr: &str) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("无法监听 {addr}"))
}

/// 事件循环：串行处理所有连接的事件
pub async fn event_loop(mut state: ServerState, mut events: mpsc::Receiver<ServerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ServerEvent::Connected { peer, addr, tx } => {
                info!(peer, ?addr, "新连接");
                state.outbox.register(peer, addr, tx);
                MessageHandler::handle_connect(&mut state, peer);
            }
            ServerEvent::Message { peer, payload } => {
                MessageHandler::handle_payload(&mut state, peer, &payload);
            }
            ServerEvent::Disconnected { peer } => {
                state.drop_peer(peer);
            }
        }
    }
    debug!("事件通道已关闭，事件循环退出");
}

/// 通知事件循环有新连接
async fn announce(
    events: &mpsc::Sender<ServerEvent>,
    peer: PeerId,
    addr: Option<String>,
    tx: mpsc::Sender<ServerMessage>,
) -> anyhow::Result<()> {
    events
        .send(ServerEvent::Connected { peer, addr, tx })
        .await
        .context("事件循环已停止")
}

/// 处理分帧 TCP 连接：启动写任务，当前任务负责读
async fn serve_framed(
    peer: PeerId,
    stream: TcpStream,
    events: mpsc::Sender<ServerEvent>,
    queue: usize,
) -> anyhow::Result<()> {
    let conn = TcpConnection::from_stream(stream)?;
    let addr = conn.peer_addr();
    let (reader, writer) = conn.split();

    let (tx, rx) = mpsc::channel(queue);
    tokio::spawn(framed_write_loop(peer, writer, rx));
    announce(&events, peer, addr, tx).await?;

    let result = framed_read_loop(peer, reader, &events).await;

    // 即使读出错也要通知事件循环移除连接
    let _ = events.send(ServerEvent::Disconnected { peer }).await;
    result
}

async fn framed_read_loop<R>(
    peer: PeerId,
    mut reader: FrameReader<R>,
    events: &mpsc::Sender<ServerEvent>,
) -> anyhow::Result<()>
where
    R: tokio::io::AsyncRead + Unpin + Send,
{
    loop {
        let payload = match reader.read_raw().await {
            Ok(payload) => payload.to_vec(),
            Err(ProtocolError::ConnectionClosed) => {
                debug!(peer, "对端关闭连接");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        events
            .send(ServerEvent::Message { peer, payload })
            .await
            .context("事件循环已停止")?;
    }
}

async fn framed_write_loop<W>(
    peer: PeerId,
    mut writer: FrameWriter<W>,
    mut rx: mpsc::Receiver<ServerMessage>,
) where
    W: tokio::io::AsyncWrite + Unpin + Send,
{
    while let Some(msg) = rx.recv().await {
        if let Err(e) = writer.write_frame(&msg).await {
            error!(peer, error = %e, "发送消息失败");
            break;
        }
    }
    let _ = writer.shutdown().await;
}

/// 处理 WebSocket 连接：握手完成后与分帧连接走同一套事件
async fn serve_websocket(
    peer: PeerId,
    stream: TcpStream,
    events: mpsc::Sender<ServerEvent>,
    queue: usize,
) -> anyhow::Result<()> {
    stream.set_nodelay(true)?;
    let addr = stream.peer_addr().ok().map(|a| a.to_string());
    let ws = tokio_tungstenite::accept_async(stream)
        .await
        .context("WebSocket 握手失败")?;
    let (sink, source) = ws.split();

    let (tx, rx) = mpsc::channel(queue);
    tokio::spawn(ws_write_loop(peer, sink, rx));
    announce(&events, peer, addr, tx).await?;

    let result = ws_read_loop(peer, source, &events).await;

    let _ = events.send(ServerEvent::Disconnected { peer }).await;
    result
}

async fn ws_read_loop(
    peer: PeerId,
    mut source: SplitStream<WsStream>,
    events: &mpsc::Sender<ServerEvent>,
) -> anyhow::Result<()> {
    while let Some(frame) = source.next().await {
        let payload = match frame {
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Close(_)) => break,
            // ping/pong 由 tungstenite 自动应答
            Ok(_) => continue,
            Err(WsError::ConnectionClosed) => break,
            Err(e) => return Err(e.into()),
        };
        events
            .send(ServerEvent::Message { peer, payload })
            .await
            .context("事件循环已停止")?;
    }
    debug!(peer, "对端关闭 WebSocket");
    Ok(())
}

async fn ws_write_loop(
    peer: PeerId,
    mut sink: SplitSink<WsStream, Message>,
    mut rx: mpsc::Receiver<ServerMessage>,
) {
    while let Some(msg) = rx.recv().await {
        let text = match serde_json::to_string(&msg) {
            Ok(text) => text,
            Err(e) => {
                error!(peer, error = %e, "消息序列化失败");
                continue;
            }
        };
        if let Err(e) = sink.send(Message::text(text)).await {
            error!(peer, error = %e, "发送消息失败");
            break;
        }
    }
    let _ = sink.close().await;
}
