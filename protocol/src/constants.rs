//! 协议常量定义

use std::time::Duration;

/// 协议版本号（帧头第一个字节）
pub const PROTOCOL_VERSION: u8 = 1;

/// 棋盘边长（N×N）
pub const BOARD_SIZE: usize = 5;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;

/// 服务端最大连接数
pub const MAX_CONNECTIONS: usize = 100;

/// 每个连接的待发送消息队列容量
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// 默认监听地址
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// 默认监听端口（WebSocket）
pub const DEFAULT_PORT: u16 = 8080;

/// 默认分帧 TCP 端口
pub const DEFAULT_FRAMED_PORT: u16 = 8081;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);
