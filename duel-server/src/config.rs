//! 服务端配置
//!
//! 默认值来自 protocol 常量，可通过环境变量覆盖：
//! `DUEL_HOST`、`DUEL_PORT`（WebSocket）、`DUEL_FRAMED_PORT`（分帧 TCP）、
//! `DUEL_MAX_CONNECTIONS`。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use protocol::{NetworkConfig, DEFAULT_FRAMED_PORT, MAX_CONNECTIONS, OUTBOUND_QUEUE_CAPACITY};

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 环境变量的值无法解析
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// 服务端配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// WebSocket 监听地址，每条文本消息是一条 JSON 协议消息
    pub websocket: NetworkConfig,
    /// 分帧 TCP 监听地址
    pub framed: NetworkConfig,
    /// 同时在线的连接上限
    pub max_connections: usize,
    /// 每个连接的待发送队列容量
    pub outbound_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            websocket: NetworkConfig::default(),
            framed: NetworkConfig {
                port: DEFAULT_FRAMED_PORT,
                ..NetworkConfig::default()
            },
            max_connections: MAX_CONNECTIONS,
            outbound_queue: OUTBOUND_QUEUE_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// 从进程环境变量读取
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取，未设置的键使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("DUEL_HOST") {
            config.websocket.host = host.clone();
            config.framed.host = host;
        }
        if let Some(port) = lookup("DUEL_PORT") {
            config.websocket.port = parse("DUEL_PORT", port)?;
        }
        if let Some(port) = lookup("DUEL_FRAMED_PORT") {
            config.framed.port = parse("DUEL_FRAMED_PORT", port)?;
        }
        if let Some(max) = lookup("DUEL_MAX_CONNECTIONS") {
            config.max_connections = parse("DUEL_MAX_CONNECTIONS", max)?;
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.websocket.addr(), "127.0.0.1:8080");
        assert_eq!(config.framed.addr(), "127.0.0.1:8081");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("DUEL_HOST", "0.0.0.0"),
            ("DUEL_PORT", "9000"),
            ("DUEL_FRAMED_PORT", "9001"),
            ("DUEL_MAX_CONNECTIONS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.websocket.addr(), "0.0.0.0:9000");
        assert_eq!(config.framed.addr(), "0.0.0.0:9001");
        assert_eq!(config.max_connections, 2);
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup(&[("DUEL_PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "DUEL_PORT",
                value: "eighty".to_string()
            }
        );
    }
}
