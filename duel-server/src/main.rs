use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duel_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("duel_server=debug".parse()?))
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        websocket = %config.websocket.addr(),
        framed = %config.framed.addr(),
        "对战棋服务端启动中..."
    );

    Server::bind(config).await?.run().await
}
