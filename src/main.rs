//! # Translator Key Proxy 主程序
//!
//! 加载配置、组装转发引擎并启动HTTP服务

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use translator_key_proxy::{
    Result,
    config::{AppConfig, ConfigManager},
    lerror, linfo,
    logging::{self, LogComponent, LogStage},
    proxy::ForwardingEngine,
    server::ProxyServer,
};

/// 命令行参数，优先级高于配置文件与环境变量
#[derive(Debug, Parser)]
#[command(name = "translator-key-proxy", version, about)]
struct Cli {
    /// TOML 配置文件路径
    #[arg(short, long, env = "TRANSLATOR_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// 监听地址
    #[arg(long)]
    host: Option<String>,

    /// 监听端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 日志级别（`RUST_LOG` 存在时以其为准）
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref());

    if let Err(e) = run(&cli).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:?}")
        );
        std::process::exit(1);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = ConfigManager::new(cli.config.clone()).load()?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let engine = Arc::new(ForwardingEngine::from_config(&config)?);
    let server = ProxyServer::new(&config, engine)?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        "服务启动",
        addr = %server.addr()
    );
    server.serve(shutdown_signal()).await?;
    Ok(())
}

/// 等待 Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lerror!(
            "system",
            LogStage::Shutdown,
            LogComponent::Main,
            "signal_listen_failed",
            &format!("Failed to listen for shutdown signal: {e}")
        );
        std::future::pending::<()>().await;
    }
    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "shutdown_signal",
        "Shutdown signal received, draining connections"
    );
}
