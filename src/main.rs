//! Manim Solver - 数理解题终端客户端
//!
//! 入口：加载配置、初始化日志、创建后端与面板编排器，并运行 TUI 主循环。

use std::sync::Arc;

use anyhow::Context;
use manim_solver::{
    config::{load_config, AppConfig},
    core::{create_backend, create_panel, ShutdownManager},
    observability,
    ui::run_app,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (cfg, config_err) = match load_config(None) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // 日志写文件：TUI 占用 stdout
    observability::init(&cfg.log).context("Failed to initialise logging")?;
    if let Some(e) = config_err {
        tracing::warn!("Config load failed ({}), using defaults", e);
    }

    let backend = create_backend(&cfg.backend).context("Failed to create solver backend")?;

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    // 编排器在 shutdown token 取消时放弃在途请求
    let (cmd_tx, state_rx) = create_panel(backend, shutdown.token());

    let result = run_app(state_rx, cmd_tx, &cfg.ui, shutdown.clone()).await;
    match shutdown.reason() {
        Some(reason) => tracing::info!("Exiting: {:?}", reason),
        None => tracing::info!("Exiting"),
    }
    result.context("App run failed")?;

    Ok(())
}
