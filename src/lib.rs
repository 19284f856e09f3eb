//! Manim Solver - 数理解题终端客户端
//!
//! 模块划分：
//! - **client**: 生成服务客户端（线上格式、SolverBackend 抽象、HTTP / Mock 实现）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、面板状态机、编排器、关闭信号
//! - **observability**: 日志初始化
//! - **ui**: Ratatui TUI 界面

pub mod client;
pub mod config;
pub mod core;
pub mod observability;
pub mod ui;
