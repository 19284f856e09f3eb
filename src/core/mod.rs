//! 核心层：错误分类、面板状态机、编排器主控循环、关闭信号

pub mod error;
pub mod orchestrator;
pub mod shutdown;
pub mod state;

pub use error::SolverError;
pub use orchestrator::{create_backend, create_panel, Command};
pub use shutdown::{ShutdownManager, ShutdownReason};
pub use state::{can_submit, PanelState};
