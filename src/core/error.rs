//! 提交失败的错误分类
//!
//! 每种错误都终结当前这次提交，并以一条横幅展示给用户；不自动重试。

use thiserror::Error;

pub const GENERIC_REJECTED: &str = "Failed to generate solution";
pub const GENERIC_GENERATION_FAILED: &str = "Something went wrong with generation.";
pub const GENERIC_UNREACHABLE: &str = "Error connecting to server. Make sure backend is running.";

/// 一次提交可能出现的错误（服务端拒绝、生成失败、网络/解析、超时、取消）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// 非 2xx；detail 取自响应体
    #[error("Server rejected request ({status}): {}", .detail.as_deref().unwrap_or(GENERIC_REJECTED))]
    Rejected { status: u16, detail: Option<String> },

    /// 2xx 但 status 不是 success / partial_success
    #[error("Generation failed with status {status:?}")]
    GenerationFailed { status: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0} s")]
    Timeout(u64),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Config error: {0}")]
    Config(String),
}

impl SolverError {
    /// 横幅中显示的文字
    pub fn user_message(&self) -> String {
        match self {
            SolverError::Rejected { detail, .. } => detail
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or(GENERIC_REJECTED)
                .to_string(),
            SolverError::GenerationFailed { .. } => GENERIC_GENERATION_FAILED.to_string(),
            SolverError::Transport(msg) if msg.trim().is_empty() => GENERIC_UNREACHABLE.to_string(),
            SolverError::Transport(msg) => msg.clone(),
            SolverError::Timeout(secs) => format!("Request timed out after {} s.", secs),
            SolverError::Cancelled => "Request cancelled.".to_string(),
            SolverError::Config(msg) => msg.clone(),
        }
    }

    /// 标题栏用的短分类
    pub fn kind(&self) -> &'static str {
        match self {
            SolverError::Rejected { .. } => "rejected",
            SolverError::GenerationFailed { .. } => "generation failed",
            SolverError::Transport(_) => "unreachable",
            SolverError::Timeout(_) => "timeout",
            SolverError::Cancelled => "cancelled",
            SolverError::Config(_) => "config",
        }
    }
}
