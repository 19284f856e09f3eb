//! 生成服务客户端抽象
//!
//! 所有后端（HTTP / Mock）实现 SolverBackend：把一道题目提交给生成服务，返回按 status 解码后的结果。

use async_trait::async_trait;

use crate::client::GenerationOutcome;
use crate::core::SolverError;

/// 生成服务 trait：一次提交对应一次 POST
#[async_trait]
pub trait SolverBackend: Send + Sync {
    /// 提交题目；非 2xx、网络与解析错误以 Err 返回，2xx 一律解码为 GenerationOutcome
    async fn generate(&self, prompt: &str) -> Result<GenerationOutcome, SolverError>;

    /// 日志与标题栏中展示的端点描述
    fn describe(&self) -> String;
}
