//! Mock 后端（用于测试与离线演示，无需生成服务）
//!
//! 按顺序返回预置的结果；预置用完后回显题目为一次 partial_success，便于本地跑通整个面板。

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{GenerationOutcome, SolverBackend, Solution};
use crate::core::SolverError;

/// Mock 后端：预置结果队列 + 可选延迟，并记录收到的题目
#[derive(Debug, Default)]
pub struct MockSolverBackend {
    scripted: Mutex<VecDeque<Result<GenerationOutcome, SolverError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockSolverBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以预置结果创建，按提交顺序依次返回
    pub fn scripted(results: Vec<Result<GenerationOutcome, SolverError>>) -> Self {
        Self {
            scripted: Mutex::new(results.into()),
            ..Self::default()
        }
    }

    /// 每次 generate 先等待 delay，模拟慢速渲染
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 已收到的题目（按顺序）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn echo(prompt: &str) -> GenerationOutcome {
        GenerationOutcome::PartialSuccess(Solution {
            solution_steps: format!("Echo from Mock: {}", prompt),
            manim_script: "from manim import *\n\nclass GenScene(Scene):\n    def construct(self):\n        self.wait(1)\n".to_string(),
            video_url: None,
            message: Some("Mock backend: no video rendered.".to_string()),
            error_detail: None,
            partial: true,
        })
    }
}

#[async_trait]
impl SolverBackend for MockSolverBackend {
    async fn generate(&self, prompt: &str) -> Result<GenerationOutcome, SolverError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.scripted.lock().ok().and_then(|mut q| q.pop_front());
        next.unwrap_or_else(|| Ok(Self::echo(prompt)))
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
