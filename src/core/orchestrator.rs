//! 面板编排器：主控循环
//!
//! 负责：按配置选择后端、建立 cmd/state 两个通道，并在后台任务中消费用户命令（Submit/Cancel/Clear/Quit），
//! 驱动一次提交的完整生命周期并把状态发布给 UI。
//! 在途请求与命令接收在同一个 select 中等待，取消、退出与生命周期令牌都会丢弃请求 future。

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::client::{HttpSolverBackend, MockSolverBackend, SolverBackend};
use crate::config::BackendSection;
use crate::core::{can_submit, PanelState, SolverError};

/// 从 UI 发往编排器的用户命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 提交题目，触发一次生成请求
    Submit(String),
    /// 取消在途请求
    Cancel,
    /// 清空结果与错误，回到 Idle
    Clear,
    /// 退出应用
    Quit,
}

/// 根据配置选择后端（HTTP / Mock）
pub fn create_backend(cfg: &BackendSection) -> Result<Arc<dyn SolverBackend>, SolverError> {
    if cfg.mock {
        tracing::warn!("backend.mock is set, using Mock backend");
        return Ok(Arc::new(MockSolverBackend::new()));
    }
    let backend = HttpSolverBackend::new(cfg)?;
    tracing::info!("Using generation service at {}", backend.describe());
    Ok(Arc::new(backend))
}

/// 创建面板运行时：返回命令发送端与状态接收端；后台任务消费命令并更新状态。
/// lifetime 取消或命令发送端全部丢弃时，后台任务放弃在途请求并退出。
pub fn create_panel(
    backend: Arc<dyn SolverBackend>,
    lifetime: CancellationToken,
) -> (mpsc::UnboundedSender<Command>, watch::Receiver<PanelState>) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (state_tx, state_rx) = watch::channel(PanelState::default());

    let orchestrator = Orchestrator {
        backend,
        lifetime,
        cmd_rx,
        state_tx,
    };
    tokio::spawn(orchestrator.run());

    (cmd_tx, state_rx)
}

struct Orchestrator {
    backend: Arc<dyn SolverBackend>,
    lifetime: CancellationToken,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<PanelState>,
}

/// 一次提交结束后主循环是否继续
enum Flow {
    Continue,
    Stop,
}

impl Orchestrator {
    async fn run(mut self) {
        loop {
            let cmd = tokio::select! {
                _ = self.lifetime.cancelled() => break,
                cmd = self.cmd_rx.recv() => cmd,
            };
            match cmd {
                Some(Command::Submit(prompt)) => {
                    if let Flow::Stop = self.submit(prompt).await {
                        break;
                    }
                }
                Some(Command::Cancel) => {
                    tracing::debug!("Cancel with no request in flight");
                }
                Some(Command::Clear) => {
                    self.state_tx.send_replace(PanelState::Idle);
                }
                Some(Command::Quit) | None => break,
            }
        }
        tracing::info!("Panel orchestrator stopped");
    }

    /// 提交处理：守卫 → 发布 Submitting → 等待结果或取消 → 发布结算状态。
    /// 进入 Submitting 之后的每条退出路径都会发布 Succeeded/Failed。
    async fn submit(&mut self, prompt: String) -> Flow {
        if !can_submit(&prompt, &self.state_tx.borrow()) {
            tracing::warn!("Submit ignored: empty prompt or request already in flight");
            return Flow::Continue;
        }

        let submitting = PanelState::submitting(prompt.as_str());
        let request_id = submitting.request_id().unwrap_or_default();
        self.state_tx.send_replace(submitting);
        tracing::info!(%request_id, "Submitting prompt ({} chars) to {}", prompt.len(), self.backend.describe());

        let backend = Arc::clone(&self.backend);
        let request = backend.generate(&prompt);
        tokio::pin!(request);

        let mut flow = Flow::Continue;
        let result = loop {
            tokio::select! {
                result = &mut request => break result,
                _ = self.lifetime.cancelled() => {
                    flow = Flow::Stop;
                    break Err(SolverError::Cancelled);
                }
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Cancel) => break Err(SolverError::Cancelled),
                    Some(Command::Submit(_)) => {
                        tracing::warn!(%request_id, "Submit ignored: request already in flight");
                    }
                    Some(Command::Clear) => {
                        tracing::debug!(%request_id, "Clear ignored while submitting");
                    }
                    Some(Command::Quit) | None => {
                        flow = Flow::Stop;
                        break Err(SolverError::Cancelled);
                    }
                },
            }
        };

        match &result {
            Ok(outcome) => tracing::info!(%request_id, "Request settled: {}", outcome_kind(outcome)),
            Err(e) => tracing::warn!(%request_id, "Request failed: {}", e),
        }
        self.state_tx.send_replace(PanelState::settle(request_id, result));
        flow
    }
}

fn outcome_kind(outcome: &crate::client::GenerationOutcome) -> &'static str {
    use crate::client::GenerationOutcome;
    match outcome {
        GenerationOutcome::Success(_) => "success",
        GenerationOutcome::PartialSuccess(_) => "partial_success",
        GenerationOutcome::Failed { .. } => "failed",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::Url;

    use super::*;
    use crate::client::{GenerationOutcome, Solution};

    fn success(video: Option<&str>) -> GenerationOutcome {
        GenerationOutcome::Success(Solution {
            solution_steps: "S".into(),
            manim_script: "M".into(),
            video_url: video.map(|v| Url::parse(v).unwrap()),
            message: None,
            error_detail: None,
            partial: false,
        })
    }

    async fn settled(rx: &mut watch::Receiver<PanelState>) -> PanelState {
        tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|s| matches!(s, PanelState::Succeeded { .. } | PanelState::Failed { .. })),
        )
        .await
        .expect("state did not settle")
        .expect("orchestrator dropped")
        .clone()
    }

    async fn loading(rx: &mut watch::Receiver<PanelState>) -> PanelState {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(PanelState::is_loading))
            .await
            .expect("never started loading")
            .expect("orchestrator dropped")
            .clone()
    }

    #[tokio::test]
    async fn test_loading_then_cleared_on_every_outcome() {
        let outcomes = vec![
            Ok(success(Some("http://x/y.mp4"))),
            Ok(GenerationOutcome::PartialSuccess(Solution {
                solution_steps: "S".into(),
                manim_script: "M".into(),
                video_url: None,
                message: Some("render failed".into()),
                error_detail: None,
                partial: true,
            })),
            Ok(GenerationOutcome::Failed { status: "error".into() }),
            Err(SolverError::Rejected { status: 400, detail: Some("bad prompt".into()) }),
            Err(SolverError::Transport("connection refused".into())),
        ];
        let n = outcomes.len();
        let backend = Arc::new(
            MockSolverBackend::scripted(outcomes).with_delay(Duration::from_millis(60)),
        );
        let (cmd_tx, mut state_rx) = create_panel(backend.clone(), CancellationToken::new());

        let mut messages = Vec::new();
        for i in 0..n {
            cmd_tx.send(Command::Submit(format!("question {}", i))).unwrap();
            let s = loading(&mut state_rx).await;
            assert!(s.error_message().is_none());
            assert!(s.solution().is_none());
            let s = settled(&mut state_rx).await;
            assert!(!s.is_loading());
            messages.push(s.error_message());
        }

        assert_eq!(
            messages,
            vec![
                None,
                None,
                Some("Something went wrong with generation.".to_string()),
                Some("bad prompt".to_string()),
                Some("connection refused".to_string()),
            ]
        );
        assert_eq!(backend.prompts().len(), n);
    }

    #[tokio::test]
    async fn test_new_submission_clears_previous_error() {
        let backend = Arc::new(
            MockSolverBackend::scripted(vec![
                Err(SolverError::Transport(String::new())),
                Ok(success(None)),
            ])
            .with_delay(Duration::from_millis(50)),
        );
        let (cmd_tx, mut state_rx) = create_panel(backend, CancellationToken::new());

        cmd_tx.send(Command::Submit("first".into())).unwrap();
        loading(&mut state_rx).await;
        let s = settled(&mut state_rx).await;
        assert_eq!(
            s.error_message().as_deref(),
            Some("Error connecting to server. Make sure backend is running.")
        );

        cmd_tx.send(Command::Submit("second".into())).unwrap();
        let s = loading(&mut state_rx).await;
        assert!(s.error_message().is_none());

        let s = settled(&mut state_rx).await;
        assert!(s.error_message().is_none());
        assert!(s.video_url().is_none());
        assert!(s.solution().is_some());
    }

    #[tokio::test]
    async fn test_empty_prompt_is_ignored() {
        let backend = Arc::new(MockSolverBackend::new());
        let (cmd_tx, mut state_rx) = create_panel(backend.clone(), CancellationToken::new());

        cmd_tx.send(Command::Submit(String::new())).unwrap();
        cmd_tx.send(Command::Submit(" real \n".into())).unwrap();
        settled(&mut state_rx).await;
        assert_eq!(backend.prompts(), vec![" real \n".to_string()]);
    }

    #[tokio::test]
    async fn test_overlapping_submit_is_ignored() {
        let backend = Arc::new(
            MockSolverBackend::scripted(vec![Ok(success(None))])
                .with_delay(Duration::from_millis(100)),
        );
        let (cmd_tx, mut state_rx) = create_panel(backend.clone(), CancellationToken::new());

        cmd_tx.send(Command::Submit("one".into())).unwrap();
        loading(&mut state_rx).await;
        cmd_tx.send(Command::Submit("two".into())).unwrap();
        let s = settled(&mut state_rx).await;
        assert!(s.error_message().is_none());
        assert_eq!(backend.prompts(), vec!["one".to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_settles_as_failed() {
        let backend = Arc::new(MockSolverBackend::new().with_delay(Duration::from_secs(30)));
        let (cmd_tx, mut state_rx) = create_panel(backend, CancellationToken::new());

        cmd_tx.send(Command::Submit("slow".into())).unwrap();
        loading(&mut state_rx).await;
        cmd_tx.send(Command::Cancel).unwrap();
        let s = settled(&mut state_rx).await;
        assert_eq!(s.error_message().as_deref(), Some("Request cancelled."));

        cmd_tx.send(Command::Clear).unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            state_rx.wait_for(|s| *s == PanelState::Idle),
        )
        .await
        .unwrap()
        .unwrap();
    }

    #[tokio::test]
    async fn test_lifetime_cancel_abandons_request() {
        let backend = Arc::new(MockSolverBackend::new().with_delay(Duration::from_secs(30)));
        let lifetime = CancellationToken::new();
        let (cmd_tx, mut state_rx) = create_panel(backend, lifetime.clone());

        cmd_tx.send(Command::Submit("slow".into())).unwrap();
        loading(&mut state_rx).await;
        lifetime.cancel();
        let s = settled(&mut state_rx).await;
        assert!(!s.is_loading());
    }

    #[test]
    fn test_create_backend_mock_flag() {
        let cfg = BackendSection {
            mock: true,
            ..Default::default()
        };
        assert_eq!(create_backend(&cfg).unwrap().describe(), "mock");
    }
}
