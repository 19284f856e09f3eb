//! 面板状态：单一状态机取代多个独立标志
//!
//! Idle → Submitting → Succeeded / Failed → Submitting …
//! 「加载中且有错误」「既有结果又有错误」在类型上无法表示；进入 Submitting 即丢弃上一次的结果与错误。

use chrono::{DateTime, Local};
use reqwest::Url;
use uuid::Uuid;

use crate::client::{GenerationOutcome, Solution};
use crate::core::SolverError;

/// 面板当前状态，由编排器独占写入，经 watch 通道投影给 UI
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PanelState {
    #[default]
    Idle,
    Submitting {
        request_id: Uuid,
        prompt: String,
        started_at: DateTime<Local>,
    },
    Succeeded {
        request_id: Uuid,
        solution: Solution,
        settled_at: DateTime<Local>,
    },
    Failed {
        request_id: Uuid,
        error: SolverError,
        settled_at: DateTime<Local>,
    },
}

impl PanelState {
    pub fn submitting(prompt: impl Into<String>) -> Self {
        PanelState::Submitting {
            request_id: Uuid::new_v4(),
            prompt: prompt.into(),
            started_at: Local::now(),
        }
    }

    /// 请求结束后的唯一落点：任何结果都映射为 Succeeded 或 Failed
    pub fn settle(request_id: Uuid, result: Result<GenerationOutcome, SolverError>) -> Self {
        let settled_at = Local::now();
        match result.and_then(GenerationOutcome::into_solution) {
            Ok(solution) => PanelState::Succeeded {
                request_id,
                solution,
                settled_at,
            },
            Err(error) => PanelState::Failed {
                request_id,
                error,
                settled_at,
            },
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Submitting { .. })
    }

    pub fn request_id(&self) -> Option<Uuid> {
        match self {
            PanelState::Idle => None,
            PanelState::Submitting { request_id, .. }
            | PanelState::Succeeded { request_id, .. }
            | PanelState::Failed { request_id, .. } => Some(*request_id),
        }
    }

    /// 错误横幅文字
    pub fn error_message(&self) -> Option<String> {
        match self {
            PanelState::Failed { error, .. } => Some(error.user_message()),
            _ => None,
        }
    }

    pub fn solution(&self) -> Option<&Solution> {
        match self {
            PanelState::Succeeded { solution, .. } => Some(solution),
            _ => None,
        }
    }

    pub fn video_url(&self) -> Option<&Url> {
        self.solution().and_then(|s| s.video_url.as_ref())
    }

    /// 标题栏显示的阶段
    pub fn phase_label(&self) -> String {
        match self {
            PanelState::Idle => "Idle".to_string(),
            PanelState::Submitting { started_at, .. } => {
                let secs = (Local::now() - *started_at).num_seconds().max(0);
                format!("Solving… {}s", secs)
            }
            PanelState::Succeeded { solution, settled_at, .. } => format!(
                "{} {}",
                if solution.partial { "Partial success" } else { "Success" },
                settled_at.format("%H:%M:%S")
            ),
            PanelState::Failed { error, settled_at, .. } => {
                format!("Error ({}) {}", error.kind(), settled_at.format("%H:%M:%S"))
            }
        }
    }
}

/// 提交守卫：题目非空（只含空白也算非空，原文提交）且当前没有请求在途
pub fn can_submit(prompt: &str, state: &PanelState) -> bool {
    !prompt.is_empty() && !state.is_loading()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(video: Option<&str>, partial: bool) -> Solution {
        Solution {
            solution_steps: "S".into(),
            manim_script: "M".into(),
            video_url: video.map(|v| Url::parse(v).unwrap()),
            message: None,
            error_detail: None,
            partial,
        }
    }

    #[test]
    fn test_submit_disabled_for_empty_prompt_in_any_state() {
        let failed = PanelState::settle(Uuid::new_v4(), Err(SolverError::Cancelled));
        for state in [PanelState::Idle, PanelState::submitting("x"), failed] {
            assert!(!can_submit("", &state));
        }
    }

    #[test]
    fn test_whitespace_prompt_is_submittable() {
        assert!(can_submit("   \n", &PanelState::Idle));
        assert!(!can_submit("   \n", &PanelState::submitting("previous")));
    }

    #[test]
    fn test_submit_disabled_while_loading() {
        assert!(can_submit("F = ma?", &PanelState::Idle));
        assert!(!can_submit("F = ma?", &PanelState::submitting("previous")));
    }

    #[test]
    fn test_submitting_has_no_result_or_error() {
        let s = PanelState::submitting("q");
        assert!(s.is_loading());
        assert!(s.error_message().is_none());
        assert!(s.solution().is_none());
        assert!(s.video_url().is_none());
    }

    #[test]
    fn test_settle_success_keeps_video() {
        let id = Uuid::new_v4();
        let s = PanelState::settle(
            id,
            Ok(GenerationOutcome::Success(solution(Some("http://x/y.mp4"), false))),
        );
        assert!(!s.is_loading());
        assert!(s.error_message().is_none());
        assert_eq!(s.video_url().map(Url::as_str), Some("http://x/y.mp4"));
        assert_eq!(s.request_id(), Some(id));
    }

    #[test]
    fn test_settle_partial_success_without_video() {
        let s = PanelState::settle(
            Uuid::new_v4(),
            Ok(GenerationOutcome::PartialSuccess(solution(None, true))),
        );
        assert!(s.error_message().is_none());
        assert!(s.video_url().is_none());
        assert_eq!(s.solution().map(|s| s.solution_steps.as_str()), Some("S"));
        assert!(s.phase_label().starts_with("Partial success"));
    }

    #[test]
    fn test_settle_unknown_status_is_generic_failure() {
        let s = PanelState::settle(
            Uuid::new_v4(),
            Ok(GenerationOutcome::Failed { status: "error".into() }),
        );
        assert_eq!(
            s.error_message().as_deref(),
            Some("Something went wrong with generation.")
        );
        assert!(s.solution().is_none());
    }

    #[test]
    fn test_settle_rejected_uses_detail() {
        let s = PanelState::settle(
            Uuid::new_v4(),
            Err(SolverError::Rejected { status: 400, detail: Some("bad prompt".into()) }),
        );
        assert_eq!(s.error_message().as_deref(), Some("bad prompt"));
        assert!(s.phase_label().starts_with("Error (rejected)"));
    }
}
