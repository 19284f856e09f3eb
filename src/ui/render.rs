//! 界面渲染
//!
//! 根据 PanelState 与 ViewState 自上而下绘制：标题栏（阶段）、题目输入框、提交按钮、
//! 错误横幅（仅 Failed）、动画区块（仅有 video_url 时）、结果区（解题步骤 / Manim 脚本，可滚动）、快捷键提示。

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use crate::client::Solution;
use crate::core::{can_submit, PanelState};

pub const SUBMIT_LABEL: &str = "Solve & Generate Script";
pub const BUSY_LABEL: &str = "Solving...";
const PLACEHOLDER: &str =
    "e.g. A ball is thrown at 45 degrees with 10m/s velocity. Calculate the range.";
const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// 结果区当前显示的内容
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultPane {
    #[default]
    Steps,
    Script,
}

impl ResultPane {
    pub fn toggle(self) -> Self {
        match self {
            ResultPane::Steps => ResultPane::Script,
            ResultPane::Script => ResultPane::Steps,
        }
    }

    fn title(self) -> &'static str {
        match self {
            ResultPane::Steps => " Solution Steps │ Ctrl+S: Manim Script ",
            ResultPane::Script => " Manim Script │ Ctrl+S: Solution Steps ",
        }
    }
}

/// 仅属于界面的状态：题目缓冲、结果页、滚动位置、动画帧
#[derive(Debug, Clone)]
pub struct ViewState {
    pub prompt: String,
    pub pane: ResultPane,
    pub result_scroll: usize,
    pub tick: usize,
    pub max_display_chars: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            pane: ResultPane::Steps,
            result_scroll: 0,
            tick: 0,
            max_display_chars: 20_000,
        }
    }
}

/// 提交按钮的文字与是否可用：加载中显示忙碌标识；题目为空或加载中时禁用
pub fn submit_button(state: &PanelState, prompt: &str, tick: usize) -> (String, bool) {
    if state.is_loading() {
        (format!("{} {}", SPINNER[tick % SPINNER.len()], BUSY_LABEL), false)
    } else {
        (SUBMIT_LABEL.to_string(), can_submit(prompt, state))
    }
}

/// 错误横幅高度：正文行数 + 上下边框，超出 u16 时饱和
fn banner_height(lines: usize) -> u16 {
    u16::try_from(lines).unwrap_or(u16::MAX).saturating_add(2)
}

/// 对过长内容做折叠：保留前 N 字 + 省略提示
fn truncate_for_display(content: &str, limit: usize) -> String {
    let total = content.chars().count();
    if total <= limit {
        return content.to_string();
    }
    let head: String = content.chars().take(limit).collect();
    format!("{}\n... [truncated, {} chars total]", head, total)
}

/// 将内容按宽度换行，支持 UTF-8（按字符数，避免在 UTF-8 中间截断）
fn wrap_text(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    for para in s.split('\n') {
        let mut line = String::new();
        for ch in para.chars() {
            if line.chars().count() >= width {
                lines.push(std::mem::take(&mut line));
            }
            line.push(ch);
        }
        lines.push(line);
    }
    lines
}

fn result_lines(solution: &Solution, view: &ViewState, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(msg) = &solution.message {
        for l in wrap_text(msg, width) {
            lines.push(Line::from(Span::styled(l, Style::default().fg(Color::Yellow))));
        }
        lines.push(Line::from(""));
    }

    let (body, empty_hint) = match view.pane {
        ResultPane::Steps => (&solution.solution_steps, "(no solution steps returned)"),
        ResultPane::Script => (&solution.manim_script, "(no script returned)"),
    };
    if body.trim().is_empty() {
        lines.push(Line::from(Span::styled(
            empty_hint,
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        let text = truncate_for_display(body, view.max_display_chars);
        let style = match view.pane {
            ResultPane::Steps => Style::default(),
            ResultPane::Script => Style::default().fg(Color::Cyan),
        };
        for l in wrap_text(&text, width) {
            lines.push(Line::from(Span::styled(l, style)));
        }
    }

    if view.pane == ResultPane::Script {
        if let Some(detail) = &solution.error_detail {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Render error:",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
            let detail = truncate_for_display(detail, view.max_display_chars);
            for l in wrap_text(&detail, width) {
                lines.push(Line::from(Span::styled(l, Style::default().fg(Color::Red))));
            }
        }
    }
    lines
}

/// 绘制一帧；将结果区 (总行数, 可视高度) 写入 out 供外部 clamp 滚动
pub fn draw(f: &mut Frame, state: &PanelState, view: &ViewState, out: &mut (usize, usize)) {
    let area = f.area();
    let inner_width = area.width.saturating_sub(2) as usize;

    let error = state.error_message();
    let error_lines = error
        .as_deref()
        .map(|e| wrap_text(e, inner_width.max(1)).len())
        .unwrap_or(0);
    let solution = state.solution();
    let video = state.video_url();

    let mut constraints = vec![
        Constraint::Length(3), // 标题
        Constraint::Length(6), // 题目
        Constraint::Length(3), // 提交按钮
    ];
    if error.is_some() {
        // 横幅最多占半屏，其余区域仍可见
        constraints.push(Constraint::Length(
            banner_height(error_lines).min(area.height / 2).max(3),
        ));
    }
    if video.is_some() {
        constraints.push(Constraint::Length(4));
    }
    constraints.push(Constraint::Min(if solution.is_some() { 3 } else { 0 }));
    constraints.push(Constraint::Length(1)); // 提示

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    let mut slots = chunks.iter().copied();
    let mut next = || slots.next().unwrap_or_default();

    draw_header(f, next(), state);
    draw_prompt(f, next(), state, view);
    draw_submit(f, next(), state, view);

    if let Some(message) = &error {
        let banner = Paragraph::new(message.as_str())
            .style(Style::default().fg(Color::LightRed))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(" Error ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            );
        f.render_widget(banner, next());
    }

    if let Some(url) = video {
        let block = Block::default()
            .title(" Generated Animation ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue));
        let body = Text::from(vec![
            Line::from(vec![
                Span::styled("▶ ", Style::default().fg(Color::Green)),
                Span::styled(
                    url.to_string(),
                    Style::default().add_modifier(Modifier::UNDERLINED),
                ),
            ]),
            Line::from(Span::styled(
                "open in a video player to watch",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        f.render_widget(Paragraph::new(body).block(block), next());
    }

    let result_area = next();
    *out = (0, 0);
    if let Some(solution) = solution {
        draw_result(f, result_area, solution, view, out);
    }

    let hint = " Enter solve │ Ctrl+J newline │ Esc cancel │ Ctrl+L clear │ Ctrl+S steps/script │ ↑↓ PgUp/PgDn scroll │ Ctrl+Q quit ";
    f.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        next(),
    );
}

fn draw_header(f: &mut Frame, area: Rect, state: &PanelState) {
    let color = match state {
        PanelState::Failed { .. } => Color::Red,
        PanelState::Submitting { .. } => Color::Yellow,
        _ => Color::Green,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let line = Line::from(vec![
        Span::styled(" Manim Math Solver ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(state.phase_label(), Style::default().fg(color)),
    ]);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_prompt(f: &mut Frame, area: Rect, state: &PanelState, view: &ViewState) {
    let block = Block::default()
        .title(" Enter your Math/Physics Question ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
    let text = if view.prompt.is_empty() {
        Text::from(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Text::from(format!("{}▌", view.prompt))
    };
    let style = if state.is_loading() {
        Style::default().fg(Color::Gray)
    } else {
        Style::default()
    };
    f.render_widget(
        Paragraph::new(text).style(style).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn draw_submit(f: &mut Frame, area: Rect, state: &PanelState, view: &ViewState) {
    let (label, enabled) = submit_button(state, &view.prompt, view.tick);
    let style = if enabled {
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let button = Paragraph::new(Line::from(label).centered())
        .style(style)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(button, area);
}

fn draw_result(
    f: &mut Frame,
    area: Rect,
    solution: &Solution,
    view: &ViewState,
    out: &mut (usize, usize),
) {
    let block = Block::default()
        .title(view.pane.title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(area);
    // 右侧留一列给滚动条
    let width = inner.width.saturating_sub(1) as usize;
    let lines = result_lines(solution, view, width.max(1));

    let content_height = inner.height as usize;
    let total_lines = lines.len();
    let scroll = view.result_scroll.min(total_lines.saturating_sub(content_height));

    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(Text::from(lines)).scroll((scroll as u16, 0)),
        inner,
    );

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .position(scroll)
            .viewport_content_length(content_height);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .thumb_symbol("█")
            .track_symbol(Some("░"));
        f.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
    }

    *out = (total_lines, content_height);
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};
    use reqwest::Url;
    use uuid::Uuid;

    use super::*;
    use crate::client::GenerationOutcome;
    use crate::core::SolverError;

    fn render(state: &PanelState, view: &ViewState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut out = (0, 0);
        terminal.draw(|f| draw(f, state, view, &mut out)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn view(prompt: &str) -> ViewState {
        ViewState {
            prompt: prompt.to_string(),
            ..Default::default()
        }
    }

    fn solution(video: Option<&str>) -> Solution {
        Solution {
            solution_steps: "Step 1: a = F / m".into(),
            manim_script: "from manim import *".into(),
            video_url: video.map(|v| Url::parse(v).unwrap()),
            message: None,
            error_detail: None,
            partial: video.is_none(),
        }
    }

    #[test]
    fn test_submit_disabled_for_empty_prompt() {
        let (_, enabled) = submit_button(&PanelState::Idle, "", 0);
        assert!(!enabled);
        let (label, enabled) = submit_button(&PanelState::submitting("q"), "", 0);
        assert!(!enabled);
        assert!(label.ends_with(BUSY_LABEL));
    }

    #[test]
    fn test_submit_label_while_loading() {
        let (label, enabled) = submit_button(&PanelState::submitting("q"), "q", 3);
        assert!(!enabled);
        assert!(label.contains(BUSY_LABEL));
        assert!(!label.contains(SUBMIT_LABEL));

        let (label, enabled) = submit_button(&PanelState::Idle, "q", 3);
        assert!(enabled);
        assert_eq!(label, SUBMIT_LABEL);
    }

    #[test]
    fn test_success_renders_video_block() {
        let state = PanelState::settle(
            Uuid::new_v4(),
            Ok(GenerationOutcome::Success(solution(Some("http://x/y.mp4")))),
        );
        let screen = render(&state, &view("q"));
        assert!(screen.contains("Generated Animation"));
        assert!(screen.contains("http://x/y.mp4"));
        assert!(!screen.contains(" Error "));
        assert!(screen.contains("Step 1: a = F / m"));
    }

    #[test]
    fn test_partial_success_renders_no_video_and_no_banner() {
        let state = PanelState::settle(
            Uuid::new_v4(),
            Ok(GenerationOutcome::PartialSuccess(solution(None))),
        );
        let screen = render(&state, &view("q"));
        assert!(!screen.contains("Generated Animation"));
        assert!(!screen.contains(" Error "));
        assert!(screen.contains("Solution Steps"));
    }

    #[test]
    fn test_script_pane_shows_script_and_render_error() {
        let mut sol = solution(None);
        sol.error_detail = Some("LaTeX not found".into());
        let state = PanelState::settle(Uuid::new_v4(), Ok(GenerationOutcome::PartialSuccess(sol)));
        let mut v = view("q");
        v.pane = ResultPane::Script;
        let screen = render(&state, &v);
        assert!(screen.contains("from manim import *"));
        assert!(screen.contains("LaTeX not found"));
    }

    #[test]
    fn test_failed_renders_banner_text() {
        let state = PanelState::settle(
            Uuid::new_v4(),
            Ok(GenerationOutcome::Failed { status: "error".into() }),
        );
        let screen = render(&state, &view("q"));
        assert!(screen.contains("Something went wrong with generation."));

        let state = PanelState::settle(
            Uuid::new_v4(),
            Err(SolverError::Rejected { status: 400, detail: Some("bad prompt".into()) }),
        );
        let screen = render(&state, &view("q"));
        assert!(screen.contains("bad prompt"));
        assert!(!screen.contains("Generated Animation"));
    }

    #[test]
    fn test_banner_height_saturates() {
        assert_eq!(banner_height(1), 3);
        assert_eq!(banner_height(70_000), u16::MAX);
        assert_eq!(banner_height(usize::from(u16::MAX) - 1), u16::MAX);
    }

    #[test]
    fn test_huge_detail_renders_without_panic() {
        let detail = "line\n".repeat(70_000);
        let state = PanelState::settle(
            Uuid::new_v4(),
            Err(SolverError::Rejected { status: 500, detail: Some(detail) }),
        );
        let screen = render(&state, &view("q"));
        assert!(screen.contains(" Error "));
        assert!(screen.contains("line"));
        assert!(screen.contains(SUBMIT_LABEL));
    }

    #[test]
    fn test_loading_shows_busy_label_and_no_result() {
        let screen = render(&PanelState::submitting("q"), &view("q"));
        assert!(screen.contains(BUSY_LABEL));
        assert!(!screen.contains(SUBMIT_LABEL));
        assert!(!screen.contains(" Error "));
    }

    #[test]
    fn test_placeholder_when_prompt_empty() {
        let screen = render(&PanelState::Idle, &view(""));
        assert!(screen.contains("e.g. A ball is thrown"));
    }

    #[test]
    fn test_wrap_text_keeps_blank_lines() {
        assert_eq!(wrap_text("ab\n\ncd", 10), vec!["ab", "", "cd"]);
        assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
    }

    #[test]
    fn test_truncate_for_display() {
        assert_eq!(truncate_for_display("short", 10), "short");
        let long = "x".repeat(30);
        let out = truncate_for_display(&long, 10);
        assert!(out.starts_with("xxxxxxxxxx\n"));
        assert!(out.contains("30 chars total"));
    }
}
