//! TUI 应用主循环
//!
//! 进入全屏/原始模式，轮询 state_rx 与键盘事件，将题目与快捷键转为 Command 发送给编排器，
//! 每帧用 draw 渲染 PanelState 与 ViewState。

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::config::UiSection;
use crate::core::{can_submit, Command, PanelState, ShutdownManager, ShutdownReason};
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::{draw, ResultPane, ViewState};

/// 编辑类按键的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Submit(String),
}

/// 处理编辑与滚动按键；Enter 仅在守卫通过时产生 Submit，题目原文发送并保留在输入框中
pub fn apply_key(view: &mut ViewState, state: &PanelState, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            view.prompt.push('\n');
        }
        KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            view.prompt.push('\n');
        }
        KeyCode::Enter => {
            if can_submit(&view.prompt, state) {
                return KeyAction::Submit(view.prompt.clone());
            }
        }
        KeyCode::Backspace => {
            view.prompt.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view.prompt.push(c);
        }
        KeyCode::Up => view.result_scroll = view.result_scroll.saturating_sub(1),
        KeyCode::Down => view.result_scroll = view.result_scroll.saturating_add(1),
        KeyCode::PageUp => view.result_scroll = view.result_scroll.saturating_sub(10),
        KeyCode::PageDown => view.result_scroll = view.result_scroll.saturating_add(10),
        KeyCode::Home => view.result_scroll = 0,
        KeyCode::End => view.result_scroll = usize::MAX,
        _ => {}
    }
    KeyAction::None
}

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(
    mut state_rx: watch::Receiver<PanelState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    ui: &UiSection,
    shutdown: Arc<ShutdownManager>,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut state_rx, cmd_tx, ui, &shutdown).await;
    if let Err(e) = &result {
        shutdown.shutdown(ShutdownReason::FatalError(e.to_string()));
    }

    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: &mut watch::Receiver<PanelState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    ui: &UiSection,
    shutdown: &ShutdownManager,
) -> anyhow::Result<()> {
    let event_handler = EventHandler::new(cmd_tx, Duration::from_millis(ui.tick_ms.max(10)));
    let mut view = ViewState {
        pane: if ui.show_script { ResultPane::Script } else { ResultPane::Steps },
        max_display_chars: ui.max_display_chars,
        ..Default::default()
    };
    let mut last_request = None;

    while !shutdown.is_shutdown() {
        let state = state_rx.borrow_and_update().clone();

        // 新的一次结算：结果区回到顶部
        if state.request_id() != last_request {
            last_request = state.request_id();
            view.result_scroll = 0;
        }

        if let Some(ev) = event_handler.poll()? {
            match ev {
                AppEvent::Command(Command::Quit) => {
                    event_handler.send(Command::Quit);
                    shutdown.shutdown(ShutdownReason::UserInitiated);
                    break;
                }
                AppEvent::Command(_) => {}
                AppEvent::TogglePane => {
                    view.pane = view.pane.toggle();
                    view.result_scroll = 0;
                }
                AppEvent::Key(key) => {
                    if let KeyAction::Submit(prompt) = apply_key(&mut view, &state, key) {
                        event_handler.send_submit(prompt);
                    }
                }
            }
        }

        view.tick = view.tick.wrapping_add(1);
        let mut scroll_info = (0usize, 0usize);
        terminal.draw(|f| draw(f, &state, &view, &mut scroll_info))?;
        let (total_lines, viewport_height) = scroll_info;
        view.result_scroll = view
            .result_scroll
            .min(total_lines.saturating_sub(viewport_height));

        tokio::task::yield_now().await;
    }
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
