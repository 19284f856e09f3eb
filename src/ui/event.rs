//! 事件处理
//!
//! 轮询 crossterm 键盘事件，将 Ctrl+C/Esc/Ctrl+L/Ctrl+Q 转为 Command（Cancel/Clear/Quit），
//! Ctrl+S 切换结果页，其余按键交给 run_app 编辑题目，Enter 时 send_submit。

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::core::Command;

/// 应用事件：来自快捷键的 Command、界面内部动作或原始 KeyEvent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Command(Command),
    TogglePane,
    Key(KeyEvent),
}

/// 事件处理器：持有 cmd_tx，poll 时读键盘并返回 AppEvent，send_submit 发送题目
pub struct EventHandler {
    cmd_tx: mpsc::UnboundedSender<Command>,
    tick: Duration,
}

impl EventHandler {
    pub fn new(cmd_tx: mpsc::UnboundedSender<Command>, tick: Duration) -> Self {
        Self { cmd_tx, tick }
    }

    pub fn poll(&self) -> anyhow::Result<Option<AppEvent>> {
        if event::poll(self.tick)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(self.handle_key(key)));
                }
            }
        }
        Ok(None)
    }

    /// Cancel / Clear 直接发给编排器；Quit 由主循环处理
    pub fn handle_key(&self, key: KeyEvent) -> AppEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => self.forward(Command::Cancel),
            KeyCode::Esc => self.forward(Command::Cancel),
            KeyCode::Char('l') if ctrl => self.forward(Command::Clear),
            KeyCode::Char('q') if ctrl => AppEvent::Command(Command::Quit),
            KeyCode::Char('s') if ctrl => AppEvent::TogglePane,
            _ => AppEvent::Key(key),
        }
    }

    fn forward(&self, cmd: Command) -> AppEvent {
        let _ = self.cmd_tx.send(cmd.clone());
        AppEvent::Command(cmd)
    }

    pub fn send_submit(&self, prompt: String) {
        let _ = self.cmd_tx.send(Command::Submit(prompt));
    }

    pub fn send(&self, cmd: Command) {
        let _ = self.cmd_tx.send(cmd);
    }
}
