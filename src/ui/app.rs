use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::config::ClientSettings;
use crate::engine::engine::{ConversationEngine, EngineHandle};
use crate::engine::protocol::EngineEvent;
use crate::engine::transport::Transport;
use crate::ui::console::{help_text, parse_input, ConsoleView, Input, SUGGESTIONS};

/* =========================
   App
   ========================= */

pub struct ConsoleApp {
    view: ConsoleView,
    engine: EngineHandle,
    events: UnboundedReceiver<EngineEvent>,
    task: JoinHandle<()>,
}

impl ConsoleApp {
    pub fn new(settings: ClientSettings, transport: Arc<dyn Transport>) -> Self {
        let (engine, events, task) = ConversationEngine::spawn(settings, transport);
        Self {
            view: ConsoleView::default(),
            engine,
            events,
            task,
        }
    }

    /// Forward one line of user input. Returns false when the user quits.
    pub fn handle_line(&mut self, line: &str, out: &mut impl Write) -> std::io::Result<bool> {
        match parse_input(line) {
            Input::Submit(text) => {
                self.engine.submit(text);
            }
            Input::Suggestion(n) => match SUGGESTIONS.get(n - 1) {
                Some((_, text)) => {
                    self.engine.select_suggestion(*text);
                }
                None => writeln!(out, "Không có gợi ý số {n}")?,
            },
            Input::Place(n) => {
                let name = self
                    .view
                    .latest_places()
                    .and_then(|places| places.get(n - 1))
                    .map(|p| p.name.clone());
                match name {
                    Some(name) => {
                        self.engine.select_place(name);
                    }
                    None => writeln!(out, "Không có địa điểm số {n}")?,
                }
            }
            Input::Forget(label) => {
                self.engine.delete_history_entry(label);
            }
            Input::Reset => {
                self.engine.reset_conversation();
            }
            Input::ToggleVisibility => {
                self.engine.toggle_visibility();
            }
            Input::Help => {
                write!(out, "{}", help_text())?;
                if !self.view.labels.is_empty() {
                    writeln!(out, "Câu hỏi gần đây: {}", self.view.labels.join(" | "))?;
                }
            }
            Input::Quit => return Ok(false),
            Input::Invalid(raw) => writeln!(out, "Lệnh không hợp lệ: {raw}")?,
        }
        out.flush()?;
        Ok(true)
    }

    /// Read stdin until EOF or `/quit`, printing engine state as it arrives.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut stdout = std::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        write!(stdout, "{}", help_text())?;

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if !self.handle_line(&line, &mut stdout)? {
                            break;
                        }
                    }
                    None => break,
                },
                event = self.events.recv() => match event {
                    Some(event) => self.view.apply(event, &mut stdout)?,
                    None => break,
                },
            }
        }

        self.engine.shutdown();
        self.task.await?;
        Ok(())
    }
}
