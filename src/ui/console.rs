use std::collections::HashMap;
use std::io::{self, Write};

use crate::engine::protocol::EngineEvent;
use crate::engine::response_parser::{
    ADDRESS_PREFIX, AI_MENU_PREFIX, CLOSING_PROMPT, HIGHLIGHTS_PREFIX, HOURS_PREFIX, MAP_PREFIX,
    PHONE_PREFIX,
};
use crate::engine::reveal::reveal_text;
use crate::model::message::{Message, MessageId, Sender};
use crate::model::place::Place;

/// Quick-pick questions: (button label, text sent).
pub const SUGGESTIONS: [(&str, &str); 6] = [
    ("Văn hóa", "Tôi muốn tìm hiểu về văn hóa Khánh Hòa"),
    ("Sự kiện", "Tôi muốn tìm sự kiện ở Nha Trang"),
    ("Địa điểm du lịch", "Tôi muốn tìm địa điểm tham quan ở Nha Trang"),
    ("Ẩm thực", "Tôi tìm nhà hàng"),
    ("Y tế", "Tôi tìm bệnh viện"),
    ("Tour du lịch", "Tôi tìm tour"),
];

/* =========================
   Input
   ========================= */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Submit(String),
    /// 1-based index into `SUGGESTIONS`.
    Suggestion(usize),
    /// 1-based index into the latest place list.
    Place(usize),
    Forget(String),
    Reset,
    ToggleVisibility,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(cmd) = line.strip_prefix('/') else {
        return Input::Submit(line.to_string());
    };

    let (name, arg) = match cmd.split_once(' ') {
        Some((name, arg)) => (name, arg.trim()),
        None => (cmd, ""),
    };

    let index = |arg: &str| arg.parse::<usize>().ok().filter(|n| *n > 0);

    match name {
        "s" => index(arg).map(Input::Suggestion),
        "p" => index(arg).map(Input::Place),
        "forget" if !arg.is_empty() => Some(Input::Forget(arg.to_string())),
        "reset" => Some(Input::Reset),
        "hide" => Some(Input::ToggleVisibility),
        "help" => Some(Input::Help),
        "quit" | "q" => Some(Input::Quit),
        _ => None,
    }
    .unwrap_or_else(|| Input::Invalid(line.to_string()))
}

pub fn help_text() -> String {
    let mut out = String::from("Commands: /s N  /p N  /forget LABEL  /reset  /hide  /quit\n");
    for (i, (label, _)) in SUGGESTIONS.iter().enumerate() {
        out.push_str(&format!("  /s {} {}\n", i + 1, label));
    }
    out
}

/* =========================
   Rendering
   ========================= */

/// Mirror of the engine's published state, printed as it changes.
#[derive(Default)]
pub struct ConsoleView {
    messages: Vec<Message>,
    /// Characters already written for each message.
    written: HashMap<MessageId, usize>,
    finished: HashMap<MessageId, bool>,
    pub busy: bool,
    pub unread: usize,
    pub labels: Vec<String>,
}

impl ConsoleView {
    /// Places of the newest locations message, for `/p N`.
    pub fn latest_places(&self) -> Option<&[Place]> {
        self.messages.iter().rev().find_map(|m| m.locations())
    }

    pub fn apply(&mut self, event: EngineEvent, out: &mut impl Write) -> io::Result<()> {
        match event {
            EngineEvent::MessageLog(log) => {
                if log.is_empty() && !self.messages.is_empty() {
                    writeln!(out, "--- cuộc trò chuyện mới ---")?;
                    self.written.clear();
                    self.finished.clear();
                }
                self.messages = log;
                let ids: Vec<MessageId> = self.messages.iter().map(|m| m.id).collect();
                for id in ids {
                    self.draw_settled(id, out)?;
                }
            }
            EngineEvent::RevealProgress { id, shown } => self.draw_progress(id, shown, out)?,
            EngineEvent::Busy(busy) => {
                if busy && !self.busy {
                    writeln!(out, "...")?;
                }
                self.busy = busy;
            }
            EngineEvent::Unread(n) => {
                if n > self.unread {
                    writeln!(out, "({n} tin nhắn chưa đọc)")?;
                }
                self.unread = n;
            }
            EngineEvent::HistoryLabels(labels) => self.labels = labels,
            EngineEvent::ComposerCleared => {}
            EngineEvent::SessionChanged(id) => tracing::debug!(session = %id, "session"),
        }
        out.flush()
    }

    fn draw_settled(&mut self, id: MessageId, out: &mut impl Write) -> io::Result<()> {
        let Some(msg) = self.messages.iter().find(|m| m.id == id) else {
            return Ok(());
        };
        if self.finished.get(&id).copied().unwrap_or(false) || !msg.revealed {
            return Ok(());
        }

        match msg.sender {
            Sender::User => {
                writeln!(out, "Bạn: {}", msg.text().unwrap_or_default())?;
            }
            Sender::Bot => {
                let script: Vec<char> = reveal_text(&msg.payload).chars().collect();
                let already = self.written.get(&id).copied().unwrap_or(0);
                if already == 0 {
                    write!(out, "Bot: ")?;
                }
                let rest: String = script.iter().skip(already).collect();
                writeln!(out, "{rest}")?;
                if let Some(places) = msg.locations() {
                    draw_places(places, out)?;
                }
            }
        }
        self.finished.insert(id, true);
        Ok(())
    }

    fn draw_progress(&mut self, id: MessageId, shown: usize, out: &mut impl Write) -> io::Result<()> {
        let Some(msg) = self.messages.iter().find(|m| m.id == id) else {
            return Ok(());
        };
        let already = self.written.get(&id).copied().unwrap_or(0);
        if shown <= already {
            return Ok(());
        }
        if already == 0 {
            write!(out, "Bot: ")?;
        }
        let chunk: String = reveal_text(&msg.payload)
            .chars()
            .skip(already)
            .take(shown - already)
            .collect();
        write!(out, "{chunk}")?;
        self.written.insert(id, shown);
        Ok(())
    }
}

fn draw_places(places: &[Place], out: &mut impl Write) -> io::Result<()> {
    for (i, place) in places.iter().enumerate() {
        writeln!(out, "  [{}] {}", i + 1, place.name)?;
        let fields = [
            (ADDRESS_PREFIX, &place.address),
            (PHONE_PREFIX, &place.phone),
            (HOURS_PREFIX, &place.opening_hours),
            (MAP_PREFIX, &place.map_link),
            (AI_MENU_PREFIX, &place.ai_menu_link),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                writeln!(out, "      {label} {value}")?;
            }
        }
        if !place.highlights.is_empty() {
            writeln!(out, "      {HIGHLIGHTS_PREFIX}")?;
            for h in &place.highlights {
                writeln!(out, "        - {h}")?;
            }
        }
    }
    writeln!(out, "{CLOSING_PROMPT}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::Payload;

    fn render(view: &mut ConsoleView, events: Vec<EngineEvent>) -> String {
        let mut out = Vec::new();
        for e in events {
            view.apply(e, &mut out).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("xin chào\n"), Input::Submit("xin chào".into()));
        assert_eq!(parse_input("/s 3"), Input::Suggestion(3));
        assert_eq!(parse_input("/p 1"), Input::Place(1));
        assert_eq!(parse_input("/forget Tôi tìm tour"), Input::Forget("Tôi tìm tour".into()));
        assert_eq!(parse_input("/reset"), Input::Reset);
        assert_eq!(parse_input("/hide"), Input::ToggleVisibility);
        assert_eq!(parse_input("/q"), Input::Quit);
        assert_eq!(parse_input("/s 0"), Input::Invalid("/s 0".into()));
        assert_eq!(parse_input("/forget"), Input::Invalid("/forget".into()));
        assert_eq!(parse_input("/bogus"), Input::Invalid("/bogus".into()));
    }

    #[test]
    fn test_help_lists_suggestions() {
        let help = help_text();
        assert!(help.contains("/s 6 Tour du lịch"));
    }

    #[test]
    fn test_streams_reveal_then_settles_once() {
        let mut view = ConsoleView::default();
        let user = Message::user(MessageId(1), "hi");
        let mut bot = Message::bot(MessageId(2), Payload::Text("Chào".into()));

        let text = render(
            &mut view,
            vec![
                EngineEvent::MessageLog(vec![user.clone(), bot.clone()]),
                EngineEvent::RevealProgress { id: bot.id, shown: 2 },
                EngineEvent::RevealProgress { id: bot.id, shown: 3 },
            ],
        );
        assert_eq!(text, "Bạn: hi\nBot: Chà");

        bot.revealed = true;
        let text = render(
            &mut view,
            vec![
                EngineEvent::MessageLog(vec![user.clone(), bot.clone()]),
                EngineEvent::MessageLog(vec![user, bot]),
            ],
        );
        assert_eq!(text, "o\n");
    }

    #[test]
    fn test_places_drawn_after_reveal() {
        let mut view = ConsoleView::default();
        let mut place = Place::named("Chợ Đầm");
        place.address = Some("Phan Bội Châu".into());
        let mut bot = Message::bot(MessageId(5), Payload::Locations(vec![place]));
        bot.revealed = true;

        let text = render(&mut view, vec![EngineEvent::MessageLog(vec![bot])]);
        assert!(text.starts_with("Bot: Tìm thấy 1 địa điểm:\n"));
        assert!(text.contains("[1] Chợ Đầm"));
        assert!(text.contains("Địa chỉ: Phan Bội Châu"));
        assert!(text.trim_end().ends_with(CLOSING_PROMPT));
        assert_eq!(view.latest_places().map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_reset_clears_view() {
        let mut view = ConsoleView::default();
        render(
            &mut view,
            vec![EngineEvent::MessageLog(vec![Message::user(MessageId(1), "a")])],
        );
        let text = render(&mut view, vec![EngineEvent::MessageLog(vec![])]);
        assert!(text.contains("cuộc trò chuyện mới"));
        assert!(view.latest_places().is_none());
    }
}
