use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{InputMode, Notice, NoticeLevel};
use crate::theme;

pub struct StatusBar;

impl StatusBar {
    pub fn render(frame: &mut Frame, area: Rect, mode: InputMode, notice: Option<&Notice>) {
        let t = theme::current();
        let w = area.width as usize;

        let mode_str = match mode {
            InputMode::Normal => "[View]",
            InputMode::Form => "[Form]",
        };

        let (right_text, right_style) = match notice {
            Some(n) => {
                let style = match n.level {
                    NoticeLevel::Info => t.status,
                    NoticeLevel::Warning | NoticeLevel::Error => t.status.patch(t.warning),
                };
                (format!(" {} ", n.text), style)
            }
            None => {
                let hints = match mode {
                    InputMode::Form if w >= 60 => {
                        " Tab:Field \u{2191}\u{2193}:Time Enter:Save Esc:Cancel"
                    }
                    InputMode::Form => " Enter:Save Esc:Cancel",
                    InputMode::Normal if w >= 90 => {
                        " hl:Day [/]:Week u:User jk:Select n:New e:Edit d:Del ?:Help q:Quit"
                    }
                    InputMode::Normal if w >= 50 => " hl:Day u:User n:New d:Del q:Quit",
                    InputMode::Normal => " ?:Help q:Quit",
                };
                (hints.to_string(), t.status)
            }
        };

        let left = format!(" {} ", mode_str);
        let padding = " ".repeat(w.saturating_sub(left.len() + right_text.chars().count()));

        let line = Line::from(vec![
            Span::styled(left, t.status),
            Span::styled(padding, t.status),
            Span::styled(right_text, right_style),
        ]);

        frame.render_widget(Paragraph::new(line).style(t.status), area);
    }
}
