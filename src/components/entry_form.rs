use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::schedule::{EntryDraft, EntryId, ScheduleEntry, TimeValue};
use crate::theme;

const MAX_ROWS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Start,
    End,
    Label,
}

impl FormField {
    fn next(self) -> Option<Self> {
        match self {
            FormField::Start => Some(FormField::End),
            FormField::End => Some(FormField::Label),
            FormField::Label => None,
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            FormField::Start => None,
            FormField::End => Some(FormField::Start),
            FormField::Label => Some(FormField::End),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormRow {
    pub start: String,
    pub end: String,
    pub label: String,
}

impl FormRow {
    fn blank(start: TimeValue) -> Self {
        Self {
            start: start.to_string(),
            end: TimeValue::END_OF_DAY.to_string(),
            label: String::new(),
        }
    }
}

/// Everything the add/edit popup holds between key presses.
#[derive(Debug, Clone)]
pub struct EntryFormState {
    pub rows: Vec<FormRow>,
    pub active_row: usize,
    pub active_field: FormField,
    /// Set when the form edits an existing record.
    pub editing: Option<EntryId>,
    step_minutes: u16,
}

impl EntryFormState {
    pub fn new(step_minutes: u16) -> Self {
        Self {
            rows: vec![FormRow::blank(TimeValue::MIDNIGHT)],
            active_row: 0,
            active_field: FormField::Label,
            editing: None,
            step_minutes,
        }
    }

    pub fn for_entry(entry: &ScheduleEntry, step_minutes: u16) -> Self {
        Self {
            rows: vec![FormRow {
                start: entry.start.to_string(),
                end: entry.end.to_string(),
                label: entry.label.clone(),
            }],
            active_row: 0,
            active_field: FormField::Label,
            editing: Some(entry.id),
            step_minutes,
        }
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            " Edit Entry "
        } else {
            " New Entries "
        }
    }

    fn active_text(&mut self) -> &mut String {
        let row = &mut self.rows[self.active_row];
        match self.active_field {
            FormField::Start => &mut row.start,
            FormField::End => &mut row.end,
            FormField::Label => &mut row.label,
        }
    }

    pub fn input_char(&mut self, c: char) {
        self.active_text().push(c);
    }

    pub fn backspace(&mut self) {
        self.active_text().pop();
    }

    pub fn next_field(&mut self) {
        match self.active_field.next() {
            Some(f) => self.active_field = f,
            None => {
                self.active_row = (self.active_row + 1) % self.rows.len();
                self.active_field = FormField::Start;
            }
        }
    }

    pub fn prev_field(&mut self) {
        match self.active_field.prev() {
            Some(f) => self.active_field = f,
            None => {
                self.active_row = (self.active_row + self.rows.len() - 1) % self.rows.len();
                self.active_field = FormField::Label;
            }
        }
    }

    /// Move the focused time by `steps` picker steps. A time that does not
    /// parse snaps back to the start of the day.
    pub fn step_time(&mut self, steps: i32) {
        if self.active_field == FormField::Label {
            return;
        }
        let delta = steps * self.step_minutes as i32;
        let text = self.active_text();
        let next = match TimeValue::parse(text) {
            Ok(t) => t.step(delta),
            Err(_) => TimeValue::MIDNIGHT,
        };
        *text = next.to_string();
    }

    /// New row starting where the last one ends. Not available while editing.
    pub fn add_row(&mut self) -> bool {
        if self.editing.is_some() || self.rows.len() >= MAX_ROWS {
            return false;
        }
        let start = self
            .rows
            .last()
            .and_then(|r| TimeValue::parse(&r.end).ok())
            .filter(|t| !t.is_end_of_day())
            .unwrap_or(TimeValue::MIDNIGHT);
        self.rows.push(FormRow::blank(start));
        self.active_row = self.rows.len() - 1;
        self.active_field = FormField::Label;
        true
    }

    pub fn remove_row(&mut self) -> bool {
        if self.rows.len() <= 1 {
            return false;
        }
        self.rows.remove(self.active_row);
        self.active_row = self.active_row.min(self.rows.len() - 1);
        true
    }

    pub fn drafts(&self, user: &str, date: NaiveDate) -> Vec<EntryDraft> {
        self.rows
            .iter()
            .map(|r| {
                EntryDraft::new(user, date, r.start.as_str(), r.end.as_str(), r.label.as_str())
            })
            .collect()
    }
}

pub struct EntryForm;

impl EntryForm {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        state: &EntryFormState,
        user: &str,
        date: NaiveDate,
    ) {
        let t = theme::current();

        // Center the form popup
        let form_w = area.width.min(60).max(40);
        let form_h = (state.rows.len() as u16 + 6).min(area.height).max(7);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w, form_h);

        frame.render_widget(Clear, form_area);

        let block = Block::default()
            .title(state.title())
            .title_style(t.accent)
            .title_bottom(Line::from(Span::styled(
                format!(" {} · {} ", user, date.format("%Y-%m-%d")),
                t.dim,
            )))
            .borders(Borders::ALL)
            .border_style(t.accent.remove_modifier(Modifier::BOLD));

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let mut constraints = vec![Constraint::Length(1)];
        constraints.extend(state.rows.iter().map(|_| Constraint::Length(1)));
        constraints.extend([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)]);
        let lines = Layout::vertical(constraints).split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled("  Start   End     Label", t.dim)),
            lines[0],
        );

        for (i, row) in state.rows.iter().enumerate() {
            let focus = |field: FormField| i == state.active_row && state.active_field == field;
            let line = Line::from(vec![
                Span::styled(if i == state.active_row { "> " } else { "  " }, t.accent),
                field_span(&row.start, 6, focus(FormField::Start)),
                Span::raw("  "),
                field_span(&row.end, 6, focus(FormField::End)),
                Span::raw("  "),
                field_span(&row.label, 0, focus(FormField::Label)),
            ]);
            frame.render_widget(Paragraph::new(line), lines[i + 1]);
        }

        let key = Style::default().add_modifier(Modifier::BOLD);
        let mut help = vec![
            Span::styled("Tab", key),
            Span::styled(":Next ", t.dim),
            Span::styled("\u{2191}\u{2193}", key),
            Span::styled(":Time ", t.dim),
        ];
        if state.editing.is_none() {
            help.extend([
                Span::styled("^N", key),
                Span::styled(":Row ", t.dim),
                Span::styled("^D", key),
                Span::styled(":Drop ", t.dim),
            ]);
        }
        help.extend([
            Span::styled("Enter", key),
            Span::styled(":Save ", t.dim),
            Span::styled("Esc", key),
            Span::styled(":Cancel", t.dim),
        ]);
        frame.render_widget(Paragraph::new(Line::from(help)), lines[state.rows.len() + 2]);
    }
}

fn field_span(value: &str, width: usize, active: bool) -> Span<'static> {
    let cursor = if active { "_" } else { "" };
    let text = format!("{:<width$}", format!("{value}{cursor}"), width = width);
    if active {
        Span::styled(text, Style::default().fg(ratatui::style::Color::Cyan))
    } else {
        Span::raw(text)
    }
}
