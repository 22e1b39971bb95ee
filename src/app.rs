use chrono::{Local, NaiveDate};
use log::{error, warn};

use crate::components::entry_form::EntryFormState;
use crate::config::Config;
use crate::schedule::{
    normalize, ChartPalette, ClockLayout, ColorAssigner, ScheduleEntry, ScheduleStore,
    StoreError, TableBackend, TomlTableFile, HOURS_PER_DAY,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), level: NoticeLevel::Info }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self { text: text.into(), level: NoticeLevel::Warning }
    }

    fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), level: NoticeLevel::Error }
    }
}

pub struct App<B: TableBackend = TomlTableFile> {
    pub running: bool,
    pub input_mode: InputMode,
    pub users: Vec<String>,
    pub user_index: usize,
    pub selected_date: NaiveDate,
    pub today: NaiveDate,
    /// The selected user's entries for the selected day, sorted by start.
    pub entries: Vec<ScheduleEntry>,
    pub selected: usize,
    pub form_state: Option<EntryFormState>,
    pub notice: Option<Notice>,
    pub show_help: bool,
    time_step_minutes: u16,
    palette: ChartPalette,
    store: ScheduleStore<B>,
}

impl<B: TableBackend> App<B> {
    pub fn new(config: &Config, store: ScheduleStore<B>, palette: ChartPalette) -> Self {
        Self::with_today(config, store, palette, Local::now().date_naive())
    }

    pub fn with_today(
        config: &Config,
        store: ScheduleStore<B>,
        palette: ChartPalette,
        today: NaiveDate,
    ) -> Self {
        let mut app = Self {
            running: true,
            input_mode: InputMode::Normal,
            users: config.users.clone(),
            user_index: 0,
            selected_date: today,
            today,
            entries: Vec::new(),
            selected: 0,
            form_state: None,
            notice: None,
            show_help: false,
            time_step_minutes: config.time_step_minutes,
            palette,
            store,
        };
        app.refresh_entries();
        app
    }

    pub fn user(&self) -> &str {
        self.users.get(self.user_index).map(String::as_str).unwrap_or("")
    }

    pub fn refresh_entries(&mut self) {
        match self.store.query(self.user(), self.selected_date) {
            Ok(mut entries) => {
                entries.sort_by_key(|e| e.start);
                self.entries = entries;
            }
            Err(e) => {
                error!("loading schedule failed: {e}");
                self.entries.clear();
                self.notice = Some(Notice::error(format!("Could not load schedule: {e}")));
            }
        }
        self.selected = self.selected.min(self.entries.len().saturating_sub(1));
    }

    /// Fresh chart geometry for the current user and day.
    pub fn layout(&self) -> ClockLayout {
        let mut colors = ColorAssigner::new(&self.palette);
        ClockLayout::compute(&normalize(&self.entries), HOURS_PER_DAY, &mut colors)
    }

    pub fn selected_entry(&self) -> Option<&ScheduleEntry> {
        self.entries.get(self.selected)
    }

    // ── navigation ──

    pub fn next_day(&mut self) {
        self.selected_date = self
            .selected_date
            .succ_opt()
            .unwrap_or(self.selected_date);
        self.on_view_changed();
    }

    pub fn prev_day(&mut self) {
        self.selected_date = self
            .selected_date
            .pred_opt()
            .unwrap_or(self.selected_date);
        self.on_view_changed();
    }

    pub fn next_week(&mut self) {
        self.selected_date += chrono::Duration::weeks(1);
        self.on_view_changed();
    }

    pub fn prev_week(&mut self) {
        self.selected_date -= chrono::Duration::weeks(1);
        self.on_view_changed();
    }

    pub fn go_to_today(&mut self) {
        self.today = Local::now().date_naive();
        self.selected_date = self.today;
        self.on_view_changed();
    }

    pub fn next_user(&mut self) {
        if !self.users.is_empty() {
            self.user_index = (self.user_index + 1) % self.users.len();
            self.on_view_changed();
        }
    }

    pub fn prev_user(&mut self) {
        if !self.users.is_empty() {
            self.user_index = (self.user_index + self.users.len() - 1) % self.users.len();
            self.on_view_changed();
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn on_view_changed(&mut self) {
        self.selected = 0;
        self.refresh_entries();
    }

    // ── form ──

    pub fn open_new_form(&mut self) {
        self.form_state = Some(EntryFormState::new(self.time_step_minutes));
        self.input_mode = InputMode::Form;
    }

    pub fn open_edit_form(&mut self) {
        let Some(entry) = self.selected_entry() else {
            self.notice = Some(Notice::warning("Nothing selected to edit"));
            return;
        };
        self.form_state = Some(EntryFormState::for_entry(entry, self.time_step_minutes));
        self.input_mode = InputMode::Form;
    }

    pub fn close_form(&mut self) {
        self.form_state = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn form_input_char(&mut self, c: char) {
        if let Some(form) = self.form_state.as_mut() {
            form.input_char(c);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(form) = self.form_state.as_mut() {
            form.backspace();
        }
    }

    pub fn form_tab(&mut self) {
        if let Some(form) = self.form_state.as_mut() {
            form.next_field();
        }
    }

    pub fn form_backtab(&mut self) {
        if let Some(form) = self.form_state.as_mut() {
            form.prev_field();
        }
    }

    pub fn form_step_time(&mut self, steps: i32) {
        if let Some(form) = self.form_state.as_mut() {
            form.step_time(steps);
        }
    }

    pub fn form_add_row(&mut self) {
        if let Some(form) = self.form_state.as_mut() {
            if !form.add_row() {
                self.notice = Some(Notice::warning("Cannot add another row here"));
            }
        }
    }

    pub fn form_remove_row(&mut self) {
        if let Some(form) = self.form_state.as_mut() {
            form.remove_row();
        }
    }

    pub fn submit_form(&mut self) {
        let Some(form) = self.form_state.as_ref() else {
            return;
        };
        let drafts = form.drafts(self.user(), self.selected_date);
        let editing = form.editing;

        match editing {
            Some(id) => match self.store.update(id, &drafts[0]) {
                Ok(()) => {
                    self.notice = Some(Notice::info("Entry updated"));
                    self.close_form();
                    self.refresh_entries();
                }
                Err(e) if e.is_not_found() => {
                    self.notice = Some(Notice::warning("That entry no longer exists"));
                    self.close_form();
                    self.refresh_entries();
                }
                Err(StoreError::Entry(e)) => {
                    self.notice = Some(Notice::warning(e.to_string()));
                }
                Err(e) => {
                    error!("update failed: {e}");
                    self.notice = Some(Notice::error(format!("Could not save: {e}")));
                }
            },
            None => match self.store.append(&drafts) {
                Ok(report) => {
                    let added = report.count();
                    let skipped = report.skipped_empty + report.rejected.len();
                    self.notice = Some(match report.rejected.first() {
                        None if skipped == 0 => Notice::info(format!("Added {added} entries")),
                        None => Notice::warning(format!(
                            "Added {added}, skipped {skipped} without a label"
                        )),
                        Some((idx, e)) => Notice::warning(format!(
                            "Added {added}, skipped {skipped} (row {}: {e})",
                            idx + 1
                        )),
                    });
                    if added > 0 {
                        self.close_form();
                        self.refresh_entries();
                    }
                }
                Err(e) => {
                    error!("append failed: {e}");
                    self.notice = Some(Notice::error(format!("Could not save: {e}")));
                }
            },
        }
    }

    pub fn delete_selected(&mut self) {
        let Some(entry) = self.selected_entry().cloned() else {
            self.notice = Some(Notice::warning("Nothing selected to delete"));
            return;
        };
        self.notice = Some(match self.store.delete(entry.id) {
            Ok(()) => Notice::info(format!(
                "Deleted {} {}",
                entry.time_range_display(),
                entry.label
            )),
            Err(StoreError::NotFound) => {
                warn!("entry {} vanished before delete", entry.id);
                Notice::warning("That entry was already deleted")
            }
            Err(e) => {
                error!("delete failed: {e}");
                Notice::error(format!("Could not delete: {e}"))
            }
        });
        self.refresh_entries();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::entry_form::FormField;
    use crate::schedule::normalize::SegmentKind;
    use crate::schedule::store::MemoryTable;
    use crate::schedule::EntryDraft;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn app() -> App<MemoryTable> {
        App::with_today(
            &Config::default(),
            ScheduleStore::new(MemoryTable::default()),
            ChartPalette::default(),
            day(),
        )
    }

    fn type_text(app: &mut App<MemoryTable>, text: &str) {
        text.chars().for_each(|c| app.form_input_char(c));
    }

    fn set_times(app: &mut App<MemoryTable>, start: &str, end: &str) {
        let form = app.form_state.as_mut().unwrap();
        let row = &mut form.rows[form.active_row];
        row.start = start.to_string();
        row.end = end.to_string();
    }

    #[test]
    fn empty_day_renders_full_free_circle() {
        let app = app();
        assert!(app.entries.is_empty());
        let layout = app.layout();
        assert_eq!(layout.segments.len(), 1);
        assert_eq!(layout.segments[0].segment.kind, SegmentKind::Free);
    }

    #[test]
    fn submitting_the_form_adds_entries() {
        let mut app = app();
        app.open_new_form();
        assert_eq!(app.input_mode, InputMode::Form);
        type_text(&mut app, "study");
        set_times(&mut app, "13:00", "15:00");
        app.form_add_row();
        type_text(&mut app, "meal");
        set_times(&mut app, "12:00", "13:00");
        app.submit_form();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Info);
        let labels: Vec<&str> = app.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["meal", "study"]);
    }

    #[test]
    fn invalid_only_submission_keeps_form_open() {
        let mut app = app();
        app.open_new_form();
        type_text(&mut app, "nap");
        set_times(&mut app, "15:00", "14:00");
        app.submit_form();

        assert!(app.form_state.is_some());
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Warning);
        assert!(app.entries.is_empty());
    }

    #[test]
    fn edit_and_delete_selected_entry() {
        let mut app = app();
        app.open_new_form();
        type_text(&mut app, "gym");
        set_times(&mut app, "07:00", "08:00");
        app.submit_form();
        let id = app.entries[0].id;

        app.open_edit_form();
        {
            let form = app.form_state.as_mut().unwrap();
            assert_eq!(form.active_field, FormField::Label);
        }
        app.form_backspace();
        app.form_backspace();
        app.form_backspace();
        type_text(&mut app, "swim");
        app.form_tab();
        app.form_tab();
        app.form_step_time(1);
        app.submit_form();

        assert_eq!(app.entries.len(), 1);
        assert_eq!(app.entries[0].id, id);
        assert_eq!(app.entries[0].label, "swim");
        assert_eq!(app.entries[0].end.to_string(), "08:30");

        app.delete_selected();
        assert!(app.entries.is_empty());
        assert!(app.notice.as_ref().unwrap().text.starts_with("Deleted 07:00~08:30"));
    }

    #[test]
    fn users_keep_separate_schedules() {
        let mut app = app();
        app.open_new_form();
        type_text(&mut app, "mine");
        app.submit_form();
        assert_eq!(app.entries.len(), 1);

        app.next_user();
        assert_eq!(app.user(), "Yumi");
        assert!(app.entries.is_empty());

        app.prev_user();
        app.next_day();
        assert!(app.entries.is_empty());
        app.prev_day();
        assert_eq!(app.entries.len(), 1);
    }

    #[test]
    fn delete_with_nothing_selected_warns() {
        let mut app = app();
        app.delete_selected();
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Warning);
    }

    #[test]
    fn stale_edit_reports_missing_entry() {
        let mut app = app();
        let mut other = ScheduleStore::new(MemoryTable::default());
        let report = other
            .append(&[EntryDraft::new("Gunjishima", day(), "09:00", "10:00", "ghost")])
            .unwrap();
        let ghost = other.entry(report.appended[0]).unwrap();

        app.entries = vec![ghost];
        app.open_edit_form();
        app.submit_form();
        assert_eq!(app.notice.as_ref().unwrap().text, "That entry no longer exists");
        assert!(app.form_state.is_none());
    }
}
