mod app;
mod components;
mod config;
mod schedule;
mod theme;
mod tui;

use std::fs::{self, OpenOptions};
use std::time::Duration;

use app::{App, InputMode};
use color_eyre::Result;
use config::Config;
use crossterm::event::{KeyCode, KeyModifiers};
use log::info;
use ratatui::layout::{Constraint, Layout, Rect};
use schedule::{ScheduleStore, TomlTableFile};

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load();
    init_logging(&config)?;
    info!(
        "starting with {} users, table {}, theme {}",
        config.users.len(),
        config.data_file.display(),
        theme::current().name
    );

    let store = ScheduleStore::new(TomlTableFile::new(&config.data_file));
    let mut app = App::new(&config, store, theme::current().chart.clone());

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    tui::restore()?;
    result
}

/// Log to a file; stderr belongs to the alternate screen while we run.
fn init_logging(config: &Config) -> Result<()> {
    if let Some(dir) = config.log_file.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: user tabs + content + status bar
            let layout = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

            render_user_tabs(frame, layout[0], app);
            render_day(frame, layout[1], app);

            if let Some(ref form) = app.form_state {
                components::EntryForm::render(frame, area, form, app.user(), app.selected_date);
            }

            if app.show_help {
                render_help(frame, area);
            }

            components::StatusBar::render(frame, layout[2], app.input_mode, app.notice.as_ref());
        })?;

        if let Some(key) = tui::next_key_press(Duration::from_millis(250))? {
            // Clear status message on any key
            app.notice = None;

            // Help overlay takes priority
            if app.show_help {
                if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
                    app.show_help = false;
                }
                continue;
            }

            match app.input_mode {
                InputMode::Form => handle_form_input(app, key.code, key.modifiers),
                InputMode::Normal => handle_normal_input(app, key.code, key.modifiers),
            }
        }
    }

    Ok(())
}

fn handle_normal_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Char('t'), _) => app.go_to_today(),
        (KeyCode::Char('r'), _) => app.refresh_entries(),
        (KeyCode::Char('n'), _) => app.open_new_form(),
        (KeyCode::Char('e'), _) | (KeyCode::Enter, _) => app.open_edit_form(),
        (KeyCode::Char('d'), _) | (KeyCode::Delete, _) => app.delete_selected(),
        (KeyCode::Char('u'), _) | (KeyCode::Tab, _) => app.next_user(),
        (KeyCode::Char('U'), _) | (KeyCode::BackTab, _) => app.prev_user(),
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => app.prev_day(),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => app.next_day(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.select_prev(),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.select_next(),
        (KeyCode::Char('['), _) => app.prev_week(),
        (KeyCode::Char(']'), _) => app.next_week(),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn handle_form_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('n'), KeyModifiers::CONTROL) => app.form_add_row(),
        (KeyCode::Char('d'), KeyModifiers::CONTROL) => app.form_remove_row(),
        (KeyCode::Esc, _) => app.close_form(),
        (KeyCode::Enter, _) => app.submit_form(),
        (KeyCode::Tab, _) => app.form_tab(),
        (KeyCode::BackTab, _) => app.form_backtab(),
        (KeyCode::Up, _) => app.form_step_time(1),
        (KeyCode::Down, _) => app.form_step_time(-1),
        (KeyCode::Backspace, _) => app.form_backspace(),
        (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => app.form_input_char(c),
        _ => {}
    }
}

fn render_user_tabs(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    use ratatui::text::Span;
    use ratatui::widgets::Tabs;

    let t = theme::current();
    let date_style = if app.selected_date == app.today {
        t.today
    } else {
        t.header
    };

    let layout = Layout::horizontal([Constraint::Min(10), Constraint::Length(18)]).split(area);
    let tabs = Tabs::new(app.users.iter().map(|u| Span::raw(u.clone())))
        .select(app.user_index)
        .style(t.dim)
        .highlight_style(t.selected);
    frame.render_widget(tabs, layout[0]);
    frame.render_widget(
        ratatui::widgets::Paragraph::new(Span::styled(
            format!(" {} ", app.selected_date.format("%a %Y-%m-%d")),
            date_style,
        )),
        layout[1],
    );
}

fn render_day(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let clock = app.layout();

    if area.width < 70 {
        let rows = Layout::vertical([Constraint::Percentage(65), Constraint::Min(4)]).split(area);
        components::ClockView::render(frame, rows[0], app.user(), app.selected_date, &clock);
        components::EntryList::render(frame, rows[1], &app.entries, &clock, app.selected);
    } else {
        let list_w = if area.width >= 110 { 44 } else { 32 };
        let content =
            Layout::horizontal([Constraint::Min(30), Constraint::Length(list_w)]).split(area);
        components::ClockView::render(frame, content[0], app.user(), app.selected_date, &clock);
        components::EntryList::render(frame, content[1], &app.entries, &clock, app.selected);
    }
}

fn render_help(frame: &mut ratatui::Frame, area: Rect) {
    use ratatui::style::{Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

    let t = theme::current();
    let popup_w = area.width.min(52).max(30);
    let popup_h = area.height.min(24).max(12);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(t.accent)
        .borders(Borders::ALL)
        .border_style(t.accent.remove_modifier(Modifier::BOLD));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(ratatui::style::Color::Cyan).add_modifier(Modifier::BOLD);
    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let row = |keys: &'static str, desc: &'static str| {
        Line::from(vec![Span::styled(format!("  {:<10}", keys), key_style), Span::raw(desc)])
    };

    let lines = vec![
        Line::from(Span::styled("Navigation", section_style)),
        row("h/l", "Previous/next day"),
        row("[/]", "Previous/next week"),
        row("t", "Jump to today"),
        row("u/U", "Next/previous person"),
        row("j/k", "Select entry"),
        Line::from(""),
        Line::from(Span::styled("Entries", section_style)),
        row("n", "Add entries"),
        row("e/Enter", "Edit selected entry"),
        row("d", "Delete selected entry"),
        row("r", "Reload from disk"),
        Line::from(""),
        Line::from(Span::styled("Form", section_style)),
        row("Tab", "Next field"),
        row("\u{2191}/\u{2193}", "Step time"),
        row("Ctrl-N/D", "Add/remove row"),
        Line::from(""),
        row("q / Esc", "Quit / close popup"),
    ];

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
