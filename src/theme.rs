use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use log::warn;
use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

use crate::config::APP_DIR;
use crate::schedule::ChartPalette;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Get the active theme (loaded once on first call).
pub fn current() -> &'static Theme {
    THEME.get_or_init(|| Theme::load().unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub today: Style,
    pub selected: Style,
    pub header: Style,
    pub dim: Style,
    pub border: Style,
    pub status: Style,
    pub accent: Style,
    pub warning: Style,
    pub chart: ChartPalette,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            today: Style::default().fg(Color::Black).bg(Color::Yellow),
            selected: Style::default().fg(Color::Black).bg(Color::Cyan),
            header: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::DarkGray),
            border: Style::default().fg(Color::Gray),
            status: Style::default().fg(Color::White).bg(Color::DarkGray),
            accent: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            warning: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            chart: ChartPalette::default(),
        }
    }
}

impl Theme {
    pub fn load() -> Option<Self> {
        let path = theme_path()?;
        if !path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(&path).ok()?;
        match toml::from_str::<ThemeConfig>(&content) {
            Ok(config) => Some(config.into_theme()),
            Err(e) => {
                warn!("ignoring invalid theme {}: {e}", path.display());
                None
            }
        }
    }

    /// Get a built-in preset by name.
    pub fn preset(name: &str) -> Self {
        match name {
            "dracula" => Self::dracula(),
            "nord" => Self::nord(),
            _ => Self::default(),
        }
    }

    fn dracula() -> Self {
        let mut chart = ChartPalette::default();
        chart.free = Color::Rgb(68, 71, 90);
        chart.cycle = vec![
            Color::Rgb(255, 121, 198), // pink
            Color::Rgb(139, 233, 253), // cyan
            Color::Rgb(80, 250, 123),  // green
            Color::Rgb(255, 184, 108), // orange
            Color::Rgb(189, 147, 249), // purple
            Color::Rgb(241, 250, 140), // yellow
        ];
        Self {
            name: "dracula".to_string(),
            today: Style::default().fg(Color::Black).bg(Color::Rgb(189, 147, 249)),
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(139, 233, 253)),
            header: Style::default().fg(Color::Rgb(248, 248, 242)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(98, 114, 164)),
            border: Style::default().fg(Color::Rgb(68, 71, 90)),
            status: Style::default()
                .fg(Color::Rgb(248, 248, 242))
                .bg(Color::Rgb(68, 71, 90)),
            accent: Style::default().fg(Color::Rgb(80, 250, 123)).add_modifier(Modifier::BOLD),
            warning: Style::default().fg(Color::Rgb(255, 184, 108)).add_modifier(Modifier::BOLD),
            chart,
        }
    }

    fn nord() -> Self {
        let mut chart = ChartPalette::default();
        chart.free = Color::Rgb(67, 76, 94);
        chart.cycle = vec![
            Color::Rgb(136, 192, 208), // frost
            Color::Rgb(163, 190, 140), // green
            Color::Rgb(235, 203, 139), // yellow
            Color::Rgb(208, 135, 112), // orange
            Color::Rgb(180, 142, 173), // purple
            Color::Rgb(191, 97, 106),  // red
        ];
        Self {
            name: "nord".to_string(),
            today: Style::default().fg(Color::Black).bg(Color::Rgb(235, 203, 139)),
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(136, 192, 208)),
            header: Style::default().fg(Color::Rgb(229, 233, 240)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(76, 86, 106)),
            border: Style::default().fg(Color::Rgb(67, 76, 94)),
            status: Style::default()
                .fg(Color::Rgb(229, 233, 240))
                .bg(Color::Rgb(67, 76, 94)),
            accent: Style::default().fg(Color::Rgb(163, 190, 140)).add_modifier(Modifier::BOLD),
            warning: Style::default().fg(Color::Rgb(235, 203, 139)).add_modifier(Modifier::BOLD),
            chart,
        }
    }
}

fn theme_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("theme.toml"))
}

// ── TOML config types ──

#[derive(Debug, Deserialize, Default)]
struct ThemeConfig {
    preset: Option<String>,
    selected_fg: Option<String>,
    selected_bg: Option<String>,
    header_fg: Option<String>,
    dim_fg: Option<String>,
    border_fg: Option<String>,
    status_fg: Option<String>,
    status_bg: Option<String>,
    /// Wedge color for free time.
    free: Option<String>,
    /// Cycle for labels without a fixed category color.
    palette: Option<Vec<String>>,
    #[serde(default)]
    categories: HashMap<String, String>,
}

impl ThemeConfig {
    fn into_theme(self) -> Theme {
        // Start from preset or default
        let mut theme = self
            .preset
            .as_deref()
            .map(Theme::preset)
            .unwrap_or_default();

        let fg = |style: &mut Style, value: &Option<String>| {
            if let Some(c) = value.as_deref().and_then(parse_color) {
                *style = style.fg(c);
            }
        };
        fg(&mut theme.selected, &self.selected_fg);
        fg(&mut theme.header, &self.header_fg);
        fg(&mut theme.dim, &self.dim_fg);
        fg(&mut theme.border, &self.border_fg);
        fg(&mut theme.status, &self.status_fg);
        if let Some(c) = self.selected_bg.as_deref().and_then(parse_color) {
            theme.selected = theme.selected.bg(c);
        }
        if let Some(c) = self.status_bg.as_deref().and_then(parse_color) {
            theme.status = theme.status.bg(c);
        }

        if let Some(c) = self.free.as_deref().and_then(parse_color) {
            theme.chart.free = c;
        }
        if let Some(list) = self.palette {
            let cycle: Vec<Color> = list.iter().filter_map(|s| parse_color(s)).collect();
            if !cycle.is_empty() {
                theme.chart.cycle = cycle;
            }
        }
        for (label, value) in &self.categories {
            match parse_color(value) {
                Some(c) => theme.chart.set_category(label, c),
                None => warn!("unknown color {value:?} for category {label:?}"),
            }
        }

        theme
    }
}

/// Parse a color string: hex "#rrggbb", or named colors.
fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if s.starts_with('#') && s.len() == 7 {
        let r = u8::from_str_radix(&s[1..3], 16).ok()?;
        let g = u8::from_str_radix(&s[3..5], 16).ok()?;
        let b = u8::from_str_radix(&s[5..7], 16).ok()?;
        return Some(Color::Rgb(r, g, b));
    }
    match s.to_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "lightgray" | "lightgrey" => Some(Color::Rgb(211, 211, 211)),
        "orange" => Some(Color::Rgb(255, 165, 0)),
        "lightred" => Some(Color::LightRed),
        "lightgreen" => Some(Color::LightGreen),
        "lightyellow" => Some(Color::LightYellow),
        "lightblue" => Some(Color::LightBlue),
        "lightmagenta" => Some(Color::LightMagenta),
        "lightcyan" => Some(Color::LightCyan),
        _ => None,
    }
}
