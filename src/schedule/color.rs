use std::collections::HashMap;

use ratatui::style::Color;

use super::normalize::Segment;

pub const FREE_COLOR: Color = Color::Rgb(211, 211, 211);

pub const DEFAULT_PALETTE: [Color; 10] = [
    Color::Rgb(0xFF, 0x99, 0x99),
    Color::Rgb(0xFF, 0xCC, 0x99),
    Color::Rgb(0x99, 0xCC, 0xFF),
    Color::Rgb(0x99, 0xFF, 0x99),
    Color::Rgb(0xFF, 0xB3, 0xE6),
    Color::Rgb(0xCC, 0xCC, 0xFF),
    Color::Rgb(0xFF, 0xFF, 0x99),
    Color::Rgb(0xFF, 0x66, 0x66),
    Color::Rgb(0x66, 0xCC, 0xCC),
    Color::Rgb(0xFF, 0x99, 0x66),
];

/// Colors available to the clock chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPalette {
    pub free: Color,
    pub cycle: Vec<Color>,
    /// Fixed label colors, keyed by lowercase label.
    pub categories: HashMap<String, Color>,
}

impl Default for ChartPalette {
    fn default() -> Self {
        let categories = [
            ("meal", Color::Rgb(0xFF, 0xA5, 0x00)),
            ("sleep", Color::Rgb(0x6A, 0x5A, 0xCD)),
            ("work", Color::Rgb(0x46, 0x82, 0xB4)),
            ("free", FREE_COLOR),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            free: FREE_COLOR,
            cycle: DEFAULT_PALETTE.to_vec(),
            categories,
        }
    }
}

impl ChartPalette {
    pub fn set_category(&mut self, label: &str, color: Color) {
        self.categories.insert(label.trim().to_lowercase(), color);
    }
}

/// Hands out colors for one render pass. Known categories always get their
/// fixed color; other labels take the next palette color the first time
/// they are seen and keep it until the assigner is dropped.
pub struct ColorAssigner<'a> {
    palette: &'a ChartPalette,
    assigned: HashMap<String, Color>,
    next: usize,
}

impl<'a> ColorAssigner<'a> {
    pub fn new(palette: &'a ChartPalette) -> Self {
        Self {
            palette,
            assigned: HashMap::new(),
            next: 0,
        }
    }

    pub fn color_for(&mut self, segment: &Segment) -> Color {
        if segment.is_busy() {
            self.color_for_label(&segment.label)
        } else {
            self.palette.free
        }
    }

    pub fn color_for_label(&mut self, label: &str) -> Color {
        let key = label.trim().to_lowercase();
        if key.is_empty() {
            return self.palette.free;
        }
        if let Some(color) = self.palette.categories.get(&key) {
            return *color;
        }
        if let Some(color) = self.assigned.get(&key) {
            return *color;
        }
        if self.palette.cycle.is_empty() {
            return self.palette.free;
        }

        let color = self.palette.cycle[self.next % self.palette.cycle.len()];
        self.next += 1;
        self.assigned.insert(key, color);
        color
    }
}
