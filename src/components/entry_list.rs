use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::schedule::layout::SegmentLayout;
use crate::schedule::{ClockLayout, ScheduleEntry};
use crate::theme;

pub struct EntryList;

impl EntryList {
    /// `entries` must be in chart order (sorted by start).
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        entries: &[ScheduleEntry],
        layout: &ClockLayout,
        selected: usize,
    ) {
        let t = theme::current();
        let busy_hours: f64 = entries.iter().map(ScheduleEntry::duration_hours).sum();

        let block = Block::default()
            .title(" Entries ")
            .title_style(t.header)
            .title_bottom(Line::from(Span::styled(
                format!(" {:.1}h of {}h busy ", busy_hours, layout.total_hours),
                t.dim,
            )))
            .borders(Borders::ALL)
            .border_style(t.border);

        if entries.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new(vec![
                Line::from(Span::styled("No entries for this day", t.warning)),
                Line::from(Span::styled("Press n to add one", t.dim)),
            ]);
            frame.render_widget(msg, inner);
            return;
        }

        // Busy wedges come out of the same stable start sort as `entries`.
        let mut wedges = layout.segments.iter().filter(|s| s.placement.is_some());
        let items: Vec<ListItem> = entries
            .iter()
            .map(|e| format_entry(e, wedges.next()))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(t.selected)
            .highlight_symbol("\u{25b8}");
        let mut state = ListState::default().with_selected(Some(selected.min(entries.len() - 1)));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn format_entry(entry: &ScheduleEntry, wedge: Option<&SegmentLayout>) -> ListItem<'static> {
    let (color, overlaps) = wedge_marks(wedge);

    let mut spans = vec![
        Span::styled("  ", Style::default().bg(color)),
        Span::styled(
            format!(" {} ", entry.time_range_display()),
            Style::default().add_modifier(Modifier::DIM),
        ),
        Span::raw(entry.label.clone()),
    ];
    if overlaps {
        spans.push(Span::styled(" (overlaps)", theme::current().warning));
    }
    ListItem::new(Line::from(spans))
}

/// Swatch color and overlap flag, matching what the chart shows.
fn wedge_marks(wedge: Option<&SegmentLayout>) -> (Color, bool) {
    wedge.map_or((Color::White, false), |w| (w.color, w.segment.overlaps_previous))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::schedule::{
        normalize, ChartPalette, ColorAssigner, EntryDraft, EntryId, HOURS_PER_DAY,
    };

    #[test]
    fn twin_entries_each_get_their_own_wedge() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let entries: Vec<ScheduleEntry> = [("09:00", "10:00", "gym"), ("09:00", "10:00", "gym")]
            .iter()
            .map(|(s, e, l)| {
                EntryDraft::new("Yumi", date, *s, *e, *l)
                    .validate(EntryId::new(), "")
                    .unwrap()
            })
            .collect();
        let palette = ChartPalette::default();
        let layout = ClockLayout::compute(
            &normalize(&entries),
            HOURS_PER_DAY,
            &mut ColorAssigner::new(&palette),
        );

        let marks: Vec<(Color, bool)> = layout
            .segments
            .iter()
            .filter(|s| s.placement.is_some())
            .map(|w| wedge_marks(Some(w)))
            .collect();
        assert_eq!(marks.len(), entries.len());
        assert!(!marks[0].1);
        assert!(marks[1].1);
        assert_eq!(marks[0].0, marks[1].0);
        assert_eq!(wedge_marks(None), (Color::White, false));
    }
}
