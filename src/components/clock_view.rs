use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine, Points},
        Block, Borders,
    },
    Frame,
};

use crate::schedule::layout::{polar, ClockLayout, LabelPlacement, SegmentLayout};
use crate::theme;

/// Canvas extent in chart radii. Leaves room for leader labels at 1.2.
const BOUND: f64 = 1.5;

pub struct ClockView;

impl ClockView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        user: &str,
        date: NaiveDate,
        layout: &ClockLayout,
    ) {
        let t = theme::current();
        let busy = layout.segments.iter().filter(|s| s.placement.is_some()).count();

        let block = Block::default()
            .title(format!(" {} · {} ", user, date.format("%a %Y-%m-%d")))
            .title_style(t.header)
            .title_bottom(Line::from(Span::styled(
                if busy == 0 {
                    " nothing planned ".to_string()
                } else {
                    format!(" {} planned ", busy)
                },
                t.dim,
            )))
            .borders(Borders::ALL)
            .border_style(t.border);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chart = square_cells(inner);
        if chart.width < 8 || chart.height < 4 {
            return;
        }

        let fills = wedge_fills(layout, chart);
        let cell_w = 2.0 * BOUND / chart.width as f64;

        let canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([-BOUND, BOUND])
            .y_bounds([-BOUND, BOUND])
            .paint(|ctx| {
                for (color, coords) in &fills {
                    if !coords.is_empty() {
                        ctx.draw(&Points {
                            coords,
                            color: *color,
                        });
                    }
                }
                ctx.layer();
                ctx.draw(&Circle {
                    x: 0.0,
                    y: 0.0,
                    radius: 1.0,
                    color: Color::Gray,
                });
                draw_labels(ctx, layout, cell_w);
            });
        frame.render_widget(canvas, chart);
    }
}

/// Largest rect with a roughly round aspect (cells are about twice as tall
/// as they are wide), centred in `area`.
fn square_cells(area: Rect) -> Rect {
    let h = area.height.min(area.width / 2);
    let w = h * 2;
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

/// Braille dot positions inside the unit circle, bucketed by wedge in paint
/// order. Later wedges win, so an overlap shows the later entry.
fn wedge_fills(layout: &ClockLayout, chart: Rect) -> Vec<(Color, Vec<(f64, f64)>)> {
    let wedges: Vec<&SegmentLayout> = layout.paint_order().collect();
    let mut fills: Vec<(Color, Vec<(f64, f64)>)> =
        wedges.iter().map(|w| (w.color, Vec::new())).collect();

    let dots_x = chart.width as usize * 2;
    let dots_y = chart.height as usize * 4;
    for j in 0..dots_y {
        let y = BOUND - (j as f64 + 0.5) * 2.0 * BOUND / dots_y as f64;
        for i in 0..dots_x {
            let x = -BOUND + (i as f64 + 0.5) * 2.0 * BOUND / dots_x as f64;
            if x.hypot(y) > 1.0 {
                continue;
            }
            let angle = y.atan2(x).to_degrees().rem_euclid(360.0);
            if let Some(idx) = wedges.iter().rposition(|w| w.contains_angle(angle)) {
                fills[idx].1.push((x, y));
            }
        }
    }
    fills
}

fn draw_labels(ctx: &mut Context, layout: &ClockLayout, cell_w: f64) {
    let t = theme::current();
    let centered = |text: &str, x: f64| x - text.chars().count() as f64 * cell_w / 2.0;

    for seg in layout.paint_order() {
        let Some(placement) = seg.placement else {
            continue;
        };
        // Edges of a busy wedge, so neighbours in similar colors stay apart.
        for edge in [seg.start_angle, seg.end_angle] {
            let (x2, y2) = polar(edge, 1.0);
            ctx.draw(&CanvasLine {
                x1: 0.0,
                y1: 0.0,
                x2,
                y2,
                color: Color::DarkGray,
            });
        }
        if let LabelPlacement::Leader {
            angle,
            inner_radius,
            outer_radius,
        } = placement
        {
            let (x1, y1) = polar(angle, inner_radius);
            let (x2, y2) = polar(angle, outer_radius);
            ctx.draw(&CanvasLine {
                x1,
                y1,
                x2,
                y2,
                color: Color::White,
            });
        }
        let (x, y) = placement.anchor();
        let style = Style::default()
            .fg(Color::Black)
            .bg(seg.color)
            .add_modifier(Modifier::BOLD);
        ctx.print(centered(&seg.text, x), y, Span::styled(seg.text.clone(), style));
    }

    for tick in &layout.ticks {
        let (x, y) = polar(tick.angle, tick.radius);
        ctx.print(centered(&tick.text, x), y, Span::styled(tick.text.clone(), t.dim));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{
        normalize, ChartPalette, ColorAssigner, EntryDraft, EntryId, HOURS_PER_DAY,
    };

    #[test]
    fn square_is_centered_and_round() {
        let r = square_cells(Rect::new(0, 0, 100, 20));
        assert_eq!((r.width, r.height), (40, 20));
        assert_eq!(r.x, 30);
    }

    #[test]
    fn every_dot_in_the_disc_belongs_to_a_wedge() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let entries = [("09:00", "10:00", "A"), ("12:00", "12:30", "B")]
            .iter()
            .map(|(s, e, l)| {
                EntryDraft::new("Yumi", date, *s, *e, *l)
                    .validate(EntryId::new(), "")
                    .unwrap()
            })
            .collect::<Vec<_>>();
        let palette = ChartPalette::default();
        let layout = ClockLayout::compute(
            &normalize(&entries),
            HOURS_PER_DAY,
            &mut ColorAssigner::new(&palette),
        );

        let fills = wedge_fills(&layout, Rect::new(0, 0, 40, 20));
        let filled: usize = fills.iter().map(|(_, dots)| dots.len()).sum();
        let disc = {
            let mut n = 0;
            for j in 0..80 {
                let y = BOUND - (j as f64 + 0.5) * 2.0 * BOUND / 80.0;
                for i in 0..80 {
                    let x = -BOUND + (i as f64 + 0.5) * 2.0 * BOUND / 80.0;
                    if x.hypot(y) <= 1.0 {
                        n += 1;
                    }
                }
            }
            n
        };
        assert_eq!(filled, disc);
        // paint order is the three free wedges, then A and B
        assert_eq!(fills.len(), 5);
        assert!(!fills[3].1.is_empty());
        assert!(!fills[4].1.is_empty());
    }
}
