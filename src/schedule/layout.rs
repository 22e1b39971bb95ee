//! Clock-face geometry for a day's segments.
//!
//! Angles are in degrees, counter-clockwise from the positive x axis, in
//! `[0, 360)`. Hour 0 sits at 90 (twelve o'clock) and time runs clockwise.
//! Radii are fractions of the chart radius, so any renderer can scale them.

use std::collections::BTreeSet;

use log::warn;
use ratatui::style::Color;

use super::color::ColorAssigner;
use super::normalize::Segment;
use super::time::{TimeValue, HOURS_PER_DAY};

pub const INLINE_MIN_HOURS: f64 = 1.0;
pub const INLINE_RADIUS: f64 = 0.6;
pub const LEADER_INNER_RADIUS: f64 = 0.8;
pub const LEADER_OUTER_RADIUS: f64 = 1.2;
pub const TICK_RADIUS: f64 = 1.05;

pub fn angle_for(hours: f64, total: f64) -> f64 {
    (90.0 - hours / total * 360.0).rem_euclid(360.0)
}

/// Point on the circle for an angle and a radius fraction.
pub fn polar(angle: f64, radius: f64) -> (f64, f64) {
    let rad = angle.to_radians();
    (radius * rad.cos(), radius * rad.sin())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelPlacement {
    Inline {
        angle: f64,
        radius: f64,
    },
    /// Label sits outside the rim with a line back to the wedge.
    Leader {
        angle: f64,
        inner_radius: f64,
        outer_radius: f64,
    },
}

impl LabelPlacement {
    pub fn for_duration(duration_hours: f64, mid_angle: f64) -> Self {
        if duration_hours >= INLINE_MIN_HOURS {
            LabelPlacement::Inline {
                angle: mid_angle,
                radius: INLINE_RADIUS,
            }
        } else {
            LabelPlacement::Leader {
                angle: mid_angle,
                inner_radius: LEADER_INNER_RADIUS,
                outer_radius: LEADER_OUTER_RADIUS,
            }
        }
    }

    /// Where the text goes.
    pub fn anchor(&self) -> (f64, f64) {
        match *self {
            LabelPlacement::Inline { angle, radius } => polar(angle, radius),
            LabelPlacement::Leader {
                angle,
                outer_radius,
                ..
            } => polar(angle, outer_radius),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentLayout {
    pub segment: Segment,
    pub start_angle: f64,
    pub end_angle: f64,
    /// Clockwise sweep from `start_angle`, in degrees.
    pub sweep: f64,
    pub color: Color,
    pub placement: Option<LabelPlacement>,
    pub text: String,
}

impl SegmentLayout {
    /// Whether `angle` falls inside this wedge's clockwise sweep.
    pub fn contains_angle(&self, angle: f64) -> bool {
        if self.sweep >= 360.0 {
            return true;
        }
        (self.start_angle - angle).rem_euclid(360.0) < self.sweep
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourTick {
    pub angle: f64,
    pub radius: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClockLayout {
    pub total_hours: f64,
    pub segments: Vec<SegmentLayout>,
    pub ticks: Vec<HourTick>,
}

impl ClockLayout {
    pub fn compute(segments: &[Segment], total_hours: f64, colors: &mut ColorAssigner) -> Self {
        let total = if total_hours > 0.0 {
            total_hours
        } else {
            warn!("clock layout asked for total {total_hours}h, using {HOURS_PER_DAY}h");
            HOURS_PER_DAY
        };

        let laid_out = segments
            .iter()
            .map(|segment| {
                let start = segment.start.to_fractional_hours();
                let end = segment.end.to_fractional_hours();
                let dur = end - start;
                let mid_angle = angle_for(start + dur / 2.0, total);

                let (placement, text) = if segment.is_busy() {
                    let text = if segment.overlaps_previous {
                        format!("!{}", segment.label)
                    } else {
                        segment.label.clone()
                    };
                    (Some(LabelPlacement::for_duration(dur, mid_angle)), text)
                } else {
                    (None, String::new())
                };

                SegmentLayout {
                    start_angle: angle_for(start, total),
                    end_angle: angle_for(end, total),
                    sweep: dur / total * 360.0,
                    color: colors.color_for(segment),
                    placement,
                    text,
                    segment: segment.clone(),
                }
            })
            .collect();

        Self {
            total_hours: total,
            segments: laid_out,
            ticks: hour_ticks(segments, total),
        }
    }

    /// Segments in draw order. Busy wedges come after free ones so an
    /// overlap shows the later entry on top.
    pub fn paint_order(&self) -> impl Iterator<Item = &SegmentLayout> {
        let free = self.segments.iter().filter(|s| s.placement.is_none());
        let busy = self.segments.iter().filter(|s| s.placement.is_some());
        free.chain(busy)
    }
}

fn hour_ticks(segments: &[Segment], total: f64) -> Vec<HourTick> {
    // Keyed in 1/10000 h so 24:00 and 00:00 collapse to one tick.
    let mut points: BTreeSet<u64> = BTreeSet::new();
    for segment in segments {
        for t in [segment.start, segment.end] {
            let mut h = (t.to_fractional_hours() * 10_000.0).round() as u64;
            if h.abs_diff((total * 10_000.0).round() as u64) < 100 {
                h = 0;
            }
            points.insert(h);
        }
    }

    points
        .into_iter()
        .map(|key| {
            let hours = key as f64 / 10_000.0;
            HourTick {
                angle: angle_for(hours, total),
                radius: TICK_RADIUS,
                text: TimeValue::from_fractional_hours(hours).display_label(),
            }
        })
        .collect()
}
