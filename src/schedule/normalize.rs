use super::entry::ScheduleEntry;
use super::time::TimeValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Busy,
    Free,
}

/// One arc of the day. Produced fresh for every render.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub label: String,
    pub start: TimeValue,
    pub end: TimeValue,
    /// Starts before earlier busy time ended.
    pub overlaps_previous: bool,
}

impl Segment {
    fn free(start: TimeValue, end: TimeValue) -> Self {
        Self {
            kind: SegmentKind::Free,
            label: String::new(),
            start,
            end,
            overlaps_previous: false,
        }
    }

    pub fn duration_hours(&self) -> f64 {
        self.end.to_fractional_hours() - self.start.to_fractional_hours()
    }

    /// Busy with a label worth drawing. Blank labels count as free time.
    pub fn is_busy(&self) -> bool {
        self.kind == SegmentKind::Busy && !self.label.trim().is_empty()
    }
}

/// Sorts one user's entries for a day and fills the gaps with free time so
/// the result runs from 00:00 to 24:00.
///
/// Entries with equal starts keep their input order. Overlapping entries are
/// all kept; the later one is marked with `overlaps_previous`.
pub fn normalize(entries: &[ScheduleEntry]) -> Vec<Segment> {
    let mut sorted: Vec<&ScheduleEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.start);

    let mut segments = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut cursor = TimeValue::MIDNIGHT;

    for entry in sorted {
        if entry.start > cursor {
            segments.push(Segment::free(cursor, entry.start));
        }
        segments.push(Segment {
            kind: SegmentKind::Busy,
            label: entry.label.clone(),
            start: entry.start,
            end: entry.end,
            overlaps_previous: entry.start < cursor,
        });
        cursor = cursor.max(entry.end);
    }

    if cursor < TimeValue::END_OF_DAY {
        segments.push(Segment::free(cursor, TimeValue::END_OF_DAY));
    }

    segments
}
