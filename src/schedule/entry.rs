use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::time::{TimeParseError, TimeValue};

/// Stable record identity, assigned once at append time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("end time must be after start time")]
    EndNotAfterStart,
    #[error("label is empty")]
    EmptyLabel,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error(transparent)]
    Format(#[from] TimeParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl EntryError {
    pub fn is_empty_label(&self) -> bool {
        matches!(self, EntryError::Validation(ValidationError::EmptyLabel))
    }
}

/// A validated, stored interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub id: EntryId,
    pub submitted_at: String,
    pub user: String,
    pub date: NaiveDate,
    pub start: TimeValue,
    pub end: TimeValue,
    pub label: String,
}

impl ScheduleEntry {
    pub fn duration_hours(&self) -> f64 {
        self.end.to_fractional_hours() - self.start.to_fractional_hours()
    }

    pub fn time_range_display(&self) -> String {
        format!("{}~{}", self.start.display_label(), self.end.display_label())
    }
}

/// What the form hands over: raw time text plus the chosen user and day.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub user: String,
    pub date: NaiveDate,
    pub start: String,
    pub end: String,
    pub label: String,
}

impl EntryDraft {
    pub fn new(
        user: impl Into<String>,
        date: NaiveDate,
        start: impl Into<String>,
        end: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            date,
            start: start.into(),
            end: end.into(),
            label: label.into(),
        }
    }

    pub fn validate(&self, id: EntryId, submitted_at: &str) -> Result<ScheduleEntry, EntryError> {
        // A blank label drops the draft whatever its times say.
        let label = self.label.trim();
        if label.is_empty() {
            return Err(ValidationError::EmptyLabel.into());
        }
        let start = TimeValue::parse(&self.start)?;
        let end = TimeValue::parse(&self.end)?;
        if end <= start {
            return Err(ValidationError::EndNotAfterStart.into());
        }

        Ok(ScheduleEntry {
            id,
            submitted_at: submitted_at.to_string(),
            user: self.user.clone(),
            date: self.date,
            start,
            end,
            label: label.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn validate_trims_label() {
        let draft = EntryDraft::new("Yumi", day(), "09:00", "10:30", "  study ");
        let entry = draft.validate(EntryId::new(), "2025-03-14 08:00:00").unwrap();
        assert_eq!(entry.label, "study");
        assert_eq!(entry.duration_hours(), 1.5);
    }

    #[test]
    fn validate_rejects_inverted_and_equal() {
        let equal = EntryDraft::new("Yumi", day(), "09:00", "09:00", "x");
        assert_eq!(
            equal.validate(EntryId::new(), ""),
            Err(EntryError::Validation(ValidationError::EndNotAfterStart))
        );
        let inverted = EntryDraft::new("Yumi", day(), "10:00", "09:00", "x");
        assert!(inverted.validate(EntryId::new(), "").is_err());
    }

    #[test]
    fn validate_reports_format_and_empty_label() {
        let bad_time = EntryDraft::new("Yumi", day(), "9am", "10:00", "x");
        assert!(matches!(
            bad_time.validate(EntryId::new(), ""),
            Err(EntryError::Format(_))
        ));

        let blank = EntryDraft::new("Yumi", day(), "09:00", "10:00", "   ");
        assert!(blank.validate(EntryId::new(), "").unwrap_err().is_empty_label());
    }

    #[test]
    fn blank_label_wins_over_bad_times() {
        let draft = EntryDraft::new("Yumi", day(), "", "25:00", " ");
        assert!(draft.validate(EntryId::new(), "").unwrap_err().is_empty_label());
    }

    #[test]
    fn ends_at_sentinel() {
        let draft = EntryDraft::new("Yumi", day(), "22:00", "24:00", "sleep");
        let entry = draft.validate(EntryId::new(), "").unwrap();
        assert_eq!(entry.time_range_display(), "22:00~00:00");
    }

    #[test]
    fn entry_id_round_trips_through_text() {
        let id = EntryId::new();
        assert_eq!(id.to_string().parse::<EntryId>().unwrap(), id);
    }
}
