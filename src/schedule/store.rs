use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entry::{EntryDraft, EntryError, EntryId, ScheduleEntry};
use super::time::TimeValue;

const DATE_FORMAT: &str = "%Y-%m-%d";
const SUBMITTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no such schedule record")]
    NotFound,
    #[error("schedule storage unavailable: {0}")]
    StorageUnavailable(#[from] io::Error),
    #[error("schedule table is unreadable: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Entry(#[from] EntryError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// One persisted row. Everything is text so a single bad row can be skipped
/// without losing the rest of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub submitted_at: String,
    pub user: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub label: String,
    pub id: String,
}

impl From<&ScheduleEntry> for ScheduleRow {
    fn from(entry: &ScheduleEntry) -> Self {
        Self {
            submitted_at: entry.submitted_at.clone(),
            user: entry.user.clone(),
            date: entry.date.format(DATE_FORMAT).to_string(),
            start: entry.start.to_string(),
            end: entry.end.to_string(),
            label: entry.label.clone(),
            id: entry.id.to_string(),
        }
    }
}

impl ScheduleRow {
    fn to_entry(&self) -> Option<ScheduleEntry> {
        let entry = ScheduleEntry {
            id: self.id.parse().ok()?,
            submitted_at: self.submitted_at.clone(),
            user: self.user.clone(),
            date: NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()?,
            start: TimeValue::parse(&self.start).ok()?,
            end: TimeValue::parse(&self.end).ok()?,
            label: self.label.clone(),
        };
        (entry.start < entry.end).then_some(entry)
    }
}

/// Row-level storage primitives a schedule table needs.
pub trait TableBackend {
    /// All rows in stored order. `StoreError::NotFound` when the table has
    /// never been written.
    fn read_rows(&self) -> Result<Vec<ScheduleRow>, StoreError>;
    fn append_rows(&mut self, rows: &[ScheduleRow]) -> Result<(), StoreError>;
    fn overwrite_rows(&mut self, rows: &[ScheduleRow]) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RowTable {
    #[serde(default)]
    row: Vec<ScheduleRow>,
}

/// A TOML file of `[[row]]` tables.
pub struct TomlTableFile {
    path: PathBuf,
}

impl TomlTableFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// No rows encode as an empty document; `row = []` would clash with the
    /// `[[row]]` tables a later append adds.
    fn encode(rows: &[ScheduleRow]) -> Result<String, StoreError> {
        if rows.is_empty() {
            return Ok(String::new());
        }
        toml::to_string(&RowTable { row: rows.to_vec() })
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn ensure_parent(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
            _ => Ok(()),
        }
    }
}

impl TableBackend for TomlTableFile {
    fn read_rows(&self) -> Result<Vec<ScheduleRow>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };
        let table: RowTable =
            toml::from_str(&content).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(table.row)
    }

    fn append_rows(&mut self, rows: &[ScheduleRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        // Appending more [[row]] tables to the end keeps the document valid.
        let mut chunk = Self::encode(rows)?;
        chunk.insert(0, '\n');
        self.ensure_parent()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(chunk.as_bytes())?;
        Ok(())
    }

    fn overwrite_rows(&mut self, rows: &[ScheduleRow]) -> Result<(), StoreError> {
        let content = Self::encode(rows)?;
        self.ensure_parent()?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Rows kept in memory. `None` until something is written.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryTable {
    rows: Option<Vec<ScheduleRow>>,
}

#[cfg(test)]
impl TableBackend for MemoryTable {
    fn read_rows(&self) -> Result<Vec<ScheduleRow>, StoreError> {
        self.rows.clone().ok_or(StoreError::NotFound)
    }

    fn append_rows(&mut self, rows: &[ScheduleRow]) -> Result<(), StoreError> {
        self.rows.get_or_insert_with(Vec::new).extend_from_slice(rows);
        Ok(())
    }

    fn overwrite_rows(&mut self, rows: &[ScheduleRow]) -> Result<(), StoreError> {
        self.rows = Some(rows.to_vec());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct AppendReport {
    pub appended: Vec<EntryId>,
    pub skipped_empty: usize,
    /// Draft index and the reason it was refused.
    pub rejected: Vec<(usize, EntryError)>,
}

impl AppendReport {
    pub fn count(&self) -> usize {
        self.appended.len()
    }
}

pub struct ScheduleStore<B> {
    backend: B,
}

impl<B: TableBackend> ScheduleStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Validates every draft and writes the good ones in a single backend
    /// call. Blank labels are dropped quietly; other failures are reported.
    pub fn append(&mut self, drafts: &[EntryDraft]) -> Result<AppendReport, StoreError> {
        let submitted_at = Local::now().format(SUBMITTED_AT_FORMAT).to_string();
        let mut report = AppendReport::default();
        let mut rows = Vec::new();

        for (idx, draft) in drafts.iter().enumerate() {
            match draft.validate(EntryId::new(), &submitted_at) {
                Ok(entry) => {
                    report.appended.push(entry.id);
                    rows.push(ScheduleRow::from(&entry));
                }
                Err(e) if e.is_empty_label() => report.skipped_empty += 1,
                Err(e) => {
                    warn!("rejected entry {idx} for {} on {}: {e}", draft.user, draft.date);
                    report.rejected.push((idx, e));
                }
            }
        }

        self.backend.append_rows(&rows)?;
        info!(
            "appended {} entries ({} blank, {} rejected)",
            report.count(),
            report.skipped_empty,
            report.rejected.len()
        );
        Ok(report)
    }

    /// Entries for one user on one day, in stored order. A table that does
    /// not exist yet reads as empty.
    pub fn query(&self, user: &str, date: NaiveDate) -> Result<Vec<ScheduleEntry>, StoreError> {
        let rows = match self.backend.read_rows() {
            Ok(rows) => rows,
            Err(StoreError::NotFound) => {
                debug!("schedule table missing, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let entries: Vec<ScheduleEntry> = parse_rows(&rows)
            .into_iter()
            .filter(|e| e.user == user && e.date == date)
            .collect();
        debug!("query {user} {date}: {} entries", entries.len());
        Ok(entries)
    }

    pub fn entry(&self, id: EntryId) -> Result<ScheduleEntry, StoreError> {
        parse_rows(&self.backend.read_rows()?)
            .into_iter()
            .find(|e| e.id == id)
            .ok_or(StoreError::NotFound)
    }

    /// Replaces every field of one record except its id and position.
    pub fn update(&mut self, id: EntryId, draft: &EntryDraft) -> Result<(), StoreError> {
        let mut rows = self.backend.read_rows()?;
        let key = id.to_string();
        let slot = rows
            .iter_mut()
            .find(|r| r.id == key)
            .ok_or(StoreError::NotFound)?;

        let submitted_at = Local::now().format(SUBMITTED_AT_FORMAT).to_string();
        let entry = draft.validate(id, &submitted_at)?;
        *slot = ScheduleRow::from(&entry);

        self.backend.overwrite_rows(&rows)?;
        info!("updated entry {id}");
        Ok(())
    }

    pub fn delete(&mut self, id: EntryId) -> Result<(), StoreError> {
        let mut rows = self.backend.read_rows()?;
        let key = id.to_string();
        let before = rows.len();
        rows.retain(|r| r.id != key);
        if rows.len() == before {
            return Err(StoreError::NotFound);
        }

        self.backend.overwrite_rows(&rows)?;
        info!("deleted entry {id}");
        Ok(())
    }
}

fn parse_rows(rows: &[ScheduleRow]) -> Vec<ScheduleEntry> {
    rows.iter()
        .filter_map(|row| {
            let entry = row.to_entry();
            if entry.is_none() {
                warn!("skipping malformed schedule row {row:?}");
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::entry::ValidationError;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn draft(start: &str, end: &str, label: &str) -> EntryDraft {
        EntryDraft::new("Yumi", day(), start, end, label)
    }

    fn memory_store() -> ScheduleStore<MemoryTable> {
        ScheduleStore::new(MemoryTable::default())
    }

    #[test]
    fn append_keeps_valid_entries_from_mixed_batch() {
        let mut store = memory_store();
        let report = store
            .append(&[draft("09:00", "10:00", "A"), draft("11:00", "11:00", "B")])
            .unwrap();
        assert_eq!(report.count(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, 1);
        assert_eq!(
            report.rejected[0].1,
            EntryError::Validation(ValidationError::EndNotAfterStart)
        );
        assert_eq!(store.query("Yumi", day()).unwrap().len(), 1);
    }

    #[test]
    fn blank_labels_are_dropped_quietly() {
        let mut store = memory_store();
        let report = store
            .append(&[
                draft("09:00", "10:00", "  "),
                draft("10:00", "11:00", "x"),
                draft("", "9am", ""),
            ])
            .unwrap();
        assert_eq!(report.count(), 1);
        assert_eq!(report.skipped_empty, 2);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn query_round_trip_trims_label() {
        let mut store = memory_store();
        let report = store.append(&[draft("22:00", "24:00", "  sleep  ")]).unwrap();
        let entries = store.query("Yumi", day()).unwrap();
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.id, report.appended[0]);
        assert_eq!(e.label, "sleep");
        assert_eq!(e.start.to_string(), "22:00");
        assert_eq!(e.end, TimeValue::END_OF_DAY);
    }

    #[test]
    fn query_filters_by_user_and_day() {
        let mut store = memory_store();
        let other_day = day().succ_opt().unwrap();
        store
            .append(&[
                draft("09:00", "10:00", "mine"),
                EntryDraft::new("Gunjishima", day(), "09:00", "10:00", "theirs"),
                EntryDraft::new("Yumi", other_day, "09:00", "10:00", "tomorrow"),
            ])
            .unwrap();
        let labels: Vec<String> = store
            .query("Yumi", day())
            .unwrap()
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(labels, ["mine"]);
    }

    #[test]
    fn missing_table_reads_empty_but_mutations_fail() {
        let mut store = memory_store();
        assert!(store.query("Yumi", day()).unwrap().is_empty());
        assert!(store.delete(EntryId::new()).unwrap_err().is_not_found());
        assert!(store
            .update(EntryId::new(), &draft("09:00", "10:00", "x"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn update_keeps_identity_and_position() {
        let mut store = memory_store();
        let report = store
            .append(&[
                draft("09:00", "10:00", "same"),
                draft("09:00", "10:00", "same"),
                draft("13:00", "14:00", "last"),
            ])
            .unwrap();
        let target = report.appended[1];

        store.update(target, &draft("15:00", "16:30", "moved")).unwrap();

        let entries = store.query("Yumi", day()).unwrap();
        assert_eq!(entries[1].id, target);
        assert_eq!(entries[1].label, "moved");
        assert_eq!(entries[1].start.to_string(), "15:00");
        assert_eq!(entries[0].label, "same");
        assert_eq!(store.entry(target).unwrap().end.to_string(), "16:30");
    }

    #[test]
    fn update_rejects_invalid_fields() {
        let mut store = memory_store();
        let id = store.append(&[draft("09:00", "10:00", "A")]).unwrap().appended[0];
        let err = store.update(id, &draft("10:00", "09:00", "A")).unwrap_err();
        assert!(matches!(err, StoreError::Entry(_)));
        assert_eq!(store.entry(id).unwrap().start.to_string(), "09:00");
    }

    #[test]
    fn delete_targets_one_of_two_identical_records() {
        let mut store = memory_store();
        let report = store
            .append(&[draft("09:00", "10:00", "twin"), draft("09:00", "10:00", "twin")])
            .unwrap();
        store.delete(report.appended[0]).unwrap();

        let entries = store.query("Yumi", day()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, report.appended[1]);
        assert!(store.delete(report.appended[0]).unwrap_err().is_not_found());
    }

    #[test]
    fn toml_file_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let table = TomlTableFile::new(dir.path().join("schedule.toml"));
        assert!(table.read_rows().unwrap_err().is_not_found());
        let store = ScheduleStore::new(table);
        assert!(store.query("Yumi", day()).unwrap().is_empty());
    }

    #[test]
    fn toml_file_appends_and_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("schedule.toml");
        let mut store = ScheduleStore::new(TomlTableFile::new(&path));

        let first = store.append(&[draft("09:00", "10:00", "A")]).unwrap();
        let second = store
            .append(&[draft("12:00", "13:00", "B"), draft("22:00", "24:00", "C")])
            .unwrap();
        assert_eq!(store.query("Yumi", day()).unwrap().len(), 3);

        store.delete(first.appended[0]).unwrap();
        store.update(second.appended[1], &draft("21:00", "24:00", "C")).unwrap();

        let reopened = ScheduleStore::new(TomlTableFile::new(&path));
        let entries = reopened.query("Yumi", day()).unwrap();
        let got: Vec<String> = entries
            .iter()
            .map(|e| format!("{} {}", e.time_range_display(), e.label))
            .collect();
        assert_eq!(got, ["12:00~13:00 B", "21:00~00:00 C"]);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("[[row]]"));
        assert!(raw.contains("end = \"24:00\""));
    }

    #[test]
    fn toml_file_accepts_appends_after_last_row_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.toml");
        let mut store = ScheduleStore::new(TomlTableFile::new(&path));

        let first = store.append(&[draft("09:00", "10:00", "A")]).unwrap();
        store.delete(first.appended[0]).unwrap();
        assert!(!fs::read_to_string(&path).unwrap().contains("row = []"));

        let second = store.append(&[draft("12:00", "13:00", "B")]).unwrap();
        assert_eq!(second.count(), 1);
        let entries = store.query("Yumi", day()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "B");
        store.delete(second.appended[0]).unwrap();
    }

    #[test]
    fn toml_file_emptied_by_deletes_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.toml");
        let mut store = ScheduleStore::new(TomlTableFile::new(&path));

        let report = store
            .append(&[draft("09:00", "10:00", "A"), draft("12:00", "13:00", "B")])
            .unwrap();
        for id in &report.appended {
            store.delete(*id).unwrap();
        }
        assert!(path.exists());
        assert!(store.query("Yumi", day()).unwrap().is_empty());
        assert!(store.delete(report.appended[0]).unwrap_err().is_not_found());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let mut table = MemoryTable::default();
        let good = draft("09:00", "10:00", "ok")
            .validate(EntryId::new(), "now")
            .unwrap();
        let mut bad = ScheduleRow::from(&good);
        bad.id = EntryId::new().to_string();
        bad.start = "nine".to_string();
        table
            .overwrite_rows(&[ScheduleRow::from(&good), bad])
            .unwrap();

        let store = ScheduleStore::new(table);
        let entries = store.query("Yumi", day()).unwrap();
        assert_eq!(entries, vec![good]);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.toml");
        fs::write(&path, "this is = = not toml").unwrap();
        let store = ScheduleStore::new(TomlTableFile::new(&path));
        assert!(matches!(
            store.query("Yumi", day()),
            Err(StoreError::Corrupt(_))
        ));
    }
}
