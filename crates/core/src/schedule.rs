//! Schedule entries and their single parsing boundary.
//!
//! Every ingestion path (artifact load, add form, table edit) goes through
//! [`ScheduleEntry::from_record`], so the rest of the system only ever sees
//! a calendar date plus an optional wall-clock time.
//!
//! Ordering is derived at render time: by date, then time, with a missing
//! time sorting before any time of the same day. It is never persisted.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::warn;

/// Persisted date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persisted and displayed time format (minute precision).
pub const TIME_FORMAT: &str = "%H:%M";

/// Accepted time formats, most precise first.
const TIME_FORMATS: [&str; 3] = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

/// The wire form of a schedule row, as stored in the artifact and as
/// submitted by forms and the table editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub date: String,

    #[serde(default)]
    pub time: Option<String>,

    #[serde(default)]
    pub event: String,
}

/// A normalized schedule entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub event: String,
}

/// Parse a wall-clock time, trying formats in decreasing precision.
///
/// Sub-second precision is dropped. Returns `None` when nothing matches.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS.iter().find_map(|fmt| {
        NaiveTime::parse_from_str(raw, fmt)
            .ok()
            .and_then(|t| t.with_nanosecond(0))
    })
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

impl ScheduleEntry {
    pub fn new(date: NaiveDate, time: Option<NaiveTime>, event: impl Into<String>) -> Self {
        Self {
            date,
            time,
            event: event.into(),
        }
    }

    /// Normalize a wire record.
    ///
    /// An unparseable time is coerced to `None` and a warning is pushed onto
    /// `warnings`; the row itself is kept. An unparseable date cannot be
    /// represented and is returned as `Err` with a user-facing message.
    pub fn from_record(
        record: &ScheduleRecord,
        warnings: &mut Vec<String>,
    ) -> Result<Self, String> {
        let date = parse_date(&record.date).ok_or_else(|| {
            format!("Could not parse date '{}' (expected YYYY-MM-DD).", record.date)
        })?;

        let time = match record.time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = parse_time(raw);
                if parsed.is_none() {
                    warn!(time = %raw, "Unparseable schedule time, treating as empty");
                    warnings.push(format!(
                        "Could not parse time string '{raw}'. The entry is kept without a time."
                    ));
                }
                parsed
            }
        };

        Ok(Self {
            date,
            time,
            event: record.event.clone(),
        })
    }

    /// `HH:MM`, or an empty string when the entry has no time.
    pub fn time_label(&self) -> String {
        self.time
            .map(|t| t.format(TIME_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// The identity used for reconciliation: the tuple as it would be persisted.
    fn key(&self) -> (NaiveDate, Option<NaiveTime>, &str) {
        let minute = self
            .time
            .and_then(|t| NaiveTime::from_hms_opt(t.hour(), t.minute(), 0));
        (self.date, minute, self.event.as_str())
    }
}

impl From<&ScheduleEntry> for ScheduleRecord {
    fn from(entry: &ScheduleEntry) -> Self {
        Self {
            date: entry.date.format(DATE_FORMAT).to_string(),
            time: entry.time.map(|t| t.format(TIME_FORMAT).to_string()),
            event: entry.event.clone(),
        }
    }
}

/// Result of normalizing a batch of records.
#[derive(Debug, Default)]
pub struct Ingested {
    pub entries: Vec<ScheduleEntry>,
    pub warnings: Vec<String>,
}

/// Normalize persisted records. Rows whose date cannot be parsed are dropped
/// with a warning; everything else is kept in stored order.
pub fn ingest<'a>(records: impl IntoIterator<Item = &'a ScheduleRecord>) -> Ingested {
    let mut out = Ingested::default();
    for record in records {
        match ScheduleEntry::from_record(record, &mut out.warnings) {
            Ok(entry) => out.entries.push(entry),
            Err(msg) => {
                warn!(date = %record.date, event = %record.event, "Skipping schedule row");
                out.warnings.push(format!("{msg} Skipping entry '{}'.", record.event));
            }
        }
    }
    out
}

/// Normalize rows coming back from the table editor.
///
/// Rows with a blank event are treated as deleted. Any row with an invalid
/// date rejects the whole edit.
pub fn ingest_edited(rows: &[ScheduleRecord]) -> Result<Ingested, String> {
    let mut out = Ingested::default();
    for row in rows.iter().filter(|r| !r.event.trim().is_empty()) {
        let entry = ScheduleEntry::from_record(row, &mut out.warnings)?;
        out.entries.push(entry);
    }
    Ok(out)
}

/// Entries ordered for display: by date, then time, missing times first.
pub fn sorted(entries: &[ScheduleEntry]) -> Vec<ScheduleEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));
    sorted
}

/// Outcome of comparing an edited table against the persisted list.
#[derive(Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// Same multiset of (date, time, event) tuples. Nothing to write.
    Unchanged,
    /// The edited rows replace the persisted list.
    Changed(Vec<ScheduleEntry>),
}

/// Diff edited rows against the persisted list, ignoring order.
///
/// Duplicates count: two identical rows are not the same as one.
pub fn reconcile(persisted: &[ScheduleEntry], edited: Vec<ScheduleEntry>) -> Reconciliation {
    let unchanged = {
        let mut before: Vec<_> = persisted.iter().map(ScheduleEntry::key).collect();
        let mut after: Vec<_> = edited.iter().map(ScheduleEntry::key).collect();
        before.sort();
        after.sort();
        before == after
    };

    if unchanged {
        Reconciliation::Unchanged
    } else {
        Reconciliation::Changed(edited)
    }
}

/// Plain-text agenda handed to the assistant: one `- date time: event` line
/// per entry with a non-blank event, in display order.
pub fn agenda(entries: &[ScheduleEntry]) -> String {
    let mut text = String::new();
    for entry in sorted(entries) {
        if entry.event.trim().is_empty() {
            continue;
        }
        let _ = match entry.time {
            Some(_) => writeln!(
                text,
                "- {} {}: {}",
                entry.date.format(DATE_FORMAT),
                entry.time_label(),
                entry.event
            ),
            None => writeln!(text, "- {}: {}", entry.date.format(DATE_FORMAT), entry.event),
        };
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn record(date: &str, time: Option<&str>, event: &str) -> ScheduleRecord {
        ScheduleRecord {
            date: date.into(),
            time: time.map(Into::into),
            event: event.into(),
        }
    }

    #[test]
    fn parse_time_formats() {
        assert_eq!(parse_time("14:30"), Some(hm(14, 30)));
        assert_eq!(
            parse_time("14:30:45"),
            NaiveTime::from_hms_opt(14, 30, 45)
        );
        assert_eq!(
            parse_time("14:30:45.123"),
            NaiveTime::from_hms_opt(14, 30, 45)
        );
        assert_eq!(
            parse_time("09:05:00.123456"),
            NaiveTime::from_hms_opt(9, 5, 0)
        );
        assert_eq!(parse_time("not-a-time"), None);
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn unparseable_time_keeps_row_with_warning() {
        let mut warnings = Vec::new();
        let entry =
            ScheduleEntry::from_record(&record("2024-01-01", Some("not-a-time"), "x"), &mut warnings)
                .unwrap();
        assert_eq!(entry.time, None);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not-a-time"));
    }

    #[test]
    fn empty_time_is_null_without_warning() {
        let mut warnings = Vec::new();
        let entry =
            ScheduleEntry::from_record(&record("2024-01-01", Some(""), "x"), &mut warnings).unwrap();
        assert_eq!(entry.time, None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn ingest_drops_bad_dates_only() {
        let records = vec![
            record("2024-01-01", Some("09:00"), "standup"),
            record("01/02/2024", Some("10:00"), "bad date"),
            record("2024-01-03", Some("??"), "bad time"),
        ];
        let ingested = ingest(&records);
        assert_eq!(ingested.entries.len(), 2);
        assert_eq!(ingested.warnings.len(), 2);
    }

    #[test]
    fn record_roundtrip_uses_minute_precision() {
        let entry = ScheduleEntry::new(
            date("2024-01-01"),
            NaiveTime::from_hms_opt(9, 0, 30),
            "standup",
        );
        let rec = ScheduleRecord::from(&entry);
        assert_eq!(rec.date, "2024-01-01");
        assert_eq!(rec.time.as_deref(), Some("09:00"));
    }

    #[test]
    fn null_times_sort_first() {
        let entries = vec![
            ScheduleEntry::new(date("2024-01-02"), Some(hm(8, 0)), "b"),
            ScheduleEntry::new(date("2024-01-01"), Some(hm(0, 0)), "midnight"),
            ScheduleEntry::new(date("2024-01-01"), None, "no time"),
            ScheduleEntry::new(date("2024-01-01"), Some(hm(9, 0)), "a"),
        ];
        let events: Vec<_> = sorted(&entries).into_iter().map(|e| e.event).collect();
        assert_eq!(events, vec!["no time", "midnight", "a", "b"]);
    }

    #[test]
    fn reconcile_ignores_order() {
        let a = ScheduleEntry::new(date("2024-01-01"), Some(hm(9, 0)), "standup");
        let b = ScheduleEntry::new(date("2024-01-02"), None, "dentist");
        let persisted = vec![a.clone(), b.clone()];
        assert_eq!(reconcile(&persisted, vec![b, a]), Reconciliation::Unchanged);
    }

    #[test]
    fn reconcile_ignores_sub_minute_differences() {
        let legacy = ScheduleEntry::new(
            date("2024-01-01"),
            NaiveTime::from_hms_opt(9, 0, 45),
            "standup",
        );
        let edited = ScheduleEntry::new(date("2024-01-01"), Some(hm(9, 0)), "standup");
        assert_eq!(reconcile(&[legacy], vec![edited]), Reconciliation::Unchanged);
    }

    #[test]
    fn reconcile_counts_duplicates() {
        let a = ScheduleEntry::new(date("2024-01-01"), Some(hm(9, 0)), "standup");
        let result = reconcile(&[a.clone()], vec![a.clone(), a.clone()]);
        assert_eq!(result, Reconciliation::Changed(vec![a.clone(), a]));
    }

    #[test]
    fn edited_rows_skip_blank_events_and_reject_bad_dates() {
        let rows = vec![
            record("2024-01-01", Some("09:00"), "standup"),
            record("2024-01-01", Some("10:00"), "   "),
        ];
        assert_eq!(ingest_edited(&rows).unwrap().entries.len(), 1);

        let rows = vec![record("tomorrow", Some("09:00"), "standup")];
        assert!(ingest_edited(&rows).is_err());
    }

    #[test]
    fn agenda_lines_in_display_order() {
        let entries = vec![
            ScheduleEntry::new(date("2024-01-02"), Some(hm(8, 0)), "gym"),
            ScheduleEntry::new(date("2024-01-01"), None, "holiday"),
        ];
        assert_eq!(agenda(&entries), "- 2024-01-01: holiday\n- 2024-01-02 08:00: gym\n");
    }
}
