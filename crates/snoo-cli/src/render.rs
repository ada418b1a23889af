//! Tabular output for day and session exports.

use std::borrow::Cow;
use std::io::{self, Write};

use chrono::NaiveDate;
use serde::Serialize;
use snoo_core::{DayRecord, Session};

/// Layout used for session start and end times.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output encoding for exported rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Csv,
    Json,
}

/// A row with a fixed column order.
pub trait Row: Serialize {
    const HEADER: &'static [&'static str];

    fn fields(&self) -> Vec<String>;
}

/// One line of the `days` export.
#[derive(Debug, Serialize)]
pub struct DayRow<'a> {
    pub date: NaiveDate,
    pub naps: u32,
    pub longest_sleep: u32,
    pub total_sleep: u32,
    pub day_sleep: u32,
    pub night_sleep: u32,
    pub night_wakings: u32,
    pub timezone: &'a str,
}

impl<'a> From<&'a DayRecord> for DayRow<'a> {
    fn from(record: &'a DayRecord) -> Self {
        let day = &record.aggregate;
        Self {
            date: record.date,
            naps: day.naps,
            longest_sleep: day.longest_sleep,
            total_sleep: day.total_sleep,
            day_sleep: day.day_sleep,
            night_sleep: day.night_sleep,
            night_wakings: day.night_wakings,
            timezone: &day.timezone,
        }
    }
}

impl Row for DayRow<'_> {
    const HEADER: &'static [&'static str] = &[
        "date",
        "naps",
        "longest_sleep",
        "total_sleep",
        "day_sleep",
        "night_sleep",
        "night_wakings",
        "timezone",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.date.to_string(),
            self.naps.to_string(),
            self.longest_sleep.to_string(),
            self.total_sleep.to_string(),
            self.day_sleep.to_string(),
            self.night_sleep.to_string(),
            self.night_wakings.to_string(),
            self.timezone.to_string(),
        ]
    }
}

/// One line of the `sessions` export.
#[derive(Debug, Serialize)]
pub struct SessionRow<'a> {
    pub session_id: &'a str,
    pub start_time: String,
    pub end_time: String,
    pub duration: u64,
    pub asleep_duration: u64,
    pub soothing_duration: u64,
}

impl<'a> From<&'a Session> for SessionRow<'a> {
    fn from(session: &'a Session) -> Self {
        Self {
            session_id: &session.id,
            start_time: session.start_time.format(TIME_FORMAT).to_string(),
            end_time: session.end_time.format(TIME_FORMAT).to_string(),
            duration: session.total_duration(),
            asleep_duration: session.asleep_duration,
            soothing_duration: session.soothing_duration,
        }
    }
}

impl Row for SessionRow<'_> {
    const HEADER: &'static [&'static str] = &[
        "session_id",
        "start_time",
        "end_time",
        "duration",
        "asleep_duration",
        "soothing_duration",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.session_id.to_string(),
            self.start_time.clone(),
            self.end_time.clone(),
            self.duration.to_string(),
            self.asleep_duration.to_string(),
            self.soothing_duration.to_string(),
        ]
    }
}

/// Writes rows in the requested format.
pub fn write_rows<W: Write, R: Row>(writer: &mut W, rows: &[R], format: Format) -> io::Result<()> {
    match format {
        Format::Csv => write_csv(writer, rows),
        Format::Json => {
            serde_json::to_writer_pretty(&mut *writer, rows)?;
            writeln!(writer)
        }
    }
}

/// Writes a header line followed by one CSV record per row.
pub fn write_csv<W: Write, R: Row>(writer: &mut W, rows: &[R]) -> io::Result<()> {
    write_record(writer, R::HEADER.iter().copied())?;
    for row in rows {
        let fields = row.fields();
        write_record(writer, fields.iter().map(String::as_str))?;
    }
    Ok(())
}

fn write_record<'a, W: Write>(
    writer: &mut W,
    fields: impl Iterator<Item = &'a str>,
) -> io::Result<()> {
    let line = fields.map(escape).collect::<Vec<_>>().join(",");
    writeln!(writer, "{line}")
}

/// Quotes a field if it contains a delimiter, quote or line break.
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
