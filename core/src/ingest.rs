//! Event log readers.
//!
//! Bulk-read only: a whole file is loaded and validated up front, and the
//! first bad row aborts the load.

use crate::{
    error::{RetentionError, RetentionResult},
    event::{ActivityEvent, RawActivityRecord},
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    JsonLines,
}

impl InputFormat {
    /// Pick a format from the file extension. Unknown extensions read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson") => {
                Self::JsonLines
            }
            _ => Self::Csv,
        }
    }
}

/// Load every event from `path`; `-` reads CSV from stdin.
pub fn load_events(path: &str) -> RetentionResult<Vec<ActivityEvent>> {
    if path == "-" {
        return read_csv(io::stdin().lock());
    }
    let path = Path::new(path);
    let file = File::open(path)?;
    let events = match InputFormat::from_path(path) {
        InputFormat::Csv => read_csv(file)?,
        InputFormat::JsonLines => read_jsonl(BufReader::new(file))?,
    };
    log::info!("ingest: loaded {} events from {}", events.len(), path.display());
    Ok(events)
}

/// Read CSV with a header row. Columns are matched by name, extra columns ignored.
pub fn read_csv<R: Read>(reader: R) -> RetentionResult<Vec<ActivityEvent>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    check_headers(&headers)?;

    let mut events = Vec::new();
    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawActivityRecord = record.deserialize(Some(&headers))?;
        events.push(raw.validate(line)?);
    }
    Ok(events)
}

/// Read JSON Lines, one object per line. Blank lines are skipped.
pub fn read_jsonl<R: BufRead>(reader: R) -> RetentionResult<Vec<ActivityEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx as u64 + 1;
        let raw: RawActivityRecord =
            serde_json::from_str(&line).map_err(|e| RetentionError::InvalidRecord {
                line: line_no,
                reason: e.to_string(),
            })?;
        events.push(raw.validate(line_no)?);
    }
    Ok(events)
}

fn check_headers(headers: &csv::StringRecord) -> RetentionResult<()> {
    let has = |name: &str| headers.iter().any(|h| h == name);
    if has("activity_date") && has("record_date") {
        return Err(RetentionError::InvalidRecord {
            line: 1,
            reason: "header has both activity_date and record_date; keep one".into(),
        });
    }
    let missing: Vec<&str> = ["account_id", "user_id"]
        .into_iter()
        .filter(|&name| !has(name))
        .chain((!has("activity_date") && !has("record_date")).then_some("activity_date"))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RetentionError::InvalidRecord {
            line: 1,
            reason: format!("header is missing column(s): {}", missing.join(", ")),
        })
    }
}
