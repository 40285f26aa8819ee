//! CSV Record Loader Module
//! Fetches the student dataset, parses it with Polars and derives the snapshot.

use crate::data::derive::{DeriveError, RecordTransformer};
use crate::data::record::{RawRow, REQUIRED_COLUMNS};
use crate::data::snapshot::Snapshot;
use crate::data::source::{FetchError, Source};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Default bound on an HTTP fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to fetch dataset: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to parse CSV: {0}")]
    Parse(#[from] ParseError),
    #[error("Invalid student record: {0}")]
    Derive(#[from] DeriveError),
    #[error("Load stopped before producing a result")]
    Interrupted,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{0}")]
    Csv(#[from] PolarsError),
    #[error("dataset is empty")]
    Empty,
    #[error("header is missing required column `{0}`")]
    MissingColumn(String),
    #[error("header has an empty column name at position {0}")]
    EmptyColumnName(usize),
    #[error("header repeats column `{0}`")]
    DuplicateColumn(String),
    #[error("line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("CSV reader produced {parsed} records, expected {scanned}")]
    RecordCount { scanned: usize, parsed: usize },
}

/// Loader settings.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub timeout: Duration,
    /// Clock used for ages; `None` reads the system clock at load time.
    pub now: Option<DateTime<Utc>>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            now: None,
        }
    }
}

/// Produces the snapshot consumed by every chart.
#[derive(Debug, Clone, Default)]
pub struct RecordLoader {
    options: LoadOptions,
}

impl RecordLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Fetch, parse and derive. Either the whole snapshot or an error.
    pub fn load(&self, source: &Source) -> Result<Snapshot, LoadError> {
        info!(%source, "loading student records");
        let bytes = source.fetch(self.options.timeout)?;
        let snapshot = self.load_bytes(&bytes)?;
        info!(%source, records = snapshot.len(), "student records loaded");
        Ok(snapshot)
    }

    /// Parse and derive in-memory CSV text.
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<Snapshot, LoadError> {
        let rows = parse_rows(bytes)?;
        let now = self.options.now.unwrap_or_else(Utc::now);
        let records = RecordTransformer::new(now).transform_all(&rows)?;
        Ok(Snapshot::new(records))
    }
}

/// Parse CSV text into raw rows keyed by the header.
///
/// The header is read as an ordinary row so its names can be validated as
/// written. Every cell stays a string and empty cells are kept as `""`.
/// Blank lines and records with only empty cells are skipped. A record whose
/// field count differs from the header's fails.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<RawRow>, ParseError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::Empty);
    }

    let (text, spans) = scan_records(bytes);
    if spans.is_empty() {
        return Err(ParseError::Empty);
    }
    let expected = spans[0].fields;
    if let Some(span) = spans.iter().find(|span| span.fields != expected) {
        return Err(ParseError::RaggedRow {
            line: span.line,
            expected,
            found: span.fields,
        });
    }

    let df: DataFrame = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_missing_is_null(false))
        .into_reader_with_file_handle(Cursor::new(text))
        .finish()?;
    if df.height() != spans.len() {
        return Err(ParseError::RecordCount {
            scanned: spans.len(),
            parsed: df.height(),
        });
    }

    let columns: Vec<&StringChunked> = df
        .get_columns()
        .iter()
        .map(|col| col.str())
        .collect::<PolarsResult<_>>()?;

    let header = read_header(&columns)?;
    let mut rows = Vec::with_capacity(df.height().saturating_sub(1));

    for (i, span) in spans.iter().enumerate().skip(1) {
        let mut row = RawRow::new(span.line);
        for (name, values) in header.iter().zip(&columns) {
            let value = values.get(i).unwrap_or_default();
            row.fields.insert(name.clone(), value.to_string());
        }
        if row.fields.values().all(|v| v.trim().is_empty()) {
            debug!(line = span.line, "skipping empty record");
            continue;
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), columns = header.len(), "parsed CSV");
    Ok(rows)
}

/// Where a record starts and how many fields it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecordSpan {
    line: usize,
    fields: usize,
}

/// Split `bytes` into records, honouring quoted separators and newlines.
///
/// Returns the input with blank lines removed and line endings normalized to
/// `\n`, which the CSV reader then parses record for record, alongside each
/// record's starting line.
fn scan_records(bytes: &[u8]) -> (Vec<u8>, Vec<RecordSpan>) {
    let mut text = Vec::with_capacity(bytes.len() + 1);
    let mut spans = Vec::new();
    let mut record = Vec::new();
    let mut in_quotes = false;
    let mut fields = 1;
    let mut line = 1;
    let mut record_line = 1;

    let mut finish = |record: &mut Vec<u8>, fields: usize, record_line: usize| {
        if record.last() == Some(&b'\r') {
            record.pop();
        }
        if !record.is_empty() {
            spans.push(RecordSpan {
                line: record_line,
                fields,
            });
            text.append(record);
            text.push(b'\n');
        }
        record.clear();
    };

    for &byte in bytes {
        match byte {
            b'"' => {
                in_quotes = !in_quotes;
                record.push(byte);
            }
            b',' if !in_quotes => {
                fields += 1;
                record.push(byte);
            }
            b'\n' if !in_quotes => {
                line += 1;
                finish(&mut record, fields, record_line);
                fields = 1;
                record_line = line;
            }
            b'\n' => {
                line += 1;
                record.push(byte);
            }
            _ => record.push(byte),
        }
    }
    finish(&mut record, fields, record_line);

    (text, spans)
}

fn read_header(columns: &[&StringChunked]) -> Result<Vec<String>, ParseError> {
    let mut header = Vec::with_capacity(columns.len());
    let mut seen = HashSet::new();

    for (position, values) in columns.iter().enumerate() {
        let name = match values.get(0) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(ParseError::EmptyColumnName(position)),
        };
        if !seen.insert(name.clone()) {
            return Err(ParseError::DuplicateColumn(name));
        }
        header.push(name);
    }

    if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !seen.contains(**c)) {
        return Err(ParseError::MissingColumn(missing.to_string()));
    }
    Ok(header)
}
