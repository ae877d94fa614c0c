use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{NaiveDateTime, Timelike};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};

use crate::error::{CleanError, CleanResult};

/// Cell texts that read as a missing value.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(raw: &str) -> bool {
    NA_VALUES.contains(&raw)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Text(String),
    Date(NaiveDateTime),
}

impl Value {
    pub fn from_raw(raw: &str) -> Self {
        if is_missing(raw) {
            Value::Missing
        } else {
            Value::Text(raw.to_string())
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

/// In-memory patient billing table: a header row plus rectangular rows of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { headers, rows }
    }

    pub fn from_path(path: &Path) -> CleanResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses CSV with a mandatory header row.
    ///
    /// Short rows are padded with missing cells, long rows are rejected and
    /// blank lines are skipped.
    pub fn from_reader<R: Read>(rdr: R) -> CleanResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);

        let mut headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(CleanError::EmptyFile);
        }
        if let Some(first) = headers.first_mut() {
            if let Some(stripped) = first.strip_prefix('\u{feff}') {
                *first = stripped.to_string();
            }
        }

        let width = headers.len();
        let mut rows: Vec<Vec<Value>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            if is_blank_line(&record) {
                continue;
            }
            if record.len() > width {
                return Err(CleanError::RaggedRow {
                    row: rows.len(),
                    expected: width,
                    found: record.len(),
                });
            }
            let mut cells: Vec<Value> = record.iter().map(Value::from_raw).collect();
            cells.resize(width, Value::Missing);
            rows.push(cells);
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> CleanResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CleanError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> CleanResult<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Rewrites every cell of `name` in row order. `f` receives the row index.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> CleanResult<()>
    where
        F: FnMut(usize, &Value) -> CleanResult<Value>,
    {
        let idx = self.column_index(name)?;
        for (row_idx, row) in self.rows.iter_mut().enumerate() {
            row[idx] = f(row_idx, &row[idx])?;
        }
        Ok(())
    }

    /// Writes the table with a leading unnamed row-index column.
    ///
    /// A date column is rendered date-only when all of its values fall on
    /// midnight.
    pub fn write_csv<W: Write>(&self, out: W) -> CleanResult<()> {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);

        let with_time: Vec<bool> = (0..self.headers.len())
            .map(|col| {
                self.rows.iter().any(|row| match &row[col] {
                    Value::Date(d) => d.num_seconds_from_midnight() != 0 || d.nanosecond() != 0,
                    _ => false,
                })
            })
            .collect();

        let mut header = Vec::with_capacity(self.headers.len() + 1);
        header.push("");
        header.extend(self.headers.iter().map(String::as_str));
        writer.write_record(&header)?;

        for (row_idx, row) in self.rows.iter().enumerate() {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(row_idx.to_string());
            for (col, cell) in row.iter().enumerate() {
                record.push(render_cell(cell, with_time[col]));
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn is_blank_line(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).is_some_and(str::is_empty)
}

fn render_cell(cell: &Value, with_time: bool) -> String {
    match cell {
        Value::Missing => String::new(),
        Value::Text(s) => s.clone(),
        Value::Date(d) if with_time => d.format("%Y-%m-%d %H:%M:%S").to_string(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
    }
}

/// Writes `table` to `path` through a sibling `.tmp` file so that a failed
/// write never leaves a partial artifact at `path`.
pub fn write_cleaned_csv(path: &Path, table: &RecordTable) -> CleanResult<()> {
    let file_name = path
        .file_name()
        .and_then(|x| x.to_str())
        .unwrap_or("cleaned.csv");
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    let written = File::create(&tmp_path)
        .map_err(CleanError::from)
        .and_then(|file| table.write_csv(file));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
