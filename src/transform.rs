//! Column normalization and summary metrics for patient billing tables.
//!
//! [`clean_records`] is pure: it takes an owned [`RecordTable`] and returns
//! the normalized table together with its [`Metrics`]. All file handling
//! lives in [`crate::pipeline`].

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CleanError, CleanResult};
use crate::records::{RecordTable, Value};

pub const NAME: &str = "Name";
pub const DATE_OF_ADMISSION: &str = "Date of Admission";
pub const DISCHARGE_DATE: &str = "Discharge Date";
pub const DOCTOR: &str = "Doctor";
pub const HOSPITAL: &str = "Hospital";
pub const BILLING_AMOUNT: &str = "Billing Amount";

pub const DATE_COLUMNS: [&str; 2] = [DATE_OF_ADMISSION, DISCHARGE_DATE];

/// Normalized in this order; `Hospital` takes the affix-stripping rule.
pub const CATEGORICAL_COLUMNS: [&str; 6] = [
    "Gender",
    "Medical Condition",
    DOCTOR,
    HOSPITAL,
    "Insurance Provider",
    "Admission Type",
];

static LEADING_AND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^And\s+").expect("valid leading-And pattern"));
static TRAILING_AND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+And$").expect("valid trailing-And pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_records: usize,
    pub total_billing: String,
    pub total_doctors: usize,
    pub total_hospitals: usize,
}

/// Normalizes names, dates and categorical columns, then computes metrics.
pub fn clean_records(mut table: RecordTable) -> CleanResult<(RecordTable, Metrics)> {
    table.map_column(NAME, |_, cell| Ok(map_text(cell, normalize_text)))?;

    for column in DATE_COLUMNS {
        parse_date_column(&mut table, column)?;
    }

    for column in CATEGORICAL_COLUMNS {
        if column == HOSPITAL {
            table.map_column(column, |_, cell| Ok(map_text(cell, normalize_hospital)))?;
        } else {
            table.map_column(column, |_, cell| Ok(map_text(cell, normalize_text)))?;
        }
    }

    let metrics = compute_metrics(&table)?;
    Ok((table, metrics))
}

pub fn compute_metrics(table: &RecordTable) -> CleanResult<Metrics> {
    let total_billing = sum_billing(table)?;
    Ok(Metrics {
        total_records: table.len(),
        total_billing: format_millions(total_billing),
        total_doctors: count_distinct(table, DOCTOR)?,
        total_hospitals: count_distinct(table, HOSPITAL)?,
    })
}

fn map_text(cell: &Value, f: fn(&str) -> String) -> Value {
    match cell {
        Value::Text(s) => Value::Text(f(s)),
        other => other.clone(),
    }
}

/// Upper-cases the first cased character of every run of cased characters
/// and lower-cases the rest. Digits and punctuation break runs.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_cased = false;
    for ch in input.chars() {
        let cased = ch.is_uppercase() || ch.is_lowercase();
        if cased && prev_cased {
            out.extend(ch.to_lowercase());
        } else if cased {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        prev_cased = cased;
    }
    out
}

/// Title-case, then strip.
pub fn normalize_text(input: &str) -> String {
    title_case(input).trim().to_string()
}

/// Strip, drop commas, drop one leading "And " and one trailing " And",
/// then title-case. The affix match is case-sensitive.
pub fn normalize_hospital(input: &str) -> String {
    let without_commas = input.trim().replace(',', "");
    let without_leading = LEADING_AND.replace(&without_commas, "");
    let without_trailing = TRAILING_AND.replace(&without_leading, "");
    title_case(&without_trailing)
}

#[derive(Debug, Clone, Copy)]
enum DateFormat {
    Date(&'static str),
    DateTime(&'static str),
}

impl DateFormat {
    fn parse(self, raw: &str) -> Option<NaiveDateTime> {
        match self {
            DateFormat::Date(fmt) => NaiveDate::parse_from_str(raw, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            DateFormat::DateTime(fmt) => NaiveDateTime::parse_from_str(raw, fmt).ok(),
        }
    }
}

const DATE_FORMATS: &[DateFormat] = &[
    DateFormat::Date("%Y-%m-%d"),
    DateFormat::DateTime("%Y-%m-%d %H:%M:%S"),
    DateFormat::DateTime("%Y-%m-%dT%H:%M:%S"),
    DateFormat::DateTime("%Y-%m-%d %H:%M"),
    DateFormat::Date("%Y/%m/%d"),
    DateFormat::Date("%m/%d/%Y"),
    DateFormat::DateTime("%m/%d/%Y %H:%M:%S"),
    DateFormat::DateTime("%m/%d/%Y %H:%M"),
    DateFormat::Date("%m-%d-%Y"),
    DateFormat::Date("%d-%b-%Y"),
    DateFormat::Date("%B %d, %Y"),
    DateFormat::Date("%b %d, %Y"),
    DateFormat::Date("%d %B %Y"),
    DateFormat::Date("%d %b %Y"),
];

fn infer_date_format(raw: &str) -> Option<DateFormat> {
    DATE_FORMATS
        .iter()
        .copied()
        .find(|fmt| fmt.parse(raw).is_some())
}

/// The first non-missing value picks the format; every later value must
/// match it.
fn parse_date_column(table: &mut RecordTable, column: &str) -> CleanResult<()> {
    let mut format: Option<DateFormat> = None;
    table.map_column(column, |row, cell| {
        let raw = match cell {
            Value::Text(s) => s.trim(),
            Value::Date(d) => return Ok(Value::Date(*d)),
            Value::Missing => return Ok(Value::Missing),
        };
        if raw.is_empty() {
            return Ok(Value::Missing);
        }

        let invalid = || CleanError::InvalidDate {
            column: column.to_string(),
            row,
            value: raw.to_string(),
        };
        let fmt = match format {
            Some(fmt) => fmt,
            None => {
                let fmt = infer_date_format(raw).ok_or_else(invalid)?;
                format = Some(fmt);
                fmt
            }
        };
        fmt.parse(raw).map(Value::Date).ok_or_else(invalid)
    })
}

fn sum_billing(table: &RecordTable) -> CleanResult<f64> {
    let mut total = 0.0_f64;
    for (row, cell) in table.column(BILLING_AMOUNT)?.enumerate() {
        let Some(raw) = cell.as_text() else {
            continue;
        };
        let amount: f64 = raw
            .trim()
            .parse()
            .map_err(|_| CleanError::InvalidNumber {
                column: BILLING_AMOUNT.to_string(),
                row,
                value: raw.to_string(),
            })?;
        if !amount.is_nan() {
            total += amount;
        }
    }
    Ok(total)
}

/// `$<millions, one decimal>M`, e.g. `2_345_000.0` renders as `$2.3M`.
pub fn format_millions(total: f64) -> String {
    format!("${:.1}M", total / 1e6)
}

fn count_distinct(table: &RecordTable, column: &str) -> CleanResult<usize> {
    let distinct: HashSet<&str> = table.column(column)?.filter_map(Value::as_text).collect();
    Ok(distinct.len())
}
