use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::records::{RecordTable, write_cleaned_csv};
use crate::transform::{Metrics, clean_records};

/// Reads `input`, normalizes it and writes the cleaned CSV to `output`.
///
/// Nothing is written to `output` unless every step succeeds.
pub fn clean_file(input: &Path, output: &Path) -> anyhow::Result<Metrics> {
    let table = RecordTable::from_path(input)
        .with_context(|| format!("read {}", input.display()))?;
    let rows = table.len();

    let (cleaned, metrics) = clean_records(table)?;
    write_cleaned_csv(output, &cleaned)
        .with_context(|| format!("write {}", output.display()))?;

    tracing::info!(
        rows,
        total_billing = %metrics.total_billing,
        "Cleaned {} -> {}",
        input.display(),
        output.display()
    );
    Ok(metrics)
}

pub fn default_cleaned_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|x| x.to_str())
        .unwrap_or("records");
    input.with_file_name(format!("{stem}-cleaned.csv"))
}
