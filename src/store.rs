// src/store.rs

use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Read a delimited tabular file with a header row, inferring column types.
pub fn read_csv(path: &Path) -> PolarsResult<DataFrame> {
    debug!(path = %path.display(), "reading csv");
    LazyCsvReader::new(path)
        .with_infer_schema_length(Some(1000))
        .finish()?
        .collect()
}

/// Write `df` to `path` with a header row, creating parent directories and
/// wholly replacing any previous file. One file is the unit of consistency:
/// the write completes before the producing stage returns.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> PolarsResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    debug!(path = %path.display(), rows = df.height(), "wrote csv");
    Ok(())
}
