// src/combine.rs

use crate::config::{
    PipelineConfig, COMBINED, PROCESSED_EXPENDITURE, PROCESSED_INFLOW, PROCESSED_METROS,
};
use crate::geo::clean_metro_name;
use crate::process::ProcessError;
use crate::store;
use polars::prelude::*;
use tracing::info;

/// Join the metro survey rows with migration inflow: every survey row is
/// stamped with the most recent expenditure year, matched by cleaned metro
/// name + year, and kept whether or not inflow data exists (absent inflow
/// becomes zero, never null).
pub fn combine_for_analysis(cfg: &PipelineConfig) -> Result<DataFrame, ProcessError> {
    info!("combining data for analysis");

    let required = [PROCESSED_EXPENDITURE, PROCESSED_METROS, PROCESSED_INFLOW];
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !cfg.processed_path(name).exists())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ProcessError::MissingInputs(missing));
    }

    let expenditure = store::read_csv(&cfg.processed_path(PROCESSED_EXPENDITURE))?;
    let metros = store::read_csv(&cfg.processed_path(PROCESSED_METROS))?;
    let inflow = store::read_csv(&cfg.processed_path(PROCESSED_INFLOW))?;

    let mut combined = join_frames(&expenditure, metros, inflow)?;
    store::write_csv(&mut combined, &cfg.processed_path(COMBINED))?;
    Ok(combined)
}

pub(crate) fn join_frames(
    expenditure: &DataFrame,
    mut metros: DataFrame,
    mut inflow: DataFrame,
) -> Result<DataFrame, ProcessError> {
    // survey data is treated as current relative to the latest known
    // expenditure year
    let latest_year = expenditure
        .column("year")?
        .cast(&DataType::Int64)?
        .i64()?
        .max()
        .ok_or_else(|| PolarsError::NoData("expenditure dataset has no years".into()))?;
    metros.with_column(Series::new("year", vec![latest_year; metros.height()]))?;

    add_cleaned_column(&mut metros, "metro_name", "metro_name_clean")?;
    add_cleaned_column(&mut inflow, "destination_metro", "destination_metro_clean")?;

    let combined = metros
        .lazy()
        .join(
            inflow.lazy(),
            [col("metro_name_clean"), col("year")],
            [col("destination_metro_clean"), col("year")],
            JoinArgs::new(JoinType::Left),
        )
        .with_column(col("total_inflow").fill_null(lit(0i64)))
        .collect()?;
    Ok(combined)
}

fn add_cleaned_column(
    df: &mut DataFrame,
    source: &str,
    target: &str,
) -> Result<(), ProcessError> {
    let names = df.column(source)?.cast(&DataType::String)?;
    let names = names.str()?;
    let cleaned: Vec<Option<String>> = names
        .into_iter()
        .map(|name| name.map(clean_metro_name))
        .collect();
    df.with_column(Series::new(target, cleaned))?;
    Ok(())
}
