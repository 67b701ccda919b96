// src/process/survey.rs

use crate::config::{PipelineConfig, PROCESSED_METROS, PROCESSED_STATES, RAW_METROS, RAW_STATES};
use crate::geo;
use crate::process::{read_raw_optional, ProcessError};
use crate::store;
use polars::prelude::*;
use tracing::info;

pub struct SurveyOutcome {
    pub states: Option<DataFrame>,
    pub metros: Option<DataFrame>,
}

/// Normalize both survey granularities. States and metros are independent
/// datasets with the same shape; either may be absent on its own.
pub fn process(cfg: &PipelineConfig) -> Result<SurveyOutcome, ProcessError> {
    info!("processing demographic survey data");

    let states = match read_raw_optional(&cfg.raw_path(RAW_STATES))? {
        Some(raw) => {
            let mut df = normalize(raw)?;
            store::write_csv(&mut df, &cfg.processed_path(PROCESSED_STATES))?;
            Some(df)
        }
        None => None,
    };

    let metros = match read_raw_optional(&cfg.raw_path(RAW_METROS))? {
        Some(raw) => {
            let mut df = with_state_column(normalize(raw)?, "metro_name")?;
            store::write_csv(&mut df, &cfg.processed_path(PROCESSED_METROS))?;
            Some(df)
        }
        None => None,
    };

    Ok(SurveyOutcome { states, metros })
}

/// Coerce the three measures to numeric (unparseable values become null, not
/// errors) and derive the annualized rent-to-income ratio. Null or zero
/// income propagates to a null or infinite ratio; never a crash.
pub(crate) fn normalize(mut raw: DataFrame) -> Result<DataFrame, ProcessError> {
    for measure in [
        "median_household_income",
        "total_population",
        "median_gross_rent",
    ] {
        let coerced = raw.column(measure)?.cast(&DataType::Float64)?;
        raw.replace(measure, coerced)?;
    }

    let df = raw
        .lazy()
        .with_column(
            ((col("median_gross_rent") * lit(12.0)) / col("median_household_income"))
                .alias("rent_to_income_ratio"),
        )
        .collect()?;
    Ok(df)
}

/// Pull the trailing state-code token of `name_col` into its own `state`
/// column; names without the suffix get null.
pub(crate) fn with_state_column(
    mut df: DataFrame,
    name_col: &str,
) -> Result<DataFrame, ProcessError> {
    let names = df.column(name_col)?.cast(&DataType::String)?;
    let names = names.str()?;
    let states: Vec<Option<String>> = names
        .into_iter()
        .map(|name| name.and_then(geo::state_code))
        .collect();
    df.with_column(Series::new("state", states))?;
    Ok(df)
}
