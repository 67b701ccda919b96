// src/process/rent.rs

use crate::config::{PipelineConfig, PROCESSED_RENT, RAW_RENT};
use crate::process::{read_raw_optional, ProcessError};
use crate::store;
use polars::prelude::*;
use tracing::{info, warn};

/// Columns the benchmark archive is expected to carry. Absent columns are
/// simply omitted, never synthesized.
const ALLOWED_COLUMNS: &[&str] = &[
    "area_name",
    "state",
    "county_code",
    "fmr_0",
    "fmr_1",
    "fmr_2",
    "fmr_3",
    "fmr_4",
];

/// Outcome of schema negotiation with the raw archive. `Fallback` means the
/// allow-list matched nothing usable and the raw dataset was passed through
/// unmodified; callers can tell degraded output from the expected shape.
pub enum RentSchema {
    Matched(DataFrame),
    Fallback(DataFrame),
}

impl RentSchema {
    pub fn frame(&self) -> &DataFrame {
        match self {
            RentSchema::Matched(df) | RentSchema::Fallback(df) => df,
        }
    }
}

/// Project the raw benchmark table down to the allow-list and add a row-wise
/// average over whatever bedroom-size columns are present. Schema drift never
/// hard-fails this stage.
pub fn process(cfg: &PipelineConfig) -> Result<Option<RentSchema>, ProcessError> {
    info!("processing rent benchmark data");
    let Some(raw) = read_raw_optional(&cfg.raw_path(RAW_RENT))? else {
        return Ok(None);
    };

    let outcome = negotiate_schema(raw);
    let mut df = outcome.frame().clone();
    store::write_csv(&mut df, &cfg.processed_path(PROCESSED_RENT))?;
    Ok(Some(outcome))
}

pub(crate) fn negotiate_schema(raw: DataFrame) -> RentSchema {
    match project(&raw) {
        Ok(df) => RentSchema::Matched(df),
        Err(e) => {
            warn!(error = %e, "rent schema mismatch; passing raw data through");
            RentSchema::Fallback(raw)
        }
    }
}

fn project(raw: &DataFrame) -> Result<DataFrame, ProcessError> {
    let present: Vec<&str> = ALLOWED_COLUMNS
        .iter()
        .copied()
        .filter(|name| raw.get_column_names().contains(name))
        .collect();
    if present.is_empty() {
        return Err(PolarsError::ColumnNotFound("no allow-listed columns present".into()).into());
    }

    let mut df = raw.select(present.iter().copied())?;

    let fmr_cols: Vec<&str> = present
        .iter()
        .copied()
        .filter(|c| c.starts_with("fmr_"))
        .collect();
    if !fmr_cols.is_empty() {
        let avg = row_wise_mean(&df, &fmr_cols)?;
        df.with_column(Series::new("avg_rent", avg))?;
    }
    Ok(df)
}

/// Null-skipping mean across the given numeric columns, per row. A row with
/// every input null stays null.
fn row_wise_mean(df: &DataFrame, cols: &[&str]) -> Result<Vec<Option<f64>>, ProcessError> {
    let mut sums = vec![0.0f64; df.height()];
    let mut counts = vec![0usize; df.height()];

    for name in cols {
        let col = df.column(name)?.cast(&DataType::Float64)?;
        for (i, v) in col.f64()?.into_iter().enumerate() {
            if let Some(x) = v {
                sums[i] += x;
                counts[i] += 1;
            }
        }
    }

    Ok(sums
        .into_iter()
        .zip(counts)
        .map(|(sum, n)| (n > 0).then(|| sum / n as f64))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_allow_list_and_averages_present_fmr_columns() -> Result<(), ProcessError> {
        let raw = df!(
            "area_name" => &["Austin", "Waco"],
            "state" => &["TX", "TX"],
            "fmr_0" => &[1000.0f64, 700.0],
            "fmr_1" => &[1200.0f64, 800.0],
            "unrelated" => &[1i64, 2],
        )?;

        match negotiate_schema(raw) {
            RentSchema::Matched(df) => {
                assert_eq!(
                    df.get_column_names(),
                    &["area_name", "state", "fmr_0", "fmr_1", "avg_rent"]
                );
                assert_eq!(df.column("avg_rent")?.f64()?.get(0), Some(1100.0));
                assert_eq!(df.column("avg_rent")?.f64()?.get(1), Some(750.0));
            }
            RentSchema::Fallback(_) => panic!("expected matched schema"),
        }
        Ok(())
    }

    #[test]
    fn mean_skips_nulls_per_row() -> Result<(), ProcessError> {
        let raw = df!(
            "area_name" => &["A", "B"],
            "fmr_0" => &[Some(900.0f64), None],
            "fmr_1" => &[None::<f64>, None],
        )?;
        match negotiate_schema(raw) {
            RentSchema::Matched(df) => {
                let avg = df.column("avg_rent")?.f64()?;
                assert_eq!(avg.get(0), Some(900.0));
                assert_eq!(avg.get(1), None);
            }
            RentSchema::Fallback(_) => panic!("expected matched schema"),
        }
        Ok(())
    }

    #[test]
    fn unrecognized_schema_passes_raw_frame_through() -> Result<(), ProcessError> {
        let raw = df!(
            "AREANAME" => &["Austin"],
            "FMR0" => &[1000i64],
        )?;
        match negotiate_schema(raw.clone()) {
            RentSchema::Fallback(df) => assert!(df.equals(&raw)),
            RentSchema::Matched(_) => panic!("expected fallback"),
        }
        Ok(())
    }

    #[test]
    fn no_fmr_columns_means_no_avg_rent() -> Result<(), ProcessError> {
        let raw = df!(
            "area_name" => &["Austin"],
            "county_code" => &[453i64],
        )?;
        match negotiate_schema(raw) {
            RentSchema::Matched(df) => {
                assert_eq!(df.get_column_names(), &["area_name", "county_code"]);
            }
            RentSchema::Fallback(_) => panic!("expected matched schema"),
        }
        Ok(())
    }
}
