// src/process/migration.rs

use crate::config::{
    PipelineConfig, PROCESSED_DESTINATIONS, PROCESSED_INFLOW, PROCESSED_OUTFLOW, RAW_MIGRATION,
};
use crate::process::{read_raw_optional, ProcessError};
use crate::store;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// The three derived views of the migration edge set.
pub struct MigrationViews {
    /// (destination_metro, year, total_inflow)
    pub inflow: DataFrame,
    /// (origin_metro, year, total_outflow)
    pub outflow: DataFrame,
    /// (origin_metro, year) rows, one column per destination, zero-filled.
    pub destinations: DataFrame,
}

pub fn process(cfg: &PipelineConfig) -> Result<Option<MigrationViews>, ProcessError> {
    info!("processing migration data");
    let Some(raw) = read_raw_optional(&cfg.raw_path(RAW_MIGRATION))? else {
        return Ok(None);
    };

    let mut views = derive_views(&raw)?;
    store::write_csv(&mut views.inflow, &cfg.processed_path(PROCESSED_INFLOW))?;
    store::write_csv(&mut views.outflow, &cfg.processed_path(PROCESSED_OUTFLOW))?;
    store::write_csv(&mut views.destinations, &cfg.processed_path(PROCESSED_DESTINATIONS))?;
    Ok(Some(views))
}

pub(crate) fn derive_views(raw: &DataFrame) -> Result<MigrationViews, ProcessError> {
    let inflow = aggregate(raw, "destination_metro", "total_inflow")?;
    let outflow = aggregate(raw, "origin_metro", "total_outflow")?;
    let destinations = destination_matrix(raw)?;
    Ok(MigrationViews {
        inflow,
        outflow,
        destinations,
    })
}

/// Sum migrants per (metro, year) over one end of the edge.
fn aggregate(raw: &DataFrame, key: &str, total_name: &str) -> Result<DataFrame, ProcessError> {
    let df = raw
        .clone()
        .lazy()
        .group_by([col(key), col("year")])
        .agg([col("num_migrants").sum().alias(total_name)])
        .sort([key, "year"], SortMultipleOptions::default())
        .collect()?;
    Ok(df)
}

/// Wide view: one row per (origin, year), one column per destination metro,
/// missing combinations filled with zero.
fn destination_matrix(raw: &DataFrame) -> Result<DataFrame, ProcessError> {
    let origins = raw.column("origin_metro")?.cast(&DataType::String)?;
    let origins = origins.str()?;
    let destinations = raw.column("destination_metro")?.cast(&DataType::String)?;
    let destinations = destinations.str()?;
    let years = raw.column("year")?.cast(&DataType::Int64)?;
    let years = years.i64()?;
    let migrants = raw.column("num_migrants")?.cast(&DataType::Int64)?;
    let migrants = migrants.i64()?;

    let mut cells: BTreeMap<(String, i64), BTreeMap<String, i64>> = BTreeMap::new();
    let mut dest_axis: BTreeSet<String> = BTreeSet::new();

    for (((origin, dest), year), count) in
        origins.into_iter().zip(destinations).zip(years).zip(migrants)
    {
        let (Some(origin), Some(dest), Some(year)) = (origin, dest, year) else {
            continue;
        };
        dest_axis.insert(dest.to_string());
        *cells
            .entry((origin.to_string(), year))
            .or_default()
            .entry(dest.to_string())
            .or_insert(0) += count.unwrap_or(0);
    }

    let index: Vec<(String, i64)> = cells.keys().cloned().collect();
    let mut columns = vec![
        Series::new(
            "origin_metro",
            index.iter().map(|(o, _)| o.clone()).collect::<Vec<_>>(),
        ),
        Series::new("year", index.iter().map(|(_, y)| *y).collect::<Vec<_>>()),
    ];
    for dest in &dest_axis {
        let vals: Vec<i64> = index
            .iter()
            .map(|key| cells[key].get(dest).copied().unwrap_or(0))
            .collect();
        columns.push(Series::new(dest, vals));
    }

    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges() -> DataFrame {
        df!(
            "year" => &[2020i64, 2020, 2020, 2021],
            "origin_metro" => &["NY", "NY", "LA", "NY"],
            "destination_metro" => &["Austin", "Tampa", "Austin", "Austin"],
            "num_migrants" => &[100i64, 50, 30, 80],
        )
        .unwrap()
    }

    #[test]
    fn inflow_and_outflow_conserve_totals_per_year() -> Result<(), ProcessError> {
        let views = derive_views(&edges())?;

        for year in [2020i64, 2021] {
            let total = |df: &DataFrame, col_name: &str| -> i64 {
                let years = df.column("year").unwrap().i64().unwrap();
                let totals = df.column(col_name).unwrap().i64().unwrap();
                years
                    .into_iter()
                    .zip(totals)
                    .filter(|(y, _)| *y == Some(year))
                    .filter_map(|(_, t)| t)
                    .sum()
            };
            assert_eq!(
                total(&views.inflow, "total_inflow"),
                total(&views.outflow, "total_outflow")
            );
        }
        Ok(())
    }

    #[test]
    fn inflow_sums_over_origins() -> Result<(), ProcessError> {
        let views = derive_views(&edges())?;
        let inflow = &views.inflow;

        let dest = inflow.column("destination_metro")?.str()?;
        let year = inflow.column("year")?.i64()?;
        let total = inflow.column("total_inflow")?.i64()?;
        let austin_2020 = dest
            .into_iter()
            .zip(year)
            .zip(total)
            .find(|((d, y), _)| *d == Some("Austin") && *y == Some(2020))
            .and_then(|(_, t)| t);
        assert_eq!(austin_2020, Some(130));
        Ok(())
    }

    #[test]
    fn destination_matrix_zero_fills_missing_pairs() -> Result<(), ProcessError> {
        let views = derive_views(&edges())?;
        let m = &views.destinations;

        assert_eq!(
            m.get_column_names(),
            &["origin_metro", "year", "Austin", "Tampa"]
        );
        // LA never sent anyone to Tampa
        let origins = m.column("origin_metro")?.str()?;
        let tampa = m.column("Tampa")?.i64()?;
        let la_row = origins
            .into_iter()
            .position(|o| o == Some("LA"))
            .expect("LA row present");
        assert_eq!(tampa.get(la_row), Some(0));
        Ok(())
    }
}
