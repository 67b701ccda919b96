// src/process/expenditure.rs

use crate::config::{PipelineConfig, PROCESSED_EXPENDITURE, RAW_EXPENDITURE};
use crate::process::{read_raw_optional, ProcessError};
use crate::store;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Reshape the long-form (category, year, value) series into one row per
/// year with a column per category, then append a percent-change-from-prior-
/// year column for every category.
pub fn process(cfg: &PipelineConfig) -> Result<Option<DataFrame>, ProcessError> {
    info!("processing consumer expenditure data");
    let Some(raw) = read_raw_optional(&cfg.raw_path(RAW_EXPENDITURE))? else {
        return Ok(None);
    };

    let mut wide = pivot_with_pct_change(&raw)?;
    store::write_csv(&mut wide, &cfg.processed_path(PROCESSED_EXPENDITURE))?;
    Ok(Some(wide))
}

pub(crate) fn pivot_with_pct_change(raw: &DataFrame) -> Result<DataFrame, ProcessError> {
    let categories = raw.column("category")?.cast(&DataType::String)?;
    let categories = categories.str()?;
    let years = raw.column("year")?.cast(&DataType::Int64)?;
    let years = years.i64()?;
    let values = raw.column("value")?.cast(&DataType::Float64)?;
    let values = values.f64()?;

    // cell map keyed (category, year); both axes come out sorted
    let mut cells: BTreeMap<(String, i64), f64> = BTreeMap::new();
    let mut year_axis: BTreeSet<i64> = BTreeSet::new();
    let mut category_axis: BTreeSet<String> = BTreeSet::new();

    for ((cat, year), value) in categories.into_iter().zip(years).zip(values) {
        let (Some(cat), Some(year)) = (cat, year) else {
            continue;
        };
        year_axis.insert(year);
        category_axis.insert(cat.to_string());
        if let Some(v) = value {
            cells.insert((cat.to_string(), year), v);
        }
    }

    let year_axis: Vec<i64> = year_axis.into_iter().collect();
    let mut columns = vec![Series::new("year", year_axis.clone())];
    let mut pct_columns = Vec::with_capacity(category_axis.len());

    for cat in &category_axis {
        let vals: Vec<Option<f64>> = year_axis
            .iter()
            .map(|y| cells.get(&(cat.clone(), *y)).copied())
            .collect();
        pct_columns.push(Series::new(&format!("{cat}_pct_change"), pct_change(&vals)));
        columns.push(Series::new(cat, vals));
    }
    columns.extend(pct_columns);

    Ok(DataFrame::new(columns)?)
}

/// First row is always null; a null on either side of a step propagates null.
fn pct_change(vals: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(vals.len());
    out.push(None);
    for window in vals.windows(2) {
        out.push(match (window[0], window[1]) {
            (Some(prev), Some(cur)) => Some((cur - prev) / prev * 100.0),
            _ => None,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pivots_example_series_with_pct_change() -> Result<(), ProcessError> {
        let raw = df!(
            "category" => &["Food", "Food"],
            "year" => &[2020i64, 2021],
            "value" => &[100.0f64, 110.0],
        )?;
        let wide = pivot_with_pct_change(&raw)?;

        assert_eq!(
            wide.get_column_names(),
            &["year", "Food", "Food_pct_change"]
        );
        assert_eq!(wide.column("Food")?.f64()?.get(0), Some(100.0));
        assert_eq!(wide.column("Food")?.f64()?.get(1), Some(110.0));
        assert_eq!(wide.column("Food_pct_change")?.f64()?.get(0), None);
        assert_eq!(wide.column("Food_pct_change")?.f64()?.get(1), Some(10.0));
        Ok(())
    }

    #[test]
    fn missing_year_for_a_category_stays_null() -> Result<(), ProcessError> {
        let raw = df!(
            "category" => &["Food", "Housing", "Housing"],
            "year" => &[2020i64, 2020, 2021],
            "value" => &[100.0f64, 500.0, 550.0],
        )?;
        let wide = pivot_with_pct_change(&raw)?;

        assert_eq!(wide.height(), 2);
        assert_eq!(wide.column("Food")?.f64()?.get(1), None);
        // null prior year keeps the pct-change null too
        assert_eq!(wide.column("Food_pct_change")?.f64()?.get(1), None);
        assert_eq!(wide.column("Housing_pct_change")?.f64()?.get(1), Some(10.0));
        Ok(())
    }

    #[test]
    fn melting_the_wide_form_recovers_the_triples() -> Result<(), ProcessError> {
        let cats = ["Food", "Housing", "Transportation"];
        let mut triples = BTreeSet::new();
        let mut categories = Vec::new();
        let mut years = Vec::new();
        let mut values = Vec::new();
        for (i, cat) in cats.iter().enumerate() {
            for year in 2018i64..=2021 {
                let value = 100.0 * (i as f64 + 1.0) + year as f64;
                triples.insert((cat.to_string(), year, value.to_bits()));
                categories.push(*cat);
                years.push(year);
                values.push(value);
            }
        }
        let raw = df!(
            "category" => categories.as_slice(),
            "year" => years.as_slice(),
            "value" => values.as_slice(),
        )?;

        let wide = pivot_with_pct_change(&raw)?;
        let wide_years = wide.column("year")?.i64()?;
        let mut recovered = BTreeSet::new();
        for cat in &cats {
            let col = wide.column(cat)?.f64()?;
            for (y, v) in wide_years.into_iter().zip(col) {
                if let (Some(y), Some(v)) = (y, v) {
                    recovered.insert((cat.to_string(), y, v.to_bits()));
                }
            }
        }
        assert_eq!(recovered, triples);
        Ok(())
    }

    #[test]
    fn first_row_pct_change_is_always_null() {
        assert_eq!(pct_change(&[Some(5.0)]), vec![None]);
        assert_eq!(
            pct_change(&[Some(50.0), Some(75.0), Some(60.0)]),
            vec![None, Some(50.0), Some(-20.0)]
        );
    }
}
