// src/fetch/survey.rs

use crate::config::{PipelineConfig, RAW_METROS, RAW_STATES};
use crate::fetch::FetchError;
use crate::store;
use polars::prelude::*;
use reqwest::Client;
use tracing::{info, warn};

/// ACS measure codes requested for every geography.
const MEASURES: &[(&str, &str)] = &[
    ("B19013_001E", "median_household_income"),
    ("B01003_001E", "total_population"),
    ("B25064_001E", "median_gross_rent"),
];

const STATE_GEOGRAPHY: &str = "state:*";
const METRO_GEOGRAPHY: &str =
    "metropolitan statistical area/micropolitan statistical area:*";

/// Fetch the income/population/rent survey at state and metro granularity.
/// Without credentials the source is skipped outright: `Ok(None)`, not an
/// error, and sibling fetchers carry on.
pub async fn fetch(
    client: &Client,
    cfg: &PipelineConfig,
) -> Result<Option<(DataFrame, DataFrame)>, FetchError> {
    info!("fetching demographic survey data");
    let Some(key) = cfg.census_api_key.as_deref() else {
        warn!("no Census API key provided; skipping survey acquisition");
        return Ok(None);
    };

    let mut states = fetch_geography(client, cfg, key, STATE_GEOGRAPHY, "state_name").await?;
    let mut metros = fetch_geography(client, cfg, key, METRO_GEOGRAPHY, "metro_name").await?;

    store::write_csv(&mut states, &cfg.raw_path(RAW_STATES))?;
    store::write_csv(&mut metros, &cfg.raw_path(RAW_METROS))?;
    Ok(Some((states, metros)))
}

async fn fetch_geography(
    client: &Client,
    cfg: &PipelineConfig,
    key: &str,
    geography: &str,
    name_col: &str,
) -> Result<DataFrame, FetchError> {
    let url = format!("https://api.census.gov/data/{}/acs/acs5", cfg.survey_year);
    let get = format!(
        "NAME,{}",
        MEASURES.iter().map(|(code, _)| *code).collect::<Vec<_>>().join(",")
    );

    let rows: Vec<Vec<Option<String>>> = client
        .get(&url)
        .query(&[("get", get.as_str()), ("for", geography), ("key", key)])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    frame_from_rows(rows, name_col)
}

/// The survey API answers with an array of arrays: a header row followed by
/// data rows, values as strings or null. Measures are kept verbatim here;
/// numeric coercion belongs to the normalizer.
fn frame_from_rows(
    rows: Vec<Vec<Option<String>>>,
    name_col: &str,
) -> Result<DataFrame, FetchError> {
    let mut iter = rows.into_iter();
    let header = iter
        .next()
        .ok_or_else(|| FetchError::Decode("empty survey response".to_string()))?;

    let index_of = |code: &str| -> Result<usize, FetchError> {
        header
            .iter()
            .position(|h| h.as_deref() == Some(code))
            .ok_or_else(|| FetchError::Decode(format!("missing column {code}")))
    };

    let name_idx = index_of("NAME")?;
    let measure_idx: Vec<usize> = MEASURES
        .iter()
        .map(|(code, _)| index_of(code))
        .collect::<Result<_, _>>()?;
    // trailing column is the geography identifier
    let geo_idx = header.len() - 1;

    let data: Vec<Vec<Option<String>>> = iter.collect();
    let pick = |idx: usize| -> Vec<Option<String>> {
        data.iter()
            .map(|row| row.get(idx).cloned().flatten())
            .collect()
    };

    let mut columns = vec![Series::new(name_col, pick(name_idx))];
    for ((_, semantic), idx) in MEASURES.iter().zip(measure_idx) {
        columns.push(Series::new(semantic, pick(idx)));
    }
    columns.push(Series::new("geo_id", pick(geo_idx)));

    Ok(DataFrame::new(columns)?)
}
