// src/fetch/expenditure.rs

use crate::config::{PipelineConfig, RAW_EXPENDITURE};
use crate::fetch::FetchError;
use crate::store;
use polars::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const TIMESERIES_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";

#[derive(Serialize)]
struct SeriesRequest {
    seriesid: Vec<String>,
    startyear: String,
    endyear: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    registrationkey: Option<String>,
}

#[derive(Deserialize)]
struct SeriesResponse {
    status: String,
    #[serde(default)]
    message: Vec<String>,
    #[serde(rename = "Results", default)]
    results: Option<SeriesResults>,
}

#[derive(Deserialize, Default)]
struct SeriesResults {
    #[serde(default)]
    series: Vec<SeriesData>,
}

#[derive(Deserialize)]
struct SeriesData {
    #[serde(rename = "seriesID")]
    series_id: String,
    #[serde(default)]
    data: Vec<Observation>,
}

#[derive(Deserialize)]
struct Observation {
    year: String,
    value: String,
}

/// Fetch the consumer expenditure series over the configured year range and
/// land them as long-form (category, year, value) rows in the raw store.
/// A non-success provider status fails the whole fetch; no partial data.
pub async fn fetch(client: &Client, cfg: &PipelineConfig) -> Result<DataFrame, FetchError> {
    info!("fetching consumer expenditure series");
    if cfg.bls_api_key.is_none() {
        warn!("no BLS API key provided; using public access (limited requests)");
    }

    let body = SeriesRequest {
        seriesid: cfg.expenditure_series.iter().map(|(id, _)| id.clone()).collect(),
        startyear: cfg.expenditure_start_year.to_string(),
        endyear: cfg.expenditure_end_year.to_string(),
        registrationkey: cfg.bls_api_key.clone(),
    };

    let resp: SeriesResponse = client
        .post(TIMESERIES_URL)
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let mut df = frame_from_response(resp, cfg)?;
    store::write_csv(&mut df, &cfg.raw_path(RAW_EXPENDITURE))?;
    Ok(df)
}

/// Flatten a provider response into (category, year, value) rows, mapping
/// opaque series ids through the configured category table.
fn frame_from_response(
    resp: SeriesResponse,
    cfg: &PipelineConfig,
) -> Result<DataFrame, FetchError> {
    if resp.status != "REQUEST_SUCCEEDED" {
        return Err(FetchError::Provider(resp.message.join("; ")));
    }

    let mut categories = Vec::new();
    let mut years = Vec::new();
    let mut values = Vec::new();

    for series in resp.results.unwrap_or_default().series {
        let category = cfg.category_for(&series.series_id);
        for obs in series.data {
            let year: i64 = obs
                .year
                .parse()
                .map_err(|_| FetchError::Decode(format!("bad year {:?}", obs.year)))?;
            let value: f64 = obs
                .value
                .parse()
                .map_err(|_| FetchError::Decode(format!("bad value {:?}", obs.value)))?;
            categories.push(category.clone());
            years.push(year);
            values.push(value);
        }
    }

    Ok(DataFrame::new(vec![
        Series::new("category", categories),
        Series::new("year", years),
        Series::new("value", values),
    ])?)
}
