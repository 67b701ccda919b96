// src/fetch/mod.rs

pub mod expenditure;
pub mod migration;
pub mod rent;
pub mod survey;

use crate::config::PipelineConfig;
use polars::prelude::PolarsError;
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info};

/// Why a single source fetch came back empty-handed. Sibling fetchers are
/// unrelated; the acquisition stage logs these and keeps going.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered but reported a non-success status.
    #[error("provider rejected request: {0}")]
    Provider(String),

    #[error("could not decode payload: {0}")]
    Decode(String),

    /// The downloaded archive held no tabular file to extract.
    #[error("archive contains no tabular entry")]
    NoTabularEntry,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Frame(#[from] PolarsError),
}

/// Run every fetcher in sequence. A fetcher failing (or short-circuiting for
/// want of credentials) never stops its siblings; the processing stage deals
/// with whatever raw files actually landed.
pub async fn acquire_all(client: &Client, cfg: &PipelineConfig) {
    info!("starting data acquisition");

    match expenditure::fetch(client, cfg).await {
        Ok(df) => info!(rows = df.height(), "expenditure data acquired"),
        Err(e) => error!(error = %e, "expenditure fetch failed"),
    }

    match survey::fetch(client, cfg).await {
        Ok(Some((states, metros))) => info!(
            states = states.height(),
            metros = metros.height(),
            "survey data acquired"
        ),
        Ok(None) => {} // already logged: no credentials, source skipped
        Err(e) => error!(error = %e, "survey fetch failed"),
    }

    match rent::fetch(client, cfg).await {
        Ok(path) => info!(path = %path.display(), "rent benchmark archive extracted"),
        Err(e) => error!(error = %e, "rent benchmark fetch failed"),
    }

    match migration::generate(cfg) {
        Ok(df) => info!(rows = df.height(), "synthetic migration data generated"),
        Err(e) => error!(error = %e, "migration generation failed"),
    }

    info!("data acquisition completed");
}
