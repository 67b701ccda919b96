// src/process/mod.rs

pub mod expenditure;
pub mod migration;
pub mod rent;
pub mod survey;

use crate::combine;
use crate::config::PipelineConfig;
use crate::store;
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

/// Why a normalizer or the joiner produced nothing. Callers can tell a merely
/// absent upstream file apart from a frame-level failure.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The joiner's required processed inputs, listed by name.
    #[error("required processed inputs missing: {}", .0.join(", "))]
    MissingInputs(Vec<String>),

    #[error(transparent)]
    Frame(#[from] PolarsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read one raw dataset, or `None` (with a warning) when the fetch for it
/// never landed a file. Normalizers never fabricate data.
pub(crate) fn read_raw_optional(path: &Path) -> Result<Option<DataFrame>, ProcessError> {
    if !path.exists() {
        warn!(path = %path.display(), "raw input not found; skipping");
        return Ok(None);
    }
    Ok(Some(store::read_csv(path)?))
}

/// Run every normalizer, then the joiner. A normalizer missing its raw input
/// is tolerated; the joiner's hard dependencies are not, so its failure fails
/// the whole processing stage.
pub fn process_all(cfg: &PipelineConfig) -> Result<(), ProcessError> {
    info!("starting data processing");

    match expenditure::process(cfg) {
        Ok(Some(df)) => info!(rows = df.height(), "expenditure data processed"),
        Ok(None) => {}
        Err(e) => error!(error = %e, "expenditure processing failed"),
    }

    match survey::process(cfg) {
        Ok(outcome) => {
            if let Some(states) = &outcome.states {
                info!(rows = states.height(), "state survey data processed");
            }
            if let Some(metros) = &outcome.metros {
                info!(rows = metros.height(), "metro survey data processed");
            }
        }
        Err(e) => error!(error = %e, "survey processing failed"),
    }

    match rent::process(cfg) {
        Ok(Some(rent::RentSchema::Matched(df))) => {
            info!(rows = df.height(), "rent benchmark data processed")
        }
        Ok(Some(rent::RentSchema::Fallback(df))) => {
            warn!(rows = df.height(), "rent benchmark schema mismatch; raw data passed through")
        }
        Ok(None) => {}
        Err(e) => error!(error = %e, "rent benchmark processing failed"),
    }

    match migration::process(cfg) {
        Ok(Some(views)) => info!(
            inflow_rows = views.inflow.height(),
            outflow_rows = views.outflow.height(),
            "migration data processed"
        ),
        Ok(None) => {}
        Err(e) => error!(error = %e, "migration processing failed"),
    }

    let combined = combine::combine_for_analysis(cfg)?;
    info!(rows = combined.height(), "combined analysis data written");

    info!("data processing completed");
    Ok(())
}
