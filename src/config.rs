// src/config.rs

use std::env;
use std::path::{Path, PathBuf};

/// Raw store filenames, one per source.
pub const RAW_EXPENDITURE: &str = "bls_consumer_expenditure.csv";
pub const RAW_STATES: &str = "census_states_acs.csv";
pub const RAW_METROS: &str = "census_metros_acs.csv";
pub const RAW_RENT: &str = "hud_fair_market_rent.csv";
pub const RAW_MIGRATION: &str = "synthetic_migration_data.csv";

/// Processed store filenames.
pub const PROCESSED_EXPENDITURE: &str = "processed_bls_expenditure.csv";
pub const PROCESSED_STATES: &str = "processed_states_acs.csv";
pub const PROCESSED_METROS: &str = "processed_metros_acs.csv";
pub const PROCESSED_RENT: &str = "processed_hud_rent.csv";
pub const PROCESSED_INFLOW: &str = "processed_migration_inflow.csv";
pub const PROCESSED_OUTFLOW: &str = "processed_migration_outflow.csv";
pub const PROCESSED_DESTINATIONS: &str = "processed_migration_destinations.csv";
pub const COMBINED: &str = "combined_analysis_data.csv";

/// Everything one pipeline run needs to know, built once in `main` and passed
/// into each component. Nothing here is process-global.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub log_path: PathBuf,

    pub bls_api_key: Option<String>,
    pub census_api_key: Option<String>,

    /// Expenditure series to request, as (series id, human-readable category).
    pub expenditure_series: Vec<(String, String)>,
    pub expenditure_start_year: i32,
    pub expenditure_end_year: i32,

    /// ACS vintage for the survey fetcher.
    pub survey_year: i32,

    pub rent_archive_url: String,
    pub migration_seed: u64,

    /// External stage commands (program + args). `None` means not configured.
    pub viz_command: Option<Vec<String>>,
    pub model_command: Option<Vec<String>>,
}

impl PipelineConfig {
    /// Build a config rooted at `base`, reading credentials and external
    /// stage commands from the environment.
    pub fn from_env(base: &Path) -> Self {
        Self {
            raw_dir: base.join("data").join("raw"),
            processed_dir: base.join("data").join("processed"),
            log_path: base.join("pipeline.log"),
            bls_api_key: env_nonempty("BLS_API_KEY"),
            census_api_key: env_nonempty("CENSUS_API_KEY"),
            expenditure_series: default_series(),
            expenditure_start_year: 2010,
            expenditure_end_year: 2023,
            survey_year: 2022,
            rent_archive_url:
                "https://www.huduser.gov/portal/datasets/fmr/fmr2022/FY22_4050_FMRs.zip"
                    .to_string(),
            migration_seed: 42,
            viz_command: env_nonempty("METROFLOW_VIZ_CMD").map(split_command),
            model_command: env_nonempty("METROFLOW_MODEL_CMD").map(split_command),
        }
    }

    pub fn raw_path(&self, name: &str) -> PathBuf {
        self.raw_dir.join(name)
    }

    pub fn processed_path(&self, name: &str) -> PathBuf {
        self.processed_dir.join(name)
    }

    /// Look up the category for a series id; unknown ids keep the raw id.
    pub fn category_for(&self, series_id: &str) -> String {
        self.expenditure_series
            .iter()
            .find(|(id, _)| id == series_id)
            .map(|(_, cat)| cat.clone())
            .unwrap_or_else(|| series_id.to_string())
    }
}

fn default_series() -> Vec<(String, String)> {
    [
        ("CXUT0100AA", "Total Expenditures"),
        ("CXUT0200AA", "Food"),
        ("CXUT0400AA", "Housing"),
        ("CXUT0450AA", "Shelter"),
        ("CXUT0500AA", "Transportation"),
        ("CXUT0600AA", "Healthcare"),
    ]
    .iter()
    .map(|(id, cat)| (id.to_string(), cat.to_string()))
    .collect()
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn split_command(raw: String) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}
