// src/fetch/rent.rs

use crate::config::{PipelineConfig, RAW_RENT};
use crate::fetch::FetchError;
use reqwest::Client;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use zip::ZipArchive;

/// Download the fair-market-rent archive, pull out the first tabular file
/// inside, and persist its bytes verbatim as the raw dataset. The source
/// schema is whatever the archive says it is; no reshaping happens here.
pub async fn fetch(client: &Client, cfg: &PipelineConfig) -> Result<PathBuf, FetchError> {
    info!(url = %cfg.rent_archive_url, "fetching rent benchmark archive");

    let resp = client
        .get(&cfg.rent_archive_url)
        .send()
        .await?
        .error_for_status()?;
    let bytes = resp.bytes().await?;

    let mut tmp = tempfile::NamedTempFile::new()?;
    tmp.write_all(&bytes)?;

    let dest = cfg.raw_path(RAW_RENT);
    extract_first_csv(tmp.path(), &dest)?;
    Ok(dest)
}

/// Scan the archive in entry order and copy the first `.csv` member to
/// `dest`. No csv member at all fails the fetch.
fn extract_first_csv(
    archive_path: &std::path::Path,
    dest: &std::path::Path,
) -> Result<(), FetchError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| FetchError::Decode(format!("not a zip archive: {e}")))?;

    let mut csv_name = None;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| FetchError::Decode(format!("bad archive entry #{i}: {e}")))?;
        if entry.is_file() && entry.name().to_lowercase().ends_with(".csv") {
            csv_name = Some(entry.name().to_string());
            break;
        }
    }
    let Some(name) = csv_name else {
        return Err(FetchError::NoTabularEntry);
    };
    debug!(entry = %name, "extracting tabular entry");

    let mut entry = archive
        .by_name(&name)
        .map_err(|e| FetchError::Decode(format!("reopening {name}: {e}")))?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(dest)?;
    io::copy(&mut entry, &mut out)?;
    Ok(())
}
