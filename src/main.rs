use anyhow::{bail, Result};
use metroflow::{config::PipelineConfig, fetch, pipeline, process};
use reqwest::Client;
use std::{env, fs, path::Path};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .init();
    info!("startup");

    // ─── 2) configure dirs ───────────────────────────────────────────
    let cfg = PipelineConfig::from_env(Path::new("."));
    for dir in [&cfg.raw_dir, &cfg.processed_dir] {
        fs::create_dir_all(dir)?;
    }

    // ─── 3) dispatch ─────────────────────────────────────────────────
    let mode = env::args().nth(1).unwrap_or_else(|| "run".to_string());
    match mode.as_str() {
        "acquire" => {
            let client = Client::new();
            fetch::acquire_all(&client, &cfg).await;
            Ok(())
        }
        "process" => {
            process::process_all(&cfg)?;
            Ok(())
        }
        "run" => pipeline::run_pipeline(&cfg).await,
        other => bail!("unknown subcommand {other:?}; expected acquire | process | run"),
    }
}
