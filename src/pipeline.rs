// src/pipeline.rs

use crate::config::PipelineConfig;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tokio::process::Command;
use tracing::{error, info, warn};

/// One isolated step of the run: a subprocess with its own stdout/stderr.
pub struct Stage {
    pub name: &'static str,
    pub command: Vec<String>,
}

/// Run the four pipeline stages in strict sequence: acquisition, processing,
/// then the external visualization and modeling stages. The first non-zero
/// exit aborts the run; later stages never start.
pub async fn run_pipeline(cfg: &PipelineConfig) -> Result<()> {
    let started = Instant::now();
    info!("starting analysis pipeline");

    let exe = std::env::current_exe().context("resolving current executable")?;
    let exe = exe.to_string_lossy().to_string();

    let stages = vec![
        Stage {
            name: "data acquisition",
            command: vec![exe.clone(), "acquire".to_string()],
        },
        Stage {
            name: "data processing",
            command: vec![exe, "process".to_string()],
        },
        Stage {
            name: "data visualization",
            command: cfg.viz_command.clone().unwrap_or_default(),
        },
        Stage {
            name: "modeling and prediction",
            command: cfg.model_command.clone().unwrap_or_default(),
        },
    ];

    run_stages(&stages, &cfg.log_path).await?;

    info!(elapsed = ?started.elapsed(), "complete pipeline executed successfully");
    Ok(())
}

/// Walk the stages in order. The first non-zero exit stops the walk; later
/// stages never start. Stages without a configured command are skipped.
pub async fn run_stages(stages: &[Stage], log_path: &Path) -> Result<()> {
    for stage in stages {
        if stage.command.is_empty() {
            warn!(stage = stage.name, "no command configured; skipping stage");
            log_line(log_path, &format!("{} skipped (not configured)", stage.name))?;
            continue;
        }
        if !run_stage(stage, log_path).await? {
            error!(stage = stage.name, "stage failed; pipeline stopped");
            bail!("{} failed", stage.name);
        }
    }
    Ok(())
}

/// Spawn the stage subprocess, capture its output streams, log every line
/// tagged with the stage name, and record the wall-clock duration. Returns
/// whether the stage exited zero.
pub async fn run_stage(stage: &Stage, log_path: &Path) -> Result<bool> {
    let start = Instant::now();
    info!(stage = stage.name, "starting stage");
    log_line(log_path, &format!("{} started", stage.name))?;

    let output = Command::new(&stage.command[0])
        .args(&stage.command[1..])
        .output()
        .await
        .with_context(|| format!("spawning {}", stage.name))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stdout.lines() {
        info!("[{}] {}", stage.name, line);
        log_line(log_path, &format!("[{}] {}", stage.name, line))?;
    }
    for line in stderr.lines() {
        warn!("[{}] {}", stage.name, line);
        log_line(log_path, &format!("[{}] {}", stage.name, line))?;
    }

    let elapsed = start.elapsed();
    if output.status.success() {
        info!(stage = stage.name, elapsed = ?elapsed, "stage completed");
        log_line(
            log_path,
            &format!("{} completed in {:.1}s", stage.name, elapsed.as_secs_f64()),
        )?;
        Ok(true)
    } else {
        let code = output.status.code().unwrap_or(-1);
        error!(stage = stage.name, code, "stage exited non-zero");
        log_line(
            log_path,
            &format!(
                "{} failed with exit code {} after {:.1}s",
                stage.name,
                code,
                elapsed.as_secs_f64()
            ),
        )?;
        Ok(false)
    }
}

fn log_line(log_path: &Path, message: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("opening pipeline log {}", log_path.display()))?;
    writeln!(file, "{} {}", Utc::now().format("%Y-%m-%d %H:%M:%S"), message)?;
    Ok(())
}
