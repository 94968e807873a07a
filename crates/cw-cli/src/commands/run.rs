//! Run command implementation

use anyhow::{Context, Result};
use cw_core::{RunReport, Stage};
use cw_extract::new_stamp;
use cw_pipeline::{Pipeline, PipelineOptions};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::cli::{GlobalArgs, RunArgs};
use crate::logging;

use super::common::load_config;

fn stage_position(stage: Stage) -> Option<u64> {
    match stage {
        Stage::Extract => Some(0),
        Stage::Transform => Some(1),
        Stage::Load => Some(2),
        Stage::Done => Some(3),
        Stage::Failed => None,
    }
}

fn stage_progress() -> ProgressBar {
    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;

    let log_path = config
        .log_dir()
        .join(format!("pipeline_{}.log", new_stamp()));
    logging::init(global.verbose, Some(&log_path))?;
    info!("Logging to {}", log_path.display());

    let options = PipelineOptions {
        replay: args.replay.clone(),
        skip_audit: args.no_audit,
    };

    let pb = (!global.verbose).then(stage_progress);
    let observer = pb.clone();
    let result = Pipeline::new(&config, options)
        .on_stage(move |stage| {
            if let Some(pb) = &observer {
                if let Some(pos) = stage_position(stage) {
                    pb.set_position(pos);
                }
                pb.set_message(stage.to_string());
            }
        })
        .run()
        .await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let report = result.context("Pipeline run failed")?;
    print_summary(&report, &config.run_results_path().display().to_string());
    println!("Log: {}", log_path.display());
    Ok(())
}

fn print_summary(report: &RunReport, report_path: &str) {
    println!(
        "Run {} completed in {}ms (snapshot {})\n",
        report.run_id, report.elapsed_ms, report.stamp
    );
    for stage in &report.stages {
        let rows: usize = stage.rows.values().sum();
        println!(
            "  {:<10} {:>8} rows  [{}ms]",
            stage.stage.to_string(),
            rows,
            stage.duration_ms
        );
    }

    if let Some(load) = report.stages.iter().find(|s| s.stage == Stage::Load) {
        println!();
        for (table, rows) in &load.rows {
            println!("  {:<18} {:>8}", table, rows);
        }
    }

    if let Some(audit) = report.details.get("audit") {
        println!(
            "\nAudit: {} passed, {} failed, {} warned",
            audit["passed"], audit["failed"], audit["warned"]
        );
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }
    println!("\nReport: {}", report_path);
}
