//! Audit command implementation

use anyhow::{bail, Context, Result};
use cw_audit::{star_checks, AuditRunner, CheckResult, Severity};
use cw_db::DuckDbBackend;
use std::path::Path;

use crate::cli::{AuditArgs, GlobalArgs};
use crate::logging;

use super::common::{load_config, ExitCode};

fn print_result(result: &CheckResult) {
    let ms = result.duration.as_millis();
    if result.passed {
        println!("  ✓ {} [{}ms]", result.name, ms);
        return;
    }
    let mark = if result.severity == Severity::Warn {
        "!"
    } else {
        "✗"
    };
    if let Some(error) = &result.error {
        println!("  {} {} - {} [{}ms]", mark, result.name, error, ms);
        return;
    }
    println!(
        "  {} {} ({} failures) [{}ms]",
        mark, result.name, result.failure_count, ms
    );
    if !result.sample_failures.is_empty() {
        println!("    Sample failing rows:");
        for (i, row) in result.sample_failures.iter().enumerate() {
            println!("      {}. {}", i + 1, row);
        }
        if result.failure_count > result.sample_failures.len() {
            println!(
                "      ... and {} more",
                result.failure_count - result.sample_failures.len()
            );
        }
    }
}

/// Execute the audit command
pub async fn execute(args: &AuditArgs, global: &GlobalArgs) -> Result<()> {
    logging::init(global.verbose, None)?;
    let config = load_config(global)?;

    let path = &config.warehouse.path;
    if path != ":memory:" && !Path::new(path).exists() {
        bail!("Warehouse not found at {}; run `cw run` first", path);
    }
    let db = DuckDbBackend::new(path).context("Failed to open warehouse")?;
    let runner = AuditRunner::new(&db);
    runner.ensure_schema().await?;

    let checks = star_checks()?;
    println!("Running {} checks against {}...\n", checks.len(), path);
    let (results, summary) = runner.run_all(&checks, args.fail_fast).await;
    for result in &results {
        print_result(result);
    }

    println!();
    println!(
        "Passed: {}, Failed: {}, Warned: {}",
        summary.passed,
        summary.failed + summary.errors,
        summary.warned
    );

    if !summary.all_passed() {
        // 2 = audit failures
        return Err(ExitCode(2).into());
    }
    Ok(())
}
