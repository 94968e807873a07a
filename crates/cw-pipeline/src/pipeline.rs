//! Stage state machine
//!
//! `Extract -> Transform -> Load -> Done`, with `Failed` reachable from any
//! stage. Each stage hands its full output to the next; nothing is retried.

use crate::error::{PipelineError, PipelineResult};
use chrono::NaiveDate;
use cw_audit::{star_checks, AuditRunner, AuditSummary};
use cw_conform::{Conformer, SilverData};
use cw_core::{Config, RunReport, Stage};
use cw_db::{Database, DuckDbBackend};
use cw_extract::{new_stamp, ArchiveReader, ArchiveWriter, RawTable, SourceReader};
use cw_warehouse::{build_star, Loader};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::time::Instant;

/// Per-run options
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Rebuild from this Bronze snapshot instead of reading the sources
    pub replay: Option<String>,

    /// Skip the post-load audit even when the config enables it
    pub skip_audit: bool,
}

type StageObserver<'a> = Box<dyn Fn(Stage) + Send + Sync + 'a>;

/// One pipeline run over an immutable configuration
pub struct Pipeline<'a> {
    config: &'a Config,
    options: PipelineOptions,
    observer: Option<StageObserver<'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, options: PipelineOptions) -> Self {
        Self {
            config,
            options,
            observer: None,
        }
    }

    /// Call `f` whenever the run enters a stage, terminal stages included
    pub fn on_stage(mut self, f: impl Fn(Stage) + Send + Sync + 'a) -> Self {
        self.observer = Some(Box::new(f));
        self
    }

    /// Run every stage and write the run report.
    ///
    /// The report is saved to `<target>/run_results.json` whether the run
    /// succeeds or fails; on failure the stage error is returned after the
    /// report has been written.
    pub async fn run(&self) -> PipelineResult<RunReport> {
        let stamp = self.options.replay.clone().unwrap_or_else(new_stamp);
        let mut report = RunReport::new(stamp);
        let as_of = self.config.as_of_date();
        report.as_of = Some(as_of);
        info!(
            "Run {} started (snapshot {}, as of {})",
            report.run_id, report.stamp, as_of
        );

        let outcome = self.run_stages(as_of, &mut report).await;
        match &outcome {
            Ok(()) => report.mark_completed(),
            Err(e) => {
                error!("Run {} failed in {} stage: {}", report.run_id, report.stage, e);
                report.mark_failed(e.to_string());
            }
        }
        self.notify(report.stage);

        let path = self.config.run_results_path();
        match outcome {
            Ok(()) => {
                report.save(&path)?;
                info!(
                    "Run {} completed in {}ms with {} warnings",
                    report.run_id,
                    report.elapsed_ms,
                    report.warnings.len()
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(save_err) = report.save(&path) {
                    error!("Failed to write run report {}: {}", path.display(), save_err);
                }
                Err(e)
            }
        }
    }

    async fn run_stages(&self, as_of: NaiveDate, report: &mut RunReport) -> PipelineResult<()> {
        let tables = self.extract(report).await?;
        let data = self.transform(&tables, as_of, report)?;
        self.load(&data, as_of, report).await
    }

    fn notify(&self, stage: Stage) {
        if let Some(observer) = &self.observer {
            observer(stage);
        }
    }

    fn enter(&self, report: &mut RunReport, stage: Stage) {
        report.enter(stage);
        info!("Entering {} stage", stage);
        self.notify(stage);
    }

    async fn extract(&self, report: &mut RunReport) -> PipelineResult<Vec<RawTable>> {
        self.enter(report, Stage::Extract);
        let start = Instant::now();

        let tables = match &self.options.replay {
            Some(stamp) => {
                ArchiveReader::new(self.config.archive_dir())?
                    .replay(stamp)
                    .await?
            }
            None => {
                let output = SourceReader::new()?.read_all(&self.config.sources).await?;
                for warning in output.warnings {
                    report.warn(warning);
                }
                self.archive(&output.tables, report).await?;
                output.tables
            }
        };

        let rows: BTreeMap<String, usize> = tables.iter().map(|t| (t.key(), t.len())).collect();
        report.record_stage(Stage::Extract, elapsed_ms(start), rows);
        Ok(tables)
    }

    /// Archive failures never stop the run; they are counted as warnings.
    async fn archive(&self, tables: &[RawTable], report: &mut RunReport) -> PipelineResult<()> {
        let stamp = report.stamp.clone();
        let written = match ArchiveWriter::new(self.config.archive_dir()) {
            Ok(writer) => writer.write(tables, &stamp).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(summary) => {
                for failure in &summary.failed {
                    report.warn(format!(
                        "{}.{} was not archived: {}",
                        failure.source, failure.table, failure.error
                    ));
                }
                info!(
                    "Archived {} datasets under snapshot {}",
                    summary.written.len(),
                    stamp
                );
                report.set_detail("archive", &summary)?;
            }
            Err(e) => {
                warn!("Bronze archive skipped: {}", e);
                report.warn(format!("bronze archive skipped: {}", e));
            }
        }
        Ok(())
    }

    fn transform(
        &self,
        tables: &[RawTable],
        as_of: NaiveDate,
        report: &mut RunReport,
    ) -> PipelineResult<SilverData> {
        self.enter(report, Stage::Transform);
        let start = Instant::now();

        let output = Conformer::new(self.config, tables, as_of).run();
        if output.report.total_coerced() > 0 {
            info!(
                "{} source values could not be converted and were defaulted",
                output.report.total_coerced()
            );
        }
        for warning in &output.report.warnings {
            report.warn(warning.clone());
        }
        report.set_detail("conform", &output.report)?;
        report.record_stage(
            Stage::Transform,
            elapsed_ms(start),
            output.report.rows.clone(),
        );
        Ok(output.data)
    }

    /// Load owns the warehouse connection until the stage ends; the audit
    /// runs on the same connection after a successful load.
    async fn load(
        &self,
        data: &SilverData,
        as_of: NaiveDate,
        report: &mut RunReport,
    ) -> PipelineResult<()> {
        self.enter(report, Stage::Load);
        let start = Instant::now();

        let path = &self.config.warehouse.path;
        let db = DuckDbBackend::new(path).map_err(|source| PipelineError::Connect {
            path: path.clone(),
            source,
        })?;

        let tables = build_star(data, self.config, as_of);
        let load = Loader::new(&db, self.config.load.chunk_size)
            .load_all(tables)
            .await?;
        for warning in &load.warnings {
            report.warn(warning.clone());
        }
        report.set_detail("load", &load)?;

        let rows: BTreeMap<String, usize> = load
            .tables
            .iter()
            .map(|(name, stats)| (name.clone(), stats.loaded))
            .collect();
        report.record_stage(Stage::Load, elapsed_ms(start), rows);
        info!(
            "Loaded {} rows into {} ({})",
            load.total_loaded(),
            path,
            db.db_type()
        );

        if self.config.audit.enabled && !self.options.skip_audit {
            let summary = audit(&db).await?;
            if !summary.all_passed() {
                report.warn(format!(
                    "audit: {} checks failed: {}",
                    summary.failures.len(),
                    summary.failures.join(", ")
                ));
            }
            report.set_detail("audit", &summary)?;
        }
        Ok(())
    }
}

async fn audit(db: &dyn Database) -> PipelineResult<AuditSummary> {
    let checks = star_checks()?;
    let runner = AuditRunner::new(db);
    runner.ensure_schema().await?;
    let (_, summary) = runner.run_all(&checks, false).await;
    info!(
        "Audit: {} passed, {} failed, {} warned, {} errors",
        summary.passed, summary.failed, summary.warned, summary.errors
    );
    Ok(summary)
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
