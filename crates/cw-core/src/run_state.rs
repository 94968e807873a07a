//! Run report for a pipeline invocation
//!
//! The report is rewritten atomically at the end of every run, successful or
//! not, so the latest outcome is always inspectable without re-running.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::error::CoreResult;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Transform,
    Load,
    Done,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Load => "load",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Run is currently in progress
    Running,
    /// Run completed successfully
    Completed,
    /// Run failed with a fatal error
    Failed,
}

/// Timing and row counts of one completed stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub duration_ms: u64,
    /// Rows produced per dataset or table
    pub rows: BTreeMap<String, usize>,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier for this run
    pub run_id: String,

    /// Bronze snapshot stamp this run wrote or replayed
    pub stamp: String,

    /// Reference date every stage of the run conformed and loaded against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,

    pub started_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    pub status: RunStatus,

    /// Stage the run is in, or ended in
    pub stage: Stage,

    pub stages: Vec<StageReport>,

    /// Total elapsed time, recorded on completion or failure
    pub elapsed_ms: u64,

    /// Free-form sections filled in by the stages (archive summary, load
    /// statistics, audit summary)
    #[serde(default)]
    pub details: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub warnings: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    /// Create a report for a run starting now
    pub fn new(stamp: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string()[..8].to_string(),
            stamp: stamp.into(),
            as_of: None,
            started_at: Utc::now(),
            finished_at: None,
            status: RunStatus::Running,
            stage: Stage::Extract,
            stages: Vec::new(),
            elapsed_ms: 0,
            details: BTreeMap::new(),
            warnings: Vec::new(),
            error: None,
        }
    }

    /// Load a report from a file path
    pub fn load(path: &Path) -> CoreResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let report: RunReport = serde_json::from_str(&content)?;
        Ok(Some(report))
    }

    /// Save the report atomically
    ///
    /// Uses write-to-temp-then-rename so a reader never sees a partial file
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Move to the next stage
    pub fn enter(&mut self, stage: Stage) {
        self.stage = stage;
    }

    /// Record a completed stage
    pub fn record_stage(&mut self, stage: Stage, duration_ms: u64, rows: BTreeMap<String, usize>) {
        self.stages.push(StageReport {
            stage,
            duration_ms,
            rows,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn set_detail<T: Serialize>(&mut self, key: &str, value: &T) -> CoreResult<()> {
        self.details
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Mark the run as completed
    pub fn mark_completed(&mut self) {
        self.finish(RunStatus::Completed, Stage::Done);
    }

    /// Mark the run as failed, keeping the stage it failed in
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        let failed_in = self.stage;
        self.error = Some(format!("{} stage: {}", failed_in, error.into()));
        self.finish(RunStatus::Failed, Stage::Failed);
    }

    fn finish(&mut self, status: RunStatus, stage: Stage) {
        let now = Utc::now();
        self.status = status;
        self.stage = stage;
        self.elapsed_ms = (now - self.started_at).num_milliseconds().max(0) as u64;
        self.finished_at = Some(now);
    }

    /// Sum of per-stage row counts for a stage
    pub fn total_rows(&self, stage: Stage) -> usize {
        self.stages
            .iter()
            .filter(|s| s.stage == stage)
            .flat_map(|s| s.rows.values())
            .sum()
    }
}

#[cfg(test)]
#[path = "run_state_test.rs"]
mod tests;
