//! Configuration types and parsing for campus.yml

use crate::error::{CoreError, CoreResult};
use crate::grading::{GradingPolicy, ProgramCategory};
use crate::serde_helpers::default_true;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Pipeline configuration from campus.yml
///
/// Loaded once at process start and passed by reference to every stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Warehouse name, used in logs and the run report
    pub name: String,

    /// Reference date for synthesised defaults (admission dates, missing
    /// enrollment/exam dates, academic year). Defaults to today.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,

    /// Output directory for the run report and logs
    #[serde(default = "default_target_path")]
    pub target_path: String,

    /// Gold warehouse settings
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Bronze archive settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Origin systems, read in order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// Load tuning
    #[serde(default)]
    pub load: LoadConfig,

    /// Horizon of the time dimension
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Grading policies per program category
    #[serde(default)]
    pub grading: GradingConfig,

    /// Values substituted for absent source fields
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Post-load integrity audit
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Warehouse (Gold) database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    /// DuckDB file, or `:memory:`
    #[serde(default = "default_warehouse_path")]
    pub path: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            path: default_warehouse_path(),
        }
    }
}

/// Raw archive (Bronze) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    #[serde(default = "default_archive_path")]
    pub path: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: default_archive_path(),
        }
    }
}

/// Kind of origin system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// DuckDB database file; each listed table is read in full
    DuckDb,
    /// Flat file; one logical table
    Csv,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::DuckDb => write!(f, "duckdb"),
            SourceType::Csv => write!(f, "csv"),
        }
    }
}

/// One origin system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Source name, used in archive file names
    pub name: String,

    #[serde(rename = "type")]
    pub source_type: SourceType,

    pub path: String,

    /// Tables to read (duckdb sources)
    #[serde(default)]
    pub tables: Vec<String>,

    /// Logical table name of a csv source (defaults to the source name)
    #[serde(default)]
    pub table: Option<String>,

    /// A missing optional source yields an empty table instead of failing
    #[serde(default)]
    pub optional: bool,
}

impl SourceConfig {
    /// Logical tables this source produces
    pub fn table_names(&self) -> Vec<String> {
        match self.source_type {
            SourceType::DuckDb => self.tables.clone(),
            SourceType::Csv => vec![self.table.clone().unwrap_or_else(|| self.name.clone())],
        }
    }
}

/// Load tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadConfig {
    /// Rows per insert statement and transaction
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Time dimension horizon (inclusive)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarConfig {
    #[serde(default = "default_calendar_start")]
    pub start: NaiveDate,
    #[serde(default = "default_calendar_end")]
    pub end: NaiveDate,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            start: default_calendar_start(),
            end: default_calendar_end(),
        }
    }
}

/// Grading policies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradingConfig {
    #[serde(default = "default_policy")]
    pub default: GradingPolicy,

    #[serde(default = "law_policy")]
    pub law: GradingPolicy,

    /// Lowercase substrings of a program name that mark it law-like
    #[serde(default = "default_law_keywords")]
    pub law_keywords: Vec<String>,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            default: default_policy(),
            law: law_policy(),
            law_keywords: default_law_keywords(),
        }
    }
}

impl GradingConfig {
    pub fn policy_for(&self, category: ProgramCategory) -> &GradingPolicy {
        match category {
            ProgramCategory::Default => &self.default,
            ProgramCategory::LawLike => &self.law,
        }
    }

    pub fn category_of(&self, program_name: &str) -> ProgramCategory {
        ProgramCategory::from_program_name(program_name, &self.law_keywords)
    }
}

/// Defaults for absent source fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    #[serde(default = "default_email_domain")]
    pub email_domain: String,
    #[serde(default = "default_nationality")]
    pub nationality: String,
    #[serde(default = "default_department")]
    pub department: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            email_domain: default_email_domain(),
            nationality: default_nationality(),
            department: default_department(),
            payment_method: default_payment_method(),
        }
    }
}

/// Post-load audit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_target_path() -> String {
    "target".to_string()
}

fn default_warehouse_path() -> String {
    "target/warehouse.duckdb".to_string()
}

fn default_archive_path() -> String {
    "target/bronze".to_string()
}

fn default_chunk_size() -> usize {
    500
}

fn default_calendar_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default()
}

fn default_calendar_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 12, 31).unwrap_or_default()
}

fn default_policy() -> GradingPolicy {
    GradingPolicy::DEFAULT
}

fn law_policy() -> GradingPolicy {
    GradingPolicy::LAW
}

fn default_law_keywords() -> Vec<String> {
    vec!["law".to_string(), "llb".to_string(), "llm".to_string()]
}

fn default_email_domain() -> String {
    "ucu.ac.ug".to_string()
}

fn default_nationality() -> String {
    "Ugandan".to_string()
}

fn default_department() -> String {
    "General".to_string()
}

fn default_payment_method() -> String {
    "Bank Transfer".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(invalid("name cannot be empty"));
        }

        if self.load.chunk_size == 0 {
            return Err(invalid("load.chunk_size must be greater than 0"));
        }

        if self.calendar.start > self.calendar.end {
            return Err(invalid(format!(
                "calendar.start ({}) is after calendar.end ({})",
                self.calendar.start, self.calendar.end
            )));
        }

        for (label, policy) in [
            ("grading.default", &self.grading.default),
            ("grading.law", &self.grading.law),
        ] {
            let total = policy.coursework_weight + policy.exam_weight;
            if (total - 1.0).abs() > 1e-9 {
                return Err(invalid(format!(
                    "{} weights must sum to 1.0, got {}",
                    label, total
                )));
            }
            if policy.coursework_weight < 0.0 || policy.exam_weight < 0.0 {
                return Err(invalid(format!("{} weights cannot be negative", label)));
            }
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if !is_valid_source_name(&source.name) {
                return Err(invalid(format!(
                    "source name '{}' must be non-empty and contain only letters, digits and underscores",
                    source.name
                )));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(invalid(format!("duplicate source name '{}'", source.name)));
            }
            match source.source_type {
                SourceType::DuckDb if source.tables.is_empty() => {
                    return Err(invalid(format!(
                        "duckdb source '{}' must list at least one table",
                        source.name
                    )));
                }
                SourceType::Csv if !source.tables.is_empty() => {
                    return Err(invalid(format!(
                        "csv source '{}' takes `table`, not `tables`",
                        source.name
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Reference date, falling back to today's local date
    pub fn as_of_date(&self) -> NaiveDate {
        self.as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn target_dir(&self) -> PathBuf {
        PathBuf::from(&self.target_path)
    }

    /// Path of the run report written after every run
    pub fn run_results_path(&self) -> PathBuf {
        self.target_dir().join("run_results.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.target_dir().join("logs")
    }

    pub fn archive_dir(&self) -> PathBuf {
        PathBuf::from(&self.archive.path)
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.into(),
    }
}

fn is_valid_source_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
