//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// cw - Build the campus star-schema warehouse from operational sources
#[derive(Parser, Debug)]
#[command(name = "cw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the pipeline configuration
    #[arg(short, long, global = true, env = "CW_CONFIG", default_value = "campus.yml")]
    pub config: String,

    /// Override the warehouse path (`:memory:` allowed)
    #[arg(short, long, global = true, env = "CW_WAREHOUSE")]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline: extract, archive, conform, load, audit
    Run(RunArgs),

    /// Show the payment milestones of a semester
    Deadlines(DeadlinesArgs),

    /// Run integrity checks against the loaded warehouse
    Audit(AuditArgs),

    /// Inspect the Bronze raw archive
    Archive(ArchiveArgs),
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Rebuild from an archived snapshot instead of reading the sources
    #[arg(long, value_name = "STAMP")]
    pub replay: Option<String>,

    /// Skip the post-load audit
    #[arg(long)]
    pub no_audit: bool,
}

/// Arguments for the deadlines command
#[derive(Args, Debug)]
pub struct DeadlinesArgs {
    /// Semester start date (YYYY-MM-DD or DD-MM-YYYY)
    #[arg(short, long)]
    pub start: String,

    /// Evaluate a payment made on this date
    #[arg(long, value_name = "DATE")]
    pub on: Option<String>,

    /// Outstanding balance used for the late penalty
    #[arg(long, default_value_t = 0.0)]
    pub outstanding: f64,

    /// Semester tuition; prints the amount due at each milestone
    #[arg(long)]
    pub tuition: Option<f64>,

    /// Functional fees, with --tuition
    #[arg(long, default_value_t = 0.0)]
    pub functional_fees: f64,

    /// Accommodation fee, with --tuition and --resident
    #[arg(long, default_value_t = 0.0)]
    pub accommodation: f64,

    /// The student lives in university accommodation
    #[arg(long)]
    pub resident: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the audit command
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Stop at the first blocking failure
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the archive command
#[derive(Args, Debug)]
pub struct ArchiveArgs {
    #[command(subcommand)]
    pub command: ArchiveCommands,
}

/// Archive subcommands
#[derive(Subcommand, Debug)]
pub enum ArchiveCommands {
    /// List archived snapshots, or the datasets of one snapshot
    Ls(ArchiveLsArgs),
}

/// Arguments for `archive ls`
#[derive(Args, Debug)]
pub struct ArchiveLsArgs {
    /// Show the datasets of this snapshot
    pub stamp: Option<String>,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
