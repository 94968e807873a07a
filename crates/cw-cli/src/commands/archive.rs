//! Archive command implementation

use anyhow::{Context, Result};
use cw_extract::ArchiveReader;

use crate::cli::{ArchiveArgs, ArchiveCommands, ArchiveLsArgs, GlobalArgs};
use crate::logging;

use super::common::load_config;

/// Execute the archive command
pub async fn execute(args: &ArchiveArgs, global: &GlobalArgs) -> Result<()> {
    logging::init(global.verbose, None)?;
    match &args.command {
        ArchiveCommands::Ls(ls) => list(ls, global),
    }
}

fn list(args: &ArchiveLsArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let dir = config.archive_dir();
    let reader = ArchiveReader::new(&dir).context("Failed to open archive")?;

    if let Some(stamp) = &args.stamp {
        let manifest = reader.manifest(stamp)?;
        println!("Snapshot {} (created {})\n", manifest.stamp, manifest.created_at);
        for entry in &manifest.datasets {
            println!(
                "  {:<32} {:>8} rows  {}",
                format!("{}.{}", entry.source, entry.table),
                entry.rows,
                entry.file
            );
        }
        return Ok(());
    }

    let stamps = reader.list_runs()?;
    if stamps.is_empty() {
        println!("No snapshots in {}", dir.display());
        return Ok(());
    }
    for stamp in &stamps {
        match reader.manifest(stamp) {
            Ok(manifest) => {
                let rows: usize = manifest.datasets.iter().map(|d| d.rows).sum();
                println!(
                    "{}  {:>3} datasets  {:>9} rows",
                    stamp,
                    manifest.datasets.len(),
                    rows
                );
            }
            Err(e) => println!("{}  unreadable manifest: {}", stamp, e),
        }
    }
    Ok(())
}
