//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use cw_core::Config;
use std::fmt;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Return `Err(ExitCode(N).into())` instead of calling `std::process::exit`
/// so destructors run before `main` exits.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // control flow only, never shown to the user
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load the configuration, applying the `--target` override
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    let path = Path::new(&global.config);
    let mut config = Config::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    if let Some(target) = &global.target {
        config.warehouse.path = target.clone();
    }
    Ok(config)
}

/// `1234567.5` -> `1,234,567.50`
pub(crate) fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1_234_567.5), "1,234,567.50");
        assert_eq!(format_amount(-75000.0), "-75,000.00");
    }
}
