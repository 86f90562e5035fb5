//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use ll_core::{Config, DatabaseLocation};
use ll_db::Store;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that the store handle is dropped and closed first.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main.rs turns it into the process status.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Config and command-line overrides, resolved against the project directory.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub database: DatabaseLocation,
    pub migrations_dir: PathBuf,
}

/// Load `liftlog.yml` (or the defaults) and apply the global flag overrides.
///
/// An explicit `--config` must exist; otherwise a project without a config
/// file runs on the defaults.
pub(crate) fn load_settings(global: &GlobalArgs) -> Result<Settings> {
    let root = Path::new(&global.project_dir);

    let mut config = match &global.config {
        Some(path) => {
            Config::load(Path::new(path)).with_context(|| format!("Failed to load {path}"))?
        }
        None => Config::load_from_dir_or_default(root)
            .with_context(|| format!("Failed to load config from {}", root.display()))?,
    };

    if let Some(database) = &global.database {
        if database.trim().is_empty() {
            bail!("--database cannot be empty");
        }
        config.database.path = database.clone();
    }
    if let Some(dir) = &global.migrations_dir {
        if dir.trim().is_empty() {
            bail!("--migrations-dir cannot be empty");
        }
        config.migrations.dir = dir.clone();
    }

    Ok(Settings {
        database: config.database_location(root),
        migrations_dir: config.migrations_dir_absolute(root),
    })
}

/// Open the store, creating the file and its parent directories if needed.
pub(crate) fn open_store(location: &DatabaseLocation) -> Result<Store> {
    if let DatabaseLocation::File(path) = location {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Store::open_location(location).context("Failed to open store")
}

/// Open an existing store without creating one.
///
/// Returns `Ok(None)` when the file does not exist yet.
pub(crate) fn open_existing_store(location: &DatabaseLocation) -> Result<Option<Store>> {
    match location {
        DatabaseLocation::File(path) if !path.exists() => Ok(None),
        _ => Store::open_location(location)
            .map(Some)
            .context("Failed to open store"),
    }
}

/// First 12 characters of a fingerprint, for tables.
pub(crate) fn short_checksum(checksum: &str) -> String {
    checksum.chars().take(12).collect()
}

/// Calculate column widths for a table given headers and row data.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Print a left-aligned table with a dashed separator under the header.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);
    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", line(headers.iter().map(|h| h.to_string()).collect()));
    println!("{}", line(widths.iter().map(|&w| "-".repeat(w)).collect()));
    for row in rows {
        println!("{}", line(row.clone()));
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
