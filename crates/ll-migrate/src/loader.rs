//! Migration unit discovery and parsing.
//!
//! A migration directory holds one `NNNN_description.sql` file per unit.
//! Each file carries a forward and a down section, introduced by marker
//! lines:
//!
//! ```sql
//! -- optional leading comments
//! -- migrate:up
//! ALTER TABLE exercises ADD COLUMN fork_id BIGINT;
//!
//! -- migrate:down
//! ALTER TABLE exercises DROP COLUMN fork_id;
//! ```
//!
//! Section bodies are kept byte-for-byte, since the forward section is what
//! gets fingerprinted.

use crate::checksum;
use crate::error::{MigrateError, MigrateResult};
use ll_core::MigrationId;
use std::path::{Path, PathBuf};

/// Marker line that starts the forward section.
pub const UP_MARKER: &str = "-- migrate:up";

/// Marker line that starts the down section.
pub const DOWN_MARKER: &str = "-- migrate:down";

const MIGRATION_EXTENSION: &str = "sql";

/// A migration definition as loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    /// File stem, e.g. `0003_session_set_tracking`
    pub id: MigrationId,
    /// Script that brings the store up to this version
    pub forward_sql: String,
    /// Script that would reverse it; persisted, never executed
    pub down_sql: String,
    /// File the unit was loaded from
    pub path: PathBuf,
}

impl MigrationUnit {
    /// Parse a unit from the contents of its file.
    pub fn parse(id: MigrationId, path: PathBuf, content: &str) -> MigrateResult<Self> {
        let (forward_sql, down_sql) =
            split_sections(content).map_err(|reason| MigrateError::Load {
                path: path.display().to_string(),
                reason,
            })?;
        Ok(Self {
            id,
            forward_sql,
            down_sql,
            path,
        })
    }

    /// Fingerprint of the forward script.
    pub fn fingerprint(&self) -> String {
        checksum::fingerprint(&self.forward_sql)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Forward,
    Down,
}

/// Split file contents into `(forward, down)`.
fn split_sections(content: &str) -> Result<(String, String), String> {
    let mut section = Section::Preamble;
    let mut forward = String::new();
    let mut down = String::new();

    for (idx, line) in content.split_inclusive('\n').enumerate() {
        let lineno = idx + 1;
        let trimmed = line.trim();

        if trimmed == UP_MARKER {
            section = match section {
                Section::Preamble => Section::Forward,
                Section::Forward | Section::Down => {
                    return Err(format!("'{UP_MARKER}' repeated on line {lineno}"));
                }
            };
            continue;
        }
        if trimmed == DOWN_MARKER {
            section = match section {
                Section::Forward => Section::Down,
                Section::Preamble => {
                    return Err(format!(
                        "'{DOWN_MARKER}' on line {lineno} appears before '{UP_MARKER}'"
                    ));
                }
                Section::Down => {
                    return Err(format!("'{DOWN_MARKER}' repeated on line {lineno}"));
                }
            };
            continue;
        }

        match section {
            Section::Preamble => {
                if !trimmed.is_empty() && !trimmed.starts_with("--") {
                    return Err(format!(
                        "statement on line {lineno} appears before '{UP_MARKER}'"
                    ));
                }
            }
            Section::Forward => forward.push_str(line),
            Section::Down => down.push_str(line),
        }
    }

    match section {
        Section::Preamble => return Err(format!("missing '{UP_MARKER}' marker")),
        Section::Forward => return Err(format!("missing '{DOWN_MARKER}' marker")),
        Section::Down => {}
    }
    if forward.trim().is_empty() {
        return Err("forward section is empty".to_string());
    }
    if down.trim().is_empty() {
        return Err("down section is empty".to_string());
    }
    Ok((forward, down))
}

/// Load every migration unit in `dir`, ordered by id.
///
/// Only `.sql` files are considered; every one of them must follow the
/// `NNNN_description.sql` convention. Ordinals must be unique and share one
/// width, so that id order is numeric order. Does not touch any store.
pub fn load_units(dir: &Path) -> MigrateResult<Vec<MigrationUnit>> {
    let read_err = |path: &Path, source: std::io::Error| MigrateError::ReadDir {
        path: path.display().to_string(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| read_err(dir, e))? {
        let path = entry.map_err(|e| read_err(dir, e))?.path();
        if path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(MIGRATION_EXTENSION)
        {
            paths.push(path);
        }
    }

    let mut units = Vec::with_capacity(paths.len());
    for path in paths {
        let load_err = |reason: String| MigrateError::Load {
            path: path.display().to_string(),
            reason,
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| load_err("file name is not valid UTF-8".to_string()))?;
        let id = MigrationId::parse(stem).map_err(|e| load_err(e.to_string()))?;

        let bytes = std::fs::read(&path).map_err(|e| read_err(&path, e))?;
        let content = String::from_utf8(bytes)
            .map_err(|_| load_err("file contents are not valid UTF-8".to_string()))?;

        units.push(MigrationUnit::parse(id, path.clone(), &content)?);
    }

    units.sort_by(|a, b| a.id.cmp(&b.id));
    check_ordinals(&units)?;

    log::debug!(
        "Loaded {} migration unit(s) from {}",
        units.len(),
        dir.display()
    );
    Ok(units)
}

/// Ordinals must be unique and equally wide.
fn check_ordinals(units: &[MigrationUnit]) -> MigrateResult<()> {
    let Some(first) = units.first() else {
        return Ok(());
    };
    let width = first.id.ordinal().len();

    for unit in units {
        if unit.id.ordinal().len() != width {
            return Err(MigrateError::Load {
                path: unit.path.display().to_string(),
                reason: format!(
                    "ordinal '{}' is {} digits wide, but {} uses {width}",
                    unit.id.ordinal(),
                    unit.id.ordinal().len(),
                    first.id
                ),
            });
        }
    }

    for pair in units.windows(2) {
        if pair[0].id.ordinal() == pair[1].id.ordinal() {
            return Err(MigrateError::Load {
                path: pair[1].path.display().to_string(),
                reason: format!(
                    "ordinal {} is already used by {}",
                    pair[1].id.ordinal(),
                    pair[0].id
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
