//! Strongly-typed migration identifier.
//!
//! A migration id is the file stem of a migration definition, e.g.
//! `0007_exercise_muscle_groups_expand`: a zero-padded ordinal, an underscore,
//! and a lowercase descriptive suffix. The id is also the ledger primary key
//! and the sort key, so ordering is plain string ordering.

use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::fmt;

/// Identifier of a single migration unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MigrationId(String);

impl MigrationId {
    /// Parse and validate an id against the `NNNN_suffix` convention.
    pub fn parse(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        let invalid = |reason: &str| CoreError::InvalidMigrationId {
            id: id.clone(),
            reason: reason.to_string(),
        };

        let Some((ordinal, suffix)) = id.split_once('_') else {
            return Err(invalid("expected '<ordinal>_<description>'"));
        };
        if ordinal.is_empty() || !ordinal.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("ordinal prefix must be zero-padded digits"));
        }
        if suffix.is_empty() {
            return Err(invalid("description suffix is empty"));
        }
        if !suffix
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        {
            return Err(invalid(
                "description may only contain lowercase letters, digits, and '_'",
            ));
        }
        Ok(Self(id))
    }

    /// Wrap an id read back from the ledger without re-validating it.
    ///
    /// Ledger rows may predate the naming convention or be hand-inserted, so
    /// only non-emptiness is required. Returns `None` for an empty string.
    pub fn from_ledger(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The zero-padded ordinal prefix (`"0007"` for `0007_foo`).
    pub fn ordinal(&self) -> &str {
        self.0.split_once('_').map_or(self.0.as_str(), |(o, _)| o)
    }

    /// The descriptive suffix after the ordinal.
    pub fn description(&self) -> &str {
        self.0.split_once('_').map_or("", |(_, d)| d)
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for MigrationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MigrationId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "migration_id_test.rs"]
mod tests;
